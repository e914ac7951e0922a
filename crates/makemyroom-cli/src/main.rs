use std::fs;
use std::io::{self, BufRead, ErrorKind, Write};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use makemyroom_contracts::chat::{
    help_lines, parse_command, Advice, ChatMessage, ChatRole, RelatedLink, StudioCommand,
};
use makemyroom_contracts::config::Settings;
use makemyroom_contracts::events::EventWriter;
use makemyroom_contracts::images::{mime_for_extension, ImageRef};
use makemyroom_contracts::studio::{
    ContainerRect, JobKind, PointerEvent, RedesignJob, Studio, StudioChange, SubmissionJob,
    Ticket,
};
use makemyroom_contracts::styles::StyleCatalog;
use makemyroom_engine::{
    compose_comparison, AdvisorySession, Designer, HttpTransport, Transport,
};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "makemyroom", version, about = "AI room redesign studio")]
struct Cli {
    /// TOML settings file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Append session events to this JSONL file.
    #[arg(long, global = true)]
    events: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Studio(StudioArgs),
    Styles,
    Redesign(RedesignArgs),
    Edit(EditArgs),
    Ask(AskArgs),
}

#[derive(Debug, Parser)]
struct StudioArgs {
    #[arg(long)]
    photo: Option<PathBuf>,
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Debug, Parser)]
struct RedesignArgs {
    #[arg(long)]
    photo: PathBuf,
    #[arg(long)]
    style: String,
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Debug, Parser)]
struct EditArgs {
    #[arg(long)]
    image: PathBuf,
    #[arg(long)]
    instruction: String,
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Debug, Parser)]
struct AskArgs {
    #[arg(required = true, num_args = 1..)]
    message: Vec<String>,
}

/// Width of the virtual comparison container `/slider` drags across.
const SLIDER_CONTAINER_WIDTH: f64 = 100.0;

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("makemyroom error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(events) = cli.events.clone() {
        settings.logging.events = Some(events);
    }
    init_logging(&settings.logging.level);

    match cli.command {
        Command::Studio(args) => run_studio(args, &settings),
        Command::Styles => {
            print_styles(&StyleCatalog::default(), None);
            Ok(0)
        }
        Command::Redesign(args) => run_redesign(args, &settings),
        Command::Edit(args) => run_edit(args, &settings),
        Command::Ask(args) => run_ask(args, &settings),
    }
}

fn init_logging(default_level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .try_init();
}

fn run_redesign(args: RedesignArgs, settings: &Settings) -> Result<i32> {
    let catalog = StyleCatalog::default();
    let Some(style) = catalog.get(&args.style.to_ascii_lowercase()) else {
        bail!(
            "unknown style '{}' (available: {})",
            args.style,
            catalog.ids().join(", ")
        );
    };
    let photo = load_image_file(&args.photo)?;
    let designer = Designer::new(HttpTransport::shared(settings)?, settings);
    let result = designer
        .redesign(&photo, &style.prompt)
        .context("redesign failed")?;
    let path = output_path(args.out, &settings.output.directory, 1, &result)?;
    write_image(&result, &path)?;
    println!("Saved {} redesign to {}", style.name, path.display());
    Ok(0)
}

fn run_edit(args: EditArgs, settings: &Settings) -> Result<i32> {
    let source = load_image_file(&args.image)?;
    let designer = Designer::new(HttpTransport::shared(settings)?, settings);
    let result = designer
        .edit(&source, &args.instruction)
        .context("edit failed")?;
    let path = output_path(args.out, &settings.output.directory, 1, &result)?;
    write_image(&result, &path)?;
    println!("Saved edited design to {}", path.display());
    Ok(0)
}

fn run_ask(args: AskArgs, settings: &Settings) -> Result<i32> {
    let session = AdvisorySession::new(HttpTransport::shared(settings)?, settings);
    let advice = session
        .send(&args.message.join(" "))
        .context("advisory request failed")?;
    print_advice(&advice);
    Ok(0)
}

enum LoopEvent {
    Line(String),
    InputClosed,
    Redesign {
        ticket: Ticket,
        result: Result<ImageRef, String>,
    },
    Edit {
        ticket: Ticket,
        loading_id: String,
        result: Result<ImageRef, String>,
    },
    Advice {
        ticket: Ticket,
        result: Result<Advice, String>,
    },
}

/// Loop-thread state. Only this thread touches `studio`; workers report back
/// through `tx`.
struct StudioRuntime {
    studio: Studio,
    designer: Designer,
    advisor: AdvisorySession,
    events: Option<EventWriter>,
    out_dir: PathBuf,
    tx: Sender<LoopEvent>,
    outstanding: usize,
}

fn run_studio(args: StudioArgs, settings: &Settings) -> Result<i32> {
    let (tx, rx) = mpsc::channel();
    let events = settings
        .logging
        .events
        .as_ref()
        .map(|path| EventWriter::new(path, uuid::Uuid::new_v4().to_string()));
    let out_dir = args.out.unwrap_or_else(|| settings.output.directory.clone());

    let mut runtime = StudioRuntime::new(
        HttpTransport::shared(settings)?,
        settings,
        out_dir,
        events,
        tx.clone(),
    );
    runtime.studio.subscribe(print_change);

    println!("MakeMyRoom studio. Type /help for commands.");
    if let Some(photo) = args.photo.as_deref() {
        runtime.upload(photo);
    } else {
        println!("Upload a photo of your room with /upload <path>.");
    }

    spawn_stdin_reader(tx);
    prompt()?;

    let mut input_closed = false;
    while let Ok(event) = rx.recv() {
        match event {
            LoopEvent::Line(line) => {
                if !runtime.handle_line(&line)? {
                    break;
                }
            }
            LoopEvent::InputClosed => input_closed = true,
            completion => runtime.complete(completion),
        }
        if input_closed && runtime.outstanding == 0 {
            break;
        }
        prompt()?;
    }
    Ok(0)
}

impl StudioRuntime {
    fn new(
        transport: Arc<dyn Transport>,
        settings: &Settings,
        out_dir: PathBuf,
        events: Option<EventWriter>,
        tx: Sender<LoopEvent>,
    ) -> Self {
        let mut studio = Studio::default();
        if let Some(writer) = events.clone() {
            studio.subscribe(move |change| {
                if let Err(err) = writer.record_change(change) {
                    warn!(error = %err, "failed writing session event");
                }
            });
        }
        Self {
            studio,
            designer: Designer::new(Arc::clone(&transport), settings),
            advisor: AdvisorySession::new(transport, settings),
            events,
            out_dir,
            tx,
            outstanding: 0,
        }
    }

    /// Applies a worker's result. Input events are ignored here.
    fn complete(&mut self, event: LoopEvent) {
        match event {
            LoopEvent::Redesign { ticket, result } => {
                self.outstanding = self.outstanding.saturating_sub(1);
                self.studio.finish_redesign(ticket, result);
            }
            LoopEvent::Edit {
                ticket,
                loading_id,
                result,
            } => {
                self.outstanding = self.outstanding.saturating_sub(1);
                self.studio.finish_edit(ticket, &loading_id, result);
            }
            LoopEvent::Advice { ticket, result } => {
                self.outstanding = self.outstanding.saturating_sub(1);
                self.studio.finish_advice(ticket, result);
            }
            LoopEvent::Line(_) | LoopEvent::InputClosed => {}
        }
    }

    /// Returns `false` when the loop should stop.
    fn handle_line(&mut self, line: &str) -> Result<bool> {
        match parse_command(line) {
            StudioCommand::Noop => {}
            StudioCommand::Help => {
                println!("Commands: {}", help_lines().join("  "));
                println!("Anything else is sent to the consultant (chat) or applied as a magic edit (edit mode).");
            }
            StudioCommand::Quit => return Ok(false),
            StudioCommand::Styles => {
                print_styles(self.studio.catalog(), self.studio.selected_style_id());
            }
            StudioCommand::Upload(path) => self.upload(&path),
            StudioCommand::Style(id) => self.start_redesign(&id),
            StudioCommand::Undo => {
                if !self.studio.undo() {
                    println!("Nothing to undo.");
                }
            }
            StudioCommand::Redo => {
                if !self.studio.redo() {
                    println!("Nothing to redo.");
                }
            }
            StudioCommand::History => print_history(&self.studio),
            StudioCommand::Reset => {
                self.studio.start_over();
                self.advisor.reset();
                println!("Started over. Upload a new photo with /upload <path>.");
            }
            StudioCommand::Mode(mode) => match self.studio.set_session_mode(mode) {
                Ok(()) => println!("Mode: {}", mode.as_str()),
                Err(err) => println!("Cannot switch mode: {err}"),
            },
            StudioCommand::Slider(percent) => self.drag_slider(percent),
            StudioCommand::Compare(path) => {
                if let Err(err) = self.write_comparison(path) {
                    println!("Comparison failed: {err:#}");
                }
            }
            StudioCommand::Save(path) => {
                if let Err(err) = self.save_current(path) {
                    println!("Save failed: {err:#}");
                }
            }
            StudioCommand::Submit(text) => self.submit(&text),
            StudioCommand::Invalid { command, reason } => println!("/{command}: {reason}"),
        }
        Ok(true)
    }

    fn upload(&mut self, path: &Path) {
        match load_image_file(path) {
            Ok(image) => {
                self.studio.upload(image);
                println!(
                    "Loaded {}. Pick a style with /style <id> (see /styles).",
                    path.display()
                );
            }
            Err(err) => println!("Upload failed: {err:#}"),
        }
    }

    fn start_redesign(&mut self, style_id: &str) {
        let job = match self.studio.begin_redesign(style_id) {
            Ok(job) => job,
            Err(err) => {
                println!("Cannot redesign: {err}");
                return;
            }
        };
        println!("Reimagining your space as {}...", job.style.name);
        self.record_dispatch(
            JobKind::Redesign,
            job.ticket,
            json!({ "style_id": job.style.id }),
        );

        let RedesignJob {
            ticket,
            source,
            style,
        } = job;
        let designer = self.designer.clone();
        let tx = self.tx.clone();
        self.outstanding += 1;
        thread::spawn(move || {
            let result = run_job(|| {
                designer
                    .redesign(&source, &style.prompt)
                    .map_err(|err| err.to_string())
            });
            let _ = tx.send(LoopEvent::Redesign { ticket, result });
        });
    }

    fn submit(&mut self, text: &str) {
        let job = match self.studio.submit(text) {
            Ok(job) => job,
            Err(err) => {
                println!("Not sent: {err}");
                return;
            }
        };
        let tx = self.tx.clone();
        self.outstanding += 1;
        match job {
            SubmissionJob::Edit {
                ticket,
                image,
                instruction,
                loading_id,
            } => {
                self.record_dispatch(JobKind::Edit, ticket, json!({ "instruction": instruction }));
                let designer = self.designer.clone();
                thread::spawn(move || {
                    let result = run_job(|| {
                        designer
                            .edit(&image, &instruction)
                            .map_err(|err| err.to_string())
                    });
                    let _ = tx.send(LoopEvent::Edit {
                        ticket,
                        loading_id,
                        result,
                    });
                });
            }
            SubmissionJob::Advice { ticket, message } => {
                self.record_dispatch(
                    JobKind::Advice,
                    ticket,
                    json!({ "chars": message.chars().count() }),
                );
                let advisor = self.advisor.clone();
                thread::spawn(move || {
                    let result = run_job(|| advisor.send(&message).map_err(|err| err.to_string()));
                    let _ = tx.send(LoopEvent::Advice { ticket, result });
                });
            }
        }
    }

    fn drag_slider(&mut self, percent: f64) {
        let rect = ContainerRect::new(0.0, SLIDER_CONTAINER_WIDTH);
        self.studio.pointer(PointerEvent::HandleDown, rect);
        self.studio.pointer(
            PointerEvent::Move {
                client_x: percent / 100.0 * SLIDER_CONTAINER_WIDTH,
            },
            rect,
        );
        self.studio.pointer(PointerEvent::Up, rect);
        println!("Slider at {:.0}%.", self.studio.slider().position());
    }

    fn write_comparison(&self, path: Option<PathBuf>) -> Result<()> {
        let Some((before, after)) = self.studio.comparison() else {
            bail!("nothing generated yet");
        };
        let composite = compose_comparison(before, after, self.studio.slider().position())?;
        let path = match path {
            Some(path) => path,
            None => self.out_dir.join(format!(
                "compare-{}.png",
                self.studio.history().cursor()
            )),
        };
        write_image(&composite, &path)?;
        println!("Wrote comparison to {}", path.display());
        Ok(())
    }

    fn save_current(&self, path: Option<PathBuf>) -> Result<()> {
        let Some(image) = self.studio.current_image() else {
            bail!("upload a photo first");
        };
        let path = output_path(path, &self.out_dir, self.studio.history().cursor(), image)?;
        write_image(image, &path)?;
        println!("Saved {}", path.display());
        Ok(())
    }

    fn record_dispatch(&self, kind: JobKind, ticket: Ticket, detail: Value) {
        debug!(?kind, ?ticket, "job dispatched");
        let Some(writer) = self.events.as_ref() else {
            return;
        };
        let detail = match detail {
            Value::Object(detail) => detail,
            _ => Default::default(),
        };
        if let Err(err) = writer.record_dispatch(kind, ticket, detail) {
            warn!(error = %err, "failed writing session event");
        }
    }
}

/// Runs a worker job so that a panic still yields a completion for the loop.
fn run_job<T>(job: impl FnOnce() -> Result<T, String>) -> Result<T, String> {
    panic::catch_unwind(AssertUnwindSafe(job))
        .unwrap_or_else(|_| Err("worker thread panicked".to_string()))
}

fn spawn_stdin_reader(tx: Sender<LoopEvent>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        let mut lock = stdin.lock();
        let mut line = String::new();
        loop {
            line.clear();
            match lock.read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => {
                    if tx.send(LoopEvent::Line(line.clone())).is_err() {
                        return;
                    }
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    warn!(error = %err, "stdin read failed");
                    break;
                }
            }
        }
        let _ = tx.send(LoopEvent::InputClosed);
    });
}

fn prompt() -> Result<()> {
    print!("> ");
    io::stdout().flush()?;
    Ok(())
}

fn print_change(change: &StudioChange) {
    match change {
        StudioChange::MessageAppended(message) if message.role == ChatRole::Model => {
            print_model_message(message);
        }
        StudioChange::Alert(text) => println!("! {text}"),
        StudioChange::HistoryChanged { cursor, len } if *len > 1 => {
            println!("[design {cursor}/{}]", len - 1);
        }
        StudioChange::ResponseDiscarded { kind, ticket } => {
            info!(?kind, ?ticket, "stale response discarded");
        }
        _ => {}
    }
}

fn print_model_message(message: &ChatMessage) {
    if message.is_error {
        println!("consultant (error): {}", message.text);
    } else {
        println!("consultant: {}", message.text);
    }
    print_links(&message.related_links);
}

fn print_advice(advice: &Advice) {
    println!("{}", advice.text);
    print_links(&advice.links);
}

fn print_links(links: &[RelatedLink]) {
    if links.is_empty() {
        return;
    }
    println!("  Shoppable links:");
    for link in links {
        println!("  - {}: {}", link.title, link.url);
    }
}

fn print_styles(catalog: &StyleCatalog, selected: Option<&str>) {
    for style in catalog.list() {
        let marker = if selected == Some(style.id.as_str()) {
            "*"
        } else {
            " "
        };
        println!("{marker} {:<14} {}", style.id, style.name);
    }
}

fn print_history(studio: &Studio) {
    let cursor = studio.history().cursor();
    for (idx, entry) in studio.history().entries().iter().enumerate() {
        let marker = if idx == cursor { ">" } else { " " };
        match entry {
            None => println!("{marker} 0 original"),
            Some(image) => println!(
                "{marker} {idx} {} ({})",
                image.mime_type,
                short_digest(image)
            ),
        }
    }
}

/// Reads a picked file fully into memory. Only the `image/*` filter applies:
/// known image extension, or sniffed image content.
fn load_image_file(path: &Path) -> Result<ImageRef> {
    let bytes = fs::read(path).with_context(|| format!("failed reading {}", path.display()))?;
    let mime = path
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(mime_for_extension)
        .map(str::to_string)
        .or_else(|| {
            image::guess_format(&bytes)
                .ok()
                .map(|format| format.to_mime_type().to_string())
        });
    let Some(mime) = mime else {
        bail!("{} is not an image", path.display());
    };
    Ok(ImageRef::from_bytes(mime, &bytes))
}

fn write_image(image: &ImageRef, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let bytes = image.decode_bytes()?;
    fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn output_path(
    explicit: Option<PathBuf>,
    out_dir: &Path,
    cursor: usize,
    image: &ImageRef,
) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    Ok(out_dir.join(default_output_name(cursor, image)))
}

fn default_output_name(cursor: usize, image: &ImageRef) -> String {
    format!(
        "design-{cursor}-{}.{}",
        short_digest(image),
        image.extension()
    )
}

fn short_digest(image: &ImageRef) -> String {
    let mut hasher = Sha256::new();
    hasher.update(image.data.as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..4])
}
