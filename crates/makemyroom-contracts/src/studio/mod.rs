mod history;
mod slider;

use serde::Serialize;
use thiserror::Error;

use crate::chat::{
    Advice, ChatMessage, ChatSession, EditOutcome, PendingTurn, SessionMode,
};
use crate::images::ImageRef;
use crate::styles::{DesignStyle, StyleCatalog};

pub use history::History;
pub use slider::{ComparisonSlider, ContainerRect, PointerEvent, DEFAULT_POSITION};

pub const REDESIGN_FAILED_ALERT: &str =
    "Failed to generate design. Please check your API key and try again.";
pub const REDESIGN_DISCARDED_ALERT: &str =
    "The redesign finished after the design history changed, so it was not applied.";

/// Which screen is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AppMode {
    Upload,
    Design,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StudioRejection {
    #[error("upload a photo first")]
    NoImage,
    #[error("a request is already in flight")]
    Busy,
    #[error("nothing to send")]
    EmptyInput,
    #[error("unknown style '{0}'")]
    UnknownStyle(String),
}

/// Identifies the state a job was submitted against.
///
/// `epoch` changes on upload and Start Over. `generation` changes whenever a
/// push rewrites the history, and `cursor` is the position within it, so an
/// undo followed by a redo lands on the same ticket again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Ticket {
    pub epoch: u64,
    pub generation: u64,
    pub cursor: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedesignJob {
    pub ticket: Ticket,
    pub source: ImageRef,
    pub style: DesignStyle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionJob {
    Edit {
        ticket: Ticket,
        image: ImageRef,
        instruction: String,
        loading_id: String,
    },
    Advice {
        ticket: Ticket,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Redesign,
    Edit,
    Advice,
}

/// Notifications delivered to subscribers after each mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum StudioChange {
    ModeChanged(AppMode),
    ImageUploaded { mime_type: String, bytes: usize },
    StyleSelected(Option<String>),
    HistoryChanged { cursor: usize, len: usize },
    BusyChanged { generating: bool, processing: bool },
    SessionModeChanged(SessionMode),
    MessageAppended(ChatMessage),
    MessageRemoved(String),
    SliderMoved(f64),
    Alert(String),
    ResponseDiscarded { kind: JobKind, ticket: Ticket },
}

impl StudioChange {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ModeChanged(_) => "mode_changed",
            Self::ImageUploaded { .. } => "image_uploaded",
            Self::StyleSelected(_) => "style_selected",
            Self::HistoryChanged { .. } => "history_changed",
            Self::BusyChanged { .. } => "busy_changed",
            Self::SessionModeChanged(_) => "session_mode_changed",
            Self::MessageAppended(_) => "message_appended",
            Self::MessageRemoved(_) => "message_removed",
            Self::SliderMoved(_) => "slider_moved",
            Self::Alert(_) => "alert",
            Self::ResponseDiscarded { .. } => "response_discarded",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&StudioChange)>;

/// Process-local UI state for one design session.
///
/// All mutation goes through methods that validate the transition and then
/// notify subscribers. Network calls happen elsewhere: the `begin_*` methods
/// hand out a job, the matching `finish_*` method applies its result.
pub struct Studio {
    catalog: StyleCatalog,
    mode: AppMode,
    original: Option<ImageRef>,
    history: History,
    selected_style_id: Option<String>,
    is_generating: bool,
    chat: ChatSession,
    slider: ComparisonSlider,
    epoch: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl Default for Studio {
    fn default() -> Self {
        Self::new(StyleCatalog::default())
    }
}

impl std::fmt::Debug for Studio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Studio")
            .field("mode", &self.mode)
            .field("history_len", &self.history.len())
            .field("cursor", &self.history.cursor())
            .field("selected_style_id", &self.selected_style_id)
            .field("is_generating", &self.is_generating)
            .field("is_processing", &self.chat.is_processing())
            .field("epoch", &self.epoch)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Studio {
    pub fn new(catalog: StyleCatalog) -> Self {
        Self {
            catalog,
            mode: AppMode::Upload,
            original: None,
            history: History::new(),
            selected_style_id: None,
            is_generating: false,
            chat: ChatSession::new(),
            slider: ComparisonSlider::new(),
            epoch: 0,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&StudioChange) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    pub fn catalog(&self) -> &StyleCatalog {
        &self.catalog
    }

    pub fn mode(&self) -> AppMode {
        self.mode
    }

    pub fn original(&self) -> Option<&ImageRef> {
        self.original.as_ref()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn selected_style_id(&self) -> Option<&str> {
        self.selected_style_id.as_deref()
    }

    pub fn is_generating(&self) -> bool {
        self.is_generating
    }

    pub fn is_processing(&self) -> bool {
        self.chat.is_processing()
    }

    pub fn chat(&self) -> &ChatSession {
        &self.chat
    }

    pub fn slider(&self) -> &ComparisonSlider {
        &self.slider
    }

    pub fn ticket(&self) -> Ticket {
        Ticket {
            epoch: self.epoch,
            generation: self.history.generation(),
            cursor: self.history.cursor(),
        }
    }

    /// The image an edit would start from: the generated image under the
    /// cursor, or the upload while the cursor sits on the placeholder.
    pub fn current_image(&self) -> Option<&ImageRef> {
        self.history.current().or(self.original.as_ref())
    }

    /// `(before, after)` for the comparison view; `None` until something was generated.
    pub fn comparison(&self) -> Option<(&ImageRef, &ImageRef)> {
        let after = self.history.current()?;
        let before = self.history.previous().or(self.original.as_ref())?;
        Some((before, after))
    }

    pub fn upload(&mut self, image: ImageRef) {
        let mime_type = image.mime_type.clone();
        let bytes = image.byte_len();
        self.clear_session();
        self.original = Some(image);
        self.mode = AppMode::Design;
        self.notify(StudioChange::ImageUploaded { mime_type, bytes });
        self.notify(StudioChange::ModeChanged(AppMode::Design));
        self.notify_history();
    }

    /// "Start Over": back to the upload screen with everything cleared.
    pub fn start_over(&mut self) {
        self.clear_session();
        self.mode = AppMode::Upload;
        self.notify(StudioChange::ModeChanged(AppMode::Upload));
        self.notify(StudioChange::StyleSelected(None));
        self.notify_history();
        self.notify_busy();
    }

    pub fn begin_redesign(&mut self, style_id: &str) -> Result<RedesignJob, StudioRejection> {
        let Some(source) = self.original.clone() else {
            return Err(StudioRejection::NoImage);
        };
        if self.is_generating {
            return Err(StudioRejection::Busy);
        }
        let Some(style) = self.catalog.get(style_id).cloned() else {
            return Err(StudioRejection::UnknownStyle(style_id.to_string()));
        };

        self.selected_style_id = Some(style.id.clone());
        self.is_generating = true;
        self.slider.reset();
        self.notify(StudioChange::StyleSelected(Some(style.id.clone())));
        self.notify(StudioChange::SliderMoved(self.slider.position()));
        self.notify_busy();

        Ok(RedesignJob {
            ticket: self.ticket(),
            source,
            style,
        })
    }

    /// Applies a redesign result. Returns `true` when it landed in the history.
    pub fn finish_redesign(&mut self, ticket: Ticket, result: Result<ImageRef, String>) -> bool {
        if ticket.epoch == self.epoch {
            self.is_generating = false;
            self.notify_busy();
        }
        match result {
            Ok(image) if ticket == self.ticket() => {
                self.history.push(image);
                self.notify_history();
                true
            }
            Ok(_) => {
                self.notify(StudioChange::ResponseDiscarded {
                    kind: JobKind::Redesign,
                    ticket,
                });
                if ticket.epoch == self.epoch {
                    self.notify(StudioChange::Alert(REDESIGN_DISCARDED_ALERT.to_string()));
                }
                false
            }
            Err(_) => {
                if ticket.epoch == self.epoch {
                    self.notify(StudioChange::Alert(REDESIGN_FAILED_ALERT.to_string()));
                }
                false
            }
        }
    }

    pub fn set_session_mode(&mut self, mode: SessionMode) -> Result<(), StudioRejection> {
        let has_image = self.current_image().is_some();
        self.chat.set_mode(mode, has_image)?;
        self.notify(StudioChange::SessionModeChanged(mode));
        Ok(())
    }

    /// Chat input only exists on the design screen.
    pub fn submit(&mut self, input: &str) -> Result<SubmissionJob, StudioRejection> {
        if self.mode != AppMode::Design {
            return Err(StudioRejection::NoImage);
        }
        let image = self.current_image().cloned();
        let (turn, appended) = self.chat.begin(input, image.is_some())?;
        let ticket = self.ticket();
        for message in appended {
            self.notify(StudioChange::MessageAppended(message));
        }
        self.notify_busy();

        let job = match (turn, image) {
            (
                PendingTurn::Edit {
                    instruction,
                    loading_id,
                },
                Some(image),
            ) => SubmissionJob::Edit {
                ticket,
                image,
                instruction,
                loading_id,
            },
            (PendingTurn::Edit { instruction, .. }, None) => SubmissionJob::Advice {
                ticket,
                message: instruction,
            },
            (PendingTurn::Advice { message }, _) => SubmissionJob::Advice { ticket, message },
        };
        Ok(job)
    }

    /// Applies an edit result. Returns `true` when it landed in the history.
    pub fn finish_edit(
        &mut self,
        ticket: Ticket,
        loading_id: &str,
        result: Result<ImageRef, String>,
    ) -> bool {
        if ticket.epoch != self.epoch {
            self.notify(StudioChange::ResponseDiscarded {
                kind: JobKind::Edit,
                ticket,
            });
            return false;
        }

        let (outcome, image) = match result {
            Ok(image) if ticket == self.ticket() => (EditOutcome::Applied, Some(image)),
            Ok(_) => (EditOutcome::Discarded, None),
            Err(_) => (EditOutcome::Failed, None),
        };
        let (removed, reply) = self.chat.complete_edit(loading_id, outcome.clone());
        if let Some(removed) = removed {
            self.notify(StudioChange::MessageRemoved(removed.id));
        }
        self.notify(StudioChange::MessageAppended(reply));
        self.notify_busy();

        match (outcome, image) {
            (EditOutcome::Applied, Some(image)) => {
                self.history.push(image);
                self.notify_history();
                true
            }
            (EditOutcome::Discarded, _) => {
                self.notify(StudioChange::ResponseDiscarded {
                    kind: JobKind::Edit,
                    ticket,
                });
                false
            }
            _ => false,
        }
    }

    pub fn finish_advice(&mut self, ticket: Ticket, result: Result<Advice, String>) {
        if ticket.epoch != self.epoch {
            self.notify(StudioChange::ResponseDiscarded {
                kind: JobKind::Advice,
                ticket,
            });
            return;
        }
        let reply = self.chat.complete_advice(result);
        self.notify(StudioChange::MessageAppended(reply));
        self.notify_busy();
    }

    pub fn undo(&mut self) -> bool {
        let moved = self.history.undo();
        if moved {
            self.notify_history();
        }
        moved
    }

    pub fn redo(&mut self) -> bool {
        let moved = self.history.redo();
        if moved {
            self.notify_history();
        }
        moved
    }

    pub fn pointer(&mut self, event: PointerEvent, rect: ContainerRect) {
        if self.slider.handle(event, rect) {
            self.notify(StudioChange::SliderMoved(self.slider.position()));
        }
    }

    fn clear_session(&mut self) {
        self.epoch += 1;
        self.original = None;
        self.history = History::new();
        self.selected_style_id = None;
        self.is_generating = false;
        self.chat.reset();
        self.slider.reset();
    }

    fn notify_history(&mut self) {
        let change = StudioChange::HistoryChanged {
            cursor: self.history.cursor(),
            len: self.history.len(),
        };
        self.notify(change);
    }

    fn notify_busy(&mut self) {
        let change = StudioChange::BusyChanged {
            generating: self.is_generating,
            processing: self.chat.is_processing(),
        };
        self.notify(change);
    }

    fn notify(&mut self, change: StudioChange) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(&change);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::{
        AppMode, ContainerRect, JobKind, PointerEvent, Studio, StudioChange, StudioRejection,
        SubmissionJob, REDESIGN_DISCARDED_ALERT, REDESIGN_FAILED_ALERT,
    };
    use crate::chat::{SessionMode, EDIT_DISCARDED_TEXT, EDIT_DONE_TEXT, EDIT_PENDING_TEXT};
    use crate::images::ImageRef;

    fn image(tag: &str) -> ImageRef {
        ImageRef::new("image/png", tag)
    }

    fn recording(studio: &mut Studio) -> Rc<RefCell<Vec<StudioChange>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        studio.subscribe(move |change| sink.borrow_mut().push(change.clone()));
        seen
    }

    fn expect_edit(job: SubmissionJob) -> (super::Ticket, ImageRef, String, String) {
        match job {
            SubmissionJob::Edit {
                ticket,
                image,
                instruction,
                loading_id,
            } => (ticket, image, instruction, loading_id),
            other => panic!("expected edit job, got {other:?}"),
        }
    }

    #[test]
    fn upload_switches_to_design_screen() {
        let mut studio = Studio::default();
        assert_eq!(studio.mode(), AppMode::Upload);
        studio.upload(image("a"));
        assert_eq!(studio.mode(), AppMode::Design);
        assert_eq!(studio.current_image(), Some(&image("a")));
        assert!(studio.comparison().is_none());
    }

    #[test]
    fn redesign_requires_upload_and_known_style() {
        let mut studio = Studio::default();
        assert_eq!(
            studio.begin_redesign("scandinavian").err(),
            Some(StudioRejection::NoImage)
        );
        studio.upload(image("a"));
        assert_eq!(
            studio.begin_redesign("baroque").err(),
            Some(StudioRejection::UnknownStyle("baroque".to_string()))
        );
        assert!(!studio.is_generating());
    }

    #[test]
    fn second_redesign_while_generating_is_rejected() {
        let mut studio = Studio::default();
        studio.upload(image("a"));
        let job = studio.begin_redesign("industrial").expect("accepted");
        assert_eq!(job.source, image("a"));
        assert_eq!(
            studio.begin_redesign("bohemian").err(),
            Some(StudioRejection::Busy)
        );
        assert_eq!(studio.selected_style_id(), Some("industrial"));
    }

    #[test]
    fn failed_redesign_alerts_and_leaves_history_alone() {
        let mut studio = Studio::default();
        studio.upload(image("a"));
        let seen = recording(&mut studio);
        let job = studio.begin_redesign("cyberpunk").expect("accepted");
        assert!(!studio.finish_redesign(job.ticket, Err("offline".to_string())));
        assert_eq!(studio.history().len(), 1);
        assert!(!studio.is_generating());
        assert!(seen
            .borrow()
            .contains(&StudioChange::Alert(REDESIGN_FAILED_ALERT.to_string())));
    }

    #[test]
    fn design_edit_undo_restyle_scenario() {
        let mut studio = Studio::default();
        studio.upload(image("a"));

        let job = studio.begin_redesign("scandinavian").expect("accepted");
        assert!(job.style.prompt.contains("Scandinavian"));
        assert!(studio.finish_redesign(job.ticket, Ok(image("b"))));
        assert_eq!(studio.history().entries(), &[None, Some(image("b"))]);
        assert_eq!(studio.history().cursor(), 1);
        assert_eq!(studio.comparison(), Some((&image("a"), &image("b"))));

        studio.set_session_mode(SessionMode::Edit).expect("edit mode");
        let (ticket, source, instruction, loading_id) =
            expect_edit(studio.submit("make the walls green").expect("accepted"));
        assert_eq!(source, image("b"));
        assert_eq!(instruction, "make the walls green");
        assert!(studio.finish_edit(ticket, &loading_id, Ok(image("c"))));
        assert_eq!(
            studio.history().entries(),
            &[None, Some(image("b")), Some(image("c"))]
        );
        assert_eq!(studio.history().cursor(), 2);
        assert_eq!(studio.comparison(), Some((&image("b"), &image("c"))));
        let last = studio.chat().messages().last().map(|m| m.text.clone());
        assert_eq!(last.as_deref(), Some(EDIT_DONE_TEXT));

        assert!(studio.undo());
        assert_eq!(studio.history().cursor(), 1);
        assert_eq!(studio.current_image(), Some(&image("b")));

        let job = studio.begin_redesign("bohemian").expect("accepted");
        assert!(studio.finish_redesign(job.ticket, Ok(image("d"))));
        assert_eq!(
            studio.history().entries(),
            &[None, Some(image("b")), Some(image("d"))]
        );
        assert_eq!(studio.history().cursor(), 2);
    }

    #[test]
    fn stale_redesign_after_undo_is_discarded() {
        let mut studio = Studio::default();
        studio.upload(image("a"));
        let first = studio.begin_redesign("industrial").expect("accepted");
        studio.finish_redesign(first.ticket, Ok(image("b")));

        let seen = recording(&mut studio);
        let job = studio.begin_redesign("bohemian").expect("accepted");
        studio.undo();
        assert!(!studio.finish_redesign(job.ticket, Ok(image("late"))));
        assert_eq!(studio.history().entries(), &[None, Some(image("b"))]);
        assert_eq!(studio.history().cursor(), 0);
        assert!(!studio.is_generating());
        assert!(seen.borrow().iter().any(|change| matches!(
            change,
            StudioChange::ResponseDiscarded {
                kind: JobKind::Redesign,
                ..
            }
        )));
        assert!(seen
            .borrow()
            .contains(&StudioChange::Alert(REDESIGN_DISCARDED_ALERT.to_string())));
    }

    #[test]
    fn redesign_overtaken_by_edit_is_announced() {
        let mut studio = Studio::default();
        studio.upload(image("a"));
        let seen = recording(&mut studio);
        let job = studio.begin_redesign("industrial").expect("accepted");
        studio.set_session_mode(SessionMode::Edit).expect("edit mode");
        let (ticket, _, _, loading_id) =
            expect_edit(studio.submit("add a lamp").expect("accepted"));
        assert!(studio.finish_edit(ticket, &loading_id, Ok(image("c"))));

        assert!(!studio.finish_redesign(job.ticket, Ok(image("d"))));
        assert_eq!(studio.history().entries(), &[None, Some(image("c"))]);
        assert!(!studio.is_generating());
        let alerts: Vec<StudioChange> = seen
            .borrow()
            .iter()
            .filter(|change| matches!(change, StudioChange::Alert(_)))
            .cloned()
            .collect();
        assert_eq!(
            alerts,
            vec![StudioChange::Alert(REDESIGN_DISCARDED_ALERT.to_string())]
        );
    }

    #[test]
    fn redesign_survives_undo_then_redo() {
        let mut studio = Studio::default();
        studio.upload(image("a"));
        let first = studio.begin_redesign("industrial").expect("accepted");
        assert!(studio.finish_redesign(first.ticket, Ok(image("b"))));

        let job = studio.begin_redesign("bohemian").expect("accepted");
        assert!(studio.undo());
        assert!(studio.redo());
        assert_eq!(studio.ticket(), job.ticket);
        assert!(studio.finish_redesign(job.ticket, Ok(image("c"))));
        assert_eq!(
            studio.history().entries(),
            &[None, Some(image("b")), Some(image("c"))]
        );
        assert_eq!(studio.history().cursor(), 2);
    }

    #[test]
    fn redesign_is_stale_once_an_undo_push_rewrites_the_same_slot() {
        let mut studio = Studio::default();
        studio.upload(image("a"));
        let first = studio.begin_redesign("industrial").expect("accepted");
        studio.finish_redesign(first.ticket, Ok(image("b")));
        let second = studio.begin_redesign("bohemian").expect("accepted");
        studio.finish_redesign(second.ticket, Ok(image("c")));

        let job = studio.begin_redesign("cyberpunk").expect("accepted");
        studio.set_session_mode(SessionMode::Edit).expect("edit mode");
        studio.undo();
        let (ticket, _, _, loading_id) =
            expect_edit(studio.submit("warmer light").expect("accepted"));
        studio.finish_edit(ticket, &loading_id, Ok(image("d")));
        assert_eq!(studio.history().cursor(), job.ticket.cursor);
        assert_eq!(studio.history().len(), 3);

        assert!(!studio.finish_redesign(job.ticket, Ok(image("late"))));
        assert_eq!(
            studio.history().entries(),
            &[None, Some(image("b")), Some(image("d"))]
        );
    }

    #[test]
    fn stale_edit_clears_placeholder_and_explains() {
        let mut studio = Studio::default();
        studio.upload(image("a"));
        let job = studio.begin_redesign("industrial").expect("accepted");
        studio.finish_redesign(job.ticket, Ok(image("b")));
        studio.set_session_mode(SessionMode::Edit).expect("edit mode");

        let (ticket, _, _, loading_id) = expect_edit(studio.submit("add plants").expect("accepted"));
        studio.undo();
        assert!(!studio.finish_edit(ticket, &loading_id, Ok(image("c"))));
        let texts: Vec<&str> = studio
            .chat()
            .messages()
            .iter()
            .map(|message| message.text.as_str())
            .collect();
        assert!(!texts.contains(&EDIT_PENDING_TEXT));
        assert_eq!(texts.last(), Some(&EDIT_DISCARDED_TEXT));
        assert!(!studio.is_processing());
    }

    #[test]
    fn failed_edit_is_flagged_in_transcript() {
        let mut studio = Studio::default();
        studio.upload(image("a"));
        studio.set_session_mode(SessionMode::Edit).expect("edit mode");
        let (ticket, source, _, loading_id) =
            expect_edit(studio.submit("remove the rug").expect("accepted"));
        assert_eq!(source, image("a"));
        assert!(!studio.finish_edit(ticket, &loading_id, Err("503".to_string())));
        let last = studio.chat().messages().last().cloned().expect("reply");
        assert!(last.is_error);
        assert_eq!(studio.history().len(), 1);
    }

    #[test]
    fn start_over_resets_everything_and_drops_late_results() {
        let mut studio = Studio::default();
        studio.upload(image("a"));
        let job = studio.begin_redesign("industrial").expect("accepted");
        let chat = studio.submit("what rug?").expect("accepted");
        studio.start_over();

        assert_eq!(studio.mode(), AppMode::Upload);
        assert!(studio.original().is_none());
        assert!(studio.selected_style_id().is_none());
        assert!(!studio.is_generating());
        assert!(!studio.is_processing());
        assert_eq!(studio.chat().messages().len(), 1);

        assert!(!studio.finish_redesign(job.ticket, Ok(image("b"))));
        if let SubmissionJob::Advice { ticket, .. } = chat {
            studio.finish_advice(ticket, Err("late".to_string()));
        }
        assert_eq!(studio.history().len(), 1);
        assert_eq!(studio.chat().messages().len(), 1);
    }

    #[test]
    fn edit_mode_and_chat_unavailable_before_upload() {
        let mut studio = Studio::default();
        assert_eq!(
            studio.set_session_mode(SessionMode::Edit),
            Err(StudioRejection::NoImage)
        );
        assert_eq!(studio.submit("hello").err(), Some(StudioRejection::NoImage));
        assert_eq!(studio.chat().messages().len(), 1);
    }

    #[test]
    fn slider_moves_notify_and_redesign_resets_position() {
        let mut studio = Studio::default();
        studio.upload(image("a"));
        let seen = recording(&mut studio);
        let rect = ContainerRect::new(0.0, 200.0);
        studio.pointer(PointerEvent::HandleDown, rect);
        studio.pointer(PointerEvent::Move { client_x: 50.0 }, rect);
        studio.pointer(PointerEvent::Up, rect);
        assert_eq!(studio.slider().position(), 25.0);
        assert!(seen.borrow().contains(&StudioChange::SliderMoved(25.0)));

        studio.begin_redesign("industrial").expect("accepted");
        assert_eq!(studio.slider().position(), 50.0);
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let mut studio = Studio::default();
        let seen = Rc::new(RefCell::new(0usize));
        let sink = Rc::clone(&seen);
        let id = studio.subscribe(move |_| *sink.borrow_mut() += 1);
        studio.upload(image("a"));
        let after_upload = *seen.borrow();
        assert!(after_upload > 0);
        assert!(studio.unsubscribe(id));
        studio.undo();
        studio.start_over();
        assert_eq!(*seen.borrow(), after_upload);
        assert!(!studio.unsubscribe(id));
    }
}
