#[derive(Clone, Copy, Debug)]
pub(crate) struct CommandSpec {
    pub command: &'static str,
    pub usage: &'static str,
}

pub(crate) const NO_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "styles",
        usage: "/styles",
    },
    CommandSpec {
        command: "undo",
        usage: "/undo",
    },
    CommandSpec {
        command: "redo",
        usage: "/redo",
    },
    CommandSpec {
        command: "history",
        usage: "/history",
    },
    CommandSpec {
        command: "reset",
        usage: "/reset",
    },
    CommandSpec {
        command: "help",
        usage: "/help",
    },
    CommandSpec {
        command: "quit",
        usage: "/quit",
    },
];

pub(crate) const PATH_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "upload",
        usage: "/upload <path>",
    },
    CommandSpec {
        command: "compare",
        usage: "/compare [path]",
    },
    CommandSpec {
        command: "save",
        usage: "/save [path]",
    },
];

pub(crate) const VALUE_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "style",
        usage: "/style <id>",
    },
    CommandSpec {
        command: "mode",
        usage: "/mode chat|edit",
    },
    CommandSpec {
        command: "slider",
        usage: "/slider <0-100>",
    },
];

pub(crate) const COMMAND_ALIASES: &[(&str, &str)] = &[
    ("exit", "quit"),
    ("q", "quit"),
    ("start-over", "reset"),
    ("startover", "reset"),
];

pub(crate) fn all_specs() -> impl Iterator<Item = &'static CommandSpec> {
    NO_ARG_COMMANDS
        .iter()
        .chain(PATH_COMMANDS.iter())
        .chain(VALUE_COMMANDS.iter())
}

pub(crate) fn find_spec(command: &str) -> Option<&'static CommandSpec> {
    all_specs().find(|spec| spec.command == command)
}

pub(crate) fn resolve_alias(command: &str) -> &str {
    COMMAND_ALIASES
        .iter()
        .find(|(alias, _)| *alias == command)
        .map(|(_, target)| *target)
        .unwrap_or(command)
}
