mod command_parser;
mod command_registry;
mod session;

pub use command_parser::{help_lines, parse_command, StudioCommand};
pub use session::{
    Advice, ChatMessage, ChatRole, ChatSession, EditOutcome, PendingTurn, RelatedLink,
    SessionMode, SessionState, EDIT_DISCARDED_TEXT, EDIT_DONE_TEXT, EDIT_PENDING_TEXT,
    FAILURE_TEXT, WELCOME_MESSAGE_ID, WELCOME_TEXT,
};
