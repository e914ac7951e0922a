use serde::Serialize;

use crate::studio::StudioRejection;

pub const WELCOME_MESSAGE_ID: &str = "welcome";
pub const WELCOME_TEXT: &str = "I'm your design consultant. You can ask me for advice, shoppable links, or tell me to refine the room design (e.g., 'Make the rug blue').";
pub const EDIT_PENDING_TEXT: &str = "Refining your room design...";
pub const EDIT_DONE_TEXT: &str = "Here is the updated design.";
pub const EDIT_DISCARDED_TEXT: &str =
    "That refinement finished after the design changed, so it was not applied.";
pub const FAILURE_TEXT: &str = "Sorry, I encountered an error.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelatedLink {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: ChatRole,
    pub text: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related_links: Vec<RelatedLink>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self::with_id(new_message_id(), ChatRole::User, text)
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self::with_id(new_message_id(), ChatRole::Model, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        let mut message = Self::model(text);
        message.is_error = true;
        message
    }

    pub fn with_id(id: impl Into<String>, role: ChatRole, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role,
            text: text.into(),
            is_error: false,
            related_links: Vec::new(),
        }
    }
}

/// Reply from the advisory service.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Advice {
    pub text: String,
    pub links: Vec<RelatedLink>,
}

/// Routes a submission to the advisory path or the image-edit path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    #[default]
    Chat,
    Edit,
}

impl SessionMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "chat" | "advice" => Some(Self::Chat),
            "edit" | "magic" | "magic-edit" => Some(Self::Edit),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Edit => "edit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingResponse,
}

/// What the caller has to run after a submission was accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingTurn {
    Edit {
        instruction: String,
        loading_id: String,
    },
    Advice {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    Applied,
    Discarded,
    Failed,
}

/// Conversation transcript plus the single-outstanding-request state machine.
#[derive(Debug, Clone)]
pub struct ChatSession {
    mode: SessionMode,
    state: SessionState,
    messages: Vec<ChatMessage>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            mode: SessionMode::Chat,
            state: SessionState::Idle,
            messages: vec![ChatMessage::with_id(
                WELCOME_MESSAGE_ID,
                ChatRole::Model,
                WELCOME_TEXT,
            )],
        }
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_processing(&self) -> bool {
        self.state == SessionState::AwaitingResponse
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Edit mode can only be chosen once there is an image to edit.
    pub fn set_mode(&mut self, mode: SessionMode, has_image: bool) -> Result<(), StudioRejection> {
        if mode == SessionMode::Edit && !has_image {
            return Err(StudioRejection::NoImage);
        }
        self.mode = mode;
        Ok(())
    }

    /// Accepts a submission and moves to `AwaitingResponse`.
    ///
    /// Edit mode without an image falls through to the advisory path.
    pub fn begin(
        &mut self,
        input: &str,
        has_image: bool,
    ) -> Result<(PendingTurn, Vec<ChatMessage>), StudioRejection> {
        if input.trim().is_empty() {
            return Err(StudioRejection::EmptyInput);
        }
        if self.is_processing() {
            return Err(StudioRejection::Busy);
        }

        let user = ChatMessage::user(input);
        self.messages.push(user.clone());
        self.state = SessionState::AwaitingResponse;

        if self.mode == SessionMode::Edit && has_image {
            let loading = ChatMessage::with_id(
                format!("loading-edit-{}", uuid::Uuid::new_v4()),
                ChatRole::Model,
                EDIT_PENDING_TEXT,
            );
            self.messages.push(loading.clone());
            let turn = PendingTurn::Edit {
                instruction: input.to_string(),
                loading_id: loading.id.clone(),
            };
            return Ok((turn, vec![user, loading]));
        }

        let turn = PendingTurn::Advice {
            message: input.to_string(),
        };
        Ok((turn, vec![user]))
    }

    /// Drops the placeholder first so no outcome leaves it behind.
    pub fn complete_edit(
        &mut self,
        loading_id: &str,
        outcome: EditOutcome,
    ) -> (Option<ChatMessage>, ChatMessage) {
        let removed = self.remove(loading_id);
        self.state = SessionState::Idle;
        let reply = match outcome {
            EditOutcome::Applied => ChatMessage::model(EDIT_DONE_TEXT),
            EditOutcome::Discarded => ChatMessage::model(EDIT_DISCARDED_TEXT),
            EditOutcome::Failed => ChatMessage::error(FAILURE_TEXT),
        };
        self.messages.push(reply.clone());
        (removed, reply)
    }

    pub fn complete_advice(&mut self, result: Result<Advice, String>) -> ChatMessage {
        self.state = SessionState::Idle;
        let reply = match result {
            Ok(advice) => {
                let mut message = ChatMessage::model(advice.text);
                message.related_links = advice.links;
                message
            }
            Err(_) => ChatMessage::error(FAILURE_TEXT),
        };
        self.messages.push(reply.clone());
        reply
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn remove(&mut self, id: &str) -> Option<ChatMessage> {
        let index = self.messages.iter().position(|message| message.id == id)?;
        Some(self.messages.remove(index))
    }
}

fn new_message_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::{
        Advice, ChatRole, ChatSession, EditOutcome, PendingTurn, RelatedLink, SessionMode,
        SessionState, EDIT_DONE_TEXT, EDIT_PENDING_TEXT, FAILURE_TEXT, WELCOME_MESSAGE_ID,
    };
    use crate::studio::StudioRejection;

    #[test]
    fn starts_idle_in_chat_mode_with_welcome() {
        let session = ChatSession::new();
        assert_eq!(session.mode(), SessionMode::Chat);
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].id, WELCOME_MESSAGE_ID);
    }

    #[test]
    fn edit_mode_requires_an_image() {
        let mut session = ChatSession::new();
        assert_eq!(
            session.set_mode(SessionMode::Edit, false),
            Err(StudioRejection::NoImage)
        );
        assert_eq!(session.mode(), SessionMode::Chat);
        assert_eq!(session.set_mode(SessionMode::Edit, true), Ok(()));
        assert_eq!(session.mode(), SessionMode::Edit);
    }

    #[test]
    fn blank_input_and_second_submission_are_rejected() {
        let mut session = ChatSession::new();
        assert_eq!(
            session.begin("   ", true).err(),
            Some(StudioRejection::EmptyInput)
        );
        assert!(session.begin("which sofa?", true).is_ok());
        assert_eq!(
            session.begin("and a rug?", true).err(),
            Some(StudioRejection::Busy)
        );
        assert_eq!(session.messages().len(), 2);
    }

    #[test]
    fn edit_turn_removes_placeholder_on_every_outcome() {
        for outcome in [
            EditOutcome::Applied,
            EditOutcome::Discarded,
            EditOutcome::Failed,
        ] {
            let mut session = ChatSession::new();
            session
                .set_mode(SessionMode::Edit, true)
                .expect("edit mode available");
            let (turn, appended) = session.begin("make the walls green", true).expect("accepted");
            let PendingTurn::Edit { loading_id, .. } = turn else {
                panic!("expected edit turn");
            };
            assert_eq!(appended[1].text, EDIT_PENDING_TEXT);

            let (removed, reply) = session.complete_edit(&loading_id, outcome.clone());
            assert_eq!(removed.map(|message| message.id), Some(loading_id.clone()));
            assert!(session
                .messages()
                .iter()
                .all(|message| message.id != loading_id));
            assert_eq!(session.state(), SessionState::Idle);
            assert_eq!(reply.is_error, outcome == EditOutcome::Failed);
            if outcome == EditOutcome::Applied {
                assert_eq!(reply.text, EDIT_DONE_TEXT);
            }
        }
    }

    #[test]
    fn edit_mode_without_image_routes_to_advice() {
        let mut session = ChatSession::new();
        session
            .set_mode(SessionMode::Edit, true)
            .expect("edit mode available");
        let (turn, _) = session.begin("brighter please", false).expect("accepted");
        assert_eq!(
            turn,
            PendingTurn::Advice {
                message: "brighter please".to_string()
            }
        );
    }

    #[test]
    fn advice_reply_carries_links_and_failure_is_flagged() {
        let mut session = ChatSession::new();
        session.begin("lamps?", false).expect("accepted");
        let reply = session.complete_advice(Ok(Advice {
            text: "Try a brass floor lamp.".to_string(),
            links: vec![RelatedLink {
                title: "Source".to_string(),
                url: "https://shop.example/lamp".to_string(),
            }],
        }));
        assert_eq!(reply.role, ChatRole::Model);
        assert_eq!(reply.related_links.len(), 1);
        assert!(!session.is_processing());

        session.begin("rugs?", false).expect("accepted");
        let failed = session.complete_advice(Err("boom".to_string()));
        assert!(failed.is_error);
        assert_eq!(failed.text, FAILURE_TEXT);
        assert!(failed.related_links.is_empty());
    }

    #[test]
    fn session_mode_parses_aliases() {
        assert_eq!(SessionMode::parse("Magic"), Some(SessionMode::Edit));
        assert_eq!(SessionMode::parse("advice"), Some(SessionMode::Chat));
        assert_eq!(SessionMode::parse("paint"), None);
    }
}
