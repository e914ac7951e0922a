use std::sync::{Arc, Mutex, MutexGuard};

use makemyroom_contracts::chat::{Advice, RelatedLink};
use makemyroom_contracts::config::Settings;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use crate::{credential, DesignError, Transport};

pub const ADVICE_FALLBACK_TEXT: &str = "I couldn't generate a response.";
const LINK_FALLBACK_TITLE: &str = "Source";

/// Multi-turn conversation with the design-consultant persona.
///
/// Built explicitly by the caller. Clones share one conversation, so a worker
/// thread can `send` while the owner calls `reset`. The conversation lock is
/// only held to snapshot or append turns, never across the network call.
/// A turn is recorded once its reply arrived, and only if no `reset`
/// happened in between.
#[derive(Clone)]
pub struct AdvisorySession {
    transport: Arc<dyn Transport>,
    api_key: Option<String>,
    model: String,
    system_instruction: String,
    web_search: bool,
    conversation: Arc<Mutex<Conversation>>,
}

#[derive(Default)]
struct Conversation {
    turns: Vec<Value>,
    generation: u64,
}

impl AdvisorySession {
    pub fn new(transport: Arc<dyn Transport>, settings: &Settings) -> Self {
        Self {
            transport,
            api_key: settings.api_key().map(str::to_string),
            model: settings.api.chat_model.clone(),
            system_instruction: settings.api.system_instruction.clone(),
            web_search: settings.api.web_search,
            conversation: Arc::new(Mutex::new(Conversation::default())),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Number of completed exchanges.
    pub fn turn_count(&self) -> usize {
        self.conversation().turns.len() / 2
    }

    pub fn reset(&self) {
        let mut conversation = self.conversation();
        conversation.turns.clear();
        conversation.generation += 1;
    }

    pub fn send(&self, message: &str) -> Result<Advice, DesignError> {
        let api_key = credential(self.api_key.as_deref())?;
        let user_turn = json!({
            "role": "user",
            "parts": [{ "text": message }],
        });
        let (history, generation) = {
            let conversation = self.conversation();
            (conversation.turns.clone(), conversation.generation)
        };
        debug!(model = %self.model, turns = history.len() / 2, "sending advisory message");
        let payload = self.build_payload(history, &user_turn);

        let response = match self.transport.generate_content(&self.model, api_key, &payload) {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "advisory request failed");
                return Err(err);
            }
        };

        if let Some(content) = first_candidate(&response)
            .and_then(|candidate| candidate.get("content"))
            .cloned()
        {
            let mut conversation = self.conversation();
            if conversation.generation == generation {
                conversation.turns.push(user_turn);
                conversation.turns.push(with_model_role(content));
            } else {
                debug!("conversation reset while waiting; reply not recorded");
            }
        }
        let advice = extract_advice(&response);
        info!(links = advice.links.len(), "advisory reply received");
        Ok(advice)
    }

    // A poisoned lock still holds consistent turns: pushes happen in pairs
    // under one guard.
    fn conversation(&self) -> MutexGuard<'_, Conversation> {
        self.conversation
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn build_payload(&self, mut contents: Vec<Value>, user_turn: &Value) -> Value {
        contents.push(user_turn.clone());

        let mut payload = Map::new();
        payload.insert("contents".to_string(), Value::Array(contents));
        if !self.system_instruction.trim().is_empty() {
            payload.insert(
                "systemInstruction".to_string(),
                json!({ "parts": [{ "text": self.system_instruction }] }),
            );
        }
        if self.web_search {
            payload.insert("tools".to_string(), json!([{ "googleSearch": {} }]));
        }
        Value::Object(payload)
    }
}

fn first_candidate(response: &Value) -> Option<&Value> {
    response
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first())
}

fn with_model_role(content: Value) -> Value {
    let mut content = content.as_object().cloned().unwrap_or_default();
    content.insert("role".to_string(), Value::String("model".to_string()));
    Value::Object(content)
}

/// Reply text plus every web-sourced grounding chunk, in order, duplicates kept.
pub fn extract_advice(response: &Value) -> Advice {
    let candidate = first_candidate(response);

    let text = candidate
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter(|part| !part.get("thought").and_then(Value::as_bool).unwrap_or(false))
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect::<String>()
        })
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| ADVICE_FALLBACK_TEXT.to_string());

    let links = candidate
        .and_then(|candidate| candidate.get("groundingMetadata"))
        .and_then(|metadata| metadata.get("groundingChunks"))
        .and_then(Value::as_array)
        .map(|chunks| {
            chunks
                .iter()
                .filter_map(|chunk| chunk.get("web"))
                .filter_map(|web| {
                    let url = web.get("uri").and_then(Value::as_str)?;
                    if url.is_empty() {
                        return None;
                    }
                    let title = web
                        .get("title")
                        .and_then(Value::as_str)
                        .filter(|title| !title.is_empty())
                        .unwrap_or(LINK_FALLBACK_TITLE);
                    Some(RelatedLink {
                        title: title.to_string(),
                        url: url.to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Advice { text, links }
}
