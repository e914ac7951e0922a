use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use makemyroom_contracts::config::Settings;
use makemyroom_contracts::images::{ImageRef, DEFAULT_MIME_TYPE};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::{credential, DesignError, Transport};

pub fn redesign_instruction(style_prompt: &str) -> String {
    format!(
        "Redesign this room. {style_prompt}. Maintain the structural layout but change furniture, colors, and decor to match the style. High resolution, photorealistic."
    )
}

pub fn edit_instruction(edit_prompt: &str) -> String {
    format!("Edit this image: {edit_prompt}. Ensure the result is photorealistic and high quality.")
}

/// Image redesign and edit against the image model.
#[derive(Clone)]
pub struct Designer {
    transport: Arc<dyn Transport>,
    api_key: Option<String>,
    model: String,
}

impl Designer {
    pub fn new(transport: Arc<dyn Transport>, settings: &Settings) -> Self {
        Self {
            transport,
            api_key: settings.api_key().map(str::to_string),
            model: settings.api.image_model.clone(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn redesign(&self, image: &ImageRef, style_prompt: &str) -> Result<ImageRef, DesignError> {
        self.run("redesign", image, &redesign_instruction(style_prompt))
    }

    pub fn edit(&self, image: &ImageRef, edit_prompt: &str) -> Result<ImageRef, DesignError> {
        self.run("edit", image, &edit_instruction(edit_prompt))
    }

    fn run(&self, operation: &str, image: &ImageRef, instruction: &str) -> Result<ImageRef, DesignError> {
        let api_key = credential(self.api_key.as_deref())?;
        let payload = image_request_payload(instruction, image);
        debug!(
            operation,
            model = %self.model,
            source_mime = %image.mime_type,
            source_bytes = image.byte_len(),
            "sending image request"
        );
        let result = self
            .transport
            .generate_content(&self.model, api_key, &payload)
            .and_then(|response| extract_image(&response));
        match &result {
            Ok(out) => info!(operation, mime = %out.mime_type, bytes = out.byte_len(), "image received"),
            Err(err) => warn!(operation, error = %err, "image request failed"),
        }
        result
    }
}

fn image_request_payload(instruction: &str, image: &ImageRef) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [
                { "text": instruction },
                {
                    "inlineData": {
                        "mimeType": image.mime_type,
                        "data": image.data,
                    }
                },
            ],
        }],
        "generationConfig": {
            "responseModalities": ["TEXT", "IMAGE"],
        },
    })
}

/// First inline image of the first candidate; anything else is a content error.
pub fn extract_image(response_payload: &Value) -> Result<ImageRef, DesignError> {
    let parts = response_payload
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first())
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    for part in parts {
        let Some(inline) = part
            .get("inlineData")
            .or_else(|| part.get("inline_data"))
            .and_then(Value::as_object)
        else {
            continue;
        };
        let data = inline
            .get("data")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if data.is_empty() {
            continue;
        }
        BASE64
            .decode(data.as_bytes())
            .map_err(|err| DesignError::InvalidPayload(format!("image base64: {err}")))?;
        let mime_type = inline
            .get("mimeType")
            .or_else(|| inline.get("mime_type"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_MIME_TYPE);
        return Ok(ImageRef::new(mime_type, data));
    }

    Err(DesignError::NoImageProduced)
}
