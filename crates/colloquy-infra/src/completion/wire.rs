//! Wire formats of the completion endpoint.
//!
//! Two request variants share one endpoint family: a multimodal/streaming
//! variant whose message content is an array of typed parts and whose
//! response is SSE `data:` lines of `{"text": …}` fragments, and a
//! text-only variant with plain-string content answered in one JSON body
//! shaped like `choices[0].message.content`.
//!
//! Decoding is kept in pure functions here so it can be tested without a
//! socket.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

use colloquy_types::completion::{ASSISTANT_MARKER, ContentPart, THINK_CLOSE, strip_after_marker};
use colloquy_types::error::RequestError;

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct MultimodalRequest {
    pub messages: Vec<MultimodalMessage>,
}

#[derive(Debug, Serialize)]
pub struct MultimodalMessage {
    pub role: String,
    pub content: Vec<ContentPart>,
}

impl MultimodalRequest {
    /// Single user message of a text part followed by one part per image.
    /// The text part is present even when empty; the endpoint accepts it.
    pub fn user_turn(text: &str, images: &[Vec<u8>]) -> Self {
        let mut content = vec![ContentPart::text(text)];
        content.extend(encode_image_parts(images));
        Self {
            messages: vec![MultimodalMessage {
                role: "user".to_string(),
                content,
            }],
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TextRequest {
    pub messages: Vec<TextMessage>,
}

#[derive(Debug, Serialize)]
pub struct TextMessage {
    pub role: String,
    pub content: String,
}

impl TextRequest {
    pub fn user_turn(text: &str) -> Self {
        Self {
            messages: vec![TextMessage {
                role: "user".to_string(),
                content: text.to_string(),
            }],
        }
    }
}

/// Base64 content parts for raw image bytes.
pub fn encode_image_parts(images: &[Vec<u8>]) -> Vec<ContentPart> {
    images
        .iter()
        .map(|bytes| ContentPart::image(BASE64.encode(bytes)))
        .collect()
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct StreamFragment {
    text: String,
}

#[derive(Debug, Deserialize)]
struct TextResponse {
    choices: Vec<TextChoice>,
}

#[derive(Debug, Deserialize)]
struct TextChoice {
    message: TextChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct TextChoiceMessage {
    content: String,
}

/// One SSE data line → its text fragment.
///
/// Blank lines, the `[DONE]` terminator, and lines that are not fragment
/// JSON yield `None`; the stream carries occasional bookkeeping lines and
/// they must not abort an answer mid-flight.
pub fn parse_stream_fragment(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() || line == "[DONE]" {
        return None;
    }
    serde_json::from_str::<StreamFragment>(line)
        .ok()
        .map(|fragment| fragment.text)
}

/// Concatenated fragments → final answer: text after the role marker (when
/// present), trimmed.
pub fn finalize_stream_answer(assembled: &str) -> String {
    strip_after_marker(assembled, ASSISTANT_MARKER).trim().to_string()
}

/// Text-variant response body → final answer: `choices[0].message.content`
/// after any `</think>` prelude, trimmed.
pub fn extract_choice_answer(body: &[u8]) -> Result<String, RequestError> {
    let response: TextResponse =
        serde_json::from_slice(body).map_err(|e| RequestError::Decode(e.to_string()))?;
    let content = response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| RequestError::Decode("response has no choices".to_string()))?;
    Ok(strip_after_marker(&content, THINK_CLOSE).trim().to_string())
}
