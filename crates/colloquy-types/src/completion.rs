//! Content part types and answer markers for the completion endpoint.
//!
//! The multimodal request shape carries an ordered list of parts, each
//! either text or a base64-encoded image. The assembled answer may carry a
//! role or reasoning marker that callers strip before display.

use serde::{Deserialize, Serialize};

/// Role-delimiter marker in streamed answers. Only text after the marker is
/// kept (the fullwidth vertical bars are part of the wire format).
pub const ASSISTANT_MARKER: &str = "<\u{ff5c}Assistant\u{ff5c}>";

/// Closing reasoning delimiter in non-streamed answers.
pub const THINK_CLOSE: &str = "</think>";

/// One part of a multimodal user message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentPart {
    Text {
        text: String,
    },
    Image {
        image_base64: String,
    },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    pub fn image(image_base64: impl Into<String>) -> Self {
        ContentPart::Image {
            image_base64: image_base64.into(),
        }
    }
}

/// Strip everything up to and including `marker`, trimming the remainder.
///
/// Returns the input unchanged when the marker is absent.
pub fn strip_after_marker<'a>(answer: &'a str, marker: &str) -> &'a str {
    match answer.find(marker) {
        Some(pos) => answer[pos + marker.len()..].trim(),
        None => answer,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_part_wire_shape() {
        let part = ContentPart::text("hello");
        let json = serde_json::to_string(&part).unwrap();
        assert_eq!(json, r#"{"type":"text","text":"hello"}"#);
    }

    #[test]
    fn test_image_part_wire_shape() {
        let part = ContentPart::image("QUJD");
        let json = serde_json::to_string(&part).unwrap();
        assert_eq!(json, r#"{"type":"image","image_base64":"QUJD"}"#);
    }

    #[test]
    fn test_strip_assistant_marker() {
        let raw = format!("preamble {ASSISTANT_MARKER}  The answer.\n");
        assert_eq!(strip_after_marker(&raw, ASSISTANT_MARKER), "The answer.");
    }

    #[test]
    fn test_strip_think_close() {
        let raw = "<think>x</think>Answer";
        assert_eq!(strip_after_marker(raw, THINK_CLOSE), "Answer");
    }

    #[test]
    fn test_strip_without_marker_is_identity() {
        assert_eq!(strip_after_marker("plain answer", ASSISTANT_MARKER), "plain answer");
    }
}
