//! Stream-chunk payload construction
//!
//! Pure constructors for the standard terminal/usage payloads a completion
//! stream ends with, in the OpenAI `chat.completion.chunk` wire shape.

use serde::{Deserialize, Serialize};

/// Fixed `object` field value for streaming chunks
pub const CHUNK_OBJECT: &str = "chat.completion.chunk";

/// One chunk in a streaming chat completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamChunk {
    /// Response identifier (`chatcmpl-` + trace id)
    pub id: String,

    /// Always `chat.completion.chunk`
    pub object: String,

    /// Creation timestamp (unix epoch seconds)
    pub created: i64,

    /// Model that produced this chunk
    pub model: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_fingerprint: Option<String>,

    /// Ordered choices; empty for usage-only chunks
    pub choices: Vec<StreamChoice>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// One choice entry in a streaming chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamChoice {
    #[serde(default)]
    pub index: u32,

    #[serde(default, skip_serializing_if = "Delta::is_empty")]
    pub delta: Delta,

    pub finish_reason: Option<String>,
}

/// Incremental message content
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Delta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Delta {
    pub fn is_empty(&self) -> bool {
        self.role.is_none() && self.content.is_none()
    }
}

/// Token usage totals
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl Usage {
    /// Create usage totals from prompt and completion counts
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Structured API error payload, as carried by realtime error events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(rename = "type")]
    pub kind: String,

    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ApiError {
    /// Create an error payload with type and message only
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            param: None,
            code: None,
        }
    }
}

/// Build the terminal chunk carrying the finish reason, no usage
pub fn stop_chunk(
    id: impl Into<String>,
    created: i64,
    model: impl Into<String>,
    finish_reason: impl Into<String>,
) -> StreamChunk {
    StreamChunk {
        id: id.into(),
        object: CHUNK_OBJECT.to_string(),
        created,
        model: model.into(),
        system_fingerprint: None,
        choices: vec![StreamChoice {
            index: 0,
            delta: Delta::default(),
            finish_reason: Some(finish_reason.into()),
        }],
        usage: None,
    }
}

/// Build the final usage chunk: empty choice sequence, usage totals attached
pub fn usage_chunk(
    id: impl Into<String>,
    created: i64,
    model: impl Into<String>,
    usage: Usage,
) -> StreamChunk {
    StreamChunk {
        id: id.into(),
        object: CHUNK_OBJECT.to_string(),
        created,
        model: model.into(),
        system_fingerprint: None,
        choices: Vec::new(),
        usage: Some(usage),
    }
}

/// Build a content delta chunk
pub fn delta_chunk(
    id: impl Into<String>,
    created: i64,
    model: impl Into<String>,
    content: impl Into<String>,
) -> StreamChunk {
    StreamChunk {
        id: id.into(),
        object: CHUNK_OBJECT.to_string(),
        created,
        model: model.into(),
        system_fingerprint: None,
        choices: vec![StreamChoice {
            index: 0,
            delta: Delta {
                role: None,
                content: Some(content.into()),
            },
            finish_reason: None,
        }],
        usage: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_chunk_shape() {
        let chunk = stop_chunk("chatcmpl-abc", 1234567890, "gpt-4", "stop");
        assert_eq!(chunk.object, CHUNK_OBJECT);
        assert_eq!(chunk.choices.len(), 1);
        assert_eq!(chunk.choices[0].finish_reason.as_deref(), Some("stop"));
        assert!(chunk.usage.is_none());
    }

    #[test]
    fn test_usage_chunk_shape() {
        let chunk = usage_chunk("chatcmpl-abc", 1234567890, "gpt-4", Usage::new(10, 5));
        assert!(chunk.choices.is_empty());
        let usage = chunk.usage.expect("usage present");
        assert_eq!(usage.total_tokens, 15);
    }

    #[test]
    fn test_absent_optionals_are_omitted() {
        let chunk = stop_chunk("chatcmpl-abc", 1234567890, "gpt-4", "stop");
        let json = serde_json::to_string(&chunk).unwrap();
        assert!(!json.contains("system_fingerprint"));
        assert!(!json.contains("usage"));
        assert!(!json.contains("delta"));
        assert!(json.contains(r#""finish_reason":"stop""#));
    }

    #[test]
    fn test_delta_chunk_serializes_content() {
        let chunk = delta_chunk("chatcmpl-abc", 1234567890, "gpt-4", "Hello");
        let json = serde_json::to_string(&chunk).unwrap();
        assert!(json.contains(r#""content":"Hello""#));
        assert!(json.contains(r#""finish_reason":null"#));
    }
}
