//! Scripted completion source
//!
//! Deterministic stand-in for the backend model invocation, which is
//! outside this layer. Splits a canned reply into word-sized deltas whose
//! concatenation reproduces the original text exactly.

/// A scripted sequence of completion fragments
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    deltas: Vec<String>,
    finish_reason: String,
}

impl ScriptedSource {
    /// Split `reply` into streaming deltas
    pub fn from_reply(reply: &str) -> Self {
        let deltas = reply
            .split_inclusive(' ')
            .map(str::to_string)
            .collect();
        Self {
            deltas,
            finish_reason: "stop".to_string(),
        }
    }

    /// The fragments, in delivery order
    pub fn deltas(&self) -> impl Iterator<Item = &str> {
        self.deltas.iter().map(String::as_str)
    }

    pub fn finish_reason(&self) -> &str {
        &self.finish_reason
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deltas_concatenate_to_reply() {
        let reply = "one two  three\nfour";
        let source = ScriptedSource::from_reply(reply);
        let joined: String = source.deltas().collect();
        assert_eq!(joined, reply);
    }

    #[test]
    fn test_empty_reply_yields_no_deltas() {
        let source = ScriptedSource::from_reply("");
        assert_eq!(source.deltas().count(), 0);
        assert_eq!(source.finish_reason(), "stop");
    }
}
