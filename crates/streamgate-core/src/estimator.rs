//! Fallback token estimator
//!
//! Best-effort token counting for accounting when the backend does not
//! report an exact count. The primary path encodes with the fixed
//! `cl100k_base` BPE; if the encoder cannot be built, a rough
//! characters-per-token heuristic takes over. Never fails.

use std::sync::OnceLock;

use tiktoken_rs::CoreBPE;

/// Estimate the token count of `text`
///
/// Exact count under `cl100k_base` when the encoder is available,
/// `len / 4` otherwise.
pub fn estimate_tokens(text: &str) -> usize {
    match encoder() {
        Some(bpe) => bpe.encode_ordinary(text).len(),
        None => heuristic_estimate(text),
    }
}

/// Rough fallback: roughly four bytes per token for English-ish text
fn heuristic_estimate(text: &str) -> usize {
    text.len() / 4
}

fn encoder() -> Option<&'static CoreBPE> {
    static ENCODER: OnceLock<Option<CoreBPE>> = OnceLock::new();
    ENCODER
        .get_or_init(|| match tiktoken_rs::cl100k_base() {
            Ok(bpe) => Some(bpe),
            Err(e) => {
                tracing::warn!("cl100k_base encoder unavailable, using heuristic estimate: {e}");
                None
            }
        })
        .as_ref()
}
