//! Token counting via tiktoken
//!
//! Counts are taken with the gpt-4 (cl100k) encoding. The BPE tables are
//! expensive to build, so one instance is cached for the process lifetime.

use std::sync::OnceLock;

use tiktoken_rs::{CoreBPE, get_bpe_from_model};
use tracing::debug;

static BPE: OnceLock<CoreBPE> = OnceLock::new();

fn bpe() -> &'static CoreBPE {
    BPE.get_or_init(|| {
        debug!("tokens::bpe: building cl100k tokenizer");
        get_bpe_from_model("gpt-4").unwrap_or_else(|e| panic!("tokenizer tables unavailable: {}", e))
    })
}

/// Count tokens in `text`. Deterministic for identical input.
pub fn count(text: &str) -> usize {
    bpe().encode_with_special_tokens(text).len()
}
