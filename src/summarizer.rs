use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::llm::{GenerationRequest, TextGenerator};

/// Largest chunk handed to the model, in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 4000;

/// Boundaries tried in order when a chunk has to be cut.
const SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

/// Summarizes page text with a single deterministic model call.
pub struct Summarizer {
    generator: Arc<dyn TextGenerator>,
    chunk_size: usize,
}

impl Summarizer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Upstream failures surface as `SummaryError` and are not retried.
    pub async fn summarize(&self, text: &str) -> Result<String> {
        let chunks = split_text(text, self.chunk_size);
        debug!(chars = text.chars().count(), chunks = chunks.len(), "summarizing");

        self.generator
            .generate(GenerationRequest {
                chunks,
                temperature: 0.0,
            })
            .await
    }
}

/// Splits `text` into chunks of at most `chunk_size` characters.
///
/// A cut lands just after the last paragraph break, line break or space
/// inside the window, falling back to a hard cut at `chunk_size`. The
/// separator stays with the preceding chunk, so the chunks concatenate back
/// to `text` exactly.
pub fn split_text(text: &str, chunk_size: usize) -> Vec<String> {
    let chunk_size = chunk_size.max(1);
    let mut chunks = Vec::new();
    let mut rest = text;

    while let Some((window_end, _)) = rest.char_indices().nth(chunk_size) {
        let window = &rest[..window_end];
        let cut = SEPARATORS
            .iter()
            .find_map(|sep| window.rfind(sep).map(|at| at + sep.len()))
            .unwrap_or(window_end);

        chunks.push(rest[..cut].to_string());
        rest = &rest[cut..];
    }

    if !rest.is_empty() {
        chunks.push(rest.to_string());
    }
    chunks
}
