//! History compaction: when a conversation outgrows its budgets, the middle
//! of the history is replaced by a model-written summary while the system
//! prompt, original task, and a recent tail survive verbatim.

pub mod compactor;
mod transcript;

pub use compactor::{
    CompactionConfig, Compactor, ModelSummarizer, Summarizer, SUMMARY_MARKER, SUMMARY_NAME,
};
