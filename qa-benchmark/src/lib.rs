//! QA evaluation loop for LLM providers
//!
//! Drives the end-to-end run around the `qaeval` scoring core: one provider
//! picks an excerpt of a literary work, another writes questions with
//! reference answers, a third answers them from the excerpt, and the answers
//! are validated, checked and scored.
//!
//! # Features
//!
//! - Gemini and OpenAI text generators behind one async trait
//! - Request pacing, per-minute caps and configurable retry backoff
//! - English and Russian prompts and phrase lexicons
//! - Timestamped JSON records and offline re-scoring of saved datasets
//!
//! # Example
//!
//! ```no_run
//! use qa_benchmark::{config::Config, pipeline::Pipeline, reporting::write_record};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_or_default();
//!     let pipeline = Pipeline::from_config(&config, None)?;
//!
//!     let output = pipeline.run().await?;
//!     let path = write_record(&config.output.output_dir, &output.record)?;
//!     println!("Results written to {}", path.display());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod pipeline;
pub mod providers;
pub mod reporting;
pub mod runner;

pub use config::Config;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::config::{Config, KeyFile, ProviderConfig};
    pub use crate::pipeline::{Evaluator, Pipeline, PipelineError, RunOutput, RunSettings};
    pub use crate::providers::{create_generator, GenerationSettings, ProviderError, ProviderResult, TextGenerator};
    pub use crate::reporting::{print_console_report, write_record, ScoringDataset};
    pub use crate::runner::{Executor, ExecutorConfig, RetryPolicy};
}
