//! Evaluation loop: excerpt, questions, answers, scoring

pub mod answers;
pub mod evaluate;
pub mod excerpt;
pub mod questions;

pub use answers::{answer_prompt, generate_answers, screen_answer};
pub use evaluate::Evaluator;
pub use excerpt::{excerpt_prompt, fetch_excerpt};
pub use questions::{chunk_excerpt, generate_questions, parse_qa_pairs, question_prompt};

use qaeval::{align_candidates, CandidateAnswer, EvaluationRecord, Locale, PhraseLexicon, QaPair};

use crate::config::{Config, KeyFile, WorkConfig};
use crate::providers::{create_generator, ProviderError};
use crate::runner::Executor;

/// Errors that end a pipeline run
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("No excerpt was produced")]
    NoExcerpt,

    #[error("No questions could be generated")]
    NoQuestions,

    #[error("No rows passed validation ({inspected} inspected)")]
    NoValidData { inspected: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Settings shared by all stages of one run
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub locale: Locale,
    pub work: WorkConfig,
    pub num_questions: usize,
    pub lexicon: PhraseLexicon,
}

impl RunSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            locale: config.locale,
            work: config.pipeline.work.clone(),
            num_questions: config.pipeline.num_questions,
            lexicon: config.lexicon(),
        }
    }
}

/// Everything a run produced
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub pairs: Vec<QaPair>,
    pub candidates: Vec<CandidateAnswer>,
    pub record: EvaluationRecord,
}

/// The three generation stages followed by scoring
pub struct Pipeline {
    excerpt: Executor,
    questions: Executor,
    answers: Executor,
    settings: RunSettings,
}

impl Pipeline {
    pub fn new(excerpt: Executor, questions: Executor, answers: Executor, settings: RunSettings) -> Self {
        Self {
            excerpt,
            questions,
            answers,
            settings,
        }
    }

    /// Build generators and executors for every stage from `config`
    pub fn from_config(config: &Config, key_file: Option<&KeyFile>) -> Result<Self, PipelineError> {
        let stage = |name: &str| -> Result<Executor, PipelineError> {
            let generator = create_generator(name, config, key_file)?;
            Ok(Executor::from_config(generator, config, name))
        };

        Ok(Self::new(
            stage(&config.pipeline.excerpt_provider)?,
            stage(&config.pipeline.question_provider)?,
            stage(&config.pipeline.answer_provider)?,
            RunSettings::from_config(config),
        ))
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Full loop starting from a freshly generated excerpt
    pub async fn run(&self) -> Result<RunOutput, PipelineError> {
        tracing::info!("Requesting excerpt from {}", self.excerpt.generator_name());
        let excerpt = fetch_excerpt(&self.excerpt, &self.settings).await?;
        self.run_with_excerpt(&excerpt).await
    }

    /// Loop over a given excerpt
    pub async fn run_with_excerpt(&self, excerpt: &str) -> Result<RunOutput, PipelineError> {
        tracing::info!("Generating questions with {}", self.questions.generator_name());
        let pairs = generate_questions(&self.questions, excerpt, &self.settings).await?;
        tracing::info!("Generated {} question(s)", pairs.len());

        tracing::info!("Generating answers with {}", self.answers.generator_name());
        let candidates = generate_answers(&self.answers, &pairs, excerpt, &self.settings).await;

        let texts = align_candidates(&pairs, &candidates, &self.settings.lexicon.retrieval_failed);
        let timestamp = chrono::Local::now().to_rfc3339();
        let record = Evaluator::new(self.settings.lexicon.clone()).evaluate(excerpt, &pairs, &texts, timestamp)?;

        Ok(RunOutput {
            pairs,
            candidates,
            record,
        })
    }
}
