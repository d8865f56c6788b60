//! QA Benchmark CLI

use std::path::PathBuf;

use chrono::Local;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use qa_benchmark::{
    config::{Config, KeyFile},
    pipeline::{Evaluator, Pipeline},
    reporting::{print_console_report, write_json, write_record, ScoringDataset},
};
use qaeval::Locale;

#[derive(Parser)]
#[command(name = "qa-benchmark")]
#[command(about = "Question-answering evaluation of LLM providers over a literary excerpt")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an excerpt, questions and answers, then score them
    Run {
        /// Output directory for results
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Prompt and lexicon language (en, ru)
        #[arg(short, long)]
        locale: Option<Locale>,

        /// Number of questions to generate
        #[arg(short, long)]
        num_questions: Option<usize>,

        /// Use the excerpt in this file instead of generating one
        #[arg(long)]
        excerpt_file: Option<PathBuf>,

        /// JSON file with gemini_api_key / openai_api_key
        #[arg(long)]
        keys: Option<PathBuf>,
    },

    /// Score a saved dataset without calling any provider
    Score {
        /// Dataset or previous results file
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory for results
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Lexicon language (en, ru)
        #[arg(short, long)]
        locale: Option<Locale>,
    },

    /// Generate sample configuration
    InitConfig {
        /// Output path for configuration file
        #[arg(short, long, default_value = "config/qa-eval.toml")]
        output: PathBuf,
    },

    /// Print the phrase lexicon in effect
    ShowLexicon {
        /// Lexicon language (en, ru)
        #[arg(short, long)]
        locale: Option<Locale>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("qa_benchmark=debug,qaeval=debug,info")
    } else {
        EnvFilter::new("qa_benchmark=info,warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match cli.config {
        Some(ref path) => Config::from_file(path)?,
        None => Config::load_or_default(),
    };

    match cli.command {
        Commands::Run {
            output,
            locale,
            num_questions,
            excerpt_file,
            keys,
        } => run_pipeline(config, output, locale, num_questions, excerpt_file, keys).await,
        Commands::Score { input, output, locale } => score_dataset(config, input, output, locale),
        Commands::InitConfig { output } => init_config(output),
        Commands::ShowLexicon { locale } => show_lexicon(config, locale),
    }
}

async fn run_pipeline(
    mut config: Config,
    output: Option<PathBuf>,
    locale: Option<Locale>,
    num_questions: Option<usize>,
    excerpt_file: Option<PathBuf>,
    keys: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(locale) = locale {
        config.locale = locale;
    }
    if let Some(n) = num_questions {
        config.pipeline.num_questions = n;
    }

    let key_file = match keys {
        Some(path) => Some(KeyFile::from_file(path)?),
        None => KeyFile::load_default(),
    };

    println!("=== QA Evaluation ===");
    println!("Work:      {} ({})", config.pipeline.work.title, config.pipeline.work.author);
    println!("Locale:    {}", config.locale);
    println!(
        "Providers: excerpt={}, questions={}, answers={}",
        config.pipeline.excerpt_provider, config.pipeline.question_provider, config.pipeline.answer_provider
    );
    println!("Questions: {}", config.pipeline.num_questions);
    println!();

    let pipeline = Pipeline::from_config(&config, key_file.as_ref())?;
    let result = match excerpt_file {
        Some(path) => {
            println!("Excerpt:   {}", path.display());
            let excerpt = std::fs::read_to_string(&path)?;
            pipeline.run_with_excerpt(excerpt.trim()).await?
        }
        None => pipeline.run().await?,
    };

    let output_dir = output.unwrap_or_else(|| PathBuf::from(&config.output.output_dir));

    if config.output.save_intermediate {
        std::fs::create_dir_all(&output_dir)?;
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let pairs_path = output_dir.join(format!("qa_pairs_{}.json", stamp));
        write_json(&pairs_path, &result.pairs)?;
        let answers_path = output_dir.join(format!("model_answers_{}.json", stamp));
        write_json(&answers_path, &result.candidates)?;
        println!("Intermediate files written to: {}", output_dir.display());
    }

    print_console_report(&result.record);

    let path = write_record(&output_dir, &result.record)?;
    println!("\nResults written to: {}", path.display());
    Ok(())
}

fn score_dataset(
    mut config: Config,
    input: PathBuf,
    output: Option<PathBuf>,
    locale: Option<Locale>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(locale) = locale {
        config.locale = locale;
    }
    let lexicon = config.lexicon();

    println!("Scoring dataset: {}", input.display());
    let dataset = ScoringDataset::from_file(&input)?;
    println!("Rows: {}", dataset.items.len());

    let pairs = dataset.pairs();
    let candidates = dataset.candidates(&lexicon.retrieval_failed);
    let record = Evaluator::new(lexicon).evaluate(&dataset.excerpt, &pairs, &candidates, Local::now().to_rfc3339())?;

    print_console_report(&record);

    let output_dir = output.unwrap_or_else(|| PathBuf::from(&config.output.output_dir));
    let path = write_record(&output_dir, &record)?;
    println!("\nResults written to: {}", path.display());
    Ok(())
}

fn init_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }

    config.save_toml(&output)?;
    println!("Configuration written to: {}", output.display());
    Ok(())
}

fn show_lexicon(mut config: Config, locale: Option<Locale>) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(locale) = locale {
        config.locale = locale;
    }
    let lexicon = config.lexicon();

    println!("Phrase lexicon ({}):", config.locale);
    println!("{:-<60}", "");

    for (label, phrases) in [
        ("Refusal", &lexicon.refusal),
        ("Low quality", &lexicon.low_quality),
        ("Rejection", &lexicon.rejection),
    ] {
        println!("{} ({}):", label, phrases.len());
        for phrase in phrases {
            println!("  - {}", phrase);
        }
        println!();
    }

    println!("Retrieval failed: {}", lexicon.retrieval_failed);
    println!("Insufficient:     {}", lexicon.insufficient);
    Ok(())
}
