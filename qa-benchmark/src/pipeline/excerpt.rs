//! Source excerpt acquisition

use qaeval::Locale;

use super::{PipelineError, RunSettings};
use crate::config::WorkConfig;
use crate::runner::Executor;

/// Prompt asking for a self-contained excerpt of the configured work
pub fn excerpt_prompt(work: &WorkConfig, locale: Locale) -> String {
    match locale {
        Locale::En => format!(
            "Pick a significant excerpt from the novel \"{}\" by {} (about {}-{} words). \
             The excerpt should be meaningful and well suited for writing questions about it. \
             Return only the text of the excerpt without any additional comments.",
            work.title, work.author, work.excerpt_min_words, work.excerpt_max_words
        ),
        Locale::Ru => format!(
            "Выбери значительный отрывок из романа \"{}\" ({}), примерно {}-{} слов. \
             Отрывок должен быть содержательным и подходящим для составления вопросов. \
             Верни только текст отрывка без дополнительных комментариев.",
            work.title, work.author, work.excerpt_min_words, work.excerpt_max_words
        ),
    }
}

/// Drop surrounding code fences and whitespace the model may wrap text in
pub fn clean_excerpt(raw: &str) -> String {
    let trimmed = raw.trim();
    let unfenced = trimmed
        .strip_prefix("```")
        .map(|rest| rest.split_once('\n').map(|(_, body)| body).unwrap_or(""))
        .and_then(|body| body.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed);
    unfenced.trim().to_string()
}

/// Ask the generator for an excerpt; an empty reply is an error
pub async fn fetch_excerpt(executor: &Executor, settings: &RunSettings) -> Result<String, PipelineError> {
    let prompt = excerpt_prompt(&settings.work, settings.locale);
    let excerpt = clean_excerpt(&executor.generate(&prompt).await?);

    if excerpt.is_empty() {
        return Err(PipelineError::NoExcerpt);
    }

    tracing::info!(
        "Excerpt received: {} words, {} chars",
        excerpt.split_whitespace().count(),
        excerpt.chars().count()
    );
    Ok(excerpt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_names_work() {
        let work = WorkConfig::default();
        let prompt = excerpt_prompt(&work, Locale::En);
        assert!(prompt.contains("The Master and Margarita"));
        assert!(prompt.contains("500-800"));

        let prompt = excerpt_prompt(&work, Locale::Ru);
        assert!(prompt.contains("Выбери"));
    }

    #[test]
    fn test_clean_excerpt() {
        assert_eq!(clean_excerpt("  text \n"), "text");
        assert_eq!(clean_excerpt("```\nfenced text\n```"), "fenced text");
        assert_eq!(clean_excerpt("```text\nfenced\n```\n"), "fenced");
        assert_eq!(clean_excerpt("```unterminated"), "```unterminated");
    }
}
