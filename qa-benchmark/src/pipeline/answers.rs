//! Candidate answers from the model under evaluation

use qaeval::{CandidateAnswer, Locale, PhraseLexicon, QaPair};

use super::RunSettings;
use crate::config::WorkConfig;
use crate::runner::Executor;

/// Replies at or below this many characters are treated as no answer
pub const MIN_ANSWER_CHARS: usize = 10;

/// Prompt restricting the model to the excerpt
pub fn answer_prompt(excerpt: &str, question: &str, work: &WorkConfig, locale: Locale) -> String {
    match locale {
        Locale::En => format!(
            "Answer the question based on the following excerpt from \"{}\":\n\n\
             EXCERPT:\n{}\n\n\
             QUESTION: {}\n\n\
             INSTRUCTIONS:\n\
             - Answer ONLY from the excerpt provided\n\
             - If the excerpt has no information to answer, say so\n\
             - Give a short and precise answer\n\
             - Do not add information that is not in the excerpt\n\
             - At most 2-3 sentences",
            work.title, excerpt, question
        ),
        Locale::Ru => format!(
            "Ответь на вопрос на основе следующего отрывка из \"{}\":\n\n\
             ОТРЫВОК:\n{}\n\n\
             ВОПРОС: {}\n\n\
             ИНСТРУКЦИИ:\n\
             - Отвечай ТОЛЬКО на основе предоставленного отрывка\n\
             - Если в отрывке нет информации для ответа, так и скажи\n\
             - Дай краткий и точный ответ\n\
             - Не добавляй информацию, которой нет в отрывке\n\
             - Максимум 2-3 предложения в ответе",
            work.title, excerpt, question
        ),
    }
}

/// Replace too-short or low-quality replies with the lexicon's
/// "insufficient information" text
pub fn screen_answer(raw: &str, lexicon: &PhraseLexicon) -> String {
    let answer = raw.trim();
    if answer.chars().count() <= MIN_ANSWER_CHARS {
        return lexicon.insufficient.clone();
    }
    if let Some(phrase) = lexicon.find_low_quality(answer) {
        tracing::debug!("Answer contains low-quality phrase '{}'", phrase);
        return lexicon.insufficient.clone();
    }
    answer.to_string()
}

/// One candidate per pair, in order.
///
/// A question whose request ultimately fails gets the lexicon's
/// retrieval-failed text instead of aborting the run.
pub async fn generate_answers(
    executor: &Executor,
    pairs: &[QaPair],
    excerpt: &str,
    settings: &RunSettings,
) -> Vec<CandidateAnswer> {
    let prompts: Vec<String> = pairs
        .iter()
        .map(|p| answer_prompt(excerpt, &p.question, &settings.work, settings.locale))
        .collect();

    let results = executor.generate_all(&prompts).await;

    pairs
        .iter()
        .zip(results)
        .map(|(pair, result)| match result {
            Ok(text) => CandidateAnswer::new(screen_answer(&text, &settings.lexicon), &pair.question),
            Err(e) => {
                tracing::warn!("No answer for '{}': {}", pair.question, e);
                CandidateAnswer::new(&settings.lexicon.retrieval_failed, &pair.question)
            }
        })
        .collect()
}
