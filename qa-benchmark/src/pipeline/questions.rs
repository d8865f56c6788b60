//! Question and reference-answer generation from an excerpt

use std::sync::OnceLock;

use qaeval::{Locale, QaPair};
use regex::Regex;
use serde::Deserialize;

use super::{PipelineError, RunSettings};
use crate::config::WorkConfig;
use crate::runner::Executor;

/// Window size when the excerpt has too few paragraphs
pub const WORDS_PER_CHUNK: usize = 120;

/// Smallest character split point when falling back to halves
const MIN_SPLIT_CHARS: usize = 200;

/// Openers that mark a line as a question even without a '?'
const QUESTION_OPENERS: &[&str] = &[
    "What", "Who", "Where", "When", "Why", "How", "Which", "Что", "Кто", "Где", "Когда", "Почему", "Как",
    "О чем", "Какие", "Какой",
];

/// Reference answer used when the generator gives a question without one
pub fn missing_answer_placeholder(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "The answer will be generated later",
        Locale::Ru => "Ответ будет сгенерирован позже",
    }
}

/// Split an excerpt into fragments for question generation.
///
/// Paragraphs are used when there are at least three; otherwise fixed word
/// windows. Anything that still yields fewer than two fragments is cut in
/// half, by lines if possible, else by characters.
pub fn chunk_excerpt(excerpt: &str) -> Vec<String> {
    let paragraphs: Vec<String> = excerpt
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect();

    let chunks = if paragraphs.len() >= 3 {
        paragraphs
    } else {
        let words: Vec<&str> = excerpt.split_whitespace().collect();
        words.chunks(WORDS_PER_CHUNK).map(|w| w.join(" ")).collect()
    };

    if chunks.len() >= 2 || excerpt.trim().is_empty() {
        return chunks;
    }

    let lines: Vec<&str> = excerpt.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    if lines.len() >= 2 {
        let mid = lines.len() / 2;
        return vec![lines[..mid].join(" "), lines[mid..].join(" ")];
    }

    let chars: Vec<char> = excerpt.chars().collect();
    let mid = MIN_SPLIT_CHARS.max(chars.len() / 2).min(chars.len());
    let head: String = chars[..mid].iter().collect();
    let tail: String = chars[mid..].iter().collect();
    vec![head.trim().to_string(), tail.trim().to_string()]
}

/// Prompt asking for `count` question/answer pairs over the fragments
pub fn question_prompt(chunks: &[String], count: usize, work: &WorkConfig, locale: Locale) -> String {
    let (header, fragment, instructions) = match locale {
        Locale::En => (
            format!(
                "Below is an excerpt from the novel \"{}\" by {}, split into fragments.",
                work.title, work.author
            ),
            "Fragment",
            format!(
                "Write {} questions about the excerpt together with their correct answers. \
                 Mix simple factual questions with questions that need several fragments to answer. \
                 Every answer must be supported by the excerpt and be one or two sentences long. \
                 Respond with a JSON array only, in the form \
                 [{{\"question\": \"...\", \"answer\": \"...\"}}].",
                count
            ),
        ),
        Locale::Ru => (
            format!(
                "Ниже приведен отрывок из романа \"{}\" ({}), разбитый на фрагменты.",
                work.title, work.author
            ),
            "Фрагмент",
            format!(
                "Составь {} вопросов по отрывку вместе с правильными ответами. \
                 Чередуй простые фактические вопросы и вопросы, для ответа на которые нужно несколько фрагментов. \
                 Каждый ответ должен опираться на отрывок и занимать одно-два предложения. \
                 Ответ верни только в виде JSON-массива вида \
                 [{{\"question\": \"...\", \"answer\": \"...\"}}].",
                count
            ),
        ),
    };

    let mut prompt = header;
    prompt.push_str("\n\n");
    for (i, chunk) in chunks.iter().enumerate() {
        prompt.push_str(&format!("[{} {}]\n{}\n\n", fragment, i + 1, chunk));
    }
    prompt.push_str(&instructions);
    prompt
}

#[derive(Debug, Deserialize)]
struct RawPair {
    question: String,
    #[serde(default, alias = "reference_answer")]
    answer: Option<String>,
}

fn question_prefixes() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"^\d+[.)]\s*",
            r"^Q:\s*",
            r"^Вопрос\s*\d*:\s*",
            r"^Question\s*\d*:\s*",
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
    })
}

fn answer_prefix() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^(?:A|Answer|Ответ)\s*\d*:\s*").ok())
        .as_ref()
}

/// Remove numbering and "Q:" style labels, in order
pub fn strip_question_prefix(line: &str) -> String {
    question_prefixes()
        .iter()
        .fold(line.trim().to_string(), |text, re| re.replace(&text, "").into_owned())
}

/// Whether a cleaned line reads as a question
pub fn looks_like_question(text: &str) -> bool {
    text.chars().count() > 10
        && (text.contains('?') || QUESTION_OPENERS.iter().any(|opener| text.starts_with(opener)))
}

/// Parse a generator reply into QA pairs.
///
/// A JSON array of `{question, answer}` objects is tried first; otherwise
/// question lines are picked out of free text, with an optional answer line
/// directly after each. Questions without an answer get `placeholder`.
pub fn parse_qa_pairs(response: &str, placeholder: &str) -> Vec<QaPair> {
    if let Some(pairs) = parse_json_pairs(response, placeholder) {
        if !pairs.is_empty() {
            return pairs;
        }
    }
    parse_question_lines(response, placeholder)
}

fn parse_json_pairs(response: &str, placeholder: &str) -> Option<Vec<QaPair>> {
    let start = response.find('[')?;
    let end = response.rfind(']')?;
    if end < start {
        return None;
    }

    let raw: Vec<RawPair> = serde_json::from_str(&response[start..=end]).ok()?;
    Some(
        raw.into_iter()
            .filter(|r| !r.question.trim().is_empty())
            .map(|r| {
                let answer = r
                    .answer
                    .map(|a| a.trim().to_string())
                    .filter(|a| !a.is_empty())
                    .unwrap_or_else(|| placeholder.to_string());
                QaPair::new(r.question.trim(), answer)
            })
            .collect(),
    )
}

fn parse_question_lines(response: &str, placeholder: &str) -> Vec<QaPair> {
    let mut found: Vec<(String, Option<String>)> = Vec::new();

    for line in response.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(re) = answer_prefix() {
            if re.is_match(line) {
                let answer = re.replace(line, "").trim().to_string();
                if let Some((_, slot @ None)) = found.last_mut() {
                    if !answer.is_empty() {
                        *slot = Some(answer);
                    }
                }
                continue;
            }
        }

        let question = strip_question_prefix(line);
        if looks_like_question(&question) {
            found.push((question, None));
        }
    }

    found
        .into_iter()
        .map(|(q, a)| QaPair::new(q, a.unwrap_or_else(|| placeholder.to_string())))
        .collect()
}

/// Generate up to `settings.num_questions` QA pairs for `excerpt`
pub async fn generate_questions(
    executor: &Executor,
    excerpt: &str,
    settings: &RunSettings,
) -> Result<Vec<QaPair>, PipelineError> {
    let chunks = chunk_excerpt(excerpt);
    tracing::debug!("Excerpt split into {} fragment(s)", chunks.len());

    let prompt = question_prompt(&chunks, settings.num_questions, &settings.work, settings.locale);
    let response = executor.generate(&prompt).await?;

    let mut pairs = parse_qa_pairs(&response, missing_answer_placeholder(settings.locale));
    if pairs.len() > settings.num_questions {
        tracing::debug!("Keeping {} of {} generated questions", settings.num_questions, pairs.len());
        pairs.truncate(settings.num_questions);
    }

    if pairs.is_empty() {
        tracing::warn!("No questions could be parsed from the generator reply");
        return Err(PipelineError::NoQuestions);
    }
    Ok(pairs)
}
