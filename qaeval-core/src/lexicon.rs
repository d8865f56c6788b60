//! Locale-specific phrase lists used to detect refusals and unusable answers

use serde::{Deserialize, Serialize};

use crate::types::ANSWER_RETRIEVAL_FAILED;

/// Language of the evaluated text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ru,
}

impl Locale {
    pub fn all() -> Vec<Locale> {
        vec![Locale::En, Locale::Ru]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Ru => "ru",
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "en" | "english" => Ok(Locale::En),
            "ru" | "russian" => Ok(Locale::Ru),
            _ => Err(format!("Unknown locale: {}", s)),
        }
    }
}

/// Phrase sets driving refusal detection, low-quality penalties and
/// validation rejects.
///
/// Matching is a case-insensitive substring test. Use [`PhraseLexicon::normalized`]
/// after building one by hand; the built-in lexicons are already normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhraseLexicon {
    /// Candidate declined or claimed missing information; accuracy drops to 0.1
    pub refusal: Vec<String>,
    /// Composite-score penalty phrases, always a superset of `refusal`
    #[serde(default)]
    pub low_quality: Vec<String>,
    /// Candidates containing any of these never reach scoring
    pub rejection: Vec<String>,
    /// Stored when the answering collaborator gave up
    #[serde(default = "default_retrieval_failed")]
    pub retrieval_failed: String,
    /// Stored in place of answers that were too short or low quality
    #[serde(default = "default_insufficient")]
    pub insufficient: String,
}

fn default_retrieval_failed() -> String {
    ANSWER_RETRIEVAL_FAILED.to_string()
}

fn default_insufficient() -> String {
    "Insufficient information in the excerpt to answer".to_string()
}

const EN_REFUSAL: &[&str] = &[
    "don't know",
    "no information",
    "insufficient information",
    "cannot answer",
    "not provided",
    "no data",
    "not specified",
    "not mentioned",
    "need more context",
    "impossible to determine",
    ANSWER_RETRIEVAL_FAILED,
];

const EN_REJECTION: &[&str] = &[
    "retrieval error",
    "error",
    "insufficient information",
    "cannot answer",
    "no information",
    "need more context",
    ANSWER_RETRIEVAL_FAILED,
];

const RU_REFUSAL: &[&str] = &[
    "не могу ответить",
    "нет информации",
    "нужно больше контекста",
    "не предоставлен",
    "нет данных",
    "не знаю",
    "отсутствует",
    "невозможно определить",
    "не указано",
    "не упоминается",
    "ошибка получения ответа",
    "недостаточно информации",
];

const RU_REJECTION: &[&str] = &[
    "ошибка получения ответа",
    "error",
    "недостаточно информации",
    "не могу ответить",
    "нет информации",
    "нужно больше контекста",
];

fn owned(phrases: &[&str]) -> Vec<String> {
    phrases.iter().map(|p| p.to_string()).collect()
}

impl PhraseLexicon {
    /// Built-in lexicon for a locale
    pub fn for_locale(locale: Locale) -> Self {
        match locale {
            Locale::En => Self::english(),
            Locale::Ru => Self::russian(),
        }
    }

    pub fn english() -> Self {
        Self {
            refusal: owned(EN_REFUSAL),
            low_quality: Vec::new(),
            rejection: owned(EN_REJECTION),
            retrieval_failed: default_retrieval_failed(),
            insufficient: default_insufficient(),
        }
        .normalized()
    }

    pub fn russian() -> Self {
        Self {
            refusal: owned(RU_REFUSAL),
            low_quality: Vec::new(),
            rejection: owned(RU_REJECTION),
            retrieval_failed: "Ошибка получения ответа".to_string(),
            insufficient: "Недостаточно информации в отрывке для ответа".to_string(),
        }
        .normalized()
    }

    /// Lowercase and dedupe every list and fold the refusal phrases into
    /// `low_quality`.
    pub fn normalized(mut self) -> Self {
        self.refusal = dedup_lower(self.refusal);
        let mut low_quality = self.refusal.clone();
        low_quality.extend(self.low_quality);
        self.low_quality = dedup_lower(low_quality);
        self.rejection = dedup_lower(self.rejection);
        self
    }

    /// First refusal phrase found in `text`
    pub fn find_refusal(&self, text: &str) -> Option<&str> {
        find_phrase(&self.refusal, text)
    }

    /// First low-quality phrase found in `text`
    pub fn find_low_quality(&self, text: &str) -> Option<&str> {
        find_phrase(&self.low_quality, text)
    }

    /// First rejection phrase found in `text`
    pub fn find_rejection(&self, text: &str) -> Option<&str> {
        find_phrase(&self.rejection, text)
    }
}

impl Default for PhraseLexicon {
    fn default() -> Self {
        Self::english()
    }
}

fn dedup_lower(phrases: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(phrases.len());
    for phrase in phrases {
        let phrase = phrase.trim().to_lowercase();
        if !phrase.is_empty() && !out.contains(&phrase) {
            out.push(phrase);
        }
    }
    out
}

fn find_phrase<'a>(phrases: &'a [String], text: &str) -> Option<&'a str> {
    if phrases.is_empty() || text.is_empty() {
        return None;
    }
    let lowered = text.to_lowercase();
    phrases
        .iter()
        .find(|p| lowered.contains(p.to_lowercase().as_str()))
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_quality_is_superset_of_refusal() {
        for locale in Locale::all() {
            let lexicon = PhraseLexicon::for_locale(locale);
            for phrase in &lexicon.refusal {
                assert!(lexicon.low_quality.contains(phrase), "{} missing in {}", phrase, locale);
            }
        }
    }

    #[test]
    fn test_matching_ignores_case() {
        let lexicon = PhraseLexicon::english();
        assert_eq!(lexicon.find_refusal("I DON'T KNOW, sorry"), Some("don't know"));
        assert_eq!(lexicon.find_refusal("Woland is the devil."), None);

        let ru = PhraseLexicon::russian();
        assert_eq!(ru.find_refusal("Не знаю."), Some("не знаю"));
    }

    #[test]
    fn test_normalized_merges_and_dedups() {
        let lexicon = PhraseLexicon {
            refusal: vec!["No Clue".to_string(), "no clue".to_string()],
            low_quality: vec!["meh".to_string(), "NO CLUE".to_string()],
            rejection: vec![" Broken ".to_string(), String::new()],
            retrieval_failed: default_retrieval_failed(),
            insufficient: default_insufficient(),
        }
        .normalized();

        assert_eq!(lexicon.refusal, vec!["no clue"]);
        assert_eq!(lexicon.low_quality, vec!["no clue", "meh"]);
        assert_eq!(lexicon.rejection, vec!["broken"]);
    }

    #[test]
    fn test_sentinel_is_rejected() {
        let lexicon = PhraseLexicon::english();
        assert!(lexicon.find_rejection(&lexicon.retrieval_failed).is_some());
        let ru = PhraseLexicon::russian();
        assert!(ru.find_rejection(&ru.retrieval_failed).is_some());
    }

    #[test]
    fn test_locale_parse() {
        assert_eq!("RU".parse::<Locale>(), Ok(Locale::Ru));
        assert!("de".parse::<Locale>().is_err());
    }
}
