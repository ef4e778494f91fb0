//! Rule-based answer synthesis used when generation is unavailable.
//!
//! Deterministic and dependency-free: classify the question by keywords,
//! pull matching sentences out of the retrieved context, and fall through
//! to progressively looser extraction until something survives.

use std::sync::LazyLock;

use regex::Regex;

static SENTENCE_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]+").expect("valid sentence regex"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Cleaned sentences must be longer than this to be kept.
const MIN_CLEANED_CHARS: usize = 10;
/// Maximum characters of raw context returned by the last-resort branch.
const LAST_RESORT_CHARS: usize = 300;

/// One keyword-driven extraction rule.
struct IntentRule {
    /// Any of these in the lowercased question selects the rule.
    triggers: &'static [&'static str],
    /// A sentence must contain one of these to qualify.
    sentence_keywords: &'static [&'static str],
    /// A sentence must be longer than this many characters.
    min_chars: usize,
    /// Maximum sentences used.
    take: usize,
    prefix: &'static str,
}

const INTENT_RULES: &[IntentRule] = &[
    IntentRule {
        triggers: &["what is", "what are"],
        sentence_keywords: &["is", "are", "provides", "offers", "includes", "features"],
        min_chars: 20,
        take: 2,
        prefix: "Based on the PDF: ",
    },
    IntentRule {
        triggers: &["feature", "capability", "function", "tool"],
        sentence_keywords: &[
            "feature",
            "capability",
            "function",
            "tool",
            "management",
            "tracking",
            "automation",
        ],
        min_chars: 15,
        take: 3,
        prefix: "Key features mentioned in the PDF: ",
    },
    IntentRule {
        triggers: &["benefit", "advantage", "help", "improve"],
        sentence_keywords: &[
            "help",
            "improve",
            "benefit",
            "advantage",
            "efficiency",
            "productivity",
        ],
        min_chars: 15,
        take: 2,
        prefix: "Benefits according to the PDF: ",
    },
];

const GENERIC_MIN_CHARS: usize = 20;
const GENERIC_TAKE: usize = 2;
const GENERIC_PREFIX: &str = "Based on the PDF content: ";

/// Deterministic synthesizer over retrieved context.
#[derive(Debug, Clone)]
pub struct FallbackSynthesizer {
    decorative_symbols: Vec<char>,
}

impl FallbackSynthesizer {
    pub fn new(decorative_symbols: Vec<char>) -> Self {
        Self { decorative_symbols }
    }

    /// Build an answer from `context`. Always succeeds.
    pub fn answer(&self, question: &str, context: &str) -> String {
        let context = collapse_whitespace(context);
        let question = question.to_lowercase();
        let sentences: Vec<&str> = SENTENCE_SPLIT
            .split(&context)
            .map(str::trim)
            .collect();

        for rule in INTENT_RULES {
            if !rule.triggers.iter().any(|t| question.contains(t)) {
                continue;
            }
            let picked = sentences.iter().copied().filter(|s| {
                let lower = s.to_lowercase();
                s.chars().count() > rule.min_chars
                    && rule.sentence_keywords.iter().any(|k| lower.contains(k))
            });
            if let Some(answer) = self.compose(rule.prefix, picked, rule.take) {
                return answer;
            }
        }

        let generic = sentences
            .iter()
            .copied()
            .filter(|s| s.chars().count() > GENERIC_MIN_CHARS);
        if let Some(answer) = self.compose(GENERIC_PREFIX, generic, GENERIC_TAKE) {
            return answer;
        }

        let cleaned = self.clean(&context);
        if cleaned.chars().count() > LAST_RESORT_CHARS {
            let head: String = cleaned.chars().take(LAST_RESORT_CHARS).collect();
            format!("{head}...")
        } else {
            cleaned
        }
    }

    /// Remove decorative symbols and collapse whitespace.
    pub fn clean(&self, text: &str) -> String {
        let stripped: String = text
            .chars()
            .filter(|c| !self.decorative_symbols.contains(c))
            .collect();
        collapse_whitespace(&stripped)
    }

    fn compose<'a>(
        &self,
        prefix: &str,
        sentences: impl Iterator<Item = &'a str>,
        take: usize,
    ) -> Option<String> {
        let cleaned: Vec<String> = sentences
            .take(take)
            .map(|s| self.clean(s))
            .filter(|s| s.chars().count() > MIN_CLEANED_CHARS)
            .collect();
        if cleaned.is_empty() {
            None
        } else {
            Some(format!("{prefix}{}.", cleaned.join(". ")))
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}
