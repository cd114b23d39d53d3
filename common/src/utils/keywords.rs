use std::collections::HashSet;
use std::sync::OnceLock;

/// Stopwords plus interrogatives. Tokens in this set never become keywords.
static STOPWORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "if", "then", "than", "so", "of", "in", "on", "at", "to",
    "for", "from", "by", "with", "about", "into", "through", "during", "before", "after", "above",
    "below", "up", "down", "out", "off", "over", "under", "again", "further", "once", "here",
    "there", "all", "any", "both", "each", "few", "more", "most", "other", "some", "such", "no",
    "nor", "not", "only", "own", "same", "too", "very", "can", "just", "should", "now", "i", "me",
    "my", "we", "our", "you", "your", "he", "him", "his", "she", "her", "it", "its", "they",
    "them", "their", "this", "that", "these", "those", "am", "be", "been", "being", "do", "does",
    "did", "doing", "have", "has", "had", "having",
    // Interrogatives and auxiliaries common in questions
    "what", "which", "who", "whom", "whose", "when", "where", "why", "how", "is", "are", "was",
    "were", "will", "would",
];

/// Generic verbs that carry little search signal. Demoted, not dropped:
/// they still pad the result when salient tokens run out.
static WEAK_TOKENS: &[&str] = &[
    "get", "got", "make", "made", "take", "took", "give", "gave", "go", "went", "come", "came",
    "know", "think", "see", "want", "use", "used", "tell", "told", "say", "said", "many", "much",
];

fn stopwords() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| STOPWORDS.iter().copied().collect())
}

fn weak_tokens() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| WEAK_TOKENS.iter().copied().collect())
}

/// Derive up to `num_keywords` search terms from a free-text question.
///
/// Lowercases, strips punctuation, drops stopwords/interrogatives and
/// single-character tokens, prefers content-bearing tokens, and pads with
/// the remaining tokens in their original order. Deterministic for a given
/// input.
pub fn extract_keywords(question: &str, num_keywords: usize) -> Vec<String> {
    let normalized: String = question
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    let candidates: Vec<&str> = normalized
        .split_whitespace()
        .filter(|token| token.chars().count() > 1 && !stopwords().contains(token))
        .collect();

    let mut keywords: Vec<String> = Vec::with_capacity(num_keywords);
    for token in &candidates {
        if keywords.len() >= num_keywords {
            break;
        }
        if !weak_tokens().contains(token) && !keywords.iter().any(|k| k == token) {
            keywords.push((*token).to_string());
        }
    }

    // Pad with demoted tokens, original order, until exhausted.
    for token in &candidates {
        if keywords.len() >= num_keywords {
            break;
        }
        if !keywords.iter().any(|k| k == token) {
            keywords.push((*token).to_string());
        }
    }

    keywords
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_interrogatives_and_punctuation() {
        let keywords = extract_keywords("What is the industry of this company?", 5);
        assert_eq!(keywords, vec!["industry", "company"]);
    }

    #[test]
    fn caps_at_requested_count() {
        let keywords = extract_keywords(
            "Which programming languages power modern database engines today?",
            3,
        );
        assert_eq!(keywords.len(), 3);
        assert_eq!(keywords[0], "programming");
    }

    #[test]
    fn pads_with_weak_tokens_when_salient_ones_run_out() {
        let keywords = extract_keywords("How many employees got hired?", 5);
        // "employees" and "hired" are salient, "many"/"got" pad afterwards.
        assert_eq!(keywords, vec!["employees", "hired", "many", "got"]);
    }

    #[test]
    fn deterministic_for_identical_input() {
        let a = extract_keywords("Where is the headquarters of Acme Corp located?", 5);
        let b = extract_keywords("Where is the headquarters of Acme Corp located?", 5);
        assert_eq!(a, b);
    }

    #[test]
    fn empty_question_yields_no_keywords() {
        assert!(extract_keywords("", 5).is_empty());
        assert!(extract_keywords("what is it?", 5).is_empty());
    }
}
