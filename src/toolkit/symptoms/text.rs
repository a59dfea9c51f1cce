use std::collections::HashSet;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TOKEN_PATTERN: Regex =
        Regex::new(r"\b\w\w+\b").expect("token pattern is a valid regex");

    pub static ref STOP_WORDS: HashSet<&'static str> = [
        "a", "about", "above", "across", "after", "afterwards", "again", "against",
        "all", "almost", "alone", "along", "already", "also", "although", "always",
        "am", "among", "amongst", "an", "and", "another", "any", "anyhow", "anyone",
        "anything", "anyway", "anywhere", "are", "around", "as", "at", "be", "became",
        "because", "become", "becomes", "becoming", "been", "before", "beforehand",
        "behind", "being", "below", "beside", "besides", "between", "beyond", "both",
        "but", "by", "can", "cannot", "could", "did", "do", "does", "doing", "done",
        "down", "due", "during", "each", "eg", "either", "else", "elsewhere", "enough",
        "etc", "even", "ever", "every", "everyone", "everything", "everywhere",
        "except", "few", "for", "former", "formerly", "from", "further", "had", "has",
        "have", "having", "he", "hence", "her", "here", "hereafter", "hereby", "herein",
        "hers", "herself", "him", "himself", "his", "how", "however", "ie", "if", "in",
        "indeed", "into", "is", "it", "its", "itself", "just", "last", "latter",
        "least", "less", "made", "many", "may", "me", "meanwhile", "might", "mine",
        "more", "moreover", "most", "mostly", "much", "must", "my", "myself", "namely",
        "neither", "never", "nevertheless", "next", "no", "nobody", "none", "noone",
        "nor", "not", "nothing", "now", "nowhere", "of", "off", "often", "on", "once",
        "one", "only", "onto", "or", "other", "others", "otherwise", "our", "ours",
        "ourselves", "out", "over", "own", "per", "perhaps", "please", "rather", "re",
        "same", "seem", "seemed", "seeming", "seems", "several", "she", "should",
        "since", "so", "some", "somehow", "someone", "something", "sometime",
        "sometimes", "somewhere", "still", "such", "than", "that", "the", "their",
        "theirs", "them", "themselves", "then", "thence", "there", "thereafter",
        "thereby", "therefore", "therein", "thereupon", "these", "they", "this",
        "those", "though", "through", "throughout", "thru", "thus", "to", "together",
        "too", "toward", "towards", "un", "under", "until", "up", "upon", "us", "very",
        "via", "was", "we", "well", "were", "what", "whatever", "when", "whence",
        "whenever", "where", "whereafter", "whereas", "whereby", "wherein",
        "whereupon", "wherever", "whether", "which", "while", "whither", "who",
        "whoever", "whole", "whom", "whose", "why", "will", "with", "within",
        "without", "would", "yet", "you", "your", "yours", "yourself", "yourselves",
    ]
    .into_iter()
    .collect();
}


pub fn word_tokens(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_PATTERN
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|token| !STOP_WORDS.contains(token))
        .map(str::to_string)
        .collect()
}

/// Unigrams followed by adjacent bigrams of the stop-word-filtered tokens.
pub fn analyze(text: &str) -> Vec<String> {
    let tokens = word_tokens(text);
    let mut terms = Vec::with_capacity(tokens.len() * 2);
    terms.extend(tokens.iter().cloned());
    terms.extend(tokens.windows(2).map(|pair| format!("{} {}", pair[0], pair[1])));
    terms
}


pub fn whitespace_token_set(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_tokens_drop_stop_words_and_short_tokens() {
        let tokens = word_tokens("I have a persistent Cough and chest-pain");
        assert_eq!(tokens, vec!["persistent", "cough", "chest", "pain"]);
    }

    #[test]
    fn test_analyze_adds_bigrams_after_filtering() {
        let terms = analyze("cough and mild fever");
        assert_eq!(
            terms,
            vec!["cough", "mild", "fever", "cough mild", "mild fever"]
        );
    }

    #[test]
    fn test_analyze_empty_and_stop_word_only() {
        assert!(analyze("").is_empty());
        assert!(analyze("and the of it").is_empty());
    }

    #[test]
    fn test_whitespace_token_set_keeps_punctuation() {
        let set = whitespace_token_set("Fever, cough  FATIGUE");
        assert!(set.contains("fever,"));
        assert!(set.contains("cough"));
        assert!(set.contains("fatigue"));
        assert_eq!(set.len(), 3);
    }
}
