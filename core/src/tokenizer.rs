use lazy_static::lazy_static;
use once_cell::sync::OnceCell;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref RE: Regex = Regex::new(r"(?u)[\p{L}\p{N}][\p{L}\p{N}_']*").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref DEFAULT_STOPWORDS: HashSet<String> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn't",
            "did","didn't","do","does","doesn't","doing","don't","down","during",
            "each","few","for","from","further",
            "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
            "let's","me","more","most","mustn't","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
            "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","very",
            "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
            "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().map(|w| w.to_string()).collect()
    };
}

static INSTALLED_STOPWORDS: OnceCell<HashSet<String>> = OnceCell::new();

/// Replace the built-in stop-word list for the rest of the process.
///
/// Only the first call wins; returns `false` when a list was already installed.
pub fn install_stop_words<I, S>(words: I) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    INSTALLED_STOPWORDS.set(word_set(words)).is_ok()
}

fn word_set<I, S>(words: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    words
        .into_iter()
        .map(|w| w.as_ref().trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

fn stop_words() -> &'static HashSet<String> {
    INSTALLED_STOPWORDS.get().unwrap_or(&*DEFAULT_STOPWORDS)
}

pub fn is_stopword(token: &str) -> bool {
    stop_words().contains(token)
}

/// Analyzer settings. Recorded in the index metadata so queries are normalized the
/// same way the collection was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizerConfig {
    pub stem: bool,
    pub remove_stop_words: bool,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            stem: true,
            remove_stop_words: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Tokenizer {
    config: TokenizerConfig,
    /// Overrides the process-wide list when set.
    stop_words: Option<Arc<HashSet<String>>>,
}

impl Tokenizer {
    pub fn new(config: TokenizerConfig) -> Self {
        Self { config, stop_words: None }
    }

    /// Filter with `words` instead of the process-wide stop-word list.
    pub fn with_stop_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.stop_words = Some(Arc::new(word_set(words)));
        self
    }

    pub fn config(&self) -> TokenizerConfig {
        self.config
    }

    /// The list given through [`with_stop_words`](Self::with_stop_words), if any.
    pub fn custom_stop_words(&self) -> Option<&HashSet<String>> {
        self.stop_words.as_deref()
    }

    fn is_stop_word(&self, token: &str) -> bool {
        match &self.stop_words {
            Some(words) => words.contains(token),
            None => is_stopword(token),
        }
    }

    /// Tokenize text using NFKC normalization, lowercase, stopword removal and optional stemming.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let normalized = text.nfkc().collect::<String>().to_lowercase();
        RE.find_iter(&normalized)
            .map(|mat| mat.as_str())
            .filter(|token| !(self.config.remove_stop_words && self.is_stop_word(token)))
            .map(|token| self.stem(token))
            .collect()
    }

    /// Normalize a single query word without dropping it, even if it is a stop word.
    pub fn normalize(&self, word: &str) -> String {
        let normalized = word.nfkc().collect::<String>().to_lowercase();
        self.stem(normalized.trim())
    }

    fn stem(&self, token: &str) -> String {
        if self.config.stem {
            STEMMER.stem(token).to_string()
        } else {
            token.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_tokenize() {
        let t = Tokenizer::default().tokenize("Running, runner's run!");
        assert!(t.iter().any(|w| w == "run"));
    }

    #[test]
    fn stemming_can_be_disabled() {
        let tokenizer = Tokenizer::new(TokenizerConfig { stem: false, remove_stop_words: true });
        assert_eq!(tokenizer.tokenize("Running dogs"), vec!["running", "dogs"]);
        assert_eq!(tokenizer.normalize("Dogs"), "dogs");
    }

    #[test]
    fn numbers_are_tokens() {
        let tokenizer = Tokenizer::new(TokenizerConfig { stem: false, remove_stop_words: false });
        assert_eq!(tokenizer.tokenize("ALGOL 60 and the 1994 report"), vec!["algol", "60", "and", "the", "1994", "report"]);
    }

    #[test]
    fn own_stop_words_replace_the_builtin_list() {
        let tokenizer = Tokenizer::new(TokenizerConfig { stem: false, remove_stop_words: true })
            .with_stop_words([" Cat ", "", "dog"]);
        assert_eq!(tokenizer.tokenize("The cat chased a dog"), vec!["the", "chased", "a"]);
        assert_eq!(tokenizer.custom_stop_words().map(|w| w.len()), Some(2));
        assert!(Tokenizer::default().custom_stop_words().is_none());
    }
}
