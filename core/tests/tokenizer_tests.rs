use sift_core::tokenizer::{is_stopword, Tokenizer, TokenizerConfig};

#[test]
fn it_normalizes_and_stems() {
    let words = Tokenizer::default().tokenize("Running Runners RUN! The \u{FB01}les.");
    // Stemming to "run" should appear
    assert!(words.contains(&"run".to_string()));
    // NFKC folds the ligature: ﬁles -> file
    assert!(words.contains(&"file".to_string()));
}

#[test]
fn it_filters_stopwords() {
    let words = Tokenizer::default().tokenize("The quick brown fox and the lazy dog");
    assert!(!words.contains(&"the".to_string()));
    assert!(!words.contains(&"and".to_string()));
    assert!(is_stopword("the"));
}

#[test]
fn stop_words_can_be_kept() {
    let tokenizer = Tokenizer::new(TokenizerConfig { stem: true, remove_stop_words: false });
    assert_eq!(tokenizer.tokenize("The cats"), vec!["the", "cat"]);
}

#[test]
fn normalize_keeps_stop_words() {
    assert_eq!(Tokenizer::default().normalize("The"), "the");
}
