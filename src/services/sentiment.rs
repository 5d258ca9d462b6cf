//! VADER sentiment scoring.
//!
//! The compound score lies in [-1, 1] and picks the entry's `Mood`.

use serde::Serialize;
use vader_sentiment::SentimentIntensityAnalyzer;

use crate::models::entry::Mood;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sentiment {
    pub score: f64,
    pub mood: Mood,
}

pub fn analyze(text: &str) -> Sentiment {
    let score = score_text(text);
    Sentiment {
        score,
        mood: Mood::from_score(score),
    }
}

/// Compound score; text without any lexicon word scores 0.
pub fn score_text(text: &str) -> f64 {
    let analyzer = SentimentIntensityAnalyzer::new();
    analyzer
        .polarity_scores(text)
        .get("compound")
        .copied()
        .unwrap_or(0.0)
}

/// Lower-cased words; apostrophes are kept so "didn't" stays one token.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|t| t.trim_matches('\'').to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}
