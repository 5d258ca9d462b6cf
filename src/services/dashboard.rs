use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use super::sentiment::tokenize;
use super::topic;
use crate::models::entry::{Entry, Mood};

pub const DEFAULT_RECENT: usize = 10;
pub const DEFAULT_WORDS: usize = 50;

const STOP_WORDS: &[&str] = &[
    "about", "after", "again", "all", "also", "and", "any", "are", "because", "been", "before",
    "but", "can", "could", "did", "didn't", "does", "for", "from", "had", "has", "have", "her",
    "here", "him", "his", "how", "i'm", "into", "its", "it's", "just", "more", "most", "much",
    "myself", "not", "now", "off", "once", "one", "only", "our", "out", "over", "really", "she",
    "some", "that", "the", "their", "them", "then", "there", "they", "this", "too", "today",
    "very", "was", "way", "were", "what", "when", "which", "while", "who", "why", "will", "with",
    "would", "you", "your",
];

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub total_entries: usize,
    pub mood_over_time: Vec<MoodPoint>,
    pub mood_counts: Vec<MoodCount>,
    pub topic_counts: BTreeMap<String, usize>,
    pub word_frequencies: Vec<WordCount>,
    pub steps_vs_sentiment: Vec<StepsPoint>,
    pub recent_entries: Vec<Entry>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct MoodPoint {
    pub date: NaiveDate,
    pub average_sentiment: f64,
    pub average_mood_level: f64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct MoodCount {
    pub mood: Mood,
    pub count: usize,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct WordCount {
    pub word: String,
    pub count: usize,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct StepsPoint {
    pub date: NaiveDate,
    pub steps: i64,
    pub sentiment: f64,
}

/// Aggregates over already-filtered active entries, newest first.
pub fn build(entries: &[Entry], recent: usize, words: usize) -> Dashboard {
    Dashboard {
        total_entries: entries.len(),
        mood_over_time: mood_over_time(entries),
        mood_counts: mood_counts(entries),
        topic_counts: topic_counts(entries),
        word_frequencies: word_frequencies(entries, words),
        steps_vs_sentiment: steps_vs_sentiment(entries),
        recent_entries: entries.iter().take(recent).cloned().collect(),
    }
}

/// Per-date averages, oldest date first.
pub fn mood_over_time(entries: &[Entry]) -> Vec<MoodPoint> {
    let mut by_date: BTreeMap<NaiveDate, (f64, f64, usize)> = BTreeMap::new();
    for entry in entries {
        let slot = by_date.entry(entry.entry_date).or_insert((0.0, 0.0, 0));
        slot.0 += entry.sentiment;
        slot.1 += f64::from(entry.mood.level());
        slot.2 += 1;
    }

    by_date
        .into_iter()
        .map(|(date, (sentiment, level, n))| MoodPoint {
            date,
            average_sentiment: sentiment / n as f64,
            average_mood_level: level / n as f64,
        })
        .collect()
}

pub fn mood_counts(entries: &[Entry]) -> Vec<MoodCount> {
    Mood::ALL
        .into_iter()
        .map(|mood| MoodCount {
            mood,
            count: entries.iter().filter(|e| e.mood == mood).count(),
        })
        .collect()
}

pub fn topic_counts(entries: &[Entry]) -> BTreeMap<String, usize> {
    let mut counts: BTreeMap<String, usize> = topic::topics().map(|t| (t.to_string(), 0)).collect();
    for label in entries.iter().filter_map(|e| e.topic.as_deref()) {
        *counts.entry(label.to_string()).or_insert(0) += 1;
    }
    counts
}

/// Most frequent words, ties broken alphabetically.
pub fn word_frequencies(entries: &[Entry], limit: usize) -> Vec<WordCount> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for entry in entries {
        for word in tokenize(&entry.text) {
            if word.chars().count() < 3
                || STOP_WORDS.contains(&word.as_str())
                || word.chars().all(|c| c.is_ascii_digit())
            {
                continue;
            }
            *counts.entry(word).or_insert(0) += 1;
        }
    }

    let mut words: Vec<WordCount> = counts
        .into_iter()
        .map(|(word, count)| WordCount { word, count })
        .collect();
    words.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.word.cmp(&b.word)));
    words.truncate(limit);
    words
}

/// Oldest first; entries without a step record are skipped.
pub fn steps_vs_sentiment(entries: &[Entry]) -> Vec<StepsPoint> {
    let mut points: Vec<StepsPoint> = entries
        .iter()
        .filter_map(|e| {
            e.steps.map(|steps| StepsPoint {
                date: e.entry_date,
                steps,
                sentiment: e.sentiment,
            })
        })
        .collect();
    points.sort_by_key(|p| p.date);
    points
}
