use std::collections::{HashMap, HashSet};

use super::sentiment::tokenize;

/// Topic labels and the words that describe them, in tie-break order.
const TOPICS: &[(&str, &[&str])] = &[
    (
        "family",
        &[
            "family", "parent", "mum", "mom", "dad", "auntie", "uncle", "sister", "brother",
            "spouse", "partner", "wife", "husband", "kid", "child", "children", "grandma",
            "grandad",
        ],
    ),
    (
        "health",
        &[
            "health", "wellbeing", "exercise", "meditation", "running", "run", "walking", "sleep",
            "diet", "food", "nutrition", "gym", "yoga", "tidy", "swim",
        ],
    ),
    (
        "work",
        &[
            "job", "work", "career", "project", "council", "boss", "colleague", "team", "meeting",
            "office", "client", "deadline",
        ],
    ),
    (
        "nature",
        &[
            "nature", "park", "walk", "outdoors", "tree", "greenery", "hiking", "hike", "step",
            "climbing", "mountain", "garden", "beach", "sunshine",
        ],
    ),
    (
        "pets",
        &["cat", "pet", "animal", "kitty", "dog", "puppy", "kitten", "vet"],
    ),
];

pub fn topics() -> impl Iterator<Item = &'static str> {
    TOPICS.iter().map(|(name, _)| *name)
}

/// Picks the topic whose description is closest (cosine similarity over
/// word counts) to the text. `None` when no topic word appears at all.
pub fn classify(text: &str) -> Option<&'static str> {
    let entry = word_counts(text);
    if entry.is_empty() {
        return None;
    }

    let mut best: Option<(&'static str, f64)> = None;
    for &(name, words) in TOPICS {
        let topic: HashSet<&str> = words.iter().copied().collect();
        let similarity = cosine(&entry, &topic);
        if similarity > 0.0 && best.map_or(true, |(_, s)| similarity > s) {
            best = Some((name, similarity));
        }
    }
    best.map(|(name, _)| name)
}

fn word_counts(text: &str) -> HashMap<String, f64> {
    let mut counts = HashMap::new();
    for token in tokenize(text) {
        *counts.entry(singular(&token)).or_insert(0.0) += 1.0;
    }
    counts
}

/// Crude plural folding so "cats" matches "cat" and "parks" matches "park".
fn singular(word: &str) -> String {
    match word.strip_suffix('s') {
        Some(stem) if stem.len() > 2 && !stem.ends_with('s') => stem.to_string(),
        _ => word.to_string(),
    }
}

fn cosine(entry: &HashMap<String, f64>, topic: &HashSet<&str>) -> f64 {
    let dot: f64 = entry
        .iter()
        .filter(|(word, _)| topic.contains(word.as_str()))
        .map(|(_, count)| count)
        .sum();
    if dot == 0.0 {
        return 0.0;
    }
    let entry_norm = entry.values().map(|c| c * c).sum::<f64>().sqrt();
    let topic_norm = (topic.len() as f64).sqrt();
    dot / (entry_norm * topic_norm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifies_each_topic() {
        assert_eq!(classify("Dinner with my sister and her kids"), Some("family"));
        assert_eq!(classify("Went to the gym and slept well, good sleep"), Some("health"));
        assert_eq!(classify("The team shipped the project before the deadline"), Some("work"));
        assert_eq!(classify("A hike up the mountain, so many trees"), Some("nature"));
        assert_eq!(classify("The cats curled up on my lap"), Some("pets"));
    }

    #[test]
    fn test_no_overlap_is_none() {
        assert_eq!(classify("Grateful for a quiet evening"), None);
        assert_eq!(classify(""), None);
    }

    #[test]
    fn test_most_overlap_wins() {
        // one work word, three pet words
        assert_eq!(
            classify("Took the dog to the vet, then the puppy class after my meeting"),
            Some("pets")
        );
    }

    #[test]
    fn test_singular_folding() {
        assert_eq!(singular("cats"), "cat");
        assert_eq!(singular("parks"), "park");
        assert_eq!(singular("glass"), "glass");
        assert_eq!(singular("is"), "is");
    }

    #[test]
    fn test_topics_listed_in_order() {
        assert_eq!(
            topics().collect::<Vec<_>>(),
            vec!["family", "health", "work", "nature", "pets"]
        );
    }
}
