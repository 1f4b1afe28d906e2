//! Emotion categories and the pleasantness lookup table

/// A named group of emotion labels sharing one valence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmotionCategory {
    pub name: &'static str,
    /// Mood valence in [0, 1] for every label in this category
    pub valence: f64,
    pub emotions: &'static [&'static str],
}

/// Valence used when no known emotion is selected
pub const NEUTRAL_PLEASANTNESS: f64 = 0.5;

pub const EMOTION_CATEGORIES: &[EmotionCategory] = &[
    EmotionCategory {
        name: "Joy",
        valence: 0.9,
        emotions: &[
            "Happy",
            "Excited",
            "Peaceful",
            "Content",
            "Grateful",
            "Optimistic",
            "Proud",
            "Cheerful",
            "Inspired",
        ],
    },
    EmotionCategory {
        name: "Love",
        valence: 0.85,
        emotions: &[
            "Loved",
            "Affectionate",
            "Romantic",
            "Caring",
            "Compassionate",
            "Tender",
            "Warm",
        ],
    },
    EmotionCategory {
        name: "Sadness",
        valence: 0.2,
        emotions: &[
            "Sad",
            "Lonely",
            "Disappointed",
            "Hurt",
            "Melancholic",
            "Down",
            "Gloomy",
            "Heartbroken",
        ],
    },
    EmotionCategory {
        name: "Anger",
        valence: 0.15,
        emotions: &[
            "Angry",
            "Frustrated",
            "Irritated",
            "Annoyed",
            "Furious",
            "Agitated",
            "Bitter",
        ],
    },
    EmotionCategory {
        name: "Fear",
        valence: 0.25,
        emotions: &[
            "Anxious",
            "Worried",
            "Scared",
            "Nervous",
            "Overwhelmed",
            "Stressed",
            "Insecure",
            "Uneasy",
        ],
    },
    EmotionCategory {
        name: "Neutral",
        valence: 0.55,
        emotions: &[
            "Calm",
            "Focused",
            "Thoughtful",
            "Curious",
            "Relaxed",
            "Balanced",
            "Contemplative",
        ],
    },
];

/// Find the category a label belongs to (case-insensitive)
pub fn category_of(emotion: &str) -> Option<&'static EmotionCategory> {
    let needle = emotion.trim();
    EMOTION_CATEGORIES.iter().find(|category| {
        category
            .emotions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(needle))
    })
}

/// Derive a pleasantness score from a set of emotion labels.
///
/// Averages the valence of every recognised label. Free-form labels that
/// belong to no category are ignored; with nothing recognised the result is
/// [`NEUTRAL_PLEASANTNESS`].
pub fn pleasantness_from_emotions<S: AsRef<str>>(emotions: &[S]) -> f64 {
    let valences: Vec<f64> = emotions
        .iter()
        .filter_map(|e| category_of(e.as_ref()))
        .map(|c| c.valence)
        .collect();

    if valences.is_empty() {
        return NEUTRAL_PLEASANTNESS;
    }

    valences.iter().sum::<f64>() / valences.len() as f64
}
