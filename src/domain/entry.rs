//! Journal entry model

use crate::domain::emotions::pleasantness_from_emotions;
use crate::domain::rich_text::RichText;
use crate::error::{JotterError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Count words the way entries are counted everywhere: whitespace-separated runs
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// An image stored alongside an entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAttachment {
    pub id: Uuid,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

impl ImageAttachment {
    pub fn new(data: Vec<u8>) -> Self {
        ImageAttachment {
            id: Uuid::new_v4(),
            data,
        }
    }
}

/// One journal record.
///
/// `content`, `rich_payload` and `word_count` are kept private so they can
/// only change together: when a rich payload is present `content` is its
/// plain-text projection, and `word_count` always matches `content`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    id: Uuid,
    pub title: String,
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rich_payload: Option<RichText>,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub emotions: Vec<String>,
    #[serde(
        default,
        alias = "pleasantnessScore",
        skip_serializing_if = "Option::is_none"
    )]
    pleasantness: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default)]
    word_count: usize,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub attachments: Vec<ImageAttachment>,
    /// Fields written by other versions, carried through untouched
    #[serde(flatten)]
    pub(crate) extra: BTreeMap<String, serde_json::Value>,
}

impl JournalEntry {
    /// Create a new entry with a fresh id, dated now
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        JournalEntry {
            id: Uuid::new_v4(),
            title: title.into(),
            word_count: count_words(&content),
            content,
            rich_payload: None,
            date: Utc::now(),
            emotions: Vec::new(),
            pleasantness: None,
            tags: Vec::new(),
            is_pinned: false,
            attachments: Vec::new(),
            extra: BTreeMap::new(),
        }
    }

    /// Create a new entry whose body is a rich document
    pub fn with_rich_text(title: impl Into<String>, rich: RichText) -> Self {
        let mut entry = JournalEntry::new(title, "");
        entry.set_rich_payload(rich);
        entry
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Replace the body with plain text, dropping any rich payload and
    /// the images it embedded
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.rich_payload = None;
        self.word_count = count_words(&self.content);
        self.attachments.clear();
    }

    pub fn rich_payload(&self) -> Option<&RichText> {
        self.rich_payload.as_ref()
    }

    /// Replace the body with a rich document; `content` follows its projection.
    /// Attachments the new document does not reference are dropped.
    pub fn set_rich_payload(&mut self, rich: RichText) {
        self.content = rich.plain_text();
        self.word_count = count_words(&self.content);
        let referenced: Vec<Uuid> = rich
            .attachment_refs()
            .iter()
            .filter_map(|target| Uuid::parse_str(target).ok())
            .collect();
        self.attachments.retain(|a| referenced.contains(&a.id));
        self.rich_payload = Some(rich);
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }

    /// Explicit pleasantness, if the user set one
    pub fn pleasantness(&self) -> Option<f64> {
        self.pleasantness
    }

    /// Set pleasantness, clamped to [0, 1]. Non-finite values clear it.
    pub fn set_pleasantness(&mut self, value: Option<f64>) {
        self.pleasantness = value.filter(|v| v.is_finite()).map(|v| v.clamp(0.0, 1.0));
    }

    /// Pleasantness to display: the explicit value or one derived from emotions
    pub fn effective_pleasantness(&self) -> f64 {
        self.pleasantness
            .unwrap_or_else(|| pleasantness_from_emotions(&self.emotions))
    }

    /// Replace emotions, dropping empty labels and duplicates (first wins)
    pub fn set_emotions<I, S>(&mut self, emotions: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.emotions.clear();
        for emotion in emotions {
            let emotion = emotion.into().trim().to_string();
            if !emotion.is_empty() && !self.emotions.contains(&emotion) {
                self.emotions.push(emotion);
            }
        }
    }

    /// Attach an image and return its id for use in rich text
    pub fn add_attachment(&mut self, data: Vec<u8>) -> Uuid {
        let attachment = ImageAttachment::new(data);
        let id = attachment.id;
        self.attachments.push(attachment);
        id
    }

    /// Restore the derived fields after loading data written elsewhere
    pub(crate) fn normalize(&mut self) {
        if let Some(rich) = &self.rich_payload {
            self.content = rich.plain_text();
        }
        self.word_count = count_words(&self.content);
        let emotions = std::mem::take(&mut self.emotions);
        self.set_emotions(emotions);
        self.set_pleasantness(self.pleasantness);
    }

    /// Check the invariants an entry must satisfy before it is persisted
    pub fn validate(&self) -> Result<()> {
        if self.word_count != count_words(&self.content) {
            return Err(JotterError::InvalidEntry(format!(
                "word count {} does not match content",
                self.word_count
            )));
        }

        if let Some(p) = self.pleasantness {
            if !(0.0..=1.0).contains(&p) {
                return Err(JotterError::InvalidEntry(format!(
                    "pleasantness {} outside [0, 1]",
                    p
                )));
            }
        }

        for (i, attachment) in self.attachments.iter().enumerate() {
            if self.attachments[..i].iter().any(|a| a.id == attachment.id) {
                return Err(JotterError::InvalidEntry(format!(
                    "duplicate attachment id {}",
                    attachment.id
                )));
            }
        }

        if let Some(rich) = &self.rich_payload {
            if self.content != rich.plain_text() {
                return Err(JotterError::InvalidEntry(
                    "content is out of sync with rich payload".to_string(),
                ));
            }

            let referenced = rich.attachment_ids().map_err(|target| {
                JotterError::InvalidEntry(format!("invalid attachment reference '{}'", target))
            })?;
            for id in referenced {
                if !self.attachments.iter().any(|a| a.id == id) {
                    return Err(JotterError::InvalidEntry(format!(
                        "rich payload references missing attachment {}",
                        id
                    )));
                }
            }
        }

        Ok(())
    }
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
