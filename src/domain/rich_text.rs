//! Rich payload: formatted entry body with inline images
//!
//! The payload is markdown. Inline images point at entry attachments through
//! `attachment:<uuid>` URLs, e.g. `![beach](attachment:6f1c...)`.

use pulldown_cmark::{Event, Parser as MdParser, Tag, TagEnd};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// URL scheme used by inline images to reference an attachment
pub const ATTACHMENT_SCHEME: &str = "attachment:";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RichText {
    markdown: String,
}

impl RichText {
    pub fn new(markdown: impl Into<String>) -> Self {
        RichText {
            markdown: markdown.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.markdown
    }

    /// Markdown snippet embedding an attachment as an inline image
    pub fn image_markdown(attachment_id: Uuid, alt: &str) -> String {
        format!("![{}]({}{})", alt, ATTACHMENT_SCHEME, attachment_id)
    }

    /// Plain-text projection of the document.
    ///
    /// Formatting is dropped, image alt text is skipped and every block
    /// (paragraph, heading, list item, code block) ends on its own line.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        let mut image_depth = 0usize;

        for event in MdParser::new(&self.markdown) {
            match event {
                Event::Start(Tag::Image { .. }) => image_depth += 1,
                Event::End(TagEnd::Image) => image_depth = image_depth.saturating_sub(1),
                Event::Text(text) | Event::Code(text) if image_depth == 0 => {
                    out.push_str(&text);
                }
                Event::SoftBreak | Event::HardBreak => out.push('\n'),
                Event::End(
                    TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::Item | TagEnd::CodeBlock,
                ) => {
                    if !out.is_empty() && !out.ends_with('\n') {
                        out.push('\n');
                    }
                }
                _ => {}
            }
        }

        out.trim_end().to_string()
    }

    /// Raw targets of every inline image using the attachment scheme
    pub fn attachment_refs(&self) -> Vec<String> {
        MdParser::new(&self.markdown)
            .filter_map(|event| match event {
                Event::Start(Tag::Image { dest_url, .. }) => dest_url
                    .strip_prefix(ATTACHMENT_SCHEME)
                    .map(|target| target.to_string()),
                _ => None,
            })
            .collect()
    }

    /// Attachment ids referenced by inline images, in document order.
    ///
    /// Fails with the offending target when a reference is not a valid id.
    pub fn attachment_ids(&self) -> std::result::Result<Vec<Uuid>, String> {
        self.attachment_refs()
            .into_iter()
            .map(|target| Uuid::parse_str(&target).map_err(|_| target))
            .collect()
    }
}
