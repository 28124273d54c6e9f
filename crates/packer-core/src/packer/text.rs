//! Text rendering for completion APIs.
//!
//! Three layouts:
//! - `Raw`: contents joined by the separator, no markup
//! - `Markdown`: items grouped by role under `### INSTRUCTIONS`, `### CONTEXT`,
//!   `### CONVERSATION` and `### INPUT` headers
//! - `Xml`: every item wrapped in `<role>` tags (`<context>` when untagged)

use super::config::DEFAULT_SEPARATOR;
use super::Renderer;
use crate::budget::counter::TokenCounter;
use crate::budget::types::PackError;
use crate::item::{PackableItem, Role};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Estimated cost of the markdown section headers and the blank lines between
/// them. Deducted from the ceiling once since it does not grow with item count.
pub const MARKDOWN_HEADER_RESERVE: usize = 30;

/// Marginal cost of a context document in markdown layout ("\n\n- ").
pub const MARKDOWN_CONTEXT_OVERHEAD: usize = 3;

/// Marginal cost of a conversation turn in markdown layout ("\nUser: ").
pub const MARKDOWN_CONVERSATION_OVERHEAD: usize = 4;

const SECTION_SEPARATOR: &str = "\n\n";
const CONTEXT_TAG: &str = "context";

/// Layout of the text packer output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TextFormat {
    /// Unstructured: items joined by the separator
    #[default]
    #[serde(alias = "unstructured")]
    Raw,
    /// Grouped sections with `###` headers
    #[serde(alias = "grouped")]
    Markdown,
    /// Role-tagged items
    #[serde(alias = "tagged")]
    Xml,
}

impl TextFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextFormat::Raw => "raw",
            TextFormat::Markdown => "markdown",
            TextFormat::Xml => "xml",
        }
    }
}

impl fmt::Display for TextFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TextFormat {
    type Err = PackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "raw" | "unstructured" => Ok(TextFormat::Raw),
            "markdown" | "grouped" => Ok(TextFormat::Markdown),
            "xml" | "tagged" => Ok(TextFormat::Xml),
            other => Err(PackError::Config(format!(
                "unknown text format '{other}' (expected raw, markdown or xml)"
            ))),
        }
    }
}

/// Renders selected items into a single prompt string.
#[derive(Debug, Clone)]
pub struct TextRenderer {
    format: TextFormat,
    separator: String,
}

impl TextRenderer {
    pub fn new(format: TextFormat, separator: impl Into<String>) -> Self {
        Self {
            format,
            separator: separator.into(),
        }
    }

    pub fn format(&self) -> TextFormat {
        self.format
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    fn separator_tokens(&self, counter: &dyn TokenCounter) -> usize {
        if self.separator.is_empty() {
            0
        } else {
            counter.count_text(&self.separator)
        }
    }

    fn render_tagged(&self, items: &[&PackableItem]) -> String {
        items
            .iter()
            .map(|item| {
                let tag = tag_name(item);
                format!("<{tag}>\n{}\n</{tag}>", item.content())
            })
            .collect::<Vec<_>>()
            .join(&self.separator)
    }
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self::new(TextFormat::Raw, DEFAULT_SEPARATOR)
    }
}

impl Renderer for TextRenderer {
    type Output = String;

    fn name(&self) -> &'static str {
        self.format.as_str()
    }

    fn reserved_tokens(&self) -> usize {
        match self.format {
            TextFormat::Markdown => MARKDOWN_HEADER_RESERVE,
            TextFormat::Raw | TextFormat::Xml => 0,
        }
    }

    fn overhead(&self, item: &PackableItem, counter: &dyn TokenCounter) -> usize {
        match self.format {
            // Charged to every item, the first included
            TextFormat::Raw => self.separator_tokens(counter),
            TextFormat::Markdown => match item.role() {
                Some(Role::System) => 0,
                None => MARKDOWN_CONTEXT_OVERHEAD,
                Some(_) => MARKDOWN_CONVERSATION_OVERHEAD,
            },
            TextFormat::Xml => {
                let tag = tag_name(item);
                self.separator_tokens(counter)
                    + counter.count_text(&format!("<{tag}>\n"))
                    + counter.count_text(&format!("\n</{tag}>"))
            }
        }
    }

    fn render(&self, items: &[&PackableItem]) -> String {
        match self.format {
            TextFormat::Raw => items
                .iter()
                .map(|item| item.content())
                .collect::<Vec<_>>()
                .join(&self.separator),
            TextFormat::Markdown => render_grouped(items),
            TextFormat::Xml => self.render_tagged(items),
        }
    }
}

fn tag_name(item: &PackableItem) -> &'static str {
    item.role().map_or(CONTEXT_TAG, |role| role.as_str())
}

/// Group items into INSTRUCTIONS, CONTEXT, CONVERSATION and INPUT sections.
///
/// The trailing user turn becomes INPUT; every other conversational item is
/// history. Empty sections are omitted.
fn render_grouped(items: &[&PackableItem]) -> String {
    let mut instructions: Vec<&str> = Vec::new();
    let mut context: Vec<&str> = Vec::new();
    let mut conversation: Vec<(Role, &str)> = Vec::new();

    for item in items {
        match item.role() {
            Some(Role::System) => instructions.push(item.content()),
            None => context.push(item.content()),
            Some(role) => conversation.push((role, item.content())),
        }
    }

    let mut sections: Vec<String> = Vec::with_capacity(4);

    if !instructions.is_empty() {
        sections.push(format!(
            "### INSTRUCTIONS:\n{}",
            instructions.join(SECTION_SEPARATOR)
        ));
    }

    match context.as_slice() {
        [] => {}
        [single] => sections.push(format!("### CONTEXT:\n{single}")),
        documents => {
            let bullets = documents
                .iter()
                .map(|doc| format!("- {doc}"))
                .collect::<Vec<_>>()
                .join(SECTION_SEPARATOR);
            sections.push(format!("### CONTEXT:\n{bullets}"));
        }
    }

    let (history, input) = match conversation.split_last() {
        Some(((Role::User, query), rest)) => (rest, Some(*query)),
        _ => (conversation.as_slice(), None),
    };

    if !history.is_empty() {
        let lines = history
            .iter()
            .map(|(role, content)| format!("{}: {content}", role.label()))
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(format!("### CONVERSATION:\n{lines}"));
    }

    if let Some(query) = input {
        sections.push(format!("### INPUT:\n{query}"));
    }

    sections.join(SECTION_SEPARATOR)
}
