//! Pack request files.
//!
//! ```json
//! {
//!   "config": { "max_tokens": 500, "text_format": "markdown" },
//!   "items": [
//!     { "content": "You are helpful.", "role": "system" },
//!     { "content": "<p>Doc</p>", "priority": 20, "refine": ["strip_html"] },
//!     { "content": "Question?", "role": "user" }
//!   ],
//!   "history": [{ "role": "user", "content": "Earlier question" }]
//! }
//! ```

use anyhow::{anyhow, Context, Result};
use packer_core::refine::builtin;
use packer_core::{ChatMessage, NewItem, Packer, PackerConfig, Priority, Renderer, Role};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PackRequest {
    pub config: PackerConfig,
    pub items: Vec<RequestItem>,
    /// Earlier conversation turns, added at LOW priority
    pub history: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequestItem {
    pub content: String,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub priority: Option<Priority>,
    /// Names of built-in refine operations, applied in order
    #[serde(default)]
    pub refine: Vec<String>,
}

impl RequestItem {
    pub fn to_new_item(&self) -> Result<NewItem> {
        let mut item = NewItem::new(self.content.clone())
            .maybe_role(self.role)
            .maybe_priority(self.priority);

        for name in &self.refine {
            let refiner =
                builtin(name).ok_or_else(|| anyhow!("Unknown refine operation '{name}'"))?;
            item = item.refine_with_boxed(refiner);
        }
        Ok(item)
    }
}

impl PackRequest {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read request file {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Failed to parse request file {}", path.display()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Add the request's items to `packer`.
    ///
    /// History goes right before a trailing user item so the current query
    /// stays last in reading order; otherwise it is appended.
    pub fn fill<R: Renderer>(&self, packer: &mut Packer<R>) -> Result<()> {
        let (leading, trailing) = match self.items.split_last() {
            Some((last, rest)) if last.role == Some(Role::User) && !self.history.is_empty() => {
                (rest, Some(last))
            }
            _ => (self.items.as_slice(), None),
        };

        for (index, item) in leading.iter().enumerate() {
            packer
                .add(item.to_new_item()?)
                .with_context(|| format!("Failed to add item {index}"))?;
        }

        if !self.history.is_empty() {
            tracing::debug!("Adding {} history messages", self.history.len());
            packer.add_messages(self.history.iter().cloned(), None);
        }

        if let Some(item) = trailing {
            packer
                .add(item.to_new_item()?)
                .with_context(|| format!("Failed to add item {}", leading.len()))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use packer_core::{MessagesPacker, TextFormat, PRIORITY_LOW};
    use std::io::Write;

    const REQUEST: &str = r#"{
        "config": { "max_tokens": 500, "text_format": "markdown" },
        "items": [
            { "content": "You are helpful.", "role": "system" },
            { "content": "<p>Some <b>doc</b></p>", "priority": 25, "refine": ["strip_html"] },
            { "content": "Question?", "role": "user" }
        ],
        "history": [
            { "role": "user", "content": "Earlier question" },
            { "role": "assistant", "content": "Earlier answer" }
        ]
    }"#;

    #[test]
    fn parses_request_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(REQUEST.as_bytes()).unwrap();

        let request = PackRequest::load(file.path()).unwrap();
        assert_eq!(request.config.max_tokens, Some(500));
        assert_eq!(request.config.text_format, TextFormat::Markdown);
        assert_eq!(request.items.len(), 3);
        assert_eq!(request.items[1].refine, vec!["strip_html"]);
        assert_eq!(request.history.len(), 2);
    }

    #[test]
    fn history_goes_before_trailing_query() {
        let request = PackRequest::from_json(REQUEST).unwrap();
        let mut packer = MessagesPacker::new(&PackerConfig::new()).unwrap();
        request.fill(&mut packer).unwrap();

        let contents: Vec<String> = packer.pack().into_iter().map(|m| m.content).collect();
        assert_eq!(
            contents,
            vec![
                "You are helpful.",
                "Some doc",
                "Earlier question",
                "Earlier answer",
                "Question?"
            ]
        );
        assert_eq!(packer.items()[2].priority, PRIORITY_LOW);
        assert_eq!(packer.items()[1].priority, 25);
    }

    #[test]
    fn history_is_appended_without_trailing_query() {
        let request = PackRequest::from_json(
            r#"{
                "items": [{ "content": "doc" }],
                "history": [{ "role": "assistant", "content": "hi" }]
            }"#,
        )
        .unwrap();
        let mut packer = MessagesPacker::new(&PackerConfig::new()).unwrap();
        request.fill(&mut packer).unwrap();

        let contents: Vec<String> = packer.pack().into_iter().map(|m| m.content).collect();
        assert_eq!(contents, vec!["doc", "hi"]);
    }

    #[test]
    fn unknown_refiner_is_rejected() {
        let request =
            PackRequest::from_json(r#"{"items": [{"content": "x", "refine": ["summarize"]}]}"#)
                .unwrap();
        let mut packer = MessagesPacker::new(&PackerConfig::new()).unwrap();

        let err = request.fill(&mut packer).unwrap_err();
        assert!(err.to_string().contains("summarize"), "got: {err}");
        assert!(packer.is_empty());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = PackRequest::load(Path::new("/nonexistent/request.json")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/request.json"));
    }
}
