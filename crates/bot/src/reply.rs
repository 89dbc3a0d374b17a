//! Structured replies. Rendering them into platform embeds happens elsewhere.

use serde::Serialize;

/// Colour family of a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Success,
    Warning,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "style", rename_all = "snake_case")]
pub enum ReplyButton {
    Link { label: String, url: String },
    Action { label: String, custom_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub tone: Tone,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Field>,
    /// Only visible to the user who triggered it.
    pub ephemeral: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<ReplyButton>,
}

impl Reply {
    pub fn new(tone: Tone, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            tone,
            title: title.into(),
            description: description.into(),
            fields: Vec::new(),
            ephemeral: false,
            components: Vec::new(),
        }
    }

    pub fn error(description: impl Into<String>) -> Self {
        Self::new(Tone::Error, "❌ Error", description).ephemeral()
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(Field {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    pub fn ephemeral(mut self) -> Self {
        self.ephemeral = true;
        self
    }

    pub fn link(mut self, label: impl Into<String>, url: impl Into<String>) -> Self {
        self.components.push(ReplyButton::Link {
            label: label.into(),
            url: url.into(),
        });
        self
    }

    pub fn action(mut self, label: impl Into<String>, custom_id: impl Into<String>) -> Self {
        self.components.push(ReplyButton::Action {
            label: label.into(),
            custom_id: custom_id.into(),
        });
        self
    }

    pub fn field_value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_without_empty_sections() {
        let reply = Reply::new(Tone::Info, "t", "d");
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["tone"], "info");
        assert!(json.get("fields").is_none());
        assert!(json.get("components").is_none());
    }

    #[test]
    fn buttons_are_tagged_by_style() {
        let reply = Reply::new(Tone::Success, "t", "d")
            .link("Buy Credits", "https://x.test/credits")
            .action("Transaction History", "transactions");
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["components"][0]["style"], "link");
        assert_eq!(json["components"][1]["custom_id"], "transactions");
    }

    #[test]
    fn errors_are_ephemeral() {
        let reply = Reply::error("nope");
        assert_eq!(reply.tone, Tone::Error);
        assert!(reply.ephemeral);
    }
}
