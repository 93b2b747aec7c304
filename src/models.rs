use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::QuickfillError;

/// Custom variables, keyed by brace-stripped name.
pub type Variables = BTreeMap<String, String>;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Snippet {
    #[serde(default)]
    pub id: String,
    pub shortcut: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Snippet {
    pub fn new(shortcut: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            shortcut: shortcut.into(),
            text: text.into(),
            category: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Short single-line preview of the template, as shown in listings
    pub fn preview(&self, max_chars: usize) -> String {
        let flat = self.text.replace('\n', " ");
        if flat.chars().count() > max_chars {
            let cut: String = flat.chars().take(max_chars).collect();
            format!("{}...", cut)
        } else {
            flat
        }
    }
}

/// Generate an opaque snippet id
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Strip the braces users sometimes type around variable names (`{name}` -> `name`)
pub fn clean_variable_name(name: &str) -> String {
    name.chars().filter(|c| *c != '{' && *c != '}').collect()
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    OpenAi,
    Claude,
    Deepseek,
}

impl AiProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            AiProvider::OpenAi => "openai",
            AiProvider::Claude => "claude",
            AiProvider::Deepseek => "deepseek",
        }
    }
}

impl fmt::Display for AiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AiProvider {
    type Err = QuickfillError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(AiProvider::OpenAi),
            "claude" => Ok(AiProvider::Claude),
            "deepseek" => Ok(AiProvider::Deepseek),
            other => Err(QuickfillError::InvalidConfig(format!(
                "unknown AI provider '{}'",
                other
            ))),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AiConfig {
    #[serde(default)]
    pub selected_provider: Option<AiProvider>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claude_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deepseek_api_key: Option<String>,
}

impl AiConfig {
    pub fn api_key(&self, provider: AiProvider) -> Option<&str> {
        let key = match provider {
            AiProvider::OpenAi => self.openai_api_key.as_deref(),
            AiProvider::Claude => self.claude_api_key.as_deref(),
            AiProvider::Deepseek => self.deepseek_api_key.as_deref(),
        };
        key.filter(|k| !k.trim().is_empty())
    }

    pub fn set_api_key(&mut self, provider: AiProvider, key: Option<String>) {
        let slot = match provider {
            AiProvider::OpenAi => &mut self.openai_api_key,
            AiProvider::Claude => &mut self.claude_api_key,
            AiProvider::Deepseek => &mut self.deepseek_api_key,
        };
        *slot = key;
    }

    /// The selected provider together with its key, if both are set
    pub fn active(&self) -> Option<(AiProvider, &str)> {
        let provider = self.selected_provider?;
        self.api_key(provider).map(|key| (provider, key))
    }
}

/// The whole persisted document
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StoreData {
    #[serde(default)]
    pub snippets: Vec<Snippet>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub custom_variables: Variables,
    #[serde(flatten)]
    pub ai: AiConfig,
}
