//! The fixed table of built-in commands usable as placeholders.

use crate::ai::generate_or_marker;
use crate::context::Snapshot;
use crate::error::Result;
use crate::services::Services;
use crate::surface::SyntheticKey;
use crate::template::date::{format_date, format_time};
use std::time::Duration;
use tracing::debug;

const DEFAULT_DATE_FORMAT: &str = "DD/MM/YYYY";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Paste,
    Wait,
    Enter,
    Tab,
    Date,
    Time,
    Uppercase,
    Lowercase,
    Capitalize,
    Cursor,
    Ai,
}

impl Command {
    pub const ALL: [Command; 11] = [
        Command::Paste,
        Command::Wait,
        Command::Enter,
        Command::Tab,
        Command::Date,
        Command::Time,
        Command::Uppercase,
        Command::Lowercase,
        Command::Capitalize,
        Command::Cursor,
        Command::Ai,
    ];

    /// Case-insensitive lookup by name
    pub fn lookup(key: &str) -> Option<Self> {
        let key = key.to_lowercase();
        Self::ALL.into_iter().find(|command| command.name() == key)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Paste => "paste",
            Command::Wait => "wait",
            Command::Enter => "enter",
            Command::Tab => "tab",
            Command::Date => "date",
            Command::Time => "time",
            Command::Uppercase => "uppercase",
            Command::Lowercase => "lowercase",
            Command::Capitalize => "capitalize",
            Command::Cursor => "cursor",
            Command::Ai => "ai",
        }
    }

    /// Output taken from outside the template is never scanned for placeholders
    pub fn output_is_literal(&self) -> bool {
        matches!(self, Command::Paste | Command::Ai)
    }

    /// Produce this command's text. `enter` and `tab` also queue a synthetic
    /// key press in `keys` for the surface being edited.
    pub async fn run(
        self,
        argument: &str,
        services: &Services,
        snapshot: &Snapshot,
        keys: &mut Vec<SyntheticKey>,
    ) -> Result<String> {
        let text = match self {
            Command::Paste => services.clipboard.read_text().await?,
            Command::Wait => {
                let seconds = leading_integer(argument);
                debug!(seconds, "waiting");
                tokio::time::sleep(Duration::from_secs(seconds)).await;
                String::new()
            }
            Command::Enter => {
                keys.push(SyntheticKey::Enter);
                "\n".to_string()
            }
            Command::Tab => {
                keys.push(SyntheticKey::Tab);
                "\t".to_string()
            }
            Command::Date => {
                let format = if argument.is_empty() { DEFAULT_DATE_FORMAT } else { argument };
                format_date(format, &services.clock.now())
            }
            Command::Time => format_time(&services.clock.now()),
            Command::Uppercase => argument.to_uppercase(),
            Command::Lowercase => argument.to_lowercase(),
            Command::Capitalize => capitalize(argument),
            Command::Cursor => "|".to_string(),
            Command::Ai => generate_or_marker(services.ai.as_ref(), &snapshot.ai, argument).await,
        };
        Ok(text)
    }
}

/// Leading decimal digits after optional whitespace; anything else is zero
fn leading_integer(argument: &str) -> u64 {
    let digits: String = argument
        .trim_start()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().unwrap_or(0)
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
