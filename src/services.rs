//! Seams for the outside world: clipboard, interactive prompts, wall clock and AI.

use crate::ai::{AiClient, HttpAiClient};
use crate::error::{QuickfillError, Result};
use arboard::Clipboard;
use async_trait::async_trait;
use chrono::{DateTime, Local};
use std::io::{self, BufRead, Write};
use std::sync::Arc;

#[async_trait]
pub trait ClipboardSource: Send + Sync {
    async fn read_text(&self) -> Result<String>;
}

/// Asks the user for a value. `None` means the prompt was cancelled.
#[async_trait]
pub trait Prompter: Send + Sync {
    async fn prompt(&self, label: &str) -> Option<String>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// Get the current clipboard content as text
pub fn get_clipboard_text() -> Result<String> {
    let mut clipboard = Clipboard::new().map_err(|e| QuickfillError::Clipboard(e.to_string()))?;
    clipboard
        .get_text()
        .map_err(|e| QuickfillError::Clipboard(e.to_string()))
}

/// The system clipboard, read off the async runtime
pub struct SystemClipboard;

#[async_trait]
impl ClipboardSource for SystemClipboard {
    async fn read_text(&self) -> Result<String> {
        tokio::task::spawn_blocking(get_clipboard_text)
            .await
            .map_err(|e| QuickfillError::Clipboard(e.to_string()))?
    }
}

/// Never answers; every prompt counts as cancelled
pub struct NoPrompt;

#[async_trait]
impl Prompter for NoPrompt {
    async fn prompt(&self, _label: &str) -> Option<String> {
        None
    }
}

/// Prompts on stderr and reads one line from stdin. An empty line cancels.
pub struct StdinPrompter;

#[async_trait]
impl Prompter for StdinPrompter {
    async fn prompt(&self, label: &str) -> Option<String> {
        let label = label.to_string();
        let answer = tokio::task::spawn_blocking(move || -> io::Result<String> {
            let mut stderr = io::stderr();
            write!(stderr, "{}: ", label)?;
            stderr.flush()?;
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            Ok(line.trim_end_matches(['\r', '\n']).to_string())
        })
        .await;

        match answer {
            Ok(Ok(value)) if !value.is_empty() => Some(value),
            _ => None,
        }
    }
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock stuck at one instant
pub struct FixedClock(pub DateTime<Local>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}

/// Everything the resolver may reach outside the process for
#[derive(Clone)]
pub struct Services {
    pub clipboard: Arc<dyn ClipboardSource>,
    pub prompter: Arc<dyn Prompter>,
    pub ai: Arc<dyn AiClient>,
    pub clock: Arc<dyn Clock>,
}

impl Services {
    /// Real clipboard, clock and AI providers; prompts are cancelled
    pub fn system() -> Self {
        Self {
            clipboard: Arc::new(SystemClipboard),
            prompter: Arc::new(NoPrompt),
            ai: Arc::new(HttpAiClient::new()),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clipboard(mut self, clipboard: impl ClipboardSource + 'static) -> Self {
        self.clipboard = Arc::new(clipboard);
        self
    }

    pub fn with_prompter(mut self, prompter: impl Prompter + 'static) -> Self {
        self.prompter = Arc::new(prompter);
        self
    }

    pub fn with_ai(mut self, ai: impl AiClient + 'static) -> Self {
        self.ai = Arc::new(ai);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }
}
