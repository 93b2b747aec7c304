//! Watches edits for a typed shortcut and hands matches to the driver.

use crate::config::MatchPolicy;
use crate::driver::{ReplaceOutcome, ReplacementDriver};
use crate::models::Snippet;
use crate::surface::EditableSurface;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// What happened to one edit notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    /// A newer edit arrived during the quiet period
    Superseded,
    Busy,
    NotEditable,
    NoMatch,
    Replaced { shortcut: String, text: String },
}

/// The snippet whose shortcut ends `text`, chosen by `policy`
pub fn find_trigger<'a>(text: &str, snippets: &'a [Snippet], policy: MatchPolicy) -> Option<&'a Snippet> {
    let mut matching = snippets
        .iter()
        .filter(|snippet| !snippet.shortcut.is_empty() && text.ends_with(&snippet.shortcut));

    match policy {
        MatchPolicy::FirstInOrder => matching.next(),
        MatchPolicy::LongestSuffix => matching.fold(None, |best: Option<&Snippet>, snippet| match best {
            Some(current) if current.shortcut.len() >= snippet.shortcut.len() => Some(current),
            _ => Some(snippet),
        }),
    }
}

pub struct TriggerDetector {
    driver: Arc<ReplacementDriver>,
    generation: AtomicU64,
}

impl TriggerDetector {
    pub fn new(driver: Arc<ReplacementDriver>) -> Self {
        Self {
            driver,
            generation: AtomicU64::new(0),
        }
    }

    /// Handle one edit to `surface`.
    ///
    /// Waits out the debounce period first; only the latest of a burst of
    /// edits goes on to check for a shortcut.
    pub async fn on_edit(&self, surface: &mut dyn EditableSurface) -> Detection {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let engine = self.driver.engine();
        tokio::time::sleep(engine.config().debounce).await;

        if self.generation.load(Ordering::SeqCst) != generation {
            return Detection::Superseded;
        }
        if self.driver.is_busy() {
            return Detection::Busy;
        }
        if !surface.is_editable() {
            return Detection::NotEditable;
        }

        let text = surface.read_text();
        let snapshot = engine.context().snapshot();
        let Some(snippet) = find_trigger(&text, &snapshot.snippets, engine.config().match_policy) else {
            return Detection::NoMatch;
        };

        debug!(shortcut = %snippet.shortcut, "shortcut typed");
        match self.driver.replace(surface, snippet).await {
            ReplaceOutcome::Replaced { text, .. } => Detection::Replaced {
                shortcut: snippet.shortcut.clone(),
                text,
            },
            ReplaceOutcome::Dropped => Detection::Busy,
        }
    }
}
