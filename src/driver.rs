//! Incremental replacement of a typed shortcut with its expanded snippet.
//!
//! The snippet text is split into literal runs and placeholder tokens. Each
//! piece is appended in order and the whole surface text is rewritten after
//! every piece, so slow commands (`wait`, `ai`) show progress as they go.

use crate::models::Snippet;
use crate::surface::{char_len, EditableSurface, SurfaceEvent};
use crate::template::parser::{is_cursor_marker, split_segments, Segment};
use crate::template::TemplateEngine;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplaceOutcome {
    Replaced { text: String, caret: Option<usize> },
    /// Another replacement was already running
    Dropped,
}

pub struct ReplacementDriver {
    engine: Arc<TemplateEngine>,
    in_flight: Mutex<()>,
}

impl ReplacementDriver {
    pub fn new(engine: Arc<TemplateEngine>) -> Self {
        Self {
            engine,
            in_flight: Mutex::new(()),
        }
    }

    pub fn engine(&self) -> &Arc<TemplateEngine> {
        &self.engine
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.try_lock().is_err()
    }

    /// Replace the trailing shortcut in `surface` with the snippet's expansion.
    ///
    /// At most one replacement runs at a time; a request arriving meanwhile is
    /// dropped, not queued.
    pub async fn replace(&self, surface: &mut dyn EditableSurface, snippet: &Snippet) -> ReplaceOutcome {
        let Ok(_guard) = self.in_flight.try_lock() else {
            debug!(shortcut = %snippet.shortcut, "replacement already running, dropping request");
            return ReplaceOutcome::Dropped;
        };

        let original = surface.read_text();
        let keep = char_len(&original).saturating_sub(char_len(&snippet.shortcut));
        let mut current: String = original.chars().take(keep).collect();
        let mut caret = None;

        for segment in split_segments(&snippet.text) {
            match segment {
                Segment::Literal(text) => current.push_str(&text),
                Segment::Placeholder(token) if is_cursor_marker(&token) => {
                    caret = Some(surface.measure(&current));
                    continue;
                }
                Segment::Placeholder(token) => {
                    let mut keys = Vec::new();
                    let value = self.engine.execute_command(&token, &mut keys).await;
                    for key in keys {
                        surface.dispatch(SurfaceEvent::KeyDown(key));
                    }
                    current.push_str(&value);
                }
            }

            if let Err(e) = surface.write(&current, caret) {
                warn!(kind = %surface.kind(), "failed to write to surface: {}", e);
            }
            surface.dispatch(SurfaceEvent::Input);
            surface.dispatch(SurfaceEvent::Change);
        }

        if let Some(offset) = caret {
            surface.place_caret(offset);
        }

        info!(shortcut = %snippet.shortcut, kind = %surface.kind(), "snippet expanded");
        ReplaceOutcome::Replaced {
            text: current,
            caret,
        }
    }
}
