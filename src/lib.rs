//! Quickfill - a text expansion engine.
//!
//! Snippets are templates bound to shortcuts. When a shortcut is typed at the
//! end of an editable surface it is replaced, piece by piece, with the
//! snippet's expansion: commands, custom variables and prompted values.

pub mod ai;
pub mod api;
pub mod cli;
pub mod config;
pub mod context;
pub mod driver;
pub mod error;
pub mod models;
pub mod server;
pub mod services;
pub mod storage;
pub mod surface;
pub mod template;
pub mod transfer;
pub mod trigger;

// Re-export
pub use api::ApiResponse;
pub use config::{get_config_dir, init_logging, EngineConfig, MatchPolicy};
pub use context::{ResolutionContext, Snapshot};
pub use driver::{ReplaceOutcome, ReplacementDriver};
pub use error::{QuickfillError, Result};
pub use models::{AiConfig, AiProvider, Snippet, Variables};
pub use server::{start_api_server, AppState};
pub use services::Services;
pub use storage::{Store, StoreChange};
pub use surface::{EditableSurface, EmbeddedDocument, PlainField, RichRegion};
pub use template::TemplateEngine;
pub use transfer::{ConflictPolicy, ImportReport};
pub use trigger::{Detection, TriggerDetector};
