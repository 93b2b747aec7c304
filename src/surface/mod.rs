//! Editable surfaces the replacement driver writes into.
//!
//! Three kinds exist: a plain text field, a rich-text region and an embedded
//! document. The driver only sees [`EditableSurface`]; each kind decides how
//! to store text and where the caret ends up.

mod embedded;
pub mod html;
mod plain;
mod rich;

pub use embedded::EmbeddedDocument;
pub use plain::PlainField;
pub use rich::{Caret, RichRegion};

use crate::error::Result;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    PlainField,
    RichRegion,
    EmbeddedDocument,
}

impl fmt::Display for SurfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SurfaceKind::PlainField => "plain field",
            SurfaceKind::RichRegion => "rich region",
            SurfaceKind::EmbeddedDocument => "embedded document",
        };
        write!(f, "{}", name)
    }
}

/// Key presses synthesized by the `enter` and `tab` commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntheticKey {
    Enter,
    Tab,
}

impl SyntheticKey {
    pub fn name(&self) -> &'static str {
        match self {
            SyntheticKey::Enter => "Enter",
            SyntheticKey::Tab => "Tab",
        }
    }

    pub fn key_code(&self) -> u32 {
        match self {
            SyntheticKey::Enter => 13,
            SyntheticKey::Tab => 9,
        }
    }
}

/// Events a surface has been sent, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    KeyDown(SyntheticKey),
    Input,
    Change,
}

/// A text target the driver can read, overwrite and position a caret in.
///
/// Offsets are in characters of the surface's plain text.
pub trait EditableSurface: Send {
    fn kind(&self) -> SurfaceKind;

    /// Whether the user can type here at all
    fn is_editable(&self) -> bool;

    /// Plain text content; empty when the content cannot be reached
    fn read_text(&self) -> String;

    /// Replace the whole content. With `caret`, the selection collapses there;
    /// otherwise it sits at the end of the new text.
    fn write(&mut self, text: &str, caret: Option<usize>) -> Result<()>;

    fn place_caret(&mut self, offset: usize);

    /// Caret units `text` occupies once written here
    fn measure(&self, text: &str) -> usize {
        char_len(text)
    }

    fn dispatch(&mut self, event: SurfaceEvent);
}

/// Character count, the unit every surface offset is measured in
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}
