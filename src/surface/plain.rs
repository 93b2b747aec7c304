use super::{char_len, EditableSurface, SurfaceEvent, SurfaceKind};
use crate::error::Result;

/// A single- or multi-line plain text field with a selection range
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlainField {
    value: String,
    selection: (usize, usize),
    read_only: bool,
    events: Vec<SurfaceEvent>,
}

impl PlainField {
    pub fn new() -> Self {
        Self::default()
    }

    /// A field holding `value` with the caret after the last character, as after typing
    pub fn with_value(value: impl Into<String>) -> Self {
        let value = value.into();
        let end = char_len(&value);
        Self {
            value,
            selection: (end, end),
            ..Default::default()
        }
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn selection(&self) -> (usize, usize) {
        self.selection
    }

    pub fn events(&self) -> &[SurfaceEvent] {
        &self.events
    }

    /// The value with `|` inserted at the caret
    pub fn render_with_caret(&self) -> String {
        let caret = self.selection.1;
        let mut rendered = String::with_capacity(self.value.len() + 1);
        for (index, ch) in self.value.chars().enumerate() {
            if index == caret {
                rendered.push('|');
            }
            rendered.push(ch);
        }
        if caret >= char_len(&self.value) {
            rendered.push('|');
        }
        rendered
    }
}

impl EditableSurface for PlainField {
    fn kind(&self) -> SurfaceKind {
        SurfaceKind::PlainField
    }

    fn is_editable(&self) -> bool {
        !self.read_only
    }

    fn read_text(&self) -> String {
        self.value.clone()
    }

    fn write(&mut self, text: &str, caret: Option<usize>) -> Result<()> {
        self.value = text.to_string();
        let offset = caret.unwrap_or_else(|| char_len(&self.value));
        self.place_caret(offset);
        Ok(())
    }

    fn place_caret(&mut self, offset: usize) {
        let offset = offset.min(char_len(&self.value));
        self.selection = (offset, offset);
    }

    fn dispatch(&mut self, event: SurfaceEvent) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_without_caret_selects_the_end() {
        let mut field = PlainField::with_value("abc");
        field.write("héllo", None).unwrap();
        assert_eq!(field.selection(), (5, 5));
    }

    #[test]
    fn caret_is_clamped_to_the_value() {
        let mut field = PlainField::new();
        field.write("ab", Some(9)).unwrap();
        assert_eq!(field.selection(), (2, 2));
        field.place_caret(1);
        assert_eq!(field.render_with_caret(), "a|b");
    }

    #[test]
    fn read_only_fields_are_not_editable() {
        assert!(PlainField::new().is_editable());
        assert!(!PlainField::new().read_only().is_editable());
    }
}
