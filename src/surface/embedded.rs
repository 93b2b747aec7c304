use super::{char_len, EditableSurface, RichRegion, SurfaceEvent, SurfaceKind};
use crate::error::Result;
use tracing::debug;

/// A nested document (an iframe). Its body is only reachable when it shares
/// our origin; across origins every read is empty and every write does nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbeddedDocument {
    body: Option<RichRegion>,
    events: Vec<SurfaceEvent>,
}

impl EmbeddedDocument {
    pub fn same_origin(body: RichRegion) -> Self {
        Self {
            body: Some(body),
            events: Vec::new(),
        }
    }

    pub fn cross_origin() -> Self {
        Self::default()
    }

    pub fn body(&self) -> Option<&RichRegion> {
        self.body.as_ref()
    }

    pub fn events(&self) -> &[SurfaceEvent] {
        &self.events
    }
}

impl EditableSurface for EmbeddedDocument {
    fn kind(&self) -> SurfaceKind {
        SurfaceKind::EmbeddedDocument
    }

    fn is_editable(&self) -> bool {
        self.body.as_ref().map_or(false, |body| body.is_editable())
    }

    fn read_text(&self) -> String {
        self.body
            .as_ref()
            .map(|body| body.read_text())
            .unwrap_or_default()
    }

    fn write(&mut self, text: &str, caret: Option<usize>) -> Result<()> {
        match self.body.as_mut() {
            Some(body) => body.write(text, caret),
            None => {
                debug!("embedded document is cross-origin, write skipped");
                Ok(())
            }
        }
    }

    fn place_caret(&mut self, offset: usize) {
        if let Some(body) = self.body.as_mut() {
            body.place_caret(offset);
        }
    }

    fn measure(&self, text: &str) -> usize {
        match self.body.as_ref() {
            Some(body) => body.measure(text),
            None => char_len(text),
        }
    }

    fn dispatch(&mut self, event: SurfaceEvent) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cross_origin_documents_are_inert() {
        let mut doc = EmbeddedDocument::cross_origin();
        assert!(!doc.is_editable());
        assert_eq!(doc.read_text(), "");
        doc.write("anything", Some(1)).unwrap();
        assert_eq!(doc.read_text(), "");
        assert!(doc.body().is_none());
    }

    #[test]
    fn same_origin_documents_delegate_to_the_body() {
        let mut doc = EmbeddedDocument::same_origin(RichRegion::design_mode());
        assert!(doc.is_editable());
        doc.write("hello", Some(2)).unwrap();
        assert_eq!(doc.read_text(), "hello");
        assert_eq!(doc.body().and_then(|b| b.caret_offset()), Some(2));
    }
}
