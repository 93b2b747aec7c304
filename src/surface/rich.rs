use super::html::{parse_fragment, text_content, text_nodes, to_html, Node};
use super::{char_len, EditableSurface, SurfaceEvent, SurfaceKind};
use crate::error::Result;

/// A collapsed selection inside the `node`-th text node (document order)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caret {
    pub node: usize,
    pub offset: usize,
}

/// A rich-text editing region holding a small node tree.
///
/// Written text is inserted as markup. Caret offsets count characters of the
/// region's text content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RichRegion {
    children: Vec<Node>,
    content_editable: bool,
    design_mode: bool,
    caret: Option<Caret>,
    events: Vec<SurfaceEvent>,
}

impl RichRegion {
    pub fn content_editable() -> Self {
        Self {
            content_editable: true,
            ..Default::default()
        }
    }

    /// A region editable because its whole document is in design mode
    pub fn design_mode() -> Self {
        Self {
            design_mode: true,
            ..Default::default()
        }
    }

    /// A region the user cannot type into
    pub fn static_region() -> Self {
        Self::default()
    }

    /// Load initial markup; the caret goes to the end as after typing
    pub fn with_html(mut self, markup: &str) -> Self {
        self.children = parse_fragment(markup);
        self.caret = self.locate(char_len(&self.read_text()));
        self
    }

    pub fn html(&self) -> String {
        to_html(&self.children)
    }

    pub fn caret(&self) -> Option<Caret> {
        self.caret
    }

    /// The caret as an offset into the text content
    pub fn caret_offset(&self) -> Option<usize> {
        let caret = self.caret?;
        let before: usize = text_nodes(&self.children)
            .iter()
            .take(caret.node)
            .map(|text| char_len(text))
            .sum();
        Some(before + caret.offset)
    }

    pub fn events(&self) -> &[SurfaceEvent] {
        &self.events
    }

    /// Map a text offset to a caret: the first text node whose end reaches it
    pub fn locate(&self, offset: usize) -> Option<Caret> {
        let mut position = 0;
        for (node, text) in text_nodes(&self.children).iter().enumerate() {
            let len = char_len(text);
            if position + len >= offset {
                return Some(Caret {
                    node,
                    offset: offset - position,
                });
            }
            position += len;
        }
        None
    }
}

impl EditableSurface for RichRegion {
    fn kind(&self) -> SurfaceKind {
        SurfaceKind::RichRegion
    }

    fn is_editable(&self) -> bool {
        self.content_editable || self.design_mode
    }

    fn read_text(&self) -> String {
        text_content(&self.children)
    }

    fn write(&mut self, text: &str, caret: Option<usize>) -> Result<()> {
        self.children = parse_fragment(text);
        let end = char_len(&self.read_text());
        self.caret = self.locate(end);
        if let Some(offset) = caret {
            self.place_caret(offset);
        }
        Ok(())
    }

    fn place_caret(&mut self, offset: usize) {
        // Past the last text node the selection stays where it was
        if let Some(caret) = self.locate(offset) {
            self.caret = Some(caret);
        }
    }

    fn measure(&self, text: &str) -> usize {
        char_len(&text_content(&parse_fragment(text)))
    }

    fn dispatch(&mut self, event: SurfaceEvent) {
        self.events.push(event);
    }
}
