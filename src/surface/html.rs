//! Just enough markup handling for rich regions: a forgiving fragment parser,
//! a serializer and text-content extraction. Attributes are dropped.

const VOID_TAGS: &[&str] = &["br", "hr", "img", "input", "wbr"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Text(String),
    Element { tag: String, children: Vec<Node> },
}

impl Node {
    pub fn element(tag: &str, children: Vec<Node>) -> Self {
        Node::Element {
            tag: tag.to_string(),
            children,
        }
    }
}

type Frame = (String, Vec<Node>);

/// Parse a markup fragment. Unknown or unbalanced tags never fail: stray
/// closing tags are ignored and open elements close at the end of input.
pub fn parse_fragment(markup: &str) -> Vec<Node> {
    let mut stack: Vec<Frame> = vec![(String::new(), Vec::new())];
    let mut rest = markup;

    while !rest.is_empty() {
        match find_tag(rest) {
            Some((start, end)) => {
                push_text(&mut stack, &rest[..start]);
                handle_tag(&mut stack, &rest[start + 1..end]);
                rest = &rest[end + 1..];
            }
            None => {
                push_text(&mut stack, rest);
                break;
            }
        }
    }

    while stack.len() > 1 {
        close_top(&mut stack);
    }
    stack.pop().map(|(_, children)| children).unwrap_or_default()
}

/// Byte range of the next `<...>` tag: the `<` index and the `>` index
fn find_tag(text: &str) -> Option<(usize, usize)> {
    let mut search = 0;
    while let Some(found) = text[search..].find('<') {
        let start = search + found;
        let after = &text[start + 1..];
        let opens_tag = after.starts_with('/')
            || after.chars().next().map_or(false, |c| c.is_ascii_alphabetic());
        if opens_tag {
            return after.find('>').map(|len| (start, start + 1 + len));
        }
        search = start + 1;
    }
    None
}

fn handle_tag(stack: &mut Vec<Frame>, inner: &str) {
    if let Some(name) = inner.strip_prefix('/') {
        let name = name.trim().to_ascii_lowercase();
        if let Some(depth) = stack.iter().rposition(|(tag, _)| *tag == name) {
            if depth > 0 {
                while stack.len() > depth {
                    close_top(stack);
                }
            }
        }
        return;
    }

    let self_closing = inner.ends_with('/');
    let name = inner
        .trim_end_matches('/')
        .split(char::is_whitespace)
        .next()
        .unwrap_or("")
        .to_ascii_lowercase();
    if name.is_empty() {
        return;
    }

    if self_closing || VOID_TAGS.contains(&name.as_str()) {
        if let Some((_, children)) = stack.last_mut() {
            children.push(Node::Element {
                tag: name,
                children: Vec::new(),
            });
        }
    } else {
        stack.push((name, Vec::new()));
    }
}

fn close_top(stack: &mut Vec<Frame>) {
    if let Some((tag, children)) = stack.pop() {
        if let Some((_, parent)) = stack.last_mut() {
            parent.push(Node::Element { tag, children });
        }
    }
}

fn push_text(stack: &mut [Frame], raw: &str) {
    if raw.is_empty() {
        return;
    }
    let text = decode_entities(raw);
    if let Some((_, children)) = stack.last_mut() {
        // Adjacent text merges into one node
        if let Some(Node::Text(previous)) = children.last_mut() {
            previous.push_str(&text);
        } else {
            children.push(Node::Text(text));
        }
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", "\u{a0}")
        .replace("&amp;", "&")
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn to_html(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(&escape_text(text)),
            Node::Element { tag, children } => {
                out.push('<');
                out.push_str(tag);
                out.push('>');
                if !VOID_TAGS.contains(&tag.as_str()) {
                    out.push_str(&to_html(children));
                    out.push_str("</");
                    out.push_str(tag);
                    out.push('>');
                }
            }
        }
    }
    out
}

/// Concatenated text of every text node, in document order
pub fn text_content(nodes: &[Node]) -> String {
    text_nodes(nodes).concat()
}

/// Text nodes in document order
pub fn text_nodes(nodes: &[Node]) -> Vec<&str> {
    let mut found = Vec::new();
    collect_text(nodes, &mut found);
    found
}

fn collect_text<'a>(nodes: &'a [Node], found: &mut Vec<&'a str>) {
    for node in nodes {
        match node {
            Node::Text(text) => found.push(text),
            Node::Element { children, .. } => collect_text(children, found),
        }
    }
}
