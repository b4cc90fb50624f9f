//! Document Tree
//!
//! A small owned element tree and a tolerant HTML parser that builds it.
//! Good enough to locate content containers and read rendered text; it makes
//! no attempt at full HTML5 tree construction.

/// Elements whose contents never render as text.
const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Elements that start on a new line when rendered.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hr", "li", "main", "nav", "ol", "p", "pre", "section", "table", "tr", "td", "th", "ul",
];

/// Elements that never have children.
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Elements whose body is raw text up to the matching end tag.
const RAW_TEXT_TAGS: &[&str] = &["script", "style", "textarea", "title"];

/// Tag name of the synthetic root returned by [`parse_html`].
pub const DOCUMENT_TAG: &str = "#document";

/// Deepest nesting the parser builds. Start tags past this depth are
/// attached flat to the deepest open element.
pub const MAX_DEPTH: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    attrs: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs
            .push((name.into().to_ascii_lowercase(), value.into()));
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn push(&mut self, node: Node) {
        self.children.push(node);
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|c| c.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// All descendant elements in document order, excluding `self`.
    pub fn descendants(&self) -> Vec<&Element> {
        let mut out = Vec::new();
        self.collect_descendants(&mut out);
        out
    }

    fn collect_descendants<'a>(&'a self, out: &mut Vec<&'a Element>) {
        for child in self.child_elements() {
            out.push(child);
            child.collect_descendants(out);
        }
    }

    /// Raw concatenation of every text node below this element.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(t) => out.push_str(t),
                Node::Element(e) => e.collect_text(out),
            }
        }
    }

    /// Text as a reader would see it: hidden subtrees skipped, block
    /// boundaries turned into line breaks. Whitespace is left as-is.
    pub fn inner_text(&self) -> String {
        let mut out = String::new();
        self.collect_rendered(&mut out);
        out
    }

    fn collect_rendered(&self, out: &mut String) {
        if HIDDEN_TAGS.contains(&self.tag.as_str()) {
            return;
        }
        if self.tag == "br" {
            out.push('\n');
            return;
        }
        let block = BLOCK_TAGS.contains(&self.tag.as_str());
        if block {
            out.push('\n');
        }
        for child in &self.children {
            match child {
                Node::Text(t) => out.push_str(t),
                Node::Element(e) => e.collect_rendered(out),
            }
        }
        if block {
            out.push('\n');
        }
    }

    /// Remove every descendant matching `pred`. Returns how many subtrees went.
    pub fn remove_descendants(&mut self, pred: &dyn Fn(&Element) -> bool) -> usize {
        let before = self.children.len();
        self.children.retain(|n| match n {
            Node::Element(e) => !pred(e),
            Node::Text(_) => true,
        });
        let mut removed = before - self.children.len();
        for child in self.children.iter_mut() {
            if let Node::Element(e) = child {
                removed += e.remove_descendants(pred);
            }
        }
        removed
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

struct TreeBuilder {
    stack: Vec<Element>,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            stack: vec![Element::new(DOCUMENT_TAG)],
        }
    }

    fn current_tag(&self) -> &str {
        self.stack.last().map(|e| e.tag()).unwrap_or(DOCUMENT_TAG)
    }

    fn append(&mut self, node: Node) {
        if let Some(top) = self.stack.last_mut() {
            top.push(node);
        }
    }

    fn text(&mut self, text: String) {
        if !text.is_empty() {
            self.append(Node::Text(text));
        }
    }

    fn open(&mut self, element: Element) {
        if self.stack.len() > MAX_DEPTH {
            self.append(Node::Element(element));
        } else {
            self.stack.push(element);
        }
    }

    fn close_top(&mut self) {
        if self.stack.len() > 1 {
            if let Some(element) = self.stack.pop() {
                self.append(Node::Element(element));
            }
        }
    }

    /// Close the innermost open `tag`; stray end tags are ignored.
    fn close(&mut self, tag: &str) {
        if let Some(pos) = self.stack.iter().rposition(|e| e.tag == tag) {
            if pos == 0 {
                return;
            }
            while self.stack.len() > pos {
                self.close_top();
            }
        }
    }

    fn finish(mut self) -> Element {
        while self.stack.len() > 1 {
            self.close_top();
        }
        self.stack
            .pop()
            .unwrap_or_else(|| Element::new(DOCUMENT_TAG))
    }
}

struct StartTag {
    name: String,
    attrs: Vec<(String, String)>,
    self_closing: bool,
}

/// Parse an HTML string into a tree rooted at a synthetic `#document` element.
pub fn parse_html(html: &str) -> Element {
    let mut builder = TreeBuilder::new();
    let mut pos = 0;

    while pos < html.len() {
        let Some(rel) = html[pos..].find('<') else {
            builder.text(decode_entities(&html[pos..]));
            break;
        };
        let lt = pos + rel;
        if lt > pos {
            builder.text(decode_entities(&html[pos..lt]));
        }
        let rest = &html[lt..];

        if rest.starts_with("<!--") {
            pos = rest.find("-->").map(|e| lt + e + 3).unwrap_or(html.len());
            continue;
        }
        if rest.starts_with("<!") || rest.starts_with("<?") {
            pos = rest.find('>').map(|e| lt + e + 1).unwrap_or(html.len());
            continue;
        }
        if let Some(after) = rest.strip_prefix("</") {
            let end = after.find('>').unwrap_or(after.len());
            let name = after[..end].trim().to_ascii_lowercase();
            builder.close(&name);
            pos = (lt + 2 + end + 1).min(html.len());
            continue;
        }
        if !rest[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
            builder.text("<".to_string());
            pos = lt + 1;
            continue;
        }

        let Some((tag, consumed)) = parse_start_tag(rest) else {
            // Unterminated tag at end of input.
            break;
        };
        pos = lt + consumed;

        let mut element = Element::new(tag.name.clone());
        element.attrs = tag.attrs;

        if RAW_TEXT_TAGS.contains(&tag.name.as_str()) {
            let end = find_end_tag(&html[pos..], &tag.name).unwrap_or(html.len() - pos);
            let raw = &html[pos..pos + end];
            let body = if tag.name == "script" || tag.name == "style" {
                raw.to_string()
            } else {
                decode_entities(raw)
            };
            if !body.is_empty() {
                element.push(Node::Text(body));
            }
            builder.append(Node::Element(element));
            let after_close = html[pos + end..]
                .find('>')
                .map(|e| pos + end + e + 1)
                .unwrap_or(html.len());
            pos = after_close;
            continue;
        }

        if VOID_TAGS.contains(&tag.name.as_str()) || tag.self_closing {
            builder.append(Node::Element(element));
            continue;
        }

        let current = builder.current_tag();
        if (current == "p" && BLOCK_TAGS.contains(&tag.name.as_str()))
            || (current == "li" && tag.name == "li")
        {
            builder.close_top();
        }
        builder.open(element);
    }

    builder.finish()
}

/// Byte offset of the first `</name` in `haystack`, matching the name
/// case-insensitively.
fn find_end_tag(haystack: &str, name: &str) -> Option<usize> {
    let bytes = haystack.as_bytes();
    let name = name.as_bytes();
    let mut from = 0;
    while let Some(rel) = haystack[from..].find("</") {
        let at = from + rel;
        let start = at + 2;
        if let Some(candidate) = bytes.get(start..start + name.len()) {
            if candidate.eq_ignore_ascii_case(name) {
                return Some(at);
            }
        }
        from = start;
    }
    None
}

fn parse_start_tag(input: &str) -> Option<(StartTag, usize)> {
    let mut chars = input.char_indices().skip(1).peekable();

    let mut name = String::new();
    while let Some(&(_, c)) = chars.peek() {
        if c.is_whitespace() || c == '>' || c == '/' {
            break;
        }
        name.push(c.to_ascii_lowercase());
        chars.next();
    }

    let mut attrs = Vec::new();
    let mut self_closing = false;
    loop {
        while matches!(chars.peek(), Some(&(_, c)) if c.is_whitespace()) {
            chars.next();
        }
        let (i, c) = chars.next()?;
        match c {
            '>' => {
                return Some((
                    StartTag {
                        name,
                        attrs,
                        self_closing,
                    },
                    i + 1,
                ))
            }
            '/' => self_closing = true,
            _ => {
                self_closing = false;
                let mut attr_name = String::new();
                attr_name.push(c.to_ascii_lowercase());
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_whitespace() || c == '=' || c == '>' || c == '/' {
                        break;
                    }
                    attr_name.push(c.to_ascii_lowercase());
                    chars.next();
                }
                while matches!(chars.peek(), Some(&(_, c)) if c.is_whitespace()) {
                    chars.next();
                }
                let mut value = String::new();
                if matches!(chars.peek(), Some(&(_, '='))) {
                    chars.next();
                    while matches!(chars.peek(), Some(&(_, c)) if c.is_whitespace()) {
                        chars.next();
                    }
                    match chars.peek() {
                        Some(&(_, q)) if q == '"' || q == '\'' => {
                            chars.next();
                            loop {
                                let (_, c) = chars.next()?;
                                if c == q {
                                    break;
                                }
                                value.push(c);
                            }
                        }
                        _ => {
                            while let Some(&(_, c)) = chars.peek() {
                                if c.is_whitespace() || c == '>' {
                                    break;
                                }
                                value.push(c);
                                chars.next();
                            }
                        }
                    }
                }
                attrs.push((attr_name, decode_entities(&value)));
            }
        }
    }
}

/// Decode the handful of character references that show up in real pages.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        if let Some(semi) = tail.find(';').filter(|&s| s <= 10) {
            if let Some(decoded) = decode_entity(&tail[1..semi]) {
                out.push(decoded);
                rest = &tail[semi + 1..];
                continue;
            }
        }
        out.push('&');
        rest = &tail[1..];
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let num = entity.strip_prefix('#')?;
            let code = match num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}
