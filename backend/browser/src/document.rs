//! Host document: the page the user is reading, as seen by the extractor.

use studybuddy_core::StudyError;
use tracing::debug;
use url::Url;

use crate::dom::{parse_html, Element};
use crate::element_query::SelectorList;

/// An embedded frame and, when it has been loaded, its body.
#[derive(Debug, Clone)]
pub struct Frame {
    src: Option<String>,
    content: Option<Element>,
}

impl Frame {
    pub fn src(&self) -> Option<&str> {
        self.src.as_deref()
    }
}

/// Outcome of reading a frame's content.
#[derive(Debug, PartialEq, Eq)]
pub enum FrameAccess<'a> {
    Ok(&'a Element),
    /// The frame lives on another origin; its content is off limits.
    CrossOrigin,
    NotLoaded,
}

#[derive(Debug, Clone)]
pub struct PageDocument {
    locator: String,
    title: String,
    root: Element,
    frames: Vec<Frame>,
    selection: String,
}

impl PageDocument {
    /// Build a document from an already-constructed tree.
    pub fn new(locator: impl Into<String>, title: impl Into<String>, root: Element) -> Self {
        let frames = collect_frames(&root);
        Self {
            locator: locator.into(),
            title: title.into(),
            root,
            frames,
            selection: String::new(),
        }
    }

    /// Parse raw HTML. The title comes from the first `<title>` element.
    pub fn parse(locator: impl Into<String>, html: &str) -> Self {
        let root = parse_html(html);
        let title = root
            .descendants()
            .into_iter()
            .find(|e| e.tag() == "title")
            .map(|t| t.text_content().trim().to_string())
            .unwrap_or_default();
        Self::new(locator, title, root)
    }

    pub fn with_selection(mut self, selection: impl Into<String>) -> Self {
        self.selection = selection.into();
        self
    }

    /// Load `html` as the content of the `index`-th frame. Returns false when
    /// there is no such frame.
    pub fn attach_frame(&mut self, index: usize, html: &str) -> bool {
        match self.frames.get_mut(index) {
            Some(frame) => {
                let root = parse_html(html);
                frame.content = Some(body_of(&root).clone());
                true
            }
            None => false,
        }
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    /// The `<body>` element, or the whole tree for body-less fragments.
    pub fn body(&self) -> &Element {
        body_of(&self.root)
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn selection_text(&self) -> &str {
        &self.selection
    }

    pub fn query_selector(&self, selector: &SelectorList) -> Option<&Element> {
        self.root.query_selector(selector)
    }

    pub fn query_selector_all(&self, selector: &SelectorList) -> Vec<&Element> {
        self.root.query_selector_all(selector)
    }

    /// Read a frame, honouring the same-origin boundary.
    pub fn frame_access<'a>(&self, frame: &'a Frame) -> FrameAccess<'a> {
        if !self.same_origin(frame.src()) {
            debug!(src = ?frame.src(), "Frame is cross-origin");
            return FrameAccess::CrossOrigin;
        }
        match &frame.content {
            Some(body) => FrameAccess::Ok(body),
            None => FrameAccess::NotLoaded,
        }
    }

    fn same_origin(&self, src: Option<&str>) -> bool {
        let src = match src.map(str::trim) {
            None | Some("") | Some("about:blank") => return true,
            Some(s) => s,
        };
        let Ok(base) = Url::parse(&self.locator) else {
            return false;
        };
        match base.join(src) {
            Ok(target) => target.origin() == base.origin(),
            Err(_) => false,
        }
    }

    /// Programmatic select-all over the body, returning the selection text.
    pub fn select_all(&self) -> Result<String, StudyError> {
        let body = self.body();
        if body.children().is_empty() {
            return Err(StudyError::Dom("document has no renderable body".into()));
        }
        Ok(body.inner_text())
    }

    /// Last path segment of the document address, if it has one.
    pub fn filename(&self) -> Option<String> {
        let path = match Url::parse(&self.locator) {
            Ok(url) => url.path().to_string(),
            Err(_) => self
                .locator
                .split(['?', '#'])
                .next()
                .unwrap_or_default()
                .to_string(),
        };
        path.rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .map(String::from)
    }
}

fn body_of(root: &Element) -> &Element {
    if root.tag() == "body" {
        return root;
    }
    root.descendants()
        .into_iter()
        .find(|e| e.tag() == "body")
        .unwrap_or(root)
}

fn collect_frames(root: &Element) -> Vec<Frame> {
    root.descendants()
        .into_iter()
        .filter(|e| e.tag() == "iframe")
        .map(|e| Frame {
            src: e.attr("src").map(String::from),
            content: e.attr("srcdoc").map(|doc| body_of(&parse_html(doc)).clone()),
        })
        .collect()
}
