//! Element Queries
//!
//! CSS-style lookups over the [`Element`] tree. Supports comma-separated lists
//! of compound selectors built from a tag, `#id`, `.class`, `[attr]` and
//! `[attr="value"]`. Combinators are rejected.

use std::iter::Peekable;
use std::str::Chars;

use thiserror::Error;

use crate::dom::Element;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,
    #[error("unsupported selector syntax in '{0}'")]
    Unsupported(String),
    #[error("unterminated attribute selector in '{0}'")]
    Unterminated(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrSelector {
    name: String,
    value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct CompoundSelector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrSelector>,
}

impl CompoundSelector {
    fn parse(src: &str) -> Result<Self, SelectorError> {
        let src = src.trim();
        if src.is_empty() {
            return Err(SelectorError::Empty);
        }
        let mut sel = CompoundSelector::default();
        let mut chars = src.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '#' => sel.id = Some(take_ident(&mut chars, src)?),
                '.' => sel.classes.push(take_ident(&mut chars, src)?),
                '[' => sel.attrs.push(take_attr(&mut chars, src)?),
                '*' if sel.tag.is_none() => {}
                c if is_ident_char(c) && sel.tag.is_none() => {
                    let mut tag = c.to_string();
                    tag.push_str(&take_ident(&mut chars, src).unwrap_or_default());
                    sel.tag = Some(tag.to_ascii_lowercase());
                }
                _ => return Err(SelectorError::Unsupported(src.to_string())),
            }
        }
        Ok(sel)
    }

    fn matches(&self, element: &Element) -> bool {
        if let Some(tag) = &self.tag {
            if element.tag() != tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if element.id() != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| element.has_class(c)) {
            return false;
        }
        self.attrs.iter().all(|a| match (element.attr(&a.name), &a.value) {
            (Some(actual), Some(expected)) => actual == expected,
            (Some(_), None) => true,
            (None, _) => false,
        })
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn take_ident(chars: &mut Peekable<Chars<'_>>, src: &str) -> Result<String, SelectorError> {
    let mut ident = String::new();
    while let Some(&c) = chars.peek() {
        if !is_ident_char(c) {
            break;
        }
        ident.push(c);
        chars.next();
    }
    if ident.is_empty() {
        return Err(SelectorError::Unsupported(src.to_string()));
    }
    Ok(ident)
}

fn take_attr(chars: &mut Peekable<Chars<'_>>, src: &str) -> Result<AttrSelector, SelectorError> {
    let mut inner = String::new();
    let mut quote: Option<char> = None;
    loop {
        match chars.next() {
            Some(']') if quote.is_none() => break,
            Some(c) if c == '"' || c == '\'' => {
                match quote {
                    Some(q) if q == c => quote = None,
                    None => quote = Some(c),
                    Some(_) => {}
                }
                inner.push(c);
            }
            Some(c) => inner.push(c),
            None => return Err(SelectorError::Unterminated(src.to_string())),
        }
    }
    let (name, value) = match inner.split_once('=') {
        Some((n, v)) => {
            let v = v.trim();
            let v = v
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| v.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(v);
            (n.trim(), Some(v.to_string()))
        }
        None => (inner.trim(), None),
    };
    if name.is_empty() {
        return Err(SelectorError::Unsupported(src.to_string()));
    }
    Ok(AttrSelector {
        name: name.to_ascii_lowercase(),
        value,
    })
}

/// A parsed, comma-separated selector list. An element matches when any
/// member matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    source: String,
    members: Vec<CompoundSelector>,
}

impl SelectorList {
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let members = input
            .split(',')
            .map(CompoundSelector::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            source: input.trim().to_string(),
            members,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, element: &Element) -> bool {
        self.members.iter().any(|m| m.matches(element))
    }
}

impl Element {
    /// First descendant (document order) matching `selector`.
    pub fn query_selector(&self, selector: &SelectorList) -> Option<&Element> {
        self.descendants().into_iter().find(|e| selector.matches(e))
    }

    pub fn query_selector_all(&self, selector: &SelectorList) -> Vec<&Element> {
        self.descendants()
            .into_iter()
            .filter(|e| selector.matches(e))
            .collect()
    }

    /// Drop every descendant subtree matching `selector`.
    pub fn remove_matching(&mut self, selector: &SelectorList) -> usize {
        self.remove_descendants(&|e| selector.matches(e))
    }
}
