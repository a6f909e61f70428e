//! A small namespace-aware XML element tree.
//!
//! Lookup messages are opaque documents as far as the resolver is concerned;
//! it only ever needs to find children by qualified name, read attributes and
//! text, and prune children. Parsing goes through `quick-xml`'s namespace
//! resolving reader so every element carries its namespace URI.

use crate::error::{LookupError, Result};
use crate::types::namespace::Namespace;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace as XmlNamespace, ResolveResult};
use quick_xml::reader::NsReader;
use std::fmt;
use std::str::FromStr;

/// Deepest element nesting [`Element::parse`] accepts
pub const MAX_DEPTH: usize = 256;

/// A child node of an [`Element`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Nested element
    Element(Element),
    /// Character data
    Text(String),
}

/// An XML element with a namespace-qualified name
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    name: String,
    namespace: Option<String>,
    prefix: Option<String>,
    attributes: Vec<(String, String)>,
    declarations: Vec<(Option<String>, String)>,
    children: Vec<Node>,
}

impl Element {
    /// Create an element with no namespace
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Create an element in the given namespace
    #[must_use]
    pub fn in_ns(name: impl Into<String>, ns: Namespace) -> Self {
        Self {
            name: name.into(),
            namespace: Some(ns.uri.to_string()),
            prefix: Some(ns.prefix.to_string()),
            ..Self::default()
        }
    }

    /// Local name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace URI, if any
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Returns true if this element has the given local name and namespace
    #[must_use]
    pub fn is(&self, name: &str, ns: Namespace) -> bool {
        self.name == name && self.namespace.as_deref() == Some(ns.uri)
    }

    /// Look up an attribute by its (possibly prefixed) name
    #[must_use]
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing any previous value
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    /// Builder form of [`Element::set_attr`]
    #[must_use]
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Declare an extra namespace binding on this element
    pub fn declare(&mut self, prefix: Option<&str>, uri: impl Into<String>) {
        self.declarations.push((prefix.map(String::from), uri.into()));
    }

    /// Concatenated text of the direct text children
    #[must_use]
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(text) => Some(text.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    /// [`Element::text`] with surrounding whitespace removed
    #[must_use]
    pub fn text_trim(&self) -> String {
        self.text().trim().to_string()
    }

    /// Replace all children with a single text node
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children = vec![Node::Text(text.into())];
    }

    /// Builder form of [`Element::set_text`]
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.set_text(text);
        self
    }

    /// Append a child element
    pub fn push(&mut self, child: Self) {
        self.children.push(Node::Element(child));
    }

    /// Builder form of [`Element::push`]
    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        self.push(child);
        self
    }

    /// Insert a child element at a node index
    pub fn insert(&mut self, index: usize, child: Self) {
        let index = index.min(self.children.len());
        self.children.insert(index, Node::Element(child));
    }

    /// Remove the node at `index`
    pub fn remove(&mut self, index: usize) -> Option<Node> {
        (index < self.children.len()).then(|| self.children.remove(index))
    }

    /// All child nodes, in document order
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.children
    }

    /// Child elements, in document order
    pub fn children(&self) -> impl Iterator<Item = &Self> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    /// Child elements with the given local name and namespace
    pub fn children_named<'a>(
        &'a self,
        name: &'a str,
        ns: Namespace,
    ) -> impl Iterator<Item = &'a Self> + 'a {
        self.children().filter(move |child| child.is(name, ns))
    }

    /// Child elements with the given local name, in any namespace
    pub fn children_local<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Self> + 'a {
        self.children().filter(move |child| child.name == name)
    }

    /// First child element with the given local name and namespace
    #[must_use]
    pub fn child(&self, name: &str, ns: Namespace) -> Option<&Self> {
        self.children().find(|child| child.is(name, ns))
    }

    /// Keep only the child elements for which `keep` returns true
    pub fn retain_children(&mut self, mut keep: impl FnMut(&Self) -> bool) {
        self.children.retain(|node| match node {
            Node::Element(element) => keep(element),
            Node::Text(_) => true,
        });
    }

    /// This element and all descendants with the given local name, in
    /// document order
    #[must_use]
    pub fn descendants_local(&self, name: &str) -> Vec<&Self> {
        let mut found = Vec::new();
        self.collect_local(name, &mut found);
        found
    }

    fn collect_local<'a>(&'a self, name: &str, found: &mut Vec<&'a Self>) {
        if self.name == name {
            found.push(self);
        }
        for child in self.children() {
            child.collect_local(name, found);
        }
    }

    /// Parse a document and return its root element.
    ///
    /// Documents nested deeper than [`MAX_DEPTH`] are rejected. Prefixes an
    /// element uses in attribute names or values are declared on the element
    /// itself, so a subtree serializes on its own.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = NsReader::from_str(xml);
        let mut stack: Vec<Self> = Vec::new();
        let mut root = None;

        loop {
            let (resolved, event) = reader.read_resolved_event().map_err(xml_error)?;
            match event {
                Event::Start(start) => {
                    let element = Self::open(&stack, resolved, &start)?;
                    stack.push(element);
                }
                Event::Empty(start) => {
                    let element = Self::open(&stack, resolved, &start)?;
                    attach(&mut stack, &mut root, element);
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| LookupError::Xml("unbalanced end tag".into()))?;
                    attach(&mut stack, &mut root, element);
                }
                Event::Text(text) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = text.unescape().map_err(xml_error)?;
                        if !text.trim().is_empty() {
                            parent.children.push(Node::Text(text.into_owned()));
                        }
                    }
                }
                Event::CData(data) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = String::from_utf8_lossy(&data.into_inner()).into_owned();
                        parent.children.push(Node::Text(text));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(LookupError::Xml("unexpected end of document".into()));
        }
        root.ok_or_else(|| LookupError::Xml("document has no root element".into()))
    }

    fn open(stack: &[Self], resolved: ResolveResult<'_>, start: &BytesStart<'_>) -> Result<Self> {
        if stack.len() >= MAX_DEPTH {
            return Err(LookupError::Xml(format!(
                "elements nested deeper than {MAX_DEPTH} levels"
            )));
        }
        let mut element = Self::from_start(resolved, start)?;
        element.inherit_prefixes(stack);
        Ok(element)
    }

    /// Redeclare ancestor prefixes referenced by attribute names or values
    fn inherit_prefixes(&mut self, ancestors: &[Self]) {
        let mut needed: Vec<String> = Vec::new();
        for (key, value) in &self.attributes {
            for qualified in [key, value] {
                let Some((prefix, _)) = qualified.split_once(':') else {
                    continue;
                };
                if !prefix.is_empty() && prefix != "xml" && !needed.iter().any(|p| p == prefix) {
                    needed.push(prefix.to_string());
                }
            }
        }

        for prefix in needed {
            if self.declarations.iter().any(|(p, _)| p.as_deref() == Some(prefix.as_str())) {
                continue;
            }
            let inherited = ancestors
                .iter()
                .rev()
                .flat_map(|ancestor| ancestor.declarations.iter().rev())
                .find(|(p, _)| p.as_deref() == Some(prefix.as_str()))
                .map(|(_, uri)| uri.clone());
            if let Some(uri) = inherited {
                self.declarations.push((Some(prefix), uri));
            }
        }
    }

    fn from_start(resolved: ResolveResult<'_>, start: &BytesStart<'_>) -> Result<Self> {
        let namespace = match resolved {
            ResolveResult::Bound(XmlNamespace(uri)) => {
                Some(String::from_utf8_lossy(uri).into_owned())
            }
            ResolveResult::Unbound => None,
            ResolveResult::Unknown(prefix) => {
                return Err(LookupError::Xml(format!(
                    "unknown namespace prefix '{}'",
                    String::from_utf8_lossy(&prefix)
                )))
            }
        };

        let qname = start.name();
        let mut element = Self {
            name: String::from_utf8_lossy(qname.local_name().as_ref()).into_owned(),
            namespace,
            prefix: qname
                .prefix()
                .map(|p| String::from_utf8_lossy(p.as_ref()).into_owned()),
            ..Self::default()
        };

        for attr in start.attributes() {
            let attr = attr.map_err(xml_error)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value().map_err(xml_error)?.into_owned();
            if key == "xmlns" {
                element.declarations.push((None, value));
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                element.declarations.push((Some(prefix.to_string()), value));
            } else {
                element.attributes.push((key, value));
            }
        }

        Ok(element)
    }

    /// Serialize this element, declaring namespaces where first needed
    #[must_use]
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        self.write(&mut out, &mut Vec::new());
        out
    }

    fn write(&self, out: &mut String, scope: &mut Vec<(Option<String>, String)>) {
        let depth = scope.len();
        let tag = match &self.prefix {
            Some(prefix) => format!("{prefix}:{}", self.name),
            None => self.name.clone(),
        };

        out.push('<');
        out.push_str(&tag);

        match &self.namespace {
            Some(uri) => bind(out, scope, self.prefix.as_deref(), uri),
            None if self.prefix.is_none() => {
                if lookup(scope, None).is_some_and(|uri| !uri.is_empty()) {
                    bind(out, scope, None, "");
                }
            }
            None => {}
        }
        for (prefix, uri) in &self.declarations {
            bind(out, scope, prefix.as_deref(), uri);
        }
        for (key, value) in &self.attributes {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&escape(value.as_str()));
            out.push('"');
        }

        if self.children.is_empty() {
            out.push_str("/>");
        } else {
            out.push('>');
            for node in &self.children {
                match node {
                    Node::Element(child) => child.write(out, scope),
                    Node::Text(text) => out.push_str(&escape(text.as_str())),
                }
            }
            out.push_str("</");
            out.push_str(&tag);
            out.push('>');
        }

        scope.truncate(depth);
    }
}

fn lookup<'a>(scope: &'a [(Option<String>, String)], prefix: Option<&str>) -> Option<&'a str> {
    scope
        .iter()
        .rev()
        .find(|(p, _)| p.as_deref() == prefix)
        .map(|(_, uri)| uri.as_str())
}

fn bind(out: &mut String, scope: &mut Vec<(Option<String>, String)>, prefix: Option<&str>, uri: &str) {
    if lookup(scope, prefix) == Some(uri) {
        return;
    }
    match prefix {
        Some(prefix) => {
            out.push_str(" xmlns:");
            out.push_str(prefix);
        }
        None => out.push_str(" xmlns"),
    }
    out.push_str("=\"");
    out.push_str(&escape(uri));
    out.push('"');
    scope.push((prefix.map(String::from), uri.to_string()));
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

fn xml_error(err: impl fmt::Display) -> LookupError {
    LookupError::Xml(err.to_string())
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xml())
    }
}

impl FromStr for Element {
    type Err = LookupError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
