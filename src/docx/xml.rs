/*!
 * A small owned XML tree over quick-xml events.
 *
 * WordprocessingML parts are edited by walking this tree, so parsing keeps
 * everything it does not model (comments, processing instructions, CDATA)
 * as raw events and writes them back unchanged.
 */

use anyhow::{Result, anyhow};
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

/// Child of an element
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    /// Unescaped character data
    Text(String),
    /// Any other event, written back verbatim
    Other(Event<'static>),
}

/// An element with its qualified name, attributes in document order and children
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Builder-style attribute
    pub fn with_attr(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Builder-style child element
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    /// Builder-style text content
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key.to_string(), value)),
        }
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    /// True when the qualified name is `name`
    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    /// Element children in order
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// First child element named `name`
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.is(name))
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.elements_mut().find(|e| e.is(name))
    }

    /// Child elements named `name`
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements().filter(move |e| e.is(name))
    }

    /// Concatenated text of direct text children
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|n| match n {
                Node::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Remove child elements matching `pred`
    pub fn retain_elements(&mut self, mut pred: impl FnMut(&Element) -> bool) {
        self.children.retain(|n| match n {
            Node::Element(e) => pred(e),
            _ => true,
        });
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            attributes.push((key, value));
        }
        Ok(Self {
            name,
            attributes,
            children: Vec::new(),
        })
    }

    fn write_to(&self, writer: &mut Writer<Vec<u8>>) -> Result<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for (k, v) in &self.attributes {
            start.push_attribute((k.as_str(), v.as_str()));
        }

        if self.children.is_empty() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        writer.write_event(Event::Start(start))?;
        for child in &self.children {
            match child {
                Node::Element(e) => e.write_to(writer)?,
                Node::Text(t) => writer.write_event(Event::Text(BytesText::new(t)))?,
                Node::Other(ev) => writer.write_event(ev.clone())?,
            }
        }
        writer.write_event(Event::End(BytesEnd::new(self.name.as_str())))?;
        Ok(())
    }
}

/// A parsed XML part: prolog events and the root element
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    pub prolog: Vec<Event<'static>>,
    pub root: Element,
}

impl XmlDocument {
    /// Document with the standard standalone declaration
    pub fn new(root: Element) -> Self {
        Self {
            prolog: vec![Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes")))],
            root,
        }
    }

    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut prolog = Vec::new();
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event()? {
                Event::Start(start) => stack.push(Element::from_start(&start)?),
                Event::Empty(start) => {
                    let el = Element::from_start(&start)?;
                    attach(&mut stack, &mut root, Node::Element(el));
                }
                Event::End(_) => {
                    let el = stack.pop().ok_or_else(|| anyhow!("Unbalanced end tag"))?;
                    attach(&mut stack, &mut root, Node::Element(el));
                }
                Event::Text(text) => {
                    // whitespace around the root carries no content
                    if !stack.is_empty() {
                        let text = text.unescape()?.into_owned();
                        attach(&mut stack, &mut root, Node::Text(text));
                    }
                }
                Event::Eof => break,
                other => {
                    if stack.is_empty() {
                        if root.is_none() {
                            prolog.push(other.into_owned());
                        }
                    } else {
                        attach(&mut stack, &mut root, Node::Other(other.into_owned()));
                    }
                }
            }
        }

        if !stack.is_empty() {
            return Err(anyhow!("Unclosed element <{}>", stack[stack.len() - 1].name));
        }
        let root = root.ok_or_else(|| anyhow!("No root element"))?;
        Ok(Self { prolog, root })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        for ev in &self.prolog {
            writer.write_event(ev.clone())?;
        }
        self.root.write_to(&mut writer)?;
        Ok(writer.into_inner())
    }
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, node: Node) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => {
            if let Node::Element(el) = node {
                *root = Some(el);
            }
        }
    }
}
