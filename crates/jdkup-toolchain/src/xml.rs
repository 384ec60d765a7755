//! Minimal element tree for Maven-style XML documents (`toolchains.xml`,
//! `settings.xml`).
//!
//! Element order, attributes and text survive a parse/serialise round trip.
//! Comments, processing instructions and the original formatting do not.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("malformed XML at byte {position}: {message}")]
    Syntax { position: usize, message: String },
    #[error("document has no root element")]
    MissingRoot,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn push_child(&mut self, child: Element) -> &mut Self {
        self.children.push(child);
        self
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// Trimmed text content; empty when the element has none.
    pub fn text(&self) -> &str {
        self.text.as_deref().map(str::trim).unwrap_or("")
    }

    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name)
            .map(Element::text)
            .filter(|text| !text.is_empty())
    }

    pub fn parse(input: &str) -> Result<Element, XmlError> {
        let mut reader = Reader::from_str(input);
        reader.trim_text(true);

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            let position = reader.buffer_position();
            let event = reader.read_event().map_err(|e| syntax(position, e))?;
            match event {
                Event::Start(start) => {
                    stack.push(element_from_start(&start).map_err(|e| syntax(position, e))?);
                }
                Event::Empty(start) => {
                    let element = element_from_start(&start).map_err(|e| syntax(position, e))?;
                    attach(&mut stack, &mut root, element, position)?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| syntax(position, "unexpected closing tag"))?;
                    attach(&mut stack, &mut root, element, position)?;
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(|e| syntax(position, e))?;
                    append_text(&mut stack, &text, position)?;
                }
                Event::CData(data) => {
                    let raw = data.into_inner();
                    append_text(&mut stack, &String::from_utf8_lossy(&raw), position)?;
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(syntax(
                reader.buffer_position(),
                format!("element <{}> is never closed", open.name),
            ));
        }
        root.ok_or(XmlError::MissingRoot)
    }

    pub fn to_xml_string(&self) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        self.write_into(&mut out, 0);
        out
    }

    fn write_into(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        out.push_str(&indent);
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attributes {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&quick_xml::escape::escape(value.as_str()));
            out.push('"');
        }

        let text = self.text.as_deref().filter(|text| !text.is_empty());
        match (text, self.children.is_empty()) {
            (None, true) => out.push_str("/>\n"),
            (Some(text), true) => {
                out.push('>');
                out.push_str(&quick_xml::escape::escape(text));
                out.push_str("</");
                out.push_str(&self.name);
                out.push_str(">\n");
            }
            (text, false) => {
                out.push_str(">\n");
                if let Some(text) = text {
                    out.push_str(&indent);
                    out.push_str("  ");
                    out.push_str(&quick_xml::escape::escape(text));
                    out.push('\n');
                }
                for child in &self.children {
                    child.write_into(out, depth + 1);
                }
                out.push_str(&indent);
                out.push_str("</");
                out.push_str(&self.name);
                out.push_str(">\n");
            }
        }
    }
}

fn syntax(position: usize, message: impl ToString) -> XmlError {
    XmlError::Syntax {
        position,
        message: message.to_string(),
    }
}

fn element_from_start(start: &BytesStart<'_>) -> Result<Element, quick_xml::Error> {
    let mut element = Element::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
    position: usize,
) -> Result<(), XmlError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(syntax(position, "more than one root element"));
    }
    *root = Some(element);
    Ok(())
}

fn append_text(stack: &mut [Element], text: &str, position: usize) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(current) => {
            current.text.get_or_insert_with(String::new).push_str(text);
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(syntax(position, "text outside of the root element")),
    }
}
