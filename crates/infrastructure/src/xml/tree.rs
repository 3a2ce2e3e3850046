//! Buffers a `quick_xml` event stream into a small generic tree.
//!
//! The KSR/SKR schema nests deeply enough (policy blocks, bundles, keys,
//! signatures) that walking `quick_xml::Reader` events directly with a hand
//! state machine reads worse than it runs. Buffering once into this tree
//! keeps the actual schema walk in `decode.rs` a plain series of named
//! lookups over an already-materialized tree.

use std::io::Cursor;

use quick_xml::events::Event;
use quick_xml::Reader;

use ksr_ceremony_domain::CoreError;

#[derive(Debug)]
pub struct XmlNode {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
    pub text: String,
}

impl XmlNode {
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> {
        self.children.iter().filter(move |c| c.name == name)
    }

    pub fn text_trim(&self) -> &str {
        self.text.trim()
    }
}

pub fn parse_tree(xml: &[u8]) -> Result<XmlNode, CoreError> {
    let mut reader = Reader::from_reader(Cursor::new(xml));
    let mut buf: Vec<u8> = Vec::new();
    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| CoreError::MalformedXml(e.to_string()))?;

        match event {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let attrs = read_attrs(&e)?;
                stack.push(XmlNode { name, attrs, children: Vec::new(), text: String::new() });
            }
            Event::Empty(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let attrs = read_attrs(&e)?;
                let node = XmlNode { name, attrs, children: Vec::new(), text: String::new() };
                attach(&mut stack, &mut root, node)?;
            }
            Event::Text(e) => {
                let text = e.unescape().map_err(|e| CoreError::MalformedXml(e.to_string()))?;
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&text);
                }
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&text);
                }
            }
            Event::End(_) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| CoreError::MalformedXml("unbalanced closing tag".into()))?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    root.ok_or_else(|| CoreError::MalformedXml("document has no root element".into()))
}

fn read_attrs(e: &quick_xml::events::BytesStart<'_>) -> Result<Vec<(String, String)>, CoreError> {
    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|e| CoreError::MalformedXml(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| CoreError::MalformedXml(e.to_string()))?
            .into_owned();
        attrs.push((key, value));
    }
    Ok(attrs)
}

fn attach(stack: &mut [XmlNode], root: &mut Option<XmlNode>, node: XmlNode) -> Result<(), CoreError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => *root = Some(node),
    }
    Ok(())
}
