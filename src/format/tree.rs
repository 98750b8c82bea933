//! Generic XML tree fold.
//!
//! Every element folds into a mapping from child tag to value:
//!
//! - a leaf with text becomes [`XmlValue::Text`] (trimmed),
//! - a leaf without text is dropped from its parent,
//! - an element with children becomes [`XmlValue::Map`]; a tag that occurs
//!   once maps to that child's value, a tag that occurs more than once maps
//!   to an [`XmlValue::List`],
//! - `color_dict` always becomes [`XmlValue::Attributes`],
//! - `annotation/object` is always a list, even with zero or one object.
//!
//! The scalar-vs-list split is part of the file contract: `size` is written
//! exactly once while `object` may repeat.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::format::error::FormatError;

/// Root element of an annotation file.
pub const ROOT_TAG: &str = "annotation";
/// Repeated per-annotation element.
pub const OBJECT_TAG: &str = "object";
/// Element whose attributes map labels to colors.
pub const COLOR_DICT_TAG: &str = "color_dict";

/// Folded value of an XML element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlValue {
    /// Trimmed text of a leaf element.
    Text(String),
    /// Children by tag, in order of first appearance.
    Map(Vec<(String, XmlValue)>),
    /// Values of a tag that occurred more than once.
    List(Vec<XmlValue>),
    /// Attributes of a `color_dict` element, in document order.
    Attributes(Vec<(String, String)>),
}

impl XmlValue {
    /// Look up a child in a map value.
    pub fn get(&self, key: &str) -> Option<&XmlValue> {
        match self {
            XmlValue::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            XmlValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// View a value as a sequence: lists yield their items, anything else
    /// yields itself once.
    pub fn items(&self) -> Vec<&XmlValue> {
        match self {
            XmlValue::List(items) => items.iter().collect(),
            other => vec![other],
        }
    }
}

/// Raw element as read from the document, before folding.
#[derive(Debug, Default)]
struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    text: Option<String>,
    children: Vec<Element>,
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> Result<Self, FormatError> {
        let tag = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            attributes.push((key, value));
        }
        Ok(Self {
            tag,
            attributes,
            ..Default::default()
        })
    }

    fn push_text(&mut self, text: &str) {
        self.text.get_or_insert_with(String::new).push_str(text);
    }
}

/// Parse an XML document and fold it into `{root_tag: value}`.
///
/// Returns an empty map when the root element has neither children nor text.
pub fn parse_tree(xml: &str) -> Result<XmlValue, FormatError> {
    let root = read_elements(xml)?;
    Ok(XmlValue::Map(fold(root).into_iter().collect()))
}

fn read_elements(xml: &str) -> Result<Element, FormatError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    let mut attach = |element: Element, stack: &mut Vec<Element>| -> Result<(), FormatError> {
        match stack.last_mut() {
            Some(parent) => parent.children.push(element),
            None if root.is_none() => root = Some(element),
            None => {
                return Err(FormatError::invalid_format(
                    "more than one root element",
                ));
            }
        }
        Ok(())
    };

    loop {
        match reader.read_event()? {
            Event::Start(ref e) => stack.push(Element::from_start(e)?),
            Event::Empty(ref e) => {
                let element = Element::from_start(e)?;
                attach(element, &mut stack)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| FormatError::invalid_format("unbalanced closing tag"))?;
                attach(element, &mut stack)?;
            }
            Event::Text(ref e) => {
                let text = e.unescape()?;
                if let Some(current) = stack.last_mut() {
                    current.push_text(&text);
                }
            }
            Event::CData(e) => {
                if let Some(current) = stack.last_mut() {
                    current.push_text(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(FormatError::invalid_format(format!(
            "document ended inside <{}>",
            stack.last().map(|e| e.tag.as_str()).unwrap_or_default()
        )));
    }
    root.ok_or_else(|| FormatError::invalid_format("document has no root element"))
}

fn fold(element: Element) -> Option<(String, XmlValue)> {
    if element.tag == COLOR_DICT_TAG {
        return Some((element.tag, XmlValue::Attributes(element.attributes)));
    }

    if !element.children.is_empty() {
        let mut grouped: Vec<(String, Vec<XmlValue>)> = Vec::new();
        for (tag, value) in element.children.into_iter().filter_map(fold) {
            match grouped.iter_mut().find(|(t, _)| *t == tag) {
                Some((_, values)) => values.push(value),
                None => grouped.push((tag, vec![value])),
            }
        }

        if element.tag == ROOT_TAG {
            let objects = match grouped.iter().position(|(t, _)| t == OBJECT_TAG) {
                Some(index) => grouped.remove(index).1,
                None => Vec::new(),
            };
            grouped.push((OBJECT_TAG.to_string(), vec![XmlValue::List(objects)]));
        }

        let entries = grouped
            .into_iter()
            .map(|(tag, mut values)| {
                let value = if values.len() == 1 {
                    values.remove(0)
                } else {
                    XmlValue::List(values)
                };
                (tag, value)
            })
            .collect();
        return Some((element.tag, XmlValue::Map(entries)));
    }

    element
        .text
        .map(|text| (element.tag, XmlValue::Text(text.trim().to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> XmlValue {
        XmlValue::Text(s.to_string())
    }

    #[test]
    fn test_single_child_is_scalar() {
        let tree = parse_tree("<root><size><width>10</width></size></root>").unwrap();
        let size = tree.get("root").and_then(|r| r.get("size")).unwrap();
        assert_eq!(size.get("width"), Some(&text("10")));
    }

    #[test]
    fn test_repeated_children_become_list() {
        let tree = parse_tree("<root><item>a</item><item>b</item></root>").unwrap();
        let items = tree.get("root").and_then(|r| r.get("item")).unwrap();
        assert_eq!(items, &XmlValue::List(vec![text("a"), text("b")]));
    }

    #[test]
    fn test_object_always_list() {
        let xml = "<annotation><object><name>cat</name></object></annotation>";
        let tree = parse_tree(xml).unwrap();
        let objects = tree.get("annotation").and_then(|a| a.get("object")).unwrap();
        match objects {
            XmlValue::List(items) => {
                assert_eq!(items.len(), 1);
                assert_eq!(items[0].get("name"), Some(&text("cat")));
            }
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_object_list_present_when_absent() {
        let tree = parse_tree("<annotation><folder>images</folder></annotation>").unwrap();
        let objects = tree.get("annotation").and_then(|a| a.get("object"));
        assert_eq!(objects, Some(&XmlValue::List(Vec::new())));
    }

    #[test]
    fn test_empty_leaf_is_dropped() {
        let tree = parse_tree("<root><folder/><path>p</path></root>").unwrap();
        let root = tree.get("root").unwrap();
        assert_eq!(root.get("folder"), None);
        assert_eq!(root.get("path"), Some(&text("p")));
    }

    #[test]
    fn test_text_is_trimmed() {
        let tree = parse_tree("<root><name>\n   cat  \n</name></root>").unwrap();
        assert_eq!(tree.get("root").and_then(|r| r.get("name")), Some(&text("cat")));
    }

    #[test]
    fn test_color_dict_keeps_attributes() {
        let xml = r##"<annotation><color_dict cat="#ff0000" dog="#00ff00"/></annotation>"##;
        let tree = parse_tree(xml).unwrap();
        let dict = tree.get("annotation").and_then(|a| a.get("color_dict")).unwrap();
        assert_eq!(
            dict,
            &XmlValue::Attributes(vec![
                ("cat".into(), "#ff0000".into()),
                ("dog".into(), "#00ff00".into()),
            ])
        );
    }

    #[test]
    fn test_escaped_text() {
        let tree = parse_tree("<root><path>a &amp; b</path></root>").unwrap();
        assert_eq!(tree.get("root").and_then(|r| r.get("path")), Some(&text("a & b")));
    }

    #[test]
    fn test_items_view() {
        assert_eq!(text("x").items(), vec![&text("x")]);
        let list = XmlValue::List(vec![text("a"), text("b")]);
        assert_eq!(list.items().len(), 2);
    }

    #[test]
    fn test_unclosed_document_is_error() {
        assert!(parse_tree("<annotation><object>").is_err());
    }

    #[test]
    fn test_mismatched_tags_are_error() {
        assert!(parse_tree("<annotation><size></object></annotation>").is_err());
    }

    #[test]
    fn test_empty_input_is_error() {
        assert!(parse_tree("").is_err());
    }
}
