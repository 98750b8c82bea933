//! Annotation file writer.
//!
//! Produces one indented XML document per image:
//!
//! ```text
//! annotation
//!  ├─ folder, filename, path
//!  ├─ size (width, height, depth)
//!  ├─ object* (name, bndbox (xmin, ymin, xmax, ymax))
//!  └─ color_dict (one label="#rrggbb" attribute per distinct label)
//! ```

use std::io::Write;
use std::path::Path;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::format::document::AnnotationDocument;
use crate::format::error::FormatError;
use crate::format::tree::{COLOR_DICT_TAG, OBJECT_TAG, ROOT_TAG};
use crate::model::is_valid_label;

/// Serialize a document to XML text.
pub fn write_document(doc: &AnnotationDocument) -> Result<String, FormatError> {
    if let Some((label, _)) = doc.label_colors.iter().find(|(l, _)| !is_valid_label(l)) {
        return Err(FormatError::InvalidLabel {
            label: label.clone(),
        });
    }
    if let Some(missing) = doc
        .annotations
        .iter()
        .find(|a| doc.color(&a.label).is_none())
    {
        return Err(FormatError::UnknownLabelColor {
            label: missing.label.clone(),
        });
    }

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(|e| FormatError::Xml(e.into()))?;
    start(&mut writer, ROOT_TAG)?;

    write_text_element(&mut writer, "folder", &doc.folder)?;
    write_text_element(&mut writer, "filename", &doc.filename)?;
    write_text_element(&mut writer, "path", &doc.path)?;

    start(&mut writer, "size")?;
    write_text_element(&mut writer, "width", &doc.size.width.to_string())?;
    write_text_element(&mut writer, "height", &doc.size.height.to_string())?;
    write_text_element(&mut writer, "depth", &doc.size.depth.to_string())?;
    end(&mut writer, "size")?;

    for annotation in &doc.annotations {
        let (xmin, ymin, xmax, ymax) = annotation.bbox.as_tuple();
        start(&mut writer, OBJECT_TAG)?;
        write_text_element(&mut writer, "name", &annotation.label)?;
        start(&mut writer, "bndbox")?;
        write_text_element(&mut writer, "xmin", &xmin.to_string())?;
        write_text_element(&mut writer, "ymin", &ymin.to_string())?;
        write_text_element(&mut writer, "xmax", &xmax.to_string())?;
        write_text_element(&mut writer, "ymax", &ymax.to_string())?;
        end(&mut writer, "bndbox")?;
        end(&mut writer, OBJECT_TAG)?;
    }

    let mut color_dict = BytesStart::new(COLOR_DICT_TAG);
    for (label, color) in &doc.label_colors {
        color_dict.push_attribute((label.as_str(), color.to_hex().as_str()));
    }
    writer
        .write_event(Event::Empty(color_dict))
        .map_err(|e| FormatError::Xml(e.into()))?;

    end(&mut writer, ROOT_TAG)?;

    let result = writer.into_inner();
    String::from_utf8(result).map_err(|_| FormatError::invalid_format("Invalid UTF-8 in XML"))
}

/// Write a document to `path`, replacing any existing file and creating
/// missing parent directories.
pub fn write_file(doc: &AnnotationDocument, path: &Path) -> Result<(), FormatError> {
    let xml = write_document(doc)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, xml)?;
    log::info!(
        "💾 Saved {} annotations to {:?}",
        doc.annotations.len(),
        path
    );
    Ok(())
}

fn start<W: Write>(writer: &mut Writer<W>, name: &str) -> Result<(), FormatError> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(|e| FormatError::Xml(e.into()))?;
    Ok(())
}

fn end<W: Write>(writer: &mut Writer<W>, name: &str) -> Result<(), FormatError> {
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(|e| FormatError::Xml(e.into()))?;
    Ok(())
}

/// Write a simple text element.
fn write_text_element<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    value: &str,
) -> Result<(), FormatError> {
    start(writer, name)?;
    writer
        .write_event(Event::Text(BytesText::new(value)))
        .map_err(|e| FormatError::Xml(e.into()))?;
    end(writer, name)
}
