//! Annotation file reader.
//!
//! Reading runs in two passes: the generic tree fold from [`crate::format::tree`],
//! then an extraction pass that pulls labels, boxes and label colors out of the
//! folded tree. A file with annotations but no `color_dict` is malformed.

use std::path::Path;

use crate::constants::DEFAULT_DEPTH;
use crate::format::document::{AnnotationDocument, ImageSize};
use crate::format::error::FormatError;
use crate::format::tree::{COLOR_DICT_TAG, OBJECT_TAG, ROOT_TAG, XmlValue, parse_tree};
use crate::model::{Annotation, BoundingBox, Color};

/// Box element written by current files.
const BNDBOX_TAG: &str = "bndbox";
/// Misspelled box element written by an early revision of the writer.
const LEGACY_BNDBOX_TAG: &str = "bnbbox";

/// Read an annotation file from disk.
pub fn read_file(path: &Path) -> Result<AnnotationDocument, FormatError> {
    let content = std::fs::read_to_string(path)?;
    read_document(&content).inspect_err(|e| log::warn!("Failed to parse {:?}: {}", path, e))
}

/// Parse annotation XML into a document.
pub fn read_document(xml: &str) -> Result<AnnotationDocument, FormatError> {
    let tree = parse_tree(xml)?;
    let root = tree
        .get(ROOT_TAG)
        .ok_or_else(|| FormatError::missing_field(ROOT_TAG))?;

    let annotations = read_objects(root)?;
    let label_colors = read_colors(root, !annotations.is_empty())?;

    for annotation in &annotations {
        if !label_colors.iter().any(|(l, _)| *l == annotation.label) {
            return Err(FormatError::UnknownLabelColor {
                label: annotation.label.clone(),
            });
        }
    }

    let text_of = |key: &str| {
        root.get(key)
            .and_then(XmlValue::as_text)
            .unwrap_or_default()
            .to_string()
    };

    Ok(AnnotationDocument {
        folder: text_of("folder"),
        filename: text_of("filename"),
        path: text_of("path"),
        size: read_size(root)?,
        annotations,
        label_colors,
    })
}

fn read_size(root: &XmlValue) -> Result<ImageSize, FormatError> {
    let Some(size) = root.get("size") else {
        return Ok(ImageSize::new(0, 0));
    };

    let field = |key: &str| -> Result<Option<u32>, FormatError> {
        size.get(key)
            .and_then(XmlValue::as_text)
            .map(|text| {
                text.parse::<u32>().map_err(|_| {
                    FormatError::invalid_format(format!("size/{} is not a number: '{}'", key, text))
                })
            })
            .transpose()
    };

    let depth = match field("depth")? {
        Some(d) => u8::try_from(d)
            .map_err(|_| FormatError::invalid_format(format!("size/depth out of range: {}", d)))?,
        None => DEFAULT_DEPTH,
    };

    Ok(ImageSize {
        width: field("width")?.unwrap_or(0),
        height: field("height")?.unwrap_or(0),
        depth,
    })
}

fn read_objects(root: &XmlValue) -> Result<Vec<Annotation>, FormatError> {
    let objects = match root.get(OBJECT_TAG) {
        Some(XmlValue::List(items)) => items,
        Some(_) => return Err(FormatError::invalid_format("annotation/object is not a list")),
        None => return Err(FormatError::missing_field("annotation/object")),
    };

    objects
        .iter()
        .enumerate()
        .map(|(index, object)| read_object(index, object))
        .collect()
}

fn read_object(index: usize, object: &XmlValue) -> Result<Annotation, FormatError> {
    let label = object
        .get("name")
        .and_then(XmlValue::as_text)
        .ok_or_else(|| FormatError::missing_field(format!("object[{}]/name", index)))?;

    let bndbox = object
        .get(BNDBOX_TAG)
        .or_else(|| object.get(LEGACY_BNDBOX_TAG))
        .ok_or_else(|| FormatError::missing_field(format!("object[{}]/bndbox", index)))?;

    let coord = |key: &str| -> Result<i32, FormatError> {
        let text = bndbox.get(key).and_then(XmlValue::as_text).ok_or_else(|| {
            FormatError::missing_field(format!("object[{}]/bndbox/{}", index, key))
        })?;
        text.parse::<i32>().map_err(|_| {
            FormatError::invalid_coordinates(format!(
                "object[{}]/bndbox/{} is not an integer: '{}'",
                index, key, text
            ))
        })
    };

    let bbox = BoundingBox::new(coord("xmin")?, coord("ymin")?, coord("xmax")?, coord("ymax")?);
    Ok(Annotation::new(label, bbox))
}

/// Collect label colors from every `color_dict` element, later entries
/// overriding earlier ones.
fn read_colors(
    root: &XmlValue,
    has_annotations: bool,
) -> Result<Vec<(String, Color)>, FormatError> {
    let Some(value) = root.get(COLOR_DICT_TAG) else {
        if has_annotations {
            return Err(FormatError::missing_field("annotation/color_dict"));
        }
        return Ok(Vec::new());
    };

    let mut colors: Vec<(String, Color)> = Vec::new();
    for dict in value.items() {
        let XmlValue::Attributes(attributes) = dict else {
            return Err(FormatError::invalid_format("color_dict has no attributes"));
        };
        for (label, hex) in attributes {
            let color: Color = hex.parse().map_err(|_| FormatError::InvalidColor {
                label: label.clone(),
                value: hex.clone(),
            })?;
            match colors.iter_mut().find(|(l, _)| l == label) {
                Some(entry) => entry.1 = color,
                None => colors.push((label.clone(), color)),
            }
        }
    }
    Ok(colors)
}
