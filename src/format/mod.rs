//! Annotation file format.
//!
//! One XML file per image, laid out like Pascal VOC with an extra
//! `color_dict` element carrying the display color of every label.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use boxmark::format::{AnnotationDocument, read_document, write_document};
//!
//! let xml = write_document(&AnnotationDocument::from_image(&image))?;
//! let doc = read_document(&xml)?;
//! ```

mod document;
mod error;
mod reader;
pub mod tree;
mod writer;

#[cfg(test)]
mod tests;

pub use document::{AnnotationDocument, ImageSize};
pub use error::FormatError;
pub use reader::{read_document, read_file};
pub use tree::{XmlValue, parse_tree};
pub use writer::{write_document, write_file};
