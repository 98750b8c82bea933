//! Data models for the annotation editor.

mod annotation;
mod color;
mod image;
mod store;

pub use annotation::{Annotation, BoundingBox, Point, is_valid_label};
pub use color::{Color, ParseColorError, hsv_to_rgb};
pub use image::AnnotatedImage;
pub use store::{AnnotationStore, LabelChange, StoreError, Undone};
