//! In-memory form of one annotation file.

use std::path::Path;

use crate::constants::DEFAULT_DEPTH;
use crate::model::{Annotation, AnnotatedImage, Color};

/// The `size` element of an annotation file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
    pub depth: u8,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            depth: DEFAULT_DEPTH,
        }
    }
}

/// Everything an annotation file carries.
///
/// `label_colors` holds one entry per distinct label, in order of first use.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationDocument {
    /// Name of the image's parent directory
    pub folder: String,
    /// Base name of the image file
    pub filename: String,
    /// Image path as given when the image was opened
    pub path: String,
    pub size: ImageSize,
    pub annotations: Vec<Annotation>,
    pub label_colors: Vec<(String, Color)>,
}

impl AnnotationDocument {
    /// Empty document describing the image at `path`.
    pub fn for_path(path: &Path, size: ImageSize) -> Self {
        let name_of = |p: Option<&Path>| {
            p.and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        };

        Self {
            folder: name_of(path.parent()),
            filename: name_of(Some(path)),
            path: path.to_string_lossy().into_owned(),
            size,
            annotations: Vec::new(),
            label_colors: Vec::new(),
        }
    }

    /// Snapshot of an annotated image ready to be written.
    pub fn from_image(image: &AnnotatedImage) -> Self {
        let (width, height) = image.dimensions();
        let mut doc = Self::for_path(
            image.path(),
            ImageSize {
                width,
                height,
                depth: image.depth(),
            },
        );
        let store = image.store();
        doc.annotations = store.annotations().to_vec();
        doc.label_colors = store
            .label_colors()
            .into_iter()
            .map(|(label, color)| (label.to_string(), color))
            .collect();
        doc
    }

    /// Labels in annotation order (one entry per annotation).
    pub fn labels(&self) -> Vec<&str> {
        self.annotations.iter().map(|a| a.label.as_str()).collect()
    }

    /// Boxes as `(xmin, ymin, xmax, ymax)` tuples in annotation order.
    pub fn bounding_boxes(&self) -> Vec<(i32, i32, i32, i32)> {
        self.annotations.iter().map(|a| a.bbox.as_tuple()).collect()
    }

    pub fn color(&self, label: &str) -> Option<Color> {
        self.label_colors
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, c)| *c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_for_path_splits_names() {
        let doc = AnnotationDocument::for_path(
            &PathBuf::from("/data/images/cat_01.jpg"),
            ImageSize::new(640, 480),
        );
        assert_eq!(doc.folder, "images");
        assert_eq!(doc.filename, "cat_01.jpg");
        assert_eq!(doc.path, "/data/images/cat_01.jpg");
        assert_eq!(doc.size.depth, 3);
    }

    #[test]
    fn test_for_path_without_parent() {
        let doc = AnnotationDocument::for_path(&PathBuf::from("lone.png"), ImageSize::new(1, 1));
        assert_eq!(doc.folder, "");
        assert_eq!(doc.filename, "lone.png");
    }
}
