//! The image currently open for annotation.

use std::path::{Path, PathBuf};

use crate::constants::DEFAULT_DEPTH;
use crate::format::{self, AnnotationDocument, FormatError};

use super::store::{AnnotationStore, StoreError};

/// One image plus its annotation state.
///
/// The path and dimensions are fixed for the lifetime of the value; selecting
/// another image means building a new `AnnotatedImage`.
#[derive(Debug, Clone)]
pub struct AnnotatedImage {
    path: PathBuf,
    dimensions: (u32, u32),
    depth: u8,
    store: AnnotationStore,
}

impl AnnotatedImage {
    /// Image with known dimensions and no annotations.
    pub fn new(path: impl Into<PathBuf>, dimensions: (u32, u32)) -> Self {
        Self {
            path: path.into(),
            dimensions,
            depth: DEFAULT_DEPTH,
            store: AnnotationStore::new(),
        }
    }

    /// Read the image header from disk to get its dimensions.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, FormatError> {
        let path = path.into();
        let dimensions = image::image_dimensions(&path).map_err(|source| FormatError::Image {
            path: path.clone(),
            source,
        })?;
        log::debug!("🖼️ Opened {:?} ({}x{})", path, dimensions.0, dimensions.1);
        Ok(Self::new(path, dimensions))
    }

    pub fn with_depth(mut self, depth: u8) -> Self {
        self.depth = depth;
        self
    }

    /// Replace the annotation state with the contents of `xml_path`.
    ///
    /// Returns `Ok(false)` and leaves the model empty when the file doesn't
    /// exist. A file that exists but can't be parsed is an error.
    pub fn load_annotations_from(&mut self, xml_path: &Path) -> Result<bool, FormatError> {
        if !xml_path.exists() {
            log::debug!("No annotation file at {:?}", xml_path);
            self.store = AnnotationStore::new();
            return Ok(false);
        }

        let doc = format::read_file(xml_path)?;
        self.store = AnnotationStore::restore(doc.annotations, doc.label_colors).map_err(
            |StoreError::MissingColor { label }| FormatError::UnknownLabelColor { label },
        )?;
        self.depth = doc.size.depth;
        log::info!(
            "📂 Loaded {} annotations from {:?}",
            self.store.len(),
            xml_path
        );
        Ok(true)
    }

    /// Write the annotation state to `xml_path`.
    pub fn save_to(&self, xml_path: &Path) -> Result<(), FormatError> {
        format::write_file(&AnnotationDocument::from_image(self), xml_path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `(width, height)` in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        self.dimensions
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut AnnotationStore {
        &mut self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoundingBox, Color};

    #[test]
    fn test_missing_annotation_file_is_empty_model() {
        let dir = tempfile::tempdir().unwrap();
        let mut image = AnnotatedImage::new(dir.path().join("a.png"), (10, 10));
        let loaded = image
            .load_annotations_from(&dir.path().join("a.xml"))
            .unwrap();
        assert!(!loaded);
        assert!(image.store().is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let xml = dir.path().join("annotations").join("a.xml");

        let mut image = AnnotatedImage::new(dir.path().join("a.png"), (100, 80));
        let store = image.store_mut();
        store
            .add_annotation("cat", BoundingBox::new(10, 10, 50, 60), Some(Color::new(255, 0, 0)))
            .unwrap();
        store
            .add_annotation("dog", BoundingBox::new(5, 5, 20, 20), Some(Color::new(0, 255, 0)))
            .unwrap();
        store.set_visible("dog", false);
        image.save_to(&xml).unwrap();

        let mut reopened = AnnotatedImage::new(dir.path().join("a.png"), (100, 80));
        assert!(reopened.load_annotations_from(&xml).unwrap());
        assert_eq!(reopened.store().annotations(), image.store().annotations());
        assert_eq!(reopened.store().color("cat"), Some(Color::new(255, 0, 0)));
        // visibility isn't persisted
        assert!(reopened.store().is_visible("dog"));
    }

    #[test]
    fn test_malformed_annotation_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let xml = dir.path().join("a.xml");
        std::fs::write(&xml, "<annotation><object>").unwrap();

        let mut image = AnnotatedImage::new(dir.path().join("a.png"), (10, 10));
        assert!(image.load_annotations_from(&xml).is_err());
    }

    #[test]
    fn test_open_reads_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small.png");
        image::RgbImage::new(7, 5).save(&path).unwrap();

        let image = AnnotatedImage::open(&path).unwrap();
        assert_eq!(image.dimensions(), (7, 5));
        assert_eq!(image.depth(), 3);
    }

    #[test]
    fn test_open_missing_image_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            AnnotatedImage::open(dir.path().join("nope.png")),
            Err(FormatError::Image { .. })
        ));
    }
}
