//! Directory layout and image discovery.
//!
//! A data root holds two sibling directories:
//!
//! ```text
//! <root>/images/<name>.<jpg|jpeg|png>
//! <root>/annotations/<name>.xml
//! ```
//!
//! An image and its annotation file share a base name.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::constants::{ANNOTATION_EXTENSION, ANNOTATIONS_DIR, IMAGE_EXTENSIONS, IMAGES_DIR};
use crate::format::{self, AnnotationDocument, FormatError};

/// Errors raised while scanning a data root.
#[derive(Error, Debug)]
pub enum DatasetError {
    /// I/O error while listing a directory
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An expected directory doesn't exist
    #[error("Directory not found: {0:?}")]
    MissingDirectory(PathBuf),

    /// Image and annotation counts differ
    #[error("Found {images} images but {annotations} annotation files")]
    CountMismatch { images: usize, annotations: usize },

    /// An image has no annotation file with the same base name
    #[error("No annotation file for image {0:?}")]
    UnpairedImage(PathBuf),

    /// An annotation file couldn't be read
    #[error("Failed to read {path:?}: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: FormatError,
    },
}

/// Where images and annotation files live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    root: PathBuf,
    images_dir: String,
    annotations_dir: String,
}

impl DataLayout {
    /// Layout with the standard `images` and `annotations` directories.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_dirs(root, IMAGES_DIR, ANNOTATIONS_DIR)
    }

    pub fn with_dirs(
        root: impl Into<PathBuf>,
        images_dir: impl Into<String>,
        annotations_dir: impl Into<String>,
    ) -> Self {
        Self {
            root: root.into(),
            images_dir: images_dir.into(),
            annotations_dir: annotations_dir.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn images_dir(&self) -> PathBuf {
        self.root.join(&self.images_dir)
    }

    pub fn annotations_dir(&self) -> PathBuf {
        self.root.join(&self.annotations_dir)
    }

    /// Default annotation file of an image: same base name, `.xml`, in the
    /// annotations directory.
    pub fn annotation_path_for(&self, image: &Path) -> PathBuf {
        let mut name = image.file_stem().unwrap_or_default().to_os_string();
        name.push(".");
        name.push(ANNOTATION_EXTENSION);
        self.annotations_dir().join(name)
    }
}

/// Check an image path against an extension allow-list (case-insensitive).
pub fn has_extension(path: &Path, extensions: &[impl AsRef<str>]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|a| a.as_ref().eq_ignore_ascii_case(ext)))
}

/// Regular files in `dir` with an allowed extension, sorted by name.
pub fn list_images(dir: &Path, extensions: &[impl AsRef<str>]) -> Result<Vec<PathBuf>, DatasetError> {
    list_files(dir, |path| has_extension(path, extensions))
}

/// Images in `dir` using the built-in extension allow-list.
pub fn list_default_images(dir: &Path) -> Result<Vec<PathBuf>, DatasetError> {
    list_images(dir, IMAGE_EXTENSIONS)
}

fn list_files(dir: &Path, keep: impl Fn(&Path) -> bool) -> Result<Vec<PathBuf>, DatasetError> {
    if !dir.is_dir() {
        return Err(DatasetError::MissingDirectory(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && keep(&path) {
            files.push(path);
        } else {
            log::trace!("Skipping {:?}", path);
        }
    }
    files.sort();
    log::debug!("📁 {} files in {:?}", files.len(), dir);
    Ok(files)
}

/// One image with its annotation file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePair {
    pub image: PathBuf,
    pub annotation: PathBuf,
}

/// A data root where every image has exactly one annotation file.
#[derive(Debug, Clone)]
pub struct PairedDataset {
    layout: DataLayout,
    pairs: Vec<ImagePair>,
}

impl PairedDataset {
    /// Scan a data root.
    ///
    /// Differing image and annotation counts are an error for the whole
    /// dataset, as is an image whose annotation file has another base name.
    pub fn scan(layout: DataLayout, extensions: &[impl AsRef<str>]) -> Result<Self, DatasetError> {
        let images = list_images(&layout.images_dir(), extensions)?;
        let annotations = list_files(&layout.annotations_dir(), |path| {
            has_extension(path, &[ANNOTATION_EXTENSION])
        })?;

        if images.len() != annotations.len() {
            return Err(DatasetError::CountMismatch {
                images: images.len(),
                annotations: annotations.len(),
            });
        }

        let pairs = images
            .into_iter()
            .map(|image| {
                let annotation = layout.annotation_path_for(&image);
                if annotations.contains(&annotation) {
                    Ok(ImagePair { image, annotation })
                } else {
                    Err(DatasetError::UnpairedImage(image))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        log::info!("📁 Dataset at {:?}: {} pairs", layout.root(), pairs.len());
        Ok(Self { layout, pairs })
    }

    pub fn layout(&self) -> &DataLayout {
        &self.layout
    }

    pub fn pairs(&self) -> &[ImagePair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Read the annotation file of the `index`-th pair.
    pub fn load(&self, index: usize) -> Option<Result<AnnotationDocument, DatasetError>> {
        let pair = self.pairs.get(index)?;
        Some(
            format::read_file(&pair.annotation).map_err(|source| DatasetError::Format {
                path: pair.annotation.clone(),
                source,
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{ImageSize, write_file};

    fn write_image(path: &Path) {
        image::RgbImage::new(4, 3).save(path).unwrap();
    }

    fn write_annotation(path: &Path) {
        let doc = AnnotationDocument::for_path(path, ImageSize::new(4, 3));
        write_file(&doc, path).unwrap();
    }

    #[test]
    fn test_list_images_filters_extensions() {
        let dir = tempfile::tempdir().unwrap();
        write_image(&dir.path().join("a.png"));
        write_image(&dir.path().join("b.jpg"));
        std::fs::copy(dir.path().join("b.jpg"), dir.path().join("c.JPEG")).unwrap();
        std::fs::write(dir.path().join("d.gif"), b"GIF89a").unwrap();
        std::fs::create_dir(dir.path().join("nested.png")).unwrap();

        let images = list_default_images(dir.path()).unwrap();
        let names: Vec<_> = images
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.png", "b.jpg", "c.JPEG"]);
    }

    #[test]
    fn test_list_images_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            list_default_images(&dir.path().join("nope")),
            Err(DatasetError::MissingDirectory(_))
        ));
    }

    #[test]
    fn test_annotation_path_for() {
        let layout = DataLayout::new("/data");
        assert_eq!(
            layout.annotation_path_for(Path::new("/data/images/cat.01.jpg")),
            PathBuf::from("/data/annotations/cat.01.xml")
        );
    }

    #[test]
    fn test_scan_pairs_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        std::fs::create_dir_all(layout.images_dir()).unwrap();
        for name in ["a", "b"] {
            let image = layout.images_dir().join(format!("{name}.png"));
            write_image(&image);
            write_annotation(&layout.annotation_path_for(&image));
        }

        let dataset = PairedDataset::scan(layout, IMAGE_EXTENSIONS).unwrap();
        assert_eq!(dataset.len(), 2);
        assert!(dataset.pairs()[1].annotation.ends_with("annotations/b.xml"));
        assert!(dataset.load(0).unwrap().is_ok());
        assert!(dataset.load(2).is_none());
    }

    #[test]
    fn test_scan_count_mismatch_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        std::fs::create_dir_all(layout.images_dir()).unwrap();
        std::fs::create_dir_all(layout.annotations_dir()).unwrap();
        write_image(&layout.images_dir().join("a.png"));
        write_image(&layout.images_dir().join("b.png"));
        write_annotation(&layout.annotations_dir().join("a.xml"));

        match PairedDataset::scan(layout, IMAGE_EXTENSIONS) {
            Err(DatasetError::CountMismatch {
                images,
                annotations,
            }) => assert_eq!((images, annotations), (2, 1)),
            other => panic!("expected CountMismatch, got {:?}", other.map(|d| d.len())),
        }
    }

    #[test]
    fn test_scan_unpaired_image() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        std::fs::create_dir_all(layout.images_dir()).unwrap();
        std::fs::create_dir_all(layout.annotations_dir()).unwrap();
        write_image(&layout.images_dir().join("a.png"));
        write_annotation(&layout.annotations_dir().join("z.xml"));

        assert!(matches!(
            PairedDataset::scan(layout, IMAGE_EXTENSIONS),
            Err(DatasetError::UnpairedImage(_))
        ));
    }
}
