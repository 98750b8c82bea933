//! Global constants for the boxmark annotation engine

/// Scale applied to the view rectangle per wheel step
pub const ZOOM_FACTOR: f64 = 1.25;

/// Channel depth written to `size/depth` when the image doesn't say otherwise
pub const DEFAULT_DEPTH: u8 = 3;

/// Sub-directory of the data root holding the images
pub const IMAGES_DIR: &str = "images";

/// Sub-directory of the data root holding the XML annotation files
pub const ANNOTATIONS_DIR: &str = "annotations";

/// Extension of annotation files (without the dot)
pub const ANNOTATION_EXTENSION: &str = "xml";

/// Image extensions picked up when listing a directory (lowercase, without dots)
pub const IMAGE_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png"];

/// Default data root, relative to the working directory
pub const DEFAULT_DATA_ROOT: &str = "data";

/// Hue step in degrees between suggested label colors (golden angle)
pub const COLOR_HUE_STEP: f32 = 137.5;
