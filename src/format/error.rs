//! Error types for annotation file operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or writing annotation files.
#[derive(Error, Debug)]
pub enum FormatError {
    /// I/O error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// XML parsing or serialization error
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The image itself could not be opened or decoded
    #[error("Image error for {path:?}: {source}")]
    Image {
        /// Path of the image
        path: PathBuf,
        /// Underlying decoder error
        source: image::ImageError,
    },

    /// Invalid format structure or content
    #[error("Invalid format: {message}")]
    InvalidFormat {
        /// Description of the format error
        message: String,
    },

    /// Required element is missing
    #[error("Missing required field: {field}")]
    MissingField {
        /// Path of the missing element, e.g. `object/bndbox`
        field: String,
    },

    /// Invalid coordinate values
    #[error("Invalid coordinates: {message}")]
    InvalidCoordinates {
        /// Description of the coordinate error
        message: String,
    },

    /// A `color_dict` value is not a hex color
    #[error("Invalid color '{value}' for label '{label}'")]
    InvalidColor {
        /// Label the color belongs to
        label: String,
        /// The offending attribute value
        value: String,
    },

    /// An object uses a label that `color_dict` doesn't list
    #[error("No color recorded for label '{label}'")]
    UnknownLabelColor {
        /// The label without a color
        label: String,
    },

    /// A label can't be written as a `color_dict` attribute name
    #[error("Label '{label}' is not a valid XML attribute name")]
    InvalidLabel {
        /// The rejected label
        label: String,
    },
}

impl FormatError {
    /// Create an invalid format error with a message.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// Create a missing field error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Create an invalid coordinates error.
    pub fn invalid_coordinates(message: impl Into<String>) -> Self {
        Self::InvalidCoordinates {
            message: message.into(),
        }
    }
}
