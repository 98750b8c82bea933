//! boxmark - Bounding-box annotation engine
//!
//! Core of a bounding-box image annotator: an annotation store per image, an
//! edit state machine for drawing boxes, zoom and pan of the view, a label
//! filter projection and a Pascal VOC style XML sidecar format with a
//! `color_dict` element for label colors.
//!
//! The crate has no GUI. A front end feeds pointer events and menu commands
//! into a [`session::Session`] and paints the display list it returns.

pub mod config;
pub mod constants;
pub mod dataset;
pub mod editor;
pub mod format;
pub mod labels;
pub mod model;
pub mod session;
pub mod view;

pub use config::AppConfig;
pub use session::{Command, CommandOutput, Session, SessionError};
