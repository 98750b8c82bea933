//! Editing session: one open directory and at most one open image.
//!
//! The session wires the pieces together the way a front end needs them.
//! Pointer events go to the editor, wheel and pan drags go to the view,
//! store changes are mirrored into the label list and menu commands are
//! dispatched through [`Session::dispatch`].
//!
//! Selecting an image discards everything belonging to the previous one,
//! unsaved annotations included.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::{AppConfig, ConfigError};
use crate::dataset::{self, DataLayout, DatasetError};
use crate::editor::{
    self, DrawCommand, EditError, EditMode, EditOutcome, Editor, ImageBounds, PointerButton,
    Prompt,
};
use crate::format::FormatError;
use crate::labels::{LabelFilter, LabelList};
use crate::model::{AnnotatedImage, Color, Point, Undone};
use crate::view::{Fit, PanDrag, ViewTransform};

/// Errors surfaced to the user by session operations.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A file was selected before any directory was opened
    #[error("No directory is open")]
    NoDirectory,

    /// The command needs an open image
    #[error("No image is open")]
    NoImage,

    /// The path is not among the listed images of the open directory
    #[error("{} is not a listed image", path.display())]
    NotListed { path: PathBuf },

    /// File list index past the end
    #[error("Image index {index} out of range ({len} images)")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Commands exposed to menus and shortcuts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    OpenDirectory(PathBuf),
    Undo,
    Reset,
    Save,
    /// Switch to draw mode.
    ToggleDrawMode,
    /// Switch to view mode.
    ToggleViewMode,
    /// Print the current annotation state.
    Dump,
}

/// What a dispatched command produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    Done,
    /// Number of images listed by `OpenDirectory`.
    Listed(usize),
    Saved(PathBuf),
    Dump(String),
}

/// State belonging to the selected image.
#[derive(Debug)]
struct OpenImage {
    index: usize,
    image: AnnotatedImage,
    editor: Editor,
    view: ViewTransform,
    labels: LabelList,
    pan: Option<PanDrag>,
}

/// One editing session.
#[derive(Debug)]
pub struct Session {
    config: AppConfig,
    layout: DataLayout,
    directory: Option<PathBuf>,
    files: Vec<PathBuf>,
    mode: EditMode,
    current: Option<OpenImage>,
}

impl Session {
    pub fn new(config: AppConfig) -> Self {
        let layout = config.layout();
        Self {
            config,
            layout,
            directory: None,
            files: Vec::new(),
            mode: EditMode::default(),
            current: None,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn layout(&self) -> &DataLayout {
        &self.layout
    }

    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    /// Images of the open directory, sorted by name.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current.as_ref().map(|c| c.index)
    }

    pub fn image(&self) -> Option<&AnnotatedImage> {
        self.current.as_ref().map(|c| &c.image)
    }

    pub fn editor(&self) -> Option<&Editor> {
        self.current.as_ref().map(|c| &c.editor)
    }

    pub fn view(&self) -> Option<&ViewTransform> {
        self.current.as_ref().map(|c| &c.view)
    }

    pub fn labels(&self) -> Option<&LabelList> {
        self.current.as_ref().map(|c| &c.labels)
    }

    /// List the images of `dir` and close the current image.
    pub fn open_directory(&mut self, dir: impl Into<PathBuf>) -> Result<usize, SessionError> {
        let dir = dir.into();
        let files = dataset::list_images(&dir, &self.config.image_extensions)?;
        log::info!("📁 Opened {:?} ({} images)", dir, files.len());
        self.files = files;
        self.directory = Some(dir);
        self.current = None;
        Ok(self.files.len())
    }

    /// Open a listed image by path. Only the file name is compared.
    pub fn select_path(&mut self, path: &Path) -> Result<&AnnotatedImage, SessionError> {
        if self.directory.is_none() {
            return Err(SessionError::NoDirectory);
        }
        let index = self
            .files
            .iter()
            .position(|f| path.file_name().is_some() && f.file_name() == path.file_name())
            .ok_or_else(|| SessionError::NotListed {
                path: path.to_path_buf(),
            })?;
        self.select_image(index)
    }

    /// Open the `index`-th image of the directory.
    ///
    /// The previous image's state is dropped and the view returns to fit. If
    /// the image or its annotation file can't be read, the previous image
    /// stays open and the error is returned.
    pub fn select_image(&mut self, index: usize) -> Result<&AnnotatedImage, SessionError> {
        if self.directory.is_none() {
            return Err(SessionError::NoDirectory);
        }
        let path = self
            .files
            .get(index)
            .ok_or(SessionError::IndexOutOfRange {
                index,
                len: self.files.len(),
            })?
            .clone();

        let mut image = AnnotatedImage::open(&path)?.with_depth(self.config.default_depth);
        image.load_annotations_from(&self.layout.annotation_path_for(&path))?;

        let (width, height) = image.dimensions();
        let mut editor = Editor::new(ImageBounds::from_size(width, height))
            .with_normalize_boxes(self.config.normalize_boxes);
        editor.set_mode(self.mode);

        let open = OpenImage {
            index,
            labels: LabelList::from_store(image.store()),
            view: ViewTransform::new(width, height).with_factor(self.config.zoom_factor),
            editor,
            image,
            pan: None,
        };
        Ok(&self.current.insert(open).image)
    }

    /// Run a menu command.
    pub fn dispatch(&mut self, command: Command) -> Result<CommandOutput, SessionError> {
        log::debug!("Command {:?}", command);
        match command {
            Command::OpenDirectory(dir) => self.open_directory(dir).map(CommandOutput::Listed),
            Command::Undo => {
                self.undo()?;
                Ok(CommandOutput::Done)
            }
            Command::Reset => {
                self.reset()?;
                Ok(CommandOutput::Done)
            }
            Command::Save => self.save().map(CommandOutput::Saved),
            Command::ToggleDrawMode => {
                self.set_mode(EditMode::Draw);
                Ok(CommandOutput::Done)
            }
            Command::ToggleViewMode => {
                self.set_mode(EditMode::View);
                Ok(CommandOutput::Done)
            }
            Command::Dump => {
                let dump = self.dump()?;
                log::debug!("\n{}", dump);
                Ok(CommandOutput::Dump(dump))
            }
        }
    }

    pub fn set_mode(&mut self, mode: EditMode) {
        self.mode = mode;
        if let Some(current) = self.current.as_mut() {
            current.editor.set_mode(mode);
            if mode == EditMode::Draw {
                current.pan = None;
            }
        }
    }

    pub fn undo(&mut self) -> Result<Option<Undone>, SessionError> {
        let current = self.current_mut()?;
        let undone = current.editor.undo(current.image.store_mut());
        if let Some(change) = undone.as_ref().and_then(|u| u.change.as_ref()) {
            current.labels.apply(change);
        }
        Ok(undone)
    }

    pub fn reset(&mut self) -> Result<(), SessionError> {
        let current = self.current_mut()?;
        let change = current.editor.reset(current.image.store_mut());
        current.labels.apply(&change);
        Ok(())
    }

    /// Save to the default annotation path of the open image.
    pub fn save(&self) -> Result<PathBuf, SessionError> {
        let image = self.image().ok_or(SessionError::NoImage)?;
        let path = self.layout.annotation_path_for(image.path());
        image.save_to(&path)?;
        Ok(path)
    }

    /// Save to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<(), SessionError> {
        let image = self.image().ok_or(SessionError::NoImage)?;
        image.save_to(path)?;
        Ok(())
    }

    /// Human-readable listing of the open image's annotations.
    pub fn dump(&self) -> Result<String, SessionError> {
        let image = self.image().ok_or(SessionError::NoImage)?;
        Ok(dump_image(image))
    }

    /// Check or uncheck a label in the filter panel.
    pub fn set_label_checked(&mut self, label: &str, checked: bool) -> Result<(), SessionError> {
        let current = self.current_mut()?;
        if let Some(visible) = current.labels.set_checked(label, checked) {
            current.image.store_mut().set_visible(label, visible);
        }
        Ok(())
    }

    /// Flip a label's filter entry.
    pub fn toggle_label(&mut self, label: &str) -> Result<(), SessionError> {
        let current = self.current_mut()?;
        if let Some(visible) = current.labels.toggle(label) {
            current.image.store_mut().set_visible(label, visible);
        }
        Ok(())
    }

    /// Pointer press in image coordinates.
    pub fn pointer_down(&mut self, pos: Point, button: PointerButton) -> EditOutcome {
        match self.current.as_mut() {
            Some(current) => current.editor.pointer_down(pos, button),
            None => EditOutcome::Ignored,
        }
    }

    pub fn pointer_move(&mut self, pos: Point, primary_held: bool) -> EditOutcome {
        match self.current.as_mut() {
            Some(current) => current.editor.pointer_move(pos, primary_held),
            None => EditOutcome::Ignored,
        }
    }

    pub fn pointer_up(&mut self, button: PointerButton) -> EditOutcome {
        match self.current.as_mut() {
            Some(current) => current.editor.pointer_up(button),
            None => EditOutcome::Ignored,
        }
    }

    /// Release the button and answer the prompts with `prompt`.
    pub fn pointer_up_with(
        &mut self,
        button: PointerButton,
        prompt: &mut impl Prompt,
    ) -> Result<EditOutcome, SessionError> {
        let current = self.current_mut()?;
        let outcome = current
            .editor
            .pointer_up_with(button, prompt, current.image.store_mut())?;
        current.track(&outcome);
        Ok(outcome)
    }

    pub fn submit_label(&mut self, label: Option<String>) -> Result<EditOutcome, SessionError> {
        let current = self.current_mut()?;
        let outcome = current
            .editor
            .submit_label(label, current.image.store_mut())?;
        current.track(&outcome);
        Ok(outcome)
    }

    pub fn submit_color(&mut self, color: Option<Color>) -> Result<EditOutcome, SessionError> {
        let current = self.current_mut()?;
        let outcome = current
            .editor
            .submit_color(color, current.image.store_mut())?;
        current.track(&outcome);
        Ok(outcome)
    }

    /// Wheel step over the image.
    pub fn wheel(&mut self, delta_y: f64) {
        if let Some(current) = self.current.as_mut() {
            current.view.wheel(delta_y);
        }
    }

    /// Secondary-button press at a screen position starts a pan in view mode.
    pub fn begin_pan(&mut self, screen_x: f64, screen_y: f64) {
        if self.mode != EditMode::View {
            return;
        }
        if let Some(current) = self.current.as_mut() {
            current.pan = Some(PanDrag::begin(screen_x, screen_y));
        }
    }

    pub fn pan_to(&mut self, screen_x: f64, screen_y: f64, viewport: (f64, f64)) {
        if let Some(current) = self.current.as_mut() {
            let fit = current.view.fit(viewport.0, viewport.1);
            if let Some(pan) = current.pan.as_mut() {
                pan.drag_to(&mut current.view, &fit, screen_x, screen_y);
            }
        }
    }

    pub fn end_pan(&mut self) {
        if let Some(current) = self.current.as_mut() {
            current.pan = None;
        }
    }

    /// Map a screen position to image pixel coordinates for the current view.
    pub fn screen_to_image(&self, screen_x: f64, screen_y: f64, viewport: (f64, f64)) -> Option<Point> {
        let view = self.view()?;
        let fit: Fit = view.fit(viewport.0, viewport.1);
        let (x, y) = fit.screen_to_scene(screen_x, screen_y);
        Some(Point::new(x.floor() as i32, y.floor() as i32))
    }

    /// Display list for the open image.
    pub fn render(&self) -> Vec<DrawCommand> {
        match self.current.as_ref() {
            Some(current) => editor::render(&current.editor, current.image.store()),
            None => Vec::new(),
        }
    }

    fn current_mut(&mut self) -> Result<&mut OpenImage, SessionError> {
        self.current.as_mut().ok_or(SessionError::NoImage)
    }
}

impl OpenImage {
    /// Mirror a store change into the label list.
    fn track(&mut self, outcome: &EditOutcome) {
        if let EditOutcome::Added {
            change: Some(change),
            ..
        } = outcome
        {
            self.labels.apply(change);
        }
        debug_assert!(self.labels.matches(self.image.store()));
    }
}

fn dump_image(image: &AnnotatedImage) -> String {
    let store = image.store();
    let (width, height) = image.dimensions();
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} ({}x{}, {} annotations)",
        image.path().display(),
        width,
        height,
        store.len()
    );
    for (i, annotation) in store.annotations().iter().enumerate() {
        let (x1, y1, x2, y2) = annotation.bbox.as_tuple();
        let _ = writeln!(
            out,
            "  [{}] {} ({}, {}, {}, {})",
            i, annotation.label, x1, y1, x2, y2
        );
    }
    for (label, color) in store.label_colors() {
        let shown = if store.is_visible(label) { "" } else { " (hidden)" };
        let _ = writeln!(out, "  {} = {}{}", label, color, shown);
    }
    out
}
