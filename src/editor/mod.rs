//! Edit state machine for drawing bounding boxes.
//!
//! The editor has two modes. [`EditMode::View`] ignores the primary button
//! and leaves panning to the view transform. [`EditMode::Draw`] tracks the
//! pointer for guidelines and turns a primary-button drag into a box.
//!
//! Finishing a drag doesn't add anything yet. The editor first asks for a
//! label and, if the label is new, for a color. While one of those prompts is
//! open every pointer event is ignored. Cancelling either prompt drops the box
//! without touching the store.
//!
//! Prompts can be driven two ways:
//! - step by step: [`Editor::pointer_up`] returns [`EditOutcome::LabelRequested`],
//!   the caller answers with [`Editor::submit_label`] and possibly
//!   [`Editor::submit_color`],
//! - synchronously: [`Editor::pointer_up_with`] runs both steps against a
//!   [`Prompt`] implementation.

mod clamp;
pub mod render;

use thiserror::Error;

use crate::model::{
    Annotation, AnnotationStore, BoundingBox, Color, LabelChange, Point, StoreError, Undone,
    is_valid_label,
};

pub use clamp::ImageBounds;
pub use render::{DrawCommand, render};

/// Errors raised while editing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    /// A new label reached the store without a color
    #[error("Label '{label}' is new and needs a color")]
    MissingColor {
        /// The label lacking a color
        label: String,
    },
}

impl From<StoreError> for EditError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::MissingColor { label } => EditError::MissingColor { label },
        }
    }
}

/// Interaction mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditMode {
    #[default]
    View,
    Draw,
}

/// Pointer buttons the editor distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    /// Draws boxes in draw mode.
    Primary,
    /// Pans in view mode.
    Secondary,
}

/// Sub-state of a box drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawPhase {
    #[default]
    Idle,
    /// The pointer moved with the primary button held since the press.
    Drawing { start: Point, end: Point },
}

/// A finished drag waiting on user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pending {
    AwaitingLabel {
        bbox: BoundingBox,
    },
    AwaitingColor {
        bbox: BoundingBox,
        label: String,
        suggested: Color,
    },
}

impl Pending {
    pub fn bbox(&self) -> BoundingBox {
        match self {
            Pending::AwaitingLabel { bbox } | Pending::AwaitingColor { bbox, .. } => *bbox,
        }
    }
}

/// Result of feeding an event to the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// The event didn't apply in the current state.
    Ignored,
    /// Internal state changed; redraw.
    Updated,
    /// A drag finished; ask the user for a label.
    LabelRequested,
    /// The label is new; ask the user for its color.
    ColorRequested { label: String, suggested: Color },
    /// An annotation was stored.
    Added {
        annotation: Annotation,
        change: Option<LabelChange>,
    },
    /// A prompt was cancelled; nothing was stored.
    Cancelled,
}

/// Source of answers for the label and color prompts.
///
/// Returning `None` cancels the pending box.
pub trait Prompt {
    fn request_label(&mut self) -> Option<String>;

    /// Ask for the color of a label seen for the first time.
    fn request_color(&mut self, label: &str, suggested: Color) -> Option<Color>;
}

/// The box editing state machine for one image.
#[derive(Debug, Clone)]
pub struct Editor {
    mode: EditMode,
    bounds: ImageBounds,
    normalize_boxes: bool,
    press: Option<Point>,
    phase: DrawPhase,
    pointer: Option<Point>,
    pending: Option<Pending>,
}

impl Editor {
    pub fn new(bounds: ImageBounds) -> Self {
        Self {
            mode: EditMode::default(),
            bounds,
            normalize_boxes: true,
            press: None,
            phase: DrawPhase::Idle,
            pointer: None,
            pending: None,
        }
    }

    /// Store boxes in min/max corner order (default) or in draw direction.
    pub fn with_normalize_boxes(mut self, normalize: bool) -> Self {
        self.normalize_boxes = normalize;
        self
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn phase(&self) -> DrawPhase {
        self.phase
    }

    pub fn bounds(&self) -> ImageBounds {
        self.bounds
    }

    /// Pointer position tracked for guidelines, draw mode only.
    pub fn pointer(&self) -> Option<Point> {
        self.pointer
    }

    pub fn pending(&self) -> Option<&Pending> {
        self.pending.as_ref()
    }

    /// True while a prompt is open and pointer input is ignored.
    pub fn is_awaiting_input(&self) -> bool {
        self.pending.is_some()
    }

    /// Switch modes.
    ///
    /// Leaving draw mode stops guideline tracking. A drag in progress is kept
    /// and resumes if draw mode is entered again before the button is released.
    pub fn set_mode(&mut self, mode: EditMode) {
        if self.mode == mode {
            return;
        }
        log::debug!("✏️ Edit mode {:?} -> {:?}", self.mode, mode);
        self.mode = mode;
        if mode == EditMode::View {
            self.pointer = None;
        }
    }

    pub fn pointer_down(&mut self, pos: Point, button: PointerButton) -> EditOutcome {
        if self.pending.is_some() || self.mode != EditMode::Draw {
            return EditOutcome::Ignored;
        }
        self.pointer = Some(pos);
        if button != PointerButton::Primary {
            return EditOutcome::Updated;
        }
        self.press = Some(pos);
        EditOutcome::Updated
    }

    /// Pointer moved. `primary_held` tells whether the primary button is down.
    pub fn pointer_move(&mut self, pos: Point, primary_held: bool) -> EditOutcome {
        if self.pending.is_some() || self.mode != EditMode::Draw {
            return EditOutcome::Ignored;
        }
        self.pointer = Some(pos);

        if primary_held {
            let start = match self.phase {
                DrawPhase::Drawing { start, .. } => Some(start),
                DrawPhase::Idle => self.press,
            };
            if let Some(start) = start {
                self.phase = DrawPhase::Drawing {
                    start,
                    end: self.bounds.clamp(pos),
                };
            }
        }
        EditOutcome::Updated
    }

    /// Primary button released. Finishing a drag opens the label prompt.
    pub fn pointer_up(&mut self, button: PointerButton) -> EditOutcome {
        if self.pending.is_some() || button != PointerButton::Primary {
            return EditOutcome::Ignored;
        }
        self.press = None;
        let DrawPhase::Drawing { start, end } = std::mem::take(&mut self.phase) else {
            return EditOutcome::Ignored;
        };
        if self.mode != EditMode::Draw {
            log::debug!("Drag released outside draw mode, dropped");
            return EditOutcome::Updated;
        }

        let bbox = BoundingBox::from_corners(start, end);
        let bbox = if self.normalize_boxes {
            bbox.normalized()
        } else {
            bbox
        };
        self.pending = Some(Pending::AwaitingLabel { bbox });
        EditOutcome::LabelRequested
    }

    /// Answer the label prompt. `None` cancels.
    ///
    /// Labels are trimmed. An empty label or one that can't be stored as an
    /// XML attribute name is treated as a cancel.
    pub fn submit_label(
        &mut self,
        label: Option<String>,
        store: &mut AnnotationStore,
    ) -> Result<EditOutcome, EditError> {
        let Some(Pending::AwaitingLabel { bbox }) = self.pending else {
            return Ok(EditOutcome::Ignored);
        };

        let Some(label) = label.map(|l| l.trim().to_string()) else {
            return Ok(self.cancel());
        };
        if !is_valid_label(&label) {
            log::warn!("Rejected label '{}'", label);
            return Ok(self.cancel());
        }

        if store.contains_label(&label) {
            self.pending = None;
            return self.add(store, label, bbox, None);
        }

        let suggested = Color::suggest(store.label_count());
        self.pending = Some(Pending::AwaitingColor {
            bbox,
            label: label.clone(),
            suggested,
        });
        Ok(EditOutcome::ColorRequested { label, suggested })
    }

    /// Answer the color prompt. `None` cancels.
    pub fn submit_color(
        &mut self,
        color: Option<Color>,
        store: &mut AnnotationStore,
    ) -> Result<EditOutcome, EditError> {
        if !matches!(self.pending, Some(Pending::AwaitingColor { .. })) {
            return Ok(EditOutcome::Ignored);
        }
        let Some(color) = color else {
            return Ok(self.cancel());
        };
        let Some(Pending::AwaitingColor { bbox, label, .. }) = self.pending.take() else {
            return Ok(EditOutcome::Ignored);
        };
        self.add(store, label, bbox, Some(color))
    }

    /// Release the primary button and answer the prompts right away.
    pub fn pointer_up_with(
        &mut self,
        button: PointerButton,
        prompt: &mut impl Prompt,
        store: &mut AnnotationStore,
    ) -> Result<EditOutcome, EditError> {
        let outcome = self.pointer_up(button);
        if outcome != EditOutcome::LabelRequested {
            return Ok(outcome);
        }

        match self.submit_label(prompt.request_label(), store)? {
            EditOutcome::ColorRequested { label, suggested } => {
                let color = prompt.request_color(&label, suggested);
                self.submit_color(color, store)
            }
            outcome => Ok(outcome),
        }
    }

    /// Remove the last annotation. Works in any mode or phase.
    pub fn undo(&mut self, store: &mut AnnotationStore) -> Option<Undone> {
        store.undo_last()
    }

    /// Remove every annotation. Works in any mode or phase.
    pub fn reset(&mut self, store: &mut AnnotationStore) -> LabelChange {
        store.reset_all()
    }

    fn cancel(&mut self) -> EditOutcome {
        log::debug!("Prompt cancelled, box dropped");
        self.pending = None;
        EditOutcome::Cancelled
    }

    fn add(
        &mut self,
        store: &mut AnnotationStore,
        label: String,
        bbox: BoundingBox,
        color: Option<Color>,
    ) -> Result<EditOutcome, EditError> {
        let change = store.add_annotation(label.clone(), bbox, color)?;
        Ok(EditOutcome::Added {
            annotation: Annotation::new(label, bbox),
            change,
        })
    }
}
