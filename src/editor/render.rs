//! Display list derived from editor and store state.
//!
//! The list is toolkit independent: a front end paints the commands in order
//! on top of the image, in image pixel coordinates.

use crate::model::{AnnotationStore, BoundingBox, Color, Point};

use super::{DrawPhase, EditMode, Editor};

/// Color of the live preview and guidelines.
pub const PREVIEW_COLOR: Color = Color::new(255, 0, 0);

/// One primitive to paint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawCommand {
    /// Rectangle outline, optionally filled with a translucent tint.
    Rect {
        bbox: BoundingBox,
        color: Color,
        filled: bool,
    },
    /// Text anchored at its bottom-left corner.
    Caption {
        text: String,
        anchor: Point,
        color: Color,
    },
    /// Full-width line at `y`.
    HorizontalLine { y: i32, color: Color },
    /// Full-height line at `x`.
    VerticalLine { x: i32, color: Color },
}

/// Build the display list for the current state.
///
/// Every visible annotation becomes an outline plus a caption at the box's
/// bottom-left corner. Draw mode adds a crosshair through the pointer, and a
/// filled preview while a drag or its prompts are in progress.
pub fn render(editor: &Editor, store: &AnnotationStore) -> Vec<DrawCommand> {
    let mut commands = Vec::new();

    for annotation in store.visible_annotations() {
        let Some(color) = store.color(&annotation.label) else {
            continue;
        };
        commands.push(DrawCommand::Rect {
            bbox: annotation.bbox,
            color,
            filled: false,
        });
        commands.push(DrawCommand::Caption {
            text: annotation.label.clone(),
            anchor: Point::new(annotation.bbox.left(), annotation.bbox.bottom()),
            color,
        });
    }

    if editor.mode() != EditMode::Draw {
        return commands;
    }

    if let Some(pointer) = editor.pointer() {
        commands.push(DrawCommand::HorizontalLine {
            y: pointer.y,
            color: PREVIEW_COLOR,
        });
        commands.push(DrawCommand::VerticalLine {
            x: pointer.x,
            color: PREVIEW_COLOR,
        });
    }

    let preview = match (editor.phase(), editor.pending()) {
        (DrawPhase::Drawing { start, end }, _) => Some(BoundingBox::from_corners(start, end)),
        (DrawPhase::Idle, Some(pending)) => Some(pending.bbox()),
        (DrawPhase::Idle, None) => None,
    };
    if let Some(bbox) = preview {
        commands.push(DrawCommand::Rect {
            bbox,
            color: PREVIEW_COLOR,
            filled: true,
        });
    }

    commands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::{ImageBounds, PointerButton};

    const BLUE: Color = Color::new(0, 0, 255);

    fn store_with_two_labels() -> AnnotationStore {
        let mut store = AnnotationStore::new();
        store
            .add_annotation("cat", BoundingBox::new(10, 10, 50, 60), Some(BLUE))
            .unwrap();
        store
            .add_annotation("dog", BoundingBox::new(5, 5, 20, 20), Some(PREVIEW_COLOR))
            .unwrap();
        store
    }

    #[test]
    fn test_view_mode_draws_visible_annotations() {
        let editor = Editor::new(ImageBounds::new(0, 0, 100, 100));
        let mut store = store_with_two_labels();
        store.set_visible("dog", false);

        let commands = render(&editor, &store);
        assert_eq!(
            commands,
            vec![
                DrawCommand::Rect {
                    bbox: BoundingBox::new(10, 10, 50, 60),
                    color: BLUE,
                    filled: false
                },
                DrawCommand::Caption {
                    text: "cat".into(),
                    anchor: Point::new(10, 60),
                    color: BLUE
                },
            ]
        );
    }

    #[test]
    fn test_draw_mode_adds_guidelines_and_preview() {
        let mut editor = Editor::new(ImageBounds::new(0, 0, 100, 100));
        editor.set_mode(EditMode::Draw);
        let store = AnnotationStore::new();

        editor.pointer_move(Point::new(30, 40), false);
        let commands = render(&editor, &store);
        assert_eq!(commands.len(), 2);
        assert!(commands.contains(&DrawCommand::HorizontalLine {
            y: 40,
            color: PREVIEW_COLOR
        }));

        editor.pointer_down(Point::new(30, 40), PointerButton::Primary);
        editor.pointer_move(Point::new(120, 80), true);
        let commands = render(&editor, &store);
        assert_eq!(
            commands.last(),
            Some(&DrawCommand::Rect {
                bbox: BoundingBox::new(30, 40, 100, 80),
                color: PREVIEW_COLOR,
                filled: true
            })
        );
    }

    #[test]
    fn test_preview_stays_while_prompt_open() {
        let mut editor = Editor::new(ImageBounds::new(0, 0, 100, 100));
        editor.set_mode(EditMode::Draw);
        editor.pointer_down(Point::new(30, 40), PointerButton::Primary);
        editor.pointer_move(Point::new(60, 80), true);
        editor.pointer_up(PointerButton::Primary);

        let commands = render(&editor, &AnnotationStore::new());
        assert!(matches!(
            commands.last(),
            Some(DrawCommand::Rect { filled: true, .. })
        ));
    }
}
