//! Annotation value types: points, bounding boxes and labeled annotations.

use serde::{Deserialize, Serialize};

/// A position in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned box given by two corners, `(x1, y1)` and `(x2, y2)`.
///
/// Corners are stored as given. A box drawn right-to-left keeps `x1 > x2`
/// unless it was built with [`BoundingBox::normalized`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoundingBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Box spanned by two corner points, keeping the draw direction.
    pub fn from_corners(start: Point, end: Point) -> Self {
        Self::new(start.x, start.y, end.x, end.y)
    }

    /// The same box with `x1 <= x2` and `y1 <= y2`.
    pub fn normalized(&self) -> Self {
        Self {
            x1: self.x1.min(self.x2),
            y1: self.y1.min(self.y2),
            x2: self.x1.max(self.x2),
            y2: self.y1.max(self.y2),
        }
    }

    /// Check whether the corners are already in min/max order.
    pub fn is_normalized(&self) -> bool {
        self.x1 <= self.x2 && self.y1 <= self.y2
    }

    /// Left edge regardless of draw direction.
    pub fn left(&self) -> i32 {
        self.x1.min(self.x2)
    }

    /// Bottom edge (largest y) regardless of draw direction.
    pub fn bottom(&self) -> i32 {
        self.y1.max(self.y2)
    }

    pub fn width(&self) -> i32 {
        (self.x2 - self.x1).abs()
    }

    pub fn height(&self) -> i32 {
        (self.y2 - self.y1).abs()
    }

    /// Corners as `(xmin, ymin, xmax, ymax)` in storage order.
    pub fn as_tuple(&self) -> (i32, i32, i32, i32) {
        (self.x1, self.y1, self.x2, self.y2)
    }
}

impl From<(i32, i32, i32, i32)> for BoundingBox {
    fn from((x1, y1, x2, y2): (i32, i32, i32, i32)) -> Self {
        Self::new(x1, y1, x2, y2)
    }
}

/// One labeled rectangular region on an image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub label: String,
    pub bbox: BoundingBox,
}

impl Annotation {
    pub fn new(label: impl Into<String>, bbox: BoundingBox) -> Self {
        Self {
            label: label.into(),
            bbox,
        }
    }
}

/// Check whether `label` can be persisted as an XML attribute name.
///
/// Labels end up as attribute names in `color_dict`, so they must be XML 1.0
/// names without `:` and must not start with the reserved `xml` prefix.
pub fn is_valid_label(label: &str) -> bool {
    let mut chars = label.chars();
    match chars.next() {
        Some(c) if is_name_start_char(c) => {}
        _ => return false,
    }
    if !chars.all(is_name_char) {
        return false;
    }
    !label
        .get(..3)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("xml"))
}

/// XML 1.0 `NameStartChar`, minus `:`.
fn is_name_start_char(c: char) -> bool {
    matches!(c,
        'A'..='Z'
        | '_'
        | 'a'..='z'
        | '\u{C0}'..='\u{D6}'
        | '\u{D8}'..='\u{F6}'
        | '\u{F8}'..='\u{2FF}'
        | '\u{370}'..='\u{37D}'
        | '\u{37F}'..='\u{1FFF}'
        | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}'
        | '\u{2C00}'..='\u{2FEF}'
        | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}'
        | '\u{FDF0}'..='\u{FFFD}'
        | '\u{10000}'..='\u{EFFFF}')
}

/// XML 1.0 `NameChar`, minus `:`.
fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9' | '\u{B7}' | '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_corners_keeps_direction() {
        let bbox = BoundingBox::from_corners(Point::new(50, 80), Point::new(10, 20));
        assert_eq!(bbox.as_tuple(), (50, 80, 10, 20));
        assert!(!bbox.is_normalized());
    }

    #[test]
    fn test_normalized() {
        let bbox = BoundingBox::new(50, 20, 10, 80).normalized();
        assert_eq!(bbox.as_tuple(), (10, 20, 50, 80));
        assert!(bbox.is_normalized());
        assert_eq!(bbox.width(), 40);
        assert_eq!(bbox.height(), 60);
    }

    #[test]
    fn test_caption_anchor_edges() {
        // Drawn bottom-right to top-left
        let bbox = BoundingBox::new(90, 70, 30, 10);
        assert_eq!(bbox.left(), 30);
        assert_eq!(bbox.bottom(), 70);
    }

    #[test]
    fn test_valid_labels() {
        assert!(is_valid_label("cat"));
        assert!(is_valid_label("traffic_light"));
        assert!(is_valid_label("_hidden"));
        assert!(is_valid_label("car-2.b"));
        assert!(is_valid_label("ñandú"));
    }

    #[test]
    fn test_invalid_labels() {
        assert!(!is_valid_label(""));
        assert!(!is_valid_label("2cats"));
        assert!(!is_valid_label("stop sign"));
        assert!(!is_valid_label("a=b"));
        assert!(!is_valid_label("ns:tag"));
        assert!(!is_valid_label("a\u{B2}"));
        assert!(!is_valid_label("x\u{BD}"));
        assert!(!is_valid_label("xmlns"));
        assert!(!is_valid_label("XMLdata"));
        assert!(!is_valid_label("\u{B7}dot"));
    }

    #[test]
    fn test_xml_name_chars_accepted() {
        assert!(is_valid_label("caf\u{E9}"));
        assert!(is_valid_label("a\u{B7}b"));
        assert!(is_valid_label("e\u{301}"));
        assert!(is_valid_label("x\u{203F}y"));
        assert!(is_valid_label("xm"));
        assert!(is_valid_label("boxml"));
    }
}
