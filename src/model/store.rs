//! Per-image annotation record store.
//!
//! The store owns the ordered annotation list together with the label → color
//! and label → visibility maps, and keeps them consistent on every mutation:
//!
//! - every label with at least one annotation has exactly one color,
//! - no color outlives the last annotation using its label,
//! - a visibility entry exists iff a color entry exists.
//!
//! Mutations report label bookkeeping as [`LabelChange`] values so the caller
//! can keep a label filter panel in step.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use super::annotation::{Annotation, BoundingBox};
use super::color::Color;

/// Label bookkeeping produced by a store mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelChange {
    /// A label got its first annotation.
    Added { label: String, color: Color },
    /// The last annotation using this label went away.
    Removed { label: String },
    /// Every label went away.
    Cleared,
}

/// Errors raised by store mutations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A new label was added without choosing a color for it
    #[error("Label '{label}' is new and needs a color")]
    MissingColor {
        /// The label lacking a color
        label: String,
    },
}

/// Result of undoing the most recent annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Undone {
    /// The annotation that was removed.
    pub annotation: Annotation,
    /// Set when the removed annotation was the last one with its label.
    pub change: Option<LabelChange>,
}

/// Annotations of a single image plus label colors and visibility.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationStore {
    annotations: Vec<Annotation>,
    label_colors: HashMap<String, Color>,
    visible: HashMap<String, bool>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from persisted annotations and colors.
    ///
    /// Every annotation label must have a color. Colors for labels without
    /// annotations are dropped. All labels start visible.
    pub fn restore(
        annotations: Vec<Annotation>,
        colors: impl IntoIterator<Item = (String, Color)>,
    ) -> Result<Self, StoreError> {
        let mut colors: HashMap<String, Color> = colors.into_iter().collect();
        let used: HashSet<&str> = annotations.iter().map(|a| a.label.as_str()).collect();

        if let Some(missing) = used.iter().find(|label| !colors.contains_key(**label)) {
            return Err(StoreError::MissingColor {
                label: missing.to_string(),
            });
        }

        colors.retain(|label, _| {
            let keep = used.contains(label.as_str());
            if !keep {
                log::warn!("Dropping color for label '{}' without annotations", label);
            }
            keep
        });

        let visible = colors.keys().map(|label| (label.clone(), true)).collect();
        Ok(Self {
            annotations,
            label_colors: colors,
            visible,
        })
    }

    /// Append an annotation.
    ///
    /// For a label seen for the first time `color` is required and registered
    /// together with a visible entry; for known labels the stored color is
    /// reused and `color` is ignored.
    pub fn add_annotation(
        &mut self,
        label: impl Into<String>,
        bbox: BoundingBox,
        color: Option<Color>,
    ) -> Result<Option<LabelChange>, StoreError> {
        let label = label.into();
        let change = if self.label_colors.contains_key(&label) {
            None
        } else {
            let color = color.ok_or_else(|| StoreError::MissingColor {
                label: label.clone(),
            })?;
            self.label_colors.insert(label.clone(), color);
            self.visible.insert(label.clone(), true);
            Some(LabelChange::Added {
                label: label.clone(),
                color,
            })
        };

        log::debug!("➕ Annotation '{}' at {:?}", label, bbox.as_tuple());
        self.annotations.push(Annotation::new(label, bbox));
        Ok(change)
    }

    /// Remove the most recently added annotation. Returns `None` when empty.
    pub fn undo_last(&mut self) -> Option<Undone> {
        let annotation = self.annotations.pop()?;
        log::debug!("⏪ Undo annotation '{}'", annotation.label);

        let still_used = self.annotations.iter().any(|a| a.label == annotation.label);
        let change = if still_used {
            None
        } else {
            self.label_colors.remove(&annotation.label);
            self.visible.remove(&annotation.label);
            Some(LabelChange::Removed {
                label: annotation.label.clone(),
            })
        };

        Some(Undone { annotation, change })
    }

    /// Drop every annotation, color and visibility entry.
    pub fn reset_all(&mut self) -> LabelChange {
        log::debug!("🗑️ Reset {} annotations", self.annotations.len());
        self.annotations.clear();
        self.label_colors.clear();
        self.visible.clear();
        LabelChange::Cleared
    }

    /// Set visibility of a label. Returns `false` for unknown labels.
    pub fn set_visible(&mut self, label: &str, value: bool) -> bool {
        match self.visible.get_mut(label) {
            Some(entry) => {
                *entry = value;
                true
            }
            None => {
                log::warn!("Visibility change for unknown label '{}'", label);
                false
            }
        }
    }

    /// All annotations in drawing order.
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Annotations whose label is currently visible, in drawing order.
    pub fn visible_annotations(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations
            .iter()
            .filter(|a| self.is_visible(&a.label))
    }

    pub fn color(&self, label: &str) -> Option<Color> {
        self.label_colors.get(label).copied()
    }

    pub fn is_visible(&self, label: &str) -> bool {
        self.visible.get(label).copied().unwrap_or(false)
    }

    pub fn contains_label(&self, label: &str) -> bool {
        self.label_colors.contains_key(label)
    }

    /// Distinct labels in order of first use.
    pub fn labels(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.annotations
            .iter()
            .map(|a| a.label.as_str())
            .filter(|label| seen.insert(*label))
            .collect()
    }

    /// Label colors in order of first use.
    pub fn label_colors(&self) -> Vec<(&str, Color)> {
        self.labels()
            .into_iter()
            .filter_map(|label| self.color(label).map(|c| (label, c)))
            .collect()
    }

    /// Number of distinct labels.
    pub fn label_count(&self) -> usize {
        self.label_colors.len()
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// Check the label bookkeeping against the annotation list.
    pub fn invariants_hold(&self) -> bool {
        let used: HashSet<&str> = self.annotations.iter().map(|a| a.label.as_str()).collect();
        let colored: HashSet<&str> = self.label_colors.keys().map(String::as_str).collect();
        let tracked: HashSet<&str> = self.visible.keys().map(String::as_str).collect();
        used == colored && colored == tracked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Color = Color::new(255, 0, 0);
    const GREEN: Color = Color::new(0, 255, 0);

    fn bbox(x1: i32, y1: i32, x2: i32, y2: i32) -> BoundingBox {
        BoundingBox::new(x1, y1, x2, y2)
    }

    #[test]
    fn test_first_label_registers_color() {
        let mut store = AnnotationStore::new();
        let change = store
            .add_annotation("cat", bbox(10, 10, 50, 60), Some(RED))
            .unwrap();

        assert_eq!(
            change,
            Some(LabelChange::Added {
                label: "cat".into(),
                color: RED
            })
        );
        assert_eq!(store.color("cat"), Some(RED));
        assert!(store.is_visible("cat"));
        assert!(store.invariants_hold());
    }

    #[test]
    fn test_repeat_label_reuses_color() {
        let mut store = AnnotationStore::new();
        store
            .add_annotation("cat", bbox(10, 10, 50, 60), Some(RED))
            .unwrap();
        let change = store
            .add_annotation("cat", bbox(0, 0, 5, 5), Some(GREEN))
            .unwrap();

        assert_eq!(change, None);
        assert_eq!(store.color("cat"), Some(RED));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_new_label_without_color_is_rejected() {
        let mut store = AnnotationStore::new();
        let err = store
            .add_annotation("cat", bbox(0, 0, 1, 1), None)
            .unwrap_err();

        assert_eq!(err, StoreError::MissingColor { label: "cat".into() });
        assert!(store.is_empty());
        assert!(store.invariants_hold());
    }

    #[test]
    fn test_undo_unwinds_one_step() {
        let mut store = AnnotationStore::new();
        store
            .add_annotation("dog", bbox(1, 1, 10, 10), Some(GREEN))
            .unwrap();
        store
            .add_annotation("dog", bbox(20, 20, 40, 40), None)
            .unwrap();

        let first = store.undo_last().unwrap();
        assert_eq!(first.annotation.bbox, bbox(20, 20, 40, 40));
        assert_eq!(first.change, None);
        assert_eq!(store.len(), 1);
        assert_eq!(store.color("dog"), Some(GREEN));

        let second = store.undo_last().unwrap();
        assert_eq!(
            second.change,
            Some(LabelChange::Removed { label: "dog".into() })
        );
        assert_eq!(store.color("dog"), None);
        assert!(!store.is_visible("dog"));
        assert!(store.invariants_hold());
    }

    #[test]
    fn test_undo_on_empty_is_noop() {
        let mut store = AnnotationStore::new();
        assert!(store.undo_last().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut store = AnnotationStore::new();
        store.add_annotation("cat", bbox(0, 0, 1, 1), Some(RED)).unwrap();
        store.add_annotation("dog", bbox(0, 0, 2, 2), Some(GREEN)).unwrap();

        assert_eq!(store.reset_all(), LabelChange::Cleared);
        assert!(store.annotations().is_empty());
        assert_eq!(store.label_count(), 0);
        assert!(store.labels().is_empty());
        assert!(store.invariants_hold());
    }

    #[test]
    fn test_visibility_filtering() {
        let mut store = AnnotationStore::new();
        store.add_annotation("cat", bbox(0, 0, 1, 1), Some(RED)).unwrap();
        store.add_annotation("dog", bbox(0, 0, 2, 2), Some(GREEN)).unwrap();
        store.add_annotation("cat", bbox(0, 0, 3, 3), None).unwrap();

        assert!(store.set_visible("cat", false));
        let shown: Vec<_> = store.visible_annotations().map(|a| a.label.as_str()).collect();
        assert_eq!(shown, vec!["dog"]);

        assert!(!store.set_visible("bird", false));
    }

    #[test]
    fn test_label_colors_in_first_use_order() {
        let mut store = AnnotationStore::new();
        store.add_annotation("zebra", bbox(0, 0, 1, 1), Some(RED)).unwrap();
        store.add_annotation("ant", bbox(0, 0, 1, 1), Some(GREEN)).unwrap();
        store.add_annotation("zebra", bbox(0, 0, 1, 1), None).unwrap();

        assert_eq!(store.label_colors(), vec![("zebra", RED), ("ant", GREEN)]);
    }

    #[test]
    fn test_restore_requires_colors() {
        let annotations = vec![Annotation::new("cat", bbox(0, 0, 1, 1))];
        let err = AnnotationStore::restore(annotations, Vec::new()).unwrap_err();
        assert_eq!(err, StoreError::MissingColor { label: "cat".into() });
    }

    #[test]
    fn test_restore_drops_orphan_colors() {
        let annotations = vec![Annotation::new("cat", bbox(0, 0, 1, 1))];
        let store = AnnotationStore::restore(
            annotations,
            vec![("cat".to_string(), RED), ("ghost".to_string(), GREEN)],
        )
        .unwrap();

        assert!(store.contains_label("cat"));
        assert!(!store.contains_label("ghost"));
        assert!(store.is_visible("cat"));
        assert!(store.invariants_hold());
    }

    #[test]
    fn test_invariants_over_operation_stream() {
        // Deterministic pseudo-random stream of adds, undos and resets
        let labels = ["cat", "dog", "bird"];
        let mut store = AnnotationStore::new();
        let mut seed: u32 = 0x2545_f491;

        for step in 0..500 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let roll = (seed >> 16) % 10;
            match roll {
                0..=5 => {
                    let label = labels[(seed as usize >> 8) % labels.len()];
                    let color = Color::suggest(step);
                    store
                        .add_annotation(label, bbox(0, 0, step as i32, 1), Some(color))
                        .unwrap();
                }
                6..=8 => {
                    store.undo_last();
                }
                _ => {
                    store.reset_all();
                }
            }
            assert!(store.invariants_hold(), "invariants broken at step {}", step);
        }
    }
}
