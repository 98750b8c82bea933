//! Label filter panel projection.
//!
//! The filter panel shows one checkable entry per label in the open image's
//! store. It owns no annotation data; the store's [`LabelChange`] events keep
//! it in step, and checking or unchecking an entry yields a visibility change
//! for the caller to forward to [`AnnotationStore::set_visible`].
//!
//! [`AnnotationStore::set_visible`]: crate::model::AnnotationStore::set_visible

use crate::model::{AnnotationStore, Color, LabelChange};

/// Receiver of label bookkeeping from the annotation store.
pub trait LabelFilter {
    /// A label got its first annotation. New entries start checked.
    fn add_label(&mut self, label: &str, color: Color);

    /// The last annotation with this label went away.
    fn remove_label(&mut self, label: &str);

    /// Every label went away.
    fn reset_all(&mut self);

    /// Dispatch a store event to the matching callback.
    fn apply(&mut self, change: &LabelChange) {
        match change {
            LabelChange::Added { label, color } => self.add_label(label, *color),
            LabelChange::Removed { label } => self.remove_label(label),
            LabelChange::Cleared => self.reset_all(),
        }
    }
}

/// One row of the filter panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelEntry {
    pub label: String,
    pub color: Color,
    pub checked: bool,
}

/// Checkable label list in order of first use.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelList {
    entries: Vec<LabelEntry>,
}

impl LabelList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the list for a freshly loaded store.
    pub fn from_store(store: &AnnotationStore) -> Self {
        let mut list = Self::new();
        for (label, color) in store.label_colors() {
            list.add_label(label, color);
            if let Some(entry) = list.entry_mut(label) {
                entry.checked = store.is_visible(label);
            }
        }
        list
    }

    /// Set an entry's check state.
    ///
    /// Returns the visibility to apply to the store, or `None` when the label
    /// has no entry or the state didn't change.
    pub fn set_checked(&mut self, label: &str, checked: bool) -> Option<bool> {
        let entry = self.entry_mut(label)?;
        if entry.checked == checked {
            return None;
        }
        entry.checked = checked;
        log::debug!("Label '{}' {}", label, if checked { "shown" } else { "hidden" });
        Some(checked)
    }

    /// Flip an entry's check state and return the new visibility.
    pub fn toggle(&mut self, label: &str) -> Option<bool> {
        let checked = self.entry(label)?.checked;
        self.set_checked(label, !checked)
    }

    pub fn entries(&self) -> &[LabelEntry] {
        &self.entries
    }

    pub fn entry(&self, label: &str) -> Option<&LabelEntry> {
        self.entries.iter().find(|e| e.label == label)
    }

    fn entry_mut(&mut self, label: &str) -> Option<&mut LabelEntry> {
        self.entries.iter_mut().find(|e| e.label == label)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when the list mirrors the store's labels, colors and visibility.
    pub fn matches(&self, store: &AnnotationStore) -> bool {
        self.entries.len() == store.label_count()
            && self.entries.iter().all(|e| {
                store.color(&e.label) == Some(e.color) && store.is_visible(&e.label) == e.checked
            })
    }
}

impl LabelFilter for LabelList {
    fn add_label(&mut self, label: &str, color: Color) {
        if let Some(entry) = self.entry_mut(label) {
            log::warn!("Label '{}' already listed, updating its color", label);
            entry.color = color;
            return;
        }
        self.entries.push(LabelEntry {
            label: label.to_string(),
            color,
            checked: true,
        });
    }

    fn remove_label(&mut self, label: &str) {
        self.entries.retain(|e| e.label != label);
    }

    fn reset_all(&mut self) {
        self.entries.clear();
    }
}
