//! Row selection state.
//!
//! Selection is tracked by row id so it survives sorting, filtering and page
//! changes. The header checkbox state is derived from the *visible* page ids
//! only; rows selected on other pages stay selected but do not count.

use std::collections::HashSet;

/// Tri-state of the header checkbox for the visible page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeaderState {
    /// Every visible row is selected (and the page is not empty).
    pub all_selected: bool,
    /// At least one, but not every, visible row is selected.
    pub some_selected: bool,
}

/// ID-based row selection.
#[derive(Debug, Clone)]
pub struct SelectionManager {
    /// Currently selected row ids.
    selected: HashSet<String>,
    /// Anchor for range selection (shift-click starting point).
    anchor: Option<String>,
    enabled: bool,
    /// Caller key; a change clears the selection.
    reset_key: Option<String>,
}

impl Default for SelectionManager {
    fn default() -> Self {
        Self::new(true)
    }
}

impl SelectionManager {
    /// Creates an empty selection.
    pub fn new(enabled: bool) -> Self {
        Self {
            selected: HashSet::new(),
            anchor: None,
            enabled,
            reset_key: None,
        }
    }

    /// Returns `true` if row selection is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enables or disables selection. Disabling clears everything.
    ///
    /// Returns `true` if the selected set changed.
    pub fn set_enabled(&mut self, enabled: bool) -> bool {
        self.enabled = enabled;
        if !enabled {
            return !self.clear().is_empty();
        }
        false
    }

    /// Updates the caller's reset key; a different key clears the selection.
    ///
    /// Returns `true` if the selected set changed.
    pub fn set_reset_key(&mut self, key: Option<String>) -> bool {
        if self.reset_key == key {
            return false;
        }
        self.reset_key = key;
        !self.clear().is_empty()
    }

    /// Get all selected IDs (sorted for deterministic ordering).
    pub fn selected(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.selected.iter().cloned().collect();
        ids.sort();
        ids
    }

    /// Check if an ID is selected.
    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Clear all selection.
    /// Returns the IDs that were deselected.
    pub fn clear(&mut self) -> Vec<String> {
        self.anchor = None;
        self.selected.drain().collect()
    }

    /// Toggle selection of an ID.
    /// Returns (added, removed) IDs.
    pub fn toggle(&mut self, id: &str) -> (Vec<String>, Vec<String>) {
        if !self.enabled {
            return (vec![], vec![]);
        }
        self.anchor = Some(id.to_string());
        if self.selected.remove(id) {
            (vec![], vec![id.to_string()])
        } else {
            self.selected.insert(id.to_string());
            (vec![id.to_string()], vec![])
        }
    }

    /// Header-checkbox toggle over the visible page.
    ///
    /// Deselects exactly the visible ids when all of them are selected,
    /// otherwise selects every visible id. Off-page selections are untouched.
    /// Returns (added, removed) IDs.
    pub fn toggle_all(&mut self, page_ids: &[String]) -> (Vec<String>, Vec<String>) {
        if !self.enabled || page_ids.is_empty() {
            return (vec![], vec![]);
        }
        if self.header_state(page_ids).all_selected {
            let removed = page_ids
                .iter()
                .filter(|id| self.selected.remove(id.as_str()))
                .cloned()
                .collect();
            (vec![], removed)
        } else {
            let added = page_ids
                .iter()
                .filter(|id| self.selected.insert((*id).clone()))
                .cloned()
                .collect();
            (added, vec![])
        }
    }

    /// Range select from anchor to target ID (shift-click behavior).
    ///
    /// `ordered_ids` is the visible row order. Without an anchor, or when
    /// either end is not visible, this is a plain toggle of the target.
    /// Returns the IDs that were newly selected.
    pub fn range_select(&mut self, target_id: &str, ordered_ids: &[String]) -> Vec<String> {
        if !self.enabled {
            return vec![];
        }
        let anchor_pos = self
            .anchor
            .as_ref()
            .and_then(|anchor| ordered_ids.iter().position(|id| id == anchor));
        let target_pos = ordered_ids.iter().position(|id| id == target_id);

        let (start, end) = match (anchor_pos, target_pos) {
            (Some(a), Some(t)) => (a.min(t), a.max(t)),
            _ => return self.toggle(target_id).0,
        };

        let mut added = Vec::new();
        for id in &ordered_ids[start..=end] {
            if self.selected.insert(id.clone()) {
                added.push(id.clone());
            }
        }
        added
    }

    /// Tri-state for the header checkbox, computed over `page_ids` only.
    pub fn header_state(&self, page_ids: &[String]) -> HeaderState {
        let count = page_ids.iter().filter(|id| self.selected.contains(*id)).count();
        HeaderState {
            all_selected: count > 0 && count == page_ids.len(),
            some_selected: count > 0 && count < page_ids.len(),
        }
    }

    /// Materializes the selected rows, in the order given.
    ///
    /// `rows` pairs each row with its id. Selected ids without a row in the
    /// current dataset are skipped.
    pub fn selected_rows<'a, T: Clone + 'a>(
        &self,
        rows: impl IntoIterator<Item = (&'a str, &'a T)>,
    ) -> Vec<T> {
        rows.into_iter()
            .filter(|(id, _)| self.selected.contains(*id))
            .map(|(_, row)| row.clone())
            .collect()
    }
}
