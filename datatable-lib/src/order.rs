//! Column order state and drag reordering.

use std::collections::HashSet;

use serde::Deserialize;
use serde::Serialize;

use crate::column::SELECTION_COLUMN_ID;

/// A drag-and-drop gesture reduced to a command.
///
/// Moves `source_id` next to `target_id`: before it, or after it when
/// `insert_after` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderCommand {
    pub source_id: String,
    pub target_id: String,
    #[serde(default)]
    pub insert_after: bool,
}

impl ReorderCommand {
    pub fn before(source_id: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            insert_after: false,
        }
    }

    pub fn after(source_id: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            insert_after: true,
        }
    }
}

/// Reconciles a stored order against the live column set.
///
/// Unknown and repeated ids are dropped, ids missing from `current` are
/// appended in `known_ids` order, and the selection column is pinned to
/// index 0 when selection is enabled (removed otherwise).
pub fn normalize(current: &[String], known_ids: &[String], selection_enabled: bool) -> Vec<String> {
    let known: HashSet<&str> = known_ids.iter().map(String::as_str).collect();
    let mut seen: HashSet<&str> = HashSet::with_capacity(known_ids.len());
    let mut order = Vec::with_capacity(known_ids.len() + 1);

    seen.insert(SELECTION_COLUMN_ID);
    if selection_enabled {
        order.push(SELECTION_COLUMN_ID.to_string());
    }

    for id in current.iter().chain(known_ids.iter()) {
        if known.contains(id.as_str()) && seen.insert(id.as_str()) {
            order.push(id.clone());
        }
    }
    order
}

/// Applies a reorder command in place.
///
/// No-op (returns `false`) when either id is absent, both ids are the same,
/// or either side is the selection column.
pub fn reorder(order: &mut Vec<String>, command: &ReorderCommand) -> bool {
    let ReorderCommand {
        source_id,
        target_id,
        insert_after,
    } = command;

    if source_id == target_id || source_id == SELECTION_COLUMN_ID || target_id == SELECTION_COLUMN_ID {
        return false;
    }
    let Some(source) = order.iter().position(|id| id == source_id) else {
        return false;
    };
    if !order.iter().any(|id| id == target_id) {
        return false;
    }

    let moved = order.remove(source);
    // Target index is looked up after removal so it is never stale.
    let Some(target) = order.iter().position(|id| id == target_id) else {
        order.insert(source, moved);
        return false;
    };
    let insert_at = if *insert_after { target + 1 } else { target };
    let unchanged = insert_at == source;
    order.insert(insert_at, moved);
    !unchanged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalize_drops_removed_and_appends_new() {
        let stored = strings(&["a", "b", "c"]);
        let known = strings(&["a", "c", "d"]);
        assert_eq!(normalize(&stored, &known, false), strings(&["a", "c", "d"]));
    }

    #[test]
    fn test_normalize_pins_selection_column() {
        let stored = strings(&["b", SELECTION_COLUMN_ID, "a"]);
        let known = strings(&[SELECTION_COLUMN_ID, "a", "b"]);
        assert_eq!(
            normalize(&stored, &known, true),
            strings(&[SELECTION_COLUMN_ID, "b", "a"])
        );
        assert_eq!(normalize(&stored, &known, false), strings(&["b", "a"]));
    }

    #[test]
    fn test_normalize_dedups() {
        let stored = strings(&["a", "a", "b"]);
        let known = strings(&["a", "b"]);
        assert_eq!(normalize(&stored, &known, false), strings(&["a", "b"]));
    }

    #[test]
    fn test_reorder_before_and_after() {
        let mut order = strings(&["a", "b", "c", "d"]);
        assert!(reorder(&mut order, &ReorderCommand::before("d", "b")));
        assert_eq!(order, strings(&["a", "d", "b", "c"]));

        assert!(reorder(&mut order, &ReorderCommand::after("a", "c")));
        assert_eq!(order, strings(&["d", "b", "c", "a"]));
    }

    #[test]
    fn test_reorder_noops() {
        let mut order = strings(&[SELECTION_COLUMN_ID, "a", "b"]);
        let before = order.clone();
        assert!(!reorder(&mut order, &ReorderCommand::before(SELECTION_COLUMN_ID, "b")));
        assert!(!reorder(&mut order, &ReorderCommand::before("b", SELECTION_COLUMN_ID)));
        assert!(!reorder(&mut order, &ReorderCommand::before("a", "a")));
        assert!(!reorder(&mut order, &ReorderCommand::before("ghost", "a")));
        assert!(!reorder(&mut order, &ReorderCommand::after("a", "ghost")));
        assert!(!reorder(&mut order, &ReorderCommand::before("a", "b")));
        assert_eq!(order, before);
    }
}
