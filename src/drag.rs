use crate::storage::{Slot, TodoStore};
use anyhow::Result;
use log::debug;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        key: String,
        index: usize,
    },
}

/// Turns a drag gesture over a day's list into store reorders.
///
/// Each drag-over that lands on a different row moves the item right away
/// and re-anchors the gesture on the new row, so the dragged item always sits
/// under the pointer. Nothing is deferred to the drop.
#[derive(Debug, Default)]
pub struct DragReorderEngine {
    state: DragState,
}

impl DragReorderEngine {
    pub fn new() -> Self {
        DragReorderEngine::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Current row of the dragged item, if a drag is active.
    pub fn dragging_index(&self) -> Option<usize> {
        match self.state {
            DragState::Dragging { index, .. } => Some(index),
            DragState::Idle => None,
        }
    }

    pub fn drag_start(&mut self, key: &str, index: usize) {
        debug!("event=drag_start key={} index={}", key, index);
        self.state = DragState::Dragging {
            key: key.to_string(),
            index,
        };
    }

    /// Returns true when the store order changed.
    pub fn drag_over<S: Slot>(&mut self, store: &mut TodoStore<S>, target: usize) -> Result<bool> {
        let DragState::Dragging { key, index } = &mut self.state else {
            return Ok(false);
        };
        if *index == target {
            return Ok(false);
        }
        if !store.reorder(key, *index, target)? {
            return Ok(false);
        }
        *index = target;
        Ok(true)
    }

    pub fn drag_end(&mut self) {
        if let DragState::Dragging { key, index } = &self.state {
            debug!("event=drag_end key={} index={}", key, index);
        }
        self.state = DragState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemorySlot;

    const DAY: &str = "2024-05-01";

    fn store_with(texts: &[&str]) -> TodoStore<MemorySlot> {
        let mut store = TodoStore::load(MemorySlot::default());
        for text in texts {
            store.add(DAY, text).unwrap();
        }
        store
    }

    fn order(store: &TodoStore<MemorySlot>) -> Vec<&str> {
        store.todos(DAY).iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn drag_over_while_idle_is_ignored() {
        let mut store = store_with(&["A", "B"]);
        let mut engine = DragReorderEngine::new();
        assert!(!engine.drag_over(&mut store, 1).unwrap());
        assert_eq!(order(&store), vec!["A", "B"]);
        assert_eq!(engine.state(), &DragState::Idle);
    }

    #[test]
    fn drag_tracks_pointer_and_persists_each_step() {
        let mut store = store_with(&["A", "B", "C", "D"]);
        let writes = store.slot().write_count();
        let mut engine = DragReorderEngine::new();

        engine.drag_start(DAY, 0);
        assert!(!engine.drag_over(&mut store, 0).unwrap());
        assert!(engine.drag_over(&mut store, 1).unwrap());
        assert_eq!(order(&store), vec!["B", "A", "C", "D"]);
        assert_eq!(engine.dragging_index(), Some(1));
        assert!(engine.drag_over(&mut store, 3).unwrap());
        assert_eq!(order(&store), vec!["B", "C", "D", "A"]);
        assert_eq!(store.slot().write_count(), writes + 2);

        engine.drag_end();
        assert!(!engine.is_dragging());
        assert_eq!(order(&store), vec!["B", "C", "D", "A"]);
        assert_eq!(store.slot().write_count(), writes + 2);
    }

    #[test]
    fn out_of_range_target_keeps_anchor() {
        let mut store = store_with(&["A", "B"]);
        let mut engine = DragReorderEngine::new();
        engine.drag_start(DAY, 1);
        assert!(!engine.drag_over(&mut store, 7).unwrap());
        assert_eq!(engine.dragging_index(), Some(1));
        assert_eq!(order(&store), vec!["A", "B"]);
    }

    #[test]
    fn drag_end_from_idle_stays_idle() {
        let mut engine = DragReorderEngine::new();
        engine.drag_end();
        assert_eq!(engine.state(), &DragState::Idle);
    }
}
