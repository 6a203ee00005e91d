use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub type DateKey = String;

/// Largest id the millisecond clock can issue. Stored ids above it never
/// seed the generator.
const MAX_CLOCK_ID: u64 = i64::MAX as u64;

/// Item identity. New items get numeric ids; ids from older documents
/// (strings, negative or fractional numbers) are kept as they are.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum TodoId {
    Num(u64),
    OtherNum(serde_json::Number),
    Text(String),
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TodoId::Num(n) => write!(f, "{}", n),
            TodoId::OtherNum(n) => write!(f, "{}", n),
            TodoId::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for TodoId {
    fn from(raw: &str) -> Self {
        match raw.trim().parse::<u64>() {
            Ok(n) => TodoId::Num(n),
            Err(_) => TodoId::Text(raw.trim().to_string()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TodoItem {
    pub id: TodoId,
    pub text: String,
    pub completed: bool,
}

impl TodoItem {
    pub fn new(id: TodoId, text: impl Into<String>) -> Self {
        TodoItem {
            id,
            text: text.into(),
            completed: false,
        }
    }
}

/// Every day's ordered checklist, keyed by date key.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct Agenda {
    days: BTreeMap<DateKey, Vec<TodoItem>>,
}

impl Agenda {
    pub fn todos(&self, key: &str) -> &[TodoItem] {
        self.days.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.days.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.days.values().all(Vec::is_empty)
    }

    /// Looks up an item id on `key` by its printed form, so `"007"` finds a
    /// string id and `"7"` a numeric one.
    pub fn find_id(&self, key: &str, raw: &str) -> Option<&TodoId> {
        let raw = raw.trim();
        self.todos(key)
            .iter()
            .map(|item| &item.id)
            .find(|id| id.to_string() == raw)
    }

    pub fn push(&mut self, key: &str, item: TodoItem) {
        self.days.entry(key.to_string()).or_default().push(item);
    }

    /// Flips completion, returning the new state.
    pub fn toggle(&mut self, key: &str, id: &TodoId) -> Option<bool> {
        let item = self
            .days
            .get_mut(key)?
            .iter_mut()
            .find(|item| &item.id == id)?;
        item.completed = !item.completed;
        Some(item.completed)
    }

    pub fn remove(&mut self, key: &str, id: &TodoId) -> Option<TodoItem> {
        let list = self.days.get_mut(key)?;
        let idx = list.iter().position(|item| &item.id == id)?;
        let removed = list.remove(idx);
        if list.is_empty() {
            self.days.remove(key);
        }
        Some(removed)
    }

    /// Moves the item at `from` to `to`, shifting the items in between.
    /// Returns false when nothing moved.
    pub fn reorder(&mut self, key: &str, from: usize, to: usize) -> bool {
        let Some(list) = self.days.get_mut(key) else {
            return false;
        };
        if from == to || from >= list.len() || to >= list.len() {
            return false;
        }
        let item = list.remove(from);
        list.insert(to, item);
        true
    }

    pub fn unfinished_count(&self, key: &str) -> usize {
        self.todos(key).iter().filter(|t| !t.completed).count()
    }

    /// Completed share of the day's items in percent, 0 for an empty day.
    pub fn progress(&self, key: &str) -> f64 {
        progress(self.todos(key))
    }

    /// Largest stored numeric id the clock could have issued.
    pub fn max_numeric_id(&self) -> Option<u64> {
        self.days
            .values()
            .flatten()
            .filter_map(|item| match item.id {
                TodoId::Num(n) if n <= MAX_CLOCK_ID => Some(n),
                _ => None,
            })
            .max()
    }
}

pub fn progress(items: &[TodoItem]) -> f64 {
    if items.is_empty() {
        return 0.0;
    }
    let done = items.iter().filter(|t| t.completed).count();
    done as f64 / items.len() as f64 * 100.0
}

/// Issues strictly increasing ids based on the wall clock in milliseconds.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    last: u64,
}

impl IdGenerator {
    pub fn seeded(last: Option<u64>) -> Self {
        IdGenerator {
            last: last.unwrap_or(0),
        }
    }

    pub fn next_id(&mut self) -> TodoId {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        self.last = now.max(self.last.saturating_add(1));
        TodoId::Num(self.last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agenda_with(key: &str, texts: &[&str]) -> Agenda {
        let mut agenda = Agenda::default();
        for (idx, text) in texts.iter().enumerate() {
            agenda.push(key, TodoItem::new(TodoId::Num(idx as u64 + 1), *text));
        }
        agenda
    }

    fn texts(agenda: &Agenda, key: &str) -> Vec<String> {
        agenda.todos(key).iter().map(|t| t.text.clone()).collect()
    }

    #[test]
    fn absent_keys_are_empty() {
        let agenda = Agenda::default();
        assert!(agenda.todos("2024-05-01").is_empty());
        assert_eq!(agenda.progress("2024-05-01"), 0.0);
    }

    #[test]
    fn reorder_moves_first_to_last() {
        let mut agenda = agenda_with("k", &["A", "B", "C"]);
        assert!(agenda.reorder("k", 0, 2));
        assert_eq!(texts(&agenda, "k"), vec!["B", "C", "A"]);
        assert!(agenda.reorder("k", 2, 0));
        assert_eq!(texts(&agenda, "k"), vec!["A", "B", "C"]);
    }

    #[test]
    fn reorder_out_of_range_is_noop() {
        let mut agenda = agenda_with("k", &["A", "B"]);
        assert!(!agenda.reorder("k", 0, 2));
        assert!(!agenda.reorder("k", 5, 0));
        assert!(!agenda.reorder("k", 1, 1));
        assert!(!agenda.reorder("missing", 0, 1));
        assert_eq!(texts(&agenda, "k"), vec!["A", "B"]);
    }

    #[test]
    fn reorder_preserves_items_for_all_indices() {
        let base = agenda_with("k", &["A", "B", "C", "D"]);
        for from in 0..4 {
            for to in 0..4 {
                let mut agenda = base.clone();
                agenda.reorder("k", from, to);
                let mut got = texts(&agenda, "k");
                assert_eq!(got.len(), 4);
                assert_eq!(got[to], texts(&base, "k")[from]);
                got.sort();
                assert_eq!(got, vec!["A", "B", "C", "D"]);
            }
        }
    }

    #[test]
    fn toggle_twice_restores() {
        let mut agenda = agenda_with("k", &["A"]);
        let id = TodoId::Num(1);
        assert_eq!(agenda.toggle("k", &id), Some(true));
        assert_eq!(agenda.toggle("k", &id), Some(false));
        assert_eq!(agenda.toggle("k", &TodoId::Num(9)), None);
    }

    #[test]
    fn remove_keeps_order_and_drops_empty_days() {
        let mut agenda = agenda_with("k", &["A", "B", "C"]);
        assert!(agenda.remove("k", &TodoId::Num(2)).is_some());
        assert_eq!(texts(&agenda, "k"), vec!["A", "C"]);
        assert!(agenda.remove("k", &TodoId::Num(2)).is_none());
        agenda.remove("k", &TodoId::Num(1));
        agenda.remove("k", &TodoId::Num(3));
        assert_eq!(agenda.keys().count(), 0);
    }

    #[test]
    fn ids_parse_from_strings() {
        assert_eq!(TodoId::from("1714550400000"), TodoId::Num(1714550400000));
        assert_eq!(TodoId::from("abc"), TodoId::Text("abc".into()));
        assert_eq!(TodoId::Num(7).to_string(), "7");
    }

    #[test]
    fn ids_are_found_by_printed_form() {
        let mut agenda = Agenda::default();
        agenda.push("k", TodoItem::new(TodoId::Text("007".into()), "legacy"));
        agenda.push("k", TodoItem::new(TodoId::Num(7), "numeric"));
        assert_eq!(agenda.find_id("k", "007"), Some(&TodoId::Text("007".into())));
        assert_eq!(agenda.find_id("k", " 7 "), Some(&TodoId::Num(7)));
        assert_eq!(agenda.find_id("k", "8"), None);
        assert_eq!(agenda.find_id("missing", "7"), None);
    }

    #[test]
    fn seed_ignores_ids_beyond_the_clock() {
        let mut agenda = agenda_with("k", &["A"]);
        agenda.push("k", TodoItem::new(TodoId::Num(u64::MAX), "huge"));
        assert_eq!(agenda.max_numeric_id(), Some(1));

        let mut ids = IdGenerator::seeded(Some(u64::MAX));
        assert_eq!(ids.next_id(), TodoId::Num(u64::MAX));
    }

    #[test]
    fn generator_is_strictly_increasing() {
        let far_future = u64::MAX / 2;
        let mut ids = IdGenerator::seeded(Some(far_future));
        assert_eq!(ids.next_id(), TodoId::Num(far_future + 1));
        assert_eq!(ids.next_id(), TodoId::Num(far_future + 2));

        let mut fresh = IdGenerator::default();
        let (a, b) = (fresh.next_id(), fresh.next_id());
        match (a, b) {
            (TodoId::Num(a), TodoId::Num(b)) => assert!(b > a),
            _ => panic!("expected numeric ids"),
        }
    }
}
