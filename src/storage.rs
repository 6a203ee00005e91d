use crate::model::{Agenda, IdGenerator, TodoId, TodoItem};
use anyhow::{Context, Result};
use log::{debug, info, warn};
#[cfg(test)]
use std::cell::RefCell;
#[cfg(test)]
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

/// Name of the slot holding the whole todo document.
pub const TODOS_SLOT: &str = "fresh_calendar_todos_v3";

/// A durable key-value slot holding one serialized document per name.
pub trait Slot {
    fn read(&self, name: &str) -> Result<Option<String>>;
    fn write(&self, name: &str, contents: &str) -> Result<()>;
}

/// Stores each slot as `<dir>/<name>.json`.
#[derive(Debug, Clone)]
pub struct FileSlot {
    dir: PathBuf,
}

impl FileSlot {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileSlot { dir: dir.into() }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }
}

impl Slot for FileSlot {
    fn read(&self, name: &str) -> Result<Option<String>> {
        let path = self.path_for(name);
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&path).with_context(|| format!("reading {:?}", path))?;
        Ok(Some(data))
    }

    fn write(&self, name: &str, contents: &str) -> Result<()> {
        fs::create_dir_all(&self.dir).with_context(|| format!("creating {:?}", self.dir))?;
        let path = self.path_for(name);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, contents).with_context(|| format!("writing {:?}", tmp))?;
        fs::rename(&tmp, &path).with_context(|| format!("replacing {:?}", path))?;
        Ok(())
    }
}

#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemorySlot {
    entries: RefCell<HashMap<String, String>>,
    writes: RefCell<usize>,
}

#[cfg(test)]
impl MemorySlot {
    pub fn with_entry(name: &str, contents: &str) -> Self {
        let slot = MemorySlot::default();
        slot.entries
            .borrow_mut()
            .insert(name.to_string(), contents.to_string());
        slot
    }

    pub fn write_count(&self) -> usize {
        *self.writes.borrow()
    }
}

#[cfg(test)]
impl Slot for MemorySlot {
    fn read(&self, name: &str) -> Result<Option<String>> {
        Ok(self.entries.borrow().get(name).cloned())
    }

    fn write(&self, name: &str, contents: &str) -> Result<()> {
        self.entries
            .borrow_mut()
            .insert(name.to_string(), contents.to_string());
        *self.writes.borrow_mut() += 1;
        Ok(())
    }
}

/// Owner of all todo data. Every effective mutation is written through to
/// the slot before the call returns.
#[derive(Debug)]
pub struct TodoStore<S: Slot> {
    agenda: Agenda,
    ids: IdGenerator,
    slot: S,
}

impl<S: Slot> TodoStore<S> {
    /// Loads the document from `slot`. Missing or malformed data starts an
    /// empty store instead of failing.
    pub fn load(slot: S) -> Self {
        let agenda = match slot.read(TODOS_SLOT) {
            Ok(Some(raw)) => match serde_json::from_str::<Agenda>(&raw) {
                Ok(agenda) => agenda,
                Err(err) => {
                    warn!("event=store_load status=malformed error={}", err);
                    Agenda::default()
                }
            },
            Ok(None) => {
                info!("event=store_load status=missing");
                Agenda::default()
            }
            Err(err) => {
                warn!("event=store_load status=unreadable error={:#}", err);
                Agenda::default()
            }
        };
        let ids = IdGenerator::seeded(agenda.max_numeric_id());
        debug!("event=store_load status=ok days={}", agenda.keys().count());
        TodoStore { agenda, ids, slot }
    }

    pub fn save(&self) -> Result<()> {
        let serialized = serde_json::to_string(&self.agenda).context("serializing todos")?;
        self.slot.write(TODOS_SLOT, &serialized)
    }

    pub fn agenda(&self) -> &Agenda {
        &self.agenda
    }

    pub fn slot(&self) -> &S {
        &self.slot
    }

    pub fn todos(&self, key: &str) -> &[TodoItem] {
        self.agenda.todos(key)
    }

    pub fn unfinished_count(&self, key: &str) -> usize {
        self.agenda.unfinished_count(key)
    }

    pub fn progress(&self, key: &str) -> f64 {
        self.agenda.progress(key)
    }

    /// Appends a new item. Blank text is ignored and yields `None`.
    pub fn add(&mut self, key: &str, text: &str) -> Result<Option<TodoId>> {
        let text = text.trim();
        if text.is_empty() {
            debug!("event=todo_add status=skipped reason=blank key={}", key);
            return Ok(None);
        }
        let id = self.ids.next_id();
        self.agenda.push(key, TodoItem::new(id.clone(), text));
        info!("event=todo_add key={} id={}", key, id);
        self.save()?;
        Ok(Some(id))
    }

    /// Flips completion. Returns the new state, `None` for unknown ids.
    pub fn toggle(&mut self, key: &str, id: &TodoId) -> Result<Option<bool>> {
        let Some(completed) = self.agenda.toggle(key, id) else {
            debug!("event=todo_toggle status=skipped key={} id={}", key, id);
            return Ok(None);
        };
        info!("event=todo_toggle key={} id={} completed={}", key, id, completed);
        self.save()?;
        Ok(Some(completed))
    }

    pub fn remove(&mut self, key: &str, id: &TodoId) -> Result<Option<TodoItem>> {
        let Some(removed) = self.agenda.remove(key, id) else {
            debug!("event=todo_remove status=skipped key={} id={}", key, id);
            return Ok(None);
        };
        info!("event=todo_remove key={} id={}", key, id);
        self.save()?;
        Ok(Some(removed))
    }

    /// Moves the item at `from` to `to`. Returns false for out of range
    /// indices or when nothing moved.
    pub fn reorder(&mut self, key: &str, from: usize, to: usize) -> Result<bool> {
        if !self.agenda.reorder(key, from, to) {
            debug!(
                "event=todo_reorder status=skipped key={} from={} to={}",
                key, from, to
            );
            return Ok(false);
        }
        debug!("event=todo_reorder key={} from={} to={}", key, from, to);
        self.save()?;
        Ok(true)
    }
}
