use crate::config::Config;
use crate::datekey;
use crate::grid::{self, Badge, WEEKDAY_HEADINGS};
use crate::lunar::LunarAnnotator;
use crate::model::{TodoId, TodoItem};
use crate::storage::{FileSlot, TodoStore};
use crate::ui;
use anyhow::{bail, Context, Result};
use chrono::{Datelike, NaiveDate};
use std::path::PathBuf;

/// Everything a command needs: loaded config and the resolved data dir.
pub struct Env {
    pub config: Config,
    pub data_dir: PathBuf,
}

impl Env {
    fn open_store(&self) -> TodoStore<FileSlot> {
        TodoStore::load(FileSlot::new(&self.data_dir))
    }
}

pub fn month(env: &Env, year: Option<i32>, month: Option<u32>) -> Result<()> {
    let today = datekey::today();
    let year = year.unwrap_or_else(|| today.year());
    let month = month.unwrap_or_else(|| today.month());
    if !(1..=12).contains(&month) {
        bail!("month must be between 1 and 12, got {}", month);
    }
    let store = env.open_store();
    let cells = grid::build(year, month, today, store.agenda(), &LunarAnnotator::new());
    println!("{}-{:02}", year, month);
    println!(
        "{}",
        WEEKDAY_HEADINGS
            .iter()
            .map(|h| format!("{:<12}", h))
            .collect::<String>()
    );
    for week in cells.chunks(7) {
        let line: String = week
            .iter()
            .map(|cell| match cell {
                None => format!("{:<12}", ""),
                Some(cell) => {
                    let marker = match cell.badge() {
                        Badge::None => ' ',
                        Badge::Pending => '*',
                        Badge::Done => '+',
                    };
                    let today = if cell.is_today { '>' } else { ' ' };
                    let label = format!(
                        "{}{:>2}{} {}",
                        today,
                        cell.date.day(),
                        marker,
                        cell.display_label()
                    );
                    format!("{} ", ui::fit_display(&label, 11))
                }
            })
            .collect();
        println!("{}", line.trim_end());
    }
    Ok(())
}

pub fn list(env: &Env, date: String) -> Result<()> {
    let date = parse_date(&date)?;
    let key = datekey::encode(date);
    let store = env.open_store();
    let annotation = LunarAnnotator::new().annotate(date);
    let lunar = annotation
        .lunar
        .map(|l| l.full_label())
        .unwrap_or_default();
    match annotation.holiday_label {
        Some(holiday) => println!("{} ({}, {})", key, lunar, holiday),
        None => println!("{} ({})", key, lunar),
    }
    let todos = store.todos(&key);
    if todos.is_empty() {
        println!("  (nothing planned)");
        return Ok(());
    }
    println!("  progress: {:.0}%", store.progress(&key));
    for (idx, todo) in todos.iter().enumerate() {
        print_todo(idx, todo);
    }
    Ok(())
}

pub fn add(env: &Env, date: String, text: Vec<String>) -> Result<()> {
    let key = datekey::encode(parse_date(&date)?);
    let mut store = env.open_store();
    match store
        .add(&key, &text.join(" "))
        .with_context(|| format!("adding todo to {}", key))?
    {
        Some(id) => println!("Added {} to {}", id, key),
        None => bail!("todo text is empty"),
    }
    Ok(())
}

pub fn toggle(env: &Env, date: String, id: String) -> Result<()> {
    let key = datekey::encode(parse_date(&date)?);
    let mut store = env.open_store();
    let id = resolve_id(&store, &key, &id);
    match store.toggle(&key, &id)? {
        Some(true) => println!("Completed {}", id),
        Some(false) => println!("Reopened {}", id),
        None => println!("No todo {} on {}", id, key),
    }
    Ok(())
}

pub fn remove(env: &Env, date: String, id: String) -> Result<()> {
    let key = datekey::encode(parse_date(&date)?);
    let mut store = env.open_store();
    let id = resolve_id(&store, &key, &id);
    match store.remove(&key, &id)? {
        Some(todo) => println!("Removed {}: {}", id, todo.text),
        None => println!("No todo {} on {}", id, key),
    }
    Ok(())
}

pub fn move_todo(env: &Env, date: String, from: usize, to: usize) -> Result<()> {
    let key = datekey::encode(parse_date(&date)?);
    let mut store = env.open_store();
    let moved = match (from.checked_sub(1), to.checked_sub(1)) {
        (Some(from), Some(to)) => store
            .reorder(&key, from, to)
            .with_context(|| format!("moving todo on {}", key))?,
        _ => false,
    };
    if moved {
        println!("Moved item {} to position {}", from, to);
    } else {
        println!("Nothing to move");
    }
    Ok(())
}

pub fn tui(env: &Env) -> Result<()> {
    let store = env.open_store();
    ui::run(store, env.config.quotes.clone())
}

fn parse_date(input: &str) -> Result<NaiveDate> {
    Ok(datekey::parse_date_arg(input, datekey::today())?)
}

/// Matches a typed id against the day's items, falling back to parsing it.
fn resolve_id(store: &TodoStore<FileSlot>, key: &str, raw: &str) -> TodoId {
    store
        .agenda()
        .find_id(key, raw)
        .cloned()
        .unwrap_or_else(|| TodoId::from(raw))
}

fn print_todo(idx: usize, todo: &TodoItem) {
    let check = if todo.completed { "x" } else { " " };
    println!("  {}. [{}] {}  ({})", idx + 1, check, todo.text, todo.id);
}
