use crate::datekey;
use crate::drag::DragReorderEngine;
use crate::grid::{self, Badge, CalendarDayCell, WEEKDAY_HEADINGS};
use crate::lunar::LunarAnnotator;
use crate::storage::{Slot, TodoStore};
use anyhow::Result;
use chrono::{Datelike, Duration as ChronoDuration, NaiveDate};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use log::error;
use rand::seq::SliceRandom;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::{Alignment, Color, Modifier, Rect, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Paragraph};
use ratatui::Terminal;
use std::io::{stdout, Stdout};
use std::time::Duration;
use unicode_width::UnicodeWidthChar;

const ACCENT: Color = Color::Rgb(52, 211, 153);
const WEEKEND: Color = Color::Rgb(251, 146, 60);
const PENDING: Color = Color::Rgb(251, 113, 133);

pub fn run<S: Slot>(store: TodoStore<S>, quotes: Vec<String>) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let mut app = App::new(store, quotes, datekey::today());
    let result = app.event_loop(&mut terminal);
    teardown_terminal(&mut terminal)?;
    result
}

struct App<S: Slot> {
    store: TodoStore<S>,
    annotator: LunarAnnotator,
    today: NaiveDate,
    cursor: NaiveDate,
    quotes: Vec<String>,
    quote: String,
    status: String,
    mode: Mode,
    drag: DragReorderEngine,
    grid_layout: Option<GridLayout>,
    list_area: Option<Rect>,
    list_offset: usize,
}

enum Mode {
    Month,
    Day(DayView),
}

struct DayView {
    date: NaiveDate,
    key: String,
    selected: usize,
    input: FieldValue,
}

/// Where the month grid was last drawn, for mouse hit-testing.
#[derive(Debug, Clone, Copy)]
struct GridLayout {
    area: Rect,
    cell_width: u16,
    cell_height: u16,
    cells: usize,
}

impl GridLayout {
    /// Index into the grid's cell list under a screen position.
    fn cell_at(&self, column: u16, row: u16) -> Option<usize> {
        let top = self.area.y + 1;
        if self.cell_width == 0
            || self.cell_height == 0
            || column < self.area.x
            || row < top
            || column >= self.area.x + self.cell_width * 7
        {
            return None;
        }
        let col = ((column - self.area.x) / self.cell_width) as usize;
        let week = ((row - top) / self.cell_height) as usize;
        let idx = week * 7 + col;
        (idx < self.cells).then_some(idx)
    }
}

#[derive(Clone)]
struct FieldValue {
    value: String,
    cursor: usize,
}

impl FieldValue {
    fn new(value: &str) -> Self {
        FieldValue {
            value: value.to_string(),
            cursor: value.len(),
        }
    }

    fn move_left(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor = prev_char(self.cursor, &self.value);
    }

    fn move_right(&mut self) {
        if self.cursor >= self.value.len() {
            return;
        }
        self.cursor = next_char(self.cursor, &self.value);
    }

    fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let prev = prev_char(self.cursor, &self.value);
        self.value.drain(prev..self.cursor);
        self.cursor = prev;
    }

    fn insert_char(&mut self, ch: char) {
        self.value.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    fn with_caret(&self) -> String {
        let mut text = self.value.clone();
        text.insert_str(self.cursor, "▌");
        text
    }
}

impl<S: Slot> App<S> {
    fn new(store: TodoStore<S>, quotes: Vec<String>, today: NaiveDate) -> Self {
        let mut app = App {
            store,
            annotator: LunarAnnotator::new(),
            today,
            cursor: today,
            quotes,
            quote: String::new(),
            status: "←↑↓→ pick a day, Enter to open it".into(),
            mode: Mode::Month,
            drag: DragReorderEngine::new(),
            grid_layout: None,
            list_area: None,
            list_offset: 0,
        };
        app.pick_quote();
        app
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| self.draw(f))?;
            if event::poll(Duration::from_millis(200))? {
                match event::read()? {
                    Event::Key(key) => {
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }
                        if self.handle_key(key) {
                            break;
                        }
                    }
                    Event::Mouse(mouse) => self.handle_mouse(mouse),
                    _ => {}
                }
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) -> bool {
        match self.mode {
            Mode::Month => self.handle_month_key(key),
            Mode::Day(_) => {
                self.handle_day_key(key);
                false
            }
        }
    }

    fn handle_month_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Left | KeyCode::Char('h') => self.move_cursor(-1),
            KeyCode::Right | KeyCode::Char('l') => self.move_cursor(1),
            KeyCode::Up | KeyCode::Char('k') => self.move_cursor(-7),
            KeyCode::Down | KeyCode::Char('j') => self.move_cursor(7),
            KeyCode::Char('[') | KeyCode::PageUp => self.change_month(-1),
            KeyCode::Char(']') | KeyCode::PageDown => self.change_month(1),
            KeyCode::Char('t') => {
                let month_changed = !same_month(self.cursor, self.today);
                self.cursor = self.today;
                if month_changed {
                    self.pick_quote();
                }
            }
            KeyCode::Enter => self.open_day(self.cursor),
            _ => {}
        }
        false
    }

    fn handle_day_key(&mut self, key: KeyEvent) {
        let Mode::Day(view) = &mut self.mode else {
            return;
        };
        let moving = key
            .modifiers
            .intersects(KeyModifiers::SHIFT | KeyModifiers::ALT);
        match key.code {
            KeyCode::Esc => {
                if self.drag.is_dragging() {
                    self.drag.drag_end();
                } else {
                    self.mode = Mode::Month;
                    self.status = "Closed day".into();
                }
            }
            KeyCode::Enter => {
                if self.drag.is_dragging() {
                    self.drag.drag_end();
                } else {
                    self.add_from_input();
                }
            }
            KeyCode::Up if moving => self.move_selected(-1),
            KeyCode::Down if moving => self.move_selected(1),
            KeyCode::Up => view.selected = view.selected.saturating_sub(1),
            KeyCode::Down => view.selected += 1,
            KeyCode::Tab => self.toggle_selected(),
            KeyCode::Delete => self.remove_selected(),
            KeyCode::Left => view.input.move_left(),
            KeyCode::Right => view.input.move_right(),
            KeyCode::Backspace => view.input.backspace(),
            KeyCode::Char(c) => {
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
                {
                    view.input.insert_char(c);
                }
            }
            _ => {}
        }
        self.clamp_selection();
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        match (&self.mode, mouse.kind) {
            (Mode::Month, MouseEventKind::Down(MouseButton::Left)) => {
                let cells = self.month_cells();
                let hit = self
                    .grid_layout
                    .and_then(|layout| layout.cell_at(mouse.column, mouse.row))
                    .and_then(|idx| cells.get(idx).cloned().flatten());
                if let Some(cell) = hit {
                    self.cursor = cell.date;
                    self.open_day(cell.date);
                }
            }
            (Mode::Day(view), MouseEventKind::Down(MouseButton::Left)) => {
                let len = self.store.todos(&view.key).len();
                if let Some(idx) = self.list_row_at(mouse.column, mouse.row) {
                    if idx < len {
                        let key = view.key.clone();
                        self.drag.drag_start(&key, idx);
                        self.set_selected(idx);
                    }
                }
            }
            (Mode::Day(view), MouseEventKind::Drag(MouseButton::Left)) => {
                let len = self.store.todos(&view.key).len();
                if let Some(idx) = self.list_row_at(mouse.column, mouse.row) {
                    self.drag_over(idx.min(len.saturating_sub(1)));
                }
            }
            (Mode::Day(_), MouseEventKind::Up(MouseButton::Left)) => self.drag.drag_end(),
            _ => {}
        }
    }

    fn list_row_at(&self, column: u16, row: u16) -> Option<usize> {
        let area = self.list_area?;
        if column < area.x
            || column >= area.x + area.width
            || row < area.y
            || row >= area.y + area.height
        {
            return None;
        }
        Some((row - area.y) as usize + self.list_offset)
    }

    fn open_day(&mut self, date: NaiveDate) {
        let key = datekey::encode(date);
        self.status = format!("Opened {}", key);
        self.mode = Mode::Day(DayView {
            date,
            key,
            selected: 0,
            input: FieldValue::new(""),
        });
        self.list_offset = 0;
    }

    fn move_cursor(&mut self, days: i64) {
        let next = self.cursor + ChronoDuration::days(days);
        let month_changed = !same_month(self.cursor, next);
        self.cursor = next;
        if month_changed {
            self.pick_quote();
        }
    }

    fn change_month(&mut self, delta: i32) {
        let (year, month) = grid::shift_month(self.cursor.year(), self.cursor.month(), delta);
        let day = self.cursor.day().min(grid::days_in_month(year, month));
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            self.cursor = date;
            self.pick_quote();
        }
    }

    fn pick_quote(&mut self) {
        self.quote = self
            .quotes
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_default();
    }

    fn month_cells(&self) -> Vec<CalendarDayCell> {
        grid::build(
            self.cursor.year(),
            self.cursor.month(),
            self.today,
            self.store.agenda(),
            &self.annotator,
        )
    }

    fn add_from_input(&mut self) {
        let Mode::Day(view) = &mut self.mode else {
            return;
        };
        match self.store.add(&view.key, &view.input.value) {
            Ok(Some(_)) => {
                view.input.clear();
                view.selected = self.store.todos(&view.key).len().saturating_sub(1);
                self.status = "Added".into();
            }
            Ok(None) => self.status = "Type something first".into(),
            Err(err) => self.report_failure("add", err),
        }
    }

    fn toggle_selected(&mut self) {
        let Mode::Day(view) = &self.mode else {
            return;
        };
        let Some(id) = self
            .store
            .todos(&view.key)
            .get(view.selected)
            .map(|t| t.id.clone())
        else {
            return;
        };
        let key = view.key.clone();
        match self.store.toggle(&key, &id) {
            Ok(Some(true)) => self.status = "Done!".into(),
            Ok(Some(false)) => self.status = "Reopened".into(),
            Ok(None) => {}
            Err(err) => self.report_failure("toggle", err),
        }
    }

    fn remove_selected(&mut self) {
        let Mode::Day(view) = &self.mode else {
            return;
        };
        let Some(id) = self
            .store
            .todos(&view.key)
            .get(view.selected)
            .map(|t| t.id.clone())
        else {
            return;
        };
        let key = view.key.clone();
        match self.store.remove(&key, &id) {
            Ok(Some(todo)) => self.status = format!("Deleted \"{}\"", todo.text),
            Ok(None) => {}
            Err(err) => self.report_failure("delete", err),
        }
        self.clamp_selection();
    }

    /// Keyboard drag: one drag-over step from the selected row.
    fn move_selected(&mut self, delta: isize) {
        let Mode::Day(view) = &self.mode else {
            return;
        };
        let Some(target) = view.selected.checked_add_signed(delta) else {
            return;
        };
        let (key, origin) = (view.key.clone(), view.selected);
        self.drag.drag_start(&key, origin);
        self.drag_over(target);
        self.drag.drag_end();
    }

    fn drag_over(&mut self, target: usize) {
        match self.drag.drag_over(&mut self.store, target) {
            Ok(true) => self.set_selected(target),
            Ok(false) => {}
            Err(err) => self.report_failure("reorder", err),
        }
    }

    fn set_selected(&mut self, idx: usize) {
        if let Mode::Day(view) = &mut self.mode {
            view.selected = idx;
        }
    }

    fn clamp_selection(&mut self) {
        if let Mode::Day(view) = &mut self.mode {
            let len = self.store.todos(&view.key).len();
            view.selected = view.selected.min(len.saturating_sub(1));
        }
    }

    fn report_failure(&mut self, action: &str, err: anyhow::Error) {
        error!("event=todo_{} status=failed error={:#}", action, err);
        self.status = format!("Could not {}: {:#}", action, err);
    }

    fn draw(&mut self, f: &mut ratatui::Frame<'_>) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(3),
            ])
            .split(f.size());

        self.draw_header(f, layout[0]);
        self.draw_month(f, layout[1]);
        self.draw_footer(f, layout[2]);

        if matches!(self.mode, Mode::Day(_)) {
            self.draw_day(f);
        } else {
            self.list_area = None;
        }
    }

    fn draw_header(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let today = self.annotator.annotate(self.today);
        let lunar_today = today.lunar.map(|l| l.full_label()).unwrap_or_default();
        let title = Line::from(vec![
            Span::styled(
                "freshcal ",
                Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                self.cursor.format("%B %Y").to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("  •  "),
            Span::styled(
                format!("today {} {}", datekey::encode(self.today), lunar_today),
                Style::default().fg(Color::Gray),
            ),
            Span::raw("  •  "),
            Span::styled(self.quote.clone(), Style::default().fg(ACCENT)),
        ]);
        let block = Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray));
        let paragraph = Paragraph::new(title)
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(paragraph, area);
    }

    fn draw_month(&mut self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let cells = self.month_cells();
        let weeks = cells.len().div_ceil(7).max(1) as u16;
        let cell_width = area.width / 7;
        let cell_height = (area.height.saturating_sub(1) / weeks).max(1);

        for (col, heading) in WEEKDAY_HEADINGS.iter().enumerate() {
            let rect = Rect {
                x: area.x + col as u16 * cell_width,
                y: area.y,
                width: cell_width,
                height: 1,
            };
            let weekend = col == 0 || col == 6;
            let style = Style::default()
                .fg(if weekend { WEEKEND } else { Color::Gray })
                .add_modifier(Modifier::BOLD);
            f.render_widget(
                Paragraph::new(Span::styled(*heading, style)).alignment(Alignment::Center),
                rect,
            );
        }

        for (idx, cell) in cells.iter().enumerate() {
            let Some(cell) = cell else {
                continue;
            };
            let rect = Rect {
                x: area.x + (idx % 7) as u16 * cell_width,
                y: area.y + 1 + (idx / 7) as u16 * cell_height,
                width: cell_width,
                height: cell_height,
            };
            if rect.y + rect.height > area.y + area.height {
                continue;
            }
            f.render_widget(
                day_cell_widget(cell, cell.date == self.cursor, rect.width),
                rect,
            );
        }

        self.grid_layout = Some(GridLayout {
            area,
            cell_width,
            cell_height,
            cells: cells.len(),
        });
    }

    fn draw_footer(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Length(1)])
            .split(area);

        let help_bar = Paragraph::new(self.footer_help_line())
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(help_bar, rows[0]);
        let status = Paragraph::new(self.status.clone()).style(Style::default().fg(Color::Gray));
        f.render_widget(status, rows[1]);
    }

    fn footer_help_line(&self) -> Line<'static> {
        let key = |k: &'static str, color: Color| Span::styled(k, Style::default().fg(color));
        match self.mode {
            Mode::Month => Line::from(vec![
                key("←↑↓→ / h j k l", Color::LightCyan),
                Span::raw(" day  "),
                key("[ ]", Color::LightCyan),
                Span::raw(" month  "),
                key("t", Color::LightYellow),
                Span::raw(" today  "),
                key("Enter/click", Color::LightGreen),
                Span::raw(" open  "),
                key("q", Color::LightRed),
                Span::raw(" quit"),
            ]),
            Mode::Day(_) => Line::from(vec![
                key("Enter", Color::LightGreen),
                Span::raw(" add  "),
                key("↑↓", Color::LightCyan),
                Span::raw(" select  "),
                key("Shift+↑↓ / drag", Color::LightMagenta),
                Span::raw(" move  "),
                key("Tab", Color::LightYellow),
                Span::raw(" done  "),
                key("Del", Color::LightRed),
                Span::raw(" delete  "),
                key("Esc", Color::LightRed),
                Span::raw(" close"),
            ]),
        }
    }

    fn draw_day(&mut self, f: &mut ratatui::Frame<'_>) {
        let Mode::Day(view) = &self.mode else {
            return;
        };
        let area = centered_rect(60, 70, f.size());
        let todos = self.store.todos(&view.key);
        let annotation = self.annotator.annotate(view.date);

        let mut title = vec![Span::styled(
            format!(" {} {} ", view.key, view.date.format("%a")),
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        )];
        if grid::is_weekend(view.date) {
            title.push(Span::styled(" day off ", Style::default().fg(WEEKEND)));
        }
        let block = Block::default()
            .title(Line::from(title))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(ACCENT));
        let inner = block.inner(area);
        f.render_widget(Clear, area);
        f.render_widget(block, area);

        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(1),
                Constraint::Length(3),
            ])
            .split(inner);

        let mut info = vec![Span::styled(
            annotation.lunar.map(|l| l.full_label()).unwrap_or_default(),
            Style::default().fg(Color::Gray),
        )];
        if let Some(holiday) = annotation.holiday_label {
            info.push(Span::raw("  "));
            info.push(Span::styled(
                holiday,
                Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
            ));
        }
        let left = self.store.unfinished_count(&view.key);
        if left > 0 {
            info.push(Span::raw("  "));
            info.push(Span::styled(
                format!("{} left", left),
                Style::default().fg(PENDING),
            ));
        }
        f.render_widget(Paragraph::new(Line::from(info)), sections[0]);

        if !todos.is_empty() {
            let progress = self.store.progress(&view.key);
            let gauge = Gauge::default()
                .gauge_style(Style::default().fg(ACCENT).bg(Color::Rgb(22, 24, 30)))
                .ratio(progress / 100.0)
                .label(format!("{:.0}% done", progress));
            f.render_widget(gauge, sections[1]);
        }

        let dragging = self.drag.dragging_index();
        let items = if todos.is_empty() {
            vec![ListItem::new("Nothing planned yet, enjoy the day ~")
                .style(Style::default().fg(Color::DarkGray))]
        } else {
            todos
                .iter()
                .enumerate()
                .map(|(idx, todo)| {
                    let check = if todo.completed { "[x] " } else { "[ ] " };
                    let mut style = if todo.completed {
                        Style::default()
                            .fg(Color::DarkGray)
                            .add_modifier(Modifier::CROSSED_OUT)
                    } else {
                        Style::default().fg(Color::White)
                    };
                    if dragging == Some(idx) {
                        style = style.add_modifier(Modifier::DIM | Modifier::ITALIC);
                    }
                    ListItem::new(Line::from(vec![
                        Span::styled("⋮ ", Style::default().fg(ACCENT)),
                        Span::styled(check, style),
                        Span::styled(todo.text.clone(), style),
                    ]))
                })
                .collect()
        };
        let list_area = sections[2];
        let mut state = ListState::default();
        let offset = adjust_offset(
            view.selected,
            self.list_offset,
            list_area.height as usize,
            1,
            todos.len(),
        );
        *state.offset_mut() = offset;
        if !todos.is_empty() {
            state.select(Some(view.selected));
        }
        let list = List::new(items).highlight_style(
            Style::default()
                .bg(Color::Rgb(22, 60, 48))
                .add_modifier(Modifier::BOLD),
        );
        f.render_stateful_widget(list, list_area, &mut state);

        let input = Paragraph::new(view.input.with_caret()).block(
            Block::default()
                .title("New todo")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        f.render_widget(input, sections[3]);

        self.list_offset = offset;
        self.list_area = Some(list_area);
    }
}

fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

fn day_cell_widget(cell: &grid::DayCell, selected: bool, width: u16) -> Paragraph<'static> {
    let inner = width.saturating_sub(1) as usize;
    let day_style = if cell.is_weekend {
        Style::default().fg(WEEKEND).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
    };
    let mut first = vec![Span::styled(format!("{:>2}", cell.date.day()), day_style)];
    match cell.badge() {
        Badge::Pending => first.push(Span::styled(
            format!(" ●{}", cell.unfinished_count),
            Style::default().fg(PENDING),
        )),
        Badge::Done => first.push(Span::styled(" ●", Style::default().fg(ACCENT))),
        Badge::None => {}
    }
    let label_style = if cell.holiday_label.is_some() {
        Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
    } else if cell.is_weekend {
        Style::default().fg(WEEKEND).add_modifier(Modifier::DIM)
    } else {
        Style::default().fg(Color::Gray)
    };
    let label = fit_display(cell.display_label(), inner);
    let lines = vec![
        Line::from(first),
        Line::from(Span::styled(label.trim_end().to_string(), label_style)),
    ];

    let mut style = Style::default();
    if cell.is_today {
        style = style.bg(Color::Rgb(22, 60, 48));
    }
    if selected {
        style = style
            .bg(Color::Rgb(252, 214, 112))
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD);
    }
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .style(style)
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;
    Ok(())
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ]
            .as_ref(),
        )
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ]
            .as_ref(),
        )
        .split(popup_layout[1])[1]
}

fn adjust_offset(
    selected: usize,
    current_offset: usize,
    viewport: usize,
    scrolloff: usize,
    len: usize,
) -> usize {
    if viewport == 0 || len == 0 {
        return 0;
    }
    let max_offset = len.saturating_sub(viewport);
    let margin = scrolloff.min(viewport.saturating_sub(1));
    let mut offset = current_offset.min(max_offset);
    if selected < offset.saturating_add(margin) {
        offset = selected.saturating_sub(margin);
    } else {
        let upper = offset
            .saturating_add(viewport.saturating_sub(1))
            .saturating_sub(margin);
        if selected > upper {
            offset = selected.saturating_add(margin + 1).saturating_sub(viewport);
        }
    }
    offset.min(max_offset)
}

/// Cuts or pads to exactly `width` terminal columns.
pub fn fit_display(text: &str, width: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push_str(&" ".repeat(width - used));
    out
}

fn prev_char(cursor: usize, text: &str) -> usize {
    text[..cursor]
        .char_indices()
        .next_back()
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}

fn next_char(cursor: usize, text: &str) -> usize {
    text[cursor..]
        .chars()
        .next()
        .map(|ch| cursor + ch.len_utf8())
        .unwrap_or(cursor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemorySlot;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn app() -> App<MemorySlot> {
        App::new(
            TodoStore::load(MemorySlot::default()),
            vec!["keep going".into()],
            ymd(2024, 5, 1),
        )
    }

    fn press(app: &mut App<MemorySlot>, code: KeyCode) -> bool {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(app: &mut App<MemorySlot>, text: &str) {
        for ch in text.chars() {
            press(app, KeyCode::Char(ch));
        }
        press(app, KeyCode::Enter);
    }

    fn texts(app: &App<MemorySlot>) -> Vec<String> {
        app.store
            .todos("2024-05-01")
            .iter()
            .map(|t| t.text.clone())
            .collect()
    }

    fn selected(app: &App<MemorySlot>) -> usize {
        match &app.mode {
            Mode::Day(view) => view.selected,
            Mode::Month => panic!("day view is not open"),
        }
    }

    #[test]
    fn navigates_months_and_clamps_day() {
        let mut app = app();
        app.cursor = ymd(2024, 1, 31);
        press(&mut app, KeyCode::Char(']'));
        assert_eq!(app.cursor, ymd(2024, 2, 29));
        press(&mut app, KeyCode::Char('['));
        press(&mut app, KeyCode::Char('['));
        assert_eq!(app.cursor, ymd(2023, 12, 29));
        press(&mut app, KeyCode::Char('t'));
        assert_eq!(app.cursor, ymd(2024, 5, 1));
        assert_eq!(app.quote, "keep going");
    }

    #[test]
    fn adds_toggles_and_deletes_from_day_view() {
        let mut app = app();
        press(&mut app, KeyCode::Enter);
        type_text(&mut app, "buy milk");
        type_text(&mut app, "   ");
        type_text(&mut app, "call mom");
        assert_eq!(texts(&app), vec!["buy milk", "call mom"]);

        press(&mut app, KeyCode::Up);
        press(&mut app, KeyCode::Tab);
        assert!(app.store.todos("2024-05-01")[0].completed);
        assert_eq!(app.store.progress("2024-05-01"), 50.0);

        press(&mut app, KeyCode::Delete);
        assert_eq!(texts(&app), vec!["call mom"]);
        assert_eq!(selected(&app), 0);

        press(&mut app, KeyCode::Esc);
        assert!(matches!(app.mode, Mode::Month));
        assert!(press(&mut app, KeyCode::Char('q')));
    }

    #[test]
    fn shift_arrows_move_the_selected_item() {
        let mut app = app();
        press(&mut app, KeyCode::Enter);
        for text in ["A", "B", "C"] {
            type_text(&mut app, text);
        }
        press(&mut app, KeyCode::Up);
        press(&mut app, KeyCode::Up);
        assert_eq!(selected(&app), 0);
        app.handle_key(KeyEvent::new(KeyCode::Down, KeyModifiers::SHIFT));
        app.handle_key(KeyEvent::new(KeyCode::Down, KeyModifiers::SHIFT));
        assert_eq!(texts(&app), vec!["B", "C", "A"]);
        assert_eq!(selected(&app), 2);
        app.handle_key(KeyEvent::new(KeyCode::Down, KeyModifiers::SHIFT));
        assert_eq!(texts(&app), vec!["B", "C", "A"]);
        assert!(!app.drag.is_dragging());
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn mouse_drag_reorders_incrementally() {
        let mut app = app();
        press(&mut app, KeyCode::Enter);
        for text in ["A", "B", "C"] {
            type_text(&mut app, text);
        }
        app.list_area = Some(Rect::new(10, 5, 30, 6));
        app.list_offset = 0;

        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 12, 5));
        assert_eq!(app.drag.dragging_index(), Some(0));
        app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 12, 6));
        assert_eq!(texts(&app), vec!["B", "A", "C"]);
        app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 12, 10));
        assert_eq!(texts(&app), vec!["B", "C", "A"]);
        assert_eq!(app.drag.dragging_index(), Some(2));
        app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 12, 10));
        assert!(!app.drag.is_dragging());
        assert_eq!(selected(&app), 2);
    }

    #[test]
    fn clicking_a_grid_cell_opens_that_day() {
        let mut app = app();
        app.grid_layout = Some(GridLayout {
            area: Rect::new(0, 3, 70, 19),
            cell_width: 10,
            cell_height: 3,
            cells: 34,
        });
        // May 2024 starts on Wednesday: index 3 is the 1st, index 10 the 8th
        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 5, 4));
        assert!(matches!(app.mode, Mode::Month));
        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 35, 7));
        match &app.mode {
            Mode::Day(view) => assert_eq!(view.key, "2024-05-08"),
            Mode::Month => panic!("expected day view"),
        }
    }

    #[test]
    fn field_editing_handles_multibyte_text() {
        let mut field = FieldValue::new("初一");
        field.move_left();
        field.insert_char('x');
        assert_eq!(field.value, "初x一");
        field.move_right();
        field.backspace();
        assert_eq!(field.value, "初x");
        assert_eq!(field.with_caret(), "初x▌");
    }

    #[test]
    fn fits_wide_characters() {
        assert_eq!(fit_display("初一", 6), "初一  ");
        assert_eq!(fit_display("Labour Day", 4), "Labo");
        assert_eq!(fit_display("廿一廿", 5), "廿一 ");
        assert_eq!(fit_display("한글ＡＢ", 6), "한글Ａ");
        assert_eq!(fit_display("한", 3), "한 ");
    }
}
