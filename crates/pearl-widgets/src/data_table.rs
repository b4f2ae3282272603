//! Data table with keyed rows, sorting, filtering and a controllable
//! selection.
//!
//! Rows are identified by the cell in the key column, so the selection
//! survives sorting and filtering. Both the sort state and the selected key
//! may be controlled by the parent or owned by the table.

use crate::key::{Binding, KeyCombination, KeyMap};
use crossterm::event::{KeyCode, KeyEvent};
use pearl_core::command::Command;
use pearl_core::component::Component;
use pearl_core::controllable::Controllable;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{
    Block, Borders, Cell as RatatuiCell, Row, Table as RatatuiTable, TableState,
};
use ratatui::Frame;
use std::cell::Cell as StdCell;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Column and direction the rows are ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub column: usize,
    pub direction: SortDirection,
}

impl SortState {
    pub fn ascending(column: usize) -> Self {
        Self {
            column,
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(column: usize) -> Self {
        Self {
            column,
            direction: SortDirection::Descending,
        }
    }
}

/// Next sort after pressing the sort key on `column`: ascending, then
/// descending, then unsorted. A different column starts over at ascending.
pub fn cycle_sort(current: Option<SortState>, column: usize) -> Option<SortState> {
    match current {
        Some(s) if s.column == column => match s.direction {
            SortDirection::Ascending => Some(SortState::descending(column)),
            SortDirection::Descending => None,
        },
        _ => Some(SortState::ascending(column)),
    }
}

/// Total order over cells: numbers first (by value, `NaN` last), then text
/// compared case-insensitively.
pub fn compare_cells(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<f64>(), b.trim().parse::<f64>()) {
        (Ok(x), Ok(y)) => x.total_cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.to_lowercase().cmp(&b.to_lowercase()),
    }
}

/// Messages for the data table.
#[derive(Debug, Clone)]
pub enum Message {
    /// A key press event forwarded to the table for handling.
    KeyPress(KeyEvent),
    /// The sort state changed (or, when controlled, should change).
    SortChanged(Option<SortState>),
    /// The selected row key changed (or, when controlled, should change).
    SelectionChanged(Option<String>),
    /// The row with this key was confirmed (Enter pressed).
    Confirm(String),
}

/// Configurable key bindings for the data table.
#[derive(Debug, Clone)]
pub struct TableKeyBindings {
    /// Move selection up. Default: Up, k
    pub up: Binding,
    /// Move selection down. Default: Down, j
    pub down: Binding,
    /// Move column left. Default: Left, h
    pub col_left: Binding,
    /// Move column right. Default: Right, l
    pub col_right: Binding,
    /// Move to first row. Default: Home
    pub first: Binding,
    /// Move to last row. Default: End, G
    pub last: Binding,
    /// Page up. Default: PageUp
    pub page_up: Binding,
    /// Page down. Default: PageDown
    pub page_down: Binding,
    /// Half page down. Default: Ctrl+D
    pub half_down: Binding,
    /// Half page up. Default: Ctrl+U
    pub half_up: Binding,
    /// Cycle the sort on the active column. Default: s
    pub sort: Binding,
    /// Confirm selection. Default: Enter
    pub confirm: Binding,
}

impl Default for TableKeyBindings {
    fn default() -> Self {
        Self {
            up: Binding::with_keys(
                vec![
                    KeyCombination::new(KeyCode::Up),
                    KeyCombination::new(KeyCode::Char('k')),
                ],
                "up",
            ),
            down: Binding::with_keys(
                vec![
                    KeyCombination::new(KeyCode::Down),
                    KeyCombination::new(KeyCode::Char('j')),
                ],
                "down",
            ),
            col_left: Binding::with_keys(
                vec![
                    KeyCombination::new(KeyCode::Left),
                    KeyCombination::new(KeyCode::Char('h')),
                ],
                "column left",
            ),
            col_right: Binding::with_keys(
                vec![
                    KeyCombination::new(KeyCode::Right),
                    KeyCombination::new(KeyCode::Char('l')),
                ],
                "column right",
            ),
            first: Binding::new(KeyCombination::new(KeyCode::Home), "first"),
            last: Binding::with_keys(
                vec![
                    KeyCombination::new(KeyCode::End),
                    KeyCombination::new(KeyCode::Char('G')),
                    KeyCombination::shift(KeyCode::Char('G')),
                ],
                "last",
            ),
            page_up: Binding::new(KeyCombination::new(KeyCode::PageUp), "page up"),
            page_down: Binding::new(KeyCombination::new(KeyCode::PageDown), "page down"),
            half_down: Binding::new(KeyCombination::ctrl(KeyCode::Char('d')), "half page down"),
            half_up: Binding::new(KeyCombination::ctrl(KeyCode::Char('u')), "half page up"),
            sort: Binding::new(KeyCombination::new(KeyCode::Char('s')), "sort"),
            confirm: Binding::new(KeyCombination::new(KeyCode::Enter), "confirm"),
        }
    }
}

impl KeyMap for TableKeyBindings {
    fn short_help(&self) -> Vec<&Binding> {
        vec![&self.up, &self.down, &self.col_right, &self.sort, &self.confirm]
    }
}

/// Style configuration for the table.
#[derive(Debug, Clone)]
pub struct TableStyle {
    /// Style applied to column header cells.
    pub header: Style,
    /// Header style of the active column.
    pub active_header: Style,
    /// Base style for unselected data rows.
    pub normal: Style,
    /// Style applied to the currently highlighted row.
    pub selected: Style,
    /// Border style when the table has focus.
    pub focused_border: Style,
    /// Border style when the table does not have focus.
    pub unfocused_border: Style,
    /// Symbol rendered to the left of the selected row (e.g. "▸ ").
    pub highlight_symbol: String,
    /// Style applied to the active cell of the selected row.
    pub active_cell: Style,
}

impl Default for TableStyle {
    fn default() -> Self {
        Self {
            header: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
            active_header: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
                .add_modifier(Modifier::UNDERLINED),
            normal: Style::default(),
            selected: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            focused_border: Style::default().fg(Color::Cyan),
            unfocused_border: Style::default().fg(Color::DarkGray),
            highlight_symbol: "▸ ".to_string(),
            active_cell: Style::default()
                .add_modifier(Modifier::BOLD)
                .add_modifier(Modifier::UNDERLINED),
        }
    }
}

type RowStyleFn = Box<dyn Fn(&str, &[String]) -> Style + Send>;

/// # Example
///
/// ```ignore
/// let headers = vec!["Id".into(), "Name".into(), "Age".into()];
/// let rows = vec![
///     vec!["u1".into(), "Alice".into(), "30".into()],
///     vec!["u2".into(), "Bob".into(), "25".into()],
/// ];
/// let mut table = DataTable::new(headers, rows)
///     .with_key_column(0)
///     .with_default_sort(Some(SortState::ascending(2)));
/// table.focus();
/// ```
pub struct DataTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    key_column: usize,
    widths: Vec<Constraint>,
    sort: Controllable<Option<SortState>>,
    selected: Controllable<Option<String>>,
    filter: String,
    active_col: usize,
    focus: bool,
    style: TableStyle,
    title: String,
    visible_height: StdCell<usize>,
    row_style_fn: Option<RowStyleFn>,
    key_bindings: TableKeyBindings,
}

impl DataTable {
    /// Create a table with the given column headers and rows, keyed by the
    /// first column.
    ///
    /// Column widths default to equal percentages. The first row is selected
    /// when `rows` is non-empty.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let col_count = headers.len();
        let widths = if col_count == 0 {
            Vec::new()
        } else {
            vec![Constraint::Percentage(100 / col_count as u16); col_count]
        };
        let first_key = rows.first().and_then(|r| r.first()).cloned();
        Self {
            headers,
            rows,
            key_column: 0,
            widths,
            sort: Controllable::uncontrolled(Some(None)),
            selected: Controllable::uncontrolled(Some(first_key)),
            filter: String::new(),
            active_col: 0,
            focus: false,
            style: TableStyle::default(),
            title: String::new(),
            visible_height: StdCell::new(10),
            row_style_fn: None,
            key_bindings: TableKeyBindings::default(),
        }
    }

    /// Create a table from simple CSV data.
    ///
    /// The first non-empty line is treated as column headers. Remaining non-empty
    /// lines become data rows. Fields are split by comma and trimmed. Quoted fields
    /// and escaped commas are not handled.
    pub fn from_csv(data: &str) -> Self {
        let mut lines = data.lines().filter(|l| !l.trim().is_empty());
        let split = |line: &str| -> Vec<String> {
            line.split(',').map(|s| s.trim().to_string()).collect()
        };
        let Some(header) = lines.next() else {
            return Self::new(Vec::new(), Vec::new());
        };
        let rows = lines.map(split).collect();
        Self::new(split(header), rows)
    }

    /// Column whose cell identifies a row.
    pub fn with_key_column(mut self, column: usize) -> Self {
        self.key_column = column;
        if !self.selected.is_controlled() {
            let first = self.visible().first().map(|&i| self.key_of(i));
            self.selected.reset(Some(first));
        }
        self
    }

    /// Controlled sort state.
    pub fn with_sort(mut self, sort: Option<SortState>) -> Self {
        self.sort = self.sort.rebuild(Some(sort), None);
        self
    }

    pub fn with_default_sort(mut self, sort: Option<SortState>) -> Self {
        self.sort = self.sort.rebuild(None, Some(sort));
        self
    }

    pub fn with_on_sort_change(mut self, f: impl FnMut(&Option<SortState>) + Send + 'static) -> Self {
        self.sort.set_on_change(f);
        self
    }

    /// Controlled selected row key.
    pub fn with_selected(mut self, key: Option<String>) -> Self {
        self.selected = self.selected.rebuild(Some(key), None);
        self
    }

    pub fn with_default_selected(mut self, key: Option<String>) -> Self {
        self.selected = self.selected.rebuild(None, Some(key));
        self
    }

    pub fn with_on_select(mut self, f: impl FnMut(&Option<String>) + Send + 'static) -> Self {
        self.selected.set_on_change(f);
        self
    }

    /// Set custom key bindings for the table.
    pub fn with_key_bindings(mut self, bindings: TableKeyBindings) -> Self {
        self.key_bindings = bindings;
        self
    }

    /// Get a reference to the current key bindings.
    pub fn key_bindings(&self) -> &TableKeyBindings {
        &self.key_bindings
    }

    /// Override the column width constraints.
    pub fn with_widths(mut self, widths: Vec<Constraint>) -> Self {
        self.widths = widths;
        self
    }

    /// Set the table border title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_style(mut self, style: TableStyle) -> Self {
        self.style = style;
        self
    }

    /// Set a per-row styling function. It receives the row key and the row
    /// cells and returns the base style for that row.
    pub fn with_row_style(
        mut self,
        f: impl Fn(&str, &[String]) -> Style + Send + 'static,
    ) -> Self {
        self.row_style_fn = Some(Box::new(f));
        self
    }

    pub fn focus(&mut self) {
        self.focus = true;
    }

    pub fn blur(&mut self) {
        self.focus = false;
    }

    pub fn sort(&self) -> Option<SortState> {
        self.sort.read().copied().flatten()
    }

    /// Re-supply the controlled sort state.
    pub fn set_sort(&mut self, sort: Option<SortState>) {
        self.sort.sync(Some(sort));
    }

    /// Key of the selected row, if any.
    pub fn selected_key(&self) -> Option<&str> {
        self.selected.read().and_then(|k| k.as_deref())
    }

    /// Re-supply the controlled selection.
    pub fn set_selected(&mut self, key: Option<String>) {
        self.selected.sync(Some(key));
    }

    /// The selected row's cells, if it is visible.
    pub fn selected_row(&self) -> Option<&[String]> {
        let key = self.selected_key()?;
        self.visible()
            .into_iter()
            .find(|&i| self.key_of(i) == key)
            .map(|i| self.rows[i].as_slice())
    }

    pub fn active_column(&self) -> usize {
        self.active_col
    }

    pub fn set_active_column(&mut self, column: usize) {
        self.active_col = column.min(self.headers.len().saturating_sub(1));
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Narrow the rows to those with a cell containing `term`, ignoring case.
    pub fn set_filter(&mut self, term: impl Into<String>) {
        self.filter = term.into();
    }

    /// Replace the data rows. The selection keeps its key.
    pub fn set_rows(&mut self, rows: Vec<Vec<String>>) {
        self.rows = rows;
    }

    /// Update columns dynamically.
    pub fn set_columns(&mut self, headers: Vec<String>, widths: Vec<Constraint>) {
        self.headers = headers;
        self.widths = widths;
        self.set_active_column(self.active_col);
    }

    /// Get the number of rows before filtering.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Row indices after filtering and sorting, in display order.
    pub fn visible(&self) -> Vec<usize> {
        let needle = self.filter.to_lowercase();
        let mut idx: Vec<usize> = (0..self.rows.len())
            .filter(|&i| {
                needle.is_empty()
                    || self.rows[i]
                        .iter()
                        .any(|c| c.to_lowercase().contains(&needle))
            })
            .collect();
        if let Some(sort) = self.sort() {
            let cell = |i: usize| self.rows[i].get(sort.column).map_or("", String::as_str);
            idx.sort_by(|&a, &b| {
                let ord = compare_cells(cell(a), cell(b));
                match sort.direction {
                    SortDirection::Ascending => ord,
                    SortDirection::Descending => ord.reverse(),
                }
            });
        }
        idx
    }

    /// Keys of the visible rows, in display order.
    pub fn visible_keys(&self) -> Vec<String> {
        self.visible().into_iter().map(|i| self.key_of(i)).collect()
    }

    fn key_of(&self, row: usize) -> String {
        self.rows[row]
            .get(self.key_column)
            .cloned()
            .unwrap_or_default()
    }

    /// Display position of the selected row.
    fn cursor_in(&self, visible: &[usize]) -> Option<usize> {
        let key = self.selected_key()?;
        visible.iter().position(|&i| self.key_of(i) == key)
    }

    /// Select the row at display position `target(current)`.
    fn move_cursor(&mut self, target: impl FnOnce(Option<usize>, usize) -> usize) -> Command<Message> {
        let visible = self.visible();
        if visible.is_empty() {
            return Command::none();
        }
        let last = visible.len() - 1;
        let pos = target(self.cursor_in(&visible), last).min(last);
        let key = self.key_of(visible[pos]);
        if self.selected_key() == Some(key.as_str()) {
            return Command::none();
        }
        self.selected.write(Some(key.clone()));
        Command::message(Message::SelectionChanged(Some(key)))
    }

    fn cycle_sort(&mut self) -> Command<Message> {
        let next = cycle_sort(self.sort(), self.active_col);
        self.sort.write(next);
        Command::message(Message::SortChanged(next))
    }

    fn confirm(&self) -> Command<Message> {
        let visible = self.visible();
        match self.cursor_in(&visible) {
            Some(pos) => Command::message(Message::Confirm(self.key_of(visible[pos]))),
            None => Command::none(),
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Command<Message> {
        let page = self.visible_height.get();
        if self.key_bindings.up.matches(&key) {
            self.move_cursor(|cur, last| match cur {
                Some(0) | None => last,
                Some(c) => c - 1,
            })
        } else if self.key_bindings.down.matches(&key) {
            self.move_cursor(|cur, last| match cur {
                Some(c) if c < last => c + 1,
                _ => 0,
            })
        } else if self.key_bindings.col_left.matches(&key) {
            self.set_active_column(self.active_col.saturating_sub(1));
            Command::none()
        } else if self.key_bindings.col_right.matches(&key) {
            self.set_active_column(self.active_col + 1);
            Command::none()
        } else if self.key_bindings.page_up.matches(&key) {
            self.move_cursor(|cur, _| cur.unwrap_or(0).saturating_sub(page))
        } else if self.key_bindings.page_down.matches(&key) {
            self.move_cursor(|cur, _| cur.map_or(0, |c| c + page))
        } else if self.key_bindings.half_up.matches(&key) {
            self.move_cursor(|cur, _| cur.unwrap_or(0).saturating_sub(page / 2))
        } else if self.key_bindings.half_down.matches(&key) {
            self.move_cursor(|cur, _| cur.map_or(0, |c| c + page / 2))
        } else if self.key_bindings.first.matches(&key) {
            self.move_cursor(|_, _| 0)
        } else if self.key_bindings.last.matches(&key) {
            self.move_cursor(|_, last| last)
        } else if self.key_bindings.sort.matches(&key) {
            self.cycle_sort()
        } else if self.key_bindings.confirm.matches(&key) {
            self.confirm()
        } else {
            Command::none()
        }
    }
}

impl Component for DataTable {
    type Message = Message;

    fn update(&mut self, msg: Message) -> Command<Message> {
        match msg {
            Message::KeyPress(key) if self.focus => self.handle_key(key),
            _ => Command::none(),
        }
    }

    fn view(&self, frame: &mut Frame, area: Rect) {
        let border_style = if self.focus {
            self.style.focused_border
        } else {
            self.style.unfocused_border
        };

        let mut block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style);

        if !self.title.is_empty() {
            block = block.title(self.title.as_str());
        }

        // Border top/bottom plus the header row and its margin.
        let data_height = (block.inner(area).height as usize).saturating_sub(2);
        self.visible_height
            .set(if data_height > 0 { data_height } else { 10 });

        let sort = self.sort();
        let header_cells: Vec<RatatuiCell> = self
            .headers
            .iter()
            .enumerate()
            .map(|(col, h)| {
                let marker = match sort {
                    Some(s) if s.column == col => match s.direction {
                        SortDirection::Ascending => " ▲",
                        SortDirection::Descending => " ▼",
                    },
                    _ => "",
                };
                let style = if self.focus && col == self.active_col {
                    self.style.active_header
                } else {
                    self.style.header
                };
                RatatuiCell::from(format!("{h}{marker}")).style(style)
            })
            .collect();
        let header = Row::new(header_cells).height(1).bottom_margin(1);

        let visible = self.visible();
        let cursor = self.cursor_in(&visible);

        let rows: Vec<Row> = visible
            .iter()
            .enumerate()
            .map(|(pos, &i)| {
                let row = &self.rows[i];
                let base_style = match &self.row_style_fn {
                    Some(style_fn) => style_fn(&self.key_of(i), row),
                    None => self.style.normal,
                };
                let is_cursor = cursor == Some(pos);
                let cells: Vec<RatatuiCell> = row
                    .iter()
                    .enumerate()
                    .map(|(col, c)| {
                        let cell = RatatuiCell::from(c.as_str());
                        if is_cursor && self.focus && col == self.active_col {
                            cell.style(self.style.active_cell)
                        } else {
                            cell
                        }
                    })
                    .collect();
                Row::new(cells).style(base_style)
            })
            .collect();

        let table = RatatuiTable::new(rows, &self.widths)
            .header(header)
            .block(block)
            .row_highlight_style(self.style.selected)
            .highlight_symbol(self.style.highlight_symbol.as_str());

        let mut state = TableState::default().with_selected(cursor);
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn focused(&self) -> bool {
        self.focus
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use pearl_core::testing::{Harness, TestProgram};
    use std::sync::{Arc, Mutex};

    fn key_event(code: KeyCode) -> Message {
        Message::KeyPress(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn people() -> DataTable {
        let mut t = DataTable::from_csv(
            "Id, Name, Age, City
             u1, alice, 30, NYC
             u2, Bob, 9, LA
             u3, Carol, 100, SF
             u4, dave, 30, LA",
        );
        t.focus();
        t
    }

    fn press(t: &mut DataTable, code: KeyCode) -> Option<Message> {
        t.update(key_event(code)).into_message()
    }

    #[test]
    fn compare_is_numeric_aware() {
        assert_eq!(compare_cells("9", "30"), Ordering::Less);
        assert_eq!(compare_cells("100", "30"), Ordering::Greater);
        assert_eq!(compare_cells("alice", "Bob"), Ordering::Less);
        assert_eq!(compare_cells("2.5", "10"), Ordering::Less);
    }

    #[test]
    fn numbers_sort_before_text() {
        assert_eq!(compare_cells("10", "1a"), Ordering::Less);
        assert_eq!(compare_cells("1a", "2"), Ordering::Greater);
        assert_eq!(compare_cells("NaN", "7"), Ordering::Greater);
        assert_eq!(compare_cells("NaN", "N/A"), Ordering::Less);
    }

    #[test]
    fn mixed_column_sorts_without_panicking() {
        let cells = ["10", "1a", "N/A", "2", "NaN", "-3", "b", "", "2.5", "A"];
        let rows: Vec<Vec<String>> = (0..200)
            .map(|i| vec![format!("r{i}"), cells[(i * 7) % cells.len()].to_string()])
            .collect();
        let t = DataTable::new(vec!["Id".into(), "Ref".into()], rows)
            .with_default_sort(Some(SortState::ascending(1)));
        let sorted: Vec<String> = t
            .visible()
            .into_iter()
            .map(|i| t.rows[i][1].clone())
            .collect();
        assert_eq!(sorted.len(), 200);
        assert!(sorted
            .windows(2)
            .all(|w| compare_cells(&w[0], &w[1]) != Ordering::Greater));
        assert_eq!(sorted.first().map(String::as_str), Some("-3"));
        assert_eq!(sorted.last().map(String::as_str), Some("N/A"));
    }

    #[test]
    fn sort_key_cycles_on_active_column() {
        let mut t = people();
        t.set_active_column(2);
        assert!(matches!(
            press(&mut t, KeyCode::Char('s')),
            Some(Message::SortChanged(Some(s))) if s == SortState::ascending(2)
        ));
        assert_eq!(t.visible_keys(), ["u2", "u1", "u4", "u3"], "ties keep source order");
        press(&mut t, KeyCode::Char('s'));
        assert_eq!(t.visible_keys(), ["u3", "u1", "u4", "u2"]);
        press(&mut t, KeyCode::Char('s'));
        assert_eq!(t.sort(), None);
        assert_eq!(t.visible_keys(), ["u1", "u2", "u3", "u4"]);
    }

    #[test]
    fn text_sort_ignores_case() {
        let t = people().with_default_sort(Some(SortState::ascending(1)));
        assert_eq!(t.visible_keys(), ["u1", "u2", "u3", "u4"]);
        let t = people().with_default_sort(Some(SortState::descending(1)));
        assert_eq!(t.visible_keys(), ["u4", "u3", "u2", "u1"]);
    }

    #[test]
    fn filter_is_case_insensitive_substring() {
        let mut t = people();
        t.set_filter("la");
        assert_eq!(t.visible_keys(), ["u2", "u4"]);
        t.set_filter("");
        assert_eq!(t.row_count(), 4);
        assert_eq!(t.visible().len(), 4);
    }

    #[test]
    fn navigation_reports_row_keys() {
        let mut t = people();
        assert_eq!(t.selected_key(), Some("u1"));
        assert!(matches!(
            press(&mut t, KeyCode::Down),
            Some(Message::SelectionChanged(Some(k))) if k == "u2"
        ));
        press(&mut t, KeyCode::End);
        assert_eq!(t.selected_key(), Some("u4"));
        press(&mut t, KeyCode::Down);
        assert_eq!(t.selected_key(), Some("u1"), "down wraps");
        press(&mut t, KeyCode::Up);
        assert_eq!(t.selected_key(), Some("u4"), "up wraps");
        press(&mut t, KeyCode::Home);
        assert_eq!(t.selected_key(), Some("u1"));
        assert!(press(&mut t, KeyCode::Home).is_none(), "no change, no message");
    }

    #[test]
    fn selection_follows_key_through_sort() {
        let mut t = people();
        press(&mut t, KeyCode::Down);
        t.set_active_column(2);
        press(&mut t, KeyCode::Char('s'));
        assert_eq!(t.selected_key(), Some("u2"));
        assert_eq!(t.selected_row().map(|r| r[1].as_str()), Some("Bob"));
        assert!(matches!(
            press(&mut t, KeyCode::Enter),
            Some(Message::Confirm(k)) if k == "u2"
        ));
    }

    #[test]
    fn filtered_out_selection_restarts_from_top() {
        let mut t = people();
        t.set_filter("sf");
        assert!(t.selected_row().is_none());
        assert!(press(&mut t, KeyCode::Enter).is_none());
        press(&mut t, KeyCode::Down);
        assert_eq!(t.selected_key(), Some("u3"));
    }

    #[test]
    fn page_keys_clamp() {
        let mut t = people();
        press(&mut t, KeyCode::PageDown);
        assert_eq!(t.selected_key(), Some("u4"));
        press(&mut t, KeyCode::PageUp);
        assert_eq!(t.selected_key(), Some("u1"));
    }

    #[test]
    fn column_moves_clamp_to_bounds() {
        let mut t = people();
        press(&mut t, KeyCode::Left);
        assert_eq!(t.active_column(), 0);
        for _ in 0..10 {
            press(&mut t, KeyCode::Right);
        }
        assert_eq!(t.active_column(), 3);
    }

    #[test]
    fn controlled_sort_and_selection_wait_for_parent() {
        let requested = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&requested);
        let mut t = people()
            .with_sort(None)
            .with_selected(Some("u1".into()))
            .with_on_sort_change(move |s| sink.lock().unwrap().push(*s));

        press(&mut t, KeyCode::Char('s'));
        assert_eq!(*requested.lock().unwrap(), [Some(SortState::ascending(0))]);
        assert_eq!(t.sort(), None);

        assert!(matches!(
            press(&mut t, KeyCode::Down),
            Some(Message::SelectionChanged(Some(k))) if k == "u2"
        ));
        assert_eq!(t.selected_key(), Some("u1"));

        t.set_selected(Some("u3".into()));
        t.set_sort(Some(SortState::descending(0)));
        assert_eq!(t.selected_key(), Some("u3"));
        assert_eq!(t.visible_keys(), ["u4", "u3", "u2", "u1"]);
    }

    #[test]
    fn key_column_changes_identity() {
        let t = people().with_key_column(1);
        assert_eq!(t.selected_key(), Some("alice"));
        assert_eq!(t.visible_keys()[1], "Bob");
    }

    #[test]
    fn unfocused_ignores_keys() {
        let mut t = people();
        t.blur();
        assert!(press(&mut t, KeyCode::Down).is_none());
        assert_eq!(t.selected_key(), Some("u1"));
    }

    #[test]
    fn header_shows_sort_marker() {
        let t = people().with_default_sort(Some(SortState::descending(2)));
        let prog = TestProgram::<Harness<DataTable>>::new(t);
        let screen = prog.render_string(60, 8);
        assert!(screen.contains("Age ▼"));
        assert!(screen.contains("▸ u1"));
    }

    #[test]
    fn row_style_receives_key() {
        let t = people().with_row_style(|key, _row| {
            if key == "u2" {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            }
        });
        let f = t.row_style_fn.as_ref().unwrap();
        assert_eq!(f("u2", &[]), Style::default().fg(Color::Red));
    }

    #[test]
    fn from_csv_edge_cases() {
        let t = DataTable::from_csv("");
        assert!(t.headers.is_empty());
        assert!(t.rows.is_empty());

        let t = DataTable::from_csv("\n\nA, B\n\n1, 2\n\n");
        assert_eq!(t.headers, ["A", "B"]);
        assert_eq!(t.rows, [vec!["1".to_string(), "2".to_string()]]);
    }

    #[test]
    fn help_line_lists_sort() {
        let help = TableKeyBindings::default().help_line();
        assert!(help.contains("s sort"));
        assert!(help.contains("enter confirm"));
    }
}
