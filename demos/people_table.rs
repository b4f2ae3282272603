//! # People Table Demo
//!
//! A keyed table with sorting, filtering and a parent-owned selection:
//! - `s` cycles the sort on the highlighted column (ascending, descending, off)
//! - `/` starts typing a filter, Enter or Esc returns to the table
//! - The selection is controlled: the parent keeps the selected id and feeds
//!   it back with `set_selected`, so the details pane always agrees with the
//!   highlight even while the filter hides rows
//!
//! Ctrl+C quits. Logs go to `people_table.log`.
//!
//! Run with: `cargo run --example people_table`

use pearl::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use pearl::ratatui::layout::{Constraint, Layout};
use pearl::ratatui::style::{Color, Modifier, Style};
use pearl::ratatui::text::{Line, Span};
use pearl::ratatui::widgets::{Block, Borders, Paragraph};
use pearl::ratatui::Frame;
use pearl::widgets::data_table::{self, DataTable, SortDirection, SortState};
use pearl::widgets::key::KeyMap;
use pearl::widgets::text_edit::{Edit, TextEditState};
use pearl::{
    terminal_events, Command, Component, Model, ProgramOptions, Subscription, TerminalEvent,
};

const PEOPLE: &str = "
id, name, team, age, city
u1, Ada Lovelace, compilers, 36, London
u2, Grace Hopper, compilers, 85, Arlington
u3, Edsger Dijkstra, algorithms, 72, Nuenen
u4, Barbara Liskov, systems, 84, Boston
u5, Ken Thompson, systems, 81, Berkeley
u6, Frances Allen, compilers, 88, Peru NY
u7, Donald Knuth, algorithms, 86, Stanford
u8, Margaret Hamilton, systems, 87, Boston
u9, Tony Hoare, algorithms, 90, Cambridge
";

struct PeopleTable {
    table: DataTable,
    filter: TextEditState,
    filtering: bool,
    selected: Option<String>,
    confirmed: Option<String>,
}

#[derive(Debug)]
enum Msg {
    Table(data_table::Message),
    Key(KeyEvent),
    Quit,
}

impl PeopleTable {
    fn details(&self) -> Line<'static> {
        let Some(row) = self.table.selected_row() else {
            return Line::from(Span::styled(
                "nothing selected",
                Style::default().fg(Color::DarkGray),
            ));
        };
        let mut spans = vec![Span::styled(
            row[1].clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )];
        spans.push(Span::raw(format!(" · {} · {} · {}", row[2], row[3], row[4])));
        if self.confirmed.as_deref() == self.selected.as_deref() {
            spans.push(Span::styled(" ✓", Style::default().fg(Color::Green)));
        }
        Line::from(spans)
    }

    fn sort_label(&self) -> String {
        match self.table.sort() {
            Some(SortState { column, direction }) => {
                let arrow = match direction {
                    SortDirection::Ascending => "asc",
                    SortDirection::Descending => "desc",
                };
                format!("sorted by column {} {arrow}", column + 1)
            }
            None => "unsorted".to_string(),
        }
    }
}

impl Model for PeopleTable {
    type Message = Msg;
    type Flags = ();

    fn init(_: ()) -> (Self, Command<Msg>) {
        let selected = Some("u1".to_string());
        let mut table = DataTable::from_csv(PEOPLE)
            .with_key_column(0)
            .with_title("People")
            .with_widths(vec![
                Constraint::Length(4),
                Constraint::Fill(2),
                Constraint::Fill(1),
                Constraint::Length(5),
                Constraint::Fill(1),
            ])
            .with_default_sort(Some(SortState::ascending(1)))
            .with_selected(selected.clone())
            .with_row_style(|_, row| {
                if row.get(3).and_then(|age| age.parse::<u32>().ok()) >= Some(85) {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default()
                }
            });
        table.set_active_column(1);
        table.focus();
        (
            PeopleTable {
                table,
                filter: TextEditState::new(),
                filtering: false,
                selected,
                confirmed: None,
            },
            Command::none(),
        )
    }

    fn update(&mut self, msg: Msg) -> Command<Msg> {
        match msg {
            Msg::Table(data_table::Message::SelectionChanged(key)) => {
                self.selected = key.clone();
                self.table.set_selected(key);
                Command::none()
            }
            Msg::Table(data_table::Message::Confirm(key)) => {
                tracing::info!(%key, "row confirmed");
                self.confirmed = Some(key);
                Command::none()
            }
            Msg::Table(m) => self.table.update(m).map(Msg::Table),
            Msg::Key(key) if !self.filtering => {
                if key.code == KeyCode::Char('/') && key.modifiers == KeyModifiers::NONE {
                    self.filtering = true;
                    self.table.blur();
                    return Command::none();
                }
                self.update(Msg::Table(data_table::Message::KeyPress(key)))
            }
            Msg::Key(key) => {
                match key.code {
                    KeyCode::Enter | KeyCode::Esc => {
                        self.filtering = false;
                        self.table.focus();
                    }
                    _ => {
                        if self.filter.handle_key(&key) == Edit::Changed {
                            self.table.set_filter(self.filter.value());
                        }
                    }
                }
                Command::none()
            }
            Msg::Quit => Command::quit(),
        }
    }

    fn view(&self, frame: &mut Frame) {
        let [filter_area, table_area, details_area, help_area] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Fill(1),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        let border = if self.filtering {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let width = filter_area.width.saturating_sub(2);
        let filter_line = if self.filter.is_empty() && !self.filtering {
            Line::from(Span::styled(
                "press / to filter",
                Style::default().fg(Color::DarkGray),
            ))
        } else {
            Line::from(self.filter.spans(
                width,
                Style::default(),
                Style::default().add_modifier(Modifier::REVERSED),
                self.filtering,
            ))
        };
        let filter = Paragraph::new(filter_line).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title(format!(
                    "Filter ({} of {})",
                    self.table.visible().len(),
                    self.table.row_count()
                )),
        );
        frame.render_widget(filter, filter_area);

        self.table.view(frame, table_area);

        let details = Paragraph::new(self.details()).block(
            Block::default()
                .borders(Borders::ALL)
                .title(self.sort_label()),
        );
        frame.render_widget(details, details_area);

        let help = if self.filtering {
            "enter/esc back to table • ctrl+c quit".to_string()
        } else {
            format!(
                "{} • / filter • ctrl+c quit",
                self.table.key_bindings().help_line()
            )
        };
        frame.render_widget(
            Paragraph::new(help).style(Style::default().fg(Color::DarkGray)),
            help_area,
        );
    }

    fn subscriptions(&self) -> Vec<Subscription<Msg>> {
        vec![terminal_events(|ev| match ev {
            TerminalEvent::Key(key)
                if key.code == KeyCode::Char('c')
                    && key.modifiers.contains(KeyModifiers::CONTROL) =>
            {
                Some(Msg::Quit)
            }
            TerminalEvent::Key(key) => Some(Msg::Key(key)),
            _ => None,
        })]
    }
}

#[pearl::tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let options = ProgramOptions {
        title: Some("pearl people table".into()),
        log_file: Some("people_table.log".into()),
        ..ProgramOptions::default()
    };
    let model = pearl::run_with::<PeopleTable>((), options).await?;
    if let Some(key) = model.confirmed {
        println!("confirmed {key}");
    }
    Ok(())
}
