//! # Booking Form Demo
//!
//! One of each input, composed in a parent model:
//! - A destination combobox backed by a slow async search (type `fail` to
//!   see a failed fetch)
//! - A multi-select for amenities, capped at two chips
//! - A date range, a time of arrival, and a guest count
//! - The guest count is controlled: the parent owns the number and feeds it
//!   back with `set_value` whenever the input reports `Changed`
//!
//! Tab / Shift+Tab move between fields, Ctrl+T switches the end of the date
//! range, Ctrl+C quits. Logs go to `booking_form.log` (set `RUST_LOG=debug`
//! to watch stale fetches being discarded).
//!
//! Run with: `cargo run --example booking_form`

use pearl::chrono::NaiveTime;
use pearl::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use pearl::ratatui::layout::{Alignment, Constraint, Layout, Rect};
use pearl::ratatui::style::{Color, Modifier, Style};
use pearl::ratatui::widgets::{Block, Borders, Paragraph};
use pearl::ratatui::Frame;
use pearl::tokio::time::sleep;
use pearl::widgets::combobox::{self, DataCombobox};
use pearl::widgets::date_range_picker::{self, DateRangePicker};
use pearl::widgets::key::{Binding, KeyCombination, KeyMap, PickerKeyBindings};
use pearl::widgets::multi_combobox::{self, DataMultiCombobox};
use pearl::widgets::number_input::{self, NumberInput};
use pearl::widgets::options::{OptionList, SelectOption};
use pearl::widgets::time_picker::{self, TimePicker};
use pearl::{
    search_fn, terminal_events, Command, Component, Model, ProgramOptions, SearchConfig,
    SearchError, Subscription, TerminalEvent,
};
use std::time::Duration;

const FIELDS: usize = 5;

const AIRPORTS: &[(&str, &str)] = &[
    ("Amsterdam Schiphol", "AMS"),
    ("Athens", "ATH"),
    ("Barcelona El Prat", "BCN"),
    ("Berlin Brandenburg", "BER"),
    ("Lisbon", "LIS"),
    ("Lima Jorge Chávez", "LIM"),
    ("Oslo Gardermoen", "OSL"),
    ("Osaka Kansai", "KIX"),
    ("Reykjavík Keflavík", "KEF"),
    ("Rome Fiumicino", "FCO"),
];

struct BookingForm {
    destination: DataCombobox,
    amenities: DataMultiCombobox,
    stay: DateRangePicker,
    arrival: TimePicker,
    guests_input: NumberInput,
    guests: f64,
    focus: usize,
}

#[derive(Debug)]
enum Msg {
    Destination(combobox::Message),
    Amenities(multi_combobox::Message),
    Stay(date_range_picker::Message),
    Arrival(time_picker::Message),
    Guests(number_input::Message),
    Key(KeyEvent),
    Paste(String),
    Quit,
}

impl BookingForm {
    fn move_focus(&mut self, next: usize) -> Command<Msg> {
        let blurred = match self.focus {
            0 => self.destination.blur().map(Msg::Destination),
            1 => self.amenities.blur().map(Msg::Amenities),
            2 => self.stay.blur().map(Msg::Stay),
            3 => self.arrival.blur().map(Msg::Arrival),
            _ => self.guests_input.blur().map(Msg::Guests),
        };
        self.focus = next % FIELDS;
        match self.focus {
            0 => self.destination.focus(),
            1 => self.amenities.focus(),
            2 => self.stay.focus(),
            3 => self.arrival.focus(),
            _ => self.guests_input.focus(),
        }
        blurred
    }

    /// Hand an input event to the focused field.
    fn route(&mut self, wrap: impl FnOnce(usize) -> Msg) -> Command<Msg> {
        let msg = wrap(self.focus);
        self.update(msg)
    }

    fn draw_field(&self, frame: &mut Frame, index: usize, area: Rect) {
        match index {
            0 => self.destination.view(frame, area),
            1 => self.amenities.view(frame, area),
            2 => self.stay.view(frame, area),
            3 => self.arrival.view(frame, area),
            _ => self.guests_input.view(frame, area),
        }
    }

    fn help_line(&self) -> String {
        match self.focus {
            0 | 1 => "type to search • ↑/↓ move • enter pick • esc close".to_string(),
            2 => self.stay.key_bindings().help_line(),
            3 => self.arrival.key_bindings().help_line(),
            _ => self.guests_input.key_bindings().help_line(),
        }
    }

    fn summary(&self) -> String {
        let destination = self.destination.selected_label().unwrap_or("—");
        let amenities = self.amenities.value().iter().collect::<Vec<_>>().join(", ");
        let arrival = self
            .arrival
            .value()
            .map_or_else(|| "—".to_string(), |t| t.format("%H:%M").to_string());
        format!(
            "{destination} | {} | arriving {arrival} | {} guest(s) | {}",
            self.stay.text(),
            self.guests,
            if amenities.is_empty() { "no extras".to_string() } else { amenities },
        )
    }
}

impl Model for BookingForm {
    type Message = Msg;
    type Flags = OptionList;

    fn init(amenities: OptionList) -> (Self, Command<Msg>) {
        let airports = search_fn(|term: String| async move {
            sleep(Duration::from_millis(150)).await;
            if term.eq_ignore_ascii_case("fail") {
                return Err(SearchError::new("airport service unavailable"));
            }
            let needle = term.to_lowercase();
            Ok(AIRPORTS
                .iter()
                .filter(|(name, code)| {
                    name.to_lowercase().contains(&needle) || code.to_lowercase().contains(&needle)
                })
                .map(|(name, code)| SelectOption::new(format!("{name} ({code})"), *code))
                .collect())
        });
        let mut destination = DataCombobox::new(airports)
            .with_label("Destination")
            .with_placeholder("search airports")
            .with_search_config(SearchConfig::default().with_debounce(Duration::from_millis(250)));
        destination.focus();

        let amenities = DataMultiCombobox::with_options(amenities)
            .with_label("Extras")
            .with_placeholder("add extras")
            .with_max_displayed_items(2);

        let stay_keys = PickerKeyBindings {
            switch_end: Binding::new(KeyCombination::ctrl(KeyCode::Char('t')), "switch end"),
            ..PickerKeyBindings::default()
        };
        let stay = DateRangePicker::new()
            .with_label("Stay")
            .with_key_bindings(stay_keys);

        let mut arrival = TimePicker::new().with_label("Arrival").with_step(30);
        if let Some(check_in) = NaiveTime::from_hms_opt(15, 0, 0) {
            arrival = arrival.with_default_value(check_in);
        }

        let guests = 2.0;
        let guests_input = NumberInput::new()
            .with_label("Guests")
            .with_range(1.0, 12.0)
            .with_value(guests);

        (
            BookingForm {
                destination,
                amenities,
                stay,
                arrival,
                guests_input,
                guests,
                focus: 0,
            },
            Command::none(),
        )
    }

    fn update(&mut self, msg: Msg) -> Command<Msg> {
        match msg {
            Msg::Destination(m) => self.destination.update(m).map(Msg::Destination),
            Msg::Amenities(m) => self.amenities.update(m).map(Msg::Amenities),
            Msg::Stay(m) => self.stay.update(m).map(Msg::Stay),
            Msg::Arrival(m) => self.arrival.update(m).map(Msg::Arrival),
            // The parent owns the guest count; the input only asks.
            Msg::Guests(number_input::Message::Changed(v)) => {
                self.guests = v;
                self.guests_input.set_value(v);
                Command::none()
            }
            Msg::Guests(m) => self.guests_input.update(m).map(Msg::Guests),
            Msg::Key(key) => match key.code {
                KeyCode::Tab => self.move_focus(self.focus + 1),
                KeyCode::BackTab => self.move_focus(self.focus + FIELDS - 1),
                _ => self.route(|field| match field {
                    0 => Msg::Destination(combobox::Message::KeyPress(key)),
                    1 => Msg::Amenities(multi_combobox::Message::KeyPress(key)),
                    2 => Msg::Stay(date_range_picker::Message::KeyPress(key)),
                    3 => Msg::Arrival(time_picker::Message::KeyPress(key)),
                    _ => Msg::Guests(number_input::Message::KeyPress(key)),
                }),
            },
            Msg::Paste(text) => self.route(|field| match field {
                0 => Msg::Destination(combobox::Message::Paste(text)),
                1 => Msg::Amenities(multi_combobox::Message::Paste(text)),
                2 => Msg::Stay(date_range_picker::Message::Paste(text)),
                3 => Msg::Arrival(time_picker::Message::Paste(text)),
                _ => Msg::Guests(number_input::Message::Paste(text)),
            }),
            Msg::Quit => Command::quit(),
        }
    }

    fn view(&self, frame: &mut Frame) {
        let [title_area, form_area, summary_area, help_area] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Fill(1),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        let title = Paragraph::new("Book a stay")
            .alignment(Alignment::Center)
            .style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(title, title_area);

        let block = Block::default().borders(Borders::ALL);
        let inner = block.inner(form_area);
        frame.render_widget(block, form_area);

        // Each field gets one row plus everything below it, so a dropdown can
        // open downwards. The focused field is drawn last to sit on top.
        let below = |row: u16| Rect {
            y: inner.y + row * 2,
            height: inner.height.saturating_sub(row * 2),
            ..inner
        };
        for row in (0..FIELDS).filter(|&row| row != self.focus) {
            self.draw_field(frame, row, Rect { height: 1, ..below(row as u16) });
        }
        self.draw_field(frame, self.focus, below(self.focus as u16));

        let summary = Paragraph::new(self.summary())
            .style(Style::default().fg(Color::Green))
            .block(Block::default().borders(Borders::ALL).title("Summary"));
        frame.render_widget(summary, summary_area);

        let help = Paragraph::new(format!("{} • tab next field • ctrl+c quit", self.help_line()))
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, help_area);
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
            TerminalEvent::Paste(text) => Some(Msg::Paste(text)),
            _ => None,
        })]
    }
}

#[pearl::tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let options = ProgramOptions {
        title: Some("pearl booking form".into()),
        log_file: Some("booking_form.log".into()),
        ..ProgramOptions::default()
    };
    let amenities = OptionList::new([
        SelectOption::new("Breakfast", "breakfast").with_group("Meals"),
        SelectOption::new("Dinner", "dinner").with_group("Meals"),
        SelectOption::new("Parking", "parking"),
        SelectOption::new("Late checkout", "late"),
        SelectOption::new("Airport shuttle", "shuttle").with_group("Transport"),
    ])?;
    let form = pearl::run_with::<BookingForm>(amenities, options).await?;
    println!("{}", form.summary());
    Ok(())
}
