//! Single date input.
//!
//! Typing edits a draft that is parsed on Enter (or on blur, which reverts
//! text that does not parse). Up/Down move one day and PageUp/PageDown one
//! month, bounded by the format's min/max under its [`RangePolicy`].
//!
//! [`RangePolicy`]: crate::format::RangePolicy

use crate::chrome::InputStyle;
use crate::draft::DraftField;
use crate::format::{DateFormat, Formatter, ParseError};
use crate::key::PickerKeyBindings;
use crate::picker::{self, PickerChrome, Step};
use chrono::{Local, NaiveDate};
use crossterm::event::KeyEvent;
use pearl_core::command::Command;
use pearl_core::component::Component;
use pearl_core::render_as::RenderAs;
use ratatui::layout::Rect;
use ratatui::Frame;

#[derive(Debug, Clone)]
pub enum Message {
    KeyPress(KeyEvent),
    Paste(String),
    /// A new date was committed (or, when controlled, requested).
    Changed(NaiveDate),
}

pub struct DatePicker {
    field: DraftField<DateFormat>,
    chrome: PickerChrome,
    today: Option<NaiveDate>,
}

impl Default for DatePicker {
    fn default() -> Self {
        Self::new()
    }
}

impl DatePicker {
    pub fn new() -> Self {
        Self {
            field: DraftField::new(DateFormat::default()),
            chrome: PickerChrome::default(),
            today: None,
        }
    }

    pub fn with_format(mut self, format: DateFormat) -> Self {
        self.field.set_formatter(format);
        self
    }

    /// Controlled by the parent's date.
    pub fn with_value(mut self, date: NaiveDate) -> Self {
        self.field = self.field.controlled(date);
        self
    }

    pub fn with_default_value(mut self, date: NaiveDate) -> Self {
        self.field = self.field.uncontrolled(Some(date));
        self
    }

    pub fn with_on_change(mut self, f: impl FnMut(&NaiveDate) + Send + 'static) -> Self {
        self.field.set_on_change(f);
        self
    }

    /// The date stepping starts from when there is no value. Defaults to the
    /// local date.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.chrome.label = label.into();
        self
    }

    pub fn with_style(mut self, style: InputStyle) -> Self {
        self.chrome.style = style;
        self
    }

    pub fn with_key_bindings(mut self, keys: PickerKeyBindings) -> Self {
        self.chrome.keys = keys;
        self
    }

    pub fn with_render_as(mut self, delegate: impl RenderAs + 'static) -> Self {
        self.chrome.set_render_as(delegate);
        self
    }

    pub fn value(&self) -> Option<NaiveDate> {
        self.field.value().copied()
    }

    /// Re-supply the controlled date.
    pub fn set_value(&mut self, date: NaiveDate) {
        self.field.sync(Some(date));
    }

    pub fn draft(&self) -> String {
        self.field.draft()
    }

    pub fn error(&self) -> Option<&ParseError> {
        self.field.error()
    }

    pub fn is_invalid(&self) -> bool {
        self.field.is_invalid()
    }

    /// Display text when unfocused: the formatted date or the placeholder.
    pub fn text(&self) -> String {
        self.field.formatter().format(self.field.value())
    }

    pub fn key_bindings(&self) -> &PickerKeyBindings {
        self.chrome.keys()
    }

    pub fn focus(&mut self) {
        self.chrome.focus = true;
    }

    /// Leave the field, committing a valid draft and reverting an invalid one.
    pub fn blur(&mut self) -> Command<Message> {
        self.chrome.focus = false;
        changed(self.field.blur())
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }
}

fn changed(commit: crate::draft::Commit<NaiveDate>) -> Command<Message> {
    match picker::written(commit) {
        Some(date) => Command::message(Message::Changed(date)),
        None => Command::none(),
    }
}

impl Component for DatePicker {
    type Message = Message;

    fn update(&mut self, msg: Message) -> Command<Message> {
        match msg {
            Message::KeyPress(key) if self.chrome.focus => {
                let today = self.today();
                let format = self.field.formatter().clone();
                let commit = picker::route_key(&self.chrome.keys, &mut self.field, &key, |from, step| {
                    let Some(from) = from else {
                        return format.constrain(today);
                    };
                    match step {
                        Step::Increment | Step::Decrement => format.add_days(from, step.sign()),
                        Step::IncrementLarge | Step::DecrementLarge => {
                            format.add_months(from, step.sign() as i32)
                        }
                    }
                });
                changed(commit)
            }
            Message::Paste(text) if self.chrome.focus => {
                let draft = format!("{}{}", self.field.draft(), text.trim());
                self.field.edit(&draft);
                Command::none()
            }
            _ => Command::none(),
        }
    }

    fn view(&self, frame: &mut Frame, area: Rect) {
        self.chrome.render_field(frame, area, &self.field);
    }

    fn focused(&self) -> bool {
        self.chrome.focus
    }
}
