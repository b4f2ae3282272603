//! Time-of-day input.
//!
//! Up/Down move by the minute step (15 by default) and PageUp/PageDown by an
//! hour. Stepping wraps around midnight; typed times that do not parse are
//! rejected and reverted on blur.

use crate::chrome::InputStyle;
use crate::draft::{Commit, DraftField};
use crate::format::{Formatter, ParseError, TimeFormat};
use crate::key::PickerKeyBindings;
use crate::picker::{self, PickerChrome};
use chrono::{Local, NaiveTime};
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
    Changed(NaiveTime),
}

pub struct TimePicker {
    field: DraftField<TimeFormat>,
    chrome: PickerChrome,
    step_minutes: u32,
    now: Option<NaiveTime>,
}

impl Default for TimePicker {
    fn default() -> Self {
        Self::new()
    }
}

impl TimePicker {
    pub fn new() -> Self {
        Self {
            field: DraftField::new(TimeFormat::default()),
            chrome: PickerChrome::default(),
            step_minutes: 15,
            now: None,
        }
    }

    pub fn with_format(mut self, format: TimeFormat) -> Self {
        self.field.set_formatter(format);
        self
    }

    /// Minutes moved by Up/Down. Zero is treated as one.
    pub fn with_step(mut self, minutes: u32) -> Self {
        self.step_minutes = minutes.max(1);
        self
    }

    pub fn with_value(mut self, time: NaiveTime) -> Self {
        self.field = self.field.controlled(time);
        self
    }

    pub fn with_default_value(mut self, time: NaiveTime) -> Self {
        self.field = self.field.uncontrolled(Some(time));
        self
    }

    pub fn with_on_change(mut self, f: impl FnMut(&NaiveTime) + Send + 'static) -> Self {
        self.field.set_on_change(f);
        self
    }

    /// The time stepping starts from when there is no value, snapped to the
    /// step. Defaults to the local time.
    pub fn with_now(mut self, now: NaiveTime) -> Self {
        self.now = Some(now);
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

    pub fn value(&self) -> Option<NaiveTime> {
        self.field.value().copied()
    }

    pub fn set_value(&mut self, time: NaiveTime) {
        self.field.sync(Some(time));
    }

    pub fn step_minutes(&self) -> u32 {
        self.step_minutes
    }

    pub fn draft(&self) -> String {
        self.field.draft()
    }

    pub fn error(&self) -> Option<&ParseError> {
        self.field.error()
    }

    pub fn text(&self) -> String {
        self.field.formatter().format(self.field.value())
    }

    pub fn key_bindings(&self) -> &PickerKeyBindings {
        self.chrome.keys()
    }

    pub fn focus(&mut self) {
        self.chrome.focus = true;
    }

    pub fn blur(&mut self) -> Command<Message> {
        self.chrome.focus = false;
        changed(self.field.blur())
    }

    fn now(&self) -> NaiveTime {
        self.now.unwrap_or_else(|| Local::now().time())
    }
}

fn changed(commit: Commit<NaiveTime>) -> Command<Message> {
    match picker::written(commit) {
        Some(time) => Command::message(Message::Changed(time)),
        None => Command::none(),
    }
}

impl Component for TimePicker {
    type Message = Message;

    fn update(&mut self, msg: Message) -> Command<Message> {
        match msg {
            Message::KeyPress(key) if self.chrome.focus => {
                let format = self.field.formatter().clone();
                let step = self.step_minutes;
                let now = self.now();
                let commit = picker::route_key(&self.chrome.keys, &mut self.field, &key, |from, kind| {
                    let Some(from) = from else {
                        return Some(format.snap(now, step));
                    };
                    let minutes = if kind.is_large() { 60 } else { i64::from(step) };
                    Some(format.add_minutes(from, minutes * kind.sign()))
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Clock;
    use crossterm::event::{KeyCode, KeyModifiers};

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn press(picker: &mut TimePicker, code: KeyCode) -> Option<NaiveTime> {
        let msg = Message::KeyPress(KeyEvent::new(code, KeyModifiers::NONE));
        match picker.update(msg).into_message() {
            Some(Message::Changed(t)) => Some(t),
            _ => None,
        }
    }

    fn focused(mut picker: TimePicker) -> TimePicker {
        picker.focus();
        picker
    }

    #[test]
    fn steps_wrap_around_midnight() {
        let mut picker = focused(TimePicker::new().with_default_value(hm(23, 50)));
        assert_eq!(press(&mut picker, KeyCode::Up), Some(hm(0, 5)));
        assert_eq!(press(&mut picker, KeyCode::Down), Some(hm(23, 50)));
        assert_eq!(press(&mut picker, KeyCode::PageUp), Some(hm(0, 50)));
        assert_eq!(picker.draft(), "00:50");
    }

    #[test]
    fn custom_step() {
        let mut picker = focused(TimePicker::new().with_step(5).with_default_value(hm(9, 0)));
        assert_eq!(press(&mut picker, KeyCode::Down), Some(hm(8, 55)));
    }

    #[test]
    fn empty_starts_at_snapped_now() {
        let mut picker = focused(TimePicker::new().with_now(hm(14, 22)));
        assert_eq!(press(&mut picker, KeyCode::Up), Some(hm(14, 15)));
    }

    #[test]
    fn typed_time_commits_and_invalid_is_rejected() {
        let mut picker = focused(TimePicker::new().with_default_value(hm(8, 0)));
        picker.update(Message::Paste("x".into()));
        assert_eq!(press(&mut picker, KeyCode::Enter), None);
        assert!(matches!(picker.error(), Some(ParseError::Malformed { .. })));
        assert_eq!(picker.value(), Some(hm(8, 0)));

        press(&mut picker, KeyCode::Esc);
        for _ in 0..5 {
            press(&mut picker, KeyCode::Backspace);
        }
        for c in "25:00".chars() {
            press(&mut picker, KeyCode::Char(c));
        }
        assert_eq!(press(&mut picker, KeyCode::Enter), None, "hour out of range");
        picker.blur();
        assert_eq!(picker.draft(), "08:00");
    }

    #[test]
    fn twelve_hour_clock_display() {
        let picker = TimePicker::new()
            .with_format(TimeFormat::new().with_clock(Clock::H12))
            .with_default_value(hm(13, 5));
        assert_eq!(picker.text(), "01:05 PM");
    }

    #[test]
    fn controlled_time_follows_prop() {
        let mut picker = focused(TimePicker::new().with_value(hm(10, 0)));
        assert_eq!(press(&mut picker, KeyCode::Up), Some(hm(10, 15)));
        assert_eq!(picker.value(), Some(hm(10, 0)));
        picker.set_value(hm(10, 15));
        assert_eq!(picker.text(), "10:15");
    }
}
