//! Numeric input with stepping and bounds.
//!
//! With `min = 0, max = 100` and the default [`RangePolicy::Clamp`], typing
//! `150` commits `100` and `-5` commits `0`. Under [`RangePolicy::Reject`]
//! the same input leaves the value unchanged and blur restores the draft.

use crate::chrome::InputStyle;
use crate::draft::{Commit, DraftField};
use crate::format::{Formatter, NumberFormat, ParseError, RangePolicy};
use crate::key::PickerKeyBindings;
use crate::picker::{self, PickerChrome};
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
    Changed(f64),
}

pub struct NumberInput {
    field: DraftField<NumberFormat>,
    chrome: PickerChrome,
    step: f64,
}

impl Default for NumberInput {
    fn default() -> Self {
        Self::new()
    }
}

impl NumberInput {
    pub fn new() -> Self {
        Self {
            field: DraftField::new(NumberFormat::new()),
            chrome: PickerChrome::default(),
            step: 1.0,
        }
    }

    pub fn with_format(mut self, format: NumberFormat) -> Self {
        self.field.set_formatter(format);
        self
    }

    pub fn with_range(self, min: f64, max: f64) -> Self {
        let format = self.field.formatter().clone().with_range(min, max);
        self.with_format(format)
    }

    pub fn with_policy(self, policy: RangePolicy) -> Self {
        let format = self.field.formatter().clone().with_policy(policy);
        self.with_format(format)
    }

    pub fn with_precision(self, decimals: usize) -> Self {
        let format = self.field.formatter().clone().with_precision(decimals);
        self.with_format(format)
    }

    pub fn with_placeholder(self, placeholder: impl Into<String>) -> Self {
        let format = self.field.formatter().clone().with_placeholder(placeholder);
        self.with_format(format)
    }

    /// Amount Up/Down move the value; PageUp/PageDown move ten steps.
    pub fn with_step(mut self, step: f64) -> Self {
        self.step = step.abs();
        self
    }

    /// Controlled by the parent's number.
    pub fn with_value(mut self, value: f64) -> Self {
        self.field = self.field.controlled(value);
        self
    }

    pub fn with_default_value(mut self, value: f64) -> Self {
        self.field = self.field.uncontrolled(Some(value));
        self
    }

    pub fn with_on_change(mut self, f: impl FnMut(&f64) + Send + 'static) -> Self {
        self.field.set_on_change(f);
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

    pub fn value(&self) -> Option<f64> {
        self.field.value().copied()
    }

    pub fn set_value(&mut self, value: f64) {
        self.field.sync(Some(value));
    }

    pub fn step(&self) -> f64 {
        self.step
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
}

fn changed(commit: Commit<f64>) -> Command<Message> {
    match picker::written(commit) {
        Some(value) => Command::message(Message::Changed(value)),
        None => Command::none(),
    }
}

impl Component for NumberInput {
    type Message = Message;

    fn update(&mut self, msg: Message) -> Command<Message> {
        match msg {
            Message::KeyPress(key) if self.chrome.focus => {
                let format = self.field.formatter().clone();
                let step = self.step;
                let commit = picker::route_key(&self.chrome.keys, &mut self.field, &key, |from, kind| {
                    let size = if kind.is_large() { step * 10.0 } else { step };
                    // An empty input steps from zero pulled into range.
                    let from = from.unwrap_or(0.0);
                    format.constrain(from + size * kind.sign() as f64)
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
    use crossterm::event::{KeyCode, KeyModifiers};
    use pearl_core::testing::{Harness, TestProgram};
    use std::sync::{Arc, Mutex};

    fn key(code: KeyCode) -> Message {
        Message::KeyPress(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn focused(mut input: NumberInput) -> NumberInput {
        input.focus();
        input
    }

    /// Clear the field with Ctrl+U, type `text`, press Enter.
    fn type_and_commit(input: &mut NumberInput, text: &str) -> Option<f64> {
        input.update(Message::KeyPress(KeyEvent::new(
            KeyCode::Char('u'),
            KeyModifiers::CONTROL,
        )));
        for c in text.chars() {
            input.update(key(KeyCode::Char(c)));
        }
        match input.update(key(KeyCode::Enter)).into_message() {
            Some(Message::Changed(v)) => Some(v),
            _ => None,
        }
    }

    #[test]
    fn clamp_policy_pulls_typed_values_into_range() {
        let mut input = focused(NumberInput::new().with_range(0.0, 100.0));
        assert_eq!(type_and_commit(&mut input, "150"), Some(100.0));
        assert_eq!(input.draft(), "100");
        assert_eq!(type_and_commit(&mut input, "-5"), Some(0.0));
        assert_eq!(input.value(), Some(0.0));
    }

    #[test]
    fn reject_policy_keeps_value_and_blur_reverts() {
        let mut input = focused(
            NumberInput::new()
                .with_range(0.0, 100.0)
                .with_policy(RangePolicy::Reject)
                .with_default_value(42.0),
        );
        assert_eq!(type_and_commit(&mut input, "150"), None);
        assert_eq!(input.value(), Some(42.0));
        assert!(matches!(input.error(), Some(ParseError::OutOfRange { .. })));
        assert!(input.blur().is_none());
        assert_eq!(input.draft(), "42");
    }

    #[test]
    fn arrows_step_within_bounds() {
        let mut input = focused(
            NumberInput::new()
                .with_range(0.0, 10.0)
                .with_step(2.0)
                .with_default_value(9.0),
        );
        input.update(key(KeyCode::Down));
        assert_eq!(input.value(), Some(7.0));
        input.update(key(KeyCode::Up));
        input.update(key(KeyCode::Up));
        assert_eq!(input.value(), Some(10.0));
        assert!(input.update(key(KeyCode::Up)).is_none(), "already at max");
        input.update(key(KeyCode::PageDown));
        assert_eq!(input.value(), Some(0.0));
    }

    #[test]
    fn empty_input_steps_from_zero() {
        let mut input = focused(NumberInput::new().with_range(5.0, 10.0));
        input.update(key(KeyCode::Up));
        assert_eq!(input.value(), Some(5.0));
    }

    #[test]
    fn precision_rounds_committed_value() {
        let mut input = focused(NumberInput::new().with_precision(2));
        assert_eq!(type_and_commit(&mut input, "3.14159"), Some(3.14));
        assert_eq!(input.draft(), "3.14");
    }

    #[test]
    fn controlled_input_requests_through_callback() {
        let requested = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&requested);
        let mut input = focused(
            NumberInput::new()
                .with_value(1.0)
                .with_on_change(move |v| sink.lock().unwrap().push(*v)),
        );
        input.update(key(KeyCode::Up));
        assert_eq!(*requested.lock().unwrap(), [2.0]);
        assert_eq!(input.value(), Some(1.0));
        assert_eq!(input.text(), "1");

        input.set_value(2.0);
        assert_eq!(input.text(), "2");
    }

    #[test]
    fn change_handler_survives_later_value_builders() {
        let requested = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&requested);
        let mut input = focused(
            NumberInput::new()
                .with_on_change(move |v| sink.lock().unwrap().push(*v))
                .with_value(1.0),
        );
        input.update(key(KeyCode::Up));
        assert_eq!(*requested.lock().unwrap(), [2.0]);
        assert_eq!(input.value(), Some(1.0));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut input = focused(
            NumberInput::new()
                .with_on_change(move |v| sink.lock().unwrap().push(*v))
                .with_default_value(4.0),
        );
        input.update(key(KeyCode::Down));
        assert_eq!(*seen.lock().unwrap(), [3.0]);
        assert_eq!(input.value(), Some(3.0));
    }

    #[test]
    fn renders_label_and_placeholder() {
        let input = NumberInput::new()
            .with_label("Guests")
            .with_placeholder("how many?");
        let prog = TestProgram::<Harness<NumberInput>>::new(input);
        assert!(prog.render_string(30, 1).starts_with("Guests: how many?"));
    }
}
