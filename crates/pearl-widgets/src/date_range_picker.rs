//! Start/end date input.
//!
//! Each end has its own draft; Tab switches the active end, committing a
//! valid draft and reverting an invalid one on the way out. The committed
//! range always satisfies `start <= end`: moving the start past the end
//! drags the end along, and moving the end before the start drags the
//! start. Until both ends hold a date no range is committed.

use crate::chrome::{self, InputStyle};
use crate::draft::{Commit, DraftField};
use crate::format::{DateFormat, DateRange, DateRangeFormat, Formatter};
use crate::key::PickerKeyBindings;
use crate::picker::{self, PickerChrome, Step};
use chrono::{Local, NaiveDate};
use crossterm::event::KeyEvent;
use pearl_core::command::Command;
use pearl_core::component::Component;
use pearl_core::controllable::Controllable;
use pearl_core::render_as::RenderAs;
use ratatui::layout::Rect;
use ratatui::text::Span;
use ratatui::Frame;

/// Which end of the range keys go to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActiveEnd {
    #[default]
    Start,
    End,
}

#[derive(Debug, Clone)]
pub enum Message {
    KeyPress(KeyEvent),
    Paste(String),
    Changed(DateRange),
}

pub struct DateRangePicker {
    format: DateRangeFormat,
    start: DraftField<DateFormat>,
    end: DraftField<DateFormat>,
    range: Controllable<DateRange>,
    active: ActiveEnd,
    chrome: PickerChrome,
    today: Option<NaiveDate>,
}

impl Default for DateRangePicker {
    fn default() -> Self {
        Self::new()
    }
}

impl DateRangePicker {
    pub fn new() -> Self {
        let format = DateRangeFormat::default();
        Self {
            start: DraftField::new(format.date_format().clone()),
            end: DraftField::new(format.date_format().clone()),
            format,
            range: Controllable::uncontrolled(None),
            active: ActiveEnd::Start,
            chrome: PickerChrome::default(),
            today: None,
        }
    }

    pub fn with_format(mut self, format: DateRangeFormat) -> Self {
        self.start.set_formatter(format.date_format().clone());
        self.end.set_formatter(format.date_format().clone());
        self.format = format;
        self
    }

    /// Controlled by the parent's range.
    pub fn with_value(mut self, range: DateRange) -> Self {
        self.range = self.range.rebuild(Some(range), None);
        self.mirror();
        self
    }

    pub fn with_default_value(mut self, range: DateRange) -> Self {
        self.range = self.range.rebuild(None, Some(range));
        self.mirror();
        self
    }

    pub fn with_on_change(mut self, f: impl FnMut(&DateRange) + Send + 'static) -> Self {
        self.range.set_on_change(f);
        self
    }

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

    pub fn value(&self) -> Option<DateRange> {
        self.range.get()
    }

    pub fn set_value(&mut self, range: DateRange) {
        self.range.sync(Some(range));
        self.mirror();
    }

    pub fn active(&self) -> ActiveEnd {
        self.active
    }

    /// Draft text of each end.
    pub fn drafts(&self) -> (String, String) {
        (self.start.draft(), self.end.draft())
    }

    pub fn is_invalid(&self) -> bool {
        self.start.is_invalid() || self.end.is_invalid()
    }

    /// `"start to end"`, each side falling back to its placeholder.
    pub fn text(&self) -> String {
        if let Some(range) = self.range.read() {
            return self.format.format(Some(range));
        }
        let date = self.format.date_format();
        format!(
            "{}{}{}",
            date.format(self.start.value()),
            self.format.separator(),
            date.format(self.end.value())
        )
    }

    pub fn key_bindings(&self) -> &PickerKeyBindings {
        self.chrome.keys()
    }

    pub fn focus(&mut self) {
        self.chrome.focus = true;
    }

    pub fn blur(&mut self) -> Command<Message> {
        self.chrome.focus = false;
        let cmd = self.leave_active();
        self.active = ActiveEnd::Start;
        cmd
    }

    fn field_mut(&mut self, end: ActiveEnd) -> &mut DraftField<DateFormat> {
        match end {
            ActiveEnd::Start => &mut self.start,
            ActiveEnd::End => &mut self.end,
        }
    }

    /// Copy the committed range into the end fields, unless one is mid-edit.
    fn mirror(&mut self) {
        if let Some(range) = self.range.get() {
            if !self.start.is_dirty() {
                self.start.set(range.start);
            }
            if !self.end.is_dirty() {
                self.end.set(range.end);
            }
        }
    }

    fn leave_active(&mut self) -> Command<Message> {
        let active = self.active;
        let commit = self.field_mut(active).blur();
        self.apply(active, commit)
    }

    /// Fold an end's commit into the range.
    fn apply(&mut self, end: ActiveEnd, commit: Commit<NaiveDate>) -> Command<Message> {
        let Some(date) = picker::written(commit) else {
            return Command::none();
        };
        let other = match end {
            ActiveEnd::Start => self.end.value().copied(),
            ActiveEnd::End => self.start.value().copied(),
        };
        let Some(other) = other else {
            return Command::none();
        };
        let next = match end {
            ActiveEnd::Start => DateRange {
                start: date,
                end: other.max(date),
            },
            ActiveEnd::End => DateRange {
                start: other.min(date),
                end: date,
            },
        };
        self.range.write(next);
        // Controlled ranges snap back to the prop; uncontrolled ones show the
        // adjusted range.
        if let Some(shown) = self.range.get() {
            self.start.set(shown.start);
            self.end.set(shown.end);
        }
        Command::message(Message::Changed(next))
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }
}

impl Component for DateRangePicker {
    type Message = Message;

    fn update(&mut self, msg: Message) -> Command<Message> {
        match msg {
            Message::KeyPress(key) if self.chrome.focus => {
                if self.chrome.keys.switch_end.matches(&key) {
                    let cmd = self.leave_active();
                    self.active = match self.active {
                        ActiveEnd::Start => ActiveEnd::End,
                        ActiveEnd::End => ActiveEnd::Start,
                    };
                    return cmd;
                }
                let active = self.active;
                let today = self.today();
                let format = self.format.date_format().clone();
                // An empty end steps from the other end, else from today.
                let seed = match active {
                    ActiveEnd::Start => self.end.value().copied(),
                    ActiveEnd::End => self.start.value().copied(),
                }
                .unwrap_or(today);
                let keys = self.chrome.keys.clone();
                let commit = picker::route_key(&keys, self.field_mut(active), &key, |from, step| {
                    let Some(from) = from else {
                        return format.constrain(seed);
                    };
                    match step {
                        Step::Increment | Step::Decrement => format.add_days(from, step.sign()),
                        Step::IncrementLarge | Step::DecrementLarge => {
                            format.add_months(from, step.sign() as i32)
                        }
                    }
                });
                self.apply(active, commit)
            }
            Message::Paste(text) if self.chrome.focus => {
                let active = self.active;
                let field = self.field_mut(active);
                let draft = format!("{}{}", field.draft(), text.trim());
                field.edit(&draft);
                Command::none()
            }
            _ => Command::none(),
        }
    }

    fn view(&self, frame: &mut Frame, area: Rect) {
        if area.height == 0 {
            return;
        }
        let focus = self.chrome.focus;
        let (text, is_placeholder) = if focus {
            (self.text(), false)
        } else {
            let both_empty = self.start.value().is_none() && self.end.value().is_none();
            (self.text(), both_empty)
        };
        let root = self
            .chrome
            .root_props(text, is_placeholder, self.is_invalid());
        let style = &self.chrome.style;
        let body_width = chrome::body_width(area, &self.chrome.label);
        self.chrome
            .root
            .render(frame, Rect { height: 1, ..area }, &root, |f, a, r| {
                let body = focus.then(|| {
                    let separator = self.format.separator();
                    let side = |field: &DraftField<DateFormat>, active: bool| -> Vec<Span<'static>> {
                        let text_style = if field.is_invalid() {
                            style.invalid
                        } else {
                            style.text
                        };
                        if active {
                            let width = body_width.saturating_sub(separator.len() as u16) / 2;
                            field.editor().spans(width.max(1), text_style, style.cursor, true)
                        } else {
                            let (text, placeholder) = field.display(false);
                            let s = if placeholder { style.placeholder } else { text_style };
                            vec![Span::styled(text, s)]
                        }
                    };
                    let mut spans = side(&self.start, self.active == ActiveEnd::Start);
                    spans.push(Span::styled(separator.to_string(), style.muted));
                    spans.extend(side(&self.end, self.active == ActiveEnd::End));
                    spans
                });
                chrome::render_root(f, a, r, style, body)
            });
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

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn range(a: NaiveDate, b: NaiveDate) -> DateRange {
        DateRange::new(a, b).unwrap()
    }

    fn press(picker: &mut DateRangePicker, code: KeyCode) -> Option<DateRange> {
        let msg = Message::KeyPress(KeyEvent::new(code, KeyModifiers::NONE));
        match picker.update(msg).into_message() {
            Some(Message::Changed(r)) => Some(r),
            _ => None,
        }
    }

    fn type_str(picker: &mut DateRangePicker, text: &str) {
        for c in text.chars() {
            press(picker, KeyCode::Char(c));
        }
    }

    fn focused(mut picker: DateRangePicker) -> DateRangePicker {
        picker.focus();
        picker
    }

    #[test]
    fn both_ends_typed_then_committed() {
        let mut picker = focused(DateRangePicker::new());
        type_str(&mut picker, "2024-07-01");
        assert_eq!(press(&mut picker, KeyCode::Tab), None, "no end yet");
        assert_eq!(picker.active(), ActiveEnd::End);
        type_str(&mut picker, "2024-07-04");
        let committed = press(&mut picker, KeyCode::Enter).unwrap();
        assert_eq!(committed, range(date(2024, 7, 1), date(2024, 7, 4)));
        assert_eq!(committed.days(), 4);
        assert_eq!(picker.text(), "2024-07-01 to 2024-07-04");
    }

    #[test]
    fn start_past_end_drags_end() {
        let mut picker = focused(
            DateRangePicker::new().with_default_value(range(date(2024, 1, 1), date(2024, 1, 3))),
        );
        press(&mut picker, KeyCode::Up);
        press(&mut picker, KeyCode::Up);
        let r = press(&mut picker, KeyCode::Up).unwrap();
        assert_eq!(r, range(date(2024, 1, 4), date(2024, 1, 4)));
        assert_eq!(picker.drafts(), ("2024-01-04".into(), "2024-01-04".into()));
    }

    #[test]
    fn end_before_start_drags_start() {
        let mut picker = focused(
            DateRangePicker::new().with_default_value(range(date(2024, 3, 10), date(2024, 3, 20))),
        );
        press(&mut picker, KeyCode::Tab);
        let r = press(&mut picker, KeyCode::PageDown).unwrap();
        assert_eq!(r, range(date(2024, 2, 20), date(2024, 2, 20)));
    }

    #[test]
    fn invalid_draft_reverts_when_switching_ends() {
        let mut picker = focused(
            DateRangePicker::new().with_default_value(range(date(2024, 5, 1), date(2024, 5, 2))),
        );
        type_str(&mut picker, "zz");
        assert!(picker.is_invalid());
        assert_eq!(press(&mut picker, KeyCode::Tab), None);
        assert_eq!(picker.drafts().0, "2024-05-01");
        assert!(!picker.is_invalid());
    }

    #[test]
    fn controlled_range_waits_for_parent() {
        let initial = range(date(2024, 1, 1), date(2024, 1, 2));
        let mut picker = focused(DateRangePicker::new().with_value(initial));
        let requested = press(&mut picker, KeyCode::Up).unwrap();
        assert_eq!(requested, range(date(2024, 1, 2), date(2024, 1, 2)));
        assert_eq!(picker.value(), Some(initial));
        assert_eq!(picker.drafts().0, "2024-01-01");

        picker.set_value(requested);
        assert_eq!(picker.drafts(), ("2024-01-02".into(), "2024-01-02".into()));
    }

    #[test]
    fn empty_end_steps_from_start() {
        let mut picker = focused(DateRangePicker::new().with_today(date(2030, 1, 1)));
        type_str(&mut picker, "2024-09-09");
        press(&mut picker, KeyCode::Tab);
        let r = press(&mut picker, KeyCode::Up).unwrap();
        assert_eq!(r, range(date(2024, 9, 9), date(2024, 9, 9)));
    }

    #[test]
    fn renders_both_placeholders() {
        let picker = DateRangePicker::new().with_label("Stay");
        let prog = TestProgram::<Harness<DateRangePicker>>::new(picker);
        assert!(prog
            .render_string(40, 1)
            .starts_with("Stay: YYYY-MM-DD to YYYY-MM-DD"));
    }
}
