//! Plumbing shared by the stepping inputs (date, date range, number, time).
//!
//! Each picker owns one or more [`DraftField`]s and a [`PickerChrome`]. Keys
//! go through [`route_key`], which steps, commits, reverts, or edits the
//! draft depending on the bindings.

use crate::chrome::{self, InputStyle};
use crate::draft::{Commit, DraftField};
use crate::format::Formatter;
use crate::key::PickerKeyBindings;
use crossterm::event::KeyEvent;
use pearl_core::render_as::{RenderAs, RootProps, RootSlot};
use ratatui::layout::Rect;
use ratatui::Frame;

/// Which stepping key was pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Increment,
    Decrement,
    IncrementLarge,
    DecrementLarge,
}

impl Step {
    /// `1` for increments, `-1` for decrements.
    pub fn sign(self) -> i64 {
        match self {
            Step::Increment | Step::IncrementLarge => 1,
            Step::Decrement | Step::DecrementLarge => -1,
        }
    }

    pub fn is_large(self) -> bool {
        matches!(self, Step::IncrementLarge | Step::DecrementLarge)
    }

    fn from_key(keys: &PickerKeyBindings, key: &KeyEvent) -> Option<Self> {
        if keys.increment.matches(key) {
            Some(Step::Increment)
        } else if keys.decrement.matches(key) {
            Some(Step::Decrement)
        } else if keys.increment_large.matches(key) {
            Some(Step::IncrementLarge)
        } else if keys.decrement_large.matches(key) {
            Some(Step::DecrementLarge)
        } else {
            None
        }
    }
}

/// Focus, label, style, bindings and the optional root delegate.
#[derive(Default)]
pub struct PickerChrome {
    pub(crate) focus: bool,
    pub(crate) label: String,
    pub(crate) root: RootSlot,
    pub(crate) style: InputStyle,
    pub(crate) keys: PickerKeyBindings,
}

impl PickerChrome {
    pub fn focused(&self) -> bool {
        self.focus
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn keys(&self) -> &PickerKeyBindings {
        &self.keys
    }

    pub(crate) fn set_render_as(&mut self, delegate: impl RenderAs + 'static) {
        self.root.set(delegate);
    }

    /// Root props for a field displayed with `text`.
    pub(crate) fn root_props(&self, text: String, is_placeholder: bool, invalid: bool) -> RootProps {
        RootProps {
            label: self.label.clone(),
            text,
            is_placeholder,
            focused: self.focus,
            open: false,
            invalid,
        }
    }

    /// Draw one draft field as the root line.
    pub(crate) fn render_field<F: Formatter>(
        &self,
        frame: &mut Frame,
        area: Rect,
        field: &DraftField<F>,
    ) {
        if area.height == 0 {
            return;
        }
        let (text, is_placeholder) = field.display(self.focus);
        let invalid = field.is_invalid();
        let root = self.root_props(text, is_placeholder, invalid);
        let body_width = chrome::body_width(area, &self.label);
        self.root.render(frame, Rect { height: 1, ..area }, &root, |f, a, r| {
            let body = self.focus.then(|| {
                let text_style = if invalid {
                    self.style.invalid
                } else {
                    self.style.text
                };
                field
                    .editor()
                    .spans(body_width, text_style, self.style.cursor, true)
            });
            chrome::render_root(f, a, r, &self.style, body)
        });
    }
}

/// Apply one key to `field`.
///
/// `step` receives the value to step from (the parsed draft, else the
/// committed value) and returns the next value, or `None` when the step is
/// refused by the bounds.
pub(crate) fn route_key<F: Formatter>(
    keys: &PickerKeyBindings,
    field: &mut DraftField<F>,
    key: &KeyEvent,
    step: impl FnOnce(Option<F::Value>, Step) -> Option<F::Value>,
) -> Commit<F::Value> {
    if let Some(kind) = Step::from_key(keys, key) {
        return match step(field.working_value(), kind) {
            Some(next) => field.set(next),
            None => Commit::Unchanged,
        };
    }
    if keys.commit.matches(key) {
        return field.commit();
    }
    if keys.revert.matches(key) {
        field.revert();
        return Commit::Unchanged;
    }
    field.handle_key(key);
    Commit::Unchanged
}

/// The value a `Changed` notification should carry, if any.
pub(crate) fn written<V>(commit: Commit<V>) -> Option<V> {
    match commit {
        Commit::Written(value, _) => Some(value),
        Commit::Unchanged | Commit::Rejected(_) => None,
    }
}
