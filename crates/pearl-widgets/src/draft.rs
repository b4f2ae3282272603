//! Draft text layered over a controllable value.
//!
//! What the user types lives in the draft. It reaches the value only through
//! [`DraftField::commit`], and only if the formatter accepts it; invalid text
//! is reverted on [`DraftField::blur`].

use crate::format::{Formatter, ParseError};
use crate::text_edit::{Edit, TextEditState};
use crossterm::event::KeyEvent;
use pearl_core::controllable::{Controllable, WriteOutcome};

/// Result of trying to move the draft into the value.
#[derive(Debug, Clone, PartialEq)]
pub enum Commit<V> {
    /// Nothing typed, or the text denotes the current value.
    Unchanged,
    /// The value was written (or requested, when controlled).
    Written(V, WriteOutcome),
    /// The formatter refused the text; the value is untouched.
    Rejected(ParseError),
}

pub struct DraftField<F: Formatter> {
    formatter: F,
    value: Controllable<F::Value>,
    draft: TextEditState,
    dirty: bool,
    error: Option<ParseError>,
}

impl<F: Formatter> DraftField<F> {
    /// Uncontrolled with no value.
    pub fn new(formatter: F) -> Self {
        Self::with_source(formatter, Controllable::uncontrolled(None))
    }

    /// Build over an existing value source.
    pub fn with_source(formatter: F, value: Controllable<F::Value>) -> Self {
        let mut field = Self {
            formatter,
            value,
            draft: TextEditState::new(),
            dirty: false,
            error: None,
        };
        field.resync();
        field
    }

    /// Make the field controlled by `value`.
    pub fn controlled(self, value: F::Value) -> Self {
        Self::with_source(self.formatter, self.value.rebuild(Some(value), None))
    }

    /// Make the field uncontrolled, starting at `value`.
    pub fn uncontrolled(self, value: Option<F::Value>) -> Self {
        Self::with_source(self.formatter, self.value.rebuild(None, value))
    }

    pub fn set_on_change(&mut self, f: impl FnMut(&F::Value) + Send + 'static) {
        self.value.set_on_change(f);
    }

    pub fn formatter(&self) -> &F {
        &self.formatter
    }

    /// Replace the formatter (new bounds, pattern) and redisplay.
    pub fn set_formatter(&mut self, formatter: F) {
        self.formatter = formatter;
        if !self.dirty {
            self.resync();
        }
    }

    pub fn value(&self) -> Option<&F::Value> {
        self.value.read()
    }

    pub fn source(&self) -> &Controllable<F::Value> {
        &self.value
    }

    pub fn draft(&self) -> String {
        self.draft.value()
    }

    pub fn editor(&self) -> &TextEditState {
        &self.draft
    }

    /// The user has typed since the last commit or revert.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The last rejection, cleared by a successful commit or a revert.
    pub fn error(&self) -> Option<&ParseError> {
        self.error.as_ref()
    }

    /// Whether the visible draft would be rejected.
    pub fn is_invalid(&self) -> bool {
        self.dirty && self.formatter.parse(&self.draft.value()).is_err()
    }

    /// Route an editing key into the draft.
    pub fn handle_key(&mut self, key: &KeyEvent) -> Edit {
        let edit = self.draft.handle_key(key);
        if edit == Edit::Changed {
            self.dirty = true;
        }
        edit
    }

    /// Replace the draft text wholesale (paste, programmatic edit).
    pub fn edit(&mut self, text: &str) {
        self.draft.set_value(text);
        self.dirty = true;
    }

    /// Parse the draft and write it if it is valid and different.
    pub fn commit(&mut self) -> Commit<F::Value> {
        if !self.dirty {
            return Commit::Unchanged;
        }
        match self.formatter.parse(&self.draft.value()) {
            Ok(next) => {
                self.error = None;
                if self.value.read() == Some(&next) {
                    self.resync();
                    return Commit::Unchanged;
                }
                let outcome = self.value.write(next.clone());
                self.resync();
                Commit::Written(next, outcome)
            }
            Err(err) => {
                tracing::debug!(draft = %self.draft.value(), error = %err, "draft rejected");
                self.error = Some(err.clone());
                Commit::Rejected(err)
            }
        }
    }

    /// Commit if valid, otherwise revert to the committed value.
    pub fn blur(&mut self) -> Commit<F::Value> {
        let result = self.commit();
        if matches!(result, Commit::Rejected(_)) {
            self.revert();
        }
        result
    }

    /// Drop the draft and show the committed value again.
    pub fn revert(&mut self) {
        self.error = None;
        self.resync();
    }

    /// Write a value computed by the component (a step, a calendar pick).
    pub fn set(&mut self, next: F::Value) -> Commit<F::Value> {
        self.error = None;
        if self.value.read() == Some(&next) {
            self.resync();
            return Commit::Unchanged;
        }
        let outcome = self.value.write(next.clone());
        self.resync();
        Commit::Written(next, outcome)
    }

    /// The value a step should start from: the draft if it parses, else the
    /// committed value.
    pub fn working_value(&self) -> Option<F::Value> {
        if self.dirty {
            if let Ok(v) = self.formatter.parse(&self.draft.value()) {
                return Some(v);
            }
        }
        self.value.get()
    }

    /// Re-supply the parent's prop. The draft follows unless the user is
    /// mid-edit.
    pub fn sync(&mut self, external: Option<F::Value>) {
        self.value.sync(external);
        if !self.dirty {
            self.resync();
        }
    }

    /// Text for the root line: the draft while editing or focused, the
    /// formatted value (or placeholder) otherwise. The flag is true for the
    /// placeholder.
    pub fn display(&self, focused: bool) -> (String, bool) {
        if focused || self.dirty {
            let draft = self.draft.value();
            if !draft.is_empty() || focused {
                return (draft, false);
            }
        }
        match self.value.read() {
            Some(v) if self.formatter.in_range(v) => (self.formatter.display(v), false),
            _ => (self.formatter.placeholder().to_string(), true),
        }
    }

    fn resync(&mut self) {
        let text = self
            .value
            .read()
            .map(|v| self.formatter.display(v))
            .unwrap_or_default();
        self.draft.set_value(&text);
        self.dirty = false;
    }
}
