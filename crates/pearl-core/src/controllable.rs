//! Controlled/uncontrolled value ownership shared by every stateful input.
//!
//! A component's value is either **controlled** (the parent owns it and
//! re-supplies it through [`Controllable::sync`]) or **uncontrolled** (the
//! component owns it, seeded from a default). The mode is decided once, at
//! construction, from whether an external value was supplied.
//!
//! ```rust,ignore
//! use pearl_core::controllable::{Controllable, Mode, WriteOutcome};
//!
//! // Uncontrolled: the component keeps what the user picks.
//! let mut v = Controllable::new(None, Some(3));
//! assert_eq!(v.write(5), WriteOutcome::Committed);
//! assert_eq!(v.read(), Some(&5));
//!
//! // Controlled: writes are requests; the parent decides.
//! let mut v = Controllable::new(Some(3), None).with_on_change(|n| println!("wants {n}"));
//! assert_eq!(v.write(5), WriteOutcome::Requested);
//! assert_eq!(v.read(), Some(&3));
//! ```

use std::fmt;

/// Who owns the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// The parent owns the value; reads always reflect the last synced prop.
    Controlled,
    /// The instance owns the value for its whole lifetime.
    Uncontrolled,
}

/// What a [`Controllable::write`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Uncontrolled: the value was stored.
    Committed,
    /// Controlled: the change handler was asked; the displayed value only
    /// moves if the parent syncs the new value back.
    Requested,
    /// Controlled with no change handler installed. Nothing happened.
    Ignored,
}

type ChangeHandler<T> = Box<dyn FnMut(&T) + Send>;

/// A value that is either caller-owned or instance-owned.
pub struct Controllable<T> {
    mode: Mode,
    external: Option<T>,
    internal: Option<T>,
    on_change: Option<ChangeHandler<T>>,
    warned: bool,
}

impl<T> Controllable<T> {
    /// Build from the caller's prop and default.
    ///
    /// `Some(external)` fixes the mode to [`Mode::Controlled`] and the default
    /// is ignored; otherwise the mode is [`Mode::Uncontrolled`] and internal
    /// state starts at `default`.
    pub fn new(external: Option<T>, default: Option<T>) -> Self {
        match external {
            Some(value) => Self {
                mode: Mode::Controlled,
                external: Some(value),
                internal: None,
                on_change: None,
                warned: false,
            },
            None => Self {
                mode: Mode::Uncontrolled,
                external: None,
                internal: default,
                on_change: None,
                warned: false,
            },
        }
    }

    /// Controlled from the start.
    pub fn controlled(value: T) -> Self {
        Self::new(Some(value), None)
    }

    /// Uncontrolled, seeded with `default`.
    pub fn uncontrolled(default: Option<T>) -> Self {
        Self::new(None, default)
    }

    /// A fresh value from a new prop and default that keeps the change
    /// handler, so builders can be chained in any order.
    pub fn rebuild(self, external: Option<T>, default: Option<T>) -> Self {
        Self {
            on_change: self.on_change,
            ..Self::new(external, default)
        }
    }

    /// Install the change handler. Called on every write in both modes.
    pub fn with_on_change(mut self, f: impl FnMut(&T) + Send + 'static) -> Self {
        self.on_change = Some(Box::new(f));
        self
    }

    /// Replace the change handler.
    pub fn set_on_change(&mut self, f: impl FnMut(&T) + Send + 'static) {
        self.on_change = Some(Box::new(f));
    }

    /// The ownership mode fixed at construction.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Whether the parent owns the value.
    pub fn is_controlled(&self) -> bool {
        self.mode == Mode::Controlled
    }

    /// The current value: the synced prop when controlled, internal state otherwise.
    pub fn read(&self) -> Option<&T> {
        match self.mode {
            Mode::Controlled => self.external.as_ref(),
            Mode::Uncontrolled => self.internal.as_ref(),
        }
    }

    /// Propose a new value.
    pub fn write(&mut self, next: T) -> WriteOutcome {
        match self.mode {
            Mode::Controlled => match self.on_change.as_mut() {
                Some(on_change) => {
                    on_change(&next);
                    WriteOutcome::Requested
                }
                None => {
                    tracing::debug!("controlled value written without a change handler; ignored");
                    WriteOutcome::Ignored
                }
            },
            Mode::Uncontrolled => {
                if let Some(on_change) = self.on_change.as_mut() {
                    on_change(&next);
                }
                self.internal = Some(next);
                WriteOutcome::Committed
            }
        }
    }

    /// Re-supply the caller's prop.
    ///
    /// When controlled this replaces the displayed value. Passing `None` while
    /// controlled, or `Some` while uncontrolled, is an attempt to switch
    /// modes after construction: it is reported once per instance and
    /// otherwise ignored for uncontrolled instances. A controlled instance
    /// whose prop disappears reads `None`; no internal value is substituted.
    pub fn sync(&mut self, external: Option<T>) {
        match (self.mode, external) {
            (Mode::Controlled, Some(value)) => self.external = Some(value),
            (Mode::Controlled, None) => {
                self.warn_mode_switch("controlled", "uncontrolled");
                self.external = None;
            }
            (Mode::Uncontrolled, Some(_)) => self.warn_mode_switch("uncontrolled", "controlled"),
            (Mode::Uncontrolled, None) => {}
        }
    }

    /// Reset the internal value of an uncontrolled instance without notifying.
    ///
    /// Used when a component clears itself (e.g. "clear selection"). Does
    /// nothing for controlled instances.
    pub fn reset(&mut self, value: Option<T>) {
        if self.mode == Mode::Uncontrolled {
            self.internal = value;
        }
    }

    fn warn_mode_switch(&mut self, from: &str, to: &str) {
        if self.warned {
            return;
        }
        self.warned = true;
        tracing::warn!(
            from,
            to,
            "component changed from {from} to {to} after mount; the ownership mode is fixed at construction"
        );
    }
}

impl<T: Clone> Controllable<T> {
    /// Clone of the current value.
    pub fn get(&self) -> Option<T> {
        self.read().cloned()
    }
}

impl<T: fmt::Debug> fmt::Debug for Controllable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controllable")
            .field("mode", &self.mode)
            .field("value", &self.read())
            .field("has_on_change", &self.on_change.is_some())
            .finish()
    }
}
