//! Ordered set of selected values for the multi-select combobox.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Selected option values, insertion order preserved, no duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    values: Vec<String>,
}

/// What the trigger line shows for a [`SelectionSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChipSummary {
    /// Labels of the first `max_displayed` selections.
    pub chips: Vec<String>,
    /// How many selections are summarized as `+N`.
    pub overflow: usize,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `value` at the end. Returns false if it was already selected.
    pub fn insert(&mut self, value: impl Into<String>) -> bool {
        let value = value.into();
        if self.contains(&value) {
            return false;
        }
        self.values.push(value);
        true
    }

    /// Remove `value`. Returns false if it was not selected.
    pub fn remove(&mut self, value: &str) -> bool {
        let before = self.values.len();
        self.values.retain(|v| v != value);
        self.values.len() != before
    }

    /// Select `value` if absent, deselect it if present. Returns whether it
    /// is selected afterwards.
    pub fn toggle(&mut self, value: &str) -> bool {
        if self.remove(value) {
            false
        } else {
            self.values.push(value.to_string());
            true
        }
    }

    /// Remove and return the most recently added value.
    pub fn pop(&mut self) -> Option<String> {
        self.values.pop()
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(String::as_str)
    }

    /// Cap the displayed chips at `max_displayed`; the rest become `+N`.
    /// Nothing is dropped from the set.
    pub fn summary(&self, max_displayed: usize, label: impl Fn(&str) -> String) -> ChipSummary {
        ChipSummary {
            chips: self.values.iter().take(max_displayed).map(|v| label(v.as_str())).collect(),
            overflow: self.values.len().saturating_sub(max_displayed),
        }
    }
}

impl<S: Into<String>> FromIterator<S> for SelectionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = SelectionSet::new();
        for value in iter {
            set.insert(value);
        }
        set
    }
}

impl ChipSummary {
    /// `"[Oslo] [Lima] +4"`, truncated to `width` display cells.
    pub fn to_line(&self, width: usize) -> String {
        let mut parts: Vec<String> = self.chips.iter().map(|c| format!("[{c}]")).collect();
        if self.overflow > 0 {
            parts.push(format!("+{}", self.overflow));
        }
        truncate(&parts.join(" "), width)
    }
}

/// Cut `s` to at most `max_width` display cells, ending in `…` when cut.
pub(crate) fn truncate(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    if max_width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > max_width - 1 {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}
