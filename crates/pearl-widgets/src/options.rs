//! Option datasets for the comboboxes.

use futures::future::{self, BoxFuture, FutureExt};
use pearl_core::search::{SearchError, SearchSource};
use std::collections::HashSet;
use std::sync::Arc;

/// One selectable entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub label: String,
    /// Identity of the option. Unique within an [`OptionList`].
    pub value: String,
    pub group: Option<String>,
}

impl SelectOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            group: None,
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OptionsError {
    #[error("duplicate option value {0:?}")]
    DuplicateValue(String),
}

/// An ordered set of options with unique values.
///
/// Options are kept in insertion order. When any option has a group, the
/// display order puts ungrouped options first, then each group in order of
/// first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionList {
    options: Vec<SelectOption>,
}

impl OptionList {
    pub fn new(options: impl IntoIterator<Item = SelectOption>) -> Result<Self, OptionsError> {
        let options: Vec<SelectOption> = options.into_iter().collect();
        let mut seen = HashSet::new();
        for option in &options {
            if !seen.insert(option.value.as_str()) {
                return Err(OptionsError::DuplicateValue(option.value.clone()));
            }
        }
        Ok(Self { options })
    }

    /// Build from `(label, value)` pairs.
    pub fn from_pairs<L, V>(pairs: impl IntoIterator<Item = (L, V)>) -> Result<Self, OptionsError>
    where
        L: Into<String>,
        V: Into<String>,
    {
        Self::new(pairs.into_iter().map(|(l, v)| SelectOption::new(l, v)))
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Options in insertion order.
    pub fn as_slice(&self) -> &[SelectOption] {
        &self.options
    }

    pub fn find(&self, value: &str) -> Option<&SelectOption> {
        self.options.iter().find(|o| o.value == value)
    }

    /// Label for `value`, if it names an option.
    pub fn label_of(&self, value: &str) -> Option<&str> {
        self.find(value).map(|o| o.label.as_str())
    }

    /// Options in display order.
    pub fn display_order(&self) -> Vec<&SelectOption> {
        group_order(self.options.iter())
    }

    /// Case-insensitive substring match on the label, in display order.
    pub fn filter(&self, term: &str) -> Vec<SelectOption> {
        let term = term.to_lowercase();
        group_order(
            self.options
                .iter()
                .filter(|o| o.label.to_lowercase().contains(&term)),
        )
        .into_iter()
        .cloned()
        .collect()
    }
}

/// Stable ordering: ungrouped first, then groups by first appearance.
pub fn group_order<'a>(options: impl Iterator<Item = &'a SelectOption>) -> Vec<&'a SelectOption> {
    let mut ungrouped = Vec::new();
    let mut groups: Vec<(&str, Vec<&SelectOption>)> = Vec::new();
    for option in options {
        match option.group.as_deref() {
            None => ungrouped.push(option),
            Some(name) => match groups.iter_mut().find(|(g, _)| *g == name) {
                Some((_, members)) => members.push(option),
                None => groups.push((name, vec![option])),
            },
        }
    }
    ungrouped
        .into_iter()
        .chain(groups.into_iter().flat_map(|(_, members)| members))
        .collect()
}

/// In-memory [`SearchSource`] over an [`OptionList`].
#[derive(Debug, Clone)]
pub struct StaticSource {
    options: Arc<OptionList>,
}

impl StaticSource {
    pub fn new(options: OptionList) -> Self {
        Self {
            options: Arc::new(options),
        }
    }
}

impl SearchSource<SelectOption> for StaticSource {
    fn search(
        &self,
        term: &str,
    ) -> BoxFuture<'static, Result<Vec<SelectOption>, SearchError>> {
        future::ready(Ok(self.options.filter(term))).boxed()
    }
}
