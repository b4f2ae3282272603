//! Key bindings shared by the pickers and the data table.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// One or more key combinations mapped to a described action.
#[derive(Debug, Clone)]
pub struct Binding {
    pub keys: Vec<KeyCombination>,
    /// Human-readable description shown in help lines.
    pub description: String,
    /// Disabled bindings never match.
    pub enabled: bool,
}

/// A key press with the modifiers that must be held.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCombination {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl Binding {
    pub fn new(key: KeyCombination, description: impl Into<String>) -> Self {
        Self::with_keys(vec![key], description)
    }

    pub fn with_keys(keys: Vec<KeyCombination>, description: impl Into<String>) -> Self {
        Self {
            keys,
            description: description.into(),
            enabled: true,
        }
    }

    /// Whether `event` matches any of the combinations.
    ///
    /// Extra modifiers on the event are tolerated, so `Shift+G` still matches
    /// a binding for `G`.
    pub fn matches(&self, event: &KeyEvent) -> bool {
        self.enabled
            && self
                .keys
                .iter()
                .any(|k| k.code == event.code && event.modifiers.contains(k.modifiers))
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// `"up/k move up"` style help text.
    pub fn help(&self) -> String {
        let keys: Vec<String> = self.keys.iter().map(KeyCombination::label).collect();
        format!("{} {}", keys.join("/"), self.description)
    }
}

impl KeyCombination {
    pub fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn ctrl(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::CONTROL,
        }
    }

    pub fn shift(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::SHIFT,
        }
    }

    fn label(&self) -> String {
        let base = match self.code {
            KeyCode::Up => "↑".to_string(),
            KeyCode::Down => "↓".to_string(),
            KeyCode::Left => "←".to_string(),
            KeyCode::Right => "→".to_string(),
            KeyCode::PageUp => "pgup".to_string(),
            KeyCode::PageDown => "pgdn".to_string(),
            KeyCode::Home => "home".to_string(),
            KeyCode::End => "end".to_string(),
            KeyCode::Enter => "enter".to_string(),
            KeyCode::Esc => "esc".to_string(),
            KeyCode::Tab => "tab".to_string(),
            KeyCode::BackTab => "shift+tab".to_string(),
            KeyCode::Backspace => "backspace".to_string(),
            KeyCode::Char(' ') => "space".to_string(),
            KeyCode::Char(c) => c.to_string(),
            other => format!("{other:?}").to_lowercase(),
        };
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            format!("ctrl+{base}")
        } else {
            base
        }
    }
}

/// Types that expose their bindings for a help line.
pub trait KeyMap {
    /// The few bindings worth showing in a one-line footer.
    fn short_help(&self) -> Vec<&Binding>;

    /// Render [`short_help`](KeyMap::short_help) as `"a • b • c"`.
    fn help_line(&self) -> String {
        self.short_help()
            .iter()
            .filter(|b| b.enabled)
            .map(|b| b.help())
            .collect::<Vec<_>>()
            .join(" • ")
    }
}

/// Keys for the stepping inputs: date, date range, number and time pickers.
#[derive(Debug, Clone)]
pub struct PickerKeyBindings {
    /// Step up one unit (day, `step`, minute step). Default: Up
    pub increment: Binding,
    /// Step down one unit. Default: Down
    pub decrement: Binding,
    /// Step up one large unit (month, ten steps, hour). Default: PageUp
    pub increment_large: Binding,
    /// Step down one large unit. Default: PageDown
    pub decrement_large: Binding,
    /// Parse and commit the draft. Default: Enter
    pub commit: Binding,
    /// Revert the draft to the committed value. Default: Esc
    pub revert: Binding,
    /// Switch the active end of a range. Default: Tab, Shift+Tab
    pub switch_end: Binding,
}

impl Default for PickerKeyBindings {
    fn default() -> Self {
        Self {
            increment: Binding::new(KeyCombination::new(KeyCode::Up), "increase"),
            decrement: Binding::new(KeyCombination::new(KeyCode::Down), "decrease"),
            increment_large: Binding::new(KeyCombination::new(KeyCode::PageUp), "increase more"),
            decrement_large: Binding::new(KeyCombination::new(KeyCode::PageDown), "decrease more"),
            commit: Binding::new(KeyCombination::new(KeyCode::Enter), "commit"),
            revert: Binding::new(KeyCombination::new(KeyCode::Esc), "revert"),
            switch_end: Binding::with_keys(
                vec![
                    KeyCombination::new(KeyCode::Tab),
                    KeyCombination::new(KeyCode::BackTab),
                ],
                "switch end",
            ),
        }
    }
}

impl KeyMap for PickerKeyBindings {
    fn short_help(&self) -> Vec<&Binding> {
        vec![&self.increment, &self.decrement, &self.commit, &self.revert]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn binding_matches_any_key() {
        let b = Binding::with_keys(
            vec![
                KeyCombination::new(KeyCode::Up),
                KeyCombination::new(KeyCode::Char('k')),
            ],
            "up",
        );
        assert!(b.matches(&press(KeyCode::Up, KeyModifiers::NONE)));
        assert!(b.matches(&press(KeyCode::Char('k'), KeyModifiers::NONE)));
        assert!(!b.matches(&press(KeyCode::Down, KeyModifiers::NONE)));
    }

    #[test]
    fn required_modifier_must_be_held() {
        let b = Binding::new(KeyCombination::ctrl(KeyCode::Char('d')), "half down");
        assert!(!b.matches(&press(KeyCode::Char('d'), KeyModifiers::NONE)));
        assert!(b.matches(&press(KeyCode::Char('d'), KeyModifiers::CONTROL)));
    }

    #[test]
    fn disabled_binding_never_matches() {
        let b = Binding::new(KeyCombination::new(KeyCode::Enter), "commit").enabled(false);
        assert!(!b.matches(&press(KeyCode::Enter, KeyModifiers::NONE)));
    }

    #[test]
    fn help_line_joins_enabled_bindings() {
        let mut keys = PickerKeyBindings::default();
        keys.revert = keys.revert.enabled(false);
        assert_eq!(keys.help_line(), "↑ increase • ↓ decrease • enter commit");
    }
}
