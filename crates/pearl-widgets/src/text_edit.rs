//! Single-line text buffer behind every typed input.
//!
//! Comboboxes feed its contents to a search coordinator; pickers treat it as
//! a draft that only reaches the committed value through a formatter.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::style::Style;
use ratatui::text::Span;
use unicode_width::UnicodeWidthChar;

/// What a key did to the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    /// The text changed.
    Changed,
    /// Only the cursor moved.
    Moved,
    /// The key is not an editing key; the caller may handle it.
    Unhandled,
}

/// Character buffer plus cursor.
#[derive(Debug, Clone, Default)]
pub struct TextEditState {
    chars: Vec<char>,
    cursor: usize,
    max_len: Option<usize>,
}

impl TextEditState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the number of characters. Longer input is truncated.
    pub fn with_max_len(mut self, max: usize) -> Self {
        self.max_len = Some(max);
        self.chars.truncate(max);
        self.cursor = self.cursor.min(self.chars.len());
        self
    }

    pub fn value(&self) -> String {
        self.chars.iter().collect()
    }

    /// Replace the text and put the cursor at the end.
    pub fn set_value(&mut self, s: &str) {
        self.chars = s.chars().collect();
        if let Some(max) = self.max_len {
            self.chars.truncate(max);
        }
        self.cursor = self.chars.len();
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn clear(&mut self) {
        self.chars.clear();
        self.cursor = 0;
    }

    /// Insert at the cursor. Returns false when the buffer is full.
    pub fn insert_char(&mut self, c: char) -> bool {
        if self.max_len.is_some_and(|max| self.chars.len() >= max) {
            return false;
        }
        self.chars.insert(self.cursor, c);
        self.cursor += 1;
        true
    }

    /// Insert pasted text, dropping newlines and whatever exceeds the cap.
    pub fn insert_str(&mut self, s: &str) -> usize {
        s.chars()
            .filter(|c| !c.is_control())
            .take_while(|&c| self.insert_char(c))
            .count()
    }

    pub fn delete_back(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        self.chars.remove(self.cursor);
        true
    }

    pub fn delete_forward(&mut self) -> bool {
        if self.cursor >= self.chars.len() {
            return false;
        }
        self.chars.remove(self.cursor);
        true
    }

    /// Delete back to the previous space-separated word start.
    pub fn delete_word_back(&mut self) -> bool {
        let start = self.cursor;
        while self.cursor > 0 && self.chars[self.cursor - 1] == ' ' {
            self.cursor -= 1;
        }
        while self.cursor > 0 && self.chars[self.cursor - 1] != ' ' {
            self.cursor -= 1;
        }
        self.chars.drain(self.cursor..start);
        self.cursor != start
    }

    /// Apply a key. Up/Down/Enter/Esc/Tab are left to the caller.
    pub fn handle_key(&mut self, key: &KeyEvent) -> Edit {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('w') if ctrl => changed(self.delete_word_back()),
            KeyCode::Char('u') if ctrl => {
                let had = self.cursor > 0;
                self.chars.drain(..self.cursor);
                self.cursor = 0;
                changed(had)
            }
            KeyCode::Char('k') if ctrl => {
                let had = self.cursor < self.chars.len();
                self.chars.truncate(self.cursor);
                changed(had)
            }
            KeyCode::Char('a') if ctrl => self.move_to(0),
            KeyCode::Char('e') if ctrl => self.move_to(self.chars.len()),
            KeyCode::Char(_) if ctrl || key.modifiers.contains(KeyModifiers::ALT) => {
                Edit::Unhandled
            }
            KeyCode::Char(c) => changed(self.insert_char(c)),
            KeyCode::Backspace => changed(self.delete_back()),
            KeyCode::Delete => changed(self.delete_forward()),
            KeyCode::Left => self.move_to(self.cursor.saturating_sub(1)),
            KeyCode::Right => self.move_to((self.cursor + 1).min(self.chars.len())),
            KeyCode::Home => self.move_to(0),
            KeyCode::End => self.move_to(self.chars.len()),
            _ => Edit::Unhandled,
        }
    }

    fn move_to(&mut self, pos: usize) -> Edit {
        self.cursor = pos;
        Edit::Moved
    }

    /// Spans for a field `width` cells wide, scrolled so the cursor stays
    /// visible. The cursor cell uses `cursor_style` when `show_cursor` is set.
    pub fn spans(
        &self,
        width: u16,
        text_style: Style,
        cursor_style: Style,
        show_cursor: bool,
    ) -> Vec<Span<'static>> {
        let width = width as usize;
        if width == 0 {
            return Vec::new();
        }
        // Scroll left until the text before the cursor plus the cursor cell fits.
        let mut start = 0;
        let mut used: usize = self.chars[..self.cursor]
            .iter()
            .map(|c| c.width().unwrap_or(0))
            .sum::<usize>()
            + 1;
        while used > width && start < self.cursor {
            used -= self.chars[start].width().unwrap_or(0);
            start += 1;
        }

        let before: String = self.chars[start..self.cursor].iter().collect();
        let mut spans = vec![Span::styled(before, text_style)];

        let at_cursor = self
            .chars
            .get(self.cursor)
            .map(|c| c.to_string())
            .unwrap_or_else(|| " ".to_string());
        if show_cursor {
            spans.push(Span::styled(at_cursor, cursor_style));
        } else if self.cursor < self.chars.len() {
            spans.push(Span::styled(at_cursor, text_style));
        }

        if self.cursor + 1 < self.chars.len() {
            let after: String = self.chars[self.cursor + 1..].iter().collect();
            spans.push(Span::styled(after, text_style));
        }
        spans
    }
}

fn changed(did: bool) -> Edit {
    if did {
        Edit::Changed
    } else {
        Edit::Moved
    }
}
