//! Highlightable option list drawn below a combobox.

use crate::chrome::InputStyle;
use crate::options::SelectOption;
use crate::selection_set::truncate;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Clear, Paragraph};
use ratatui::Frame;

/// Options plus a wrapping highlight and a scroll window.
#[derive(Debug, Clone)]
pub struct Listbox {
    options: Vec<SelectOption>,
    highlight: usize,
    offset: usize,
    max_visible: usize,
}

impl Listbox {
    pub fn new(max_visible: usize) -> Self {
        Self {
            options: Vec::new(),
            highlight: 0,
            offset: 0,
            max_visible: max_visible.max(1),
        }
    }

    /// Replace the options and highlight the first.
    pub fn set_options(&mut self, options: Vec<SelectOption>) {
        self.options = options;
        self.highlight = 0;
        self.offset = 0;
    }

    pub fn options(&self) -> &[SelectOption] {
        &self.options
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn highlight_index(&self) -> usize {
        self.highlight
    }

    pub fn highlighted(&self) -> Option<&SelectOption> {
        self.options.get(self.highlight)
    }

    pub fn max_visible(&self) -> usize {
        self.max_visible
    }

    pub fn move_down(&mut self) {
        if self.options.is_empty() {
            return;
        }
        self.highlight = (self.highlight + 1) % self.options.len();
        self.ensure_visible();
    }

    pub fn move_up(&mut self) {
        if self.options.is_empty() {
            return;
        }
        self.highlight = self
            .highlight
            .checked_sub(1)
            .unwrap_or(self.options.len() - 1);
        self.ensure_visible();
    }

    pub fn home(&mut self) {
        self.highlight = 0;
        self.ensure_visible();
    }

    pub fn end(&mut self) {
        self.highlight = self.options.len().saturating_sub(1);
        self.ensure_visible();
    }

    fn ensure_visible(&mut self) {
        if self.highlight < self.offset {
            self.offset = self.highlight;
        } else if self.highlight >= self.offset + self.max_visible {
            self.offset = self.highlight + 1 - self.max_visible;
        }
    }

    /// Rows the overlay needs: the visible options, or one status line.
    pub fn height(&self, status: Option<&str>) -> u16 {
        let rows = self.options.len().min(self.max_visible);
        (rows + usize::from(status.is_some())).max(1) as u16
    }

    /// Draw the visible window. `marked` flags options shown with a check
    /// (the multi-select's current selection). `status` is appended as a
    /// muted line ("searching…", "no results", an error).
    pub fn render(
        &self,
        frame: &mut Frame,
        area: Rect,
        style: &InputStyle,
        marked: impl Fn(&SelectOption) -> bool,
        status: Option<&str>,
    ) {
        if area.height == 0 {
            return;
        }
        frame.render_widget(Clear, area);
        let width = area.width as usize;
        let mut lines: Vec<Line> = self
            .options
            .iter()
            .enumerate()
            .skip(self.offset)
            .take(self.max_visible)
            .map(|(i, option)| {
                let row_style = if i == self.highlight {
                    style.highlighted
                } else {
                    style.item
                };
                let pointer = if i == self.highlight { "▸ " } else { "  " };
                let check = if marked(option) { "✓ " } else { "" };
                let mut spans = vec![Span::styled(
                    truncate(&format!("{pointer}{check}{}", option.label), width),
                    row_style,
                )];
                if let Some(group) = &option.group {
                    spans.push(Span::styled(format!("  {group}"), style.muted));
                }
                Line::from(spans)
            })
            .collect();
        if let Some(status) = status {
            lines.push(Line::from(Span::styled(format!("  {status}"), style.muted)));
        }
        frame.render_widget(Paragraph::new(lines), area);
    }
}
