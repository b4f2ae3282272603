//! Default drawing shared by every input: the root line and its styles.

use pearl_core::render_as::RootProps;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

/// Styles for an input's root line and overlay.
#[derive(Debug, Clone)]
pub struct InputStyle {
    pub label: Style,
    pub focused_label: Style,
    pub text: Style,
    pub placeholder: Style,
    pub invalid: Style,
    pub cursor: Style,
    /// Unhighlighted overlay rows.
    pub item: Style,
    /// The highlighted overlay row.
    pub highlighted: Style,
    /// Secondary text: groups, status lines, `+N`.
    pub muted: Style,
}

impl Default for InputStyle {
    fn default() -> Self {
        Self {
            label: Style::default(),
            focused_label: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            text: Style::default(),
            placeholder: Style::default().fg(Color::DarkGray),
            invalid: Style::default().fg(Color::Red),
            cursor: Style::default().add_modifier(Modifier::REVERSED),
            item: Style::default(),
            highlighted: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            muted: Style::default().fg(Color::DarkGray),
        }
    }
}

impl InputStyle {
    /// Style for the root text given its state.
    pub fn text_style(&self, root: &RootProps) -> Style {
        if root.invalid {
            self.invalid
        } else if root.is_placeholder {
            self.placeholder
        } else {
            self.text
        }
    }
}

/// Draw `Label: text` on the first row of `area`.
///
/// `body` replaces the plain text, so a focused input can show its cursor.
pub fn render_root(
    frame: &mut Frame,
    area: Rect,
    root: &RootProps,
    style: &InputStyle,
    body: Option<Vec<Span<'static>>>,
) {
    if area.height == 0 || area.width == 0 {
        return;
    }
    let mut spans = Vec::new();
    if !root.label.is_empty() {
        let label_style = if root.focused {
            style.focused_label
        } else {
            style.label
        };
        spans.push(Span::styled(format!("{}: ", root.label), label_style));
    }
    match body {
        Some(body) => spans.extend(body),
        None => spans.push(Span::styled(root.text.clone(), style.text_style(root))),
    }
    if root.open {
        spans.push(Span::styled(" ▾", style.muted));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), Rect { height: 1, ..area });
}

/// Width left for the value once the label is drawn.
pub fn body_width(area: Rect, label: &str) -> u16 {
    if label.is_empty() {
        area.width
    } else {
        area.width
            .saturating_sub(unicode_width::UnicodeWidthStr::width(label) as u16 + 2)
    }
}
