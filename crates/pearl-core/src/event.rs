use crossterm::event::{KeyEvent, KeyEventKind, MouseEvent};

/// Terminal events delivered through [`terminal_events`](crate::terminal_events).
///
/// Components only consume [`Key`](TerminalEvent::Key) and
/// [`Paste`](TerminalEvent::Paste); the rest are exposed so applications can
/// react to resizes or focus changes of the terminal window itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalEvent {
    /// A key press. Release and repeat events are filtered out.
    Key(KeyEvent),
    /// A mouse event.
    Mouse(MouseEvent),
    /// Terminal resized to (columns, rows).
    Resize(u16, u16),
    /// Terminal window gained focus.
    FocusGained,
    /// Terminal window lost focus.
    FocusLost,
    /// Bracketed paste content.
    Paste(String),
}

impl TerminalEvent {
    /// Convert a crossterm event, dropping key releases (Windows reports both
    /// press and release, which would double every keystroke in an input).
    pub fn from_crossterm(event: crossterm::event::Event) -> Option<Self> {
        use crossterm::event::Event;
        match event {
            Event::Key(k) if k.kind == KeyEventKind::Release => None,
            Event::Key(k) => Some(TerminalEvent::Key(k)),
            Event::Mouse(m) => Some(TerminalEvent::Mouse(m)),
            Event::Resize(w, h) => Some(TerminalEvent::Resize(w, h)),
            Event::FocusGained => Some(TerminalEvent::FocusGained),
            Event::FocusLost => Some(TerminalEvent::FocusLost),
            Event::Paste(s) => Some(TerminalEvent::Paste(s)),
        }
    }
}
