//! Root rendering delegation.
//!
//! Every pearl component draws a one-line "root" (the trigger showing the
//! current value) and, for some, an overlay below it. A caller may replace
//! the root with its own drawing by installing a [`RenderAs`] delegate; the
//! component keeps owning state, key handling and the overlay.
//!
//! ```rust,ignore
//! let picker = DatePicker::new().with_render_as(|frame: &mut Frame, area: Rect, root: &RootProps| {
//!     let text = format!("[{}]", root.text);
//!     frame.render_widget(Paragraph::new(text), area);
//! });
//! ```

use ratatui::layout::Rect;
use ratatui::Frame;

/// Everything a delegate needs to draw a component's root.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RootProps {
    /// The component's label (may be empty).
    pub label: String,
    /// The formatted value, draft text, or placeholder.
    pub text: String,
    /// `text` is the placeholder, not a value.
    pub is_placeholder: bool,
    /// The component has keyboard focus.
    pub focused: bool,
    /// An overlay (dropdown, suggestions) is open.
    pub open: bool,
    /// The visible draft does not parse.
    pub invalid: bool,
}

/// Draws a component's root in place of its default trigger line.
pub trait RenderAs: Send {
    fn render(&self, frame: &mut Frame, area: Rect, root: &RootProps);
}

impl<F> RenderAs for F
where
    F: Fn(&mut Frame, Rect, &RootProps) + Send,
{
    fn render(&self, frame: &mut Frame, area: Rect, root: &RootProps) {
        self(frame, area, root)
    }
}

/// Optional delegate slot held by components.
#[derive(Default)]
pub struct RootSlot {
    delegate: Option<Box<dyn RenderAs>>,
}

impl RootSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a delegate, replacing any previous one.
    pub fn set(&mut self, delegate: impl RenderAs + 'static) {
        self.delegate = Some(Box::new(delegate));
    }

    pub fn is_delegated(&self) -> bool {
        self.delegate.is_some()
    }

    /// Draw with the delegate if one is installed, else with `default`.
    pub fn render(
        &self,
        frame: &mut Frame,
        area: Rect,
        root: &RootProps,
        default: impl FnOnce(&mut Frame, Rect, &RootProps),
    ) {
        match &self.delegate {
            Some(delegate) => delegate.render(frame, area, root),
            None => default(frame, area, root),
        }
    }
}
