use crate::command::Command;
use crate::subscription::Subscription;
use ratatui::{layout::Rect, Frame};

/// A reusable sub-model that renders into a given [`Rect`] area.
///
/// Every pearl input (comboboxes, pickers, the data table) is a `Component`.
/// The parent owns the component, forwards key events into
/// [`update`](Component::update), lifts the returned [`Command`] with
/// [`Command::map`], and decides where the component draws by passing it a
/// sub-region of the frame.
///
/// # Composition pattern
///
/// ```rust,ignore
/// use pearl_core::{Command, Component, Model};
/// use pearl_widgets::number_input::{self, NumberInput};
///
/// struct App { guests: NumberInput }
///
/// enum AppMsg { Guests(number_input::Message) }
///
/// impl Model for App {
///     type Message = AppMsg;
///     type Flags = ();
///
///     fn init(_: ()) -> (Self, Command<AppMsg>) {
///         (App { guests: NumberInput::new().with_range(1.0, 12.0) }, Command::none())
///     }
///
///     fn update(&mut self, msg: AppMsg) -> Command<AppMsg> {
///         match msg {
///             AppMsg::Guests(m) => self.guests.update(m).map(AppMsg::Guests),
///         }
///     }
///
///     fn view(&self, frame: &mut Frame) {
///         self.guests.view(frame, frame.area());
///     }
/// }
/// ```
pub trait Component: Send + 'static {
    /// The component's internal message type.
    ///
    /// Parent models wrap this in one of their own message variants so that
    /// key events, timer wake-ups and fetch results are routed back to the
    /// instance that asked for them.
    type Message: Send + 'static;

    /// Process a message, mutate state, and return a [`Command`] for side effects.
    fn update(&mut self, msg: Self::Message) -> Command<Self::Message>;

    /// Render into a specific `area` of the [`Frame`].
    fn view(&self, frame: &mut Frame, area: Rect);

    /// Declare active subscriptions for this component.
    ///
    /// The parent collects these and includes them, mapped, in its own
    /// [`Model::subscriptions`](crate::Model::subscriptions).
    fn subscriptions(&self) -> Vec<Subscription<Self::Message>> {
        vec![]
    }

    /// Whether this component currently has focus.
    fn focused(&self) -> bool {
        false
    }

    /// Tear the component down.
    ///
    /// Components with pending timers or in-flight fetches invalidate them
    /// here, so anything that still arrives afterwards is discarded instead of
    /// mutating state. The default does nothing.
    fn unmount(&mut self) {}
}
