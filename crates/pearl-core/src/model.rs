use crate::command::Command;
use crate::subscription::Subscription;
use ratatui::Frame;

/// The top-level application trait, following the [Elm Architecture].
///
/// A pearl application is a `Model` that owns its input components. The
/// runtime drives **init -> update -> view**:
///
/// 1. [`init`](Model::init) builds the initial state (and the components it
///    owns) and may return a startup [`Command`].
/// 2. [`view`](Model::view) renders the state.
/// 3. Key events, timer wake-ups and fetch results arrive as messages.
/// 4. [`update`](Model::update) routes each message to the right component
///    and returns any follow-up [`Command`].
///
/// [Elm Architecture]: https://guide.elm-lang.org/architecture/
pub trait Model: Sized + Send + 'static {
    /// The application's message type.
    type Message: Send + 'static;

    /// Initialization data passed to [`Model::init`]. Use `()` when none is needed.
    type Flags: Send + 'static;

    /// Create the initial model state and an optional startup command.
    fn init(flags: Self::Flags) -> (Self, Command<Self::Message>);

    /// Process a message, mutate state, and return a command for side effects.
    fn update(&mut self, msg: Self::Message) -> Command<Self::Message>;

    /// Render the current state to a ratatui [`Frame`].
    ///
    /// Must be a pure function of `&self`; the runtime calls it after updates
    /// at most once per frame.
    fn view(&self, frame: &mut Frame);

    /// Declare active subscriptions. Called after every update.
    ///
    /// The runtime diffs the returned list against the previously active set,
    /// starting new subscriptions and cancelling removed ones.
    fn subscriptions(&self) -> Vec<Subscription<Self::Message>> {
        vec![]
    }
}
