use crate::command::{Command, Effect};
use crate::component::Component;
use crate::model::Model;
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::Terminal;
use std::time::Duration;

/// A headless harness that drives a [`Model`] without a terminal.
///
/// Synchronous commands ([`Command::message`]) are queued and flushed with
/// [`drain_messages`](TestProgram::drain_messages). Async commands (debounce
/// timers, fetches) are parked; [`settle`](TestProgram::settle) and
/// [`run_for`](TestProgram::run_for) drive them and feed their messages back
/// in the order they complete, which is the order a real event loop would
/// see. Pair with `#[tokio::test(start_paused = true)]` so timers resolve
/// instantly and deterministically.
///
/// # Example
///
/// ```rust,ignore
/// use pearl_core::testing::TestProgram;
///
/// let mut prog = TestProgram::<SearchApp>::new(());
/// prog.send(AppMsg::Type('a'));
/// prog.send(AppMsg::Type('b'));
/// prog.settle().await;                 // debounce fires once, fetch resolves
/// assert_eq!(prog.model().fetches, 1);
/// ```
pub struct TestProgram<M: Model> {
    model: M,
    pending_messages: Vec<M::Message>,
    in_flight: FuturesUnordered<BoxFuture<'static, M::Message>>,
    quit: bool,
}

impl<M: Model> TestProgram<M> {
    /// Create a test program by calling [`Model::init`] with the given flags.
    pub fn new(flags: M::Flags) -> Self {
        let (model, init_cmd) = M::init(flags);
        let mut program = Self {
            model,
            pending_messages: Vec::new(),
            in_flight: FuturesUnordered::new(),
            quit: false,
        };
        program.collect(init_cmd);
        program
    }

    /// Send a message, triggering a single update cycle.
    ///
    /// Synchronous follow-ups are queued, not processed; call
    /// [`drain_messages`](TestProgram::drain_messages) for that.
    pub fn send(&mut self, msg: M::Message) {
        let cmd = self.model.update(msg);
        self.collect(cmd);
    }

    /// Process queued synchronous messages until none remain.
    pub fn drain_messages(&mut self) {
        while !self.pending_messages.is_empty() {
            let messages: Vec<_> = self.pending_messages.drain(..).collect();
            for msg in messages {
                let cmd = self.model.update(msg);
                self.collect(cmd);
            }
        }
    }

    /// Number of async commands started but not yet completed.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Whether any update returned [`Command::quit`].
    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    /// Drive every async command (and whatever they schedule) to completion.
    pub async fn settle(&mut self) {
        self.drive(None).await;
    }

    /// Drive async commands until `duration` of (tokio) time has passed.
    ///
    /// Commands that have not completed by then stay parked and keep running
    /// on the next `settle`/`run_for`.
    pub async fn run_for(&mut self, duration: Duration) {
        self.drive(Some(duration)).await;
    }

    /// Drop all parked async commands without delivering their messages.
    /// Models a torn-down event loop.
    pub fn abandon_in_flight(&mut self) {
        self.in_flight = FuturesUnordered::new();
    }

    /// Get a shared reference to the model for assertions.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Get a mutable reference to the model for direct test setup.
    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    /// Render the model to a ratatui [`Buffer`] of the given dimensions.
    pub fn render(&self, width: u16, height: u16) -> Buffer {
        let backend = ratatui::backend::TestBackend::new(width, height);
        let mut terminal = Terminal::new(backend).expect("test backend never fails");
        terminal
            .draw(|frame| self.model.view(frame))
            .expect("test backend never fails");
        terminal.backend().buffer().clone()
    }

    /// Render the model and return the visible content, one line per row.
    pub fn render_string(&self, width: u16, height: u16) -> String {
        buffer_to_string(&self.render(width, height))
    }

    async fn drive(&mut self, limit: Option<Duration>) {
        self.drain_messages();
        let deadline = limit.map(|d| tokio::time::Instant::now() + d);

        loop {
            let next = match deadline {
                Some(deadline) => {
                    if self.in_flight.is_empty() {
                        tokio::time::sleep_until(deadline).await;
                        return;
                    }
                    tokio::select! {
                        msg = self.in_flight.next() => msg,
                        _ = tokio::time::sleep_until(deadline) => return,
                    }
                }
                None => self.in_flight.next().await,
            };

            match next {
                Some(msg) => {
                    self.send(msg);
                    self.drain_messages();
                }
                None => return,
            }
        }
    }

    fn collect(&mut self, cmd: Command<M::Message>) {
        match cmd.effect {
            Effect::Nothing => {}
            Effect::Emit(msg) => self.pending_messages.push(msg),
            Effect::Quit => self.quit = true,
            Effect::Await(fut) => self.in_flight.push(fut),
            // The harness has no ordering between sibling futures beyond
            // completion time, so sequences are driven like batches.
            Effect::Batch(cmds) | Effect::Sequence(cmds) => {
                for cmd in cmds {
                    self.collect(cmd);
                }
            }
        }
    }
}

/// Hosts one [`Component`] as a [`Model`] so [`TestProgram`] can drive it.
///
/// Every message the component receives is recorded, including the
/// outbound notifications (`Changed`, `Confirm`) a parent would react to.
///
/// ```rust,ignore
/// let mut prog = TestProgram::<Harness<DataCombobox>>::new(combo);
/// prog.send(combobox::Message::KeyPress(key));
/// prog.settle().await;
/// assert!(prog.model().seen().iter().any(|m| matches!(m, Message::Changed(_))));
/// ```
pub struct Harness<C: Component> {
    component: C,
    seen: Vec<C::Message>,
}

impl<C: Component> Harness<C> {
    pub fn component(&self) -> &C {
        &self.component
    }

    pub fn component_mut(&mut self) -> &mut C {
        &mut self.component
    }

    /// Messages delivered so far, oldest first.
    pub fn seen(&self) -> &[C::Message] {
        &self.seen
    }

    /// Drain the recorded messages.
    pub fn take_seen(&mut self) -> Vec<C::Message> {
        std::mem::take(&mut self.seen)
    }
}

impl<C> Model for Harness<C>
where
    C: Component,
    C::Message: Clone,
{
    type Message = C::Message;
    type Flags = C;

    fn init(component: C) -> (Self, Command<C::Message>) {
        (
            Harness {
                component,
                seen: Vec::new(),
            },
            Command::none(),
        )
    }

    fn update(&mut self, msg: C::Message) -> Command<C::Message> {
        self.seen.push(msg.clone());
        self.component.update(msg)
    }

    fn view(&self, frame: &mut ratatui::Frame) {
        self.component.view(frame, frame.area());
    }
}

/// Flatten a buffer into rows of text separated by newlines.
pub fn buffer_to_string(buf: &Buffer) -> String {
    let area: Rect = buf.area;
    let mut output = String::new();
    for y in area.top()..area.bottom() {
        for x in area.left()..area.right() {
            output.push_str(buf[(x, y)].symbol());
        }
        if y + 1 < area.bottom() {
            output.push('\n');
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{search_fn, SearchCoordinator, SearchMessage};
    use ratatui::widgets::Paragraph;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// A model that owns a search coordinator whose fetch latency depends on
    /// the term: short terms are slow, long ones fast.
    struct SearchApp {
        search: SearchCoordinator<String>,
        fetches: Arc<AtomicUsize>,
    }

    #[derive(Debug)]
    enum AppMsg {
        Type(&'static str),
        Search(SearchMessage<String>),
        Unmount,
    }

    impl Model for SearchApp {
        type Message = AppMsg;
        type Flags = ();

        fn init(_: ()) -> (Self, Command<AppMsg>) {
            let fetches = Arc::new(AtomicUsize::new(0));
            let counter = fetches.clone();
            let source = search_fn(move |term: String| {
                counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    let latency = 600 / term.len() as u64;
                    tokio::time::sleep(Duration::from_millis(latency)).await;
                    Ok(vec![format!("{term}!")])
                }
            });
            (
                SearchApp {
                    search: SearchCoordinator::new(source),
                    fetches,
                },
                Command::none(),
            )
        }

        fn update(&mut self, msg: AppMsg) -> Command<AppMsg> {
            match msg {
                AppMsg::Type(term) => self.search.input(term).map(AppMsg::Search),
                AppMsg::Search(m) => self.search.update(m).map(AppMsg::Search),
                AppMsg::Unmount => {
                    self.search.unmount();
                    Command::none()
                }
            }
        }

        fn view(&self, frame: &mut ratatui::Frame) {
            let text = self.search.results().join(",");
            frame.render_widget(Paragraph::new(text), frame.area());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn inputs_within_window_fetch_once() {
        let mut prog = TestProgram::<SearchApp>::new(());
        prog.send(AppMsg::Type("a"));
        prog.run_for(Duration::from_millis(100)).await;
        prog.send(AppMsg::Type("ab"));
        prog.run_for(Duration::from_millis(100)).await;
        prog.send(AppMsg::Type("abc"));
        prog.settle().await;

        assert_eq!(prog.model().fetches.load(Ordering::SeqCst), 1);
        assert_eq!(prog.model().search.results(), ["abc!".to_string()]);
        assert!(prog.render_string(10, 1).starts_with("abc!"));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_superseded_fetch_never_lands() {
        let mut prog = TestProgram::<SearchApp>::new(());
        // "a" clears the debounce window and starts a 600ms fetch.
        prog.send(AppMsg::Type("a"));
        prog.run_for(Duration::from_millis(350)).await;
        assert_eq!(prog.model().fetches.load(Ordering::SeqCst), 1);

        // "abc" supersedes it with a 200ms fetch that finishes first.
        prog.send(AppMsg::Type("abc"));
        prog.settle().await;

        assert_eq!(prog.model().fetches.load(Ordering::SeqCst), 2);
        assert_eq!(prog.model().search.results(), ["abc!".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn unmount_while_pending_applies_nothing() {
        let mut prog = TestProgram::<SearchApp>::new(());
        prog.send(AppMsg::Type("abc"));
        prog.run_for(Duration::from_millis(320)).await;
        assert_eq!(prog.in_flight(), 1, "fetch should be running");

        prog.send(AppMsg::Unmount);
        prog.settle().await;
        assert!(prog.model().search.results().is_empty());
    }

    struct ChainModel {
        steps: Vec<String>,
    }

    #[derive(Debug)]
    enum ChainMsg {
        Start,
        Step(String),
        Stop,
    }

    impl Model for ChainModel {
        type Message = ChainMsg;
        type Flags = ();

        fn init(_: ()) -> (Self, Command<ChainMsg>) {
            (ChainModel { steps: vec![] }, Command::none())
        }

        fn update(&mut self, msg: ChainMsg) -> Command<ChainMsg> {
            match msg {
                ChainMsg::Start => {
                    self.steps.push("started".into());
                    Command::message(ChainMsg::Step("auto".into()))
                }
                ChainMsg::Step(s) => {
                    self.steps.push(s);
                    Command::none()
                }
                ChainMsg::Stop => Command::quit(),
            }
        }

        fn view(&self, frame: &mut ratatui::Frame) {
            frame.render_widget(Paragraph::new(self.steps.join(", ")), frame.area());
        }
    }

    #[test]
    fn command_message_chaining() {
        let mut prog = TestProgram::<ChainModel>::new(());
        prog.send(ChainMsg::Start);
        prog.drain_messages();
        assert_eq!(prog.model().steps, vec!["started", "auto"]);
        assert!(prog.render_string(30, 1).contains("started, auto"));
    }

    #[test]
    fn quit_is_recorded() {
        let mut prog = TestProgram::<ChainModel>::new(());
        assert!(!prog.quit_requested());
        prog.send(ChainMsg::Stop);
        assert!(prog.quit_requested());
    }
}
