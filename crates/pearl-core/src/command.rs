use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A side effect returned from [`Component::update`](crate::Component::update)
/// or [`Model::update`](crate::Model::update).
///
/// A command only describes work. The runtime (or the headless
/// [`TestProgram`](crate::testing::TestProgram)) runs it and feeds whatever
/// message it produces back through `update`. Components never spawn tasks
/// themselves, so the search coordinator can order fetches purely by the
/// messages that come back.
///
/// ```rust,ignore
/// // Fetch, then turn the result into a message:
/// let cmd = Command::perform(source.search(term), move |r| Msg::Resolved(seq, r));
///
/// // Wake up once after the debounce window:
/// let cmd = Command::tick(Duration::from_millis(300), move |_| Msg::Elapsed(gen));
/// ```
pub struct Command<Msg: Send + 'static> {
    pub(crate) effect: Effect<Msg>,
}

/// What running a command does.
pub(crate) enum Effect<Msg: Send + 'static> {
    Nothing,
    Emit(Msg),
    Quit,
    Await(BoxFuture<'static, Msg>),
    /// Children run concurrently.
    Batch(Vec<Command<Msg>>),
    /// Each child finishes before the next starts.
    Sequence(Vec<Command<Msg>>),
}

type Mapper<A, B> = Arc<dyn Fn(A) -> B + Send + Sync>;

impl<Msg: Send + 'static> Command<Msg> {
    fn from_effect(effect: Effect<Msg>) -> Self {
        Command { effect }
    }

    /// Nothing to do.
    pub fn none() -> Self {
        Self::from_effect(Effect::Nothing)
    }

    /// Deliver `msg` on the next turn of the loop.
    pub fn message(msg: Msg) -> Self {
        Self::from_effect(Effect::Emit(msg))
    }

    /// Stop the program.
    pub fn quit() -> Self {
        Self::from_effect(Effect::Quit)
    }

    /// Await `future` and turn its output into a message.
    pub fn perform<F, T>(future: F, map: impl FnOnce(T) -> Msg + Send + 'static) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Self::from_effect(Effect::Await(Box::pin(async move { map(future.await) })))
    }

    /// One-shot timer: fires once after `duration`.
    ///
    /// Issued timers cannot be cancelled. Callers that only care about the
    /// newest timer tag the message with a generation and drop older ones
    /// when they arrive.
    pub fn tick(duration: Duration, map: impl FnOnce(Instant) -> Msg + Send + 'static) -> Self {
        Self::perform(tokio::time::sleep(duration), move |()| map(Instant::now()))
    }

    /// Run `cmds` concurrently. No-ops are dropped; a single survivor is
    /// returned as is.
    pub fn batch(cmds: impl IntoIterator<Item = Command<Msg>>) -> Self {
        Self::group(cmds, Effect::Batch)
    }

    /// Run `cmds` in order; each one's message is delivered before the next
    /// one starts.
    pub fn sequence(cmds: impl IntoIterator<Item = Command<Msg>>) -> Self {
        Self::group(cmds, Effect::Sequence)
    }

    fn group(
        cmds: impl IntoIterator<Item = Command<Msg>>,
        wrap: fn(Vec<Command<Msg>>) -> Effect<Msg>,
    ) -> Self {
        let mut cmds: Vec<_> = cmds.into_iter().filter(|c| !c.is_none()).collect();
        if cmds.len() > 1 {
            return Self::from_effect(wrap(cmds));
        }
        cmds.pop().unwrap_or_else(Command::none)
    }

    /// Wrap every message this command produces, typically into the parent's
    /// message enum.
    pub fn map<NewMsg: Send + 'static>(
        self,
        f: impl Fn(Msg) -> NewMsg + Send + Sync + 'static,
    ) -> Command<NewMsg> {
        self.map_shared(Arc::new(f))
    }

    fn map_shared<NewMsg: Send + 'static>(self, f: Mapper<Msg, NewMsg>) -> Command<NewMsg> {
        let effect = match self.effect {
            Effect::Nothing => Effect::Nothing,
            Effect::Emit(msg) => Effect::Emit(f(msg)),
            Effect::Quit => Effect::Quit,
            Effect::Await(fut) => Effect::Await(Box::pin(async move { f(fut.await) })),
            Effect::Batch(cmds) => Effect::Batch(map_all(cmds, &f)),
            Effect::Sequence(cmds) => Effect::Sequence(map_all(cmds, &f)),
        };
        Command { effect }
    }

    pub fn is_none(&self) -> bool {
        matches!(self.effect, Effect::Nothing)
    }

    /// Whether running this command awaits a timer or a fetch anywhere in
    /// its tree.
    pub fn is_async(&self) -> bool {
        match &self.effect {
            Effect::Await(_) => true,
            Effect::Batch(cmds) | Effect::Sequence(cmds) => cmds.iter().any(Command::is_async),
            Effect::Nothing | Effect::Emit(_) | Effect::Quit => false,
        }
    }

    pub fn is_quit(&self) -> bool {
        matches!(self.effect, Effect::Quit)
    }

    /// The message, if this command is exactly [`Command::message`].
    pub fn into_message(self) -> Option<Msg> {
        match self.effect {
            Effect::Emit(msg) => Some(msg),
            _ => None,
        }
    }

    /// The children, if this command is a batch.
    pub fn into_batch(self) -> Option<Vec<Command<Msg>>> {
        match self.effect {
            Effect::Batch(cmds) => Some(cmds),
            _ => None,
        }
    }

    /// Every immediate message in the tree, depth first. Timers and fetches
    /// are dropped unrun.
    pub fn into_messages(self) -> Vec<Msg> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(cmd) = stack.pop() {
            match cmd.effect {
                Effect::Emit(msg) => out.push(msg),
                Effect::Batch(cmds) | Effect::Sequence(cmds) => {
                    stack.extend(cmds.into_iter().rev());
                }
                Effect::Nothing | Effect::Quit | Effect::Await(_) => {}
            }
        }
        out
    }
}

fn map_all<A: Send + 'static, B: Send + 'static>(
    cmds: Vec<Command<A>>,
    f: &Mapper<A, B>,
) -> Vec<Command<B>> {
    cmds.into_iter().map(|cmd| cmd.map_shared(f.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_is_neither_async_nor_quit() {
        let cmd: Command<()> = Command::none();
        assert!(cmd.is_none());
        assert!(!cmd.is_async());
        assert!(!cmd.is_quit());
    }

    #[test]
    fn grouping_drops_noops() {
        let single: Command<i32> = Command::batch([Command::none(), Command::message(1)]);
        assert_eq!(single.into_message(), Some(1));

        let empty: Command<()> = Command::sequence([Command::none(), Command::none()]);
        assert!(empty.is_none());

        let pair: Command<i32> = Command::batch([Command::message(1), Command::message(2)]);
        assert_eq!(pair.into_batch().map(|c| c.len()), Some(2));
    }

    #[tokio::test]
    async fn timers_and_fetches_are_async() {
        let tick: Command<()> = Command::tick(Duration::from_millis(5), |_| ());
        assert!(tick.is_async());

        let fetch: Command<u8> = Command::perform(async { 7u8 }, |n| n);
        assert!(Command::batch([Command::message(1), fetch]).is_async());
    }

    #[test]
    fn map_wraps_messages_and_keeps_quit() {
        let mapped: Command<String> = Command::message(42).map(|n: i32| n.to_string());
        assert_eq!(mapped.into_message().as_deref(), Some("42"));

        let quit: Command<String> = Command::<i32>::quit().map(|n| n.to_string());
        assert!(quit.is_quit());
    }

    #[tokio::test]
    async fn into_messages_flattens_in_order() {
        let cmd: Command<i32> = Command::batch([
            Command::message(1),
            Command::sequence([Command::message(2), Command::message(3)]),
            Command::tick(Duration::from_secs(1), |_| 99),
            Command::message(4),
        ]);
        assert_eq!(cmd.into_messages(), vec![1, 2, 3, 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn mapped_future_goes_through_both_mappers() {
        let cmd: Command<i32> = Command::perform(async { 20 }, |n| n + 1).map(|n| n * 2);
        match cmd.effect {
            Effect::Await(fut) => assert_eq!(fut.await, 42),
            _ => panic!("expected a future"),
        }
    }
}
