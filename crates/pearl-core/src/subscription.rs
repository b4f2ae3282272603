//! Long-lived event sources, diffed by identity on every update cycle.
//!
//! Pearl applications normally need exactly one subscription, the terminal
//! event stream from [`terminal_events`]. Component timers are one-shot
//! [`Command::tick`](crate::Command::tick)s instead, since a debounce window
//! restarts on every keystroke.

use crate::event::TerminalEvent;
use crossterm::event::EventStream;
use futures::stream::BoxStream;
use futures::StreamExt;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

/// Where a running subscription delivers. Returns `false` once nobody is
/// listening any more.
type Sink<Msg> = Arc<dyn Fn(Msg) -> bool + Send + Sync>;

type Start<Msg> = Box<dyn FnOnce(Sink<Msg>) -> AbortHandle + Send>;

/// An event source the runtime starts once and keeps while the model keeps
/// returning a subscription with the same [`SubscriptionId`].
pub struct Subscription<Msg: Send + 'static> {
    pub(crate) id: SubscriptionId,
    start: Start<Msg>,
}

/// Identity of a subscription: a marker type plus a discriminant.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId {
    kind: TypeId,
    discriminant: u64,
}

impl SubscriptionId {
    pub fn new<T: 'static>(discriminant: u64) -> Self {
        Self {
            kind: TypeId::of::<T>(),
            discriminant,
        }
    }

    /// Identity for a source there is only ever one of.
    pub fn of<T: 'static>() -> Self {
        Self::new::<T>(0)
    }
}

impl<Msg: Send + 'static> Subscription<Msg> {
    /// Forward every item of `stream`.
    pub fn from_stream(id: SubscriptionId, stream: BoxStream<'static, Msg>) -> Self {
        Subscription {
            id,
            start: Box::new(move |sink| tokio::spawn(pump(stream, sink)).abort_handle()),
        }
    }

    /// Wrap every message, typically into the parent's message enum. The
    /// identity is unchanged.
    pub fn map<NewMsg: Send + 'static>(
        self,
        f: impl Fn(Msg) -> NewMsg + Send + Sync + 'static,
    ) -> Subscription<NewMsg> {
        let Subscription { id, start } = self;
        Subscription {
            id,
            start: Box::new(move |outer: Sink<NewMsg>| {
                let inner: Sink<Msg> = Arc::new(move |msg| outer(f(msg)));
                start(inner)
            }),
        }
    }
}

async fn pump<Msg: Send + 'static>(mut stream: BoxStream<'static, Msg>, sink: Sink<Msg>) {
    while let Some(msg) = stream.next().await {
        if !sink(msg) {
            break;
        }
    }
}

/// Marker giving the terminal event stream its identity.
pub struct TerminalEvents;

/// Subscribe to terminal events, mapping each through `map`.
///
/// Return `None` from `map` to drop an event. The subscription keeps its
/// identity across updates, so `map` is captured once; route by model state
/// in `update`, not inside `map`.
///
/// ```rust,ignore
/// fn subscriptions(&self) -> Vec<Subscription<Msg>> {
///     vec![terminal_events(|event| match event {
///         TerminalEvent::Key(key) => Some(Msg::Key(key)),
///         _ => None,
///     })]
/// }
/// ```
pub fn terminal_events<Msg: Send + 'static>(
    map: impl Fn(TerminalEvent) -> Option<Msg> + Send + Sync + 'static,
) -> Subscription<Msg> {
    Subscription {
        id: SubscriptionId::of::<TerminalEvents>(),
        // crossterm has one global reader; the stream is only created once
        // the subscription actually starts.
        start: Box::new(move |sink| {
            tokio::spawn(async move {
                let mut events = EventStream::new();
                while let Some(event) = events.next().await {
                    let Some(msg) = event
                        .ok()
                        .and_then(TerminalEvent::from_crossterm)
                        .and_then(&map)
                    else {
                        continue;
                    };
                    if !sink(msg) {
                        break;
                    }
                }
            })
            .abort_handle()
        }),
    }
}

/// Starts, keeps and stops subscriptions between update cycles.
pub(crate) struct SubscriptionManager<Msg: Send + 'static> {
    running: HashMap<SubscriptionId, AbortHandle>,
    sink: Sink<Msg>,
}

impl<Msg: Send + 'static> SubscriptionManager<Msg> {
    pub fn new(tx: mpsc::UnboundedSender<Msg>) -> Self {
        Self {
            running: HashMap::new(),
            sink: Arc::new(move |msg| tx.send(msg).is_ok()),
        }
    }

    pub fn reconcile(&mut self, wanted: Vec<Subscription<Msg>>) {
        let mut wanted: HashMap<SubscriptionId, Subscription<Msg>> =
            wanted.into_iter().map(|s| (s.id.clone(), s)).collect();

        self.running.retain(|id, handle| {
            let keep = wanted.remove(id).is_some();
            if !keep {
                tracing::trace!(?id, "stopping subscription");
                handle.abort();
            }
            keep
        });

        for (id, sub) in wanted {
            tracing::trace!(?id, "starting subscription");
            let handle = (sub.start)(self.sink.clone());
            self.running.insert(id, handle);
        }
    }

    pub fn shutdown(&mut self) {
        for (_, handle) in self.running.drain() {
            handle.abort();
        }
    }

    #[cfg(test)]
    pub fn running_count(&self) -> usize {
        self.running.len()
    }
}
