//! Core runtime and state primitives for **pearl** input components.
//!
//! `pearl-core` provides the Elm-style runtime every pearl application runs
//! on, plus the pieces of state logic that all stateful inputs share:
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`Model`] | Top-level application trait (init / update / view) |
//! | [`Component`] | Reusable sub-model that renders into a [`ratatui::layout::Rect`] |
//! | [`Command`] | Side effect executed by the runtime (messages, timers, futures) |
//! | [`Subscription`] | Long-lived event source (the terminal key stream) |
//! | [`Program`] | Wires a [`Model`] to a real terminal and drives the event loop |
//! | [`TestProgram`](testing::TestProgram) | Headless harness that also drives async commands |
//! | [`Controllable`] | Controlled/uncontrolled value ownership |
//! | [`SearchCoordinator`] | Debounced search with stale-response filtering |
//! | [`RootSlot`] | "Render as" delegation for a component's root line |
//!
//! # Architecture
//!
//! 1. **init** -- [`Model::init`] builds the state (and the components it
//!    owns) and may return a [`Command`].
//! 2. **view** -- [`Model::view`] renders the state to a [`ratatui::Frame`].
//! 3. **event** -- Key presses arrive through [`terminal_events`]; timer
//!    wake-ups and fetch results arrive as the messages their commands
//!    produce.
//! 4. **update** -- [`Model::update`] routes each message to a component and
//!    returns any follow-up [`Command`].
//!
//! All messages go through one channel and are applied one at a time, so a
//! late fetch result is just another message that the owning component is
//! free to discard.

pub mod command;
pub mod component;
pub mod controllable;
pub mod event;
pub mod model;
pub mod render_as;
pub mod runtime;
pub mod search;
pub mod subscription;
pub mod testing;

pub use command::Command;
pub use component::Component;
pub use controllable::{Controllable, Mode, WriteOutcome};
pub use event::TerminalEvent;
pub use model::Model;
pub use render_as::{RenderAs, RootProps, RootSlot};
pub use runtime::{
    init_file_logging, OutputTarget, Program, ProgramError, ProgramHandle, ProgramOptions,
};
pub use search::{
    search_fn, SearchConfig, SearchCoordinator, SearchError, SearchMessage, SearchSource,
    SearchStatus,
};
pub use subscription::{terminal_events, Subscription, SubscriptionId};

/// Run a pearl application with default options.
pub async fn run<M: Model>(flags: M::Flags) -> Result<M, ProgramError> {
    Program::<M>::new(flags)?.run().await
}

/// Run with custom options.
pub async fn run_with<M: Model>(
    flags: M::Flags,
    options: ProgramOptions,
) -> Result<M, ProgramError> {
    Program::<M>::with_options(flags, options)?.run().await
}
