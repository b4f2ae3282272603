//! **pearl** -- controllable, debounced input components for [`ratatui`].
//!
//! This is the umbrella crate that re-exports everything you need to build a
//! pearl application from a single dependency:
//!
//! ```toml
//! [dependencies]
//! pearl = "0.1"
//! ```
//!
//! # Re-exports
//!
//! * All public items from [`pearl_core`] are available at the crate root
//!   ([`Model`], [`Component`], [`Command`], [`Controllable`],
//!   [`SearchCoordinator`], [`Program`], [`run`], [`run_with`], etc.).
//! * The [`widgets`] module re-exports everything from [`pearl_widgets`]
//!   (comboboxes, pickers, number input, data table and their helpers).
//! * [`ratatui`], [`crossterm`], [`tokio`] and [`chrono`] are re-exported so
//!   downstream crates do not need to depend on them directly.
//!
//! # Quick start
//!
//! ```ignore
//! use pearl::widgets::number_input::{self, NumberInput};
//! use pearl::{Command, Component, Model};
//! use ratatui::Frame;
//!
//! struct Form {
//!     guests: NumberInput,
//! }
//!
//! enum Msg {
//!     Guests(number_input::Message),
//! }
//!
//! impl Model for Form {
//!     type Message = Msg;
//!     type Flags = ();
//!
//!     fn init(_: ()) -> (Self, Command<Msg>) {
//!         let mut guests = NumberInput::new().with_label("Guests").with_range(1.0, 8.0);
//!         guests.focus();
//!         (Form { guests }, Command::none())
//!     }
//!     fn update(&mut self, msg: Msg) -> Command<Msg> {
//!         match msg {
//!             Msg::Guests(m) => self.guests.update(m).map(Msg::Guests),
//!         }
//!     }
//!     fn view(&self, frame: &mut Frame) {
//!         self.guests.view(frame, frame.area());
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     pearl::run::<Form>(()).await.unwrap();
//! }
//! ```

pub use pearl_core::*;
pub mod widgets {
    pub use pearl_widgets::*;
}

// Re-export dependencies for use in demos and downstream crates
pub use chrono;
pub use crossterm;
pub use ratatui;
pub use tokio;
