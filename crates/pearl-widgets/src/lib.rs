//! Controllable input components for **pearl** applications.
//!
//! Every component in this crate implements [`pearl_core::Component`], so it
//! can be embedded inside any [`pearl_core::Model`] and placed freely within
//! [`ratatui`] layouts. Each one can be controlled (the parent owns the value
//! and re-supplies it with `set_value`) or uncontrolled (the component owns
//! it), and reports changes through a `Changed` message either way.
//!
//! # Components
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`combobox`] | Single-select combobox over a debounced async search |
//! | [`multi_combobox`] | Multi-select combobox with chips and `+N` overflow |
//! | [`date_picker`] | Date input with day/month stepping |
//! | [`date_range_picker`] | Start/end dates kept in order |
//! | [`number_input`] | Number input with step, bounds and clamp/reject |
//! | [`time_picker`] | Time-of-day input stepping by minutes |
//! | [`data_table`] | Keyed rows with sort, filter and selection |
//!
//! # Building blocks
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`format`] | [`Formatter`](format::Formatter)s between values and text |
//! | [`draft`] | [`DraftField`](draft::DraftField): typed text kept apart from the value |
//! | [`options`] | Option datasets, grouping, and an in-memory search source |
//! | [`selection_set`] | Ordered selections and their chip summary |
//! | [`listbox`] | The dropdown drawn under the comboboxes |
//! | [`text_edit`] | Single-line editing buffer |
//! | [`picker`] | Key routing and drawing shared by the pickers |
//! | [`chrome`] | Default root line and styles |
//! | [`key`] | Key bindings and help lines |

pub mod chrome;
pub mod combobox;
pub mod data_table;
pub mod date_picker;
pub mod date_range_picker;
pub mod draft;
pub mod format;
pub mod key;
pub mod listbox;
pub mod multi_combobox;
pub mod number_input;
pub mod options;
pub mod picker;
pub mod selection_set;
pub mod text_edit;
pub mod time_picker;
