//! Single-select combobox over an asynchronous option source.
//!
//! Typing feeds a [`SearchCoordinator`]; once the debounce window settles,
//! the source is queried and its results fill a dropdown. Up/Down move the
//! highlight, Enter picks, Esc closes the dropdown (or clears the typed term
//! when it is already closed), Backspace on an empty input clears the
//! selection.
//!
//! # Example
//!
//! ```ignore
//! use pearl_widgets::combobox::DataCombobox;
//! use pearl_widgets::options::OptionList;
//!
//! let cities = OptionList::from_pairs([("Oslo", "osl"), ("Lima", "lim")])?;
//! let combo = DataCombobox::with_options(cities)
//!     .with_label("City")
//!     .with_placeholder("Pick a city");
//! ```

use crate::chrome::{self, InputStyle};
use crate::listbox::Listbox;
use crate::options::{OptionList, SelectOption, StaticSource};
use crate::text_edit::{Edit, TextEditState};
use crossterm::event::{KeyCode, KeyEvent};
use pearl_core::command::Command;
use pearl_core::component::Component;
use pearl_core::controllable::Controllable;
use pearl_core::render_as::{RenderAs, RootProps, RootSlot};
use pearl_core::search::{SearchConfig, SearchCoordinator, SearchMessage, SearchSource, SearchStatus};
use ratatui::layout::Rect;
use ratatui::Frame;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub enum Message {
    KeyPress(KeyEvent),
    Paste(String),
    /// Debounce and fetch completions scheduled by the search coordinator.
    Search(SearchMessage<SelectOption>),
    /// The selection changed (or, when controlled, should change).
    Changed(Option<String>),
}

pub struct DataCombobox {
    search: SearchCoordinator<SelectOption>,
    input: TextEditState,
    list: Listbox,
    value: Controllable<Option<String>>,
    labels: HashMap<String, String>,
    open: bool,
    focus: bool,
    label: String,
    placeholder: String,
    root: RootSlot,
    style: InputStyle,
}

impl DataCombobox {
    pub fn new(source: impl SearchSource<SelectOption>) -> Self {
        Self {
            search: SearchCoordinator::new(source),
            input: TextEditState::new(),
            list: Listbox::new(8),
            value: Controllable::uncontrolled(None),
            labels: HashMap::new(),
            open: false,
            focus: false,
            label: String::new(),
            placeholder: "Select…".to_string(),
            root: RootSlot::new(),
            style: InputStyle::default(),
        }
    }

    /// Search a fixed option list in memory.
    pub fn with_options(options: OptionList) -> Self {
        let labels = options
            .as_slice()
            .iter()
            .map(|o| (o.value.clone(), o.label.clone()))
            .collect();
        let mut combo = Self::new(StaticSource::new(options));
        combo.labels = labels;
        combo
    }

    /// Controlled: the parent owns the selection and re-supplies it with
    /// [`set_value`](Self::set_value).
    pub fn with_value(mut self, value: Option<String>) -> Self {
        self.value = self.value.rebuild(Some(value), None);
        self
    }

    /// Uncontrolled, starting at `value`.
    pub fn with_default_value(mut self, value: Option<String>) -> Self {
        self.value = self.value.rebuild(None, Some(value));
        self
    }

    pub fn with_on_change(mut self, f: impl FnMut(&Option<String>) + Send + 'static) -> Self {
        self.value.set_on_change(f);
        self
    }

    pub fn with_search_config(mut self, config: SearchConfig) -> Self {
        self.search = self.search.with_config(config);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn with_max_visible(mut self, max: usize) -> Self {
        self.list = Listbox::new(max);
        self
    }

    pub fn with_style(mut self, style: InputStyle) -> Self {
        self.style = style;
        self
    }

    /// Draw the root line with `delegate` instead of the default.
    pub fn with_render_as(mut self, delegate: impl RenderAs + 'static) -> Self {
        self.root.set(delegate);
        self
    }

    /// Teach the combobox a label for a value it has not seen in results yet
    /// (e.g. a controlled value loaded from elsewhere).
    pub fn remember_label(&mut self, value: impl Into<String>, label: impl Into<String>) {
        self.labels.insert(value.into(), label.into());
    }

    /// The selected option value.
    pub fn value(&self) -> Option<&str> {
        self.value.read().and_then(|v| v.as_deref())
    }

    /// Label of the selected option, falling back to its value.
    pub fn selected_label(&self) -> Option<&str> {
        self.value()
            .map(|v| self.labels.get(v).map(String::as_str).unwrap_or(v))
    }

    /// Re-supply the controlled selection.
    pub fn set_value(&mut self, value: Option<String>) {
        self.value.sync(Some(value));
    }

    pub fn term(&self) -> &str {
        self.search.term()
    }

    pub fn results(&self) -> &[SelectOption] {
        self.list.options()
    }

    pub fn search_status(&self) -> SearchStatus {
        self.search.status()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn focus(&mut self) {
        self.focus = true;
    }

    /// Lose focus: close the dropdown and drop the unfinished term.
    pub fn blur(&mut self) -> Command<Message> {
        self.focus = false;
        self.open = false;
        self.input.clear();
        self.search.clear().map(Message::Search)
    }

    fn pick(&mut self, option: SelectOption) -> Command<Message> {
        self.labels.insert(option.value.clone(), option.label.clone());
        self.value.write(Some(option.value.clone()));
        self.open = false;
        self.input.clear();
        self.list.set_options(Vec::new());
        let clear = self.search.clear().map(Message::Search);
        Command::batch([clear, Command::message(Message::Changed(Some(option.value)))])
    }

    fn handle_key(&mut self, key: KeyEvent) -> Command<Message> {
        match key.code {
            KeyCode::Down => {
                if self.open {
                    self.list.move_down();
                } else if !self.list.is_empty() {
                    self.open = true;
                }
                Command::none()
            }
            KeyCode::Up => {
                if self.open {
                    self.list.move_up();
                }
                Command::none()
            }
            KeyCode::Enter => match self.list.highlighted().cloned() {
                Some(option) if self.open => self.pick(option),
                _ => Command::none(),
            },
            KeyCode::Esc => {
                if self.open {
                    self.open = false;
                    Command::none()
                } else if !self.input.is_empty() {
                    self.input.clear();
                    self.search.clear().map(Message::Search)
                } else {
                    Command::none()
                }
            }
            KeyCode::Backspace if self.input.is_empty() => {
                if self.value().is_none() {
                    return Command::none();
                }
                self.value.write(None);
                Command::message(Message::Changed(None))
            }
            _ => match self.input.handle_key(&key) {
                Edit::Changed => self.term_changed(),
                Edit::Moved | Edit::Unhandled => Command::none(),
            },
        }
    }

    fn term_changed(&mut self) -> Command<Message> {
        let term = self.input.value();
        if term.is_empty() {
            self.open = false;
            self.list.set_options(Vec::new());
        }
        self.search.input(term).map(Message::Search)
    }

    fn apply_search(&mut self, msg: SearchMessage<SelectOption>) -> Command<Message> {
        if !self.search.is_mounted() {
            return Command::none();
        }
        let cmd = self.search.update(msg).map(Message::Search);
        if matches!(self.search.status(), SearchStatus::Resolved | SearchStatus::Failed) {
            for option in self.search.results() {
                self.labels
                    .insert(option.value.clone(), option.label.clone());
            }
            self.list.set_options(self.search.results().to_vec());
            self.open = self.focus && !self.search.term().is_empty();
        }
        cmd
    }

    fn status_line(&self) -> Option<String> {
        match self.search.status() {
            SearchStatus::Pending | SearchStatus::Fetching if self.list.is_empty() => {
                Some("searching…".to_string())
            }
            SearchStatus::Failed => self.search.error().map(|e| e.to_string()),
            SearchStatus::Resolved if self.list.is_empty() => Some("no results".to_string()),
            _ => None,
        }
    }

    fn root_props(&self) -> RootProps {
        let typing = self.focus && !self.input.is_empty();
        let (text, is_placeholder) = match self.selected_label() {
            _ if typing => (self.input.value(), false),
            Some(label) => (label.to_string(), false),
            None => (self.placeholder.clone(), true),
        };
        RootProps {
            label: self.label.clone(),
            text,
            is_placeholder,
            focused: self.focus,
            open: self.open,
            invalid: false,
        }
    }
}

impl Component for DataCombobox {
    type Message = Message;

    fn update(&mut self, msg: Message) -> Command<Message> {
        match msg {
            Message::KeyPress(key) if self.focus => self.handle_key(key),
            Message::Paste(text) if self.focus => {
                if self.input.insert_str(&text) > 0 {
                    self.term_changed()
                } else {
                    Command::none()
                }
            }
            Message::Search(m) => self.apply_search(m),
            _ => Command::none(),
        }
    }

    fn view(&self, frame: &mut Frame, area: Rect) {
        if area.height == 0 {
            return;
        }
        let root = self.root_props();
        let body_width = chrome::body_width(area, &self.label);
        self.root.render(frame, Rect { height: 1, ..area }, &root, |f, a, r| {
            let body = (self.focus && !self.input.is_empty()).then(|| {
                self.input
                    .spans(body_width, self.style.text, self.style.cursor, true)
            });
            chrome::render_root(f, a, r, &self.style, body)
        });

        if self.open && area.height > 1 {
            let status = self.status_line();
            let height = self.list.height(status.as_deref()).min(area.height - 1);
            let overlay = Rect {
                y: area.y + 1,
                height,
                ..area
            };
            self.list
                .render(frame, overlay, &self.style, |_| false, status.as_deref());
        }
    }

    fn focused(&self) -> bool {
        self.focus
    }

    fn unmount(&mut self) {
        self.search.unmount();
        self.open = false;
        self.focus = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use pearl_core::testing::{Harness, TestProgram};
    use std::time::Duration;

    type Prog = TestProgram<Harness<DataCombobox>>;

    fn key(code: KeyCode) -> Message {
        Message::KeyPress(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn cities() -> OptionList {
        OptionList::from_pairs([
            ("Oslo", "osl"),
            ("Lima", "lim"),
            ("Lisbon", "lis"),
            ("Bergen", "bgo"),
        ])
        .unwrap()
    }

    fn mount(mut combo: DataCombobox) -> Prog {
        combo.focus();
        TestProgram::new(combo)
    }

    async fn type_str(prog: &mut Prog, text: &str) {
        for c in text.chars() {
            prog.send(key(KeyCode::Char(c)));
        }
        prog.settle().await;
    }

    fn changes(prog: &mut Prog) -> Vec<Option<String>> {
        prog.model_mut()
            .take_seen()
            .into_iter()
            .filter_map(|m| match m {
                Message::Changed(v) => Some(v),
                _ => None,
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn typing_opens_filtered_results() {
        let mut prog = mount(DataCombobox::with_options(cities()));
        type_str(&mut prog, "li").await;

        let combo = prog.model().component();
        assert!(combo.is_open());
        let labels: Vec<_> = combo.results().iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, ["Lima", "Lisbon"]);
        assert!(prog.render_string(20, 3).contains("▸ Lima"));
    }

    #[tokio::test(start_paused = true)]
    async fn enter_picks_highlighted_and_reports_change() {
        let mut prog = mount(DataCombobox::with_options(cities()).with_label("City"));
        type_str(&mut prog, "li").await;
        prog.send(key(KeyCode::Down));
        prog.send(key(KeyCode::Enter));
        prog.settle().await;

        assert_eq!(changes(&mut prog), [Some("lis".to_string())]);
        let combo = prog.model().component();
        assert_eq!(combo.value(), Some("lis"));
        assert_eq!(combo.selected_label(), Some("Lisbon"));
        assert!(!combo.is_open());
        assert_eq!(combo.term(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn controlled_selection_waits_for_parent() {
        let mut prog = mount(DataCombobox::with_options(cities()).with_value(Some("osl".into())));
        type_str(&mut prog, "berg").await;
        prog.send(key(KeyCode::Enter));
        prog.settle().await;

        assert_eq!(changes(&mut prog), [Some("bgo".to_string())]);
        assert_eq!(prog.model().component().value(), Some("osl"), "display follows the prop");

        prog.model_mut().component_mut().set_value(Some("bgo".into()));
        assert_eq!(prog.model().component().selected_label(), Some("Bergen"));
    }

    #[tokio::test(start_paused = true)]
    async fn backspace_on_empty_input_clears_selection() {
        let mut prog = mount(DataCombobox::with_options(cities()).with_default_value(Some("lim".into())));
        prog.send(key(KeyCode::Backspace));
        prog.settle().await;
        assert_eq!(changes(&mut prog), [None::<String>]);
        assert_eq!(prog.model().component().value(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn esc_closes_then_clears_term() {
        let mut prog = mount(DataCombobox::with_options(cities()));
        type_str(&mut prog, "o").await;
        assert!(prog.model().component().is_open());

        prog.send(key(KeyCode::Esc));
        assert!(!prog.model().component().is_open());
        assert_eq!(prog.model().component().term(), "o");

        prog.send(key(KeyCode::Esc));
        assert_eq!(prog.model().component().term(), "");
        assert_eq!(prog.model().component().search_status(), SearchStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn no_results_shows_status() {
        let mut prog = mount(
            DataCombobox::with_options(cities())
                .with_search_config(SearchConfig::default().with_debounce(Duration::from_millis(50))),
        );
        type_str(&mut prog, "zz").await;
        let combo = prog.model().component();
        assert!(combo.results().is_empty());
        assert_eq!(combo.status_line().as_deref(), Some("no results"));
    }

    #[tokio::test(start_paused = true)]
    async fn render_as_replaces_root() {
        let combo = DataCombobox::with_options(cities())
            .with_default_value(Some("osl".into()))
            .with_render_as(|f: &mut Frame, area: Rect, root: &RootProps| {
                f.render_widget(ratatui::widgets::Paragraph::new(format!("<{}>", root.text)), area)
            });
        let prog = TestProgram::<Harness<DataCombobox>>::new(combo);
        assert!(prog.render_string(10, 1).starts_with("<Oslo>"));
    }

    #[test]
    fn unfocused_ignores_keys() {
        let mut combo = DataCombobox::with_options(cities());
        assert!(combo.update(key(KeyCode::Char('o'))).is_none());
        assert_eq!(combo.term(), "");
    }

    #[test]
    fn root_shows_placeholder_then_label() {
        let combo = DataCombobox::with_options(cities()).with_placeholder("Pick");
        assert_eq!(combo.root_props().text, "Pick");
        assert!(combo.root_props().is_placeholder);
        let combo = combo.with_default_value(Some("osl".into()));
        assert_eq!(combo.root_props().text, "Oslo");
    }

    #[test]
    fn change_handler_survives_later_value_builder() {
        let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut combo = DataCombobox::with_options(cities())
            .with_on_change(move |v: &Option<String>| sink.lock().unwrap().push(v.clone()))
            .with_value(Some("osl".into()));
        combo.focus();
        let _ = combo.update(key(KeyCode::Backspace));

        assert_eq!(*seen.lock().unwrap(), [None]);
        assert_eq!(combo.value(), Some("osl"));
    }

    #[test]
    fn unmount_stops_search() {
        let mut combo = DataCombobox::with_options(cities());
        combo.focus();
        combo.unmount();
        assert!(combo.update(key(KeyCode::Char('o'))).is_none());
    }

    #[tokio::test]
    async fn fetch_resolving_after_unmount_leaves_dropdown_closed() {
        let mut combo = DataCombobox::with_options(cities());
        combo.focus();
        let _ = combo.update(key(KeyCode::Char('o')));
        combo.unmount();

        let late = Message::Search(SearchMessage::Resolved {
            seq: 1,
            result: Err(pearl_core::search::SearchError::new("late")),
        });
        assert!(combo.update(late).is_none());
        let late = Message::Search(SearchMessage::Resolved {
            seq: 1,
            result: Ok(vec![SelectOption::new("Oslo", "osl")]),
        });
        assert!(combo.update(late).is_none());

        assert!(!combo.is_open());
        assert!(combo.results().is_empty());
        assert!(!matches!(
            combo.search_status(),
            SearchStatus::Resolved | SearchStatus::Failed
        ));
    }
}
