//! Multi-select combobox: the search flow of
//! [`DataCombobox`](crate::combobox::DataCombobox) with a set of selections
//! shown as chips.
//!
//! Enter toggles the highlighted option and keeps the dropdown open.
//! Backspace on an empty input removes the most recent selection. The trigger
//! shows at most `max_displayed_items` chips and summarizes the rest as `+N`.

use crate::chrome::{self, InputStyle};
use crate::listbox::Listbox;
use crate::options::{OptionList, SelectOption, StaticSource};
use crate::selection_set::SelectionSet;
use crate::text_edit::{Edit, TextEditState};
use crossterm::event::{KeyCode, KeyEvent};
use pearl_core::command::Command;
use pearl_core::component::Component;
use pearl_core::controllable::Controllable;
use pearl_core::render_as::{RenderAs, RootProps, RootSlot};
use pearl_core::search::{SearchConfig, SearchCoordinator, SearchMessage, SearchSource, SearchStatus};
use ratatui::layout::Rect;
use ratatui::text::Span;
use ratatui::Frame;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub enum Message {
    KeyPress(KeyEvent),
    Paste(String),
    Search(SearchMessage<SelectOption>),
    /// The selection set changed (or, when controlled, should change).
    Changed(SelectionSet),
}

pub struct DataMultiCombobox {
    search: SearchCoordinator<SelectOption>,
    input: TextEditState,
    list: Listbox,
    value: Controllable<SelectionSet>,
    labels: HashMap<String, String>,
    max_displayed_items: usize,
    open: bool,
    focus: bool,
    label: String,
    placeholder: String,
    root: RootSlot,
    style: InputStyle,
}

impl DataMultiCombobox {
    pub fn new(source: impl SearchSource<SelectOption>) -> Self {
        Self {
            search: SearchCoordinator::new(source),
            input: TextEditState::new(),
            list: Listbox::new(8),
            value: Controllable::uncontrolled(Some(SelectionSet::new())),
            labels: HashMap::new(),
            max_displayed_items: 3,
            open: false,
            focus: false,
            label: String::new(),
            placeholder: "Select…".to_string(),
            root: RootSlot::new(),
            style: InputStyle::default(),
        }
    }

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

    /// Controlled by the parent's selection set.
    pub fn with_value(mut self, value: SelectionSet) -> Self {
        self.value = self.value.rebuild(Some(value), None);
        self
    }

    pub fn with_default_value(mut self, value: SelectionSet) -> Self {
        self.value = self.value.rebuild(None, Some(value));
        self
    }

    pub fn with_on_change(mut self, f: impl FnMut(&SelectionSet) + Send + 'static) -> Self {
        self.value.set_on_change(f);
        self
    }

    /// Chips shown before the rest collapse into `+N`.
    pub fn with_max_displayed_items(mut self, max: usize) -> Self {
        self.max_displayed_items = max;
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

    pub fn with_style(mut self, style: InputStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_render_as(mut self, delegate: impl RenderAs + 'static) -> Self {
        self.root.set(delegate);
        self
    }

    pub fn remember_label(&mut self, value: impl Into<String>, label: impl Into<String>) {
        self.labels.insert(value.into(), label.into());
    }

    pub fn value(&self) -> SelectionSet {
        self.value.get().unwrap_or_default()
    }

    pub fn set_value(&mut self, value: SelectionSet) {
        self.value.sync(Some(value));
    }

    pub fn term(&self) -> &str {
        self.search.term()
    }

    pub fn results(&self) -> &[SelectOption] {
        self.list.options()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn focus(&mut self) {
        self.focus = true;
    }

    pub fn blur(&mut self) -> Command<Message> {
        self.focus = false;
        self.open = false;
        self.input.clear();
        self.search.clear().map(Message::Search)
    }

    /// The trigger text, e.g. `"[Oslo] [Lima] +4"`.
    pub fn summary_line(&self, width: usize) -> String {
        self.value()
            .summary(self.max_displayed_items, |v| self.label_of(v))
            .to_line(width)
    }

    fn label_of(&self, value: &str) -> String {
        self.labels
            .get(value)
            .cloned()
            .unwrap_or_else(|| value.to_string())
    }

    fn commit(&mut self, next: SelectionSet) -> Command<Message> {
        self.value.write(next.clone());
        Command::message(Message::Changed(next))
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
                Some(option) if self.open => {
                    self.labels.insert(option.value.clone(), option.label.clone());
                    let mut next = self.value();
                    next.toggle(&option.value);
                    self.commit(next)
                }
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
                let mut next = self.value();
                match next.pop() {
                    Some(_) => self.commit(next),
                    None => Command::none(),
                }
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

    fn root_props(&self, width: usize) -> RootProps {
        let selected = self.value();
        let (text, is_placeholder) = if selected.is_empty() {
            (self.placeholder.clone(), true)
        } else {
            (self.summary_line(width), false)
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

impl Component for DataMultiCombobox {
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
        let body_width = chrome::body_width(area, &self.label);
        let root = self.root_props(body_width as usize);
        self.root.render(frame, Rect { height: 1, ..area }, &root, |f, a, r| {
            // While focused the typed term follows the chips.
            let body = self.focus.then(|| {
                let chips = if self.value().is_empty() {
                    String::new()
                } else {
                    format!("{} ", r.text)
                };
                let term_width = body_width.saturating_sub(chips.chars().count() as u16);
                let mut spans = vec![Span::styled(chips, self.style.text)];
                spans.extend(
                    self.input
                        .spans(term_width, self.style.text, self.style.cursor, true),
                );
                spans
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
            let selected = self.value();
            self.list.render(
                frame,
                overlay,
                &self.style,
                |o| selected.contains(&o.value),
                status.as_deref(),
            );
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

    type Prog = TestProgram<Harness<DataMultiCombobox>>;

    fn key(code: KeyCode) -> Message {
        Message::KeyPress(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn tags() -> OptionList {
        OptionList::from_pairs([
            ("Rust", "rs"),
            ("Go", "go"),
            ("Ruby", "rb"),
            ("Python", "py"),
            ("Zig", "zig"),
            ("C", "c"),
        ])
        .unwrap()
    }

    fn all_six() -> SelectionSet {
        ["rs", "go", "rb", "py", "zig", "c"].into_iter().collect()
    }

    fn mount(mut combo: DataMultiCombobox) -> Prog {
        combo.focus();
        TestProgram::new(combo)
    }

    async fn type_str(prog: &mut Prog, text: &str) {
        for c in text.chars() {
            prog.send(key(KeyCode::Char(c)));
        }
        prog.settle().await;
    }

    fn last_change(prog: &mut Prog) -> Option<SelectionSet> {
        prog.model_mut()
            .take_seen()
            .into_iter()
            .filter_map(|m| match m {
                Message::Changed(v) => Some(v),
                _ => None,
            })
            .last()
    }

    #[tokio::test(start_paused = true)]
    async fn enter_toggles_and_keeps_dropdown_open() {
        let mut prog = mount(DataMultiCombobox::with_options(tags()));
        type_str(&mut prog, "ru").await;
        prog.send(key(KeyCode::Enter));
        prog.send(key(KeyCode::Down));
        prog.send(key(KeyCode::Enter));
        prog.drain_messages();

        let combo = prog.model().component();
        assert!(combo.is_open());
        assert_eq!(combo.value().iter().collect::<Vec<_>>(), ["rs", "rb"]);

        prog.send(key(KeyCode::Enter));
        assert_eq!(
            prog.model().component().value().iter().collect::<Vec<_>>(),
            ["rs"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn backspace_on_empty_input_removes_last() {
        let mut prog = mount(DataMultiCombobox::with_options(tags()).with_default_value(all_six()));
        prog.send(key(KeyCode::Backspace));
        prog.drain_messages();
        let changed = last_change(&mut prog).unwrap();
        assert_eq!(changed.len(), 5);
        assert!(!changed.contains("c"));
    }

    #[test]
    fn cap_two_of_six_shows_plus_four_then_plus_three() {
        let mut combo = DataMultiCombobox::with_options(tags())
            .with_max_displayed_items(2)
            .with_default_value(all_six());
        assert_eq!(combo.summary_line(40), "[Rust] [Go] +4");

        combo.focus();
        combo.update(key(KeyCode::Backspace));
        assert_eq!(combo.summary_line(40), "[Rust] [Go] +3");
        assert_eq!(combo.value().len(), 5);
    }

    #[test]
    fn controlled_set_only_changes_through_parent() {
        let mut combo = DataMultiCombobox::with_options(tags())
            .with_value(["go"].into_iter().collect());
        combo.focus();
        let cmd = combo.update(key(KeyCode::Backspace));
        match cmd.into_message() {
            Some(Message::Changed(next)) => assert!(next.is_empty()),
            other => panic!("expected Changed, got {other:?}"),
        }
        assert_eq!(combo.value().len(), 1, "prop still holds one selection");

        combo.set_value(SelectionSet::new());
        assert!(combo.value().is_empty());
    }

    #[test]
    fn placeholder_when_nothing_selected() {
        let combo = DataMultiCombobox::with_options(tags()).with_placeholder("Tags");
        let root = combo.root_props(30);
        assert_eq!(root.text, "Tags");
        assert!(root.is_placeholder);
    }

    #[tokio::test(start_paused = true)]
    async fn dropdown_marks_selected_rows() {
        let mut prog = mount(
            DataMultiCombobox::with_options(tags()).with_default_value(["rb"].into_iter().collect()),
        );
        type_str(&mut prog, "ru").await;
        let screen = prog.render_string(30, 3);
        assert!(screen.contains("▸ Rust"));
        assert!(screen.contains("✓ Ruby"));
    }

    #[tokio::test]
    async fn fetch_resolving_after_unmount_leaves_dropdown_closed() {
        let mut combo = DataMultiCombobox::with_options(tags());
        combo.focus();
        let _ = combo.update(key(KeyCode::Char('r')));
        combo.unmount();

        let late = Message::Search(SearchMessage::Resolved {
            seq: 1,
            result: Ok(vec![SelectOption::new("Rust", "rs")]),
        });
        assert!(combo.update(late).is_none());
        assert!(!combo.is_open());
        assert!(combo.results().is_empty());
        assert!(combo.update(key(KeyCode::Enter)).is_none());
        assert!(combo.value().is_empty());
    }
}
