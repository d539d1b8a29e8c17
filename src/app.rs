use crate::models::{Draft, EditMode, Priority, Task, TaskId};
use crate::notify::ToastBoard;
use crate::parser::parse_quick_add;
use crate::storage::TaskStorage;
use crate::store::{StoreError, TaskStore};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::widgets::ListState;

pub struct App<S> {
    pub store: TaskStore<S, ToastBoard>,
    pub toasts: ToastBoard,
    pub state: ListState,
    pub input_mode: InputMode,
    pub active_input: ActiveInput,
    pub draft: Draft,
    pub search: String,
    pub category_filter: String,
    pub categories: Vec<String>,
    pub quick_add: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
    Search,
    QuickAdd,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActiveInput {
    Name,
    DueDate,
    Category,
    Priority,
}

impl ActiveInput {
    fn next(self) -> ActiveInput {
        match self {
            ActiveInput::Name => ActiveInput::DueDate,
            ActiveInput::DueDate => ActiveInput::Category,
            ActiveInput::Category => ActiveInput::Priority,
            ActiveInput::Priority => ActiveInput::Name,
        }
    }

    fn previous(self) -> ActiveInput {
        match self {
            ActiveInput::Name => ActiveInput::Priority,
            ActiveInput::DueDate => ActiveInput::Name,
            ActiveInput::Category => ActiveInput::DueDate,
            ActiveInput::Priority => ActiveInput::Category,
        }
    }
}

// Steps through `""` followed by `choices`; unknown values restart at the front.
fn cycle(current: &str, choices: &[String], forward: bool) -> String {
    let len = choices.len() + 1;
    let pos = choices
        .iter()
        .position(|c| c == current)
        .map(|i| i + 1)
        .unwrap_or(0);
    let next = if forward {
        (pos + 1) % len
    } else {
        (pos + len - 1) % len
    };
    if next == 0 {
        String::new()
    } else {
        choices[next - 1].clone()
    }
}

impl<S: TaskStorage> App<S> {
    pub fn new(
        store: TaskStore<S, ToastBoard>,
        toasts: ToastBoard,
        categories: Vec<String>,
    ) -> App<S> {
        let mut app = App {
            store,
            toasts,
            state: ListState::default(),
            input_mode: InputMode::Normal,
            active_input: ActiveInput::Name,
            draft: Draft::default(),
            search: String::new(),
            category_filter: String::new(),
            categories,
            quick_add: String::new(),
        };
        app.clamp_selection();
        app
    }

    pub fn visible_tasks(&self) -> Vec<&Task> {
        self.store.filtered_view(&self.search, &self.category_filter)
    }

    /// Id of the highlighted row, resolved against the filtered view.
    pub fn selected_id(&self) -> Option<TaskId> {
        let selected = self.state.selected()?;
        self.visible_tasks().get(selected).map(|t| t.id)
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.selected_id().and_then(|id| self.store.get(id))
    }

    pub fn form_title(&self) -> &'static str {
        match self.store.mode() {
            EditMode::Adding => "Add Task",
            EditMode::Editing(_) => "Update Task",
        }
    }

    pub fn priority_choices() -> Vec<String> {
        Priority::ALL.iter().map(|p| p.as_str().to_string()).collect()
    }

    fn clamp_selection(&mut self) {
        let len = self.visible_tasks().len();
        let selected = match self.state.selected() {
            _ if len == 0 => None,
            Some(i) => Some(i.min(len - 1)),
            None => Some(0),
        };
        self.state.select(selected);
    }

    fn select_id(&mut self, id: TaskId) {
        let pos = self.visible_tasks().iter().position(|t| t.id == id);
        if pos.is_some() {
            self.state.select(pos);
        }
        self.clamp_selection();
    }

    pub fn next(&mut self) {
        let len = self.visible_tasks().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.visible_tasks().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn toggle_selected(&mut self) {
        if let Some(id) = self.selected_id() {
            if let Err(err) = self.store.toggle_completion(id) {
                tracing::warn!(error = %err, "toggle failed");
            }
        }
    }

    pub fn delete_selected(&mut self) {
        if let Some(id) = self.selected_id() {
            if let Err(err) = self.store.remove(id) {
                tracing::warn!(error = %err, "delete failed");
            }
            self.clamp_selection();
        }
    }

    pub fn start_add(&mut self) {
        self.store.cancel_edit();
        self.draft.clear();
        self.active_input = ActiveInput::Name;
        self.input_mode = InputMode::Editing;
    }

    pub fn start_edit(&mut self) {
        let Some(id) = self.selected_id() else {
            return;
        };
        match self.store.begin_edit(id) {
            Ok(draft) => {
                self.draft = draft;
                self.active_input = ActiveInput::Name;
                self.input_mode = InputMode::Editing;
            }
            Err(err) => tracing::warn!(error = %err, "edit failed"),
        }
    }

    pub fn cycle_category_filter(&mut self) {
        self.category_filter = cycle(&self.category_filter, &self.categories, true);
        self.clamp_selection();
    }

    fn submit_form(&mut self) {
        match self.store.submit(&mut self.draft) {
            Ok(id) => {
                self.input_mode = InputMode::Normal;
                self.select_id(id);
            }
            Err(StoreError::Validation) => {}
            Err(err) => {
                tracing::warn!(error = %err, "submit failed");
                self.draft.clear();
                self.input_mode = InputMode::Normal;
            }
        }
    }

    fn submit_quick_add(&mut self) {
        let today = chrono::Local::now().date_naive();
        let mut draft = parse_quick_add(&self.quick_add, today);
        self.store.cancel_edit();
        if let Ok(id) = self.store.submit(&mut draft) {
            self.quick_add.clear();
            self.input_mode = InputMode::Normal;
            self.select_id(id);
        }
    }

    fn cancel_form(&mut self) {
        self.store.cancel_edit();
        self.draft.clear();
        self.input_mode = InputMode::Normal;
    }

    /// Handles one key press; returns true when the app should quit.
    pub fn handle_input(&mut self, key: KeyEvent) -> bool {
        match self.input_mode {
            InputMode::Normal => match key.code {
                KeyCode::Char('q') => return true,
                KeyCode::Char('j') | KeyCode::Down => self.next(),
                KeyCode::Char('k') | KeyCode::Up => self.previous(),
                KeyCode::Char(' ') | KeyCode::Char('t') => self.toggle_selected(),
                KeyCode::Char('a') => self.start_add(),
                KeyCode::Char('e') | KeyCode::Enter => self.start_edit(),
                KeyCode::Char('d') | KeyCode::Delete => self.delete_selected(),
                KeyCode::Char('c') => self.cycle_category_filter(),
                KeyCode::Char('/') => self.input_mode = InputMode::Search,
                KeyCode::Char('n') => {
                    self.quick_add.clear();
                    self.input_mode = InputMode::QuickAdd;
                }
                KeyCode::Esc => {
                    self.search.clear();
                    self.category_filter.clear();
                    self.toasts.dismiss();
                    self.clamp_selection();
                }
                _ => {}
            },

            InputMode::Editing => match key.code {
                KeyCode::Tab => self.active_input = self.active_input.next(),
                KeyCode::BackTab => self.active_input = self.active_input.previous(),
                KeyCode::Enter => self.submit_form(),
                KeyCode::Esc => self.cancel_form(),
                KeyCode::Left | KeyCode::Right => {
                    let forward = key.code == KeyCode::Right;
                    match self.active_input {
                        ActiveInput::Category => {
                            self.draft.category =
                                cycle(&self.draft.category, &self.categories, forward)
                        }
                        ActiveInput::Priority => {
                            self.draft.priority =
                                cycle(&self.draft.priority, &Self::priority_choices(), forward)
                        }
                        _ => {}
                    }
                }
                KeyCode::Char(c) => match self.active_input {
                    ActiveInput::Name => self.draft.name.push(c),
                    ActiveInput::DueDate => self.draft.due_date.push(c),
                    _ => {}
                },
                KeyCode::Backspace => match self.active_input {
                    ActiveInput::Name => {
                        self.draft.name.pop();
                    }
                    ActiveInput::DueDate => {
                        self.draft.due_date.pop();
                    }
                    ActiveInput::Category => self.draft.category.clear(),
                    ActiveInput::Priority => self.draft.priority.clear(),
                },
                _ => {}
            },

            InputMode::Search => {
                match key.code {
                    KeyCode::Char(c) => self.search.push(c),
                    KeyCode::Backspace => {
                        self.search.pop();
                    }
                    KeyCode::Enter => self.input_mode = InputMode::Normal,
                    KeyCode::Esc => {
                        self.search.clear();
                        self.input_mode = InputMode::Normal;
                    }
                    _ => {}
                }
                self.clamp_selection();
            }

            InputMode::QuickAdd => match key.code {
                KeyCode::Char(c) => self.quick_add.push(c),
                KeyCode::Backspace => {
                    self.quick_add.pop();
                }
                KeyCode::Enter => self.submit_quick_add(),
                KeyCode::Esc => {
                    self.quick_add.clear();
                    self.input_mode = InputMode::Normal;
                }
                _ => {}
            },
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NotificationKind;
    use crate::storage::{MemoryStorage, TASKS_KEY};
    use crossterm::event::KeyModifiers;
    use std::time::Instant;

    fn test_app() -> App<MemoryStorage> {
        let toasts = ToastBoard::default();
        let store = TaskStore::open(MemoryStorage::new(), toasts.clone(), TASKS_KEY);
        App::new(
            store,
            toasts,
            vec!["Work".to_string(), "Personal".to_string(), "Shopping".to_string()],
        )
    }

    fn press(app: &mut App<MemoryStorage>, code: KeyCode) -> bool {
        app.handle_input(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(app: &mut App<MemoryStorage>, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn add_task(app: &mut App<MemoryStorage>, name: &str, category: usize) {
        press(app, KeyCode::Char('a'));
        type_text(app, name);
        press(app, KeyCode::Tab);
        press(app, KeyCode::Tab);
        for _ in 0..category {
            press(app, KeyCode::Right);
        }
        press(app, KeyCode::Enter);
    }

    #[test]
    fn test_cycle() {
        let choices = vec!["A".to_string(), "B".to_string()];
        assert_eq!(cycle("", &choices, true), "A");
        assert_eq!(cycle("A", &choices, true), "B");
        assert_eq!(cycle("B", &choices, true), "");
        assert_eq!(cycle("", &choices, false), "B");
        assert_eq!(cycle("Other", &choices, true), "A");
    }

    #[test]
    fn test_add_through_form() {
        let mut app = test_app();
        add_task(&mut app, "Pay rent", 2);

        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.store.len(), 1);
        let task = &app.store.tasks()[0];
        assert_eq!(task.name, "Pay rent");
        assert_eq!(task.category, "Personal");
        assert!(!task.completed);
        assert_eq!(app.draft, Draft::default());
        assert_eq!(app.state.selected(), Some(0));

        let toast = app.toasts.visible(Instant::now()).unwrap();
        assert_eq!(toast.message, "Task added successfully!");
    }

    #[test]
    fn test_empty_name_keeps_form_open() {
        let mut app = test_app();
        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "   ");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.input_mode, InputMode::Editing);
        assert!(app.store.is_empty());
        let toast = app.toasts.visible(Instant::now()).unwrap();
        assert_eq!(toast.kind, NotificationKind::Error);
        assert_eq!(toast.message, "Task cannot be empty!");
    }

    #[test]
    fn test_toggle_on_filtered_row_hits_visible_task() {
        let mut app = test_app();
        add_task(&mut app, "Call mom", 2);
        add_task(&mut app, "Buy milk", 3);

        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "milk");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.visible_tasks().len(), 1);
        assert_eq!(app.state.selected(), Some(0));

        press(&mut app, KeyCode::Char(' '));
        assert!(!app.store.tasks()[0].completed);
        assert!(app.store.tasks()[1].completed);
        assert_eq!(app.store.progress(), 50.0);
    }

    #[test]
    fn test_edit_and_cancel() {
        let mut app = test_app();
        add_task(&mut app, "Old", 0);

        press(&mut app, KeyCode::Char('e'));
        assert_eq!(app.form_title(), "Update Task");
        assert_eq!(app.draft.name, "Old");
        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Backspace);
        type_text(&mut app, "New");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.store.tasks()[0].name, "New");
        assert_eq!(app.store.len(), 1);

        press(&mut app, KeyCode::Char('e'));
        type_text(&mut app, "er");
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.form_title(), "Add Task");
        assert_eq!(app.store.tasks()[0].name, "New");
    }

    #[test]
    fn test_delete_clamps_selection() {
        let mut app = test_app();
        add_task(&mut app, "a", 0);
        add_task(&mut app, "b", 0);
        assert_eq!(app.state.selected(), Some(1));

        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.store.len(), 1);
        assert_eq!(app.state.selected(), Some(0));

        press(&mut app, KeyCode::Char('d'));
        assert!(app.store.is_empty());
        assert_eq!(app.state.selected(), None);
        // nothing selected, nothing happens
        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('j'));
    }

    #[test]
    fn test_category_filter_cycles_and_escape_resets() {
        let mut app = test_app();
        add_task(&mut app, "report", 1);
        add_task(&mut app, "groceries", 3);

        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.category_filter, "Work");
        assert_eq!(app.visible_tasks().len(), 1);
        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.category_filter, "Personal");
        assert!(app.visible_tasks().is_empty());
        assert_eq!(app.state.selected(), None);

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.category_filter, "");
        assert_eq!(app.visible_tasks().len(), 2);
        assert_eq!(app.state.selected(), Some(0));
    }

    #[test]
    fn test_quick_add() {
        let mut app = test_app();
        press(&mut app, KeyCode::Char('n'));
        type_text(&mut app, "Buy milk #Shopping !low");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.input_mode, InputMode::Normal);
        let task = &app.store.tasks()[0];
        assert_eq!(task.name, "Buy milk");
        assert_eq!(task.category, "Shopping");
        assert_eq!(task.priority, "Low");
        assert!(app.quick_add.is_empty());
    }

    #[test]
    fn test_navigation_wraps() {
        let mut app = test_app();
        add_task(&mut app, "a", 0);
        add_task(&mut app, "b", 0);
        press(&mut app, KeyCode::Char('j'));
        assert_eq!(app.state.selected(), Some(0));
        press(&mut app, KeyCode::Char('k'));
        assert_eq!(app.state.selected(), Some(1));
        assert!(press(&mut app, KeyCode::Char('q')));
    }
}
