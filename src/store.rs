use crate::models::{Draft, EditMode, Task, TaskId};
use crate::notify::{NotificationKind, Notifier};
use crate::storage::{StorageError, TaskStorage};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    #[error("Task cannot be empty!")]
    Validation,
    #[error("no task with id {0}")]
    UnknownTask(TaskId),
}

/// Reads the persisted list. Missing or unreadable data yields an empty list.
pub fn load(storage: &impl TaskStorage, key: &str) -> Vec<Task> {
    let contents = match storage.read(key) {
        Ok(Some(contents)) => contents,
        Ok(None) => return Vec::new(),
        Err(err) => {
            tracing::warn!(key, error = %err, "could not read saved tasks, starting empty");
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<Task>>(&contents) {
        Ok(tasks) => tasks,
        Err(err) => {
            tracing::warn!(key, error = %err, "saved tasks are malformed, starting empty");
            Vec::new()
        }
    }
}

// Gives records without an id (or with a repeated one) a fresh id; returns the next free id.
// When the id space above the largest saved id runs out, the list is renumbered from 1.
fn assign_ids(tasks: &mut [Task]) -> u64 {
    let max = tasks.iter().map(|t| t.id.0).max().unwrap_or(0);
    let Some(mut next) = max.checked_add(1) else {
        return renumber(tasks);
    };
    let mut seen = HashSet::new();
    let mut exhausted = false;
    for task in tasks.iter_mut() {
        if task.id.0 == 0 || !seen.insert(task.id) {
            task.id = TaskId(next);
            seen.insert(task.id);
            match next.checked_add(1) {
                Some(after) => next = after,
                None => {
                    exhausted = true;
                    break;
                }
            }
        }
    }
    if exhausted {
        return renumber(tasks);
    }
    next
}

fn renumber(tasks: &mut [Task]) -> u64 {
    tracing::warn!(count = tasks.len(), "task ids exhausted, renumbering");
    for (i, task) in tasks.iter_mut().enumerate() {
        task.id = TaskId(i as u64 + 1);
    }
    tasks.len() as u64 + 1
}

pub struct TaskStore<S, N> {
    tasks: Vec<Task>,
    mode: EditMode,
    next_id: u64,
    storage: S,
    notifier: N,
    key: String,
}

impl<S: TaskStorage, N: Notifier> TaskStore<S, N> {
    /// Hydrates the store from whatever `storage` holds under `key`.
    pub fn open(storage: S, notifier: N, key: &str) -> Self {
        let mut tasks = load(&storage, key);
        let next_id = assign_ids(&mut tasks);
        tracing::debug!(count = tasks.len(), key, "loaded tasks");
        TaskStore {
            tasks,
            mode: EditMode::Adding,
            next_id,
            storage,
            notifier,
            key: key.to_string(),
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    fn allocate_id(&mut self) -> TaskId {
        if let Some(after) = self.next_id.checked_add(1) {
            let id = TaskId(self.next_id);
            self.next_id = after;
            return id;
        }
        self.next_id = renumber(&mut self.tasks);
        let id = TaskId(self.next_id);
        self.next_id += 1;
        id
    }

    fn position(&self, id: TaskId) -> Result<usize, StoreError> {
        self.tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or(StoreError::UnknownTask(id))
    }

    /// Writes the full list. Failures are reported but never undo the change.
    pub fn persist(&self) {
        if let Err(err) = self.try_persist() {
            tracing::error!(key = %self.key, error = %err, "failed to save tasks");
            self.notifier
                .notify("Could not save tasks!", NotificationKind::Error);
        }
    }

    fn try_persist(&self) -> Result<(), StorageError> {
        let json = serde_json::to_string(&self.tasks)?;
        self.storage.write(&self.key, &json)
    }

    /// Adds the draft as a new task, or applies it to the task being edited.
    /// The draft is cleared on success and left as is on failure.
    pub fn submit(&mut self, draft: &mut Draft) -> Result<TaskId, StoreError> {
        if draft.name.trim().is_empty() {
            self.notifier
                .notify(&StoreError::Validation.to_string(), NotificationKind::Error);
            return Err(StoreError::Validation);
        }

        let id = match self.mode {
            EditMode::Editing(id) => {
                let pos = match self.position(id) {
                    Ok(pos) => pos,
                    Err(err) => {
                        self.mode = EditMode::Adding;
                        return Err(err);
                    }
                };
                self.tasks[pos].apply(draft);
                self.mode = EditMode::Adding;
                tracing::info!(%id, "task updated");
                self.notifier
                    .notify("Task updated successfully!", NotificationKind::Success);
                id
            }
            EditMode::Adding => {
                let id = self.allocate_id();
                self.tasks.push(Task::from_draft(id, draft));
                tracing::info!(%id, "task added");
                self.notifier
                    .notify("Task added successfully!", NotificationKind::Success);
                id
            }
        };

        self.persist();
        draft.clear();
        Ok(id)
    }

    /// Switches to editing `id` and returns its fields for the form.
    pub fn begin_edit(&mut self, id: TaskId) -> Result<Draft, StoreError> {
        let pos = self.position(id)?;
        self.mode = EditMode::Editing(id);
        Ok(self.tasks[pos].to_draft())
    }

    pub fn cancel_edit(&mut self) {
        self.mode = EditMode::Adding;
    }

    pub fn remove(&mut self, id: TaskId) -> Result<Task, StoreError> {
        let pos = self.position(id)?;
        let removed = self.tasks.remove(pos);
        if self.mode == EditMode::Editing(id) {
            self.mode = EditMode::Adding;
        }
        tracing::info!(%id, "task deleted");
        self.notifier.notify("Task deleted!", NotificationKind::Error);
        self.persist();
        Ok(removed)
    }

    /// Flips the completion flag and returns its new value. Silent.
    pub fn toggle_completion(&mut self, id: TaskId) -> Result<bool, StoreError> {
        let pos = self.position(id)?;
        let task = &mut self.tasks[pos];
        task.completed = !task.completed;
        let completed = task.completed;
        tracing::debug!(%id, completed, "task toggled");
        self.persist();
        Ok(completed)
    }

    /// Tasks whose name contains `search` (ignoring case) and, when
    /// `category` is non-empty, whose category equals it.
    pub fn filtered_view(&self, search: &str, category: &str) -> Vec<&Task> {
        let needle = search.to_lowercase();
        self.tasks
            .iter()
            .filter(|t| t.name.to_lowercase().contains(&needle))
            .filter(|t| category.is_empty() || t.category == category)
            .collect()
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.completed).count()
    }

    /// Percentage of completed tasks, 0 for an empty list.
    pub fn progress(&self) -> f64 {
        if self.tasks.is_empty() {
            return 0.0;
        }
        self.completed_count() as f64 * 100.0 / self.tasks.len() as f64
    }
}
