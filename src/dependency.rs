//! Task dependency gate.
//!
//! Moving a task into `Done` while any of its prerequisites is still open is
//! not an error: the save is held back as a [`PendingSave`] and only goes
//! through once the requester explicitly confirms the override.
//!
//! # Exemptions
//!
//! The check only runs when all of these hold:
//!
//! - the task is being saved with status `Done`
//! - its previously persisted status (if any) was not `Done`
//! - its dependency list is non-empty
//!
//! Dependency ids that resolve to no known task are treated as satisfied.
//! Self-references and cycles are not detected.

use std::collections::HashMap;

use crate::model::{NewTask, Task, TaskStatus};

/// Id to task lookup over the current task snapshot.
#[derive(Debug, Clone, Default)]
pub struct TaskIndex<'a> {
    by_id: HashMap<&'a str, &'a Task>,
}

impl<'a> TaskIndex<'a> {
    pub fn new(tasks: &'a [Task]) -> Self {
        Self {
            by_id: tasks.iter().map(|t| (t.id.as_str(), t)).collect(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&'a Task> {
        self.by_id.get(id).copied()
    }

    /// Current status of a task, if it is known.
    pub fn status_of(&self, id: &str) -> Option<TaskStatus> {
        self.get(id).map(|t| t.status)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Whether a save must pass the dependency gate.
#[must_use]
pub fn requires_check(
    status: TaskStatus,
    dependency_ids: &[String],
    previous_status: Option<TaskStatus>,
) -> bool {
    status.is_done() && previous_status != Some(TaskStatus::Done) && !dependency_ids.is_empty()
}

/// Resolve each dependency and collect the ones that are not `Done`, in
/// dependency-list order. Unresolvable ids are skipped.
#[must_use]
pub fn check_dependencies(dependency_ids: &[String], index: &TaskIndex<'_>) -> Vec<Task> {
    dependency_ids
        .iter()
        .filter_map(|id| index.get(id))
        .filter(|dep| !dep.status.is_done())
        .cloned()
        .collect()
}

/// A task save request: a new task or a full replacement of an existing one.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskSave {
    Create(NewTask),
    Update(Task),
}

impl TaskSave {
    pub fn status(&self) -> TaskStatus {
        match self {
            TaskSave::Create(draft) => draft.status,
            TaskSave::Update(task) => task.status,
        }
    }

    pub fn dependency_ids(&self) -> &[String] {
        match self {
            TaskSave::Create(draft) => &draft.dependency_ids,
            TaskSave::Update(task) => &task.dependency_ids,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            TaskSave::Create(draft) => &draft.title,
            TaskSave::Update(task) => &task.title,
        }
    }

    /// Persisted status before this save; `None` for new tasks or ids that
    /// are not in the snapshot.
    pub fn previous_status(&self, index: &TaskIndex<'_>) -> Option<TaskStatus> {
        match self {
            TaskSave::Create(_) => None,
            TaskSave::Update(task) => index.status_of(&task.id),
        }
    }
}

/// A save held back until the requester confirms the override.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSave {
    pub save: TaskSave,
    /// Prerequisites that are not yet done, in dependency-list order.
    pub incomplete: Vec<Task>,
}

/// Outcome of running a save through the gate.
#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
    /// Persist immediately.
    Proceed(TaskSave),
    /// Surface `incomplete` and wait for an explicit override.
    Confirm(PendingSave),
}

/// The confirmation gate in front of task saves.
pub struct TaskGate;

impl TaskGate {
    /// Decide whether `save` can be persisted right away.
    pub fn evaluate(save: TaskSave, tasks: &[Task]) -> GateDecision {
        let index = TaskIndex::new(tasks);
        let previous = save.previous_status(&index);

        if !requires_check(save.status(), save.dependency_ids(), previous) {
            return GateDecision::Proceed(save);
        }

        let incomplete = check_dependencies(save.dependency_ids(), &index);
        if incomplete.is_empty() {
            GateDecision::Proceed(save)
        } else {
            GateDecision::Confirm(PendingSave { save, incomplete })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset;

    fn task(id: &str, status: TaskStatus, deps: &[&str]) -> Task {
        Task {
            id: id.into(),
            title: format!("Task {id}"),
            description: String::new(),
            due_date: "2023-07-20T00:00:00Z".parse().unwrap(),
            status,
            contact_id: "contact_1".into(),
            dependency_ids: deps.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_no_dependencies_never_gated() {
        let tasks = vec![task("a", TaskStatus::ToDo, &[])];
        let save = TaskSave::Update(task("a", TaskStatus::Done, &[]));
        assert!(matches!(TaskGate::evaluate(save, &tasks), GateDecision::Proceed(_)));
    }

    #[test]
    fn test_all_dependencies_done_proceeds() {
        let tasks = vec![
            task("a", TaskStatus::Done, &[]),
            task("b", TaskStatus::Done, &[]),
            task("c", TaskStatus::ToDo, &["a", "b"]),
        ];
        let save = TaskSave::Update(task("c", TaskStatus::Done, &["a", "b"]));
        assert!(matches!(TaskGate::evaluate(save, &tasks), GateDecision::Proceed(_)));
    }

    #[test]
    fn test_incomplete_subset_reported_in_order() {
        let tasks = vec![
            task("a", TaskStatus::InProgress, &[]),
            task("b", TaskStatus::Done, &[]),
            task("c", TaskStatus::ToDo, &[]),
            task("d", TaskStatus::ToDo, &["c", "b", "a"]),
        ];
        let save = TaskSave::Update(task("d", TaskStatus::Done, &["c", "b", "a"]));

        match TaskGate::evaluate(save, &tasks) {
            GateDecision::Confirm(pending) => {
                let ids: Vec<_> = pending.incomplete.iter().map(|t| t.id.as_str()).collect();
                assert_eq!(ids, vec!["c", "a"]);
            }
            other => panic!("expected confirmation, got {other:?}"),
        }
    }

    #[test]
    fn test_unresolvable_dependency_is_satisfied() {
        let tasks = vec![task("a", TaskStatus::ToDo, &["ghost"])];
        let save = TaskSave::Update(task("a", TaskStatus::Done, &["ghost"]));
        assert!(matches!(TaskGate::evaluate(save, &tasks), GateDecision::Proceed(_)));
    }

    #[test]
    fn test_resaving_done_task_is_exempt() {
        let tasks = vec![
            task("a", TaskStatus::ToDo, &[]),
            task("b", TaskStatus::Done, &["a"]),
        ];
        let save = TaskSave::Update(task("b", TaskStatus::Done, &["a"]));
        assert!(matches!(TaskGate::evaluate(save, &tasks), GateDecision::Proceed(_)));
    }

    #[test]
    fn test_non_done_status_is_exempt() {
        let tasks = vec![task("a", TaskStatus::ToDo, &[]), task("b", TaskStatus::ToDo, &["a"])];
        let save = TaskSave::Update(task("b", TaskStatus::InProgress, &["a"]));
        assert!(matches!(TaskGate::evaluate(save, &tasks), GateDecision::Proceed(_)));
    }

    #[test]
    fn test_new_task_created_as_done_is_checked() {
        let tasks = vec![task("a", TaskStatus::ToDo, &[])];
        let draft = NewTask {
            title: "Wrap up".into(),
            description: String::new(),
            due_date: "2023-07-21T00:00:00Z".parse().unwrap(),
            status: TaskStatus::Done,
            contact_id: "contact_1".into(),
            dependency_ids: vec!["a".into()],
        };
        assert!(matches!(
            TaskGate::evaluate(TaskSave::Create(draft), &tasks),
            GateDecision::Confirm(_)
        ));
    }

    #[test]
    fn test_self_reference_not_detected() {
        // A task listing itself sees its own persisted (not yet done) status.
        let tasks = vec![task("a", TaskStatus::ToDo, &["a"])];
        let save = TaskSave::Update(task("a", TaskStatus::Done, &["a"]));
        match TaskGate::evaluate(save, &tasks) {
            GateDecision::Confirm(pending) => assert_eq!(pending.incomplete[0].id, "a"),
            other => panic!("expected confirmation, got {other:?}"),
        }
    }

    #[test]
    fn test_fixture_task_2_blocked_by_task_1() {
        let tasks = dataset::tasks();
        let mut task_2 = tasks.iter().find(|t| t.id == "task_2").cloned().unwrap();
        task_2.status = TaskStatus::Done;

        match TaskGate::evaluate(TaskSave::Update(task_2), &tasks) {
            GateDecision::Confirm(pending) => {
                assert_eq!(pending.incomplete.len(), 1);
                assert_eq!(pending.incomplete[0].id, "task_1");
            }
            other => panic!("expected confirmation, got {other:?}"),
        }
    }

    #[test]
    fn test_requires_check_policy() {
        let deps = vec!["x".to_string()];
        assert!(requires_check(TaskStatus::Done, &deps, None));
        assert!(requires_check(TaskStatus::Done, &deps, Some(TaskStatus::ToDo)));
        assert!(!requires_check(TaskStatus::Done, &deps, Some(TaskStatus::Done)));
        assert!(!requires_check(TaskStatus::Done, &[], None));
        assert!(!requires_check(TaskStatus::InProgress, &deps, None));
    }

    #[test]
    fn test_task_index_lookup() {
        let tasks = dataset::tasks();
        let index = TaskIndex::new(&tasks);
        assert_eq!(index.len(), 4);
        assert_eq!(index.status_of("task_3"), Some(TaskStatus::Done));
        assert!(index.get("task_99").is_none());
    }
}
