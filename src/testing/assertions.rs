//! Custom assertions for domain-specific testing.

use crate::dataset;
use crate::model::Task;
use crate::store::{Collections, DataSource, LoadReport, SaveOutcome};

/// Assert that the listed tasks have exactly these ids, in order.
///
/// # Panics
///
/// Panics with both id lists if they differ.
pub fn assert_task_ids<'a>(tasks: impl IntoIterator<Item = &'a Task>, expected: &[&str]) {
    let actual: Vec<&str> = tasks.into_iter().map(|t| t.id.as_str()).collect();
    assert_eq!(
        actual, expected,
        "Expected tasks {:?}, but got {:?}",
        expected, actual
    );
}

/// Assert that a task save was held back on exactly these prerequisites.
///
/// # Panics
///
/// Panics if the save went through or reported other prerequisites.
///
/// # Example
///
/// ```rust,ignore
/// let outcome = store.save_task(TaskSave::Update(task)).await?;
/// assert_gated(&outcome, &["task_1"]);
/// ```
pub fn assert_gated(outcome: &SaveOutcome, expected: &[&str]) {
    match outcome {
        SaveOutcome::NeedsConfirmation(pending) => assert_task_ids(&pending.incomplete, expected),
        SaveOutcome::Saved(task) => panic!(
            "Expected the save of '{}' to need confirmation, but it was saved.",
            task.title
        ),
    }
}

/// Assert that a load fell back from live to mock.
///
/// # Panics
///
/// Panics if the load used the requested live source.
pub fn assert_fell_back(report: &LoadReport) {
    assert!(
        report.fell_back && report.effective == DataSource::Mock,
        "Expected a fallback to mock data, but got {:?}",
        report
    );
}

/// Assert that the collections equal the static dataset.
///
/// # Panics
///
/// Panics naming the first collection that differs.
pub fn assert_mock_dataset(data: &Collections) {
    assert_eq!(data.apps, dataset::apps(), "apps differ from the mock dataset");
    assert_eq!(data.contacts, dataset::contacts(), "contacts differ from the mock dataset");
    assert_eq!(data.deals, dataset::deals(), "deals differ from the mock dataset");
    assert_eq!(data.tasks, dataset::tasks(), "tasks differ from the mock dataset");
}
