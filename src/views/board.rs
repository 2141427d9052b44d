use crate::model::{Deal, DealStage, Task, TaskStatus};

/// One bucket per stage in pipeline order, largest amount first within a
/// stage. Equal amounts keep their collection order.
pub fn group_deals_by_stage<'a>(
    deals: impl IntoIterator<Item = &'a Deal>,
) -> Vec<(DealStage, Vec<&'a Deal>)> {
    let mut buckets: Vec<(DealStage, Vec<&'a Deal>)> =
        DealStage::ALL.iter().map(|&stage| (stage, Vec::new())).collect();

    for deal in deals {
        if let Some((_, bucket)) = buckets.iter_mut().find(|(stage, _)| *stage == deal.stage) {
            bucket.push(deal);
        }
    }
    for (_, bucket) in &mut buckets {
        bucket.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    }
    buckets
}

/// One bucket per status in board order; relative order is kept.
pub fn group_tasks_by_status<'a>(
    tasks: impl IntoIterator<Item = &'a Task>,
) -> Vec<(TaskStatus, Vec<&'a Task>)> {
    let mut buckets: Vec<(TaskStatus, Vec<&'a Task>)> =
        TaskStatus::ALL.iter().map(|&status| (status, Vec::new())).collect();

    for task in tasks {
        if let Some((_, bucket)) = buckets.iter_mut().find(|(status, _)| *status == task.status) {
            bucket.push(task);
        }
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset;

    #[test]
    fn test_every_stage_has_a_bucket() {
        let none: Vec<Deal> = Vec::new();
        let grouped = group_deals_by_stage(&none);
        assert_eq!(grouped.len(), DealStage::ALL.len());
        assert!(grouped.iter().all(|(_, bucket)| bucket.is_empty()));
    }

    #[test]
    fn test_deals_sorted_by_amount_within_stage() {
        let deals = dataset::deals();
        let grouped = group_deals_by_stage(&deals);

        let (stage, won) = &grouped[4];
        assert_eq!(*stage, DealStage::Won);
        let ids: Vec<_> = won.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["deal_1", "deal_8", "deal_2"]);
    }

    #[test]
    fn test_equal_amounts_keep_order() {
        let mut deals = dataset::deals();
        for deal in &mut deals {
            deal.stage = DealStage::LeadIn;
            deal.amount = 100.0;
        }
        let grouped = group_deals_by_stage(&deals);
        let ids: Vec<_> = grouped[0].1.iter().map(|d| d.id.clone()).collect();
        let expected: Vec<_> = deals.iter().map(|d| d.id.clone()).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_tasks_grouped_by_status() {
        let tasks = dataset::tasks();
        let grouped = group_tasks_by_status(&tasks);

        assert_eq!(grouped[0].0, TaskStatus::ToDo);
        let todo: Vec<_> = grouped[0].1.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(todo, vec!["task_2", "task_4"]);
        assert_eq!(grouped[1].1[0].id, "task_1");
        assert_eq!(grouped[2].1[0].id, "task_3");
    }
}
