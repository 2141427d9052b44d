//! Static in-memory dataset backing mock mode.
//!
//! Also used as the fallback when the live backend cannot be loaded.

use chrono::{DateTime, TimeZone, Utc};

use crate::model::{App, Contact, Deal, DealStage, Plan, Task, TaskStatus};

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0)
        .single()
        .unwrap_or_default()
}

fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    at(y, m, d, 0, 0)
}

pub fn apps() -> Vec<App> {
    [
        ("app_1", "IGOTIT", Plan::Enterprise, at(2023, 1, 15, 9, 30)),
        ("app_2", "LifeWayUSA", Plan::Pro, at(2023, 2, 20, 14, 0)),
        ("app_3", "QuantumLeap", Plan::Pro, at(2023, 3, 10, 18, 45)),
    ]
    .into_iter()
    .map(|(id, name, plan, created_at)| App {
        id: id.into(),
        name: name.into(),
        plan,
        created_at,
    })
    .collect()
}

pub fn contacts() -> Vec<Contact> {
    [
        ("contact_1", "Alice Johnson", "alice.j@example.com", "alice", "Innovate Inc.", &["app_1", "app_2"][..], at(2023, 5, 1, 10, 0)),
        ("contact_2", "Bob Smith", "bob.s@example.com", "bob", "Data Systems", &["app_2"][..], at(2023, 5, 2, 11, 20)),
        ("contact_3", "Charlie Brown", "charlie.b@example.com", "charlie", "Creative Solutions", &["app_1", "app_3"][..], at(2023, 5, 3, 14, 30)),
        ("contact_4", "Diana Prince", "diana.p@example.com", "diana", "Innovate Inc.", &["app_3"][..], at(2023, 5, 4, 9, 0)),
        ("contact_5", "Ethan Hunt", "ethan.h@example.com", "ethan", "Global Tech", &["app_1"][..], at(2023, 5, 5, 16, 45)),
        ("contact_6", "Fiona Glenanne", "fiona.g@example.com", "fiona", "Data Systems", &["app_2", "app_3"][..], at(2023, 5, 6, 13, 10)),
    ]
    .into_iter()
    .map(|(id, name, email, seed, company, app_ids, created_at)| Contact {
        id: id.into(),
        name: name.into(),
        email: email.into(),
        avatar_url: format!("https://picsum.photos/seed/{seed}/100/100"),
        company: company.into(),
        app_ids: app_ids.iter().map(|s| s.to_string()).collect(),
        created_at,
    })
    .collect()
}

pub fn deals() -> Vec<Deal> {
    [
        ("deal_1", "IGOTIT Enterprise License", 25000.0, DealStage::Won, "contact_1", "app_1", day(2023, 6, 15), 100, "Finalize contract."),
        ("deal_2", "LifeWayUSA Pro Plan", 5000.0, DealStage::Won, "contact_2", "app_2", day(2023, 6, 20), 100, "Onboarding complete."),
        ("deal_3", "QuantumLeap Pro Upgrade", 8000.0, DealStage::ProposalSent, "contact_3", "app_3", day(2023, 7, 10), 75, "Follow up on proposal feedback."),
        ("deal_4", "IGOTIT Support Package", 7500.0, DealStage::DemoScheduled, "contact_5", "app_1", day(2023, 7, 25), 50, "Prepare for product demo."),
        ("deal_5", "LifeWayUSA Annual Renewal", 4500.0, DealStage::ContactMade, "contact_6", "app_2", day(2023, 8, 1), 25, "Schedule renewal call."),
        ("deal_6", "New Lead from Website", 12000.0, DealStage::LeadIn, "contact_4", "app_3", day(2023, 8, 15), 10, "Initial qualification call."),
        ("deal_7", "Past Customer Reactivation", 18000.0, DealStage::Lost, "contact_1", "app_2", day(2023, 6, 30), 0, "Went with competitor."),
        ("deal_8", "QuantumLeap Initial Deal", 10000.0, DealStage::Won, "contact_4", "app_3", day(2023, 6, 5), 100, "Project kickoff meeting scheduled."),
    ]
    .into_iter()
    .map(
        |(id, title, amount, stage, contact_id, app_id, close_date, probability, next_step)| Deal {
            id: id.into(),
            title: title.into(),
            amount,
            stage,
            contact_id: contact_id.into(),
            app_id: app_id.into(),
            close_date,
            probability,
            next_step: next_step.into(),
        },
    )
    .collect()
}

pub fn tasks() -> Vec<Task> {
    [
        ("task_1", "Follow up with Alice", "Discuss the enterprise license details.", day(2023, 7, 20), TaskStatus::InProgress, "contact_1", &[][..]),
        ("task_2", "Prepare demo for Charlie", "Showcase the new features of QuantumLeap.", day(2023, 7, 22), TaskStatus::ToDo, "contact_3", &["task_1"][..]),
        ("task_3", "Send proposal to Diana", "Proposal for the new lead from the website.", day(2023, 7, 18), TaskStatus::Done, "contact_4", &[][..]),
        ("task_4", "Check in with Bob Smith", "See how the Pro plan is working out for Data Systems.", day(2023, 7, 25), TaskStatus::ToDo, "contact_2", &[][..]),
    ]
    .into_iter()
    .map(|(id, title, description, due_date, status, contact_id, deps)| Task {
        id: id.into(),
        title: title.into(),
        description: description.into(),
        due_date,
        status,
        contact_id: contact_id.into(),
        dependency_ids: deps.iter().map(|s: &&str| s.to_string()).collect(),
    })
    .collect()
}

/// One month of revenue, broken down by app name.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyRevenue {
    pub month: &'static str,
    /// `(app id, app name, amount)` in registry order.
    pub by_app: Vec<(&'static str, &'static str, f64)>,
}

/// Revenue history shown on the dashboard chart.
pub fn monthly_revenue() -> Vec<MonthlyRevenue> {
    [
        ("Jan", 12000.0, 9000.0, 4500.0),
        ("Feb", 15000.0, 7500.0, 6000.0),
        ("Mar", 22000.0, 11000.0, 8000.0),
        ("Apr", 18000.0, 13000.0, 7000.0),
        ("May", 25000.0, 15000.0, 10000.0),
        ("Jun", 35000.0, 19500.0, 18000.0),
    ]
    .into_iter()
    .map(|(month, igotit, lifeway, quantum)| MonthlyRevenue {
        month,
        by_app: vec![
            ("app_1", "IGOTIT", igotit),
            ("app_2", "LifeWayUSA", lifeway),
            ("app_3", "QuantumLeap", quantum),
        ],
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_unique_per_collection() {
        let app_ids: HashSet<_> = apps().into_iter().map(|a| a.id).collect();
        assert_eq!(app_ids.len(), 3);
        let contact_ids: HashSet<_> = contacts().into_iter().map(|c| c.id).collect();
        assert_eq!(contact_ids.len(), 6);
        let deal_ids: HashSet<_> = deals().into_iter().map(|d| d.id).collect();
        assert_eq!(deal_ids.len(), 8);
        let task_ids: HashSet<_> = tasks().into_iter().map(|t| t.id).collect();
        assert_eq!(task_ids.len(), 4);
    }

    #[test]
    fn test_task_2_depends_on_in_progress_task_1() {
        let tasks = tasks();
        let task_1 = tasks.iter().find(|t| t.id == "task_1").unwrap();
        let task_2 = tasks.iter().find(|t| t.id == "task_2").unwrap();
        assert_eq!(task_1.status, TaskStatus::InProgress);
        assert_eq!(task_2.dependency_ids, vec!["task_1".to_string()]);
    }

    #[test]
    fn test_contacts_reference_known_apps() {
        let app_ids: HashSet<_> = apps().into_iter().map(|a| a.id).collect();
        for contact in contacts() {
            assert!(contact.app_ids.iter().all(|id| app_ids.contains(id)));
        }
    }

    #[test]
    fn test_monthly_revenue_has_six_months() {
        let series = monthly_revenue();
        assert_eq!(series.len(), 6);
        assert_eq!(series[5].month, "Jun");
        assert_eq!(series[5].by_app[0].2, 35000.0);
    }
}
