use serde::Serialize;

use super::Scope;
use crate::dataset::{self, MonthlyRevenue};
use crate::model::{Contact, Deal, DealStage};

/// Headline numbers for the dashboard cards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    /// Sum of won deal amounts.
    pub total_revenue: f64,
    pub deals_won: usize,
    pub contacts: usize,
    /// Revenue per won deal; zero when nothing was won.
    pub average_deal_value: f64,
}

/// Count and total amount of the deals in one stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StageSummary {
    pub stage: DealStage,
    pub count: usize,
    pub total: f64,
    /// Total weighted by each deal's win probability.
    pub weighted: f64,
}

/// Stats over already scoped contacts and deals.
pub fn dashboard_stats(contacts: &[&Contact], deals: &[&Deal]) -> DashboardStats {
    let won: Vec<&Deal> = deals
        .iter()
        .copied()
        .filter(|d| d.stage == DealStage::Won)
        .collect();
    let total_revenue: f64 = won.iter().map(|d| d.amount).sum();
    let average_deal_value = if won.is_empty() {
        0.0
    } else {
        total_revenue / won.len() as f64
    };

    DashboardStats {
        total_revenue,
        deals_won: won.len(),
        contacts: contacts.len(),
        average_deal_value,
    }
}

/// Per-stage totals in pipeline order; stages without deals report zero.
pub fn pipeline_summary<'a>(deals: impl IntoIterator<Item = &'a Deal>) -> Vec<StageSummary> {
    let mut summary: Vec<StageSummary> = DealStage::ALL
        .iter()
        .map(|&stage| StageSummary {
            stage,
            count: 0,
            total: 0.0,
            weighted: 0.0,
        })
        .collect();

    for deal in deals {
        if let Some(entry) = summary.iter_mut().find(|s| s.stage == deal.stage) {
            entry.count += 1;
            entry.total += deal.amount;
            entry.weighted += deal.weighted_amount();
        }
    }
    summary
}

/// Monthly revenue history limited to the scoped app.
pub fn monthly_revenue(scope: &Scope) -> Vec<MonthlyRevenue> {
    let mut series = dataset::monthly_revenue();
    if let Some(app_id) = scope.app_id() {
        for month in &mut series {
            month.by_app.retain(|(id, _, _)| *id == app_id);
        }
    }
    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::{scope_contacts, scope_deals};

    #[test]
    fn test_stats_for_all_apps() {
        let contacts = dataset::contacts();
        let deals = dataset::deals();
        let stats = dashboard_stats(
            &scope_contacts(&Scope::All, &contacts),
            &scope_deals(&Scope::All, &deals),
        );

        assert_eq!(stats.total_revenue, 40_000.0);
        assert_eq!(stats.deals_won, 3);
        assert_eq!(stats.contacts, 6);
        assert!((stats.average_deal_value - 40_000.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_stats_for_scoped_app() {
        let contacts = dataset::contacts();
        let deals = dataset::deals();
        let scope = Scope::App("app_2".into());
        let stats = dashboard_stats(&scope_contacts(&scope, &contacts), &scope_deals(&scope, &deals));

        assert_eq!(stats.total_revenue, 5_000.0);
        assert_eq!(stats.deals_won, 1);
        assert_eq!(stats.contacts, 3);
    }

    #[test]
    fn test_average_is_zero_without_wins() {
        let stats = dashboard_stats(&[], &[]);
        assert_eq!(stats.average_deal_value, 0.0);
        assert_eq!(stats.deals_won, 0);
    }

    #[test]
    fn test_pipeline_summary() {
        let deals = dataset::deals();
        let summary = pipeline_summary(&deals);

        assert_eq!(summary.len(), 6);
        assert_eq!(summary[4].stage, DealStage::Won);
        assert_eq!(summary[4].count, 3);
        assert_eq!(summary[4].total, 40_000.0);
        assert_eq!(summary[5].total, 18_000.0);
        assert!((summary[3].weighted - 6_000.0).abs() < 1e-9);
        assert_eq!(summary[5].weighted, 0.0);
    }

    #[test]
    fn test_monthly_revenue_scoped() {
        let all = monthly_revenue(&Scope::All);
        assert!(all.iter().all(|m| m.by_app.len() == 3));

        let scoped = monthly_revenue(&Scope::App("app_3".into()));
        assert_eq!(scoped[0].by_app, vec![("app_3", "QuantumLeap", 4500.0)]);

        let unknown = monthly_revenue(&Scope::App("app_9".into()));
        assert!(unknown.iter().all(|m| m.by_app.is_empty()));
    }
}
