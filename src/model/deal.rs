use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{normalize_label, require};
use crate::error::{CrmError, Result};

/// Pipeline stage of a deal, in board order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DealStage {
    #[default]
    #[serde(rename = "Lead In")]
    LeadIn,
    #[serde(rename = "Contact Made")]
    ContactMade,
    #[serde(rename = "Demo Scheduled")]
    DemoScheduled,
    #[serde(rename = "Proposal Sent")]
    ProposalSent,
    Won,
    Lost,
}

impl DealStage {
    /// Every stage in pipeline order; grouping produces one bucket per entry.
    pub const ALL: [DealStage; 6] = [
        DealStage::LeadIn,
        DealStage::ContactMade,
        DealStage::DemoScheduled,
        DealStage::ProposalSent,
        DealStage::Won,
        DealStage::Lost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DealStage::LeadIn => "Lead In",
            DealStage::ContactMade => "Contact Made",
            DealStage::DemoScheduled => "Demo Scheduled",
            DealStage::ProposalSent => "Proposal Sent",
            DealStage::Won => "Won",
            DealStage::Lost => "Lost",
        }
    }

    /// Won or lost; the deal has left the active pipeline.
    pub fn is_closed(&self) -> bool {
        matches!(self, DealStage::Won | DealStage::Lost)
    }
}

impl fmt::Display for DealStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DealStage {
    type Err = CrmError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = normalize_label(s);
        DealStage::ALL
            .into_iter()
            .find(|stage| normalize_label(stage.as_str()) == wanted)
            .ok_or_else(|| CrmError::validation("stage", format!("unknown deal stage '{s}'")))
    }
}

/// Clamp any integer percentage into `0..=100`.
pub fn clamp_probability(value: i64) -> u8 {
    value.clamp(0, 100) as u8
}

fn deserialize_probability<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0);
    Ok(clamp_probability(raw.round() as i64))
}

/// An opportunity moving through the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    pub id: String,
    pub title: String,
    pub amount: f64,
    pub stage: DealStage,
    #[serde(rename = "contactId")]
    pub contact_id: String,
    #[serde(rename = "appId")]
    pub app_id: String,
    #[serde(rename = "closeDate")]
    pub close_date: DateTime<Utc>,
    #[serde(default, deserialize_with = "deserialize_probability")]
    pub probability: u8,
    #[serde(rename = "nextStep", default, deserialize_with = "super::null_as_default")]
    pub next_step: String,
}

impl Deal {
    pub fn validate(&self) -> Result<()> {
        validate_fields(&self.title, self.amount, &self.contact_id, &self.app_id)
    }

    /// Amount weighted by the win probability.
    pub fn weighted_amount(&self) -> f64 {
        self.amount * f64::from(self.probability) / 100.0
    }
}

/// Deal draft; the id is assigned on add.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDeal {
    pub title: String,
    pub amount: f64,
    pub stage: DealStage,
    #[serde(rename = "contactId")]
    pub contact_id: String,
    #[serde(rename = "appId")]
    pub app_id: String,
    #[serde(rename = "closeDate")]
    pub close_date: DateTime<Utc>,
    pub probability: u8,
    #[serde(rename = "nextStep", default)]
    pub next_step: String,
}

impl NewDeal {
    pub fn validate(&self) -> Result<()> {
        validate_fields(&self.title, self.amount, &self.contact_id, &self.app_id)
    }

    pub fn into_deal(self, id: String) -> Deal {
        Deal {
            id,
            title: self.title,
            amount: self.amount,
            stage: self.stage,
            contact_id: self.contact_id,
            app_id: self.app_id,
            close_date: self.close_date,
            probability: self.probability.min(100),
            next_step: self.next_step,
        }
    }
}

fn validate_fields(title: &str, amount: f64, contact_id: &str, app_id: &str) -> Result<()> {
    require("title", title)?;
    if !amount.is_finite() || amount < 0.0 {
        return Err(CrmError::validation("amount", "must be a non-negative number"));
    }
    require("contactId", contact_id)?;
    require("appId", app_id)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deal_json(probability: &str) -> String {
        format!(
            r#"{{"id":"deal_1","title":"License","amount":25000,"stage":"Proposal Sent","contactId":"contact_1","appId":"app_1","closeDate":"2023-06-15T00:00:00Z","probability":{probability},"nextStep":"Call"}}"#
        )
    }

    #[test]
    fn test_stage_wire_labels() {
        let deal: Deal = serde_json::from_str(&deal_json("75")).unwrap();
        assert_eq!(deal.stage, DealStage::ProposalSent);
        let value = serde_json::to_value(&deal).unwrap();
        assert_eq!(value["stage"], "Proposal Sent");
        assert_eq!(value["closeDate"], "2023-06-15T00:00:00Z");
    }

    #[test]
    fn test_probability_is_clamped_on_decode() {
        let high: Deal = serde_json::from_str(&deal_json("140")).unwrap();
        assert_eq!(high.probability, 100);
        let low: Deal = serde_json::from_str(&deal_json("-5")).unwrap();
        assert_eq!(low.probability, 0);
        let missing: Deal = serde_json::from_str(&deal_json("null")).unwrap();
        assert_eq!(missing.probability, 0);
    }

    #[test]
    fn test_stage_parse_aliases() {
        assert_eq!("lead-in".parse::<DealStage>().unwrap(), DealStage::LeadIn);
        assert_eq!("Demo Scheduled".parse::<DealStage>().unwrap(), DealStage::DemoScheduled);
        assert!("negotiation".parse::<DealStage>().is_err());
    }

    #[test]
    fn test_negative_amount_rejected() {
        let mut deal: Deal = serde_json::from_str(&deal_json("50")).unwrap();
        assert!(deal.validate().is_ok());
        deal.amount = -1.0;
        assert!(deal.validate().is_err());
    }

    #[test]
    fn test_weighted_amount() {
        let deal: Deal = serde_json::from_str(&deal_json("50")).unwrap();
        assert!((deal.weighted_amount() - 12_500.0).abs() < f64::EPSILON);
    }
}
