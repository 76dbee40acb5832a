//! Lifecycle facts as reported by a single knowledge source.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One source's answer about a product's lifecycle state.
///
/// Ephemeral: every response enters the dispatcher's ranking and history, but
/// only the chosen answer is persisted (as a cache entry payload).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse {
    /// Identity of the source that produced this answer.
    pub agent_name: String,
    /// Release cycle the answer refers to (e.g. `22.04`, `2019`).
    pub cycle: String,
    /// End-of-life date, when the source knows one.
    pub eol_date: Option<NaiveDate>,
    /// Latest release within the cycle.
    pub latest_version: String,
    /// Whether the cycle is a long-term-support release.
    pub is_lts: bool,
    /// Self-reported trust score, 0-100.
    pub confidence_level: u8,
    /// When the source produced the answer.
    pub fetched_at: DateTime<Utc>,
}

impl AgentResponse {
    /// Days until the end-of-life date, negative once it has passed.
    ///
    /// `None` when the source reported no date.
    pub fn days_until_eol(&self, now: DateTime<Utc>) -> Option<i64> {
        self.eol_date
            .map(|eol| (eol - now.date_naive()).num_days())
    }

    /// Whether the product is already past end of life.
    pub fn is_eol(&self, now: DateTime<Utc>) -> bool {
        self.days_until_eol(now).is_some_and(|days| days < 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(eol_date: Option<NaiveDate>) -> AgentResponse {
        AgentResponse {
            agent_name: "test".to_string(),
            cycle: "1.0".to_string(),
            eol_date,
            latest_version: "1.0.9".to_string(),
            is_lts: false,
            confidence_level: 90,
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn test_days_until_eol() {
        let now = Utc::now();
        let in_ten_days = now.date_naive() + chrono::Duration::days(10);
        assert_eq!(response(Some(in_ten_days)).days_until_eol(now), Some(10));
        assert_eq!(response(None).days_until_eol(now), None);
    }

    #[test]
    fn test_is_eol_past_date() {
        let now = Utc::now();
        let last_year = now.date_naive() - chrono::Duration::days(365);
        assert!(response(Some(last_year)).is_eol(now));
        assert!(!response(None).is_eol(now));
    }

    #[test]
    fn test_serde_round_trip() {
        let original = response(Some(NaiveDate::from_ymd_opt(2027, 4, 1).unwrap()));
        let json = serde_json::to_string(&original).unwrap();
        let decoded: AgentResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, original);
    }
}
