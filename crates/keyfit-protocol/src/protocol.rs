use serde::{Deserialize, Serialize};

/// One row of the backend's key ranking, descending by count.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct RankingEntry {
    pub key_code: String,
    pub count: u64,
}

impl RankingEntry {
    pub fn new(key_code: &str, count: u64) -> Self {
        Self {
            key_code: key_code.to_string(),
            count,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AppInfo {
    pub id: i64,
    pub name: String,
    pub bundle_id: String,
}

/// Earliest and latest recorded day, as unix seconds. The backend reports
/// `0/0` when nothing has been recorded yet.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct DateRange {
    pub min: i64,
    pub max: i64,
}

impl DateRange {
    pub fn is_empty(&self) -> bool {
        self.min == 0 && self.max == 0
    }
}

/// Parameters of a ranking request. `None` means unrestricted.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct RankingQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// Parameters of a total-count request. A `None` app aggregates all apps.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct CountQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<i64>,
}

impl CountQuery {
    /// Lifetime total for one app, or for all apps when `app_id` is `None`.
    pub fn lifetime(app_id: Option<i64>) -> Self {
        Self {
            app_id,
            start: None,
            end: None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct MonitoringStatus {
    pub running: bool,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct TotalCount {
    pub total: u64,
}
