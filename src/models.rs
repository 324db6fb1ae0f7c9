use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Product {
    Mba,
    Cpa,
    Cea,
    Cfp,
    Other,
}

impl Product {
    /// Keywords searched in list order; the first hit wins.
    pub const KEYWORDS: [(&'static str, Product); 4] = [
        ("MBA", Product::Mba),
        ("CPA", Product::Cpa),
        ("CEA", Product::Cea),
        ("CFP", Product::Cfp),
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mba => "MBA",
            Self::Cpa => "CPA",
            Self::Cea => "CEA",
            Self::Cfp => "CFP",
            Self::Other => "OTHER",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "MBA" => Some(Self::Mba),
            "CPA" => Some(Self::Cpa),
            "CEA" => Some(Self::Cea),
            "CFP" => Some(Self::Cfp),
            "OTHER" => Some(Self::Other),
            _ => None,
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
}

impl HealthStatus {
    pub const ALL: [HealthStatus; 3] = [Self::Healthy, Self::Warning, Self::Critical];

    /// Classifies days since last contact. Accounts with no usable
    /// last-message date count as healthy.
    pub fn classify(days_inactive: Option<i64>) -> Self {
        match days_inactive {
            Some(days) if days > 15 => Self::Critical,
            Some(days) if days > 7 => Self::Warning,
            Some(_) | None => Self::Healthy,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "HEALTHY",
            Self::Warning => "WARNING",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SlaOutcome {
    Within,
    Breached,
}

#[derive(Debug, Clone)]
pub struct AccountRecord {
    pub name: String,
    pub registered_at: Option<NaiveDateTime>,
    pub last_message_at: Option<NaiveDateTime>,
    pub product: Product,
    pub cohort: String,
    pub days_inactive: Option<i64>,
    pub health_status: HealthStatus,
}

#[derive(Debug, Clone)]
pub struct TicketRecord {
    pub created_at: Option<NaiveDateTime>,
    pub assignee: Option<String>,
    pub sla_first_response: SlaOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub product: Option<Product>,
    pub cohort: Option<String>,
}

impl FilterState {
    pub fn describe(&self) -> String {
        let product = self.product.map(|p| p.as_str()).unwrap_or("all products");
        let cohort = self.cohort.as_deref().unwrap_or("all cohorts");
        format!("{product} / {cohort}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyVolume {
    pub date: NaiveDate,
    pub tickets: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub total_accounts: usize,
    pub sla_percent: f64,
    pub sla_is_synthetic: bool,
    pub critical_count: usize,
    pub daily_volume: Vec<DailyVolume>,
    pub agent_share: BTreeMap<String, usize>,
    pub health_distribution: BTreeMap<HealthStatus, usize>,
    pub inactivity_histogram: Vec<i64>,
    /// Names of the selected CRITICAL accounts, most inactive first.
    pub critical_accounts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOptions {
    pub products: Vec<Product>,
    pub cohorts: Vec<String>,
}
