use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::models::{
    AccountRecord, DailyVolume, DashboardSnapshot, FilterOptions, FilterState, HealthStatus,
    Product, SlaOutcome, TicketRecord,
};

/// Builds one dashboard snapshot. Product and cohort filters narrow the
/// account table only; ticket figures always cover the whole support export,
/// which has no column linking a ticket to an account.
pub fn aggregate(
    accounts: &[AccountRecord],
    tickets: &[TicketRecord],
    filters: &FilterState,
    focus_agents: &[String],
    sla_is_synthetic: bool,
) -> DashboardSnapshot {
    let selected: Vec<&AccountRecord> = accounts
        .iter()
        .filter(|account| filters.product.map_or(true, |p| account.product == p))
        .filter(|account| {
            filters
                .cohort
                .as_deref()
                .map_or(true, |c| account.cohort == c)
        })
        .collect();

    let health_distribution = health_distribution(&selected);

    let mut critical: Vec<&AccountRecord> = selected
        .iter()
        .copied()
        .filter(|account| account.health_status == HealthStatus::Critical)
        .collect();
    critical.sort_by(|a, b| b.days_inactive.cmp(&a.days_inactive));

    DashboardSnapshot {
        total_accounts: selected.len(),
        sla_percent: sla_percent(tickets),
        sla_is_synthetic,
        critical_count: health_distribution
            .get(&HealthStatus::Critical)
            .copied()
            .unwrap_or(0),
        daily_volume: daily_volume(tickets),
        agent_share: agent_share(tickets, focus_agents),
        health_distribution,
        inactivity_histogram: selected
            .iter()
            .filter_map(|account| account.days_inactive)
            .collect(),
        critical_accounts: critical.iter().map(|account| account.name.clone()).collect(),
    }
}

pub fn sla_percent(tickets: &[TicketRecord]) -> f64 {
    if tickets.is_empty() {
        return 0.0;
    }
    let within = tickets
        .iter()
        .filter(|t| t.sla_first_response == SlaOutcome::Within)
        .count();
    within as f64 * 100.0 / tickets.len() as f64
}

pub fn daily_volume(tickets: &[TicketRecord]) -> Vec<DailyVolume> {
    let mut by_date: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for created_at in tickets.iter().filter_map(|t| t.created_at) {
        *by_date.entry(created_at.date()).or_insert(0) += 1;
    }
    by_date
        .into_iter()
        .map(|(date, tickets)| DailyVolume { date, tickets })
        .collect()
}

pub fn agent_share(tickets: &[TicketRecord], focus_agents: &[String]) -> BTreeMap<String, usize> {
    let mut share = BTreeMap::new();
    for assignee in tickets.iter().filter_map(|t| t.assignee.as_deref()) {
        if focus_agents.iter().any(|agent| agent == assignee) {
            *share.entry(assignee.to_string()).or_insert(0) += 1;
        }
    }
    share
}

fn health_distribution(accounts: &[&AccountRecord]) -> BTreeMap<HealthStatus, usize> {
    let mut distribution: BTreeMap<HealthStatus, usize> =
        HealthStatus::ALL.iter().map(|status| (*status, 0)).collect();
    for account in accounts {
        *distribution.entry(account.health_status).or_insert(0) += 1;
    }
    distribution
}

/// Distinct products and cohorts, each sorted alphabetically by label.
pub fn filter_options(accounts: &[AccountRecord]) -> FilterOptions {
    let products: BTreeSet<_> = accounts.iter().map(|a| a.product).collect();
    let mut products: Vec<Product> = products.into_iter().collect();
    products.sort_by_key(|p| p.as_str());
    let cohorts: BTreeSet<_> = accounts.iter().map(|a| a.cohort.clone()).collect();
    FilterOptions {
        products,
        cohorts: cohorts.into_iter().collect(),
    }
}
