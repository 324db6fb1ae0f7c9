use crate::aggregate;
use crate::loader::TicketTable;
use crate::models::{AccountRecord, DashboardSnapshot, FilterOptions, FilterState, TicketRecord};

/// Enriched account and ticket tables, fixed once loading finishes.
#[derive(Debug, Clone)]
pub struct Dashboard {
    accounts: Vec<AccountRecord>,
    tickets: Vec<TicketRecord>,
    sla_is_synthetic: bool,
    focus_agents: Vec<String>,
}

impl Dashboard {
    pub fn new(accounts: Vec<AccountRecord>, tickets: TicketTable, focus_agents: Vec<String>) -> Self {
        Self {
            accounts,
            tickets: tickets.tickets,
            sla_is_synthetic: tickets.sla_is_synthetic,
            focus_agents,
        }
    }

    pub fn accounts(&self) -> &[AccountRecord] {
        &self.accounts
    }

    pub fn tickets(&self) -> &[TicketRecord] {
        &self.tickets
    }

    pub fn snapshot(&self, filters: &FilterState) -> DashboardSnapshot {
        aggregate::aggregate(
            &self.accounts,
            &self.tickets,
            filters,
            &self.focus_agents,
            self.sla_is_synthetic,
        )
    }

    pub fn filter_options(&self) -> FilterOptions {
        aggregate::filter_options(&self.accounts)
    }
}
