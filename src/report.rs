use std::fmt::Write;

use crate::models::{DashboardSnapshot, FilterOptions, FilterState, HealthStatus};

pub const HISTOGRAM_BINS: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Splits the value range into `bins` equal-width buckets. The last bucket is
/// closed on both ends so the maximum lands in it.
pub fn histogram(values: &[i64], bins: usize) -> Vec<HistogramBin> {
    let (Some(min), Some(max)) = (values.iter().min(), values.iter().max()) else {
        return Vec::new();
    };
    if bins == 0 {
        return Vec::new();
    }
    if min == max {
        return vec![HistogramBin {
            start: *min as f64,
            end: *max as f64,
            count: values.len(),
        }];
    }

    let (min, max) = (*min as f64, *max as f64);
    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for value in values {
        let idx = (((*value as f64) - min) / width) as usize;
        counts[idx.min(bins - 1)] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(idx, count)| HistogramBin {
            start: min + width * idx as f64,
            end: min + width * (idx + 1) as f64,
            count,
        })
        .collect()
}

pub fn build_report(filters: &FilterState, snapshot: &DashboardSnapshot) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Support & Account Health Dashboard");
    let _ = writeln!(output, "Filters: {}", filters.describe());
    let _ = writeln!(output);

    let sla_note = if snapshot.sla_is_synthetic {
        " (simulated, no SLA column in support data)"
    } else {
        ""
    };
    let _ = writeln!(output, "## Key Figures");
    let _ = writeln!(output, "- Accounts: {}", snapshot.total_accounts);
    let _ = writeln!(
        output,
        "- SLA (first response): {:.1}%{}",
        snapshot.sla_percent, sla_note
    );
    let _ = writeln!(output, "- Critical health: {}", snapshot.critical_count);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Daily Ticket Volume");
    if snapshot.daily_volume.is_empty() {
        let _ = writeln!(output, "No dated tickets.");
    } else {
        for day in &snapshot.daily_volume {
            let _ = writeln!(output, "- {}: {}", day.date, day.tickets);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Load by Agent");
    let agent_total: usize = snapshot.agent_share.values().sum();
    if agent_total == 0 {
        let _ = writeln!(output, "No tickets assigned to focus agents.");
    } else {
        let mut agents: Vec<_> = snapshot.agent_share.iter().collect();
        agents.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (agent, count) in agents {
            let share = *count as f64 * 100.0 / agent_total as f64;
            let _ = writeln!(output, "- {agent}: {count} tickets ({share:.1}%)");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Account Health");
    for status in HealthStatus::ALL {
        let count = snapshot.health_distribution.get(&status).copied().unwrap_or(0);
        let _ = writeln!(output, "- {status}: {count}");
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Critical Accounts");
    if snapshot.critical_accounts.is_empty() {
        let _ = writeln!(output, "No critical accounts in this selection.");
    } else {
        for name in snapshot.critical_accounts.iter().take(10) {
            let _ = writeln!(output, "- {name}");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Days Since Last Contact");
    let bins = histogram(&snapshot.inactivity_histogram, HISTOGRAM_BINS);
    if bins.is_empty() {
        let _ = writeln!(output, "No accounts with a last-contact date.");
    } else {
        for bin in bins.iter().filter(|bin| bin.count > 0) {
            let _ = writeln!(
                output,
                "- {:.1} to {:.1} days: {}",
                bin.start, bin.end, bin.count
            );
        }
    }

    output
}

pub fn build_json(snapshot: &DashboardSnapshot) -> serde_json::Result<String> {
    serde_json::to_string_pretty(snapshot)
}

pub fn build_filter_listing(options: &FilterOptions) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Products:");
    for product in &options.products {
        let _ = writeln!(output, "- {product}");
    }
    let _ = writeln!(output, "Cohorts:");
    for cohort in &options.cohorts {
        let _ = writeln!(output, "- {cohort}");
    }
    output
}
