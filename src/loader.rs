use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord};

use crate::config::{AdminColumns, DashboardConfig};
use crate::dashboard::Dashboard;
use crate::error::{DataLoadError, LoadResult};
use crate::models::{AccountRecord, HealthStatus, Product, SlaOutcome, TicketRecord};
use crate::sla::SlaSource;

pub const DEFAULT_COHORT: &str = "General";

// Slash dates are day-first (DD/MM/YYYY), as the source exports write them.
const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d/%m/%Y"];

#[derive(Debug, Clone)]
pub struct TicketTable {
    pub tickets: Vec<TicketRecord>,
    pub sla_is_synthetic: bool,
}

pub fn load(
    admin_path: &Path,
    support_path: &Path,
    config: &DashboardConfig,
    sla_fallback: &mut dyn SlaSource,
) -> LoadResult<Dashboard> {
    let accounts = read_accounts(
        open(admin_path)?,
        &admin_path.display().to_string(),
        &config.admin_columns,
    )?;
    let tickets = read_tickets(
        open(support_path)?,
        &support_path.display().to_string(),
        config,
        sla_fallback,
    )?;

    Ok(Dashboard::new(accounts, tickets, config.focus_agents.clone()))
}

fn open(path: &Path) -> LoadResult<File> {
    File::open(path).map_err(|source| DataLoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn read_accounts<R: Read>(
    reader: R,
    source_name: &str,
    columns: &AdminColumns,
) -> LoadResult<Vec<AccountRecord>> {
    let mut reader = ReaderBuilder::new().from_reader(reader);
    let headers = headers(&mut reader, source_name)?;
    let name_idx = require_column(&headers, source_name, &columns.name)?;
    let registered_idx = require_column(&headers, source_name, &columns.registered_at)?;
    let last_message_idx = require_column(&headers, source_name, &columns.last_message_at)?;

    let mut accounts = Vec::new();
    let mut bad_dates = 0usize;

    for result in reader.records() {
        let record = result.map_err(|source| csv_error(source_name, source))?;
        let name = cell(&record, name_idx).to_string();
        let registered_at = parse_cell_datetime(&record, registered_idx, &mut bad_dates);
        let last_message_at = parse_cell_datetime(&record, last_message_idx, &mut bad_dates);

        accounts.push(AccountRecord {
            product: derive_product(&name),
            cohort: derive_cohort(&name),
            name,
            registered_at,
            last_message_at,
            days_inactive: None,
            health_status: HealthStatus::Healthy,
        });
    }

    if bad_dates > 0 {
        log::debug!("{source_name}: {bad_dates} unparsable date cells left empty");
    }

    apply_inactivity(&mut accounts);
    log::info!("{source_name}: loaded {} accounts", accounts.len());
    Ok(accounts)
}

/// Measures inactivity against the most recent last-message date in the table,
/// then classifies health.
pub fn apply_inactivity(accounts: &mut [AccountRecord]) {
    let reference = accounts.iter().filter_map(|a| a.last_message_at).max();
    if reference.is_none() && !accounts.is_empty() {
        log::warn!("no account has a usable last-message date; inactivity is unknown for all");
    }

    for account in accounts.iter_mut() {
        account.days_inactive = match (reference, account.last_message_at) {
            (Some(now), Some(last)) => Some((now - last).num_days()),
            _ => None,
        };
        account.health_status = HealthStatus::classify(account.days_inactive);
    }
}

pub fn read_tickets<R: Read>(
    reader: R,
    source_name: &str,
    config: &DashboardConfig,
    sla_fallback: &mut dyn SlaSource,
) -> LoadResult<TicketTable> {
    let columns = &config.support_columns;
    let mut reader = ReaderBuilder::new().from_reader(reader);
    let headers = headers(&mut reader, source_name)?;
    let created_idx = require_column(&headers, source_name, &columns.created_at)?;
    let assignee_idx = require_column(&headers, source_name, &columns.assignee)?;
    let sla_idx = find_column(&headers, &columns.sla_first_response);

    if sla_idx.is_none() {
        log::warn!(
            "{source_name}: no '{}' column; first-response SLA is SIMULATED by the {} source, not measured",
            columns.sla_first_response,
            sla_fallback.name()
        );
    }

    let mut tickets = Vec::new();
    let mut bad_dates = 0usize;

    for (row, result) in reader.records().enumerate() {
        let record = result.map_err(|source| csv_error(source_name, source))?;
        let created_at = parse_cell_datetime(&record, created_idx, &mut bad_dates);
        let assignee = Some(cell(&record, assignee_idx))
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        let sla_first_response = match sla_idx {
            Some(idx) if config.is_within_label(cell(&record, idx)) => SlaOutcome::Within,
            Some(_) => SlaOutcome::Breached,
            None => sla_fallback.first_response(row),
        };

        tickets.push(TicketRecord {
            created_at,
            assignee,
            sla_first_response,
        });
    }

    if bad_dates > 0 {
        log::debug!("{source_name}: {bad_dates} unparsable date cells left empty");
    }
    log::info!("{source_name}: loaded {} tickets", tickets.len());

    Ok(TicketTable {
        tickets,
        sla_is_synthetic: sla_idx.is_none() && sla_fallback.is_synthetic(),
    })
}

pub fn derive_product(name: &str) -> Product {
    let upper = name.to_uppercase();
    Product::KEYWORDS
        .iter()
        .find(|(keyword, _)| upper.contains(keyword))
        .map(|(_, product)| *product)
        .unwrap_or(Product::Other)
}

/// Takes the three characters after " T" in the uppercased name. A " T"
/// followed by a digit wins over earlier ones ("MBA TURMA T101" is "101").
pub fn derive_cohort(name: &str) -> String {
    let upper = name.to_uppercase();
    let starts: Vec<usize> = upper.match_indices(" T").map(|(idx, _)| idx + 2).collect();
    let start = starts
        .iter()
        .copied()
        .find(|&start| upper[start..].starts_with(|c: char| c.is_ascii_digit()))
        .or_else(|| starts.first().copied());

    let Some(start) = start else {
        return DEFAULT_COHORT.to_string();
    };

    let cohort: String = upper[start..].chars().take(3).collect();
    let cohort = cohort.trim();
    if cohort.is_empty() {
        DEFAULT_COHORT.to_string()
    } else {
        cohort.to_string()
    }
}

/// Values with an explicit offset are converted to UTC; naive values are taken
/// as written. A column mixing both is not supported: the reference "now" and
/// per-row inactivity would be measured in different clocks.
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

fn headers<R: Read>(reader: &mut csv::Reader<R>, source_name: &str) -> LoadResult<StringRecord> {
    reader
        .headers()
        .cloned()
        .map_err(|source| csv_error(source_name, source))
}

fn find_column(headers: &StringRecord, column: &str) -> Option<usize> {
    headers
        .iter()
        .position(|header| header.trim_start_matches('\u{feff}').trim() == column)
}

fn require_column(headers: &StringRecord, source_name: &str, column: &str) -> LoadResult<usize> {
    find_column(headers, column).ok_or_else(|| DataLoadError::MissingColumn {
        source_name: source_name.to_string(),
        column: column.to_string(),
    })
}

fn cell(record: &StringRecord, idx: usize) -> &str {
    record.get(idx).unwrap_or("").trim()
}

fn parse_cell_datetime(record: &StringRecord, idx: usize, bad: &mut usize) -> Option<NaiveDateTime> {
    let raw = cell(record, idx);
    let parsed = parse_datetime(raw);
    if parsed.is_none() && !raw.is_empty() {
        *bad += 1;
    }
    parsed
}

fn csv_error(source_name: &str, source: csv::Error) -> DataLoadError {
    DataLoadError::Csv {
        source_name: source_name.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sla::SyntheticSla;

    const ADMIN_CSV: &str = "\
Nome,Cadastro,Data_Última_Msg
MBA TURMA T101 FINANÇAS,2023-02-01,2024-03-31 10:00:00
CPA-20 T22 Intensivo,2023-05-10,2024-03-20 09:00:00
Curso livre,not a date,2024-03-01 08:00:00
CFP e MBA combo,2023-01-01,
";

    fn accounts() -> Vec<AccountRecord> {
        read_accounts(ADMIN_CSV.as_bytes(), "admin.csv", &AdminColumns::default()).unwrap()
    }

    /// Always answers breached and never claims to be synthetic.
    struct FixedSla;

    impl SlaSource for FixedSla {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn is_synthetic(&self) -> bool {
            false
        }

        fn first_response(&mut self, _row: usize) -> SlaOutcome {
            SlaOutcome::Breached
        }
    }

    #[test]
    fn product_follows_keyword_order() {
        assert_eq!(derive_product("MBA TURMA T101 FINANÇAS"), Product::Mba);
        assert_eq!(derive_product("cpa-10 online"), Product::Cpa);
        assert_eq!(derive_product("Trilha CEA"), Product::Cea);
        assert_eq!(derive_product("CFP e MBA combo"), Product::Mba);
        assert_eq!(derive_product("Curso livre"), Product::Other);
        assert_eq!(derive_product(""), Product::Other);
    }

    #[test]
    fn cohort_reads_three_chars_after_t() {
        assert_eq!(derive_cohort("MBA TURMA T101 FINANÇAS"), "101");
        assert_eq!(derive_cohort("mba t204 noite"), "204");
        assert_eq!(derive_cohort("CPA TURMA ESPECIAL"), "URM");
        assert_eq!(derive_cohort("CEA T9"), "9");
        assert_eq!(derive_cohort("CEA T"), DEFAULT_COHORT);
        assert_eq!(derive_cohort("Curso livre"), DEFAULT_COHORT);
        assert_eq!(derive_cohort("TURMA sem espaço"), DEFAULT_COHORT);
    }

    #[test]
    fn parses_common_date_shapes() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();
        assert_eq!(parse_datetime("2024-01-05 14:30:00"), Some(expected));
        assert_eq!(parse_datetime("2024-01-05T14:30:00"), Some(expected));
        assert_eq!(parse_datetime("2024-01-05 14:30"), Some(expected));
        assert_eq!(parse_datetime("05/01/2024 14:30"), Some(expected));
        assert_eq!(parse_datetime("2024-01-05T14:30:00Z"), Some(expected));
        assert_eq!(
            parse_datetime("2024-01-05"),
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(parse_datetime("ontem"), None);
        assert_eq!(parse_datetime("  "), None);
    }

    #[test]
    fn offsets_are_normalised_to_utc() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_opt(11, 30, 0)
            .unwrap();
        assert_eq!(parse_datetime("2024-01-05T14:30:00+03:00"), Some(expected));
        assert_eq!(parse_datetime("2024-01-05T08:30:00-03:00"), Some(expected));
    }

    #[test]
    fn slash_dates_are_day_first() {
        assert_eq!(
            parse_datetime("05/01/2024"),
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(
            parse_datetime("13/01/2024").map(|d| d.date()),
            NaiveDate::from_ymd_opt(2024, 1, 13)
        );
    }

    #[test]
    fn ragged_admin_rows_are_rejected() {
        let short = "Nome,Cadastro,Data_Última_Msg\nMBA T1\n";
        let err = read_accounts(short.as_bytes(), "admin.csv", &AdminColumns::default()).unwrap_err();
        assert!(matches!(err, DataLoadError::Csv { .. }));

        let long = "Nome,Cadastro,Data_Última_Msg\nCPA T2,a,2024-01-01,extra\n";
        let err = read_accounts(long.as_bytes(), "admin.csv", &AdminColumns::default()).unwrap_err();
        assert!(matches!(err, DataLoadError::Csv { .. }));
    }

    #[test]
    fn ragged_support_rows_are_rejected() {
        let csv = "created,responsavel\n2024-01-01,Adriel\n2024-01-02,Isabella,Dentro\n";
        let err = read_tickets(
            csv.as_bytes(),
            "suporte.csv",
            &DashboardConfig::default(),
            &mut FixedSla,
        )
        .unwrap_err();
        assert!(matches!(err, DataLoadError::Csv { .. }));
    }

    #[test]
    fn accounts_are_enriched_in_source_order() {
        let accounts = accounts();
        assert_eq!(accounts.len(), 4);

        assert_eq!(accounts[0].product, Product::Mba);
        assert_eq!(accounts[0].cohort, "101");
        assert_eq!(accounts[0].days_inactive, Some(0));
        assert_eq!(accounts[0].health_status, HealthStatus::Healthy);

        assert_eq!(accounts[1].product, Product::Cpa);
        assert_eq!(accounts[1].cohort, "22");
        assert_eq!(accounts[1].days_inactive, Some(11));
        assert_eq!(accounts[1].health_status, HealthStatus::Warning);

        assert_eq!(accounts[2].registered_at, None);
        assert_eq!(accounts[2].days_inactive, Some(30));
        assert_eq!(accounts[2].health_status, HealthStatus::Critical);

        assert_eq!(accounts[3].last_message_at, None);
        assert_eq!(accounts[3].days_inactive, None);
        assert_eq!(accounts[3].health_status, HealthStatus::Healthy);
    }

    #[test]
    fn partial_days_round_down() {
        let csv = "Nome,Cadastro,Data_Última_Msg\n\
                   a,,2024-01-10 12:00:00\n\
                   b,,2024-01-02 18:00:00\n";
        let accounts = read_accounts(csv.as_bytes(), "admin.csv", &AdminColumns::default()).unwrap();
        assert_eq!(accounts[1].days_inactive, Some(7));
        assert_eq!(accounts[1].health_status, HealthStatus::Healthy);
    }

    #[test]
    fn no_last_message_dates_means_all_healthy() {
        let csv = "Nome,Cadastro,Data_Última_Msg\nMBA T1,,\nCPA T2,,garbage\n";
        let accounts = read_accounts(csv.as_bytes(), "admin.csv", &AdminColumns::default()).unwrap();
        assert!(accounts.iter().all(|a| a.days_inactive.is_none()));
        assert!(accounts.iter().all(|a| a.health_status == HealthStatus::Healthy));
    }

    #[test]
    fn missing_admin_column_is_rejected() {
        let csv = "Nome,Cadastro\nMBA T1,2024-01-01\n";
        let err = read_accounts(csv.as_bytes(), "admin.csv", &AdminColumns::default()).unwrap_err();
        match err {
            DataLoadError::MissingColumn { column, .. } => assert_eq!(column, "Data_Última_Msg"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn custom_column_names_are_honoured() {
        let columns = AdminColumns {
            name: "student".to_string(),
            registered_at: "signup".to_string(),
            last_message_at: "last_seen".to_string(),
        };
        let csv = "student,signup,last_seen\nCEA T07,2024-01-01,2024-02-01\n";
        let accounts = read_accounts(csv.as_bytes(), "admin.csv", &columns).unwrap();
        assert_eq!(accounts[0].product, Product::Cea);
        assert_eq!(accounts[0].cohort, "07");
    }

    #[test]
    fn sla_column_is_used_when_present() {
        let csv = "created,responsavel,SLA_First_Resp\n\
                   2024-01-01 08:00,Adriel,Dentro\n\
                   2024-01-01 09:00,,Fora\n\
                   bad,Isabella,\n";
        let mut fallback = SyntheticSla::with_rate(1, 1.0);
        let table = read_tickets(
            csv.as_bytes(),
            "suporte.csv",
            &DashboardConfig::default(),
            &mut fallback,
        )
        .unwrap();

        assert!(!table.sla_is_synthetic);
        let outcomes: Vec<_> = table.tickets.iter().map(|t| t.sla_first_response).collect();
        assert_eq!(
            outcomes,
            vec![SlaOutcome::Within, SlaOutcome::Breached, SlaOutcome::Breached]
        );
        assert_eq!(table.tickets[0].assignee.as_deref(), Some("Adriel"));
        assert_eq!(table.tickets[1].assignee, None);
        assert_eq!(table.tickets[2].created_at, None);
    }

    #[test]
    fn missing_sla_column_uses_fallback_and_flags_it() {
        let csv = "created,responsavel\n2024-01-01,Adriel\n2024-01-02,Guilherme\n";
        let mut fallback = SyntheticSla::with_rate(9, 1.0);
        let table = read_tickets(
            csv.as_bytes(),
            "suporte.csv",
            &DashboardConfig::default(),
            &mut fallback,
        )
        .unwrap();
        assert!(table.sla_is_synthetic);
        assert!(table
            .tickets
            .iter()
            .all(|t| t.sla_first_response == SlaOutcome::Within));
    }

    #[test]
    fn non_synthetic_fallback_is_not_flagged() {
        let csv = "created,responsavel\n2024-01-01,Adriel\n";
        let table = read_tickets(
            csv.as_bytes(),
            "suporte.csv",
            &DashboardConfig::default(),
            &mut FixedSla,
        )
        .unwrap();
        assert!(!table.sla_is_synthetic);
        assert_eq!(table.tickets[0].sla_first_response, SlaOutcome::Breached);
    }

    #[test]
    fn missing_ticket_column_is_rejected() {
        let csv = "created,owner\n2024-01-01,Adriel\n";
        let err = read_tickets(
            csv.as_bytes(),
            "suporte.csv",
            &DashboardConfig::default(),
            &mut FixedSla,
        )
        .unwrap_err();
        assert!(matches!(err, DataLoadError::MissingColumn { .. }));
    }

    #[test]
    fn load_reads_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let admin = dir.path().join("admin.csv");
        let support = dir.path().join("suporte.csv");
        std::fs::write(&admin, ADMIN_CSV).unwrap();
        std::fs::write(&support, "created,responsavel\n2024-01-01,Adriel\n").unwrap();

        let dashboard = load(&admin, &support, &DashboardConfig::default(), &mut FixedSla).unwrap();
        assert_eq!(dashboard.accounts().len(), 4);
        assert_eq!(dashboard.tickets().len(), 1);
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let admin = dir.path().join("admin.csv");
        std::fs::write(&admin, ADMIN_CSV).unwrap();

        let err = load(
            &admin,
            &dir.path().join("missing.csv"),
            &DashboardConfig::default(),
            &mut FixedSla,
        )
        .unwrap_err();
        assert!(matches!(err, DataLoadError::Io { .. }));
    }
}
