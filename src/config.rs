use std::path::Path;

use serde::Deserialize;

use crate::error::{DataLoadError, LoadResult};

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct AdminColumns {
    pub name: String,
    pub registered_at: String,
    pub last_message_at: String,
}

impl Default for AdminColumns {
    fn default() -> Self {
        Self {
            name: "Nome".to_string(),
            registered_at: "Cadastro".to_string(),
            last_message_at: "Data_Última_Msg".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SupportColumns {
    pub created_at: String,
    pub assignee: String,
    /// Optional in the source file; a synthetic SLA source fills in when absent.
    pub sla_first_response: String,
}

impl Default for SupportColumns {
    fn default() -> Self {
        Self {
            created_at: "created".to_string(),
            assignee: "responsavel".to_string(),
            sla_first_response: "SLA_First_Resp".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    pub admin_columns: AdminColumns,
    pub support_columns: SupportColumns,
    pub sla_within_labels: Vec<String>,
    pub focus_agents: Vec<String>,
    pub sla_seed: Option<u64>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            admin_columns: AdminColumns::default(),
            support_columns: SupportColumns::default(),
            sla_within_labels: vec!["Dentro".to_string(), "Within".to_string()],
            focus_agents: vec![
                "Adriel".to_string(),
                "Isabella".to_string(),
                "Guilherme".to_string(),
            ],
            sla_seed: None,
        }
    }
}

impl DashboardConfig {
    pub fn from_json_str(raw: &str, path: &Path) -> LoadResult<Self> {
        serde_json::from_str(raw).map_err(|source| DataLoadError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> LoadResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| DataLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw, path)
    }

    pub fn is_within_label(&self, value: &str) -> bool {
        let value = value.trim();
        self.sla_within_labels
            .iter()
            .any(|label| label.eq_ignore_ascii_case(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let raw = r#"{ "focus_agents": ["Marta"], "support_columns": { "assignee": "owner" } }"#;
        let config = DashboardConfig::from_json_str(raw, Path::new("inline.json")).unwrap();
        assert_eq!(config.focus_agents, vec!["Marta".to_string()]);
        assert_eq!(config.support_columns.assignee, "owner");
        assert_eq!(config.support_columns.created_at, "created");
        assert_eq!(config.admin_columns, AdminColumns::default());
        assert_eq!(config.sla_seed, None);
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let err = DashboardConfig::from_json_str("{ nope", Path::new("bad.json")).unwrap_err();
        assert!(matches!(err, DataLoadError::Config { .. }));
    }

    #[test]
    fn within_labels_ignore_case_and_padding() {
        let config = DashboardConfig::default();
        assert!(config.is_within_label(" dentro "));
        assert!(config.is_within_label("WITHIN"));
        assert!(!config.is_within_label("Fora"));
        assert!(!config.is_within_label(""));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DashboardConfig::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, DataLoadError::Io { .. }));
    }
}
