//! Operator-facing configuration.
//!
//! Loaded once per run from a YAML file; every component receives what it
//! needs from this struct rather than reading global state.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::account::Account;
use crate::error::{Error, Result};

/// Default polling interval in seconds.
const DEFAULT_INTERVAL: u64 = 300;

/// Template written by `--generate`.
pub const TEMPLATE: &str = "\
# popgrab configuration
#
# Accounts are polled in the order listed. The map key is the account's
# display name: it names the state file and the attachment subdirectory.
accounts:
  work:
    address: you@example.com
    password: \"app password\"
    host: pop.example.com
    # port: 995
    # protocol: pop3

# Where extracted attachments land: <attach_path>/<account>/<From header>/
attach_path: ./attachments

# Where per-account listing snapshots are stored.
state_path: ./state

# Seconds between polling passes (continuous mode only).
interval: 300

# true: poll forever at the configured interval. false: one pass, then exit.
continuous: false

# Cap on how many messages the first run of an account fetches.
# first_run_limit: 50
";

/// Complete configuration for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Accounts keyed by display name; polled in key order.
    pub accounts: BTreeMap<String, Account>,
    /// Base directory for extracted attachments.
    pub attach_path: PathBuf,
    /// Directory for per-account listing snapshots.
    pub state_path: PathBuf,
    /// Seconds between polling passes.
    #[serde(default = "default_interval")]
    pub interval: u64,
    /// Keep polling at the configured interval instead of exiting after one
    /// pass.
    #[serde(default)]
    pub continuous: bool,
    /// Cap on first-run backfill volume per account (unbounded if absent).
    #[serde(default)]
    pub first_run_limit: Option<usize>,
}

const fn default_interval() -> u64 {
    DEFAULT_INTERVAL
}

impl Config {
    /// Loads and validates configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, fails to parse (an
    /// unsupported protocol variant fails here), or is missing accounts.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config: Self = serde_yaml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.accounts.is_empty() {
            return Err(Error::Config("no accounts configured".to_string()));
        }
        for (name, account) in &self.accounts {
            if account.address.is_empty() || account.host.is_empty() {
                return Err(Error::Config(format!(
                    "account {name}: address and host are required"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn template_parses_and_validates() {
        let config: Config = serde_yaml::from_str(TEMPLATE).unwrap();
        config.validate().unwrap();
        assert_eq!(config.interval, 300);
        assert!(!config.continuous);
        assert!(config.first_run_limit.is_none());
        assert_eq!(config.accounts.len(), 1);
    }

    #[test]
    fn load_round_trip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TEMPLATE.as_bytes()).unwrap();

        let config = Config::load(file.path()).unwrap();
        assert!(config.accounts.contains_key("work"));
        assert_eq!(config.accounts["work"].port, 995);
    }

    #[test]
    fn missing_file_is_config_error() {
        let result = Config::load(Path::new("/nonexistent/config.yaml"));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn empty_accounts_rejected() {
        let yaml = "accounts: {}\nattach_path: ./a\nstate_path: ./s\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn interval_defaults_when_absent() {
        let yaml = concat!(
            "accounts:\n",
            "  home:\n",
            "    address: a@x.com\n",
            "    password: pw\n",
            "    host: pop.x.com\n",
            "attach_path: ./a\n",
            "state_path: ./s\n"
        );
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.interval, 300);
    }

    #[test]
    fn accounts_iterate_in_name_order() {
        let yaml = concat!(
            "accounts:\n",
            "  zeta: {address: z@x.com, password: p, host: h}\n",
            "  alpha: {address: a@x.com, password: p, host: h}\n",
            "attach_path: ./a\n",
            "state_path: ./s\n"
        );
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        let names: Vec<&str> = config.accounts.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }
}
