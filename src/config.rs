use config::ConfigError;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::signer::keystore::default_keystore_path;

#[derive(Debug, Clone)]
pub struct Config {
    pub sui_rpc_url: String,
    pub package_id: String,
    pub job_module: String,
    pub job_type_name: String,
    pub fulfill_function: String,
    pub trusted_signer_object_id: String,
    pub payment_source_object_id: String,
    pub keystore_path: PathBuf,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub gas_budget: u64,
    pub gas_object_id: Option<String>,
    pub max_concurrent_jobs: usize,
    /// Zero disables the recent-submission guard
    pub recent_submission_ttl: Duration,
    /// Status API is only served when set
    pub status_bind_address: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);

        let keystore_path = vars
            .optional("SUI_KEYSTORE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(default_keystore_path);

        Ok(Self {
            sui_rpc_url: vars.required("SUI_RPC_URL")?,
            package_id: vars.required("PACKAGE_ID")?,
            job_module: vars.or("JOB_MODULE", "logic"),
            job_type_name: vars.or("JOB_TYPE_NAME", "JobRequest"),
            fulfill_function: vars.or("FULFILL_FUNCTION", "fulfill_job_and_pay"),
            trusted_signer_object_id: vars.required("TRUSTED_SIGNER_OBJECT_ID")?,
            payment_source_object_id: vars.required("PAYMENT_SOURCE_OBJECT_ID")?,
            keystore_path,
            poll_interval: Duration::from_secs(vars.positive("POLL_INTERVAL_SECS", 10)?),
            request_timeout: Duration::from_secs(vars.positive("REQUEST_TIMEOUT_SECS", 30)?),
            gas_budget: vars.parsed("GAS_BUDGET", 10_000_000)?,
            gas_object_id: vars.optional("GAS_OBJECT_ID"),
            max_concurrent_jobs: vars.positive("MAX_CONCURRENT_JOBS", 1)?,
            recent_submission_ttl: Duration::from_secs(
                vars.parsed("RECENT_SUBMISSION_TTL_SECS", 0)?,
            ),
            status_bind_address: vars.optional("STATUS_BIND_ADDRESS"),
        })
    }
}

struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::NotFound(key.to_string()))
    }

    fn or(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn parsed<T: FromStr>(&self, key: &str, default: T) -> Result<T, ConfigError> {
        match self.optional(key) {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::Message(format!("{} has an invalid value: {:?}", key, raw))),
            None => Ok(default),
        }
    }

    fn positive<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr + PartialOrd + Default,
    {
        let value = self.parsed(key, default)?;
        if value <= T::default() {
            return Err(ConfigError::Message(format!("{} must be greater than zero", key)));
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("SUI_RPC_URL", "http://127.0.0.1:9000"),
            ("PACKAGE_ID", "0xabc"),
            ("TRUSTED_SIGNER_OBJECT_ID", "0xcap"),
            ("PAYMENT_SOURCE_OBJECT_ID", "0xvault"),
            ("SUI_KEYSTORE_PATH", "/tmp/sui.keystore"),
        ])
    }

    fn load(vars: &HashMap<&'static str, &'static str>) -> Result<Config, ConfigError> {
        Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn test_defaults_applied() {
        let config = load(&base()).unwrap();

        assert_eq!(config.job_module, "logic");
        assert_eq!(config.job_type_name, "JobRequest");
        assert_eq!(config.fulfill_function, "fulfill_job_and_pay");
        assert_eq!(config.poll_interval, Duration::from_secs(10));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.gas_budget, 10_000_000);
        assert_eq!(config.max_concurrent_jobs, 1);
        assert_eq!(config.recent_submission_ttl, Duration::ZERO);
        assert_eq!(config.gas_object_id, None);
        assert_eq!(config.status_bind_address, None);
        assert_eq!(config.keystore_path, PathBuf::from("/tmp/sui.keystore"));
    }

    #[test]
    fn test_overrides() {
        let mut vars = base();
        vars.insert("POLL_INTERVAL_SECS", "3");
        vars.insert("MAX_CONCURRENT_JOBS", "8");
        vars.insert("GAS_OBJECT_ID", "0xgas");
        vars.insert("STATUS_BIND_ADDRESS", "127.0.0.1:8080");

        let config = load(&vars).unwrap();

        assert_eq!(config.poll_interval, Duration::from_secs(3));
        assert_eq!(config.max_concurrent_jobs, 8);
        assert_eq!(config.gas_object_id.as_deref(), Some("0xgas"));
        assert_eq!(config.status_bind_address.as_deref(), Some("127.0.0.1:8080"));
    }

    #[test]
    fn test_missing_required_value() {
        let mut vars = base();
        vars.remove("PACKAGE_ID");

        match load(&vars) {
            Err(ConfigError::NotFound(key)) => assert_eq!(key, "PACKAGE_ID"),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_required_value_is_missing() {
        let mut vars = base();
        vars.insert("SUI_RPC_URL", "  ");

        assert!(matches!(load(&vars), Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_malformed_and_zero_values_rejected() {
        let mut vars = base();
        vars.insert("GAS_BUDGET", "lots");
        assert!(matches!(load(&vars), Err(ConfigError::Message(_))));

        let mut vars = base();
        vars.insert("POLL_INTERVAL_SECS", "0");
        assert!(matches!(load(&vars), Err(ConfigError::Message(_))));

        let mut vars = base();
        vars.insert("MAX_CONCURRENT_JOBS", "0");
        assert!(matches!(load(&vars), Err(ConfigError::Message(_))));
    }
}
