use std::time::Duration;

use keystone_engine::UnhandledTaskPolicy;

/// Worker configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    /// Delay between two drains of the queue (default: 1000 ms).
    pub poll_interval: Duration,
    pub unhandled_task_policy: UnhandledTaskPolicy,
}

impl WorkerConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                   | Default   |
    /// |---------------------------|-----------|
    /// | `DATABASE_URL`            | required  |
    /// | `WORKER_POLL_INTERVAL_MS` | `1000`    |
    /// | `UNHANDLED_TASK_POLICY`   | `ignore`  |
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url =
            lookup("DATABASE_URL").ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?;

        let poll_interval_ms: u64 = match lookup("WORKER_POLL_INTERVAL_MS") {
            Some(raw) => raw.trim().parse().map_err(|e| {
                anyhow::anyhow!("WORKER_POLL_INTERVAL_MS must be a valid u64: {e}")
            })?,
            None => 1000,
        };
        if poll_interval_ms == 0 {
            anyhow::bail!("WORKER_POLL_INTERVAL_MS must be greater than zero");
        }

        let unhandled_task_policy = match lookup("UNHANDLED_TASK_POLICY") {
            Some(raw) => raw.parse().map_err(|e: String| anyhow::anyhow!(e))?,
            None => UnhandledTaskPolicy::default(),
        };

        Ok(Self {
            database_url,
            poll_interval: Duration::from_millis(poll_interval_ms),
            unhandled_task_policy,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<WorkerConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        WorkerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_database_url_is_set() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/keystone")]).unwrap();

        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.unhandled_task_policy, UnhandledTaskPolicy::Ignore);
    }

    #[test]
    fn overrides_are_parsed() {
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/keystone"),
            ("WORKER_POLL_INTERVAL_MS", "250"),
            ("UNHANDLED_TASK_POLICY", "report"),
        ])
        .unwrap();

        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.unhandled_task_policy, UnhandledTaskPolicy::Report);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(load(&[]).is_err());
        assert!(load(&[("DATABASE_URL", "x"), ("WORKER_POLL_INTERVAL_MS", "0")]).is_err());
        assert!(load(&[("DATABASE_URL", "x"), ("UNHANDLED_TASK_POLICY", "drop")]).is_err());
    }
}
