use crate::shared::infrastructure::outbox::cleanup::DEFAULT_CLEANUP_CRON;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Messages of a batch are published concurrently.
    Concurrent,
    /// Messages are published one at a time in claim order.
    Sequential,
}

impl FromStr for DeliveryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "concurrent" => Ok(DeliveryMode::Concurrent),
            "sequential" => Ok(DeliveryMode::Sequential),
            other => Err(format!("expected concurrent or sequential, got {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboxConfig {
    pub polling_interval: Duration,
    pub batch_size: usize,
    pub max_retry_attempts: u32,
    pub retry_delay: Duration,
    pub max_retry_delay: Duration,
    pub publish_timeout: Duration,
    pub cleanup_cron: String,
    pub delivery_mode: DeliveryMode,
    /// Failed cycles before a message is dead-lettered; 0 disables dead-lettering.
    pub dead_letter_after: u32,
    pub breaker_failure_threshold: u32,
    pub breaker_cooldown: Duration,
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self {
            polling_interval: Duration::from_millis(5_000),
            batch_size: 100,
            max_retry_attempts: 3,
            retry_delay: Duration::from_millis(1_000),
            max_retry_delay: Duration::from_millis(30_000),
            publish_timeout: Duration::from_millis(30_000),
            cleanup_cron: DEFAULT_CLEANUP_CRON.to_string(),
            delivery_mode: DeliveryMode::Concurrent,
            dead_letter_after: 10,
            breaker_failure_threshold: 5,
            breaker_cooldown: Duration::from_millis(30_000),
        }
    }
}

fn parse<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value,
            reason: e.to_string(),
        }),
    }
}

fn parse_positive<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + Default + Copy,
    T::Err: std::fmt::Display,
{
    let value = parse(key, raw.clone(), default)?;
    if value <= T::default() {
        return Err(ConfigError::Invalid {
            key,
            value: raw.unwrap_or_default(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}

fn parse_millis(
    key: &'static str,
    raw: Option<String>,
    default: Duration,
) -> Result<Duration, ConfigError> {
    let millis = parse_positive(key, raw, default.as_millis() as u64)?;
    Ok(Duration::from_millis(millis))
}

impl OutboxConfig {
    /// Reads every `OUTBOX_*` key through `lookup`, falling back to defaults for absent keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            polling_interval: parse_millis(
                "OUTBOX_POLLING_INTERVAL_MS",
                lookup("OUTBOX_POLLING_INTERVAL_MS"),
                defaults.polling_interval,
            )?,
            batch_size: parse_positive(
                "OUTBOX_BATCH_SIZE",
                lookup("OUTBOX_BATCH_SIZE"),
                defaults.batch_size,
            )?,
            max_retry_attempts: parse_positive(
                "OUTBOX_MAX_RETRY_ATTEMPTS",
                lookup("OUTBOX_MAX_RETRY_ATTEMPTS"),
                defaults.max_retry_attempts,
            )?,
            retry_delay: parse_millis(
                "OUTBOX_RETRY_DELAY_MS",
                lookup("OUTBOX_RETRY_DELAY_MS"),
                defaults.retry_delay,
            )?,
            max_retry_delay: parse_millis(
                "OUTBOX_MAX_RETRY_DELAY_MS",
                lookup("OUTBOX_MAX_RETRY_DELAY_MS"),
                defaults.max_retry_delay,
            )?,
            publish_timeout: parse_millis(
                "OUTBOX_PUBLISH_TIMEOUT_MS",
                lookup("OUTBOX_PUBLISH_TIMEOUT_MS"),
                defaults.publish_timeout,
            )?,
            cleanup_cron: lookup("OUTBOX_CLEANUP_CRON").unwrap_or(defaults.cleanup_cron),
            delivery_mode: parse(
                "OUTBOX_DELIVERY_MODE",
                lookup("OUTBOX_DELIVERY_MODE"),
                defaults.delivery_mode,
            )?,
            dead_letter_after: parse(
                "OUTBOX_DEAD_LETTER_AFTER",
                lookup("OUTBOX_DEAD_LETTER_AFTER"),
                defaults.dead_letter_after,
            )?,
            breaker_failure_threshold: parse_positive(
                "OUTBOX_BREAKER_FAILURE_THRESHOLD",
                lookup("OUTBOX_BREAKER_FAILURE_THRESHOLD"),
                defaults.breaker_failure_threshold,
            )?,
            breaker_cooldown: parse_millis(
                "OUTBOX_BREAKER_COOLDOWN_MS",
                lookup("OUTBOX_BREAKER_COOLDOWN_MS"),
                defaults.breaker_cooldown,
            )?,
        };
        Ok(config)
    }
}

#[cfg(test)]
mod outbox_config_tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[rstest]
    fn it_should_use_defaults_when_nothing_is_set() {
        let config = OutboxConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, OutboxConfig::default());
        assert_eq!(config.polling_interval, Duration::from_millis(5_000));
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.max_retry_attempts, 3);
        assert_eq!(config.retry_delay, Duration::from_millis(1_000));
        assert_eq!(config.cleanup_cron, "0 0 0 * * ?");
    }

    #[rstest]
    fn it_should_read_overrides() {
        let config = OutboxConfig::from_lookup(lookup_from(&[
            ("OUTBOX_POLLING_INTERVAL_MS", "250"),
            ("OUTBOX_BATCH_SIZE", "10"),
            ("OUTBOX_DELIVERY_MODE", "Sequential"),
            ("OUTBOX_DEAD_LETTER_AFTER", "0"),
            ("OUTBOX_CLEANUP_CRON", "0 30 2 * * *"),
        ]))
        .unwrap();
        assert_eq!(config.polling_interval, Duration::from_millis(250));
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.delivery_mode, DeliveryMode::Sequential);
        assert_eq!(config.dead_letter_after, 0);
        assert_eq!(config.cleanup_cron, "0 30 2 * * *");
    }

    #[rstest]
    #[case("OUTBOX_BATCH_SIZE", "0")]
    #[case("OUTBOX_BATCH_SIZE", "lots")]
    #[case("OUTBOX_MAX_RETRY_ATTEMPTS", "-1")]
    #[case("OUTBOX_POLLING_INTERVAL_MS", "0")]
    #[case("OUTBOX_DELIVERY_MODE", "parallel")]
    fn it_should_reject_invalid_values(#[case] key: &'static str, #[case] value: &str) {
        let result = OutboxConfig::from_lookup(lookup_from(&[(key, value)]));
        assert!(matches!(result, Err(ConfigError::Invalid { key: k, .. }) if k == key));
    }
}
