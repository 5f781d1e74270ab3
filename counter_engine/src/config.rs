//! Engine configuration, read from `COUNTER_*` environment variables with logged fallbacks to the defaults.
use std::env;

use chrono::Duration;
use counter_common::helpers::parse_boolean_flag;
use log::*;
use stripe_tools::StripeConfig;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/counter_store.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_SERVICE_TIME_MINUTES: i64 = 15;
// One day. Estimated waits are a multiple of this.
const MAX_SERVICE_TIME_MINUTES: i64 = 24 * 60;
const DEFAULT_EVENT_BUFFER_SIZE: usize = 25;

/// The knobs that change how the order flow behaves.
#[derive(Clone, Debug)]
pub struct FlowOptions {
    /// When true, orders are accepted without a payment reference and nothing is checked with the payment provider.
    /// A placeholder reference is recorded instead. **Never enable this at a live counter.**
    pub skip_payment_verification: bool,
    /// The time it takes to serve one order. Estimated waits are a multiple of this.
    pub service_time: Duration,
}

impl Default for FlowOptions {
    fn default() -> Self {
        Self { skip_payment_verification: false, service_time: Duration::minutes(DEFAULT_SERVICE_TIME_MINUTES) }
    }
}

impl FlowOptions {
    pub fn with_payment_verification_skipped(mut self) -> Self {
        self.skip_payment_verification = true;
        self
    }

    pub fn with_service_time(mut self, service_time: Duration) -> Self {
        self.service_time = service_time;
        self
    }
}

#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub event_buffer_size: usize,
    pub flow: FlowOptions,
    pub stripe: StripeConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            flow: FlowOptions::default(),
            stripe: StripeConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_env_or_default() -> Self {
        let database_url = env::var("COUNTER_DATABASE_URL").unwrap_or_else(|_| {
            info!("🪛️ COUNTER_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let max_connections = parse_env("COUNTER_DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS);
        let event_buffer_size = parse_env("COUNTER_EVENT_BUFFER_SIZE", DEFAULT_EVENT_BUFFER_SIZE);
        let service_time =
            service_time_from_minutes(parse_env("COUNTER_SERVICE_TIME_MINUTES", DEFAULT_SERVICE_TIME_MINUTES));
        let skip_payment_verification =
            parse_boolean_flag(env::var("COUNTER_SKIP_PAYMENT_VERIFICATION").ok(), false);
        if skip_payment_verification {
            warn!(
                "🪛️ Payment verification is DISABLED. Orders will be accepted without payment. Do not run a live \
                 counter like this."
            );
        }
        let stripe = StripeConfig::new_from_env_or_default();
        Self {
            database_url,
            max_connections,
            event_buffer_size,
            flow: FlowOptions { skip_payment_verification, service_time },
            stripe,
        }
    }
}

fn service_time_from_minutes(minutes: i64) -> Duration {
    let service_time = Some(minutes)
        .filter(|m| (1..=MAX_SERVICE_TIME_MINUTES).contains(m))
        .and_then(Duration::try_minutes);
    match service_time {
        Some(t) => t,
        None => {
            error!(
                "🪛️ COUNTER_SERVICE_TIME_MINUTES must be between 1 and {MAX_SERVICE_TIME_MINUTES}, not {minutes}. Using \
                 the default, {DEFAULT_SERVICE_TIME_MINUTES}, instead."
            );
            Duration::minutes(DEFAULT_SERVICE_TIME_MINUTES)
        },
    }
}

fn parse_env<T>(var: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            error!("🪛️ {s} is not a valid value for {var}. {e} Using the default, {default}, instead.");
            default
        }),
        Err(_) => {
            debug!("🪛️ {var} is not set. Using the default, {default}.");
            default
        },
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.event_buffer_size, 25);
        assert_eq!(config.flow.service_time, Duration::minutes(15));
        assert!(!config.flow.skip_payment_verification);
    }

    #[test]
    fn service_time_is_bounded() {
        assert_eq!(service_time_from_minutes(10), Duration::minutes(10));
        assert_eq!(service_time_from_minutes(24 * 60), Duration::hours(24));
        assert_eq!(service_time_from_minutes(0), Duration::minutes(15));
        assert_eq!(service_time_from_minutes(-5), Duration::minutes(15));
        assert_eq!(service_time_from_minutes(24 * 60 + 1), Duration::minutes(15));
        assert_eq!(service_time_from_minutes(i64::MAX / 60 + 1), Duration::minutes(15));
        assert_eq!(service_time_from_minutes(i64::MAX), Duration::minutes(15));
    }

    #[test]
    fn parse_env_falls_back() {
        env::set_var("COUNTER_TEST_PARSE_ENV_GOOD", " 42 ");
        env::set_var("COUNTER_TEST_PARSE_ENV_BAD", "forty-two");
        assert_eq!(parse_env("COUNTER_TEST_PARSE_ENV_GOOD", 7u32), 42);
        assert_eq!(parse_env("COUNTER_TEST_PARSE_ENV_BAD", 7u32), 7);
        assert_eq!(parse_env("COUNTER_TEST_PARSE_ENV_MISSING", 7u32), 7);
    }
}
