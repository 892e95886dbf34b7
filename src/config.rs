//! Solver, monitor, and store configuration.
//!
//! Every component takes its configuration by value at construction, so
//! independently configured solves and monitors can run side by side.
//! All fields have defaults; JSON documents only need to name overrides.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// Longest accepted search time budget: one week.
pub const MAX_TIME_BUDGET_SECS: f64 = 7.0 * 24.0 * 3600.0;

/// Parameters of the priority-weighted CVRP solver.
///
/// # Examples
///
/// ```
/// use u_fleet::config::RoutingConfig;
///
/// let cfg = RoutingConfig::default()
///     .with_urgency_weight(2.0)
///     .with_seed(7)
///     .with_max_iterations(50);
/// assert!(cfg.validate().is_ok());
/// assert_eq!(cfg.time_budget(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Urgency weight α in km per unit of urgency.
    pub urgency_weight: f64,
    /// Per-stop decay γ of the urgency reward, in (0, 1].
    pub urgency_decay: f64,
    /// Wall-clock search budget in seconds. `None` disables the deadline.
    pub time_budget_secs: Option<f64>,
    /// Cap on guided local search rounds.
    pub max_iterations: Option<usize>,
    /// Rounds without improvement before the search is considered converged.
    pub stall_limit: usize,
    /// Guided local search λ coefficient.
    pub gls_lambda: f64,
    /// Seed for the neighborhood scan order.
    pub seed: u64,
    /// Average travel speed used for leg time estimates.
    pub average_speed_kmh: f64,
    /// Fixed service time per stop, in hours.
    pub service_time_h: f64,
    pub fuel_cost_per_km: f64,
    pub emissions_kg_per_km: f64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            urgency_weight: 1.0,
            urgency_decay: 0.5,
            time_budget_secs: Some(60.0),
            max_iterations: None,
            stall_limit: 100,
            gls_lambda: 0.1,
            seed: 42,
            average_speed_kmh: 60.0,
            service_time_h: 0.25,
            fuel_cost_per_km: 0.1,
            emissions_kg_per_km: 0.2,
        }
    }
}

impl RoutingConfig {
    /// Sets the urgency weight α.
    pub fn with_urgency_weight(mut self, alpha: f64) -> Self {
        self.urgency_weight = alpha;
        self
    }

    /// Sets the per-stop urgency decay γ.
    pub fn with_urgency_decay(mut self, decay: f64) -> Self {
        self.urgency_decay = decay;
        self
    }

    /// Sets the search time budget. `None` searches until convergence or the
    /// iteration cap.
    pub fn with_time_budget(mut self, budget: Option<Duration>) -> Self {
        self.time_budget_secs = budget.map(|d| d.as_secs_f64());
        self
    }

    /// Replaces the time budget with a deterministic round cap.
    pub fn with_max_iterations(mut self, rounds: usize) -> Self {
        self.max_iterations = Some(rounds);
        self.time_budget_secs = None;
        self
    }

    pub fn with_stall_limit(mut self, rounds: usize) -> Self {
        self.stall_limit = rounds;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_average_speed(mut self, kmh: f64) -> Self {
        self.average_speed_kmh = kmh;
        self
    }

    pub fn with_service_time(mut self, hours: f64) -> Self {
        self.service_time_h = hours;
        self
    }

    /// Time budget as a [`Duration`], if any. Values no [`Duration`] can
    /// hold count as no budget.
    pub fn time_budget(&self) -> Option<Duration> {
        self.time_budget_secs
            .and_then(|s| Duration::try_from_secs_f64(s).ok())
    }

    /// Checks every field for range errors.
    pub fn validate(&self) -> Result<(), InputError> {
        if !self.urgency_weight.is_finite() || self.urgency_weight <= 0.0 {
            return Err(invalid(format!(
                "urgency_weight must be finite and > 0, got {}",
                self.urgency_weight
            )));
        }
        if !(self.urgency_decay > 0.0 && self.urgency_decay <= 1.0) {
            return Err(invalid(format!(
                "urgency_decay must be in (0, 1], got {}",
                self.urgency_decay
            )));
        }
        if let Some(secs) = self.time_budget_secs {
            if !(0.0..=MAX_TIME_BUDGET_SECS).contains(&secs) {
                return Err(invalid(format!(
                    "time_budget_secs must be in [0, {MAX_TIME_BUDGET_SECS}], got {secs}"
                )));
            }
        }
        if self.stall_limit == 0 {
            return Err(invalid("stall_limit must be at least 1".to_string()));
        }
        if !self.gls_lambda.is_finite() || self.gls_lambda < 0.0 {
            return Err(invalid(format!("gls_lambda must be >= 0, got {}", self.gls_lambda)));
        }
        if !self.average_speed_kmh.is_finite() || self.average_speed_kmh <= 0.0 {
            return Err(invalid(format!(
                "average_speed_kmh must be > 0, got {}",
                self.average_speed_kmh
            )));
        }
        for (name, value) in [
            ("service_time_h", self.service_time_h),
            ("fuel_cost_per_km", self.fuel_cost_per_km),
            ("emissions_kg_per_km", self.emissions_kg_per_km),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(format!("{name} must be >= 0, got {value}")));
            }
        }
        Ok(())
    }
}

/// Parameters of the live tracking monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Off-route distance above which a deviation is reported, in metres.
    pub deviation_threshold_m: f64,
    /// Distance at which the next waypoint counts as reached, in metres.
    pub arrival_radius_m: f64,
    /// Timeout for one distance provider call, in milliseconds.
    pub provider_timeout_ms: u64,
    /// First backoff interval after a provider failure, in milliseconds.
    pub backoff_base_ms: u64,
    /// Upper bound of the provider backoff, in milliseconds.
    pub backoff_max_ms: u64,
    /// Events buffered per vehicle before slow subscribers start losing
    /// the oldest ones.
    pub subscriber_buffer: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            deviation_threshold_m: 1_000.0,
            arrival_radius_m: 50.0,
            provider_timeout_ms: 3_000,
            backoff_base_ms: 1_000,
            backoff_max_ms: 60_000,
            subscriber_buffer: 64,
        }
    }
}

impl MonitorConfig {
    pub fn with_deviation_threshold(mut self, metres: f64) -> Self {
        self.deviation_threshold_m = metres;
        self
    }

    pub fn with_arrival_radius(mut self, metres: f64) -> Self {
        self.arrival_radius_m = metres;
        self
    }

    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_backoff(mut self, base: Duration, max: Duration) -> Self {
        self.backoff_base_ms = base.as_millis() as u64;
        self.backoff_max_ms = max.as_millis() as u64;
        self
    }

    pub fn with_subscriber_buffer(mut self, events: usize) -> Self {
        self.subscriber_buffer = events;
        self
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn backoff_max(&self) -> Duration {
        Duration::from_millis(self.backoff_max_ms)
    }

    pub fn validate(&self) -> Result<(), InputError> {
        if !self.deviation_threshold_m.is_finite() || self.deviation_threshold_m <= 0.0 {
            return Err(invalid(format!(
                "deviation_threshold_m must be > 0, got {}",
                self.deviation_threshold_m
            )));
        }
        if !self.arrival_radius_m.is_finite()
            || self.arrival_radius_m < 0.0
            || self.arrival_radius_m > self.deviation_threshold_m
        {
            return Err(invalid(format!(
                "arrival_radius_m must be in [0, deviation_threshold_m], got {}",
                self.arrival_radius_m
            )));
        }
        if self.provider_timeout_ms == 0 {
            return Err(invalid("provider_timeout_ms must be > 0".to_string()));
        }
        if self.backoff_base_ms > self.backoff_max_ms {
            return Err(invalid(format!(
                "backoff_base_ms ({}) exceeds backoff_max_ms ({})",
                self.backoff_base_ms, self.backoff_max_ms
            )));
        }
        if self.subscriber_buffer == 0 {
            return Err(invalid("subscriber_buffer must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Retry policy for plan persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Total persistence attempts per save, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry, in milliseconds. Doubles per retry.
    pub retry_base_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_base_ms: 100,
        }
    }
}

impl StoreConfig {
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn with_retry_base(mut self, delay: Duration) -> Self {
        self.retry_base_ms = delay.as_millis() as u64;
        self
    }

    /// Delay before retry number `retry` (1-based).
    pub fn retry_delay(&self, retry: u32) -> Duration {
        let factor = 1u64 << retry.saturating_sub(1).min(16);
        Duration::from_millis(self.retry_base_ms.saturating_mul(factor))
    }

    pub fn validate(&self) -> Result<(), InputError> {
        if self.max_attempts == 0 {
            return Err(invalid("max_attempts must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// All configuration sections, as loaded from a JSON document.
///
/// # Examples
///
/// ```
/// use u_fleet::config::FleetConfig;
///
/// let cfg = FleetConfig::from_json_str(r#"{ "routing": { "urgency_weight": 3.0 } }"#).unwrap();
/// assert_eq!(cfg.routing.urgency_weight, 3.0);
/// assert_eq!(cfg.monitor.deviation_threshold_m, 1000.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    pub routing: RoutingConfig,
    pub monitor: MonitorConfig,
    pub store: StoreConfig,
}

impl FleetConfig {
    /// Parses and validates a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, InputError> {
        let cfg: Self =
            serde_json::from_str(json).map_err(|e| invalid(format!("malformed config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reads, parses, and validates a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, InputError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| invalid(format!("cannot read {}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), InputError> {
        self.routing.validate()?;
        self.monitor.validate()?;
        self.store.validate()
    }
}

fn invalid(msg: String) -> InputError {
    InputError::InvalidConfig(msg)
}
