//! Configuration options shared by both chunkwise attention paths.
//!
//! The [`Config`] struct captures run-time knobs that callers can tune without
//! swapping implementations. Environment variables can override the defaults
//! through [`Config::apply_env_overrides`].

use std::env;

use candle_core::DType;

use super::errors::{MochaError, Result};

/// Default lower bound applied to the shifted exponentials of the efficient path.
pub const DEFAULT_CLAMP_FLOOR: f32 = 1e-5;

/// Environment variable overriding [`Config::clamp_floor`].
pub const ENV_CLAMP_FLOOR: &str = "MOCHA_CLAMP_FLOOR";
/// Environment variable overriding [`Config::precision`] (`inherit` or `f32`).
pub const ENV_PRECISION: &str = "MOCHA_PRECISION";

/// Dtype handling during the computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrecisionPolicy {
    /// Compute in the dtype of the inputs.
    #[default]
    Inherit,
    /// Promote inputs to `f32`, then cast the result back to the input dtype.
    ForceF32,
}

impl PrecisionPolicy {
    /// Dtype the computation runs in for inputs of `dtype`.
    pub fn compute_dtype(self, dtype: DType) -> DType {
        match self {
            PrecisionPolicy::Inherit => dtype,
            PrecisionPolicy::ForceF32 => DType::F32,
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "inherit" | "native" => Some(Self::Inherit),
            "f32" | "force_f32" | "float32" => Some(Self::ForceF32),
            _ => None,
        }
    }
}

/// Configuration driving chunkwise attention behaviour.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Minimum value of `exp(u - max(u))` in the efficient path.
    ///
    /// Keeps the moving-sum denominators away from zero. Ignored by the stable
    /// path, which never divides by a clipped value.
    pub clamp_floor: f32,
    /// Dtype policy for the intermediate tensors.
    pub precision: PrecisionPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            clamp_floor: DEFAULT_CLAMP_FLOOR,
            precision: PrecisionPolicy::Inherit,
        }
    }
}

impl Config {
    /// Defaults with `MOCHA_*` environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Replace fields with values found in `MOCHA_*` environment variables.
    ///
    /// Unparseable values are logged and skipped.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| env::var(key).ok());
    }

    /// Apply overrides from any key/value source keyed by the `MOCHA_*` names.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_CLAMP_FLOOR) {
            match raw.trim().parse::<f32>() {
                Ok(floor) => self.clamp_floor = floor,
                Err(err) => log::warn!("ignoring {ENV_CLAMP_FLOOR}={raw:?}: {err}"),
            }
        }
        if let Some(raw) = lookup(ENV_PRECISION) {
            match PrecisionPolicy::parse(&raw) {
                Some(policy) => self.precision = policy,
                None => log::warn!("ignoring {ENV_PRECISION}={raw:?}: expected `inherit` or `f32`"),
            }
        }
    }

    /// Check that the configured values are usable.
    pub fn validate(&self) -> Result<()> {
        if !self.clamp_floor.is_finite() || self.clamp_floor <= 0.0 {
            return Err(MochaError::argument(
                "clamp_floor",
                format!("must be finite and positive, got {}", self.clamp_floor),
            ));
        }
        Ok(())
    }
}
