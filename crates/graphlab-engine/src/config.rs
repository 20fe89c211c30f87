//! Engine configuration, loadable from TOML
//!
//! ```toml
//! [layout]
//! center_multiplier = 0.5
//! repel_multiplier = 0.5
//! spring_stiffness = 0.5
//!
//! [physics]
//! mass = 0.1
//! damping = 2.0
//! fixed_dt_ms = 20
//!
//! [replay]
//! pacing_ms = 200
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use graphlab_layout::{BodyParams, ForceParams};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub layout: ForceParams,
    pub physics: PhysicsConfig,
    pub replay: ReplayConfig,
    pub events: EventConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub mass: f32,
    pub damping: f32,
    /// Fixed simulation step.
    pub fixed_dt_ms: u64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        let body = BodyParams::default();
        PhysicsConfig {
            mass: body.mass,
            damping: body.damping,
            fixed_dt_ms: 20,
        }
    }
}

impl PhysicsConfig {
    pub fn body(&self) -> BodyParams {
        BodyParams {
            mass: self.mass,
            damping: self.damping,
        }
    }

    pub fn fixed_dt(&self) -> Duration {
        Duration::from_millis(self.fixed_dt_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Pause between two replayed commands.
    pub pacing_ms: u64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        ReplayConfig { pacing_ms: 200 }
    }
}

impl ReplayConfig {
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    /// Broadcast buffer; slow subscribers skip ahead once it overflows.
    pub capacity: usize,
}

impl Default for EventConfig {
    fn default() -> Self {
        EventConfig { capacity: 1024 }
    }
}

impl EngineConfig {
    pub fn from_toml_str(text: &str) -> EngineResult<Self> {
        let config: EngineConfig =
            toml::from_str(text).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = Self::from_toml_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        tracing::debug!("Engine config loaded from: {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.physics.mass.is_nan() || self.physics.mass <= 0.0 {
            return Err(EngineError::Config("physics.mass must be positive".into()));
        }
        if self.physics.damping < 0.0 {
            return Err(EngineError::Config("physics.damping must not be negative".into()));
        }
        if self.physics.fixed_dt_ms == 0 {
            return Err(EngineError::Config("physics.fixed_dt_ms must be positive".into()));
        }
        if self.layout.min_distance.is_nan() || self.layout.min_distance <= 0.0 {
            return Err(EngineError::Config("layout.min_distance must be positive".into()));
        }
        if self.events.capacity == 0 {
            return Err(EngineError::Config("events.capacity must be positive".into()));
        }
        Ok(())
    }
}
