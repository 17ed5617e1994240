use crate::error::Result;
use crate::graph::Point;
use serde::{Deserialize, Serialize};

/// Tuning knobs for [`crate::Simulation`].
///
/// Deserialization ignores unknown keys and fills missing ones from [`Default`]; out-of-range
/// values are repaired by [`SimulationConfig::sanitized`] instead of being rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulationConfig {
    /// Starting alpha.
    pub alpha: f64,
    pub alpha_min: f64,
    pub alpha_decay: f64,
    /// Value alpha relaxes toward each step; held above zero while a drag is in progress.
    pub alpha_target: f64,
    pub velocity_decay: f64,

    /// Negative values repel, positive values attract.
    pub charge_strength: f64,
    pub charge_distance_min: f64,
    pub charge_distance_max: Option<f64>,
    /// Barnes–Hut opening criterion.
    pub theta: f64,

    pub link_distance: f64,
    /// Fixed spring strength; `None` uses `1 / min(degree(source), degree(target))`.
    pub link_strength: Option<f64>,

    pub center: Point,
    pub center_strength: f64,

    /// Enables the collision force when set.
    pub collision_strength: Option<f64>,
    pub node_radius: f64,

    pub drag_reheat: f64,
    pub unpin_reheat: f64,

    /// Seed for the jiggle applied to zero-length link and collision vectors.
    pub seed: u64,
}

impl SimulationConfig {
    pub const DEFAULT_ALPHA_MIN: f64 = 0.001;
    /// Number of ticks a cold start takes to cool from 1.0 to `alpha_min`.
    pub const DEFAULT_COOLING_TICKS: f64 = 300.0;
    pub const DEFAULT_NODE_RADIUS: f64 = 30.0;

    pub fn from_json(text: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(text)?;
        Ok(cfg.sanitized())
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let cfg: Self = serde_json::from_value(value)?;
        Ok(cfg.sanitized())
    }

    /// Replaces non-finite values with defaults and clamps rates into their valid ranges.
    pub fn sanitized(self) -> Self {
        let d = Self::default();
        let finite_or = |v: f64, fallback: f64| if v.is_finite() { v } else { fallback };
        Self {
            alpha: finite_or(self.alpha, d.alpha).clamp(0.0, 1.0),
            alpha_min: finite_or(self.alpha_min, d.alpha_min).clamp(0.0, 1.0),
            alpha_decay: finite_or(self.alpha_decay, d.alpha_decay).clamp(0.0, 1.0),
            alpha_target: finite_or(self.alpha_target, d.alpha_target).clamp(0.0, 1.0),
            velocity_decay: finite_or(self.velocity_decay, d.velocity_decay).clamp(0.0, 1.0),
            charge_strength: finite_or(self.charge_strength, d.charge_strength),
            charge_distance_min: finite_or(self.charge_distance_min, d.charge_distance_min)
                .max(f64::EPSILON),
            charge_distance_max: self
                .charge_distance_max
                .filter(|v| v.is_finite() && *v > 0.0),
            theta: finite_or(self.theta, d.theta).max(0.0),
            link_distance: finite_or(self.link_distance, d.link_distance).max(0.0),
            link_strength: self.link_strength.filter(|v| v.is_finite() && *v >= 0.0),
            center: Point {
                x: finite_or(self.center.x, d.center.x),
                y: finite_or(self.center.y, d.center.y),
            },
            center_strength: finite_or(self.center_strength, d.center_strength).max(0.0),
            collision_strength: self
                .collision_strength
                .filter(|v| v.is_finite())
                .map(|v| v.clamp(0.0, 1.0)),
            node_radius: Some(self.node_radius)
                .filter(|v| v.is_finite() && *v >= 0.0)
                .unwrap_or(d.node_radius),
            drag_reheat: finite_or(self.drag_reheat, d.drag_reheat).clamp(0.0, 1.0),
            unpin_reheat: finite_or(self.unpin_reheat, d.unpin_reheat).clamp(0.0, 1.0),
            seed: self.seed,
        }
    }

    /// Upper bound on the ticks needed to cool from `alpha` to `alpha_min` with a zero target.
    pub fn cooling_ticks(&self) -> u64 {
        if self.alpha <= self.alpha_min || self.alpha_min <= 0.0 {
            return 0;
        }
        if self.alpha_decay <= 0.0 {
            return u64::MAX;
        }
        if self.alpha_decay >= 1.0 {
            return 1;
        }
        // `1 - decay` rounds to 1.0 for decays below f64 epsilon; such a config never cools.
        let denom = (1.0 - self.alpha_decay).ln();
        let ticks = (self.alpha_min / self.alpha).ln() / denom;
        if denom == 0.0 || !ticks.is_finite() {
            return u64::MAX;
        }
        (ticks.ceil() as u64).saturating_add(1)
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            alpha_min: Self::DEFAULT_ALPHA_MIN,
            alpha_decay: 1.0 - Self::DEFAULT_ALPHA_MIN.powf(1.0 / Self::DEFAULT_COOLING_TICKS),
            alpha_target: 0.0,
            velocity_decay: 0.4,
            charge_strength: -1000.0,
            charge_distance_min: 1.0,
            charge_distance_max: None,
            theta: 0.9,
            link_distance: 100.0,
            link_strength: None,
            center: Point::default(),
            center_strength: 0.1,
            collision_strength: None,
            node_radius: Self::DEFAULT_NODE_RADIUS,
            drag_reheat: 0.3,
            unpin_reheat: 0.1,
            seed: 1,
        }
    }
}
