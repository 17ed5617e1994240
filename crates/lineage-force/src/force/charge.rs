use super::{Force, ForceContext};
use crate::config::SimulationConfig;
use crate::rng::XorShift64Star;

/// Many-body charge approximated with Barnes–Hut over the step's quadtree.
#[derive(Debug, Clone)]
pub struct ChargeForce {
    /// Negative repels.
    pub strength: f64,
    pub theta: f64,
    pub distance_min: f64,
    pub distance_max: Option<f64>,
    rng: XorShift64Star,
}

impl ChargeForce {
    pub fn new(strength: f64) -> Self {
        let cfg = SimulationConfig::default();
        Self {
            strength,
            theta: cfg.theta,
            distance_min: cfg.charge_distance_min,
            distance_max: cfg.charge_distance_max,
            rng: Self::rng(cfg.seed),
        }
    }

    pub fn from_config(cfg: &SimulationConfig) -> Self {
        Self {
            strength: cfg.charge_strength,
            theta: cfg.theta,
            distance_min: cfg.charge_distance_min,
            distance_max: cfg.charge_distance_max,
            rng: Self::rng(cfg.seed),
        }
    }

    fn rng(seed: u64) -> XorShift64Star {
        XorShift64Star::new(seed ^ 0xD1B5_4A32_D192_ED03)
    }
}

impl Force for ChargeForce {
    fn apply(&mut self, ctx: &ForceContext<'_>, out: &mut [(f64, f64)]) {
        if self.strength == 0.0 || ctx.tree.is_empty() {
            return;
        }
        let (strength, theta) = (self.strength, self.theta);
        let min2 = self.distance_min * self.distance_min;
        let max2 = self.distance_max.map_or(f64::INFINITY, |d| d * d);
        let rng = &mut self.rng;

        for (i, node) in ctx.nodes.iter().enumerate() {
            let (mut ax, mut ay) = (0.0, 0.0);
            ctx.tree.for_each_term(i, theta, |term| {
                let mut dx = term.x - node.x;
                let mut dy = term.y - node.y;
                let mut l = dx * dx + dy * dy;
                if l >= max2 {
                    return;
                }
                // Coincident axes get a seeded direction; the floor below bounds the push.
                if dx == 0.0 {
                    dx = rng.jiggle();
                    l += dx * dx;
                }
                if dy == 0.0 {
                    dy = rng.jiggle();
                    l += dy * dy;
                }
                if l < min2 {
                    l = (min2 * l).sqrt();
                }
                let w = strength * term.mass / l;
                ax += dx * w;
                ay += dy * w;
            });
            out[i].0 += ax;
            out[i].1 += ay;
        }
    }

    fn uses_spatial_index(&self) -> bool {
        true
    }
}
