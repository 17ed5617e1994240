use super::{Force, ForceContext};
use crate::rng::XorShift64Star;

/// Partial overlap resolution between node circles.
///
/// Each step moves overlapping pairs apart by `strength` times the overlap, split by the
/// squared radii so the smaller node gives way. Candidates come from a quadtree range query.
#[derive(Debug, Clone)]
pub struct CollideForce {
    pub strength: f64,
    rng: XorShift64Star,
}

impl CollideForce {
    pub fn new(strength: f64, seed: u64) -> Self {
        Self {
            strength,
            rng: XorShift64Star::new(seed ^ 0x9E37_79B9_7F4A_7C15),
        }
    }
}

impl Force for CollideForce {
    fn apply(&mut self, ctx: &ForceContext<'_>, out: &mut [(f64, f64)]) {
        if self.strength == 0.0 || ctx.tree.is_empty() {
            return;
        }
        let max_radius = ctx.tree.max_radius();
        let max_speed = ctx
            .nodes
            .iter()
            .map(|n| n.vx.hypot(n.vy))
            .filter(|v| v.is_finite())
            .fold(0.0f64, f64::max);

        for (i, a) in ctx.nodes.iter().enumerate() {
            let reach = a.radius + max_radius + 2.0 * max_speed;
            for j in ctx.tree.within(a.x, a.y, reach) {
                if j <= i {
                    continue;
                }
                let b = &ctx.nodes[j];
                let r = a.radius + b.radius;
                if r <= 0.0 {
                    continue;
                }
                let mut dx = (a.x + a.vx) - (b.x + b.vx);
                let mut dy = (a.y + a.vy) - (b.y + b.vy);
                let mut l2 = dx * dx + dy * dy;
                if l2 >= r * r {
                    continue;
                }
                if dx == 0.0 {
                    dx = self.rng.jiggle();
                    l2 += dx * dx;
                }
                if dy == 0.0 {
                    dy = self.rng.jiggle();
                    l2 += dy * dy;
                }
                let l = l2.sqrt();
                let k = (r - l) / l * self.strength;
                dx *= k;
                dy *= k;

                let (ra2, rb2) = (a.radius * a.radius, b.radius * b.radius);
                let share = if ra2 + rb2 > 0.0 {
                    rb2 / (ra2 + rb2)
                } else {
                    0.5
                };
                out[i].0 += dx * share;
                out[i].1 += dy * share;
                out[j].0 -= dx * (1.0 - share);
                out[j].1 -= dy * (1.0 - share);
            }
        }
    }

    fn uses_spatial_index(&self) -> bool {
        true
    }
}
