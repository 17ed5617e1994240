use super::{Force, ForceContext};

/// Pulls the centroid toward `(x, y)` by shifting every node equally.
#[derive(Debug, Clone)]
pub struct CenterForce {
    pub x: f64,
    pub y: f64,
    pub strength: f64,
}

impl CenterForce {
    pub fn new(x: f64, y: f64, strength: f64) -> Self {
        Self { x, y, strength }
    }
}

impl Force for CenterForce {
    fn apply(&mut self, ctx: &ForceContext<'_>, out: &mut [(f64, f64)]) {
        let (mut sx, mut sy, mut n) = (0.0, 0.0, 0usize);
        for node in ctx.nodes {
            if node.x.is_finite() && node.y.is_finite() {
                sx += node.x;
                sy += node.y;
                n += 1;
            }
        }
        if n == 0 || self.strength == 0.0 {
            return;
        }
        let dx = (self.x - sx / n as f64) * self.strength;
        let dy = (self.y - sy / n as f64) * self.strength;
        for o in out.iter_mut() {
            o.0 += dx;
            o.1 += dy;
        }
    }
}
