use super::{Force, ForceContext};
use crate::config::SimulationConfig;
use crate::graph::{Edge, RelationKind};
use crate::rng::XorShift64Star;
use rustc_hash::FxHashMap;

/// An edge resolved against the node table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Link {
    pub source: usize,
    pub target: usize,
    pub kind: RelationKind,
    pub distance: f64,
    pub strength: f64,
    /// Share of the correction applied to the target; the source takes the rest.
    pub bias: f64,
}

impl Link {
    /// Resolves `edges` through `index`. Callers validate endpoints first.
    pub(crate) fn resolve_all(
        edges: &[Edge],
        index: &FxHashMap<&str, usize>,
        node_count: usize,
        cfg: &SimulationConfig,
    ) -> Vec<Link> {
        let mut degree = vec![0usize; node_count];
        let mut endpoints = Vec::with_capacity(edges.len());
        for e in edges {
            let (Some(&s), Some(&t)) = (index.get(e.source.as_str()), index.get(e.target.as_str()))
            else {
                continue;
            };
            degree[s] += 1;
            degree[t] += 1;
            endpoints.push((s, t, e));
        }

        endpoints
            .into_iter()
            .map(|(s, t, e)| {
                let (ds, dt) = (degree[s] as f64, degree[t] as f64);
                Link {
                    source: s,
                    target: t,
                    kind: e.kind,
                    distance: e
                        .distance
                        .filter(|d| d.is_finite() && *d >= 0.0)
                        .unwrap_or(cfg.link_distance),
                    strength: cfg.link_strength.unwrap_or(1.0 / ds.min(dt)),
                    bias: ds / (ds + dt),
                }
            })
            .collect()
    }
}

/// Springs pulling linked nodes toward their rest length, using velocity-predicted positions.
#[derive(Debug, Clone)]
pub struct LinkForce {
    rng: XorShift64Star,
}

impl LinkForce {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: XorShift64Star::new(seed),
        }
    }
}

impl Force for LinkForce {
    fn apply(&mut self, ctx: &ForceContext<'_>, out: &mut [(f64, f64)]) {
        for link in ctx.links {
            if link.source == link.target {
                continue;
            }
            let s = &ctx.nodes[link.source];
            let t = &ctx.nodes[link.target];
            let mut dx = t.x + t.vx - s.x - s.vx;
            let mut dy = t.y + t.vy - s.y - s.vy;
            if dx == 0.0 {
                dx = self.rng.jiggle();
            }
            if dy == 0.0 {
                dy = self.rng.jiggle();
            }
            let l = dx.hypot(dy);
            let k = (l - link.distance) / l * link.strength;
            dx *= k;
            dy *= k;
            out[link.target].0 -= dx * link.bias;
            out[link.target].1 -= dy * link.bias;
            out[link.source].0 += dx * (1.0 - link.bias);
            out[link.source].1 += dy * (1.0 - link.bias);
        }
    }
}
