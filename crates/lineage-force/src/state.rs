use crate::config::SimulationConfig;
use crate::graph::{Category, Node, Point};
use serde::Serialize;

/// Live record for one node, owned by the simulation and handed to observers after each tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeState {
    pub id: String,
    pub label: String,
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steward: Option<String>,
    pub x: f64,
    pub y: f64,
    #[serde(skip)]
    pub vx: f64,
    #[serde(skip)]
    pub vy: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fx: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fy: Option<f64>,
    #[serde(skip)]
    pub radius: f64,
}

const INITIAL_RADIUS: f64 = 10.0;

/// Deterministic spiral offset for the `index`-th node (golden-angle phyllotaxis).
pub(crate) fn phyllotaxis(index: usize, scale: f64) -> (f64, f64) {
    let initial_angle = std::f64::consts::PI * (3.0 - 5.0f64.sqrt());
    let r = scale * (0.5 + index as f64).sqrt();
    let angle = index as f64 * initial_angle;
    (r * angle.cos(), r * angle.sin())
}

impl NodeState {
    pub(crate) fn from_node(node: &Node, index: usize, cfg: &SimulationConfig) -> Self {
        let (sx, sy) = phyllotaxis(index, INITIAL_RADIUS);
        let finite = |v: Option<f64>| v.filter(|v| v.is_finite());
        let fx = finite(node.fx);
        let fy = finite(node.fy);
        Self {
            id: node.id.clone(),
            label: node.label.clone(),
            category: node.category,
            steward: node.steward.clone(),
            x: finite(node.x).or(fx).unwrap_or(cfg.center.x + sx),
            y: finite(node.y).or(fy).unwrap_or(cfg.center.y + sy),
            vx: finite(node.vx).unwrap_or(0.0),
            vy: finite(node.vy).unwrap_or(0.0),
            fx,
            fy,
            radius: node
                .radius
                .filter(|r| r.is_finite() && *r >= 0.0)
                .unwrap_or(cfg.node_radius),
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn is_pinned(&self) -> bool {
        self.fx.is_some() || self.fy.is_some()
    }
}
