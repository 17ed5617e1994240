//! Force modules composed additively by the simulation.
//!
//! Every force adds its contribution to a shared displacement buffer (one `(dx, dy)` per node).
//! The integrator scales the sum by alpha before it reaches the velocities.

mod center;
mod charge;
mod collide;
mod link;

pub use center::CenterForce;
pub use charge::ChargeForce;
pub use collide::CollideForce;
pub use link::{Link, LinkForce};

use crate::quadtree::QuadTree;
use crate::state::NodeState;

/// Read-only view of one step's inputs.
#[derive(Debug, Clone, Copy)]
pub struct ForceContext<'a> {
    pub nodes: &'a [NodeState],
    pub links: &'a [Link],
    /// Built from `nodes` in the same order; empty unless some force asked for it.
    pub tree: &'a QuadTree,
}

pub trait Force {
    fn apply(&mut self, ctx: &ForceContext<'_>, out: &mut [(f64, f64)]);

    fn uses_spatial_index(&self) -> bool {
        false
    }
}
