#![forbid(unsafe_code)]

//! Headless, interactive force-directed layout for data-lineage graphs.
//!
//! The engine owns node and edge state ([`Simulation`]), advances it one step per host frame
//! (Barnes–Hut charge, link springs, centering, optional collision) and pushes a snapshot of
//! every node to its observers after each step. Pointer gestures come back in through
//! [`DragAdapter`], which pins dragged nodes and keeps the simulation warm.

pub mod config;
pub mod error;
pub mod force;
pub mod graph;
pub mod integrate;
pub mod interaction;
pub mod quadtree;
mod rng;
pub mod simulation;
pub mod state;

pub use config::SimulationConfig;
pub use error::{Error, GraphValidationError, Result};
pub use graph::{Category, Edge, Graph, LayoutResult, Node, Point, RelationKind};
pub use interaction::DragAdapter;
pub use quadtree::{MassTerm, QuadTree, TreePoint};
pub use simulation::{
    FrameScheduler, ObserverId, RunState, Simulation, SimulationEvent, StopReason,
};
pub use state::NodeState;

/// Upper bound for [`layout`] when the config never cools (e.g. a non-zero alpha target).
pub const MAX_HEADLESS_TICKS: u64 = 10_000;

/// Headless entry point: runs a fresh simulation until it converges and returns the positions.
pub fn layout(graph: &Graph, config: SimulationConfig) -> Result<LayoutResult> {
    let start = std::time::Instant::now();
    let mut sim = Simulation::new(graph, config)?;
    let limit = sim.config().cooling_ticks().min(MAX_HEADLESS_TICKS);
    let ticks = sim.run(limit);
    tracing::debug!(
        nodes = sim.nodes().len(),
        ticks,
        alpha = sim.alpha(),
        elapsed = ?start.elapsed(),
        "layout finished"
    );
    Ok(LayoutResult {
        positions: sim.positions(),
        ticks,
        alpha: sim.alpha(),
    })
}
