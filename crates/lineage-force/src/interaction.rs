//! Pointer-drag boundary. Hosts forward their drag callbacks here; nothing else in the crate
//! knows about pointers.

use crate::simulation::Simulation;
use rustc_hash::FxHashSet;
use tracing::{debug, warn};

#[derive(Debug, Default)]
pub struct DragAdapter {
    active: FxHashSet<String>,
}

impl DragAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self, node_id: &str) -> bool {
        self.active.contains(node_id)
    }

    pub fn active_drags(&self) -> usize {
        self.active.len()
    }

    /// Pins the node under the pointer and keeps the simulation warm while any drag is active.
    pub fn on_drag_start(&mut self, sim: &mut Simulation, node_id: &str, x: f64, y: f64) -> bool {
        if let Err(err) = sim.pin(node_id, x, y) {
            debug!(%err, "drag start ignored");
            return false;
        }
        let heat = sim.config().drag_reheat;
        sim.set_alpha_target(heat);
        sim.reheat(heat);
        self.active.insert(node_id.to_string());
        true
    }

    pub fn on_drag_move(&mut self, sim: &mut Simulation, node_id: &str, x: f64, y: f64) -> bool {
        if !self.active.contains(node_id) {
            warn!(node_id, "drag move without a matching drag start");
            return false;
        }
        sim.pin(node_id, x, y).is_ok()
    }

    /// Releases the node; the alpha target falls back once the last drag ends.
    pub fn on_drag_end(&mut self, sim: &mut Simulation, node_id: &str) -> bool {
        if !self.active.remove(node_id) {
            warn!(node_id, "drag end without a matching drag start");
            return false;
        }
        if self.active.is_empty() {
            let target = sim.config().alpha_target;
            sim.set_alpha_target(target);
        }
        sim.unpin(node_id).is_ok()
    }
}
