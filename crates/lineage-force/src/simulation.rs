//! Simulation controller: owns node/link state, the force registry and the run state.

use crate::config::SimulationConfig;
use crate::error::{Error, Result};
use crate::force::{CenterForce, ChargeForce, CollideForce, Force, ForceContext, Link, LinkForce};
use crate::graph::{Graph, Point};
use crate::integrate::{cool, integrate};
use crate::quadtree::{QuadTree, TreePoint};
use crate::state::{NodeState, phyllotaxis};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use tracing::{debug, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Alpha fell below `alpha_min`.
    Converged,
    /// [`Simulation::stop`] was called.
    Requested,
}

/// Pushed to observers; `nodes` is the full snapshot after a completed step.
#[derive(Debug)]
pub enum SimulationEvent<'a> {
    Tick {
        step: u64,
        alpha: f64,
        nodes: &'a [NodeState],
    },
    Stopped {
        step: u64,
        alpha: f64,
        reason: StopReason,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Observer = Box<dyn FnMut(&SimulationEvent<'_>)>;

/// Host animation loop. The simulation holds a subscription only while running and releases
/// it synchronously on stop, on convergence and on drop.
pub trait FrameScheduler {
    fn subscribe(&mut self);
    fn unsubscribe(&mut self);
}

pub struct Simulation {
    config: SimulationConfig,
    nodes: Vec<NodeState>,
    links: Vec<Link>,
    index: FxHashMap<String, usize>,
    forces: IndexMap<String, Box<dyn Force>>,
    alpha: f64,
    alpha_target: f64,
    state: RunState,
    step: u64,
    displacements: Vec<(f64, f64)>,
    observers: Vec<(ObserverId, Observer)>,
    next_observer: u64,
    scheduler: Option<Box<dyn FrameScheduler>>,
    subscribed: bool,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("state", &self.state)
            .field("alpha", &self.alpha)
            .field("alpha_target", &self.alpha_target)
            .field("step", &self.step)
            .field("nodes", &self.nodes.len())
            .field("links", &self.links.len())
            .field("forces", &self.forces.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

struct BuiltGraph {
    nodes: Vec<NodeState>,
    links: Vec<Link>,
    index: FxHashMap<String, usize>,
}

fn build_graph(graph: &Graph, cfg: &SimulationConfig) -> Result<BuiltGraph> {
    let index = graph.node_index()?;
    let nodes: Vec<NodeState> = graph
        .nodes
        .iter()
        .enumerate()
        .map(|(i, n)| NodeState::from_node(n, i, cfg))
        .collect();
    let links = Link::resolve_all(&graph.edges, &index, nodes.len(), cfg);
    let index = index
        .into_iter()
        .map(|(id, i)| (id.to_string(), i))
        .collect();
    Ok(BuiltGraph {
        nodes,
        links,
        index,
    })
}

/// Fails with [`Error::DegenerateGeometry`] when two or more nodes all share one position.
pub fn check_geometry(nodes: &[NodeState]) -> Result<()> {
    let Some(first) = nodes.first() else {
        return Ok(());
    };
    if nodes.len() > 1 && nodes.iter().all(|n| n.x == first.x && n.y == first.y) {
        return Err(Error::DegenerateGeometry {
            node_count: nodes.len(),
        });
    }
    Ok(())
}

impl Simulation {
    const DEGENERATE_NUDGE: f64 = 1.0;

    pub fn new(graph: &Graph, config: SimulationConfig) -> Result<Self> {
        let config = config.sanitized();
        let BuiltGraph {
            nodes,
            links,
            index,
        } = build_graph(graph, &config)?;

        let mut forces: IndexMap<String, Box<dyn Force>> = IndexMap::new();
        forces.insert("link".to_string(), Box::new(LinkForce::new(config.seed)));
        forces.insert(
            "charge".to_string(),
            Box::new(ChargeForce::from_config(&config)),
        );
        forces.insert(
            "center".to_string(),
            Box::new(CenterForce::new(
                config.center.x,
                config.center.y,
                config.center_strength,
            )),
        );
        if let Some(strength) = config.collision_strength {
            forces.insert(
                "collide".to_string(),
                Box::new(CollideForce::new(strength, config.seed)),
            );
        }

        debug!(
            nodes = nodes.len(),
            links = links.len(),
            "lineage simulation constructed"
        );
        let n = nodes.len();
        Ok(Self {
            alpha: config.alpha,
            alpha_target: config.alpha_target,
            config,
            nodes,
            links,
            index,
            forces,
            state: RunState::Idle,
            step: 0,
            displacements: vec![(0.0, 0.0); n],
            observers: Vec::new(),
            next_observer: 0,
            scheduler: None,
            subscribed: false,
        })
    }

    pub fn with_scheduler(mut self, scheduler: Box<dyn FrameScheduler>) -> Self {
        self.set_scheduler(scheduler);
        self
    }

    /// Swaps the host frame loop, moving an active subscription over to the new one.
    pub fn set_scheduler(&mut self, scheduler: Box<dyn FrameScheduler>) {
        self.release_frames();
        self.scheduler = Some(scheduler);
        if self.state == RunState::Running {
            self.request_frames();
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn alpha_target(&self) -> f64 {
        self.alpha_target
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Completed steps since construction or the last reset.
    pub fn step_count(&self) -> u64 {
        self.step
    }

    pub fn nodes(&self) -> &[NodeState] {
        &self.nodes
    }

    pub fn node(&self, id: &str) -> Option<&NodeState> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn positions(&self) -> std::collections::BTreeMap<String, Point> {
        self.nodes
            .iter()
            .map(|n| (n.id.clone(), n.position()))
            .collect()
    }

    /// Registers (or replaces) a named force. Forces run in registration order.
    pub fn set_force(
        &mut self,
        name: impl Into<String>,
        force: Box<dyn Force>,
    ) -> Option<Box<dyn Force>> {
        self.forces.insert(name.into(), force)
    }

    pub fn remove_force(&mut self, name: &str) -> Option<Box<dyn Force>> {
        self.forces.shift_remove(name)
    }

    pub fn force_names(&self) -> impl Iterator<Item = &str> {
        self.forces.keys().map(String::as_str)
    }

    pub fn observe(&mut self, observer: impl FnMut(&SimulationEvent<'_>) + 'static) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    pub fn unobserve(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(oid, _)| *oid != id);
        self.observers.len() != before
    }

    /// `idle`/`stopped` → `running`; no-op while running.
    pub fn start(&mut self) {
        if self.state == RunState::Running {
            return;
        }
        self.nudge_degenerate();
        debug!(from = ?self.state, alpha = self.alpha, "simulation running");
        self.state = RunState::Running;
        self.request_frames();
    }

    /// `running` → `stopped`. Later ticks do nothing until reheated.
    pub fn stop(&mut self) {
        if self.state != RunState::Running {
            return;
        }
        self.halt(StopReason::Requested);
    }

    /// Raises alpha to at least `target` (never above 1) and resumes stepping.
    pub fn reheat(&mut self, target: f64) {
        if target.is_finite() {
            self.alpha = self.alpha.max(target).min(1.0);
        }
        debug!(target, alpha = self.alpha, "reheat");
        self.start();
    }

    pub fn set_alpha_target(&mut self, target: f64) {
        if target.is_finite() {
            self.alpha_target = target.clamp(0.0, 1.0);
        }
    }

    /// Holds `id` at `(x, y)` from the next step on.
    pub fn pin(&mut self, id: &str, x: f64, y: f64) -> Result<()> {
        let Some(&i) = self.index.get(id) else {
            warn!(node_id = id, "pin ignored: unknown node");
            return Err(Error::UnknownNode {
                node_id: id.to_string(),
            });
        };
        if !(x.is_finite() && y.is_finite()) {
            warn!(node_id = id, x, y, "pin ignored: non-finite coordinates");
            return Ok(());
        }
        let node = &mut self.nodes[i];
        node.fx = Some(x);
        node.fy = Some(y);
        Ok(())
    }

    /// Releases `id` and gently reheats so the rest of the graph can adjust.
    pub fn unpin(&mut self, id: &str) -> Result<()> {
        let Some(&i) = self.index.get(id) else {
            warn!(node_id = id, "unpin ignored: unknown node");
            return Err(Error::UnknownNode {
                node_id: id.to_string(),
            });
        };
        let node = &mut self.nodes[i];
        node.fx = None;
        node.fy = None;
        self.reheat(self.config.unpin_reheat);
        Ok(())
    }

    /// Runs one step if running. Returns whether a step was taken.
    pub fn tick(&mut self) -> bool {
        if self.state != RunState::Running {
            return false;
        }

        self.displacements.clear();
        self.displacements.resize(self.nodes.len(), (0.0, 0.0));
        let tree = if self.forces.values().any(|f| f.uses_spatial_index()) {
            let points: Vec<TreePoint> = self
                .nodes
                .iter()
                .map(|n| TreePoint {
                    x: n.x,
                    y: n.y,
                    radius: n.radius,
                })
                .collect();
            QuadTree::build(&points)
        } else {
            QuadTree::default()
        };

        let ctx = ForceContext {
            nodes: &self.nodes,
            links: &self.links,
            tree: &tree,
        };
        for force in self.forces.values_mut() {
            force.apply(&ctx, &mut self.displacements);
        }

        let moved = integrate(
            &mut self.nodes,
            &self.displacements,
            self.alpha,
            self.config.velocity_decay,
        );
        self.alpha = cool(self.alpha, self.alpha_target, self.config.alpha_decay);
        self.step += 1;
        trace!(step = self.step, alpha = self.alpha, moved, "tick");

        Self::notify(
            &mut self.observers,
            &SimulationEvent::Tick {
                step: self.step,
                alpha: self.alpha,
                nodes: &self.nodes,
            },
        );

        if self.alpha < self.config.alpha_min {
            self.halt(StopReason::Converged);
        }
        true
    }

    /// Drives up to `max_ticks` steps without a host loop, starting if idle. Returns the number
    /// of steps taken.
    pub fn run(&mut self, max_ticks: u64) -> u64 {
        if self.state == RunState::Idle {
            self.start();
        }
        let mut ticks = 0;
        while ticks < max_ticks && self.tick() {
            ticks += 1;
        }
        ticks
    }

    /// Replaces the node/edge set between steps. Surviving ids keep their position and velocity
    /// unless the new snapshot supplies one; alpha restarts from the configured value.
    pub fn replace_graph(&mut self, graph: &Graph) -> Result<()> {
        let BuiltGraph {
            mut nodes,
            links,
            index,
        } = build_graph(graph, &self.config)?;

        for (node, input) in nodes.iter_mut().zip(&graph.nodes) {
            let Some(old) = self.node(&node.id) else {
                continue;
            };
            if input.x.is_none() && input.y.is_none() && !node.is_pinned() {
                node.x = old.x;
                node.y = old.y;
                node.vx = old.vx;
                node.vy = old.vy;
            }
        }

        debug!(nodes = nodes.len(), links = links.len(), "graph replaced");
        self.displacements = vec![(0.0, 0.0); nodes.len()];
        self.nodes = nodes;
        self.links = links;
        self.index = index;
        self.alpha = self.config.alpha;
        self.step = 0;
        if self.state == RunState::Running {
            self.nudge_degenerate();
        }
        Ok(())
    }

    fn nudge_degenerate(&mut self) {
        if let Err(err) = check_geometry(&self.nodes) {
            debug!(%err, "nudging coincident nodes apart");
            for (i, node) in self.nodes.iter_mut().enumerate() {
                let (dx, dy) = phyllotaxis(i, Self::DEGENERATE_NUDGE);
                if node.fx.is_none() {
                    node.x += dx;
                }
                if node.fy.is_none() {
                    node.y += dy;
                }
            }
        }
    }

    fn halt(&mut self, reason: StopReason) {
        debug!(?reason, step = self.step, alpha = self.alpha, "simulation stopped");
        self.state = RunState::Stopped;
        self.release_frames();
        Self::notify(
            &mut self.observers,
            &SimulationEvent::Stopped {
                step: self.step,
                alpha: self.alpha,
                reason,
            },
        );
    }

    fn request_frames(&mut self) {
        if self.subscribed {
            return;
        }
        if let Some(s) = self.scheduler.as_mut() {
            s.subscribe();
            self.subscribed = true;
        }
    }

    fn release_frames(&mut self) {
        if !self.subscribed {
            return;
        }
        if let Some(s) = self.scheduler.as_mut() {
            s.unsubscribe();
        }
        self.subscribed = false;
    }

    fn notify(observers: &mut [(ObserverId, Observer)], event: &SimulationEvent<'_>) {
        for (_, observer) in observers.iter_mut() {
            observer(event);
        }
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        self.release_frames();
    }
}
