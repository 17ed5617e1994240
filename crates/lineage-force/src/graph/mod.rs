use crate::error::{GraphValidationError, Result};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Initial snapshot of a lineage graph handed to [`crate::Simulation::new`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Graph {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl Graph {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    pub fn validate(&self) -> Result<()> {
        self.node_index()?;
        Ok(())
    }

    /// Maps node ids to their position in `nodes`, checking ids and edge endpoints on the way.
    pub(crate) fn node_index(
        &self,
    ) -> std::result::Result<FxHashMap<&str, usize>, GraphValidationError> {
        let mut index: FxHashMap<&str, usize> = FxHashMap::default();
        index.reserve(self.nodes.len());
        for (i, n) in self.nodes.iter().enumerate() {
            if n.id.is_empty() {
                return Err(GraphValidationError::EmptyNodeId { index: i });
            }
            if index.insert(n.id.as_str(), i).is_some() {
                return Err(GraphValidationError::DuplicateNodeId {
                    node_id: n.id.clone(),
                });
            }
        }
        for (edge_index, e) in self.edges.iter().enumerate() {
            for id in [&e.source, &e.target] {
                if !index.contains_key(id.as_str()) {
                    return Err(GraphValidationError::MissingNode {
                        edge_index,
                        node_id: id.clone(),
                    });
                }
            }
        }
        Ok(index)
    }
}

/// Kind of lineage entity a node stands for. Extend by adding variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    #[default]
    Table,
    System,
    Pipeline,
    Report,
    Dashboard,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Table => "table",
            Category::System => "system",
            Category::Pipeline => "pipeline",
            Category::Report => "report",
            Category::Dashboard => "dashboard",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationKind {
    #[default]
    FlowsTo,
    ProcessedBy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    #[serde(default, alias = "name")]
    pub label: String,
    #[serde(default, alias = "type")]
    pub category: Category,
    /// Data steward responsible for the asset, passed through to render snapshots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steward: Option<String>,
    /// Optional initial position. Missing coordinates are placed on a spiral around the center.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vx: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vy: Option<f64>,
    /// Pinned coordinates; each axis is held independently.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fx: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
}

impl Node {
    pub fn new(id: impl Into<String>, label: impl Into<String>, category: Category) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            category,
            steward: None,
            x: None,
            y: None,
            vx: None,
            vy: None,
            fx: None,
            fy: None,
            radius: None,
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    pub fn pinned(mut self, x: f64, y: f64) -> Self {
        self.fx = Some(x);
        self.fy = Some(y);
        self
    }

    pub fn with_steward(mut self, steward: impl Into<String>) -> Self {
        self.steward = Some(steward.into());
        self
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = Some(radius);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub source: String,
    pub target: String,
    #[serde(default, alias = "type")]
    pub kind: RelationKind,
    /// Rest length for the link force; falls back to `linkDistance`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>, kind: RelationKind) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind,
            distance: None,
        }
    }

    pub fn with_distance(mut self, distance: f64) -> Self {
        self.distance = Some(distance);
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LayoutResult {
    pub positions: std::collections::BTreeMap<String, Point>,
    pub ticks: u64,
    pub alpha: f64,
}
