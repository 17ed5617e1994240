//! Barnes–Hut quadtree over node positions.
//!
//! Cells live in a flat arena; children are always allocated after their parent, so a single
//! reverse sweep over the arena aggregates masses bottom-up.

/// Position and radius of one indexed point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreePoint {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

impl TreePoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, radius: 0.0 }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// One aggregate contribution returned by [`QuadTree::query`]: `mass` points located at `(x, y)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassTerm {
    pub mass: f64,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone)]
enum CellKind {
    Empty,
    /// Points sharing one position (or sitting below `MAX_DEPTH`).
    Leaf(Vec<usize>),
    Branch([usize; 4]),
}

#[derive(Debug, Clone)]
struct Cell {
    x0: f64,
    y0: f64,
    size: f64,
    kind: CellKind,
    mass: f64,
    cx: f64,
    cy: f64,
    max_radius: f64,
}

impl Cell {
    fn new(x0: f64, y0: f64, size: f64) -> Self {
        Self {
            x0,
            y0,
            size,
            kind: CellKind::Empty,
            mass: 0.0,
            cx: 0.0,
            cy: 0.0,
            max_radius: 0.0,
        }
    }

    fn quadrant(&self, x: f64, y: f64) -> usize {
        let half = self.size / 2.0;
        let right = x >= self.x0 + half;
        let bottom = y >= self.y0 + half;
        ((bottom as usize) << 1) | (right as usize)
    }

    fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x0 && x <= self.x0 + self.size && y >= self.y0 && y <= self.y0 + self.size
    }

    fn intersects_square(&self, x: f64, y: f64, r: f64) -> bool {
        x + r >= self.x0
            && x - r <= self.x0 + self.size
            && y + r >= self.y0
            && y - r <= self.y0 + self.size
    }
}

#[derive(Debug, Clone, Default)]
pub struct QuadTree {
    points: Vec<TreePoint>,
    cells: Vec<Cell>,
}

impl QuadTree {
    const MAX_DEPTH: usize = 32;
    const MIN_EXTENT: f64 = 1.0;

    /// Indexes every finite point; non-finite points are left out of the partition.
    pub fn build(points: &[TreePoint]) -> Self {
        let mut tree = Self {
            points: points.to_vec(),
            cells: Vec::new(),
        };

        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for p in points.iter().filter(|p| p.is_finite()) {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        if !(min_x.is_finite() && min_y.is_finite()) {
            return tree;
        }

        let size = (max_x - min_x).max(max_y - min_y).max(Self::MIN_EXTENT);
        tree.cells.push(Cell::new(min_x, min_y, size));
        for idx in 0..points.len() {
            if points[idx].is_finite() {
                tree.insert(idx);
            }
        }
        tree.accumulate();
        tree
    }

    pub fn is_empty(&self) -> bool {
        self.cells.first().is_none_or(|root| root.mass == 0.0)
    }

    /// Number of indexed points.
    pub fn mass(&self) -> f64 {
        self.cells.first().map_or(0.0, |root| root.mass)
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Largest radius over all indexed points.
    pub fn max_radius(&self) -> f64 {
        self.cells.first().map_or(0.0, |root| root.max_radius)
    }

    fn insert(&mut self, idx: usize) {
        enum Step {
            Fill,
            Descend(usize),
            Stack,
            Split(TreePoint),
        }

        let TreePoint { x: px, y: py, .. } = self.points[idx];
        let mut cell = 0usize;
        let mut depth = 0usize;
        loop {
            let step = match &self.cells[cell].kind {
                CellKind::Empty => Step::Fill,
                CellKind::Branch(children) => {
                    Step::Descend(children[self.cells[cell].quadrant(px, py)])
                }
                CellKind::Leaf(members) => {
                    let first = self.points[members[0]];
                    if (first.x == px && first.y == py) || depth >= Self::MAX_DEPTH {
                        Step::Stack
                    } else {
                        Step::Split(first)
                    }
                }
            };
            match step {
                Step::Fill => {
                    self.cells[cell].kind = CellKind::Leaf(vec![idx]);
                    return;
                }
                Step::Descend(child) => {
                    cell = child;
                    depth += 1;
                }
                Step::Stack => {
                    if let CellKind::Leaf(members) = &mut self.cells[cell].kind {
                        members.push(idx);
                    }
                    return;
                }
                Step::Split(first) => {
                    let taken = std::mem::replace(&mut self.cells[cell].kind, CellKind::Empty);
                    let CellKind::Leaf(members) = taken else {
                        continue;
                    };
                    let children = self.split(cell);
                    let q = self.cells[cell].quadrant(first.x, first.y);
                    self.cells[children[q]].kind = CellKind::Leaf(members);
                }
            }
        }
    }

    fn split(&mut self, cell: usize) -> [usize; 4] {
        let Cell { x0, y0, size, .. } = self.cells[cell];
        let half = size / 2.0;
        let base = self.cells.len();
        for q in 0..4 {
            let right = (q & 1) as f64;
            let bottom = (q >> 1) as f64;
            self.cells.push(Cell::new(x0 + right * half, y0 + bottom * half, half));
        }
        let children = [base, base + 1, base + 2, base + 3];
        self.cells[cell].kind = CellKind::Branch(children);
        children
    }

    fn accumulate(&mut self) {
        for c in (0..self.cells.len()).rev() {
            let (mut mass, mut sx, mut sy, mut max_radius) = (0.0, 0.0, 0.0, 0.0f64);
            match &self.cells[c].kind {
                CellKind::Empty => {}
                CellKind::Leaf(members) => {
                    for &m in members {
                        let p = self.points[m];
                        mass += 1.0;
                        sx += p.x;
                        sy += p.y;
                        max_radius = max_radius.max(p.radius);
                    }
                }
                CellKind::Branch(children) => {
                    for &child in children {
                        let ch = &self.cells[child];
                        mass += ch.mass;
                        sx += ch.cx * ch.mass;
                        sy += ch.cy * ch.mass;
                        max_radius = max_radius.max(ch.max_radius);
                    }
                }
            }
            let cell = &mut self.cells[c];
            cell.mass = mass;
            cell.max_radius = max_radius;
            if mass > 0.0 {
                cell.cx = sx / mass;
                cell.cy = sy / mass;
            }
        }
    }

    /// Mass terms approximating the field acting on point `index`.
    ///
    /// A cell that does not contain the query point is collapsed to its centroid when
    /// `size / distance < theta`; everything else is opened. The query point itself never
    /// contributes, so the term masses always sum to `mass() - 1` for an indexed point.
    pub fn query(&self, index: usize, theta: f64) -> Vec<MassTerm> {
        let mut out = Vec::new();
        self.for_each_term(index, theta, |t| out.push(t));
        out
    }

    pub fn for_each_term(&self, index: usize, theta: f64, mut f: impl FnMut(MassTerm)) {
        let Some(&q) = self.points.get(index) else {
            return;
        };
        if !q.is_finite() || self.cells.is_empty() {
            return;
        }

        let mut stack = vec![0usize];
        while let Some(c) = stack.pop() {
            let cell = &self.cells[c];
            if cell.mass == 0.0 {
                continue;
            }
            match &cell.kind {
                CellKind::Empty => {}
                CellKind::Leaf(members) => {
                    for &m in members {
                        if m == index {
                            continue;
                        }
                        let p = self.points[m];
                        f(MassTerm {
                            mass: 1.0,
                            x: p.x,
                            y: p.y,
                        });
                    }
                }
                CellKind::Branch(children) => {
                    let dist = (cell.cx - q.x).hypot(cell.cy - q.y);
                    if !cell.contains(q.x, q.y) && dist > 0.0 && cell.size < theta * dist {
                        f(MassTerm {
                            mass: cell.mass,
                            x: cell.cx,
                            y: cell.cy,
                        });
                    } else {
                        stack.extend(children.iter().rev());
                    }
                }
            }
        }
    }

    /// Indices of points within `radius` of `(x, y)`.
    pub fn within(&self, x: f64, y: f64, radius: f64) -> Vec<usize> {
        let mut out = Vec::new();
        if self.cells.is_empty() || !(x.is_finite() && y.is_finite()) {
            return out;
        }
        let r2 = radius * radius;
        let mut stack = vec![0usize];
        while let Some(c) = stack.pop() {
            let cell = &self.cells[c];
            if cell.mass == 0.0 || !cell.intersects_square(x, y, radius) {
                continue;
            }
            match &cell.kind {
                CellKind::Empty => {}
                CellKind::Leaf(members) => {
                    for &m in members {
                        let p = self.points[m];
                        let (dx, dy) = (p.x - x, p.y - y);
                        if dx * dx + dy * dy <= r2 {
                            out.push(m);
                        }
                    }
                }
                CellKind::Branch(children) => stack.extend(children.iter()),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::{QuadTree, TreePoint};

    #[test]
    fn coincident_points_share_a_single_leaf() {
        let pts = vec![TreePoint::new(3.0, 3.0); 5];
        let tree = QuadTree::build(&pts);
        assert_eq!(tree.cell_count(), 1);
        assert_eq!(tree.mass(), 5.0);
        let terms = tree.query(0, 0.9);
        assert_eq!(terms.len(), 4);
        assert!(terms.iter().all(|t| t.x == 3.0 && t.y == 3.0));
    }

    #[test]
    fn non_finite_points_are_not_indexed() {
        let pts = vec![
            TreePoint::new(0.0, 0.0),
            TreePoint::new(f64::NAN, 1.0),
            TreePoint::new(10.0, 10.0),
        ];
        let tree = QuadTree::build(&pts);
        assert_eq!(tree.mass(), 2.0);
        assert!(tree.query(1, 0.9).is_empty());
        assert_eq!(tree.query(0, 0.0).len(), 1);
    }

    #[test]
    fn max_radius_aggregates_to_root() {
        let pts = vec![
            TreePoint {
                x: 0.0,
                y: 0.0,
                radius: 4.0,
            },
            TreePoint {
                x: 50.0,
                y: 20.0,
                radius: 12.0,
            },
        ];
        assert_eq!(QuadTree::build(&pts).max_radius(), 12.0);
    }
}
