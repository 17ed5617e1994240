use crate::state::NodeState;

/// Advances every node by one step and returns the total distance moved.
///
/// Free axes: `v = (v + d * alpha) * (1 - velocity_decay); x += v`. Pinned axes are snapped to
/// the pin with zero velocity. A non-finite result leaves the node where it was, at rest.
pub fn integrate(
    nodes: &mut [NodeState],
    displacements: &[(f64, f64)],
    alpha: f64,
    velocity_decay: f64,
) -> f64 {
    let keep = 1.0 - velocity_decay;
    let mut moved = 0.0;
    for (node, &(dx, dy)) in nodes.iter_mut().zip(displacements) {
        let (ox, oy) = (node.x, node.y);
        advance_axis(&mut node.x, &mut node.vx, node.fx, dx, alpha, keep);
        advance_axis(&mut node.y, &mut node.vy, node.fy, dy, alpha, keep);
        let step = (node.x - ox).hypot(node.y - oy);
        if step.is_finite() {
            moved += step;
        }
    }
    moved
}

fn advance_axis(pos: &mut f64, vel: &mut f64, pin: Option<f64>, d: f64, alpha: f64, keep: f64) {
    if let Some(p) = pin {
        *pos = p;
        *vel = 0.0;
        return;
    }
    let v = (*vel + d * alpha) * keep;
    let next = *pos + v;
    if v.is_finite() && next.is_finite() {
        *vel = v;
        *pos = next;
    } else {
        *vel = 0.0;
        if !pos.is_finite() {
            *pos = 0.0;
        }
    }
}

/// Moves alpha toward `target` by `decay`; with a zero target this is `alpha * (1 - decay)`.
pub fn cool(alpha: f64, target: f64, decay: f64) -> f64 {
    alpha + (target - alpha) * decay
}

#[cfg(test)]
mod tests {
    use super::{cool, integrate};
    use crate::graph::Category;
    use crate::state::NodeState;

    fn node(x: f64, y: f64) -> NodeState {
        NodeState {
            id: "n".to_string(),
            label: String::new(),
            category: Category::Table,
            steward: None,
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            fx: None,
            fy: None,
            radius: 0.0,
        }
    }

    #[test]
    fn free_node_moves_by_scaled_decayed_displacement() {
        let mut nodes = vec![node(0.0, 0.0)];
        let moved = integrate(&mut nodes, &[(10.0, 0.0)], 0.5, 0.4);
        assert!((nodes[0].vx - 3.0).abs() < 1e-12);
        assert!((nodes[0].x - 3.0).abs() < 1e-12);
        assert!((moved - 3.0).abs() < 1e-12);
    }

    #[test]
    fn pinned_axis_snaps_and_loses_velocity() {
        let mut n = node(1.0, 1.0);
        n.vx = 5.0;
        n.vy = 5.0;
        n.fx = Some(20.0);
        let mut nodes = vec![n];
        integrate(&mut nodes, &[(100.0, 0.0)], 1.0, 0.4);
        assert_eq!(nodes[0].x, 20.0);
        assert_eq!(nodes[0].vx, 0.0);
        assert!((nodes[0].vy - 3.0).abs() < 1e-12);
    }

    #[test]
    fn non_finite_displacement_is_discarded() {
        let mut nodes = vec![node(4.0, 4.0)];
        integrate(&mut nodes, &[(f64::NAN, f64::INFINITY)], 1.0, 0.4);
        assert_eq!((nodes[0].x, nodes[0].y), (4.0, 4.0));
        assert_eq!((nodes[0].vx, nodes[0].vy), (0.0, 0.0));
    }

    #[test]
    fn cool_with_zero_target_is_geometric() {
        assert!((cool(1.0, 0.0, 0.25) - 0.75).abs() < 1e-12);
        assert!((cool(0.1, 0.3, 0.5) - 0.2).abs() < 1e-12);
    }
}
