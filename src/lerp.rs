//! Motion subdivision for tunneling prevention.

use glam::Vec2;

/// Upper bound on sub-moves per segment. Longer moves take larger sub-moves.
pub const MAX_SUB_MOVES: usize = 4096;

/// Evenly spaced points from `from` (exclusive) to `to` (inclusive) so that no
/// sub-move exceeds `max_delta` on its dominant axis. A short move yields `[to]`.
pub fn interpolated_points(from: Vec2, to: Vec2, max_delta: f32) -> Vec<Vec2> {
    let steps = step_count(from, to, max_delta);
    if steps == 0 {
        return vec![to];
    }
    let mut points: Vec<Vec2> = (1..steps).map(|i| from.lerp(to, i as f32 / steps as f32)).collect();
    points.push(to);
    points
}

fn step_count(from: Vec2, to: Vec2, max_delta: f32) -> usize {
    if !(max_delta > 0.0) {
        return 0;
    }
    let d = (to - from).abs();
    if !d.is_finite() {
        return 0;
    }
    let dominant = d.x.max(d.y);
    if dominant > max_delta {
        ((dominant / max_delta).ceil() as usize).min(MAX_SUB_MOVES)
    } else {
        0
    }
}

/// Sub-move targets for a whole step, passing through `waypoints` in order.
pub fn interpolated_positions(current: Vec2, proposed: Vec2, waypoints: &[Vec2], max_delta: f32) -> Vec<Vec2> {
    let mut out = Vec::new();
    let mut last = current;
    for &waypoint in waypoints {
        out.extend(interpolated_points(last, waypoint, max_delta));
        last = waypoint;
    }
    out.extend(interpolated_points(last, proposed, max_delta));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_short_move_is_single_point() {
        assert_eq!(interpolated_points(Vec2::ZERO, Vec2::new(3.0, 8.0), 8.0), vec![Vec2::new(3.0, 8.0)]);
    }

    #[test]
    fn test_diagonal_move_splits_in_two() {
        let pts = interpolated_positions(Vec2::ZERO, Vec2::splat(16.0), &[], 8.0);
        assert_eq!(pts, vec![Vec2::splat(8.0), Vec2::splat(16.0)]);
    }

    #[test]
    fn test_waypoint_chains_segments() {
        let pts = interpolated_positions(Vec2::ZERO, Vec2::splat(16.0), &[Vec2::splat(9.0)], 8.0);
        assert_eq!(pts, vec![Vec2::splat(4.5), Vec2::splat(9.0), Vec2::splat(16.0)]);
    }

    #[test]
    fn test_non_positive_delta_disables_subdivision() {
        assert_eq!(interpolated_points(Vec2::ZERO, Vec2::splat(100.0), 0.0), vec![Vec2::splat(100.0)]);
    }

    #[test]
    fn test_non_finite_move_is_single_point() {
        let to = Vec2::new(f32::INFINITY, 0.0);
        assert_eq!(interpolated_points(Vec2::ZERO, to, 8.0), vec![to]);
        let pts = interpolated_points(Vec2::ZERO, Vec2::new(f32::NAN, 4.0), 8.0);
        assert_eq!(pts.len(), 1);
        assert!(pts[0].x.is_nan());
    }

    #[test]
    fn test_huge_move_is_capped() {
        let to = Vec2::new(1.0e9, -1.0e9);
        let pts = interpolated_points(Vec2::ZERO, to, 8.0);
        assert_eq!(pts.len(), MAX_SUB_MOVES);
        assert_eq!(*pts.last().unwrap(), to);
    }

    proptest! {
        #[test]
        fn prop_sub_moves_are_bounded_and_end_at_target(
            fx in -500.0f32..500.0, fy in -500.0f32..500.0,
            tx in -500.0f32..500.0, ty in -500.0f32..500.0,
            max_delta in 1.0f32..32.0,
        ) {
            let from = Vec2::new(fx, fy);
            let to = Vec2::new(tx, ty);
            let pts = interpolated_points(from, to, max_delta);
            prop_assert_eq!(*pts.last().unwrap(), to);
            let mut prev = from;
            for p in &pts {
                let d = (*p - prev).abs();
                prop_assert!(d.x <= max_delta + 1e-3 && d.y <= max_delta + 1e-3);
                prev = *p;
            }
        }
    }
}
