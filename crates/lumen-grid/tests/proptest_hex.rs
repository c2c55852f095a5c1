//! Property tests for hex coordinate arithmetic.
//!
//! These tests use `proptest` to check the cube invariant and the neighbor /
//! offset / rounding round-trips over a wide range of coordinates.

use lumen_grid::prelude::*;
use proptest::prelude::*;

fn cube() -> impl Strategy<Value = CubeCoordinate> {
    (-500i32..500, -500i32..500).prop_map(|(q, r)| CubeCoordinate::from_axial(q, r))
}

fn direction() -> impl Strategy<Value = Direction> {
    (0u8..6).prop_map(|d| Direction::try_from(d).unwrap())
}

fn sums_to_zero(c: CubeCoordinate) -> bool {
    c.q() + c.r() + c.s() == 0
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2_000))]

    #[test]
    fn add_preserves_invariant(a in cube(), b in cube()) {
        prop_assert!(sums_to_zero(a.add(b)));
    }

    #[test]
    fn neighbor_of_neighbor_in_opposite_direction_is_identity(c in cube(), d in direction()) {
        let there = c.neighbor(d);
        prop_assert!(sums_to_zero(there));
        prop_assert_eq!(there.neighbor(d.opposite()), c);
        prop_assert_eq!(c.distance(there), 1);
        prop_assert_eq!(c.direction_to(there), Some(d));
    }

    #[test]
    fn offset_roundtrip(c in cube()) {
        prop_assert_eq!(CubeCoordinate::from_offset(c.to_offset()), c);
    }

    #[test]
    fn round_preserves_invariant(
        q in -1000.0f64..1000.0,
        r in -1000.0f64..1000.0,
    ) {
        let rounded = FractionalCube::new(q, r, -q - r).round();
        prop_assert!(sums_to_zero(rounded));
    }

    #[test]
    fn round_is_identity_on_integral_cubes(c in cube()) {
        prop_assert_eq!(FractionalCube::from(c).round(), c);
    }

    #[test]
    fn layout_snaps_jittered_centers(c in cube(), dx in -0.4f64..0.4, dy in -0.4f64..0.4) {
        let layout = Layout::new(1.0);
        let point = layout.tile_center(c) + glam::DVec2::new(dx, dy);
        prop_assert_eq!(layout.pixel_to_tile(point), c);
    }
}
