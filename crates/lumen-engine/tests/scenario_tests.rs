//! End-to-end puzzle scenarios.
//!
//! Each test loads a small puzzle from JSON, runs updates and checks the
//! traced ledgers, terminus state, journal events and masks. Grids are
//! written in offset rows: row `r`, column `c` is the cube coordinate
//! `(c - (r + (r & 1)) / 2, r, ...)`, so row 0 column `c` is `(c, 0, -c)`.
//!
//! Set `RUST_LOG=lumen_engine=trace` to see every committed step.

use lumen_engine::prelude::*;
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn load(data: Value) -> Puzzle {
    init_tracing();
    Puzzle::from_json(&data.to_string()).expect("puzzle should load")
}

fn cube(q: i32, r: i32) -> CubeCoordinate {
    CubeCoordinate::from_axial(q, r)
}

fn lamp(direction: u8) -> Value {
    json!({ "items": [ { "type": "terminus", "on": true, "toggleable": true,
                         "openings": [ { "direction": direction } ] } ] })
}

fn socket(directions: &[u8]) -> Value {
    let openings: Vec<Value> = directions.iter().map(|d| json!({ "direction": d })).collect();
    json!({ "items": [ { "type": "terminus", "openings": openings } ] })
}

fn item(value: Value) -> Value {
    json!({ "items": [ value ] })
}

fn empty() -> Value {
    json!({})
}

fn last_step(puzzle: &Puzzle, beam: u32) -> &Step {
    puzzle
        .beam(BeamId(beam))
        .and_then(|beam| beam.ledger().last())
        .expect("beam should have steps")
}

// ---------------------------------------------------------------------------
// Single element scenarios
// ---------------------------------------------------------------------------

#[test]
fn wall_stops_beam_with_collision() {
    let mut puzzle = load(json!({
        "tiles": [[ lamp(0), empty(), item(json!({ "type": "wall" })), empty() ]]
    }));
    puzzle.update().unwrap();

    let beam = puzzle.beam(BeamId(0)).unwrap();
    assert_eq!(beam.steps().len(), 3);
    assert_eq!(beam.termination(), Some(Termination::Collision));
    let collision = last_step(&puzzle, 0).state.first::<Collision>().unwrap();
    assert_eq!(collision.item, Some(ItemId(1)));
    assert_eq!(collision.beam, None);
    assert!(!puzzle.is_solved());
}

#[test]
fn beam_leaving_the_grid_records_boundary_point() {
    let mut puzzle = load(json!({ "tiles": [[ lamp(0), empty() ]] }));
    puzzle.update().unwrap();

    let last = last_step(&puzzle, 0);
    assert_eq!(last.tile, cube(1, 0));
    let exit = last.state.first::<OutOfBounds>().unwrap();
    assert_eq!(exit.point, puzzle.layout().boundary_point(cube(1, 0), Direction::EAST));
    assert_eq!(last.point, exit.point);
}

#[test]
fn reflector_routes_beam_into_socket_and_rotation_breaks_it() {
    // East into a south-west facing mirror turns the beam south-east, onto
    // the socket whose opening faces north-west.
    let mut puzzle = load(json!({
        "tiles": [
            [ lamp(0), item(json!({ "type": "reflector", "direction": 2, "rotatable": true })), null ],
            [ null, null, socket(&[4]) ]
        ],
        "solution": [ { "type": "connections", "required": 1 } ]
    }));
    let report = puzzle.update().unwrap();

    assert!(report.solved);
    let beam = puzzle.beam(BeamId(0)).unwrap();
    assert_eq!(beam.termination(), Some(Termination::Connected));
    assert_eq!(beam.steps()[1].direction_to, Direction::SOUTH_EAST);
    assert!(beam.steps()[1].state.has::<ReflectorSeen>());
    assert_eq!(beam.steps()[2].tile, cube(1, 1));
    assert!(report.events.contains(&TerminusEvent::Activated { terminus: ItemId(2) }));

    // Rotating clockwise points the mirror straight back at the lamp.
    let report = puzzle.rotate_item(ItemId(1), Rotation::Clockwise).unwrap();
    assert!(!report.solved);
    assert_eq!(
        report.events,
        vec![
            TerminusEvent::Disconnected {
                terminus: ItemId(2),
                opening: 0,
                beam: BeamId(0)
            },
            TerminusEvent::Deactivated { terminus: ItemId(2) },
        ]
    );
    let beam = puzzle.beam(BeamId(0)).unwrap();
    assert_eq!(beam.steps().len(), 2);
    assert_eq!(
        last_step(&puzzle, 0).state.first::<Collision>().unwrap().item,
        Some(ItemId(1))
    );
}

#[test]
fn filters_accumulate_colors() {
    let mut puzzle = load(json!({
        "tiles": [[
            { "items": [ { "type": "terminus", "on": true,
                           "openings": [ { "direction": 0, "colors": ["#ff0000"] } ] } ] },
            item(json!({ "type": "filter", "color": "#0000ff" })),
            empty()
        ]]
    }));
    puzzle.update().unwrap();

    let last = last_step(&puzzle, 0);
    assert_eq!(last.colors, vec![Color::rgb(255, 0, 0), Color::rgb(0, 0, 255)]);
    assert_eq!(puzzle.beam(BeamId(0)).unwrap().color(), Some(Color::rgb(128, 0, 128)));
    assert_eq!(last.termination(), Some(Termination::OutOfBounds));
}

#[test]
fn replace_policy_keeps_only_last_filter() {
    let mut puzzle = load(json!({
        "tiles": [[
            { "items": [ { "type": "terminus", "on": true,
                           "openings": [ { "direction": 0, "colors": ["#ff0000"] } ] } ] },
            item(json!({ "type": "filter", "color": "#00ff00" })),
            item(json!({ "type": "filter", "color": "#0000ff" }))
        ]],
        "config": { "color_policy": "replace" }
    }));
    puzzle.update().unwrap();

    assert_eq!(last_step(&puzzle, 0).colors, vec![Color::rgb(0, 0, 255)]);
}

// ---------------------------------------------------------------------------
// Portals and masks
// ---------------------------------------------------------------------------

fn portal(direction: u8) -> Value {
    item(json!({ "type": "portal", "direction": direction }))
}

#[test]
fn single_portal_destination_teleports() {
    let mut puzzle = load(json!({
        "tiles": [
            [ lamp(0), portal(0), null ],
            [ null, null, null ],
            [ null, portal(3), socket(&[3]) ]
        ]
    }));
    puzzle.update().unwrap();

    let beam = puzzle.beam(BeamId(0)).unwrap();
    let steps = beam.steps();
    assert_eq!(steps.len(), 4);
    assert_eq!(steps[1].teleports_to(), Some(ItemId(2)));

    let landing = &steps[2];
    assert_eq!(landing.tile, cube(0, 2));
    assert_eq!(landing.point, puzzle.layout().tile_center(cube(0, 2)));
    assert_eq!(
        landing.state.first::<PortalTransit>(),
        Some(&PortalTransit {
            entry: ItemId(1),
            exit: ItemId(2),
            phase: PortalPhase::Exit
        })
    );
    assert_eq!(beam.termination(), Some(Termination::Connected));
}

#[test]
fn portal_without_destination_is_collision() {
    let mut puzzle = load(json!({ "tiles": [[ lamp(0), portal(0), empty() ]] }));
    puzzle.update().unwrap();
    let collision = last_step(&puzzle, 0).state.first::<Collision>().unwrap();
    assert_eq!(collision.item, Some(ItemId(1)));
}

fn ambiguous_portals() -> Value {
    json!({
        "tiles": [
            [ lamp(0), portal(0), null ],
            [ null, null, null ],
            [ null, portal(3), empty() ],
            [ null, null, null ],
            [ null, portal(3), empty() ]
        ]
    })
}

#[test]
fn ambiguous_portal_suspends_and_choice_persists() {
    let mut puzzle = load(ambiguous_portals());
    let report = puzzle.update().unwrap();

    let mask = report.mask.expect("beam should wait for a choice");
    assert_eq!(mask.beam, BeamId(0));
    assert_eq!(mask.portal, ItemId(1));
    assert_eq!(mask.tiles().collect::<Vec<_>>(), vec![cube(0, 2), cube(-1, 4)]);
    assert!(mask.is_excluded(cube(0, 0)));
    assert!(!mask.is_excluded(cube(-1, 4)));
    assert_eq!(
        puzzle.beam(BeamId(0)).unwrap().termination(),
        Some(Termination::Suspended)
    );

    // Masked tiles cannot be chosen.
    assert!(matches!(
        puzzle.choose(cube(1, 0)),
        Err(PuzzleError::ExcludedTile(_))
    ));

    let report = puzzle.choose(cube(-1, 4)).unwrap();
    assert!(report.mask.is_none());
    let beam = puzzle.beam(BeamId(0)).unwrap();
    assert_eq!(beam.choice(ItemId(1)), Some(ItemId(3)));
    assert_eq!(beam.steps()[2].tile, cube(-1, 4));
    assert_eq!(beam.termination(), Some(Termination::OutOfBounds));

    // The choice applies to later updates as well.
    let before = puzzle.state_hash();
    let report = puzzle.update().unwrap();
    assert!(report.mask.is_none());
    assert_eq!(puzzle.state_hash(), before);
    assert_eq!(puzzle.beam(BeamId(0)).unwrap().steps()[2].tile, cube(-1, 4));
}

#[test]
fn cancelled_mask_is_raised_again_and_superseded_by_mutation() {
    let mut puzzle = load(ambiguous_portals());
    puzzle.update().unwrap();

    assert!(puzzle.cancel_mask().is_some());
    assert!(puzzle.mask().is_none());
    assert!(matches!(
        puzzle.choose(cube(0, 2)),
        Err(PuzzleError::NoPendingMask)
    ));

    assert!(puzzle.update().unwrap().mask.is_some());

    // Switching the lamp off removes the suspended beam and its request.
    let report = puzzle.toggle_item(ItemId(0)).unwrap();
    assert!(report.mask.is_none());
    assert!(!puzzle.beam(BeamId(0)).unwrap().is_active());
}

// ---------------------------------------------------------------------------
// Termini
// ---------------------------------------------------------------------------

#[test]
fn adjacent_facing_termini_both_activate() {
    let mut puzzle = load(json!({ "tiles": [[ lamp(0), lamp(3) ]] }));
    let report = puzzle.update().unwrap();

    assert!(report.converged);
    assert!(report.solved);
    assert!(puzzle.termini().all(|(_, terminus)| terminus.is_activated()));
    let activations = report
        .events
        .iter()
        .filter(|event| matches!(event, TerminusEvent::Activated { .. }))
        .count();
    assert_eq!(activations, 2);
    assert_eq!(puzzle.journal().events_for_beam(BeamId(1)).count(), 1);
}

#[test]
fn terminus_with_one_of_two_openings_connected_stays_inactive() {
    let mut puzzle = load(json!({ "tiles": [[ lamp(0), socket(&[3, 0]), empty() ]] }));
    puzzle.update().unwrap();

    let (_, socket) = puzzle.termini().find(|(id, _)| *id == ItemId(1)).unwrap();
    assert_eq!(socket.connection_count(), 1);
    assert_eq!(socket.openings[0].connection, Some(BeamId(0)));
    assert!(!socket.is_activated());
    assert!(!puzzle.is_solved());
}

#[test]
fn beam_entering_socket_from_the_wrong_side_collides() {
    let mut puzzle = load(json!({ "tiles": [[ lamp(0), socket(&[0]) ]] }));
    puzzle.update().unwrap();

    let last = last_step(&puzzle, 0);
    assert_eq!(last.state.first::<Collision>().unwrap().item, Some(ItemId(1)));
    assert!(!puzzle.grid().terminus(ItemId(1)).unwrap().openings[0].is_connected());
}

// ---------------------------------------------------------------------------
// Beam against beam
// ---------------------------------------------------------------------------

#[test]
fn crossing_beams_collide_with_each_other() {
    // Beam 0 runs east along row 0; beam 1 runs north-east from row 2 and
    // crosses it at (2, 0).
    let mut puzzle = load(json!({
        "tiles": [
            [ lamp(0), empty(), empty(), empty() ],
            [ null, null, empty(), null ],
            [ null, lamp(5), null, null ]
        ]
    }));
    let report = puzzle.update().unwrap();
    assert!(report.converged);

    let hit_0 = last_step(&puzzle, 0).state.first::<Collision>().unwrap();
    assert_eq!(hit_0.beam, Some(BeamId(1)));
    let hit_1 = last_step(&puzzle, 1).state.first::<Collision>().unwrap();
    assert_eq!(hit_1.beam, Some(BeamId(0)));
    assert_eq!(last_step(&puzzle, 0).tile, cube(2, 0));
    assert_eq!(last_step(&puzzle, 1).tile, cube(2, 0));

    assert_eq!(report.collision_loops.len(), 1);
    let collision_loop = &report.collision_loops[0];
    assert!(collision_loop.contains(BeamId(0)) && collision_loop.contains(BeamId(1)));
    assert_eq!(collision_loop.step_indices(BeamId(1)), &[2]);
    assert_eq!(collision_loop.earliest(), Some((BeamId(0), 2)));
    assert_eq!(collision_loop.items().count(), 0);

    // Nothing is left on the tile past the crossing.
    assert!(puzzle.tracer().occupants(cube(3, 0)).is_empty());
}

#[test]
fn removing_crossing_beam_restores_full_path() {
    let mut puzzle = load(json!({
        "tiles": [
            [ lamp(0), empty(), empty(), empty() ],
            [ null, null, empty(), null ],
            [ null, lamp(5), null, null ]
        ]
    }));
    puzzle.update().unwrap();
    puzzle.toggle_item(ItemId(1)).unwrap();

    let beam = puzzle.beam(BeamId(0)).unwrap();
    assert_eq!(beam.steps().len(), 4);
    assert_eq!(beam.termination(), Some(Termination::OutOfBounds));
    assert!(puzzle.collisions().is_empty());
}

#[test]
fn rotating_a_held_socket_hands_it_to_another_beam() {
    // Beam 0 runs south-west into the socket's north-east side and collides.
    // Beam 2 runs west into its east-facing opening and holds it.
    let mut puzzle = load(json!({
        "tiles": [
            [ null, lamp(2) ],
            [ null,
              item(json!({ "type": "terminus", "rotatable": true,
                           "openings": [ { "direction": 0 } ] })),
              lamp(3) ]
        ]
    }));
    puzzle.update().unwrap();
    let socket = ItemId(1);
    assert_eq!(
        puzzle.grid().terminus(socket).unwrap().openings[0].connection,
        Some(BeamId(2))
    );
    assert_eq!(
        last_step(&puzzle, 0).state.first::<Collision>().unwrap().item,
        Some(socket)
    );

    // Turning the opening to face north-east gives it to beam 0.
    let report = puzzle.rotate_item(socket, Rotation::CounterClockwise).unwrap();
    assert!(report.converged);
    assert_eq!(
        report.events,
        vec![
            TerminusEvent::Disconnected {
                terminus: socket,
                opening: 0,
                beam: BeamId(2)
            },
            TerminusEvent::Deactivated { terminus: socket },
            TerminusEvent::Connected {
                terminus: socket,
                opening: 0,
                beam: BeamId(0)
            },
            TerminusEvent::Activated { terminus: socket },
        ]
    );
    assert_eq!(
        puzzle.beam(BeamId(0)).unwrap().termination(),
        Some(Termination::Connected)
    );
    assert_eq!(
        puzzle.beam(BeamId(2)).unwrap().termination(),
        Some(Termination::Collision)
    );
    assert_eq!(
        puzzle.grid().terminus(socket).unwrap().openings[0].connection,
        Some(BeamId(0))
    );
}

#[test]
fn trace_does_not_depend_on_mutation_history() {
    // Beam 0 runs east into a mirror that would send it on into the lamp
    // below; that lamp fires north-west straight back at the mirror tile.
    let tiles = |on: bool| {
        json!({
            "tiles": [
                [
                    { "items": [ { "type": "terminus", "on": on, "toggleable": true,
                                   "openings": [ { "direction": 0 } ] } ] },
                    empty(), empty(), empty(),
                    item(json!({ "type": "reflector", "direction": 2 }))
                ],
                [ null, null, null, null, null, lamp(4) ]
            ]
        })
    };

    let mut fresh = load(tiles(true));
    fresh.update().unwrap();
    let hit_0 = last_step(&fresh, 0).state.first::<Collision>().unwrap();
    assert_eq!(hit_0.beam, Some(BeamId(1)));
    assert_eq!(fresh.beam(BeamId(0)).unwrap().steps().len(), 5);
    assert_eq!(fresh.beam(BeamId(1)).unwrap().steps().len(), 2);
    assert_eq!(last_step(&fresh, 0).tile, cube(4, 0));
    assert_eq!(last_step(&fresh, 1).tile, cube(4, 0));

    // The same grid reached by switching the first lamp on last.
    let mut staged = load(tiles(false));
    staged.update().unwrap();
    assert!(!staged.beam(BeamId(0)).unwrap().is_active());
    staged.toggle_item(ItemId(0)).unwrap();

    assert_eq!(staged.state_hash(), fresh.state_hash());
    for id in [BeamId(0), BeamId(1)] {
        assert_eq!(
            staged.beam(id).unwrap().termination(),
            Some(Termination::Collision)
        );
    }
}

// ---------------------------------------------------------------------------
// Modifiers
// ---------------------------------------------------------------------------

#[test]
fn moving_a_wall_retraces() {
    let mut puzzle = load(json!({
        "tiles": [
            [ lamp(0), item(json!({ "type": "wall", "movable": true })), empty() ],
            [ empty(), empty(), null ]
        ]
    }));
    puzzle.update().unwrap();
    assert_eq!(puzzle.beam(BeamId(0)).unwrap().steps().len(), 2);

    let report = puzzle.move_item(ItemId(1), cube(0, 1)).unwrap();
    assert_eq!(report.update, 2);
    let beam = puzzle.beam(BeamId(0)).unwrap();
    assert_eq!(beam.steps().len(), 3);
    assert_eq!(beam.termination(), Some(Termination::OutOfBounds));
}

#[test]
fn locked_and_immutable_tiles_reject_modifiers() {
    let mut puzzle = load(json!({
        "tiles": [[
            { "items": [ { "type": "reflector", "direction": 2, "rotatable": true } ],
              "modifiers": [ { "type": "lock" } ] },
            { "items": [ { "type": "wall", "movable": true } ],
              "modifiers": [ { "type": "immutable" } ] },
            empty()
        ]]
    }));

    let err = puzzle.rotate_item(ItemId(0), Rotation::Clockwise).unwrap_err();
    assert!(matches!(err, PuzzleError::Grid(GridError::Locked { .. })));
    let err = puzzle.move_item(ItemId(1), cube(2, 0)).unwrap_err();
    assert!(matches!(err, PuzzleError::Grid(GridError::ImmutableTile(_))));
    assert_eq!(puzzle.update_count(), 0);
}

#[test]
fn unknown_items_are_skipped() {
    let mut puzzle = load(json!({
        "tiles": [[ lamp(0), item(json!({ "type": "black_hole" })), empty() ]]
    }));
    assert_eq!(puzzle.grid().items().count(), 1);
    puzzle.update().unwrap();
    assert_eq!(puzzle.beam(BeamId(0)).unwrap().steps().len(), 3);
}

#[test]
fn malformed_json_is_a_parse_error() {
    init_tracing();
    assert!(matches!(
        Puzzle::from_json("{ \"tiles\": 4 }"),
        Err(PuzzleError::Parse(_))
    ));
}
