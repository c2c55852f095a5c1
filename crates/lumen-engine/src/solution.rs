//! Win conditions evaluated after every update.

use serde::{Deserialize, Serialize};

use lumen_grid::grid::Grid;

/// A condition the grid must satisfy for the puzzle to count as solved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SolutionCondition {
    /// Every terminus has all of its openings connected.
    AllTerminiActivated,
    /// At least `required` openings across all termini hold a connection.
    Connections { required: usize },
}

impl SolutionCondition {
    pub fn is_met(&self, grid: &Grid) -> bool {
        match self {
            SolutionCondition::AllTerminiActivated => {
                let mut termini = grid.termini().peekable();
                termini.peek().is_some() && termini.all(|(_, terminus)| terminus.is_activated())
            }
            SolutionCondition::Connections { required } => {
                let connected: usize = grid
                    .termini()
                    .map(|(_, terminus)| terminus.connection_count())
                    .sum();
                connected >= *required
            }
        }
    }
}

/// Whether every condition holds. No conditions means
/// [`SolutionCondition::AllTerminiActivated`].
pub fn is_solved(conditions: &[SolutionCondition], grid: &Grid) -> bool {
    if conditions.is_empty() {
        return SolutionCondition::AllTerminiActivated.is_met(grid);
    }
    conditions.iter().all(|condition| condition.is_met(grid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_grid::prelude::*;

    fn grid_with_terminus(connected: bool) -> Grid {
        let mut grid = Grid::new();
        grid.insert_tile(CubeCoordinate::ORIGIN);
        let mut terminus = Terminus::new(vec![
            Opening::new(Direction::EAST),
            Opening::new(Direction::WEST),
        ]);
        if connected {
            terminus.openings[0].connection = Some(BeamId(7));
        }
        grid.place_item(
            CubeCoordinate::ORIGIN,
            ItemKind::Terminus(terminus),
            Capabilities::default(),
        )
        .unwrap();
        grid
    }

    #[test]
    fn empty_grid_is_never_solved() {
        assert!(!is_solved(&[], &Grid::new()));
    }

    #[test]
    fn partial_connection_counts_but_does_not_activate() {
        let grid = grid_with_terminus(true);
        assert!(!is_solved(&[], &grid));
        assert!(is_solved(&[SolutionCondition::Connections { required: 1 }], &grid));
        assert!(!is_solved(
            &[
                SolutionCondition::Connections { required: 1 },
                SolutionCondition::AllTerminiActivated
            ],
            &grid
        ));
    }

    #[test]
    fn decodes_tagged_conditions() {
        let condition: SolutionCondition =
            serde_json::from_str(r#"{ "type": "connections", "required": 3 }"#).unwrap();
        assert_eq!(condition, SolutionCondition::Connections { required: 3 });
    }
}
