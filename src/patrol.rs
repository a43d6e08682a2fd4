use crate::constants::PATROL_STEP_LIMIT;
use crate::grid::GridQuery;
use crate::types::{Direction, Tile};

/// Which tiles a patrol walk may use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PatrolArea {
    /// Corridors outside the ghost house; house and door cells excluded.
    Open,
    /// Ghost-house interior only.
    House,
}

impl PatrolArea {
    pub fn for_tile(grid: &dyn GridQuery, tile: Tile) -> Self {
        if grid.in_ghost_house(tile) {
            Self::House
        } else {
            Self::Open
        }
    }

    pub fn contains(self, grid: &dyn GridQuery, tile: Tile) -> bool {
        match self {
            Self::Open => {
                grid.walkable(tile) && !grid.in_ghost_house(tile) && !grid.is_ghost_door(tile)
            }
            Self::House => grid.in_ghost_house(tile),
        }
    }
}

/// Right-hand wall-following walk from `start`, heading right first.
///
/// The walk ends once it gets back to `start`; the closing tile is not
/// repeated, so the last tile is adjacent to the first. A walk that gets
/// stuck or exceeds the step limit is returned as is.
pub fn generate_loop(grid: &dyn GridQuery, start: Tile, area: PatrolArea) -> Vec<Tile> {
    if !area.contains(grid, start) {
        return Vec::new();
    }
    let mut path = vec![start];
    let mut pos = start;
    let mut dir = Direction::Right;

    for _ in 0..PATROL_STEP_LIMIT {
        let candidates = [dir.turn_right(), dir, dir.turn_left(), dir.reverse()];
        let Some(next_dir) = candidates
            .into_iter()
            .find(|candidate| area.contains(grid, pos.step(*candidate)))
        else {
            break;
        };
        pos = pos.step(next_dir);
        dir = next_dir;
        if pos == start {
            break;
        }
        path.push(pos);
    }
    path
}
