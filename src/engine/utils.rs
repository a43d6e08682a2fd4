use std::collections::HashSet;

use super::*;

/// Path onto the closest tile of `patrol_loop`, with that tile's loop index.
pub(super) fn rejoin_path(
    grid: &dyn GridQuery,
    pos: Tile,
    patrol_loop: &[Tile],
) -> Option<(usize, Vec<Tile>)> {
    let on_loop: HashSet<Tile> = patrol_loop.iter().copied().collect();
    let path = nearest_where(grid, pos, |tile| on_loop.contains(&tile))?;
    let target = *path.last()?;
    let index = patrol_loop.iter().position(|tile| *tile == target)?;
    Some((index, path))
}

/// Route out of the ghost house. From a door the route leads to the nearest
/// corridor tile; from inside it takes an adjacent exit or the nearest door.
pub(super) fn exit_path(grid: &dyn GridQuery, pos: Tile) -> Option<Vec<Tile>> {
    if grid.is_ghost_door(pos) {
        return nearest_where(grid, pos, |tile| PatrolArea::Open.contains(grid, tile));
    }
    let adjacent = Direction::CANONICAL
        .into_iter()
        .map(|dir| pos.step(dir))
        .find(|next| grid.can_step(pos, *next) && !grid.in_ghost_house(*next));
    if let Some(next) = adjacent {
        return Some(vec![next]);
    }
    nearest_where(grid, pos, |tile| grid.is_ghost_door(tile))
}

pub(super) fn inside_house(grid: &dyn GridQuery, pos: Tile) -> bool {
    grid.in_ghost_house(pos) || grid.is_ghost_door(pos)
}

pub(super) fn first_open_direction(grid: &dyn GridQuery, pos: Tile) -> Direction {
    Direction::CANONICAL
        .into_iter()
        .find(|dir| grid.can_step(pos, pos.step(*dir)))
        .unwrap_or(Direction::None)
}
