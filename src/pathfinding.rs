//! Breadth-first search over the 4-connected tile grid.
//!
//! Neighbours are always expanded in [`Direction::CANONICAL`] order so that
//! ties between equally short paths resolve the same way on every run. Each
//! expansion goes through [`GridQuery::can_step`], which keeps ghost doors
//! one-way at every step of the search, not just at the endpoints.

use std::collections::VecDeque;

use crate::grid::GridQuery;
use crate::types::{Direction, Tile};

struct SearchSpace {
    width: i32,
    visited: Vec<bool>,
    parent: Vec<Option<Tile>>,
    depth: Vec<u32>,
}

impl SearchSpace {
    fn new(grid: &dyn GridQuery) -> Self {
        let size = (grid.width().max(0) * grid.height().max(0)) as usize;
        Self {
            width: grid.width(),
            visited: vec![false; size],
            parent: vec![None; size],
            depth: vec![0; size],
        }
    }

    fn index(&self, tile: Tile) -> usize {
        (tile.y * self.width + tile.x) as usize
    }

    fn backtrace(&self, start: Tile, goal: Tile) -> Vec<Tile> {
        let mut path = Vec::new();
        let mut cur = goal;
        while cur != start {
            path.push(cur);
            match self.parent[self.index(cur)] {
                Some(prev) => cur = prev,
                None => return Vec::new(),
            }
        }
        path.reverse();
        path
    }
}

/// Runs BFS from `start` until `is_goal` accepts a tile other than `start`.
/// Expansion stops below `max_depth` hops when given.
fn search(
    grid: &dyn GridQuery,
    start: Tile,
    max_depth: Option<u32>,
    is_goal: impl Fn(Tile) -> bool,
) -> Option<(Tile, SearchSpace)> {
    if !grid.in_bounds(start) {
        return None;
    }
    let mut space = SearchSpace::new(grid);
    let mut queue = VecDeque::new();
    let start_idx = space.index(start);
    space.visited[start_idx] = true;
    queue.push_back(start);

    while let Some(cur) = queue.pop_front() {
        let cur_depth = space.depth[space.index(cur)];
        if cur != start && is_goal(cur) {
            return Some((cur, space));
        }
        if max_depth.is_some_and(|limit| cur_depth >= limit) {
            continue;
        }
        for dir in Direction::CANONICAL {
            let next = cur.step(dir);
            if !grid.in_bounds(next) || !grid.can_step(cur, next) {
                continue;
            }
            let idx = space.index(next);
            if space.visited[idx] {
                continue;
            }
            space.visited[idx] = true;
            space.parent[idx] = Some(cur);
            space.depth[idx] = cur_depth + 1;
            queue.push_back(next);
        }
    }
    None
}

/// Shortest path from `start` to `goal`, excluding `start` and including
/// `goal`. Empty when the two are equal or no route exists.
pub fn shortest_path(grid: &dyn GridQuery, start: Tile, goal: Tile) -> Vec<Tile> {
    if start == goal || !grid.in_bounds(goal) {
        return Vec::new();
    }
    match search(grid, start, None, |tile| tile == goal) {
        Some((found, space)) => space.backtrace(start, found),
        None => Vec::new(),
    }
}

/// Hop count from `start` to `goal` when it is at most `max_range`.
pub fn path_distance(grid: &dyn GridQuery, start: Tile, goal: Tile, max_range: u32) -> Option<u32> {
    if !grid.in_bounds(start) || !grid.in_bounds(goal) {
        return None;
    }
    // Zero hops, so a ghost on the player's own tile is within any range.
    if start == goal {
        return Some(0);
    }
    let (found, space) = search(grid, start, Some(max_range), |tile| tile == goal)?;
    Some(space.depth[space.index(found)])
}

/// Path to the closest tile (other than `start`) accepted by `predicate`.
pub fn nearest_where(
    grid: &dyn GridQuery,
    start: Tile,
    predicate: impl Fn(Tile) -> bool,
) -> Option<Vec<Tile>> {
    let (found, space) = search(grid, start, None, predicate)?;
    Some(space.backtrace(start, found))
}
