use super::utils::{first_open_direction, inside_house};
use super::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum StepOutcome {
    /// Hit-frozen or incapacitated: no movement and no contact check.
    Suppressed,
    Held,
    Moved,
}

impl GhostInternal {
    pub(super) fn move_step(&mut self, ctx: &TickContext<'_>) -> StepOutcome {
        self.prev_pos = self.pos;
        if self.hit_freeze_ticks > 0 {
            self.hit_freeze_ticks -= 1;
            return StepOutcome::Suppressed;
        }
        if self.state == GhostState::Stunned && !ctx.powered() {
            return StepOutcome::Suppressed;
        }

        let grid = ctx.grid;
        let Some(desired) = self.desired_heading(ctx) else {
            return StepOutcome::Held;
        };
        let heading = self.corner_correct(grid, self.dead_end_override(grid, desired));
        if heading == Direction::None {
            return StepOutcome::Held;
        }
        self.dir = heading;

        self.move_buffer += ctx.options.move_speed * ctx.dt;
        if self.move_buffer < 1.0 {
            return StepOutcome::Held;
        }
        self.move_buffer = 0.0;
        let next = self.pos.step(heading);
        if !grid.can_step(self.pos, next) {
            return StepOutcome::Held;
        }
        self.pos = next;
        StepOutcome::Moved
    }

    fn desired_heading(&mut self, ctx: &TickContext<'_>) -> Option<Direction> {
        let grid = ctx.grid;
        if let Some(player) = ctx.player.filter(|p| p.powered) {
            if !inside_house(grid, self.pos) {
                return Some(self.evasive_heading(grid, player.tile()));
            }
        }

        self.skip_reached_waypoints();
        if let Some(next) = self.path.get(self.path_index).copied() {
            return Some(self.path_heading(grid, next));
        }

        if self.state == GhostState::Patrol {
            return self.patrol_heading();
        }
        Some(self.dir)
    }

    /// Adopts the path's direction when already aligned with it or at a
    /// point where turning is possible; otherwise keeps going.
    fn path_heading(&self, grid: &dyn GridQuery, next: Tile) -> Direction {
        let path_dir = self.pos.direction_to(next);
        if path_dir == Direction::None {
            return self.dir;
        }
        if path_dir == self.dir {
            return path_dir;
        }
        let open = grid.open_neighbor_count(self.pos);
        let forward_blocked = !grid.can_step(self.pos, self.pos.step(self.dir));
        let path_open = grid.can_step(self.pos, next);
        if open >= 3 || forward_blocked || (open == 2 && path_open) {
            path_dir
        } else {
            self.dir
        }
    }

    fn patrol_heading(&mut self) -> Option<Direction> {
        if self.patrol_loop.is_empty() {
            return None;
        }
        let len = self.patrol_loop.len();
        self.patrol_index %= len;
        if self.patrol_loop[self.patrol_index] == self.pos {
            self.patrol_index = (self.patrol_index + 1) % len;
        }
        match self.pos.direction_to(self.patrol_loop[self.patrol_index]) {
            Direction::None => None,
            dir => Some(dir),
        }
    }

    /// The open neighbour farthest from the player; ties keep canonical order.
    fn evasive_heading(&self, grid: &dyn GridQuery, player: Tile) -> Direction {
        let mut best = Direction::None;
        let mut best_dist = i64::MIN;
        for dir in Direction::CANONICAL {
            let next = self.pos.step(dir);
            if !grid.can_step(self.pos, next) {
                continue;
            }
            let dist = next.distance_sq(player);
            if dist > best_dist {
                best = dir;
                best_dist = dist;
            }
        }
        best
    }

    fn dead_end_override(&self, grid: &dyn GridQuery, desired: Direction) -> Direction {
        if grid.open_neighbor_count(self.pos) > 1 {
            return desired;
        }
        let back = self.dir.reverse();
        if back != Direction::None && grid.can_step(self.pos, self.pos.step(back)) {
            back
        } else {
            first_open_direction(grid, self.pos)
        }
    }

    fn corner_correct(&self, grid: &dyn GridQuery, heading: Direction) -> Direction {
        if heading == Direction::None {
            return first_open_direction(grid, self.pos);
        }
        [
            heading,
            heading.turn_right(),
            heading.turn_left(),
            heading.reverse(),
        ]
        .into_iter()
        .find(|dir| grid.can_step(self.pos, self.pos.step(*dir)))
        .unwrap_or(Direction::None)
    }
}
