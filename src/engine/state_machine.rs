use super::utils::{exit_path, inside_house, rejoin_path};
use super::*;

impl GhostInternal {
    /// Picks this tick's state and path. Movement reads the result.
    pub(super) fn update_intent(&mut self, ctx: &TickContext<'_>) {
        let grid = ctx.grid;
        self.skip_reached_waypoints();
        self.drop_detached_path();
        if inside_house(grid, self.pos) {
            if grid.in_ghost_house(self.pos) && self.spawn_delay > 0.0 {
                self.contain_in_house(grid);
            } else {
                self.head_for_exit(grid);
            }
            return;
        }
        if self.patrol_area == PatrolArea::House {
            self.regenerate_patrol(grid);
        }

        if ctx.powered() {
            match self.state {
                GhostState::Stunned => {}
                GhostState::Return => {
                    // Fleeing walks off the rejoin path; re-plan once power ends.
                    self.clear_path();
                    return;
                }
                GhostState::Patrol | GhostState::Chase => {
                    self.state = GhostState::Stunned;
                    self.clear_path();
                }
            }
            self.stun_timer = ctx.options.stun_recovery_secs;
            return;
        }
        if self.state == GhostState::Stunned {
            self.recover_from_stun(grid, ctx.dt);
            return;
        }

        let Some(player) = ctx.player.filter(|_| self.spawn_delay <= 0.0) else {
            if self.state == GhostState::Chase {
                self.state = GhostState::Patrol;
                self.clear_path();
            }
            if self.state == GhostState::Return {
                self.continue_return(grid);
            } else {
                self.settle_patrol(grid);
            }
            return;
        };

        let range = self.perception_range.max(0.0).floor() as u32;
        let in_range = path_distance(grid, self.pos, player.tile(), range).is_some();
        match (self.state, in_range) {
            (_, true) => {
                self.state = GhostState::Chase;
                self.chase(ctx, &player);
            }
            (GhostState::Return, false) => self.continue_return(grid),
            (_, false) => {
                if self.state == GhostState::Chase {
                    self.clear_path();
                }
                self.state = GhostState::Patrol;
                self.settle_patrol(grid);
            }
        }
    }

    fn contain_in_house(&mut self, grid: &dyn GridQuery) {
        self.state = GhostState::Patrol;
        if self.patrol_area != PatrolArea::House {
            self.patrol_area = PatrolArea::House;
            self.patrol_loop = generate_loop(grid, self.pos, PatrolArea::House);
            self.patrol_index = 0;
            self.clear_path();
        }
        self.settle_patrol(grid);
    }

    fn head_for_exit(&mut self, grid: &dyn GridQuery) {
        self.state = GhostState::Patrol;
        if self.has_active_path() {
            return;
        }
        match exit_path(grid, self.pos) {
            Some(path) => self.set_path(path),
            None => self.clear_path(),
        }
    }

    fn chase(&mut self, ctx: &TickContext<'_>, player: &PlayerSnapshot) {
        let grid = ctx.grid;
        let behavior = self.ghost_type.behavior();
        let target = behavior.chase_target(&TargetContext {
            grid,
            player,
            red_position: ctx.red_start,
        });
        let mut path = shortest_path(grid, self.pos, target);
        if path.is_empty()
            && target != player.tile()
            && behavior.unreachable_fallback() == UnreachableFallback::RetargetPlayer
        {
            path = shortest_path(grid, self.pos, player.tile());
        }
        self.set_path(path);
    }

    fn recover_from_stun(&mut self, grid: &dyn GridQuery, dt: f32) {
        self.stun_timer -= dt;
        if self.stun_timer > 0.0 {
            return;
        }
        self.stun_timer = 0.0;
        self.clear_path();
        if self.ghost_type.behavior().uses_return() {
            self.state = GhostState::Return;
            self.continue_return(grid);
        } else {
            self.state = GhostState::Patrol;
            self.settle_patrol(grid);
        }
    }

    fn continue_return(&mut self, grid: &dyn GridQuery) {
        if let Some(index) = self.loop_position() {
            self.state = GhostState::Patrol;
            self.clear_path();
            self.patrol_index = index;
            return;
        }
        if self.has_active_path() {
            return;
        }
        match rejoin_path(grid, self.pos, &self.patrol_loop) {
            Some((index, path)) => {
                self.patrol_index = index;
                self.set_path(path);
            }
            None => {
                self.state = GhostState::Patrol;
                self.clear_path();
            }
        }
    }

    /// Keeps a patrolling ghost on its loop: re-syncs a stale cursor, or
    /// plans a path back when the ghost has wandered off.
    fn settle_patrol(&mut self, grid: &dyn GridQuery) {
        if self.has_active_path() || self.patrol_loop.is_empty() {
            return;
        }
        if let Some(index) = self.loop_position() {
            let cursor = self.patrol_loop[self.patrol_index % self.patrol_loop.len()];
            if cursor != self.pos && !cursor.is_adjacent(self.pos) {
                self.patrol_index = index;
            }
            return;
        }
        if let Some((index, path)) = rejoin_path(grid, self.pos, &self.patrol_loop) {
            self.patrol_index = index;
            self.set_path(path);
        }
    }

    fn regenerate_patrol(&mut self, grid: &dyn GridQuery) {
        self.patrol_area = PatrolArea::for_tile(grid, self.pos);
        self.patrol_loop = generate_loop(grid, self.pos, self.patrol_area);
        self.patrol_index = 0;
        self.clear_path();
    }

    fn loop_position(&self) -> Option<usize> {
        self.patrol_loop.iter().position(|tile| *tile == self.pos)
    }
}
