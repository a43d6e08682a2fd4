use crate::constants::{
    spawn_delay_for_index, ANIM_FRAME_COUNT, ANIM_FRAME_SECS, GHOST_MOVE_SPEED, HIT_FREEZE_TICKS,
    PERCEPTION_RANGE, REENGAGE_DELAY_SECS, SPAWN_DELAY_BASE_SECS, SPAWN_DELAY_STEP_SECS,
    STUN_RECOVERY_SECS,
};
use crate::grid::GridQuery;
use crate::pathfinding::{nearest_where, path_distance, shortest_path};
use crate::patrol::{generate_loop, PatrolArea};
use crate::targeting::{TargetContext, UnreachableFallback};
use crate::types::{
    Direction, GhostState, GhostType, GhostView, MonsterEvents, PlayerSnapshot, Tile,
};

mod collision;
mod movement;
mod state_machine;
mod utils;

use self::collision::Contact;
use self::movement::StepOutcome;

#[derive(Clone, Copy, Debug)]
pub struct MonsterSystemOptions {
    /// Tiles per second.
    pub move_speed: f32,
    /// Maximum BFS hop distance at which a ghost notices the player.
    pub perception_range: f32,
    pub spawn_delay_base_secs: f32,
    pub spawn_delay_step_secs: f32,
    /// Delay applied after a respawn or `reset_all`.
    pub reengage_delay_secs: f32,
    pub stun_recovery_secs: f32,
}

impl Default for MonsterSystemOptions {
    fn default() -> Self {
        Self {
            move_speed: GHOST_MOVE_SPEED,
            perception_range: PERCEPTION_RANGE,
            spawn_delay_base_secs: SPAWN_DELAY_BASE_SECS,
            spawn_delay_step_secs: SPAWN_DELAY_STEP_SECS,
            reengage_delay_secs: REENGAGE_DELAY_SECS,
            stun_recovery_secs: STUN_RECOVERY_SECS,
        }
    }
}

#[derive(Clone, Debug)]
struct GhostInternal {
    pos: Tile,
    prev_pos: Tile,
    spawn: Tile,
    dir: Direction,
    state: GhostState,
    ghost_type: GhostType,
    perception_range: f32,
    spawn_delay: f32,
    patrol_loop: Vec<Tile>,
    patrol_index: usize,
    patrol_area: PatrolArea,
    path: Vec<Tile>,
    path_index: usize,
    stun_timer: f32,
    anim_timer: f32,
    move_buffer: f32,
    hit_freeze_ticks: u32,
}

impl GhostInternal {
    fn spawn_at(
        grid: &dyn GridQuery,
        spawn: Tile,
        ghost_type: GhostType,
        spawn_delay: f32,
        perception_range: f32,
    ) -> Self {
        let patrol_area = PatrolArea::for_tile(grid, spawn);
        Self {
            pos: spawn,
            prev_pos: spawn,
            spawn,
            dir: Direction::Right,
            state: GhostState::Patrol,
            ghost_type,
            perception_range,
            spawn_delay,
            patrol_loop: generate_loop(grid, spawn, patrol_area),
            patrol_index: 0,
            patrol_area,
            path: Vec::new(),
            path_index: 0,
            stun_timer: 0.0,
            anim_timer: 0.0,
            move_buffer: 0.0,
            hit_freeze_ticks: 0,
        }
    }

    fn respawn(&mut self, grid: &dyn GridQuery, reengage_delay: f32) {
        let anim_timer = self.anim_timer;
        *self = Self::spawn_at(
            grid,
            self.spawn,
            self.ghost_type,
            reengage_delay,
            self.perception_range,
        );
        self.anim_timer = anim_timer;
    }

    fn advance_timers(&mut self, dt: f32) {
        if self.spawn_delay > 0.0 {
            self.spawn_delay -= dt;
        }
        let cycle = ANIM_FRAME_SECS * ANIM_FRAME_COUNT as f32;
        self.anim_timer += dt;
        if self.anim_timer >= cycle {
            self.anim_timer %= cycle;
        }
    }

    fn skip_reached_waypoints(&mut self) {
        while self.path.get(self.path_index) == Some(&self.pos) {
            self.path_index += 1;
        }
    }

    /// Drops a path whose next waypoint is no longer reachable in one step.
    fn drop_detached_path(&mut self) {
        if let Some(next) = self.path.get(self.path_index) {
            if *next != self.pos && !next.is_adjacent(self.pos) {
                self.clear_path();
            }
        }
    }

    fn has_active_path(&self) -> bool {
        self.path_index < self.path.len()
    }

    fn clear_path(&mut self) {
        self.path.clear();
        self.path_index = 0;
    }

    fn set_path(&mut self, path: Vec<Tile>) {
        self.path = path;
        self.path_index = 0;
    }

    fn view(&self) -> GhostView {
        GhostView {
            x: self.pos.x,
            y: self.pos.y,
            dir: self.dir,
            state: self.state,
            anim_frame: (self.anim_timer / ANIM_FRAME_SECS) as usize % ANIM_FRAME_COUNT,
            ghost_type: self.ghost_type,
        }
    }
}

/// Everything a ghost may read while it updates during one tick.
struct TickContext<'a> {
    grid: &'a dyn GridQuery,
    player: Option<PlayerSnapshot>,
    prev_player: Option<Tile>,
    red_start: Option<Tile>,
    options: &'a MonsterSystemOptions,
    dt: f32,
}

impl TickContext<'_> {
    fn powered(&self) -> bool {
        self.player.is_some_and(|player| player.powered)
    }
}

/// Owns every ghost of the current level. The grid is borrowed per call and
/// never stored; load a new level by building a new system.
#[derive(Clone, Debug)]
pub struct MonsterSystem {
    options: MonsterSystemOptions,
    ghosts: Vec<GhostInternal>,
    player: Option<PlayerSnapshot>,
    prev_player: Option<PlayerSnapshot>,
    events: MonsterEvents,
}

impl MonsterSystem {
    pub fn new(grid: &dyn GridQuery, spawns: &[Tile]) -> Self {
        Self::with_options(grid, spawns, MonsterSystemOptions::default())
    }

    pub fn with_options(
        grid: &dyn GridQuery,
        spawns: &[Tile],
        options: MonsterSystemOptions,
    ) -> Self {
        let ghosts = spawns
            .iter()
            .enumerate()
            .map(|(index, spawn)| {
                GhostInternal::spawn_at(
                    grid,
                    *spawn,
                    GhostType::for_spawn_index(index),
                    spawn_delay_for_index(
                        index,
                        options.spawn_delay_base_secs,
                        options.spawn_delay_step_secs,
                    ),
                    options.perception_range,
                )
            })
            .collect();
        Self {
            options,
            ghosts,
            player: None,
            prev_player: None,
            events: MonsterEvents::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.ghosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ghosts.is_empty()
    }

    /// Records the player's state for the next `advance`. Callers withhold
    /// snapshots while the player is dying or respawning.
    pub fn set_player_snapshot(&mut self, snapshot: PlayerSnapshot) {
        self.prev_player = self.player.or(Some(snapshot));
        self.player = Some(snapshot);
    }

    pub fn advance(&mut self, grid: &dyn GridQuery, dt: f32) {
        self.events = MonsterEvents::default();

        let red_start = self
            .ghosts
            .iter()
            .find(|ghost| ghost.ghost_type == GhostType::Red)
            .map(|ghost| ghost.pos);
        let ctx = TickContext {
            grid,
            player: self.player,
            prev_player: self.prev_player.map(|prev| prev.tile()),
            red_start,
            options: &self.options,
            dt,
        };

        for ghost in &mut self.ghosts {
            ghost.advance_timers(dt);
            ghost.update_intent(&ctx);
            let outcome = ghost.move_step(&ctx);
            if outcome == StepOutcome::Suppressed {
                continue;
            }
            let Some(player) = ctx.player else {
                continue;
            };
            let prev_player = ctx.prev_player.unwrap_or(player.tile());
            match ghost.arbitrate_contact(&player, prev_player) {
                Contact::None => {}
                Contact::Respawn => ghost.respawn(grid, self.options.reengage_delay_secs),
                Contact::PlayerHit => {
                    self.events.player_hit = true;
                    ghost.hit_freeze_ticks = HIT_FREEZE_TICKS;
                }
            }
        }

        // Positions consumed for this tick's arbitration become the baseline
        // for the next one, even if the caller skips a snapshot.
        self.prev_player = self.player;
    }

    /// Sends every ghost back to its spawn with the re-engagement delay.
    pub fn reset_all(&mut self, grid: &dyn GridQuery) {
        for ghost in &mut self.ghosts {
            ghost.respawn(grid, self.options.reengage_delay_secs);
        }
        self.events = MonsterEvents::default();
    }

    pub fn ghost_views(&self) -> Vec<GhostView> {
        self.ghosts.iter().map(GhostInternal::view).collect()
    }

    pub fn poll_events(&self) -> MonsterEvents {
        self.events
    }

    /// The last path computed for a ghost, walked or not.
    pub fn ghost_path(&self, index: usize) -> Option<&[Tile]> {
        self.ghosts.get(index).map(|ghost| ghost.path.as_slice())
    }

    pub fn patrol_loop(&self, index: usize) -> Option<&[Tile]> {
        self.ghosts
            .get(index)
            .map(|ghost| ghost.patrol_loop.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::test_grids::{grid, house_grid};
    use crate::grid::TileGrid;

    const DT: f32 = 0.16;

    /// 21x15 arena: two vertical walls, one horizontal wall with three gaps.
    fn arena() -> TileGrid {
        let (w, h) = (21usize, 15usize);
        let mut codes = vec![vec![1; w]; h];
        for row in codes.iter_mut().take(h - 1).skip(1) {
            for cell in row.iter_mut().take(w - 1).skip(1) {
                *cell = 0;
            }
        }
        for row in codes.iter_mut().take(h - 2).skip(2) {
            row[w / 3] = 1;
            row[2 * w / 3] = 1;
        }
        for x in 2..w - 2 {
            codes[h / 2][x] = 1;
        }
        codes[h / 2][w / 6] = 0;
        codes[h / 2][w / 2] = 0;
        codes[h / 2][5 * w / 6] = 0;
        TileGrid::from_codes(&codes)
    }

    fn snapshot(x: i32, y: i32, dir: Direction, powered: bool) -> PlayerSnapshot {
        PlayerSnapshot {
            x,
            y,
            dir,
            powered,
        }
    }

    fn ready(system: &mut MonsterSystem) {
        for ghost in &mut system.ghosts {
            ghost.spawn_delay = 0.0;
        }
    }

    #[test]
    fn construction_assigns_types_delays_and_loops() {
        let grid = arena();
        let spawns = [Tile::new(1, 13), Tile::new(10, 13), Tile::new(19, 13), Tile::new(1, 1)];
        let system = MonsterSystem::new(&grid, &spawns);
        assert_eq!(system.len(), 4);
        let types: Vec<GhostType> = system.ghosts.iter().map(|g| g.ghost_type).collect();
        assert_eq!(
            types,
            vec![GhostType::Red, GhostType::Yellow, GhostType::Blue, GhostType::Blue]
        );
        let delays: Vec<f32> = system.ghosts.iter().map(|g| g.spawn_delay).collect();
        assert_eq!(delays, vec![2.0, 4.0, 6.0, 8.0]);
        for index in 0..system.len() {
            let patrol = system.patrol_loop(index).expect("ghost exists");
            assert!(patrol.len() > 1);
            assert_eq!(patrol[0], spawns[index]);
        }
        for view in system.ghost_views() {
            assert_eq!(view.state, GhostState::Patrol);
            assert_eq!(view.anim_frame, 0);
        }
    }

    #[test]
    fn ghost_in_range_starts_chasing_within_one_tick() {
        let grid = arena();
        let mut system = MonsterSystem::new(&grid, &[Tile::new(1, 13)]);
        ready(&mut system);
        system.set_player_snapshot(snapshot(5, 13, Direction::Left, false));
        system.advance(&grid, DT);
        assert_eq!(system.ghost_views()[0].state, GhostState::Chase);
        let path = system.ghost_path(0).expect("ghost exists");
        assert_eq!(path.last(), Some(&Tile::new(5, 13)));
    }

    #[test]
    fn spawn_delay_blocks_engagement() {
        let grid = arena();
        let mut system = MonsterSystem::new(&grid, &[Tile::new(1, 13)]);
        system.set_player_snapshot(snapshot(4, 13, Direction::Left, false));
        system.advance(&grid, DT);
        assert_eq!(system.ghost_views()[0].state, GhostState::Patrol);
    }

    #[test]
    fn yellow_and_blue_drop_back_to_patrol_when_player_leaves_range() {
        let grid = arena();
        let spawns = [Tile::new(19, 1), Tile::new(1, 13), Tile::new(3, 13)];
        let mut system = MonsterSystem::new(&grid, &spawns);
        ready(&mut system);
        system.set_player_snapshot(snapshot(2, 11, Direction::Up, false));
        system.advance(&grid, DT);
        assert_eq!(system.ghosts[1].state, GhostState::Chase);
        assert_eq!(system.ghosts[2].state, GhostState::Chase);

        system.set_player_snapshot(snapshot(12, 1, Direction::Up, false));
        system.advance(&grid, DT);
        for ghost in &system.ghosts[1..] {
            assert_eq!(ghost.state, GhostState::Patrol);
            if ghost.has_active_path() {
                let end = ghost.path.last().expect("non-empty path");
                assert!(ghost.patrol_loop.contains(end));
            }
        }
    }

    #[test]
    fn red_losing_player_reverts_to_patrol_and_rejoins_loop() {
        let grid = arena();
        let mut system = MonsterSystem::new(&grid, &[Tile::new(1, 13)]);
        ready(&mut system);
        system.set_player_snapshot(snapshot(1, 8, Direction::Up, false));
        system.advance(&grid, DT);
        assert_eq!(system.ghosts[0].state, GhostState::Chase);

        // Walk Red off its outer-ring loop by hand.
        system.ghosts[0].pos = Tile::new(2, 12);
        system.set_player_snapshot(snapshot(19, 1, Direction::Up, false));
        system.advance(&grid, DT);
        let red = &system.ghosts[0];
        assert_eq!(red.state, GhostState::Patrol);
        let end = red.path.last().expect("rejoin path");
        assert_ne!(*end, Tile::new(19, 1));
        assert!(red.patrol_loop.contains(end));
    }

    #[test]
    fn power_stuns_then_red_patrols_while_blue_returns() {
        let grid = arena();
        let spawns = [Tile::new(1, 13), Tile::new(19, 1), Tile::new(19, 13)];
        let mut system = MonsterSystem::new(&grid, &spawns);
        ready(&mut system);
        system.set_player_snapshot(snapshot(10, 4, Direction::Up, true));
        system.advance(&grid, DT);
        for view in system.ghost_views() {
            assert_eq!(view.state, GhostState::Stunned);
        }

        // Push Blue off its loop so it has somewhere to return from.
        system.ghosts[2].pos = Tile::new(18, 12);
        system.set_player_snapshot(snapshot(10, 4, Direction::Up, false));
        let ticks = (system.options.stun_recovery_secs / DT).ceil() as usize + 1;
        let mut blue_states = Vec::new();
        let mut red_states = Vec::new();
        for _ in 0..ticks {
            system.advance(&grid, DT);
            red_states.push(system.ghosts[0].state);
            blue_states.push(system.ghosts[2].state);
        }
        assert!(!red_states.contains(&GhostState::Return));
        assert_eq!(red_states.last(), Some(&GhostState::Patrol));
        assert!(blue_states.contains(&GhostState::Return));
        assert_ne!(blue_states.last(), Some(&GhostState::Stunned));
    }

    #[test]
    fn stunned_ghost_holds_position_after_power_ends() {
        let grid = arena();
        let mut system = MonsterSystem::new(&grid, &[Tile::new(1, 13)]);
        ready(&mut system);
        system.set_player_snapshot(snapshot(10, 4, Direction::Up, true));
        system.advance(&grid, DT);
        system.set_player_snapshot(snapshot(10, 4, Direction::Up, false));
        let before = system.ghosts[0].pos;
        system.advance(&grid, 0.5);
        system.advance(&grid, 0.5);
        assert_eq!(system.ghosts[0].state, GhostState::Stunned);
        assert_eq!(system.ghosts[0].pos, before);
    }

    #[test]
    fn player_stepping_onto_ghost_from_behind_respawns_it() {
        let grid = arena();
        let mut system = MonsterSystem::new(&grid, &[Tile::new(1, 13)]);
        ready(&mut system);
        {
            let ghost = &mut system.ghosts[0];
            ghost.pos = Tile::new(6, 1);
            ghost.prev_pos = ghost.pos;
            ghost.dir = Direction::Right;
        }
        system.set_player_snapshot(snapshot(5, 1, Direction::Right, false));
        system.set_player_snapshot(snapshot(6, 1, Direction::Right, false));
        // Too little time for the ghost to take a step this tick.
        system.advance(&grid, 0.01);
        assert!(!system.poll_events().player_hit);
        assert_eq!(system.ghosts[0].pos, Tile::new(1, 13));
        assert_eq!(system.ghosts[0].state, GhostState::Patrol);
    }

    #[test]
    fn ghost_stepping_into_still_player_is_a_hit() {
        let grid = arena();
        let mut system = MonsterSystem::new(&grid, &[Tile::new(1, 13)]);
        ready(&mut system);
        system.set_player_snapshot(snapshot(4, 13, Direction::Left, false));
        system.set_player_snapshot(snapshot(4, 13, Direction::Left, false));
        {
            let ghost = &mut system.ghosts[0];
            ghost.pos = Tile::new(3, 13);
            ghost.dir = Direction::Right;
            ghost.move_buffer = 0.99;
        }
        system.advance(&grid, DT);
        assert_eq!(system.ghosts[0].pos, Tile::new(4, 13));
        assert!(system.poll_events().player_hit);
        assert_eq!(system.ghosts[0].hit_freeze_ticks, HIT_FREEZE_TICKS);

        // Frozen for the next step: no second hit from the same contact.
        system.advance(&grid, DT);
        assert!(!system.poll_events().player_hit);
        assert_eq!(system.ghosts[0].pos, Tile::new(4, 13));
    }

    #[test]
    fn powered_contact_eats_and_resets_ghost() {
        let grid = arena();
        let mut system = MonsterSystem::new(&grid, &[Tile::new(1, 13)]);
        ready(&mut system);
        system.ghosts[0].pos = Tile::new(9, 1);
        system.ghosts[0].prev_pos = Tile::new(9, 1);
        system.set_player_snapshot(snapshot(8, 1, Direction::Right, true));
        system.set_player_snapshot(snapshot(9, 1, Direction::Right, true));
        system.advance(&grid, 0.01);
        let ghost = &system.ghosts[0];
        assert!(!system.poll_events().player_hit);
        assert_eq!(ghost.pos, ghost.spawn);
        assert_eq!(ghost.state, GhostState::Patrol);
        assert!(!ghost.patrol_loop.is_empty());
        assert!(ghost.spawn_delay > 0.0);
    }

    #[test]
    fn swapping_tiles_counts_as_contact() {
        let grid = arena();
        let mut system = MonsterSystem::new(&grid, &[Tile::new(1, 13)]);
        ready(&mut system);
        system.set_player_snapshot(snapshot(5, 13, Direction::Left, false));
        system.set_player_snapshot(snapshot(4, 13, Direction::Left, false));
        {
            let ghost = &mut system.ghosts[0];
            ghost.pos = Tile::new(4, 13);
            ghost.dir = Direction::Right;
            ghost.move_buffer = 0.99;
        }
        system.advance(&grid, DT);
        assert_eq!(system.ghosts[0].pos, Tile::new(5, 13));
        assert!(system.poll_events().player_hit);
    }

    #[test]
    fn events_are_cleared_every_tick() {
        let grid = arena();
        let mut system = MonsterSystem::new(&grid, &[Tile::new(1, 13)]);
        system.events.player_hit = true;
        system.advance(&grid, DT);
        assert!(!system.poll_events().player_hit);
    }

    #[test]
    fn reset_all_returns_every_ghost_home() {
        let grid = arena();
        let spawns = [Tile::new(1, 13), Tile::new(19, 13)];
        let mut system = MonsterSystem::new(&grid, &spawns);
        ready(&mut system);
        system.set_player_snapshot(snapshot(10, 10, Direction::Up, false));
        for _ in 0..30 {
            system.advance(&grid, DT);
        }
        system.reset_all(&grid);
        for (index, ghost) in system.ghosts.iter().enumerate() {
            assert_eq!(ghost.pos, spawns[index]);
            assert_eq!(ghost.state, GhostState::Patrol);
            assert!(!ghost.patrol_loop.is_empty());
            assert!(!ghost.has_active_path());
            assert_eq!(ghost.spawn_delay, system.options.reengage_delay_secs);
        }
    }

    #[test]
    fn housed_ghost_waits_then_leaves_through_the_door() {
        let grid = house_grid();
        let mut system = MonsterSystem::new(&grid, &[Tile::new(3, 3)]);
        system.set_player_snapshot(snapshot(1, 5, Direction::Left, false));
        for _ in 0..5 {
            system.advance(&grid, 0.1);
            assert!(grid.in_ghost_house(system.ghosts[0].pos));
            assert_eq!(system.ghosts[0].patrol_area, PatrolArea::House);
        }

        system.ghosts[0].spawn_delay = 0.0;
        let mut left_house = false;
        for _ in 0..40 {
            system.advance(&grid, 0.1);
            let ghost = &system.ghosts[0];
            assert!(grid.walkable(ghost.pos));
            if !grid.in_ghost_house(ghost.pos) && !grid.is_ghost_door(ghost.pos) {
                left_house = true;
                break;
            }
        }
        assert!(left_house);
        system.advance(&grid, 0.01);
        assert_eq!(system.ghosts[0].patrol_area, PatrolArea::Open);
        assert!(!grid.in_ghost_house(system.ghosts[0].pos));
    }

    #[test]
    fn outside_ghost_never_enters_the_house() {
        let grid = house_grid();
        let mut system = MonsterSystem::new(&grid, &[Tile::new(4, 1)]);
        ready(&mut system);
        // Powered player parked by the door pushes the ghost around the ring.
        system.set_player_snapshot(snapshot(4, 5, Direction::Up, true));
        for _ in 0..200 {
            system.advance(&grid, 0.1);
            let pos = system.ghosts[0].pos;
            assert!(!grid.in_ghost_house(pos));
            assert!(!grid.is_ghost_door(pos));
        }
    }

    #[test]
    fn yellow_targets_from_red_start_of_tick_position() {
        let grid = grid(&[
            "#############",
            "#           #",
            "#           #",
            "#           #",
            "#           #",
            "#           #",
            "#           #",
            "#           #",
            "#############",
        ]);
        let spawns = [Tile::new(4, 3), Tile::new(6, 6)];
        let options = MonsterSystemOptions {
            perception_range: 30.0,
            ..MonsterSystemOptions::default()
        };
        let mut system = MonsterSystem::with_options(&grid, &spawns, options);
        ready(&mut system);
        system.ghosts[0].move_buffer = 0.99;
        system.set_player_snapshot(snapshot(5, 4, Direction::Right, false));
        system.advance(&grid, DT);
        // Red moved during the tick, but Yellow aimed from (4,3):
        // anchor (7,4) reflected through (4,3) is (10,5).
        assert_ne!(system.ghosts[0].pos, Tile::new(4, 3));
        assert_eq!(system.ghost_path(1).and_then(|p| p.last()), Some(&Tile::new(10, 5)));
    }

    #[test]
    fn animation_frame_cycles_through_buckets() {
        let grid = arena();
        let mut system = MonsterSystem::new(&grid, &[Tile::new(1, 13)]);
        let mut frames = Vec::new();
        for _ in 0..8 {
            system.advance(&grid, 0.15);
            frames.push(system.ghost_views()[0].anim_frame);
        }
        assert!(frames.iter().all(|frame| *frame < ANIM_FRAME_COUNT));
        assert!(frames.contains(&1));
        assert!(frames.contains(&3));
    }

    #[test]
    fn malformed_grid_leaves_ghosts_stationary() {
        let grid = TileGrid::from_codes(&[vec![0, 0], vec![0]]);
        let mut system = MonsterSystem::new(&grid, &[Tile::new(0, 0)]);
        ready(&mut system);
        system.set_player_snapshot(snapshot(1, 0, Direction::Left, false));
        for _ in 0..20 {
            system.advance(&grid, DT);
        }
        let view = &system.ghost_views()[0];
        assert_eq!((view.x, view.y), (0, 0));
        assert_eq!(view.state, GhostState::Patrol);
    }

    #[test]
    fn red_chase_path_ends_on_player_when_first_spotted() {
        let grid = arena();
        let mut system = MonsterSystem::new(&grid, &[Tile::new(1, 13)]);
        let player_loop: Vec<Tile> = (2..=5)
            .chain((3..=4).rev())
            .map(|x| Tile::new(x, 1))
            .collect();

        let mut states = Vec::new();
        let mut entry = None;
        for tick in 0..600 {
            let here = player_loop[tick % player_loop.len()];
            let next = player_loop[(tick + 1) % player_loop.len()];
            let facing = here.direction_to(next);
            system.set_player_snapshot(snapshot(here.x, here.y, facing, false));
            system.advance(&grid, DT);
            let state = system.ghost_views()[0].state;
            if state == GhostState::Chase && entry.is_none() {
                let path = system.ghost_path(0).expect("red exists").to_vec();
                entry = Some((here, path));
            }
            states.push(state);
            if entry.is_some() {
                break;
            }
        }

        let (player_tile, path) = entry.expect("red should spot the player");
        let first_chase = states
            .iter()
            .position(|state| *state == GhostState::Chase)
            .expect("chase recorded");
        assert!(first_chase > 0);
        assert_eq!(states[first_chase - 1], GhostState::Patrol);
        assert_eq!(path.last(), Some(&player_tile));
        assert!(!states.contains(&GhostState::Return));
    }
}
