use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::constants::PLAYER_MOVE_SPEED;
use crate::grid::GridQuery;
use crate::patrol::PatrolArea;
use crate::types::{Direction, PlayerSnapshot, Tile};

/// Seeded stand-in for the player: walks the corridors, turning at random
/// at junctions unless steered, and can be granted timed power.
#[derive(Clone, Debug)]
pub struct ScriptedPlayer {
    start: Tile,
    pos: Tile,
    dir: Direction,
    desired: Direction,
    move_buffer: f32,
    speed: f32,
    power_until_ms: Option<u64>,
    rng: StdRng,
}

impl ScriptedPlayer {
    pub fn new(start: Tile, seed: u64) -> Self {
        Self {
            start,
            pos: start,
            dir: Direction::Left,
            desired: Direction::None,
            move_buffer: 0.0,
            speed: PLAYER_MOVE_SPEED,
            power_until_ms: None,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn position(&self) -> Tile {
        self.pos
    }

    /// Queues a turn that is taken as soon as the way is open.
    pub fn steer(&mut self, dir: Direction) {
        self.desired = dir;
    }

    pub fn grant_power(&mut self, now_ms: u64, duration_ms: u64) {
        self.power_until_ms = Some(now_ms.saturating_add(duration_ms));
    }

    pub fn is_powered(&self, now_ms: u64) -> bool {
        self.power_until_ms.is_some_and(|until| now_ms < until)
    }

    pub fn respawn(&mut self) {
        self.pos = self.start;
        self.dir = Direction::Left;
        self.desired = Direction::None;
        self.move_buffer = 0.0;
        self.power_until_ms = None;
    }

    pub fn snapshot(&self, now_ms: u64) -> PlayerSnapshot {
        PlayerSnapshot {
            x: self.pos.x,
            y: self.pos.y,
            dir: self.dir,
            powered: self.is_powered(now_ms),
        }
    }

    pub fn advance(&mut self, grid: &dyn GridQuery, dt: f32, now_ms: u64) -> PlayerSnapshot {
        if self.power_until_ms.is_some_and(|until| now_ms >= until) {
            self.power_until_ms = None;
        }
        self.move_buffer += self.speed * dt;
        if self.move_buffer >= 1.0 {
            self.move_buffer = 0.0;
            let dir = self.choose_direction(grid);
            if dir != Direction::None {
                self.dir = dir;
                self.pos = self.pos.step(dir);
            }
        }
        self.snapshot(now_ms)
    }

    fn choose_direction(&mut self, grid: &dyn GridQuery) -> Direction {
        let pos = self.pos;
        let open = |dir: Direction| {
            dir != Direction::None && PatrolArea::Open.contains(grid, pos.step(dir))
        };
        if open(self.desired) {
            return self.desired;
        }
        let back = self.dir.reverse();
        let exits: Vec<Direction> = Direction::CANONICAL
            .into_iter()
            .filter(|dir| *dir != back && open(*dir))
            .collect();
        if exits.len() >= 2 {
            return exits[self.rng.random_range(0..exits.len())];
        }
        [
            self.dir,
            self.dir.turn_right(),
            self.dir.turn_left(),
            back,
        ]
        .into_iter()
        .find(|dir| open(*dir))
        .unwrap_or(Direction::None)
    }
}
