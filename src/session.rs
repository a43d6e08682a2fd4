use crate::constants::{POWER_DURATION_MS, TICK_MS};
use crate::engine::{MonsterSystem, MonsterSystemOptions};
use crate::levels::Level;
use crate::scripted::ScriptedPlayer;
use crate::types::{Direction, LevelInit, MonsterEvents, PlayerSnapshot, Snapshot};

#[derive(Clone, Copy, Debug)]
pub struct SessionOptions {
    pub dt_ms: u64,
    pub seed: u64,
    /// Ticks the player spends dying after a hit; no snapshots reach the
    /// ghosts meanwhile.
    pub respawn_ticks: u32,
    pub power_duration_ms: u64,
    pub monsters: MonsterSystemOptions,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            dt_ms: TICK_MS,
            seed: 1,
            respawn_ticks: 20,
            power_duration_ms: POWER_DURATION_MS,
            monsters: MonsterSystemOptions::default(),
        }
    }
}

/// One level played by the scripted player against the ghost system.
/// Owns the grid and lends it to the ghosts on every call.
pub struct Session {
    level: Level,
    monsters: MonsterSystem,
    player: ScriptedPlayer,
    options: SessionOptions,
    tick: u64,
    elapsed_ms: u64,
    hits: u32,
    dying_ticks: u32,
}

impl Session {
    pub fn new(level: Level, options: SessionOptions) -> Self {
        let monsters =
            MonsterSystem::with_options(&level.grid, &level.ghost_spawns, options.monsters);
        let player = ScriptedPlayer::new(level.player_start, options.seed);
        Self {
            level,
            monsters,
            player,
            options,
            tick: 0,
            elapsed_ms: 0,
            hits: 0,
            dying_ticks: 0,
        }
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn level_init(&self) -> LevelInit {
        self.level.to_init()
    }

    pub fn monsters(&self) -> &MonsterSystem {
        &self.monsters
    }

    pub fn hits(&self) -> u32 {
        self.hits
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn is_player_dying(&self) -> bool {
        self.dying_ticks > 0
    }

    pub fn steer(&mut self, dir: Direction) {
        self.player.steer(dir);
    }

    pub fn grant_power(&mut self) {
        if self.dying_ticks == 0 {
            self.player
                .grant_power(self.elapsed_ms, self.options.power_duration_ms);
        }
    }

    pub fn reset_ghosts(&mut self) {
        self.monsters.reset_all(&self.level.grid);
    }

    pub fn step(&mut self) -> Snapshot {
        self.tick += 1;
        self.elapsed_ms += self.options.dt_ms;

        // Ghosts hold still while the player is dying.
        if self.dying_ticks > 0 {
            self.dying_ticks -= 1;
            if self.dying_ticks == 0 {
                self.player.respawn();
                self.monsters.reset_all(&self.level.grid);
            }
            let player = self.player.snapshot(self.elapsed_ms);
            return self.snapshot(player, MonsterEvents::default());
        }

        let dt = self.options.dt_ms as f32 / 1000.0;
        let player = self.player.advance(&self.level.grid, dt, self.elapsed_ms);
        self.monsters.set_player_snapshot(player);
        self.monsters.advance(&self.level.grid, dt);
        let events = self.monsters.poll_events();
        if events.player_hit {
            self.hits += 1;
            self.dying_ticks = self.options.respawn_ticks.max(1);
        }
        self.snapshot(player, events)
    }

    fn snapshot(&self, player: PlayerSnapshot, events: MonsterEvents) -> Snapshot {
        Snapshot {
            tick: self.tick,
            elapsed_ms: self.elapsed_ms,
            player,
            ghosts: self.monsters.ghost_views(),
            events,
            hits: self.hits,
        }
    }
}
