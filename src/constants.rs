pub const TICK_RATE: u32 = 20;
pub const TICK_MS: u64 = 1000 / TICK_RATE as u64;

pub const GHOST_MOVE_SPEED: f32 = 3.5;
pub const PERCEPTION_RANGE: f32 = 8.0;

pub const SPAWN_DELAY_BASE_SECS: f32 = 2.0;
pub const SPAWN_DELAY_STEP_SECS: f32 = 2.0;
pub const REENGAGE_DELAY_SECS: f32 = 1.5;
pub const STUN_RECOVERY_SECS: f32 = 2.0;

pub const ANIM_FRAME_SECS: f32 = 0.3;
pub const ANIM_FRAME_COUNT: usize = 4;

pub const PATROL_STEP_LIMIT: usize = 10_000;
pub const AMBUSH_LOOKAHEAD: i32 = 2;
pub const HIT_FREEZE_TICKS: u32 = 1;

pub const PLAYER_MOVE_SPEED: f32 = 4.0;
pub const POWER_DURATION_MS: u64 = 8_000;

pub fn spawn_delay_for_index(index: usize, base: f32, step: f32) -> f32 {
    base + index as f32 * step
}
