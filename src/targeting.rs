use crate::constants::AMBUSH_LOOKAHEAD;
use crate::grid::GridQuery;
use crate::types::{GhostType, PlayerSnapshot, Tile};

/// Inputs a behavior may read when picking a chase target. `red_position`
/// is Red's tile at the start of the current tick.
pub struct TargetContext<'a> {
    pub grid: &'a dyn GridQuery,
    pub player: &'a PlayerSnapshot,
    pub red_position: Option<Tile>,
}

/// What a chasing ghost does when its chase target has no path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnreachableFallback {
    /// Stay in Chase with no path and keep the current heading.
    HoldCourse,
    /// Retry toward the player's own tile before holding course.
    RetargetPlayer,
}

pub trait GhostBehavior: Sync {
    fn chase_target(&self, ctx: &TargetContext<'_>) -> Tile;

    /// Whether the ghost walks back to its loop through `Return`.
    fn uses_return(&self) -> bool {
        true
    }

    fn unreachable_fallback(&self) -> UnreachableFallback {
        UnreachableFallback::HoldCourse
    }
}

/// Direct pursuit; never retreats through `Return`.
pub struct RedBehavior;

/// Flanks the player by reflecting a look-ahead point through Red.
pub struct YellowBehavior;

/// Direct pursuit.
pub struct BlueBehavior;

impl GhostBehavior for RedBehavior {
    fn chase_target(&self, ctx: &TargetContext<'_>) -> Tile {
        ctx.player.tile()
    }

    fn uses_return(&self) -> bool {
        false
    }
}

impl GhostBehavior for YellowBehavior {
    fn chase_target(&self, ctx: &TargetContext<'_>) -> Tile {
        let player_tile = ctx.player.tile();
        let Some(red) = ctx.red_position else {
            return player_tile;
        };
        let (dx, dy) = ctx.player.dir.delta();
        let anchor = Tile::new(
            player_tile.x + dx * AMBUSH_LOOKAHEAD,
            player_tile.y + dy * AMBUSH_LOOKAHEAD,
        );
        let mut target = Tile::new(anchor.x * 2 - red.x, anchor.y * 2 - red.y);
        let (width, height) = (ctx.grid.width(), ctx.grid.height());
        if width > 0 && height > 0 {
            target.x = target.x.clamp(0, width - 1);
            target.y = target.y.clamp(0, height - 1);
        }
        if !ctx.grid.walkable(target) {
            return player_tile;
        }
        target
    }

    fn unreachable_fallback(&self) -> UnreachableFallback {
        UnreachableFallback::RetargetPlayer
    }
}

impl GhostBehavior for BlueBehavior {
    fn chase_target(&self, ctx: &TargetContext<'_>) -> Tile {
        ctx.player.tile()
    }
}

impl GhostType {
    pub fn behavior(self) -> &'static dyn GhostBehavior {
        match self {
            Self::Red => &RedBehavior,
            Self::Yellow => &YellowBehavior,
            Self::Blue => &BlueBehavior,
        }
    }
}

pub fn chase_target(ghost_type: GhostType, ctx: &TargetContext<'_>) -> Tile {
    ghost_type.behavior().chase_target(ctx)
}
