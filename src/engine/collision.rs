use super::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum Contact {
    None,
    /// The ghost goes back to its spawn.
    Respawn,
    PlayerHit,
}

impl GhostInternal {
    /// Decides who initiated contact from this tick's and the previous
    /// tick's positions only.
    pub(super) fn arbitrate_contact(&self, player: &PlayerSnapshot, prev_player: Tile) -> Contact {
        let player_tile = player.tile();
        let ghost_moved = self.pos != self.prev_pos;
        let overlap = self.pos == player_tile;
        let swapped = ghost_moved && self.pos == prev_player && player_tile == self.prev_pos;
        if !overlap && !swapped {
            return Contact::None;
        }
        if player.powered {
            return Contact::Respawn;
        }

        let player_moved = player_tile != prev_player;
        let player_moved_into = player_moved && player_tile == self.prev_pos;
        let ghost_moved_into = ghost_moved && self.pos == prev_player;
        let step = (player_tile.x - prev_player.x, player_tile.y - prev_player.y);
        let from_behind = player_moved && step == self.dir.delta();

        if overlap && player_moved_into && !ghost_moved_into && from_behind {
            Contact::Respawn
        } else {
            Contact::PlayerHit
        }
    }
}
