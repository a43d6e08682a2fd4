use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    None,
}

impl Direction {
    /// BFS and neighbour scans expand in this order: +x, -x, +y, -y.
    pub const CANONICAL: [Direction; 4] = [
        Direction::Right,
        Direction::Left,
        Direction::Down,
        Direction::Up,
    ];

    pub fn parse_move(value: &str) -> Option<Self> {
        match value {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
            Self::None => (0, 0),
        }
    }

    pub fn from_delta(dx: i32, dy: i32) -> Self {
        match (dx, dy) {
            (1, 0) => Self::Right,
            (-1, 0) => Self::Left,
            (0, -1) => Self::Up,
            (0, 1) => Self::Down,
            _ => Self::None,
        }
    }

    pub fn turn_right(self) -> Self {
        match self {
            Self::Right => Self::Down,
            Self::Down => Self::Left,
            Self::Left => Self::Up,
            Self::Up => Self::Right,
            Self::None => Self::None,
        }
    }

    pub fn turn_left(self) -> Self {
        match self {
            Self::Right => Self::Up,
            Self::Up => Self::Left,
            Self::Left => Self::Down,
            Self::Down => Self::Right,
            Self::None => Self::None,
        }
    }

    pub fn reverse(self) -> Self {
        match self {
            Self::Right => Self::Left,
            Self::Left => Self::Right,
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::None => Self::None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Tile {
    pub x: i32,
    pub y: i32,
}

impl Tile {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn step(self, dir: Direction) -> Self {
        let (dx, dy) = dir.delta();
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub fn direction_to(self, other: Tile) -> Direction {
        Direction::from_delta(other.x - self.x, other.y - self.y)
    }

    pub fn is_adjacent(self, other: Tile) -> bool {
        (self.x - other.x).abs() + (self.y - other.y).abs() == 1
    }

    pub fn distance_sq(self, other: Tile) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        dx * dx + dy * dy
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostState {
    Patrol,
    Chase,
    Return,
    Stunned,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostType {
    Red,
    Yellow,
    Blue,
}

impl GhostType {
    /// Spawn index 0 is Red, 1 is Yellow, everything after is Blue.
    pub fn for_spawn_index(index: usize) -> Self {
        match index {
            0 => Self::Red,
            1 => Self::Yellow,
            _ => Self::Blue,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PlayerSnapshot {
    pub x: i32,
    pub y: i32,
    pub dir: Direction,
    pub powered: bool,
}

impl PlayerSnapshot {
    pub fn tile(&self) -> Tile {
        Tile::new(self.x, self.y)
    }
}

impl Default for PlayerSnapshot {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            dir: Direction::Right,
            powered: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GhostView {
    pub x: i32,
    pub y: i32,
    pub dir: Direction,
    pub state: GhostState,
    #[serde(rename = "animFrame")]
    pub anim_frame: usize,
    #[serde(rename = "type")]
    pub ghost_type: GhostType,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MonsterEvents {
    #[serde(rename = "playerHit")]
    pub player_hit: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct LevelInit {
    pub width: i32,
    pub height: i32,
    pub tiles: Vec<String>,
    #[serde(rename = "playerStart")]
    pub player_start: Tile,
    #[serde(rename = "ghostSpawns")]
    pub ghost_spawns: Vec<Tile>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    #[serde(rename = "elapsedMs")]
    pub elapsed_ms: u64,
    pub player: PlayerSnapshot,
    pub ghosts: Vec<GhostView>,
    pub events: MonsterEvents,
    pub hits: u32,
}
