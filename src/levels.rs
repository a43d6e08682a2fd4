use thiserror::Error;

use crate::grid::{Cell, GridQuery, TileGrid};
use crate::types::{LevelInit, Tile};

pub const LEVEL_1: &[&str] = &[
    "###################",
    "#.................#",
    "#.##.###.#.###.##.#",
    "#O...............O#",
    "#.##.#.#####.#.##.#",
    "#....#...#...#....#",
    "####.###.#.###.####",
    "#.................#",
    "#.###..DDDDD..###.#",
    "#..#...GMMMG...#..#",
    "#..#...GGGGG...#..#",
    "#..#...........#..#",
    "#.####.#####.####.#",
    "#.................#",
    "#.##.###.#.###.##.#",
    "#O.#.....P.....#.O#",
    "##.#.#.#####.#.#.##",
    "#....#...#...#....#",
    "#.######.#.######.#",
    "#.................#",
    "###################",
];

pub const LEVEL_2: &[&str] = &[
    "###################",
    "#.................#",
    "#.##.#.#####.#.##.#",
    "#O.#.#...#...#.#.O#",
    "##.#.###.#.###.#.##",
    "#.................#",
    "#.####.#####.####.#",
    "#.#.............#.#",
    "#.##...DDDDD...##.#",
    "#.#....GMMMG....#.#",
    "#......GGGGG......#",
    "#.#...............#",
    "#.####.#####.####.#",
    "#.........P.......#",
    "#.##.#.#####.#.##.#",
    "#O.#.#.......#.#.O#",
    "##.#.###.#.###.#.##",
    "#....#...#...#....#",
    "#.##.#.#####.#.##.#",
    "#.................#",
    "###################",
];

pub const LEVEL_3: &[&str] = &[
    "###################",
    "#.................#",
    "#.#.###.###.###.#.#",
    "#O#.#.........#.#O#",
    "#.#.#.#######.#.#.#",
    "#...#....#....#...#",
    "#.#####.###.#####.#",
    "#.#.............#.#",
    "#.#.#..DDDDD..#.#.#",
    "#...#..GMMMG..#...#",
    "#.#....GGGGG....#.#",
    "#.#.............#.#",
    "#.#####.###.#####.#",
    "#........P........#",
    "#.#.###.###.###.#.#",
    "#O#.#.........#.#O#",
    "#.#.#.#######.#.#.#",
    "#...#.........#...#",
    "#.###.#######.###.#",
    "#.................#",
    "###################",
];

pub fn builtin_level(id: u32) -> Option<&'static [&'static str]> {
    match id {
        1 => Some(LEVEL_1),
        2 => Some(LEVEL_2),
        3 => Some(LEVEL_3),
        _ => None,
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LevelError {
    #[error("level has no rows")]
    Empty,
    #[error("row {row} has width {found}, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("unknown glyph {glyph:?} at ({x}, {y})")]
    UnknownGlyph { glyph: char, x: usize, y: usize },
    #[error("level has no player start")]
    MissingPlayerStart,
    #[error("no built-in level {0}")]
    UnknownBuiltin(u32),
}

#[derive(Clone, Debug)]
pub struct Level {
    pub grid: TileGrid,
    pub player_start: Tile,
    pub ghost_spawns: Vec<Tile>,
}

impl Level {
    pub fn builtin(id: u32) -> Result<Self, LevelError> {
        let rows = builtin_level(id).ok_or(LevelError::UnknownBuiltin(id))?;
        Self::from_rows(rows)
    }

    pub fn parse(text: &str) -> Result<Self, LevelError> {
        let rows: Vec<&str> = text
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.is_empty())
            .collect();
        Self::from_rows(&rows)
    }

    pub fn from_rows(rows: &[&str]) -> Result<Self, LevelError> {
        let grid = parse_cells(rows)?;
        let mut player_start = None;
        let mut ghost_spawns = Vec::new();
        for (y, row) in rows.iter().enumerate() {
            for (x, glyph) in row.chars().enumerate() {
                let tile = Tile::new(x as i32, y as i32);
                match glyph {
                    'P' if player_start.is_none() => player_start = Some(tile),
                    'M' => ghost_spawns.push(tile),
                    _ => {}
                }
            }
        }
        let player_start = player_start.ok_or(LevelError::MissingPlayerStart)?;
        Ok(Self {
            grid,
            player_start,
            ghost_spawns,
        })
    }

    pub fn to_init(&self) -> LevelInit {
        LevelInit {
            width: self.grid.width(),
            height: self.grid.height(),
            tiles: self.grid.to_rows(),
            player_start: self.player_start,
            ghost_spawns: self.ghost_spawns.clone(),
        }
    }
}

/// Parses glyph rows into a grid. `M` (ghost spawn) is house floor and `P`
/// (player start) is plain path.
pub fn parse_cells(rows: &[&str]) -> Result<TileGrid, LevelError> {
    let Some(first) = rows.first() else {
        return Err(LevelError::Empty);
    };
    let width = first.chars().count();
    if width == 0 {
        return Err(LevelError::Empty);
    }
    let mut cells = Vec::with_capacity(width * rows.len());
    for (y, row) in rows.iter().enumerate() {
        let found = row.chars().count();
        if found != width {
            return Err(LevelError::Ragged {
                row: y,
                expected: width,
                found,
            });
        }
        for (x, glyph) in row.chars().enumerate() {
            let cell = match glyph {
                '#' => Cell::Wall,
                ' ' | 'P' => Cell::Path,
                '.' => Cell::Dot,
                'O' => Cell::PowerPellet,
                'G' | 'M' => Cell::GhostHouse,
                'D' => Cell::GhostDoor,
                _ => return Err(LevelError::UnknownGlyph { glyph, x, y }),
            };
            cells.push(cell);
        }
    }
    Ok(TileGrid::from_cells(width as i32, rows.len() as i32, cells))
}
