use crate::types::Tile;

/// Cell vocabulary shared with the level loader. Doors are passable for
/// ghosts, outward from the house only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cell {
    Path,
    Wall,
    GhostHouse,
    Dot,
    PowerPellet,
    GhostDoor,
}

impl Cell {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Path,
            2 => Self::GhostHouse,
            3 => Self::Dot,
            4 => Self::PowerPellet,
            5 => Self::GhostDoor,
            _ => Self::Wall,
        }
    }

    pub fn glyph(self) -> char {
        match self {
            Self::Path => ' ',
            Self::Wall => '#',
            Self::GhostHouse => 'G',
            Self::Dot => '.',
            Self::PowerPellet => 'O',
            Self::GhostDoor => 'D',
        }
    }
}

/// Read-only view of the level grid. Ghost logic only ever borrows one of
/// these for the duration of a call.
pub trait GridQuery {
    fn width(&self) -> i32;
    fn height(&self) -> i32;
    fn cell(&self, tile: Tile) -> Option<Cell>;

    fn in_bounds(&self, tile: Tile) -> bool {
        tile.x >= 0 && tile.y >= 0 && tile.x < self.width() && tile.y < self.height()
    }

    fn walkable(&self, tile: Tile) -> bool {
        matches!(self.cell(tile), Some(cell) if cell != Cell::Wall)
    }

    fn in_ghost_house(&self, tile: Tile) -> bool {
        self.cell(tile) == Some(Cell::GhostHouse)
    }

    fn is_ghost_door(&self, tile: Tile) -> bool {
        self.cell(tile) == Some(Cell::GhostDoor)
    }

    /// A door may only be entered from inside the house or from another
    /// door cell.
    fn can_step(&self, from: Tile, to: Tile) -> bool {
        if !self.walkable(to) {
            return false;
        }
        if self.is_ghost_door(to) {
            return self.in_ghost_house(from) || self.is_ghost_door(from);
        }
        true
    }

    fn open_neighbor_count(&self, tile: Tile) -> usize {
        crate::types::Direction::CANONICAL
            .iter()
            .filter(|dir| self.can_step(tile, tile.step(**dir)))
            .count()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileGrid {
    width: i32,
    height: i32,
    cells: Vec<Cell>,
}

impl TileGrid {
    /// A grid on which every query reports blocked.
    pub fn blocked() -> Self {
        Self {
            width: 0,
            height: 0,
            cells: Vec::new(),
        }
    }

    /// Builds a grid from numeric cell codes. Empty or ragged input
    /// degrades to [`TileGrid::blocked`].
    pub fn from_codes(rows: &[Vec<i32>]) -> Self {
        let Some(first) = rows.first() else {
            return Self::blocked();
        };
        let width = first.len();
        if width == 0 || rows.iter().any(|row| row.len() != width) {
            return Self::blocked();
        }
        let cells = rows
            .iter()
            .flat_map(|row| row.iter().map(|code| Cell::from_code(*code)))
            .collect();
        Self {
            width: width as i32,
            height: rows.len() as i32,
            cells,
        }
    }

    pub fn from_cells(width: i32, height: i32, cells: Vec<Cell>) -> Self {
        if width <= 0 || height <= 0 || cells.len() != (width * height) as usize {
            return Self::blocked();
        }
        Self {
            width,
            height,
            cells,
        }
    }

    pub fn to_rows(&self) -> Vec<String> {
        (0..self.height)
            .map(|y| {
                (0..self.width)
                    .map(|x| self.cell(Tile::new(x, y)).map(Cell::glyph).unwrap_or('#'))
                    .collect()
            })
            .collect()
    }

    pub fn tiles_where(&self, predicate: impl Fn(Cell) -> bool) -> Vec<Tile> {
        let mut out = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                let tile = Tile::new(x, y);
                if self.cell(tile).is_some_and(&predicate) {
                    out.push(tile);
                }
            }
        }
        out
    }

    fn index_of(&self, tile: Tile) -> Option<usize> {
        if !self.in_bounds(tile) {
            return None;
        }
        Some((tile.y * self.width + tile.x) as usize)
    }
}

impl GridQuery for TileGrid {
    fn width(&self) -> i32 {
        self.width
    }

    fn height(&self) -> i32 {
        self.height
    }

    fn cell(&self, tile: Tile) -> Option<Cell> {
        self.index_of(tile).and_then(|index| self.cells.get(index).copied())
    }
}


#[cfg(test)]
mod tests {
    use super::test_grids::house_grid;
    use super::*;

    #[test]
    fn walls_and_out_of_bounds_are_not_walkable() {
        let grid = house_grid();
        assert!(!grid.walkable(Tile::new(0, 0)));
        assert!(!grid.walkable(Tile::new(-1, 1)));
        assert!(!grid.walkable(Tile::new(9, 1)));
        assert!(!grid.walkable(Tile::new(1, 7)));
        assert!(grid.walkable(Tile::new(1, 1)));
        assert!(grid.walkable(Tile::new(4, 2)));
        assert!(grid.walkable(Tile::new(4, 3)));
    }

    #[test]
    fn house_and_door_queries_match_cells() {
        let grid = house_grid();
        assert!(grid.in_ghost_house(Tile::new(4, 3)));
        assert!(!grid.in_ghost_house(Tile::new(4, 2)));
        assert!(grid.is_ghost_door(Tile::new(4, 2)));
        assert!(!grid.is_ghost_door(Tile::new(4, 1)));
    }

    #[test]
    fn door_is_only_enterable_from_inside() {
        let grid = house_grid();
        let door = Tile::new(4, 2);
        assert!(grid.can_step(Tile::new(4, 3), door));
        assert!(!grid.can_step(Tile::new(4, 1), door));
        assert!(grid.can_step(door, Tile::new(4, 1)));
    }

    #[test]
    fn ragged_or_empty_codes_degrade_to_blocked() {
        let ragged = TileGrid::from_codes(&[vec![0, 0, 0], vec![0, 0]]);
        assert_eq!(ragged, TileGrid::blocked());
        assert!(!ragged.walkable(Tile::new(0, 0)));

        let empty = TileGrid::from_codes(&[]);
        assert!(!empty.walkable(Tile::new(0, 0)));
        assert_eq!(empty.open_neighbor_count(Tile::new(0, 0)), 0);
    }

    #[test]
    fn unknown_codes_are_walls() {
        let grid = TileGrid::from_codes(&[vec![0, 9, 5]]);
        assert_eq!(grid.cell(Tile::new(1, 0)), Some(Cell::Wall));
        assert_eq!(grid.cell(Tile::new(2, 0)), Some(Cell::GhostDoor));
    }

    #[test]
    fn dots_and_pellets_count_as_walkable() {
        let grid = TileGrid::from_codes(&[vec![3, 4, 2, 1]]);
        assert!(grid.walkable(Tile::new(0, 0)));
        assert!(grid.walkable(Tile::new(1, 0)));
        assert!(grid.walkable(Tile::new(2, 0)));
        assert!(!grid.walkable(Tile::new(3, 0)));
    }

    #[test]
    fn rows_render_back_to_glyphs() {
        let grid = TileGrid::from_codes(&[vec![1, 0, 3], vec![4, 2, 5]]);
        assert_eq!(grid.to_rows(), vec!["# .".to_string(), "OGD".to_string()]);
    }
}
