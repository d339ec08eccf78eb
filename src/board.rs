//! Occupancy-only board bookkeeping.
//!
//! The board records which points hold a stone and nothing else: there are
//! no captures, no ko and no suicide checks. It exists so an engine can
//! refuse moves onto occupied or off-board points.

use std::fmt;

use crate::constants::COLUMNS;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Color {
    Black,
    White,
}

impl Color {
    pub fn opponent(self) -> Self {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }
}

/// Why a stone could not be placed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PlaceError {
    OffBoard,
    Occupied,
}

pub struct Board {
    size: usize,
    cells: Vec<Option<Color>>,
}

impl Board {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![None; size * size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Index of the 1-based point `(x, y)`, or `None` off the board.
    fn idx(&self, x: usize, y: usize) -> Option<usize> {
        if (1..=self.size).contains(&x) && (1..=self.size).contains(&y) {
            Some(self.size * (x - 1) + (y - 1))
        } else {
            None
        }
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        self.idx(x, y).is_some()
    }

    pub fn get(&self, x: usize, y: usize) -> Option<Color> {
        self.idx(x, y).and_then(|i| self.cells[i])
    }

    pub fn is_empty_point(&self, x: usize, y: usize) -> bool {
        self.idx(x, y).is_some_and(|i| self.cells[i].is_none())
    }

    /// Place a stone on an empty on-board point.
    pub fn place(&mut self, x: usize, y: usize, color: Color) -> Result<(), PlaceError> {
        let i = self.idx(x, y).ok_or(PlaceError::OffBoard)?;
        if self.cells[i].is_some() {
            return Err(PlaceError::Occupied);
        }
        self.cells[i] = Some(color);
        Ok(())
    }

    /// Remove every stone.
    pub fn clear(&mut self) {
        self.cells.iter_mut().for_each(|c| *c = None);
    }

    /// All empty points as 1-based `(x, y)` pairs, column-major.
    pub fn empty_points(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let size = self.size;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_none())
            .map(move |(i, _)| (i / size + 1, i % size + 1))
    }

    pub fn stone_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header: String = COLUMNS[..self.size.min(COLUMNS.len())]
            .iter()
            .map(|&c| format!("{} ", c as char))
            .collect();
        writeln!(f, "   {}", header.trim_end())?;
        for y in (1..=self.size).rev() {
            write!(f, "{y:>2}")?;
            for x in 1..=self.size {
                let ch = match self.get(x, y) {
                    Some(Color::Black) => 'X',
                    Some(Color::White) => 'O',
                    None => '.',
                };
                write!(f, " {ch}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
