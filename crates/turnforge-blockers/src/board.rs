//! Board, quadrants and their compact text form.
//!
//! Cells serialize as one digit each (`0`–`3` for a quadrant, `4` for
//! empty) and the whole board as one 400-digit string. Flag vectors
//! serialize as strings of `0`/`1`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::DecodeError;

/// Width and height of the board.
pub const BOARD_DIMS: u8 = 20;

/// Number of cells on the board.
pub const BOARD_CELLS: usize = BOARD_DIMS as usize * BOARD_DIMS as usize;

/// Number of quadrants (colours).
pub const QUADRANTS: usize = 4;

// ---------------------------------------------------------------------------
// Quadrant
// ---------------------------------------------------------------------------

/// One of the four colours. Quadrants are numbered clockwise from the
/// top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Quadrant(u8);

impl Quadrant {
    pub const ALL: [Quadrant; QUADRANTS] = [Quadrant(0), Quadrant(1), Quadrant(2), Quadrant(3)];

    pub fn new(index: u8) -> Option<Self> {
        (usize::from(index) < QUADRANTS).then_some(Self(index))
    }

    /// The quadrant played on `turn`.
    pub fn for_turn(turn: u32) -> Self {
        Self((turn % QUADRANTS as u32) as u8)
    }

    pub fn index(self) -> usize {
        usize::from(self.0)
    }

    /// The quadrant after this one, clockwise.
    pub fn next(self) -> Self {
        Self((self.0 + 1) % QUADRANTS as u8)
    }

    /// Board index of this quadrant's starting corner.
    ///
    /// ```text
    /// 0 → 1
    /// ↑   ↓
    /// 3 ← 2
    /// ```
    pub fn start_corner(self) -> usize {
        let last = BOARD_DIMS - 1;
        match self.0 {
            0 => Board::index(0, 0),
            1 => Board::index(last, 0),
            2 => Board::index(last, last),
            _ => Board::index(0, last),
        }
    }

    /// In a three-player game the fourth colour has no owner and sits
    /// out of both turn rotation and end-of-game detection.
    pub fn is_excluded(self, player_count: usize) -> bool {
        self.0 == 3 && player_count == 3
    }
}

impl fmt::Display for Quadrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Cell
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Taken(Quadrant),
}

impl Cell {
    pub fn digit(self) -> char {
        match self {
            Self::Taken(q) => char::from(b'0' + q.0),
            Self::Empty => '4',
        }
    }

    pub fn from_digit(digit: char) -> Result<Self, DecodeError> {
        match digit {
            '0'..='3' => Ok(Self::Taken(Quadrant(digit as u8 - b'0'))),
            '4' => Ok(Self::Empty),
            found => Err(DecodeError::InvalidDigit {
                found,
                allowed: "0, 1, 2, 3 or 4",
            }),
        }
    }

    pub fn is_empty(self) -> bool {
        self == Self::Empty
    }
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// The 20×20 grid, row-major: index `20 * y + x`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: Vec<Cell>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// An empty board.
    pub fn new() -> Self {
        Self {
            cells: vec![Cell::Empty; BOARD_CELLS],
        }
    }

    pub fn index(x: u8, y: u8) -> usize {
        usize::from(BOARD_DIMS) * usize::from(y) + usize::from(x)
    }

    pub fn coords(index: usize) -> (usize, usize) {
        let dims = usize::from(BOARD_DIMS);
        (index % dims, index / dims)
    }

    /// The cell at `index`, or `None` off the board.
    pub fn get(&self, index: usize) -> Option<Cell> {
        self.cells.get(index).copied()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Number of cells owned by `quadrant`.
    pub fn count(&self, quadrant: Quadrant) -> usize {
        self.cells
            .iter()
            .filter(|&&c| c == Cell::Taken(quadrant))
            .count()
    }

    pub(crate) fn set(&mut self, index: usize, cell: Cell) {
        if let Some(slot) = self.cells.get_mut(index) {
            *slot = cell;
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for cell in &self.cells {
            write!(f, "{}", cell.digit())?;
        }
        Ok(())
    }
}

impl FromStr for Board {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cells = s.chars().map(Cell::from_digit).collect::<Result<Vec<_>, _>>()?;
        if cells.len() != BOARD_CELLS {
            return Err(DecodeError::Length {
                expected: BOARD_CELLS,
                found: cells.len(),
            });
        }
        Ok(Self { cells })
    }
}

impl Serialize for Board {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Board {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Flags
// ---------------------------------------------------------------------------

/// A fixed-length vector of booleans, serialized as a `0`/`1` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flags(Vec<bool>);

impl Flags {
    pub fn filled(len: usize, value: bool) -> Self {
        Self(vec![value; len])
    }

    /// The flag at `index`; `false` past the end.
    pub fn get(&self, index: usize) -> bool {
        self.0.get(index).copied().unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn set(&mut self, index: usize, value: bool) {
        if let Some(slot) = self.0.get_mut(index) {
            *slot = value;
        }
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &flag in &self.0 {
            f.write_str(if flag { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl FromStr for Flags {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.chars()
            .map(|c| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                found => Err(DecodeError::InvalidDigit {
                    found,
                    allowed: "0 or 1",
                }),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

impl Serialize for Flags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Flags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
