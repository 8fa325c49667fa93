//! The piece catalog and piece geometry.
//!
//! The catalog is a process-wide constant. [`piece`] hands out an owned
//! copy, so transforms applied during validation never touch it.

/// Number of pieces in every quadrant's set.
pub const PIECES_COUNT: usize = 21;

struct Template {
    width: u8,
    height: u8,
    mask: &'static [u8],
}

const fn t(width: u8, height: u8, mask: &'static [u8]) -> Template {
    Template {
        width,
        height,
        mask,
    }
}

#[rustfmt::skip]
const CATALOG: [Template; PIECES_COUNT] = [
    // #
    t(1, 1, &[1]),
    // ##
    t(2, 1, &[1, 1]),
    // ###
    t(3, 1, &[1, 1, 1]),
    // #
    // ##
    t(2, 2, &[1, 0, 1, 1]),
    // ####
    t(4, 1, &[1, 1, 1, 1]),
    // ##
    // ##
    t(2, 2, &[1, 1, 1, 1]),
    //  #
    // ###
    t(3, 2, &[0, 1, 0, 1, 1, 1]),
    //   #
    // ###
    t(3, 2, &[0, 0, 1, 1, 1, 1]),
    //  ##
    // ##
    t(3, 2, &[0, 1, 1, 1, 1, 0]),
    // #####
    t(5, 1, &[1, 1, 1, 1, 1]),
    // ###
    // ##
    t(3, 2, &[1, 1, 1, 1, 1, 0]),
    //  #
    // ###
    //  #
    t(3, 3, &[0, 1, 0, 1, 1, 1, 0, 1, 0]),
    // #
    // ###
    //   #
    t(3, 3, &[1, 0, 0, 1, 1, 1, 0, 0, 1]),
    //    #
    // ####
    t(4, 2, &[0, 0, 0, 1, 1, 1, 1, 1]),
    //   #
    // ####
    t(4, 2, &[0, 0, 1, 0, 1, 1, 1, 1]),
    // ###
    //   ##
    t(4, 2, &[1, 1, 1, 0, 0, 0, 1, 1]),
    // #
    // ###
    //  #
    t(3, 3, &[1, 0, 0, 1, 1, 1, 0, 1, 0]),
    // ###
    // # #
    t(3, 2, &[1, 1, 1, 1, 0, 1]),
    // #
    // ###
    // #
    t(3, 3, &[1, 0, 0, 1, 1, 1, 1, 0, 0]),
    // ##
    //  ##
    //   #
    t(3, 3, &[1, 1, 0, 0, 1, 1, 0, 0, 1]),
    // #
    // #
    // ###
    t(3, 3, &[1, 0, 0, 1, 0, 0, 1, 1, 1]),
];

/// Returns a copy of catalog piece `index`, or `None` if out of range.
pub fn piece(index: u8) -> Option<Piece> {
    CATALOG.get(usize::from(index)).map(|t| Piece {
        width: t.width,
        height: t.height,
        shape: t.mask.iter().map(|&bit| bit == 1).collect(),
    })
}

/// A polyomino: a bounding box and a row-major mask of occupied cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    width: u8,
    height: u8,
    shape: Vec<bool>,
}

impl Piece {
    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn height(&self) -> u8 {
        self.height
    }

    /// The row-major mask, `width * height` entries.
    pub fn shape(&self) -> &[bool] {
        &self.shape
    }

    /// Number of occupied cells.
    pub fn size(&self) -> usize {
        self.shape.iter().filter(|&&bit| bit).count()
    }

    /// Mirrors the piece along the vertical axis of its bounding box,
    /// i.e. reverses every row.
    ///
    /// ```text
    /// ■■□   □■■
    /// □■■ → ■■□
    /// □□■   ■□□
    /// ```
    pub fn flip(&mut self) {
        let w = usize::from(self.width);
        for row in self.shape.chunks_mut(w) {
            row.reverse();
        }
    }

    /// Rotates the piece 90° clockwise. Cell `(x, y)` of the `w×h` box
    /// moves to `(h-1-y, x)` of the resulting `h×w` box.
    ///
    /// ```text
    /// ■■□ → □■
    /// □■■   ■■
    ///       ■□
    /// ```
    pub fn rotate(&mut self) {
        let w = usize::from(self.width);
        let h = usize::from(self.height);
        let mut rotated = vec![false; self.shape.len()];
        for y in 0..h {
            for x in 0..w {
                rotated[x * h + (h - 1 - y)] = self.shape[y * w + x];
            }
        }
        self.shape = rotated;
        std::mem::swap(&mut self.width, &mut self.height);
    }

    /// Flips (if asked) and then rotates `rotation mod 4` times.
    pub fn transform(&mut self, rotation: u8, flip: bool) {
        if flip {
            self.flip();
        }
        for _ in 0..rotation % 4 {
            self.rotate();
        }
    }

    /// Occupied cells as `(x, y)` offsets within the bounding box, in
    /// row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (u8, u8)> + '_ {
        let w = usize::from(self.width).max(1);
        self.shape
            .iter()
            .enumerate()
            .filter(|(_, bit)| **bit)
            .map(move |(i, _)| ((i % w) as u8, (i / w) as u8))
    }
}
