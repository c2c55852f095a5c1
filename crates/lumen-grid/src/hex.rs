//! Hex coordinates, directions and offset conversion.
//!
//! Tiles are addressed with cube coordinates `(q, r, s)` where `q + r + s == 0`
//! always holds. Puzzle data is authored in offset coordinates `(row, col)`
//! using the "even-row" layout: even rows are shoved half a tile to the right
//! relative to odd rows.
//!
//! [`Direction`] values run clockwise in rendering space (y grows downward),
//! starting at east. Cube math runs counter-clockwise, so the cube vector for
//! direction `d` is looked up at index `(6 - d) % 6` of [`CUBE_DIRECTIONS`].
//!
//! ```
//! use lumen_grid::hex::{CubeCoordinate, Direction};
//!
//! let origin = CubeCoordinate::ORIGIN;
//! let east = origin.neighbor(Direction::EAST);
//! assert_eq!(east, CubeCoordinate::new(1, 0, -1));
//! assert_eq!(east.neighbor(Direction::EAST.opposite()), origin);
//! ```

use std::fmt;
use std::ops::Add;

use serde::{Deserialize, Serialize};

use crate::GridError;

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// One of the six edge directions of a pointy-top hex, clockwise from east.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Direction(u8);

impl Direction {
    pub const EAST: Direction = Direction(0);
    pub const SOUTH_EAST: Direction = Direction(1);
    pub const SOUTH_WEST: Direction = Direction(2);
    pub const WEST: Direction = Direction(3);
    pub const NORTH_WEST: Direction = Direction(4);
    pub const NORTH_EAST: Direction = Direction(5);

    /// Number of distinct directions.
    pub const COUNT: u8 = 6;

    /// Build a direction, wrapping any integer (including negatives) into `0..6`.
    #[inline]
    pub fn wrapping(value: i32) -> Self {
        Self(value.rem_euclid(Self::COUNT as i32) as u8)
    }

    /// Raw index in `0..6`.
    #[inline]
    pub fn index(self) -> u8 {
        self.0
    }

    /// The direction pointing the other way.
    #[inline]
    pub fn opposite(self) -> Self {
        self.rotate(3)
    }

    /// Rotate clockwise by `steps` (negative rotates counter-clockwise).
    #[inline]
    pub fn rotate(self, steps: i32) -> Self {
        Self::wrapping(self.0 as i32 + steps)
    }

    /// Signed clockwise distance from `other` to `self`, in `-2..=3`.
    pub fn offset_from(self, other: Direction) -> i32 {
        let diff = (self.0 as i32 - other.0 as i32).rem_euclid(Self::COUNT as i32);
        if diff > 3 {
            diff - Self::COUNT as i32
        } else {
            diff
        }
    }

    /// All six directions in clockwise order.
    pub fn all() -> impl Iterator<Item = Direction> {
        (0..Self::COUNT).map(Direction)
    }

    /// The cube-space unit vector for this direction.
    #[inline]
    pub fn cube_vector(self) -> CubeCoordinate {
        // Direction 0 indexes as direction 6, which wraps back to slot 0.
        CUBE_DIRECTIONS[((Self::COUNT - self.0) % Self::COUNT) as usize]
    }
}

impl TryFrom<u8> for Direction {
    type Error = GridError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value < Self::COUNT {
            Ok(Self(value))
        } else {
            Err(GridError::InvalidDirection(value))
        }
    }
}

impl From<Direction> for u8 {
    fn from(direction: Direction) -> Self {
        direction.0
    }
}

impl fmt::Debug for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.0 {
            0 => "E",
            1 => "SE",
            2 => "SW",
            3 => "W",
            4 => "NW",
            _ => "NE",
        };
        write!(f, "Direction({name})")
    }
}

// ---------------------------------------------------------------------------
// CubeCoordinate
// ---------------------------------------------------------------------------

/// Counter-clockwise cube unit vectors, starting at east.
pub const CUBE_DIRECTIONS: [CubeCoordinate; 6] = [
    CubeCoordinate { q: 1, r: 0, s: -1 },
    CubeCoordinate { q: 1, r: -1, s: 0 },
    CubeCoordinate { q: 0, r: -1, s: 1 },
    CubeCoordinate { q: -1, r: 0, s: 1 },
    CubeCoordinate { q: -1, r: 1, s: 0 },
    CubeCoordinate { q: 0, r: 1, s: -1 },
];

/// A hex address in cube coordinates. `q + r + s == 0` always holds.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawCube")]
pub struct CubeCoordinate {
    q: i32,
    r: i32,
    s: i32,
}

#[derive(Deserialize)]
struct RawCube {
    q: i32,
    r: i32,
    s: i32,
}

impl TryFrom<RawCube> for CubeCoordinate {
    type Error = GridError;

    fn try_from(raw: RawCube) -> Result<Self, Self::Error> {
        Self::try_new(raw.q, raw.r, raw.s)
    }
}

impl CubeCoordinate {
    pub const ORIGIN: CubeCoordinate = CubeCoordinate { q: 0, r: 0, s: 0 };

    /// Construct a cube coordinate.
    ///
    /// # Panics
    ///
    /// Panics if `q + r + s != 0`. Such a coordinate can only come from a
    /// modeling bug; use [`try_new`](Self::try_new) for untrusted input.
    pub fn new(q: i32, r: i32, s: i32) -> Self {
        assert!(
            q + r + s == 0,
            "cube coordinate invariant violated: q + r + s = {} for ({q}, {r}, {s})",
            q + r + s
        );
        Self { q, r, s }
    }

    /// Checked constructor.
    pub fn try_new(q: i32, r: i32, s: i32) -> Result<Self, GridError> {
        if q + r + s == 0 {
            Ok(Self { q, r, s })
        } else {
            Err(GridError::InvalidCube { q, r, s })
        }
    }

    /// Construct from axial `(q, r)`; `s` is derived.
    #[inline]
    pub fn from_axial(q: i32, r: i32) -> Self {
        Self { q, r, s: -q - r }
    }

    #[inline]
    pub fn q(self) -> i32 {
        self.q
    }

    #[inline]
    pub fn r(self) -> i32 {
        self.r
    }

    #[inline]
    pub fn s(self) -> i32 {
        self.s
    }

    /// Component-wise sum.
    #[inline]
    pub fn add(self, other: CubeCoordinate) -> Self {
        Self {
            q: self.q + other.q,
            r: self.r + other.r,
            s: self.s + other.s,
        }
    }

    /// Component-wise equality.
    #[inline]
    pub fn equals(self, other: CubeCoordinate) -> bool {
        self == other
    }

    /// The adjacent coordinate in `direction`.
    #[inline]
    pub fn neighbor(self, direction: Direction) -> Self {
        self.add(direction.cube_vector())
    }

    /// Number of tile steps between two coordinates.
    pub fn distance(self, other: CubeCoordinate) -> u32 {
        let dq = (self.q - other.q).unsigned_abs();
        let dr = (self.r - other.r).unsigned_abs();
        let ds = (self.s - other.s).unsigned_abs();
        dq.max(dr).max(ds)
    }

    /// The direction leading from `self` to an adjacent `other`, if any.
    pub fn direction_to(self, other: CubeCoordinate) -> Option<Direction> {
        Direction::all().find(|&d| self.neighbor(d) == other)
    }

    /// Convert to even-row offset coordinates.
    pub fn to_offset(self) -> OffsetCoordinate {
        OffsetCoordinate {
            row: self.r,
            col: self.q + (self.r + (self.r & 1)) / 2,
        }
    }

    /// Convert from even-row offset coordinates.
    pub fn from_offset(offset: OffsetCoordinate) -> Self {
        let q = offset.col - (offset.row + (offset.row & 1)) / 2;
        Self::from_axial(q, offset.row)
    }
}

impl Add for CubeCoordinate {
    type Output = CubeCoordinate;

    fn add(self, rhs: CubeCoordinate) -> Self::Output {
        CubeCoordinate::add(self, rhs)
    }
}

impl fmt::Debug for CubeCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cube({}, {}, {})", self.q, self.r, self.s)
    }
}

impl fmt::Display for CubeCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.q, self.r, self.s)
    }
}

// ---------------------------------------------------------------------------
// OffsetCoordinate
// ---------------------------------------------------------------------------

/// A `(row, col)` address in the even-row offset layout used by puzzle data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OffsetCoordinate {
    pub row: i32,
    pub col: i32,
}

impl OffsetCoordinate {
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    pub fn to_cube(self) -> CubeCoordinate {
        CubeCoordinate::from_offset(self)
    }
}

// ---------------------------------------------------------------------------
// FractionalCube
// ---------------------------------------------------------------------------

/// A cube coordinate with fractional components, e.g. from a pixel position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FractionalCube {
    pub q: f64,
    pub r: f64,
    pub s: f64,
}

impl FractionalCube {
    pub fn new(q: f64, r: f64, s: f64) -> Self {
        Self { q, r, s }
    }

    /// Snap to the containing hex.
    ///
    /// All three components are rounded, then the one with the largest
    /// rounding error is recomputed from the other two so the result keeps
    /// `q + r + s == 0`.
    pub fn round(self) -> CubeCoordinate {
        let mut q = self.q.round();
        let mut r = self.r.round();
        let mut s = self.s.round();

        let dq = (q - self.q).abs();
        let dr = (r - self.r).abs();
        let ds = (s - self.s).abs();

        if dq > dr && dq > ds {
            q = -r - s;
        } else if dr > ds {
            r = -q - s;
        } else {
            s = -q - r;
        }

        CubeCoordinate::new(q as i32, r as i32, s as i32)
    }
}

impl From<CubeCoordinate> for FractionalCube {
    fn from(cube: CubeCoordinate) -> Self {
        Self::new(cube.q as f64, cube.r as f64, cube.s as f64)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
