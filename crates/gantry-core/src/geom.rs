//! Geometry primitives: [`Point3`] and [`Board`].
//!
//! The world is a column grid: `x`/`y` address a table cell and `z` is the
//! height above the table (0 = resting on the table).

use std::fmt;
use std::ops::{Add, Neg, Sub};

// ---------------------------------------------------------------------------
// Point3
// ---------------------------------------------------------------------------

/// A 3D integer grid cell.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point3 {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Point3 {
    /// Origin (0, 0, 0).
    pub const ZERO: Self = Self { x: 0, y: 0, z: 0 };

    /// One step straight up.
    pub const UP: Self = Self { x: 0, y: 0, z: 1 };

    /// Create a new point.
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Return a point shifted by (dx, dy, dz).
    #[inline]
    pub const fn shift(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            z: self.z + dz,
        }
    }

    /// The cell directly above.
    #[inline]
    pub const fn above(self) -> Self {
        self.shift(0, 0, 1)
    }

    /// The cell directly below. May have a negative `z`.
    #[inline]
    pub const fn beneath(self) -> Self {
        self.shift(0, 0, -1)
    }

    /// The same column, dropped to the table.
    #[inline]
    pub const fn on_table(self) -> Self {
        Self::new(self.x, self.y, 0)
    }

    /// Whether `other` is in the same column (same x and y).
    #[inline]
    pub const fn same_column(self, other: Self) -> bool {
        self.x == other.x && self.y == other.y
    }

    /// Whether `other` is side-by-side with this cell: same height, and
    /// exactly one of x or y differs by one.
    #[inline]
    pub fn is_side_by_side(self, other: Self) -> bool {
        self.z == other.z
            && (((self.x - other.x).abs() == 1 && self.y == other.y)
                || ((self.y - other.y).abs() == 1 && self.x == other.x))
    }

    /// The four side-by-side cells at the same height.
    #[inline]
    pub fn neighbors_4(self) -> [Point3; 4] {
        [
            self.shift(0, -1, 0),
            self.shift(1, 0, 0),
            self.shift(0, 1, 0),
            self.shift(-1, 0, 0),
        ]
    }

    /// The eight planar cells around this one at the same height.
    #[inline]
    pub fn neighbors_8(self) -> [Point3; 8] {
        let mut out = [self; 8];
        for (o, d) in out.iter_mut().zip(PLANAR_8) {
            *o = self + d;
        }
        out
    }

    /// Manhattan (L1) length of this point seen as an offset.
    #[inline]
    pub fn l1(self) -> i32 {
        self.x.abs() + self.y.abs() + self.z.abs()
    }

    /// Chebyshev (L∞) length of this point seen as an offset.
    #[inline]
    pub fn linf(self) -> i32 {
        self.x.abs().max(self.y.abs()).max(self.z.abs())
    }
}

/// The eight planar (dz = 0) unit offsets, in scan order.
pub const PLANAR_8: [Point3; 8] = [
    Point3::new(-1, -1, 0),
    Point3::new(0, -1, 0),
    Point3::new(1, -1, 0),
    Point3::new(-1, 0, 0),
    Point3::new(1, 0, 0),
    Point3::new(-1, 1, 0),
    Point3::new(0, 1, 0),
    Point3::new(1, 1, 0),
];

/// All 26 non-zero unit offsets in a 3×3×3 cube, in scan order (z, y, x).
pub const OFFSETS_26: [Point3; 26] = offsets_26();

const fn offsets_26() -> [Point3; 26] {
    let mut out = [Point3::ZERO; 26];
    let mut i = 0;
    let mut dz = -1;
    while dz <= 1 {
        let mut dy = -1;
        while dy <= 1 {
            let mut dx = -1;
            while dx <= 1 {
                if dx != 0 || dy != 0 || dz != 0 {
                    out[i] = Point3::new(dx, dy, dz);
                    i += 1;
                }
                dx += 1;
            }
            dy += 1;
        }
        dz += 1;
    }
    out
}

// --- trait impls for Point3 ---

impl PartialOrd for Point3 {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Point3 {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.z
            .cmp(&other.z)
            .then(self.y.cmp(&other.y))
            .then(self.x.cmp(&other.x))
    }
}

impl fmt::Display for Point3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

impl Add for Point3 {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Point3 {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Neg for Point3 {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

/// Manhattan (L1) distance between two cells.
#[inline]
pub fn manhattan(a: Point3, b: Point3) -> i32 {
    (a - b).l1()
}

/// Chebyshev (L∞) distance between two cells.
#[inline]
pub fn chebyshev(a: Point3, b: Point3) -> i32 {
    (a - b).linf()
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// The table footprint: a half-open rectangle `[min, max)` over x/y.
///
/// Height is unbounded above; `z` must be non-negative.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Board {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl Default for Board {
    /// The classic 11×11 table, cells 0..=10 on both axes.
    fn default() -> Self {
        Self::new(0, 0, 11, 11)
    }
}

impl Board {
    /// Create a board from two corners, canonicalized so that min ≤ max.
    #[inline]
    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self {
            min_x: x0.min(x1),
            min_y: y0.min(y1),
            max_x: x0.max(x1),
            max_y: y0.max(y1),
        }
    }

    /// Width of the table.
    #[inline]
    pub fn width(self) -> i32 {
        self.max_x - self.min_x
    }

    /// Depth of the table.
    #[inline]
    pub fn depth(self) -> i32 {
        self.max_y - self.min_y
    }

    /// Number of table cells.
    #[inline]
    pub fn len(self) -> usize {
        if self.is_empty() {
            return 0;
        }
        (self.width() as usize) * (self.depth() as usize)
    }

    /// Whether the table has no cells.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.min_x >= self.max_x || self.min_y >= self.max_y
    }

    /// Whether `p` lies over the table and not below it.
    #[inline]
    pub fn contains(self, p: Point3) -> bool {
        p.x >= self.min_x && p.x < self.max_x && p.y >= self.min_y && p.y < self.max_y && p.z >= 0
    }

    /// Iterate over table cells (z = 0) in row-major order.
    pub fn cells(self) -> impl Iterator<Item = Point3> {
        let (x0, x1) = (self.min_x, self.max_x);
        (self.min_y..self.max_y).flat_map(move |y| (x0..x1).map(move |x| Point3::new(x, y, 0)))
    }

    /// Table cells on the square ring at Chebyshev radius `r` around `c`,
    /// clipped to the board. Radius 0 yields `c` itself.
    pub fn ring(self, c: Point3, r: i32) -> impl Iterator<Item = Point3> {
        let c = c.on_table();
        (-r..=r)
            .flat_map(move |dy| (-r..=r).map(move |dx| (dx, dy)))
            .filter(move |&(dx, dy)| dx.abs().max(dy.abs()) == r)
            .map(move |(dx, dy)| c.shift(dx, dy, 0))
            .filter(move |&p| self.contains(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn offsets_26_are_unique_and_non_zero() {
        let set: HashSet<Point3> = OFFSETS_26.iter().copied().collect();
        assert_eq!(set.len(), 26);
        assert!(!set.contains(&Point3::ZERO));
        assert!(OFFSETS_26.iter().all(|d| d.linf() == 1));
    }

    #[test]
    fn side_by_side_excludes_diagonals_and_heights() {
        let p = Point3::new(2, 2, 1);
        assert!(p.is_side_by_side(Point3::new(3, 2, 1)));
        assert!(p.is_side_by_side(Point3::new(2, 1, 1)));
        assert!(!p.is_side_by_side(Point3::new(3, 3, 1)));
        assert!(!p.is_side_by_side(Point3::new(3, 2, 0)));
        assert!(!p.is_side_by_side(p));
        for n in p.neighbors_4() {
            assert!(p.is_side_by_side(n));
        }
    }

    #[test]
    fn distances() {
        let a = Point3::new(0, 0, 0);
        let b = Point3::new(3, -2, 1);
        assert_eq!(manhattan(a, b), 6);
        assert_eq!(chebyshev(a, b), 3);
        assert_eq!(manhattan(b, a), manhattan(a, b));
    }

    #[test]
    fn default_board_is_eleven_square() {
        let b = Board::default();
        assert_eq!(b.len(), 121);
        assert!(b.contains(Point3::new(10, 10, 4)));
        assert!(!b.contains(Point3::new(11, 0, 0)));
        assert!(!b.contains(Point3::new(0, 0, -1)));
        assert_eq!(b.cells().count(), 121);
    }

    #[test]
    fn ring_is_clipped() {
        let b = Board::default();
        assert_eq!(b.ring(Point3::new(5, 5, 3), 0).collect::<Vec<_>>(), vec![Point3::new(5, 5, 0)]);
        assert_eq!(b.ring(Point3::new(5, 5, 0), 1).count(), 8);
        assert_eq!(b.ring(Point3::new(0, 0, 0), 1).count(), 3);
        assert_eq!(b.ring(Point3::new(5, 5, 0), 2).count(), 16);
    }

    #[test]
    fn ordering_is_layer_major() {
        let mut v = vec![Point3::new(1, 0, 1), Point3::new(5, 5, 0), Point3::new(0, 1, 0)];
        v.sort();
        assert_eq!(
            v,
            vec![Point3::new(0, 1, 0), Point3::new(5, 5, 0), Point3::new(1, 0, 1)]
        );
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arb_point() -> impl Strategy<Value = Point3> {
            (-50i32..50, -50i32..50, 0i32..20).prop_map(|(x, y, z)| Point3::new(x, y, z))
        }

        proptest! {
            #[test]
            fn chebyshev_never_exceeds_manhattan(a in arb_point(), b in arb_point()) {
                prop_assert!(chebyshev(a, b) <= manhattan(a, b));
                prop_assert!(manhattan(a, b) <= 3 * chebyshev(a, b));
                prop_assert_eq!(chebyshev(a, b), chebyshev(b, a));
            }

            #[test]
            fn planar_neighbors_are_one_step_away(p in arb_point()) {
                for n in p.neighbors_8() {
                    prop_assert_eq!(chebyshev(p, n), 1);
                    prop_assert_eq!(n.z, p.z);
                }
                for n in p.neighbors_4() {
                    prop_assert_eq!(manhattan(p, n), 1);
                }
            }

            #[test]
            fn ring_cells_sit_at_radius(c in arb_point(), r in 0i32..6) {
                let b = Board::default();
                for p in b.ring(c, r) {
                    prop_assert!(b.contains(p));
                    prop_assert_eq!(p.z, 0);
                    prop_assert_eq!(chebyshev(p, c.on_table()), r);
                }
            }
        }
    }
}
