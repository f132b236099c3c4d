//! Block identity and per-block relations.

use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::geom::Point3;

/// Maximum number of side-by-side neighbors a block can have on a grid.
pub const MAX_NEIGHBORS: usize = 4;

/// Substring (case-insensitive) that marks a goal placeholder block.
pub const WILDCARD_MARKER: &str = "wildcard";

/// An immutable, cheaply clonable block identifier.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(Arc<str>);

impl BlockId {
    /// Create an id from any string.
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// The id as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this id names a wildcard placeholder.
    pub fn is_wildcard(&self) -> bool {
        self.0.to_ascii_lowercase().contains(WILDCARD_MARKER)
    }
}

impl fmt::Debug for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for BlockId {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl Borrow<str> for BlockId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for BlockId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for BlockId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(BlockId::from(s))
    }
}

// ---------------------------------------------------------------------------
// Block
// ---------------------------------------------------------------------------

/// One cubic block and its spatial relations.
///
/// `on_top_of` names the block this one rests on (`None` = the table, or
/// "unconstrained" in a goal description). `below` names the block resting
/// on this one (`None` = nothing, this is a top block).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Block {
    pub id: BlockId,
    pub color: Option<String>,
    pub location: Option<Point3>,
    pub on_top_of: Option<BlockId>,
    pub below: Option<BlockId>,
    pub neighbors: BTreeSet<BlockId>,
    pub grabbed: bool,
}

impl Block {
    /// An unplaced block with no relations.
    pub fn new(id: impl Into<BlockId>) -> Self {
        Self {
            id: id.into(),
            color: None,
            location: None,
            on_top_of: None,
            below: None,
            neighbors: BTreeSet::new(),
            grabbed: false,
        }
    }

    /// Builder-style location setter.
    pub fn at(mut self, p: Point3) -> Self {
        self.location = Some(p);
        self
    }

    /// Builder-style color setter.
    pub fn colored(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Height above the table, if placed.
    #[inline]
    pub fn height(&self) -> Option<i32> {
        self.location.map(|p| p.z)
    }

    /// Whether nothing rests on this block.
    #[inline]
    pub fn is_top(&self) -> bool {
        self.below.is_none()
    }

    /// Whether this block is placed directly on the table.
    #[inline]
    pub fn is_on_table(&self) -> bool {
        self.height() == Some(0)
    }

    /// Drop every spatial relation, keeping identity, color and location.
    pub fn clear_relations(&mut self) {
        self.on_top_of = None;
        self.below = None;
        self.neighbors.clear();
    }

    /// Add a side-by-side neighbor. Returns `false` when the grid degree
    /// bound would be exceeded; re-adding an existing neighbor is a no-op.
    pub fn add_neighbor(&mut self, other: BlockId) -> bool {
        if self.neighbors.contains(&other) {
            return true;
        }
        if self.neighbors.len() >= MAX_NEIGHBORS {
            return false;
        }
        self.neighbors.insert(other);
        true
    }
}


#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;

    #[test]
    fn block_round_trip() {
        let mut b = Block::new("block1").at(Point3::new(1, 2, 0)).colored("red");
        b.neighbors.insert(BlockId::new("block2"));
        let json = serde_json::to_string(&b).unwrap();
        let back: Block = serde_json::from_str(&json).unwrap();
        assert_eq!(b, back);
    }
}
