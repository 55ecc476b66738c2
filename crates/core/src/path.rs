use core::fmt;

/// A single root-to-leaf navigation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Side {
    /// Descend into the left child.
    Left,
    /// Descend into the right child.
    Right,
}

impl Side {
    /// The one-step path label understood by the node codec.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "0",
            Side::Right => "1",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rounds a leaf count to the tree width used for path computation.
///
/// Returns `v` when it is zero or a power of two, and otherwise the largest
/// power of two below `v`. Retrieval paths and therefore identifiers depend
/// on this exact rounding; do not swap it for the usual round-up.
pub fn next_power_of_two(v: u32) -> u32 {
    if v == 0 {
        return 0;
    }

    if v.is_power_of_two() {
        return v;
    }

    1 << (31 - v.leading_zeros())
}

/// Computes the root-to-leaf bit path of the leaf at `index` in a tree of
/// `total` leaves.
///
/// The first step selects the root's child and the last step the
/// parent-of-leaf's child. The path is empty iff `total` is zero.
pub fn leaf_path(index: u32, total: u32) -> anyhow::Result<Vec<Side>> {
    if total == 0 {
        return Ok(Vec::new());
    }

    let leaves = next_power_of_two(total);

    anyhow::ensure!(
        index < leaves,
        "invalid argument: leaf index {index} is out of range for a tree of {leaves} leaves"
    );

    let depth = leaves.trailing_zeros();
    let mut path = Vec::with_capacity(depth as usize);

    for k in (0..depth).rev() {
        path.push(match (index >> k) & 1 {
            0 => Side::Left,
            _ => Side::Right,
        });
    }

    Ok(path)
}
