//! Pure MMR sizing and indexing arithmetic.
//!
//! A massif of height `h` holds `1 << (h - 1)` leaves. The functions
//! here answer "how big is a massif", "which massif owns an MMR
//! position", and "how large may the MMR grow before a massif at a
//! given index is full". None of them touch storage.

use crate::constants::LOG_ENTRY_BYTES;

/// Number of leaves a single massif of the given height holds.
#[must_use]
pub fn leaf_count(massif_height: u8) -> u64 {
    1u64 << (massif_height - 1)
}

/// Number of MMR nodes in a perfect tree of the given height.
#[must_use]
pub fn tree_count(massif_height: u8) -> u64 {
    (1u64 << massif_height) - 1
}

/// Byte size of the node storage for a perfect tree of the given
/// height. The massif capacity check compares occupied bytes against
/// this.
#[must_use]
pub fn tree_size(massif_height: u8) -> u64 {
    tree_count(massif_height) * LOG_ENTRY_BYTES as u64
}

/// MMR position of the leaf with the given leaf index.
#[must_use]
pub fn mmr_index(leaf_index: u64) -> u64 {
    2 * leaf_index - u64::from(leaf_index.count_ones())
}

/// Number of interior nodes appended immediately after the given leaf.
///
/// Adding leaf `i` to an MMR appends the leaf node plus one parent for
/// each trailing set bit of `i`.
#[must_use]
pub fn spur_height_leaf(leaf_index: u64) -> u64 {
    u64::from((leaf_index + 1).trailing_zeros())
}

/// The largest MMR size permissible while the massif at `massif_index`
/// is the head of a log built with `massif_height`.
///
/// Massifs after the first carry extra nodes that bury the preceding
/// massif's peaks, so the bound is derived from the last leaf the
/// massif can hold, not from the per-massif tree size.
#[must_use]
pub fn max_mmr_size_for_massif(massif_height: u8, massif_index: u32) -> u64 {
    let max_leaf = leaf_count(massif_height) * (u64::from(massif_index) + 1) - 1;
    mmr_index(max_leaf) + spur_height_leaf(max_leaf) + 1
}

/// Number of leaves contained in an MMR of the given size, by peak
/// decomposition.
#[must_use]
pub fn leaf_count_from_size(mut mmr_size: u64) -> u64 {
    let mut leaves = 0u64;
    while mmr_size > 0 {
        let mut height = 64 - mmr_size.leading_zeros() as u64;
        // largest perfect tree that fits in the remaining size
        while (1u64 << height) - 1 > mmr_size {
            height -= 1;
        }
        leaves += 1u64 << (height - 1);
        mmr_size -= (1u64 << height) - 1;
    }
    leaves
}

/// The massif index owning the node at the given MMR position.
///
/// Checkpoint ownership is derived by calling this with
/// `mmr_state.mmr_size - 1`, the position of the last node the
/// checkpoint attests to.
#[must_use]
pub fn massif_index_from_mmr_index(massif_height: u8, mmr_index: u64) -> u32 {
    let leaves = leaf_count_from_size(mmr_index + 1);
    ((leaves - 1) >> (massif_height - 1)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_and_tree_counts() {
        assert_eq!(leaf_count(1), 1);
        assert_eq!(leaf_count(2), 2);
        assert_eq!(leaf_count(14), 8192);
        assert_eq!(tree_count(2), 3);
        assert_eq!(tree_count(3), 7);
        assert_eq!(tree_size(3), 7 * 32);
    }

    #[test]
    fn mmr_index_matches_known_series() {
        // positions of leaves 0..8 in a canonical MMR
        let expected = [0u64, 1, 3, 4, 7, 8, 10, 11];
        for (leaf, want) in expected.iter().enumerate() {
            assert_eq!(mmr_index(leaf as u64), *want, "leaf {leaf}");
        }
    }

    #[test]
    fn spur_heights_follow_trailing_ones() {
        assert_eq!(spur_height_leaf(0), 0);
        assert_eq!(spur_height_leaf(1), 1);
        assert_eq!(spur_height_leaf(2), 0);
        assert_eq!(spur_height_leaf(3), 2);
        assert_eq!(spur_height_leaf(7), 3);
    }

    #[test]
    fn mmr_size_after_each_leaf_is_consistent() {
        // size after adding leaf i is mmr_index(i) + spur(i) + 1
        let expected_sizes = [1u64, 3, 4, 7, 8, 10, 11, 15];
        for (leaf, want) in expected_sizes.iter().enumerate() {
            let leaf = leaf as u64;
            assert_eq!(mmr_index(leaf) + spur_height_leaf(leaf) + 1, *want);
        }
    }

    #[test]
    fn leaf_count_from_size_inverts_growth() {
        let sizes = [1u64, 3, 4, 7, 8, 10, 11, 15];
        for (leaf, size) in sizes.iter().enumerate() {
            assert_eq!(leaf_count_from_size(*size), leaf as u64 + 1);
        }
    }

    #[test]
    fn max_mmr_size_per_massif() {
        // height 2: two leaves per massif
        assert_eq!(max_mmr_size_for_massif(2, 0), 3);
        assert_eq!(max_mmr_size_for_massif(2, 1), 7);
        assert_eq!(max_mmr_size_for_massif(2, 2), 10);
        // height 1: one leaf per massif
        assert_eq!(max_mmr_size_for_massif(1, 0), 1);
        assert_eq!(max_mmr_size_for_massif(1, 1), 3);
    }

    #[test]
    fn checkpoint_owner_derivation() {
        // height 2, full first massif: mmr size 3, last index 2 -> massif 0
        assert_eq!(massif_index_from_mmr_index(2, 3 - 1), 0);
        // four leaves: mmr size 7, last index 6 -> massif 1
        assert_eq!(massif_index_from_mmr_index(2, 7 - 1), 1);
        // first leaf of the second massif: size 4 -> massif 1
        assert_eq!(massif_index_from_mmr_index(2, 4 - 1), 1);
    }
}
