//! # Occupancy Bitset
//!
//! One bit per tile of a chunk: 1 = blocked, 0 = free.
//! At 64 tiles per u64, a 250x250 chunk costs under 8KB.

/// Square occupancy bitset.
///
/// ## Performance
///
/// - Set / test: O(1)
/// - Clear all: O(n/64)
/// - Iterate blocked: O(blocked_count)
#[derive(Clone, Debug)]
pub struct OccupancyGrid {
    /// 64 tiles per word, row-major.
    bits: Vec<u64>,
    /// Side length in tiles.
    side: u32,
    /// Cached count of blocked tiles.
    blocked_count: usize,
}

impl OccupancyGrid {
    /// Creates an all-free grid of `side x side` tiles.
    #[must_use]
    pub fn new(side: u32) -> Self {
        let tiles = side as usize * side as usize;
        Self {
            bits: vec![0u64; tiles.div_ceil(64)],
            side,
            blocked_count: 0,
        }
    }

    /// Side length in tiles.
    #[inline]
    #[must_use]
    pub const fn side(&self) -> u32 {
        self.side
    }

    #[inline]
    fn locate(&self, x: u32, y: u32) -> (usize, u64) {
        debug_assert!(x < self.side && y < self.side, "tile out of chunk");
        let index = y as usize * self.side as usize + x as usize;
        (index / 64, 1u64 << (index % 64))
    }

    /// Checks if a chunk-local tile is blocked.
    #[inline]
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> bool {
        let (word, mask) = self.locate(x, y);
        self.bits[word] & mask != 0
    }

    /// Sets or clears a chunk-local tile.
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, blocked: bool) {
        let (word, mask) = self.locate(x, y);
        let was_blocked = self.bits[word] & mask != 0;
        if blocked {
            self.bits[word] |= mask;
        } else {
            self.bits[word] &= !mask;
        }
        match (was_blocked, blocked) {
            (false, true) => self.blocked_count += 1,
            (true, false) => self.blocked_count -= 1,
            _ => {}
        }
    }

    /// Number of blocked tiles.
    #[inline]
    #[must_use]
    pub const fn blocked_count(&self) -> usize {
        self.blocked_count
    }

    /// Frees every tile.
    pub fn clear(&mut self) {
        for word in &mut self.bits {
            *word = 0;
        }
        self.blocked_count = 0;
    }

    /// Iterates over blocked tiles as chunk-local `(x, y)`.
    ///
    /// Uses `trailing_zeros` to skip free regions.
    pub fn iter_blocked(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let side = self.side as usize;
        self.bits
            .iter()
            .enumerate()
            .flat_map(|(word_idx, &word)| {
                let mut remaining = word;
                std::iter::from_fn(move || {
                    if remaining == 0 {
                        return None;
                    }
                    let bit = remaining.trailing_zeros() as usize;
                    remaining &= remaining - 1;
                    Some(word_idx * 64 + bit)
                })
            })
            .map(move |index| {
                #[allow(clippy::cast_possible_truncation)]
                let tile = ((index % side) as u32, (index / side) as u32);
                tile
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut grid = OccupancyGrid::new(10);
        assert!(!grid.get(3, 7));
        grid.set(3, 7, true);
        assert!(grid.get(3, 7));
        assert!(!grid.get(7, 3));
        assert_eq!(grid.blocked_count(), 1);
    }

    #[test]
    fn test_count_is_idempotent() {
        let mut grid = OccupancyGrid::new(8);
        grid.set(1, 1, true);
        grid.set(1, 1, true);
        assert_eq!(grid.blocked_count(), 1);
        grid.set(1, 1, false);
        grid.set(1, 1, false);
        assert_eq!(grid.blocked_count(), 0);
    }

    #[test]
    fn test_iter_blocked() {
        let mut grid = OccupancyGrid::new(100);
        let tiles = [(0, 0), (63, 0), (64, 0), (99, 99), (5, 42)];
        for (x, y) in tiles {
            grid.set(x, y, true);
        }
        let mut found: Vec<_> = grid.iter_blocked().collect();
        found.sort_unstable();
        let mut expected = tiles.to_vec();
        expected.sort_unstable();
        assert_eq!(found, expected);

        grid.clear();
        assert_eq!(grid.iter_blocked().count(), 0);
    }
}
