//! Live heap-block tracking for the resolution pass.

use crate::domain::VarId;
use std::collections::BTreeMap;

/// A block handed out by the allocator and not yet freed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapBlock {
    pub addr: u64,
    pub size: u64,
    pub var: VarId,
}

/// Live heap blocks keyed by base address. Lookup finds the block whose
/// range contains an address via the predecessor entry.
#[derive(Debug, Default)]
pub struct HeapMap {
    blocks: BTreeMap<u64, HeapBlock>,
}

impl HeapMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, block: HeapBlock) {
        self.blocks.insert(block.addr, block);
    }

    /// Remove the block based exactly at `addr`. Freeing an unknown
    /// address is a no-op; the allocator itself would have aborted.
    pub fn remove(&mut self, addr: u64) -> Option<HeapBlock> {
        self.blocks.remove(&addr)
    }

    /// Block containing `addr`, if any.
    #[must_use]
    pub fn find(&self, addr: u64) -> Option<&HeapBlock> {
        let (_, block) = self.blocks.range(..=addr).next_back()?;
        (addr < block.addr + block.size).then_some(block)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(addr: u64, size: u64, var: i32) -> HeapBlock {
        HeapBlock { addr, size, var: VarId(var) }
    }

    #[test]
    fn test_find_interior_address() {
        let mut map = HeapMap::new();
        map.insert(block(0x1000, 0x100, 0));
        map.insert(block(0x2000, 0x10, 1));
        assert_eq!(map.find(0x1000).unwrap().var, VarId(0));
        assert_eq!(map.find(0x10ff).unwrap().var, VarId(0));
        assert_eq!(map.find(0x1100), None);
        assert_eq!(map.find(0x2008).unwrap().var, VarId(1));
        assert_eq!(map.find(0x0fff), None);
    }

    #[test]
    fn test_remove_is_exact_base() {
        let mut map = HeapMap::new();
        map.insert(block(0x1000, 0x100, 0));
        assert_eq!(map.remove(0x1008), None);
        assert!(map.remove(0x1000).is_some());
        assert!(map.is_empty());
        assert_eq!(map.find(0x1008), None);
    }

    #[test]
    fn test_adjacent_blocks_do_not_bleed() {
        let mut map = HeapMap::new();
        map.insert(block(0x1000, 0x100, 0));
        map.insert(block(0x1100, 0x100, 1));
        assert_eq!(map.find(0x10ff).unwrap().var, VarId(0));
        assert_eq!(map.find(0x1100).unwrap().var, VarId(1));
    }
}
