//! Old-to-new id table for ghost level loads
//!
//! Entries go into fixed-size buckets so a bones file with thousands of
//! objects costs a handful of allocations. There is no removal; the whole
//! table is cleared before and after each ghost load.

pub const IDMAP_BUCKET_SIZE: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct IdPair {
    gid: u32,
    nid: u32,
}

#[derive(Debug, Default)]
pub struct IdMap {
    buckets: Vec<Vec<IdPair>>,
}

impl IdMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `gid` in the file is now `nid`
    pub fn add(&mut self, gid: u32, nid: u32) {
        let full = self
            .buckets
            .last()
            .is_none_or(|bucket| bucket.len() == IDMAP_BUCKET_SIZE);
        if full {
            self.buckets.push(Vec::with_capacity(IDMAP_BUCKET_SIZE));
        }
        if let Some(bucket) = self.buckets.last_mut() {
            bucket.push(IdPair { gid, nid });
        }
    }

    /// New id for `gid`, newest mapping first
    pub fn lookup(&self, gid: u32) -> Option<u32> {
        self.buckets
            .iter()
            .rev()
            .flat_map(|bucket| bucket.iter().rev())
            .find(|pair| pair.gid == gid)
            .map(|pair| pair.nid)
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
    }

    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_miss_is_none() {
        let mut map = IdMap::new();
        map.add(7, 41);
        assert_eq!(map.lookup(7), Some(41));
        assert_eq!(map.lookup(8), None);
    }

    #[test]
    fn test_buckets_fill_in_bulk() {
        let mut map = IdMap::new();
        for gid in 0..(IDMAP_BUCKET_SIZE as u32 * 2 + 1) {
            map.add(gid, gid + 1000);
        }
        assert_eq!(map.bucket_count(), 3);
        assert_eq!(map.lookup(0), Some(1000));
        assert_eq!(map.lookup(256), Some(1256));
    }

    #[test]
    fn test_newest_mapping_wins() {
        let mut map = IdMap::new();
        map.add(5, 10);
        for gid in 100..300 {
            map.add(gid, gid);
        }
        map.add(5, 11);
        assert_eq!(map.lookup(5), Some(11));
    }

    #[test]
    fn test_clear() {
        let mut map = IdMap::new();
        map.add(1, 2);
        map.clear();
        assert!(map.is_empty());
        assert_eq!(map.lookup(1), None);
    }
}
