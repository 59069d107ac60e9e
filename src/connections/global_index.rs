use crate::connections::record::{GlobalId, InternalId};

/// Number of bucket heads in the hash table (§4.2).
const NUM_BUCKETS: usize = 65_535;

/// Sentinel "no next node" / "empty bucket" pointer.
const NIL: u32 = u32::MAX;

#[derive(Clone, Copy)]
struct Node {
    internal_id: InternalId,
    next: u32,
}

/// Maps upstream [`GlobalId`] strings to the [`InternalId`] assigned to them.
///
/// A fixed array of bucket heads points into a flat linked-list pool (§4.2).
/// Insertion always appends a new node to the front of its bucket's chain;
/// `addOrUpdate` on an existing id therefore never touches this structure —
/// looking the id up again walks the same chain to the same node.
#[derive(Default, Clone)]
pub struct GlobalIdIndex {
    buckets: Vec<u32>,
    pool: Vec<Node>,
}

impl GlobalIdIndex {
    pub fn new() -> Self {
        Self {
            buckets: vec![NIL; NUM_BUCKETS],
            pool: Vec::new(),
        }
    }

    /// The classical 23·31 rolling polynomial, reduced modulo the bucket count.
    fn hash(s: &str) -> usize {
        let mut h: u32 = 23;
        for byte in s.bytes() {
            h = h.wrapping_mul(31).wrapping_add(byte as u32);
        }
        (h as usize) % NUM_BUCKETS
    }

    /// Looks up `s`, verifying candidates against `resolve` (the db's
    /// parallel `globalIds` array) since this index only ever stores hashes.
    pub fn lookup(&self, s: &str, resolve: impl Fn(InternalId) -> GlobalId) -> Option<InternalId> {
        let bucket = Self::hash(s);
        let mut cursor = self.buckets[bucket];
        while cursor != NIL {
            let node = &self.pool[cursor as usize];
            if &*resolve(node.internal_id) == s {
                return Some(node.internal_id);
            }
            cursor = node.next;
        }
        None
    }

    /// Appends a new (id, globalId-hash) mapping. Never removes or rewrites
    /// an existing node; callers are expected to have already checked
    /// [`lookup`](Self::lookup) returned `None`.
    pub fn insert(&mut self, s: &str, internal_id: InternalId) {
        let bucket = Self::hash(s);
        let node_idx = self.pool.len() as u32;
        self.pool.push(Node {
            internal_id,
            next: self.buckets[bucket],
        });
        self.buckets[bucket] = node_idx;
    }

    /// The bucket-head array, little-endian u32 per bucket (§6 `globalIdBucketHeads`).
    pub fn bucket_heads_bytes(&self) -> Vec<u8> {
        self.buckets.iter().flat_map(|b| b.to_le_bytes()).collect()
    }

    /// The flat node pool, little-endian `(internal_id, next)` pairs per node
    /// (§6 `globalIdLinkedList`).
    pub fn pool_bytes(&self) -> Vec<u8> {
        self.pool
            .iter()
            .flat_map(|n| {
                let mut out = n.internal_id.to_le_bytes().to_vec();
                out.extend(n.next.to_le_bytes());
                out
            })
            .collect()
    }

    pub fn pool_len(&self) -> u32 {
        self.pool.len() as u32
    }

    /// Rebuilds an index from its wire-format parts (§6). `pool_len` is
    /// `globalIdLinkedListPointer`, the number of valid nodes in `pool_bytes`.
    pub fn from_parts(bucket_heads: &[u8], pool_bytes: &[u8], pool_len: u32) -> Self {
        let buckets: Vec<u32> = bucket_heads
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes(c.try_into().unwrap()))
            .collect();
        let pool: Vec<Node> = pool_bytes
            .chunks_exact(8)
            .take(pool_len as usize)
            .map(|c| Node {
                internal_id: u32::from_le_bytes(c[0..4].try_into().unwrap()),
                next: u32::from_le_bytes(c[4..8].try_into().unwrap()),
            })
            .collect();
        Self { buckets, pool }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn insert_then_lookup() {
        let mut index = GlobalIdIndex::new();
        let ids: Vec<GlobalId> = vec![Arc::from("a:1"), Arc::from("a:2"), Arc::from("b:1")];
        for (i, id) in ids.iter().enumerate() {
            index.insert(id, i as u32);
        }
        let resolve = |i: InternalId| ids[i as usize].clone();
        assert_eq!(index.lookup("a:1", resolve.clone()), Some(0));
        assert_eq!(index.lookup("a:2", resolve.clone()), Some(1));
        assert_eq!(index.lookup("b:1", resolve.clone()), Some(2));
        assert_eq!(index.lookup("missing", resolve), None);
    }

    #[test]
    fn hash_collisions_still_resolve_by_exact_match() {
        let mut index = GlobalIdIndex::new();
        // force a shared bucket by inserting the same key into a tiny modulus
        // is not directly testable from outside, but we can still assert many
        // distinct keys all resolve correctly even if some collide.
        let ids: Vec<GlobalId> = (0..5000).map(|i| Arc::from(format!("id:{i}"))).collect();
        for (i, id) in ids.iter().enumerate() {
            index.insert(id, i as u32);
        }
        let resolve = |i: InternalId| ids[i as usize].clone();
        for (i, id) in ids.iter().enumerate() {
            assert_eq!(index.lookup(id, resolve.clone()), Some(i as u32));
        }
    }
}
