use crate::id::NodeId;
use crate::node::TableNode;

/// One ordered, capacity-bounded peer list.
///
/// Order encodes recency of contact: least-recently-seen at the head,
/// most-recently-seen at the tail. There is no replacement cache and no
/// eviction; a full bucket rejects inserts.
#[derive(Debug, Clone)]
struct Bucket<N> {
    nodes: Vec<N>,
}

impl<N: TableNode> Bucket<N> {
    fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    fn position(&self, id: &NodeId) -> Option<usize> {
        self.nodes.iter().position(|n| n.id() == id)
    }

    fn remove(&mut self, id: &NodeId) -> Option<N> {
        self.position(id).map(|pos| self.nodes.remove(pos))
    }
}

/// A single XOR-distance bucket table over the full identifier space.
///
/// Holds `bit_len + 1` buckets relative to one local identifier; an
/// identifier's bucket is its shared-prefix length with the local
/// identifier, so the extra last bucket is reserved for the local
/// identifier itself.
#[derive(Debug, Clone)]
pub struct Table<N: TableNode> {
    local_id: NodeId,
    bucket_size: usize,
    buckets: Vec<Bucket<N>>,
}

impl<N: TableNode> Table<N> {
    pub fn new(local_id: NodeId, bucket_size: usize) -> Self {
        let bucket_count = local_id.bit_len() + 1;
        let buckets = (0..bucket_count).map(|_| Bucket::new()).collect();

        Self {
            local_id,
            bucket_size,
            buckets,
        }
    }

    pub fn local_id(&self) -> &NodeId {
        &self.local_id
    }

    pub fn bucket_size(&self) -> usize {
        self.bucket_size
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// The bucket `id` falls into, relative to the local identifier.
    pub fn bucket_index(&self, id: &NodeId) -> usize {
        self.local_id.bucket_index(id)
    }

    /// Inserts a node at the tail of its bucket.
    ///
    /// Returns false without mutating when the bucket is full. Re-adding
    /// a present identifier replaces the record and moves it to the tail.
    pub fn add(&mut self, node: N) -> bool {
        let i = self.local_id.bucket_index(node.id());
        let bucket = &mut self.buckets[i];

        if let Some(pos) = bucket.position(node.id()) {
            bucket.nodes.remove(pos);
            bucket.nodes.push(node);
            return true;
        }

        if bucket.nodes.len() >= self.bucket_size {
            return false;
        }

        bucket.nodes.push(node);
        true
    }

    pub fn has(&self, id: &NodeId) -> bool {
        self.has_in_bucket(id, self.bucket_index(id))
    }

    /// Like [`has`](Self::has) with a precomputed bucket index, so
    /// callers probing several tables compute the index once.
    pub fn has_in_bucket(&self, id: &NodeId, i: usize) -> bool {
        self.buckets[i].position(id).is_some()
    }

    pub fn get(&self, id: &NodeId) -> Option<&N> {
        self.get_in_bucket(id, self.bucket_index(id))
    }

    pub fn get_in_bucket(&self, id: &NodeId, i: usize) -> Option<&N> {
        let bucket = &self.buckets[i];
        bucket.position(id).map(|pos| &bucket.nodes[pos])
    }

    /// Removes an identifier. Removing an absent identifier is a no-op.
    pub fn remove(&mut self, id: &NodeId) {
        self.remove_in_bucket(id, self.bucket_index(id));
    }

    pub fn remove_in_bucket(&mut self, id: &NodeId, i: usize) {
        self.buckets[i].remove(id);
    }

    /// Replaces the record for `node.id()` in bucket `i`, preserving its
    /// position. Returns false if the identifier is not present.
    pub fn replace_in_bucket(&mut self, node: N, i: usize) -> bool {
        let bucket = &mut self.buckets[i];
        match bucket.position(node.id()) {
            Some(pos) => {
                bucket.nodes[pos] = node;
                true
            }
            None => false,
        }
    }

    /// Moves an identifier to the tail of bucket `i`, marking it
    /// most-recently-seen. Returns false if the identifier is not there.
    pub fn move_to_tail(&mut self, id: &NodeId, i: usize) -> bool {
        let bucket = &mut self.buckets[i];
        match bucket.remove(id) {
            Some(node) => {
                bucket.nodes.push(node);
                true
            }
            None => false,
        }
    }

    /// Up to `limit` nodes ranked by ascending XOR distance to `id`.
    pub fn closest(&self, id: &NodeId, limit: usize) -> Vec<N> {
        let mut candidates: Vec<(Vec<u8>, N)> = self
            .buckets
            .iter()
            .flat_map(|bucket| bucket.nodes.iter())
            .map(|node| (node.id().distance(id), node.clone()))
            .collect();

        candidates.sort_by(|a, b| a.0.cmp(&b.0));
        candidates.truncate(limit);
        candidates.into_iter().map(|(_, node)| node).collect()
    }

    /// Read-only view of every bucket's ordered peer list.
    pub fn buckets(&self) -> impl Iterator<Item = &[N]> + '_ {
        self.buckets.iter().map(|bucket| bucket.nodes.as_slice())
    }

    /// All nodes, flattened across buckets.
    pub fn nodes(&self) -> Vec<N> {
        self.buckets
            .iter()
            .flat_map(|bucket| bucket.nodes.iter().cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.nodes.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(|bucket| bucket.nodes.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct TestPeer {
        id: NodeId,
    }

    fn peer(bytes: &[u8]) -> TestPeer {
        TestPeer {
            id: NodeId::from_bytes(bytes).unwrap(),
        }
    }

    fn table(bucket_size: usize) -> Table<TestPeer> {
        Table::new(NodeId::from_bytes(&[0x00, 0x00]).unwrap(), bucket_size)
    }

    impl TableNode for TestPeer {
        fn id(&self) -> &NodeId {
            &self.id
        }
    }

    #[test]
    fn test_bucket_count() {
        let table = table(20);
        assert_eq!(table.bucket_count(), 17);
    }

    #[test]
    fn test_add_get_roundtrip() {
        let mut table = table(20);
        let p = peer(&[0x12, 0x34]);

        assert!(table.add(p.clone()));
        assert_eq!(table.get(&p.id), Some(&p));
        assert!(table.has(&p.id));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_add_full_bucket_rejected() {
        let mut table = table(2);

        // All three share bucket 0 (first bit differs from the local id).
        assert!(table.add(peer(&[0x80, 0x01])));
        assert!(table.add(peer(&[0x80, 0x02])));
        assert!(!table.add(peer(&[0x80, 0x03])));

        assert_eq!(table.len(), 2);
        assert!(!table.has(&NodeId::from_bytes(&[0x80, 0x03]).unwrap()));
    }

    #[test]
    fn test_re_add_moves_to_tail() {
        let mut table = table(20);
        let a = peer(&[0x80, 0x01]);
        let b = peer(&[0x80, 0x02]);

        table.add(a.clone());
        table.add(b.clone());
        table.add(a.clone());

        let bucket: Vec<_> = table.buckets().next().unwrap().to_vec();
        assert_eq!(bucket, vec![b, a]);
    }

    #[test]
    fn test_remove_idempotent() {
        let mut table = table(20);
        let p = peer(&[0x80, 0x01]);

        table.add(p.clone());
        table.remove(&p.id);
        assert!(!table.has(&p.id));

        // Removing again is a no-op.
        table.remove(&p.id);
        assert!(table.is_empty());
    }

    #[test]
    fn test_move_to_tail() {
        let mut table = table(20);
        let a = peer(&[0x80, 0x01]);
        let b = peer(&[0x80, 0x02]);
        let c = peer(&[0x80, 0x03]);

        table.add(a.clone());
        table.add(b.clone());
        table.add(c.clone());

        let i = table.bucket_index(&a.id);
        assert!(table.move_to_tail(&a.id, i));

        let bucket: Vec<_> = table.buckets().next().unwrap().to_vec();
        assert_eq!(bucket, vec![b, c, a]);

        assert!(!table.move_to_tail(&NodeId::from_bytes(&[0x80, 0x7F]).unwrap(), i));
    }

    #[test]
    fn test_replace_preserves_position() {
        let mut table = table(20);
        let a = peer(&[0x80, 0x01]);
        let b = peer(&[0x80, 0x02]);

        table.add(a.clone());
        table.add(b.clone());

        let i = table.bucket_index(&a.id);
        assert!(table.replace_in_bucket(a.clone(), i));

        let bucket: Vec<_> = table.buckets().next().unwrap().to_vec();
        assert_eq!(bucket[0].id, a.id);
    }

    #[test]
    fn test_closest_ascending_distance() {
        let mut table = table(20);
        let target = NodeId::from_bytes(&[0x00, 0x00]).unwrap();

        table.add(peer(&[0x00, 0xFF]));
        table.add(peer(&[0x00, 0x01]));
        table.add(peer(&[0xFF, 0x00]));
        table.add(peer(&[0x00, 0x0F]));

        let closest = table.closest(&target, 3);
        assert_eq!(closest.len(), 3);
        assert_eq!(closest[0].id.as_bytes(), &[0x00, 0x01]);
        assert_eq!(closest[1].id.as_bytes(), &[0x00, 0x0F]);
        assert_eq!(closest[2].id.as_bytes(), &[0x00, 0xFF]);
    }

    #[test]
    fn test_nodes_flattened() {
        let mut table = table(20);
        table.add(peer(&[0x80, 0x01]));
        table.add(peer(&[0x40, 0x01]));
        table.add(peer(&[0x20, 0x01]));

        assert_eq!(table.nodes().len(), 3);
        assert_eq!(table.len(), 3);
    }
}
