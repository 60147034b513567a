use tracing::debug;

use crate::config::TablesConfig;
use crate::error::TablesError;
use crate::id::NodeId;
use crate::node::TableNode;
use crate::table::Table;

type Classifier<N> = Box<dyn Fn(&N) -> usize + Send + Sync>;

/// A set of parallel routing tables partitioned by peer quality.
///
/// Peers are spread across `table_count` single tables by a
/// caller-supplied classifier; each identifier lives in at most one
/// (table, bucket) slot at a time. Lookups probe every table at the
/// shared bucket index, and [`closest`](Self::closest) merges per-table
/// closest queries with a search window that widens geometrically as
/// lower-preference tables are consulted.
///
/// The structure is a plain in-memory value with no internal locking;
/// concurrent mutation needs external synchronization.
pub struct KademliaTables<N: TableNode> {
    local_id: NodeId,
    bucket_size: usize,
    bucket_count: usize,
    preference_factor: usize,
    tables: Vec<Table<N>>,
    classify: Classifier<N>,
}

impl<N: TableNode> KademliaTables<N> {
    /// Builds the structure from a string identifier, decoding it under
    /// the configured encoding.
    ///
    /// The classifier must map every record to a table index in
    /// `[0, table_count)` and must be stable: the same record always
    /// classifies to the same table.
    pub fn new(
        id: &str,
        classify: impl Fn(&N) -> usize + Send + Sync + 'static,
        config: TablesConfig,
    ) -> Result<Self, TablesError> {
        let local_id = NodeId::from_str_encoded(id, config.encoding)?;
        Ok(Self::with_node_id(local_id, classify, config))
    }

    /// Builds the structure from an already-decoded identifier.
    pub fn with_node_id(
        local_id: NodeId,
        classify: impl Fn(&N) -> usize + Send + Sync + 'static,
        config: TablesConfig,
    ) -> Self {
        let tables = (0..config.table_count)
            .map(|_| Table::new(local_id.clone(), config.bucket_size))
            .collect();

        Self {
            bucket_count: local_id.bit_len() + 1,
            bucket_size: config.bucket_size,
            preference_factor: config.preference_factor,
            local_id,
            tables,
            classify: Box::new(classify),
        }
    }

    pub fn local_id(&self) -> &NodeId {
        &self.local_id
    }

    pub fn bucket_size(&self) -> usize {
        self.bucket_size
    }

    pub fn bucket_count(&self) -> usize {
        self.bucket_count
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn preference_factor(&self) -> usize {
        self.preference_factor
    }

    /// Read-only view of the underlying tables, in table order.
    pub fn tables(&self) -> &[Table<N>] {
        &self.tables
    }

    /// The bucket `id` falls into; shared across all tables, since it
    /// depends only on the local identifier.
    pub fn bucket_index(&self, id: &NodeId) -> usize {
        self.local_id.bucket_index(id)
    }

    /// Inserts a node into the table chosen by the classifier.
    ///
    /// Returns false without side effects when the target bucket is
    /// full. There is no cross-table fallback: a full bucket in the
    /// classified table fails the insert even if another table has room.
    pub fn add(&mut self, node: N) -> bool {
        let ti = (self.classify)(&node);
        self.add_to_table(node, ti)
    }

    /// Inserts a node into an explicit table, bypassing the classifier.
    pub fn add_to_table(&mut self, node: N, ti: usize) -> bool {
        let inserted = self.tables[ti].add(node);
        if !inserted {
            debug!("insert rejected by full bucket in table {}", ti);
        }
        inserted
    }

    pub fn has(&self, id: &NodeId) -> bool {
        let i = self.bucket_index(id);
        self.tables.iter().any(|table| table.has_in_bucket(id, i))
    }

    /// The record for `id`, if any table holds it. At most one table can,
    /// so the first match in table order is the match.
    pub fn get(&self, id: &NodeId) -> Option<&N> {
        let i = self.bucket_index(id);
        self.tables
            .iter()
            .find_map(|table| table.get_in_bucket(id, i))
    }

    /// Applies a field update to the record for `id` and re-routes it if
    /// its classification changed.
    ///
    /// The closure receives a copy of the stored record and must not
    /// change its identifier. If the updated record classifies into the
    /// same table, it is replaced in place, keeping its bucket position.
    /// If the classification changed, the record is removed and
    /// re-inserted into the new table at the tail, under ordinary
    /// insertion semantics: when the destination bucket is full the
    /// insert fails silently and the record is dropped from the
    /// structure entirely. Callers that cannot tolerate losing the
    /// record should check [`has`](Self::has) afterwards and re-add.
    ///
    /// Returns the updated record, or None when `id` is unknown.
    pub fn update(&mut self, id: &NodeId, apply: impl FnOnce(&mut N)) -> Option<N> {
        let i = self.bucket_index(id);
        let ti = self.owning_table(id, i)?;

        let mut updated = self.tables[ti].get_in_bucket(id, i)?.clone();
        apply(&mut updated);
        debug_assert_eq!(updated.id(), id, "update must not change the identifier");

        let new_ti = (self.classify)(&updated);
        if new_ti != ti {
            self.remove(id);
            if !self.add_to_table(updated.clone(), new_ti) {
                debug!("node {} dropped moving from table {} to {}", id, ti, new_ti);
            }
            return Some(updated);
        }

        self.tables[ti].replace_in_bucket(updated.clone(), i);
        Some(updated)
    }

    /// Marks `id` most-recently-seen by moving it to the tail of its
    /// bucket. Returns false when the identifier is unknown.
    pub fn seen(&mut self, id: &NodeId) -> bool {
        let i = self.bucket_index(id);
        match self.owning_table(id, i) {
            Some(ti) => self.tables[ti].move_to_tail(id, i),
            None => false,
        }
    }

    /// Removes `id` from whichever table holds it. Always succeeds;
    /// removing an absent identifier is a no-op.
    pub fn remove(&mut self, id: &NodeId) -> bool {
        let i = self.bucket_index(id);
        for table in &mut self.tables {
            table.remove_in_bucket(id, i);
        }
        true
    }

    /// Up to `limit` peers ranked by a blend of table preference and XOR
    /// proximity to `id`.
    ///
    /// An exact match is always the first result. The remaining slots
    /// come from a cross-table search that starts unrestricted at the
    /// highest table index and widens a bucket-offset window by
    /// `preference_factor` as it walks down, so distant peers are only
    /// admitted from less-preferred tables once nearer peers in
    /// more-preferred tables are exhausted.
    pub fn closest(&self, id: &NodeId, limit: usize) -> Vec<N> {
        if limit == 0 {
            return Vec::new();
        }

        let exact = self.get(id).cloned();

        let mut collected = self.collect_closest(id, limit);
        collected.reverse();
        collected.truncate(limit);

        match exact {
            Some(node) => {
                let mut result = vec![node];
                result.extend(
                    collected
                        .into_iter()
                        .filter(|candidate| candidate.id() != id)
                        .take(limit.saturating_sub(1)),
                );
                result
            }
            None => collected,
        }
    }

    /// The descending walk over tables behind [`closest`](Self::closest).
    ///
    /// Candidates accumulate from the highest table index down to 0, each
    /// step filtered to a bucket-offset window around `id`'s own bucket.
    /// The first step's window is the whole bucket range; each later
    /// window is the larger of (max accepted offset so far, floored at 1,
    /// times `preference_factor`) and double the previous window.
    fn collect_closest(&self, id: &NodeId, limit: usize) -> Vec<N> {
        let i0 = self.bucket_index(id);
        let mut collected = Vec::new();
        let mut window: Option<usize> = None;

        for ti in (0..self.tables.len()).rev() {
            let boundary = window.unwrap_or(self.bucket_count);
            let mut max_offset: Option<usize> = None;

            for node in self.tables[ti].closest(id, limit) {
                let offset = i0.abs_diff(self.bucket_index(node.id()));
                if offset <= boundary {
                    max_offset = Some(max_offset.map_or(offset, |m| m.max(offset)));
                    collected.push(node);
                }
            }

            if ti > 0 {
                let grown = max_offset.unwrap_or(0).max(1) * self.preference_factor;
                window = Some(grown.max(window.unwrap_or(1) * 2));
            }
        }

        collected
    }

    /// All buckets across all tables, in table order.
    pub fn buckets(&self) -> impl Iterator<Item = &[N]> + '_ {
        self.tables.iter().flat_map(|table| table.buckets())
    }

    /// All nodes, flattened across tables.
    pub fn nodes(&self) -> Vec<N> {
        self.tables.iter().flat_map(|table| table.nodes()).collect()
    }

    pub fn len(&self) -> usize {
        self.tables.iter().map(|table| table.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.iter().all(|table| table.is_empty())
    }

    fn owning_table(&self, id: &NodeId, i: usize) -> Option<usize> {
        (0..self.tables.len()).find(|&ti| self.tables[ti].has_in_bucket(id, i))
    }
}
