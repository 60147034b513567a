use crate::id::NodeId;

/// A peer record stored in the routing tables.
///
/// The record's shape beyond its identifier is caller-defined; the
/// routing layer only ever reads the identifier. Any other attribute
/// (latency, reliability, transport address) is the business of the
/// caller and its classifier.
///
/// Records are cloned on insertion and update, so implementors should
/// keep them cheap to clone.
pub trait TableNode: Clone {
    /// The peer's identifier.
    fn id(&self) -> &NodeId;
}
