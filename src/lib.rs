//! ktables - quality-partitioned Kademlia routing tables
//!
//! This library provides the routing-table layer for a Kademlia-style
//! DHT peer directory. Peers are split across several parallel bucket
//! tables by a caller-supplied classifier (for example by observed
//! latency), and closest-peer queries merge results across those tables
//! with a search window that widens as lower-preference tables are
//! consulted, so nearby peers in preferred tables win over distant ones.
//!
//! # Modules
//!
//! - [`id`] - Node identifiers, XOR distance, bucket placement
//! - [`node`] - The generic peer-record trait
//! - [`table`] - A single XOR-distance bucket table
//! - [`tables`] - The partitioned multi-table structure and merge
//! - [`config`] - Construction options
//!
//! # Examples
//!
//! ```
//! use ktables::{KademliaTables, NodeId, TableNode, TablesConfig};
//!
//! #[derive(Clone)]
//! struct Peer {
//!     id: NodeId,
//!     ping_ms: u32,
//! }
//!
//! impl TableNode for Peer {
//!     fn id(&self) -> &NodeId {
//!         &self.id
//!     }
//! }
//!
//! // Faster peers go to lower table indices.
//! let classify = |peer: &Peer| {
//!     if peer.ping_ms < 50 {
//!         0
//!     } else if peer.ping_ms < 150 {
//!         1
//!     } else {
//!         2
//!     }
//! };
//!
//! let mut tables =
//!     KademliaTables::new("local-node-id", classify, TablesConfig::default()).unwrap();
//!
//! let peer = Peer { id: NodeId::random(13), ping_ms: 20 };
//! assert!(tables.add(peer.clone()));
//! assert_eq!(tables.closest(peer.id(), 3).len(), 1);
//! ```

pub mod config;
pub mod error;
pub mod id;
pub mod node;
pub mod table;
pub mod tables;

pub use config::{
    TablesConfig, DEFAULT_BUCKET_SIZE, DEFAULT_PREFERENCE_FACTOR, DEFAULT_TABLE_COUNT,
};
pub use error::TablesError;
pub use id::{IdEncoding, NodeId};
pub use node::TableNode;
pub use table::Table;
pub use tables::KademliaTables;
