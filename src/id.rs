use std::cmp::Ordering;
use std::fmt;

use bytes::Bytes;
use rand::Rng as _;

use crate::error::TablesError;

/// How a string identifier is decoded into bytes.
///
/// Only affects construction; all distance math operates on the decoded
/// bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdEncoding {
    /// The string's raw UTF-8 bytes are the identifier.
    #[default]
    Utf8,
    /// The string is lowercase/uppercase hex, two characters per byte.
    Hex,
}

/// A fixed-length binary identifier for a peer or the local node.
///
/// All identifiers within one routing structure share the local
/// identifier's length. Distance and bucket placement are computed
/// relative to the local identifier via XOR.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct NodeId(Bytes);

impl NodeId {
    /// Creates an identifier from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TablesError> {
        if bytes.is_empty() {
            return Err(TablesError::EmptyId);
        }
        Ok(Self(Bytes::copy_from_slice(bytes)))
    }

    /// Decodes a string identifier under the given encoding.
    pub fn from_str_encoded(s: &str, encoding: IdEncoding) -> Result<Self, TablesError> {
        let bytes = match encoding {
            IdEncoding::Utf8 => s.as_bytes().to_vec(),
            IdEncoding::Hex => hex::decode(s)?,
        };
        if bytes.is_empty() {
            return Err(TablesError::EmptyId);
        }
        Ok(Self(Bytes::from(bytes)))
    }

    /// Generates a random identifier of `byte_len` bytes.
    pub fn random(byte_len: usize) -> Self {
        let mut id = vec![0u8; byte_len];
        rand::rng().fill(&mut id[..]);
        Self(Bytes::from(id))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn byte_len(&self) -> usize {
        self.0.len()
    }

    pub fn bit_len(&self) -> usize {
        self.0.len() * 8
    }

    /// Byte-wise XOR distance to another identifier.
    ///
    /// Both identifiers must have the same length; comparing distances of
    /// equal-length identifiers byte-wise is equivalent to comparing the
    /// XOR metric numerically.
    pub fn distance(&self, other: &NodeId) -> Vec<u8> {
        debug_assert_eq!(self.0.len(), other.0.len(), "identifier length mismatch");
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| a ^ b)
            .collect()
    }

    /// The bucket an identifier falls into relative to `self`: the number
    /// of leading zero bits of the XOR distance (the shared prefix
    /// length). Equal identifiers map to `bit_len()`, so the full range
    /// is `[0, bit_len()]`.
    pub fn bucket_index(&self, other: &NodeId) -> usize {
        debug_assert_eq!(self.0.len(), other.0.len(), "identifier length mismatch");
        for (i, (a, b)) in self.0.iter().zip(other.0.iter()).enumerate() {
            let x = a ^ b;
            if x != 0 {
                return i * 8 + x.leading_zeros() as usize;
            }
        }
        self.bit_len()
    }

    /// Returns a comparator ranking identifiers by XOR proximity to
    /// `target` (closest first), for use with `sort_by`.
    pub fn distance_cmp(target: &NodeId) -> impl Fn(&NodeId, &NodeId) -> Ordering + '_ {
        move |a, b| a.distance(target).cmp(&b.distance(target))
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bytes() {
        let id = NodeId::from_bytes(&[1, 2, 3]).unwrap();
        assert_eq!(id.as_bytes(), &[1, 2, 3]);
        assert_eq!(id.byte_len(), 3);
        assert_eq!(id.bit_len(), 24);
    }

    #[test]
    fn test_from_bytes_empty() {
        assert!(NodeId::from_bytes(&[]).is_err());
    }

    #[test]
    fn test_from_str_utf8() {
        let id = NodeId::from_str_encoded("abcd", IdEncoding::Utf8).unwrap();
        assert_eq!(id.as_bytes(), b"abcd");
    }

    #[test]
    fn test_from_str_hex() {
        let id = NodeId::from_str_encoded("ff00", IdEncoding::Hex).unwrap();
        assert_eq!(id.as_bytes(), &[0xFF, 0x00]);
    }

    #[test]
    fn test_from_str_hex_invalid() {
        assert!(NodeId::from_str_encoded("zz", IdEncoding::Hex).is_err());
    }

    #[test]
    fn test_random_distinct() {
        let id1 = NodeId::random(20);
        let id2 = NodeId::random(20);
        assert_ne!(id1, id2);
        assert_eq!(id1.byte_len(), 20);
    }

    #[test]
    fn test_distance() {
        let id1 = NodeId::from_bytes(&[0x00, 0x00]).unwrap();
        let id2 = NodeId::from_bytes(&[0xFF, 0x0F]).unwrap();
        assert_eq!(id1.distance(&id2), vec![0xFF, 0x0F]);
        assert_eq!(id1.distance(&id1), vec![0x00, 0x00]);
    }

    #[test]
    fn test_bucket_index() {
        let local = NodeId::from_bytes(&[0x00, 0x00]).unwrap();

        // First bit differs.
        let far = NodeId::from_bytes(&[0x80, 0x00]).unwrap();
        assert_eq!(local.bucket_index(&far), 0);

        // Last bit differs.
        let near = NodeId::from_bytes(&[0x00, 0x01]).unwrap();
        assert_eq!(local.bucket_index(&near), 15);

        // Equal identifiers land in the extra last bucket.
        assert_eq!(local.bucket_index(&local), 16);
    }

    #[test]
    fn test_distance_cmp() {
        let target = NodeId::from_bytes(&[0x00, 0x00]).unwrap();
        let mut ids = vec![
            NodeId::from_bytes(&[0xFF, 0x00]).unwrap(),
            NodeId::from_bytes(&[0x00, 0x01]).unwrap(),
            NodeId::from_bytes(&[0x0F, 0x00]).unwrap(),
        ];

        ids.sort_by(NodeId::distance_cmp(&target));

        assert_eq!(ids[0].as_bytes(), &[0x00, 0x01]);
        assert_eq!(ids[1].as_bytes(), &[0x0F, 0x00]);
        assert_eq!(ids[2].as_bytes(), &[0xFF, 0x00]);
    }

    #[test]
    fn test_display_hex() {
        let id = NodeId::from_bytes(&[0xAB, 0x01]).unwrap();
        assert_eq!(id.to_string(), "ab01");
    }
}
