//! Storage parts: persistable snapshots of a hierarchy index.
//!
//! ## Format
//!
//! ```text
//! magic:   [0x43, 0x48, 0x49, 0x58]  // "CHIX"
//! version: u8
//! payload: CBOR { index_id, item_index, roots, level_index, orphans }
//! ```
//!
//! The containers are stored exactly as published. Loading recomputes
//! nothing except the orphan set, which is sorted and deduplicated on
//! decode. Sibling order is trusted; run `verify` on the rebuilt index
//! before using a part from an untrusted source.

use crate::bitmap::Bitmap;
use crate::error::{CoreError, CoreResult};
use crate::hierarchy::node::{ItemIndex, LevelIndex, Roots};
use serde::{Deserialize, Serialize};

/// Magic bytes for storage parts: "CHIX"
const PART_MAGIC: [u8; 4] = [0x43, 0x48, 0x49, 0x58];

/// Current storage part format version.
const PART_VERSION: u8 = 1;

const HEADER_LEN: usize = PART_MAGIC.len() + 1;

/// Snapshot of every container of a hierarchy index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyStoragePart {
    /// Identifier assigned by the storage collaborator.
    pub index_id: u32,
    /// Every indexed node.
    pub item_index: ItemIndex,
    /// Ordered root keys.
    pub roots: Roots,
    /// Ordered children of every attached node.
    pub level_index: LevelIndex,
    /// Keys whose ancestry is incomplete.
    pub orphans: Bitmap,
}

impl HierarchyStoragePart {
    /// Encodes the part with its header.
    pub fn to_bytes(&self) -> CoreResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(HEADER_LEN + self.item_index.len() * 8);
        buf.extend_from_slice(&PART_MAGIC);
        buf.push(PART_VERSION);
        ciborium::ser::into_writer(self, &mut buf)
            .map_err(|e| CoreError::codec(format!("failed to encode storage part: {e}")))?;
        Ok(buf)
    }

    /// Decodes a part produced by [`to_bytes`](Self::to_bytes).
    pub fn from_bytes(data: &[u8]) -> CoreResult<Self> {
        if data.len() < HEADER_LEN {
            return Err(CoreError::codec("storage part too small"));
        }
        if data[..PART_MAGIC.len()] != PART_MAGIC {
            return Err(CoreError::codec("invalid storage part magic"));
        }
        let version = data[PART_MAGIC.len()];
        if version != PART_VERSION {
            return Err(CoreError::codec(format!(
                "unsupported storage part version: {version}"
            )));
        }
        ciborium::de::from_reader(&data[HEADER_LEN..])
            .map_err(|e| CoreError::codec(format!("failed to decode storage part: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::{HierarchyIndex, HierarchyNode};
    use crate::transaction::TransactionContext;

    /// Same field layout as a storage part, with a raw orphan list.
    #[derive(Serialize)]
    struct RawPart {
        index_id: u32,
        item_index: ItemIndex,
        roots: Roots,
        level_index: LevelIndex,
        orphans: Vec<i32>,
    }

    fn encode_raw(raw: &RawPart) -> Vec<u8> {
        let mut buf = PART_MAGIC.to_vec();
        buf.push(PART_VERSION);
        ciborium::ser::into_writer(raw, &mut buf).unwrap();
        buf
    }

    fn sample() -> HierarchyStoragePart {
        let nodes = [
            HierarchyNode::new(10, None, 1),
            HierarchyNode::new(20, Some(10), 1),
            HierarchyNode::new(30, Some(10), 2),
            HierarchyNode::new(40, Some(99), 0),
        ];
        HierarchyStoragePart {
            index_id: 3,
            item_index: nodes.iter().map(|n| (n.entity_key, *n)).collect(),
            roots: vec![10],
            level_index: [(10, vec![20, 30]), (20, vec![]), (30, vec![])]
                .into_iter()
                .collect(),
            orphans: Bitmap::from(vec![40]),
        }
    }

    #[test]
    fn encoded_part_decodes_unchanged() {
        let part = sample();
        let bytes = part.to_bytes().unwrap();
        assert_eq!(&bytes[..4], b"CHIX");
        assert_eq!(HierarchyStoragePart::from_bytes(&bytes).unwrap(), part);
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut bytes = sample().to_bytes().unwrap();
        bytes[0] = b'X';
        let err = HierarchyStoragePart::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, CoreError::Codec { .. }));
    }

    #[test]
    fn unknown_version_is_rejected() {
        let mut bytes = sample().to_bytes().unwrap();
        bytes[4] = 9;
        assert!(HierarchyStoragePart::from_bytes(&bytes).is_err());
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let bytes = sample().to_bytes().unwrap();
        assert!(HierarchyStoragePart::from_bytes(&bytes[..3]).is_err());
        assert!(HierarchyStoragePart::from_bytes(&bytes[..bytes.len() - 2]).is_err());
    }

    #[test]
    fn unsorted_orphans_are_normalized_on_decode() {
        let raw = RawPart {
            index_id: 1,
            item_index: [
                HierarchyNode::new(2, Some(1), 0),
                HierarchyNode::new(9, Some(1), 0),
            ]
            .into_iter()
            .map(|n| (n.entity_key, n))
            .collect(),
            roots: vec![],
            level_index: LevelIndex::new(),
            orphans: vec![9, 2, 9],
        };
        let part = HierarchyStoragePart::from_bytes(&encode_raw(&raw)).unwrap();
        assert_eq!(part.orphans.as_slice(), &[2, 9]);

        let index = HierarchyIndex::from_storage_part(part);
        index.view(None).verify().unwrap();

        let ctx = TransactionContext::new();
        let mut txn = ctx.begin();
        index.set_hierarchy_for(&mut txn, 1, None, 0).unwrap();
        let view = index.view(Some(&txn));
        assert_eq!(view.children_of(1), &[2, 9]);
        assert!(view.orphans().is_empty());
        view.verify().unwrap();
    }
}
