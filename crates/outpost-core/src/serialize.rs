//! Binary snapshots of a whole colony.
//!
//! Snapshots are bitcode-encoded behind a versioned header. They capture
//! everything a save does plus the catalogue and configuration, and are
//! meant for quick save slots, replays and desync checks rather than
//! long-term storage.

use crate::colony::Colony;
use crate::fixed::Turns;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a colony snapshot.
pub const SNAPSHOT_MAGIC: u32 = 0x0D5C_0001;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
}

#[derive(Debug, thiserror::Error)]
pub enum RestoreError {
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SNAPSHOT_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("snapshot from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
}

// ---------------------------------------------------------------------------
// Snapshot header
// ---------------------------------------------------------------------------

/// Header carried by every snapshot, checked before the colony is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub magic: u32,
    pub version: u32,
    /// Turn the snapshot was taken on.
    pub turn: Turns,
}

impl SnapshotHeader {
    pub fn new(turn: Turns) -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
            turn,
        }
    }

    pub fn validate(&self) -> Result<(), RestoreError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(RestoreError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(RestoreError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(RestoreError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ColonySnapshot {
    header: SnapshotHeader,
    colony: Colony,
    state_hash: u64,
}

/// Decode only far enough to read the header.
///
/// bitcode has no partial decoding, so this decodes the full snapshot.
pub fn read_snapshot_header(data: &[u8]) -> Result<SnapshotHeader, RestoreError> {
    let snapshot: ColonySnapshot =
        bitcode::deserialize(data).map_err(|e| RestoreError::Decode(e.to_string()))?;
    Ok(snapshot.header)
}

impl Colony {
    /// Encode the colony to a binary snapshot.
    pub fn snapshot(&self) -> Result<Vec<u8>, SnapshotError> {
        let snapshot = ColonySnapshot {
            header: SnapshotHeader::new(self.sim.turn),
            colony: self.clone(),
            state_hash: self.state_hash(),
        };
        bitcode::serialize(&snapshot).map_err(|e| SnapshotError::Encode(e.to_string()))
    }

    /// Decode a colony from a snapshot, validating the header first.
    pub fn restore(data: &[u8]) -> Result<Colony, RestoreError> {
        let snapshot: ColonySnapshot =
            bitcode::deserialize(data).map_err(|e| RestoreError::Decode(e.to_string()))?;
        snapshot.header.validate()?;
        let colony = snapshot.colony;
        if colony.state_hash() != snapshot.state_hash {
            return Err(RestoreError::Decode(format!(
                "state hash mismatch: expected {:016X}, got {:016X}",
                snapshot.state_hash,
                colony.state_hash()
            )));
        }
        Ok(colony)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    fn encode_with_header(header: SnapshotHeader) -> Vec<u8> {
        let colony = test_colony();
        let state_hash = colony.state_hash();
        bitcode::serialize(&ColonySnapshot {
            header,
            colony,
            state_hash,
        })
        .unwrap()
    }

    #[test]
    fn snapshot_round_trip() {
        let (mut colony, _) = starter_colony();
        for _ in 0..4 {
            colony.advance_turn();
        }
        let data = colony.snapshot().unwrap();
        let mut restored = Colony::restore(&data).unwrap();
        assert_eq!(restored.state_hash(), colony.state_hash());

        colony.advance_turn();
        restored.advance_turn();
        assert_eq!(restored.state_hash(), colony.state_hash());
    }

    #[test]
    fn header_records_turn() {
        let (mut colony, _) = starter_colony();
        colony.advance_turn();
        colony.advance_turn();
        let header = read_snapshot_header(&colony.snapshot().unwrap()).unwrap();
        assert_eq!(header, SnapshotHeader::new(2));
    }

    #[test]
    fn rejects_bad_magic() {
        let data = encode_with_header(SnapshotHeader {
            magic: 0xDEAD_BEEF,
            ..SnapshotHeader::new(0)
        });
        assert!(matches!(
            Colony::restore(&data),
            Err(RestoreError::InvalidMagic(0xDEAD_BEEF))
        ));
    }

    #[test]
    fn rejects_other_versions() {
        let data = encode_with_header(SnapshotHeader {
            version: FORMAT_VERSION + 1,
            ..SnapshotHeader::new(0)
        });
        assert!(matches!(
            Colony::restore(&data),
            Err(RestoreError::FutureVersion(_))
        ));

        let data = encode_with_header(SnapshotHeader {
            version: 0,
            ..SnapshotHeader::new(0)
        });
        assert!(matches!(
            Colony::restore(&data),
            Err(RestoreError::UnsupportedVersion(0))
        ));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            Colony::restore(&[1, 2, 3]),
            Err(RestoreError::Decode(_))
        ));
    }
}
