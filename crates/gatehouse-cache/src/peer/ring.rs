//! Consistent-hash ring over the peer set.

use sha2::{Digest, Sha256};

/// Virtual points per peer when none is configured.
pub const DEFAULT_REPLICAS: usize = 50;

/// Maps keys to peers.
///
/// Each peer is placed on the ring `replicas` times. A key belongs to the
/// first point at or after its own hash, wrapping around at the end. Two
/// rings built from the same peer set agree on every key, whatever order
/// the peers were listed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashRing {
    replicas: usize,
    points: Vec<(u64, usize)>,
    peers: Vec<String>,
}

impl HashRing {
    pub fn new<I, S>(peers: I, replicas: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut peers: Vec<String> = peers.into_iter().map(Into::into).collect();
        peers.sort();
        peers.dedup();

        let replicas = replicas.max(1);
        let mut points = Vec::with_capacity(peers.len() * replicas);
        for (index, peer) in peers.iter().enumerate() {
            for replica in 0..replicas {
                points.push((hash(&format!("{replica}{peer}")), index));
            }
        }
        points.sort_unstable();

        Self {
            replicas,
            points,
            peers,
        }
    }

    /// Returns the peer owning `key`, or None on an empty ring.
    pub fn owner(&self, key: &str) -> Option<&str> {
        if self.points.is_empty() {
            return None;
        }

        let h = hash(key);
        let idx = self.points.partition_point(|(point, _)| *point < h);
        let (_, peer) = self.points[idx % self.points.len()];
        Some(self.peers[peer].as_str())
    }

    /// Peers on the ring, sorted.
    pub fn peers(&self) -> &[String] {
        &self.peers
    }

    pub fn contains(&self, peer: &str) -> bool {
        self.peers.binary_search_by(|p| p.as_str().cmp(peer)).is_ok()
    }

    pub fn replicas(&self) -> usize {
        self.replicas
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

fn hash(input: &str) -> u64 {
    let digest = Sha256::digest(input.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const PEERS: [&str; 3] = [
        "http://10.0.0.1:8081",
        "http://10.0.0.2:8081",
        "http://10.0.0.3:8081",
    ];

    fn keys() -> impl Iterator<Item = String> {
        (0..500).map(|i| format!("tenant-{i}.example.com"))
    }

    #[test]
    fn test_owner_is_deterministic_across_instances() {
        let a = HashRing::new(PEERS, DEFAULT_REPLICAS);
        let b = HashRing::new(PEERS.iter().rev().copied(), DEFAULT_REPLICAS);

        for key in keys() {
            assert_eq!(a.owner(&key), b.owner(&key), "disagreement on {key}");
        }
    }

    #[test]
    fn test_duplicates_are_ignored() {
        let a = HashRing::new(PEERS, DEFAULT_REPLICAS);
        let b = HashRing::new(PEERS.iter().chain(PEERS.iter()).copied(), DEFAULT_REPLICAS);

        assert_eq!(a, b);
        assert_eq!(b.peers().len(), 3);
    }

    #[test]
    fn test_every_peer_owns_some_keys() {
        let ring = HashRing::new(PEERS, DEFAULT_REPLICAS);
        let mut owned: HashMap<&str, usize> = HashMap::new();

        for key in keys() {
            *owned.entry(ring.owner(&key).unwrap()).or_default() += 1;
        }

        assert_eq!(owned.len(), 3);
        assert!(owned.values().all(|count| *count > 50));
    }

    #[test]
    fn test_removing_a_peer_only_moves_its_keys() {
        let full = HashRing::new(PEERS, DEFAULT_REPLICAS);
        let reduced = HashRing::new(PEERS[..2].iter().copied(), DEFAULT_REPLICAS);

        for key in keys() {
            let before = full.owner(&key).unwrap();
            if before != PEERS[2] {
                assert_eq!(reduced.owner(&key), Some(before));
            }
        }
    }

    #[test]
    fn test_single_peer_owns_everything() {
        let ring = HashRing::new(["http://self:8081"], DEFAULT_REPLICAS);
        assert!(keys().all(|key| ring.owner(&key) == Some("http://self:8081")));
    }

    #[test]
    fn test_empty_ring() {
        let ring = HashRing::new(Vec::<String>::new(), DEFAULT_REPLICAS);
        assert!(ring.is_empty());
        assert_eq!(ring.owner("example.com"), None);
    }

    #[test]
    fn test_contains() {
        let ring = HashRing::new(PEERS, 3);
        assert!(ring.contains("http://10.0.0.2:8081"));
        assert!(!ring.contains("http://10.0.0.9:8081"));
        assert_eq!(ring.replicas(), 3);
    }
}
