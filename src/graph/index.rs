//! Coarse lookup of candidate nodes by head-to-head distance.
//!
//! Reorientation never changes the distance between the two heads, so a
//! node can only match a position whose head distance lies within the
//! tolerance's head delta. Bucketing by that distance narrows the
//! candidates without changing which node a linear scan would pick first.

use super::ids::NodeNum;
use crate::skeleton::Position;
use std::collections::BTreeMap;

/// Integer bucket of a head-to-head distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HeadKey(i32);

#[derive(Debug, Clone)]
pub(crate) struct NodeIndex {
    bucket_width: f32,
    keys: Vec<HeadKey>,
    buckets: BTreeMap<HeadKey, Vec<NodeNum>>,
}

impl NodeIndex {
    pub fn new(head_distance_delta: f32) -> Self {
        Self {
            bucket_width: head_distance_delta.max(1e-3),
            keys: Vec::new(),
            buckets: BTreeMap::new(),
        }
    }

    fn key_for(&self, p: &Position) -> HeadKey {
        HeadKey((p.head_to_head().length() / self.bucket_width).floor() as i32)
    }

    /// Register the next node; nodes must be pushed in numbering order.
    pub fn push(&mut self, n: NodeNum, p: &Position) {
        debug_assert_eq!(n.index(), self.keys.len());
        let key = self.key_for(p);
        self.keys.push(key);
        self.buckets.entry(key).or_default().push(n);
    }

    /// Re-bucket a node whose position changed.
    pub fn update(&mut self, n: NodeNum, p: &Position) {
        let key = self.key_for(p);
        let Some(old) = self.keys.get_mut(n.index()) else {
            return;
        };
        if *old == key {
            return;
        }
        if let Some(bucket) = self.buckets.get_mut(&*old) {
            bucket.retain(|&m| m != n);
        }
        *old = key;
        let bucket = self.buckets.entry(key).or_default();
        let at = bucket.partition_point(|&m| m < n);
        bucket.insert(at, n);
    }

    /// Nodes that might match `p`, in ascending node order.
    pub fn candidates(&self, p: &Position) -> Vec<NodeNum> {
        let HeadKey(k) = self.key_for(p);
        let mut out: Vec<NodeNum> = self
            .buckets
            .range(HeadKey(k.saturating_sub(1))..=HeadKey(k.saturating_add(1)))
            .flat_map(|(_, nodes)| nodes.iter().copied())
            .collect();
        out.sort_unstable();
        out
    }
}
