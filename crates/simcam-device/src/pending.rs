//! Outbound queue of staged changes.
//!
//! Setters stage a kind; the values are read when the queue is drained at
//! the next step boundary, so repeated changes within one step collapse
//! into a single record carrying the latest value.

use std::collections::BTreeSet;

/// One kind of staged change. Declaration order is the wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PendingWrite {
    SamplingPeriod,
    ImageRequest,
    Fov,
    FocalDistance,
    RecognitionPeriod,
}

/// Ordered set of staged changes for one device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingWrites {
    staged: BTreeSet<PendingWrite>,
}

impl PendingWrites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a change. Staging an already staged kind is a no-op.
    pub fn stage(&mut self, kind: PendingWrite) {
        self.staged.insert(kind);
    }

    pub fn is_pending(&self, kind: PendingWrite) -> bool {
        self.staged.contains(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Take every staged kind in wire order, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<PendingWrite> {
        std::mem::take(&mut self.staged).into_iter().collect()
    }

    pub fn clear(&mut self) {
        self.staged.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_is_in_wire_order() {
        let mut pending = PendingWrites::new();
        pending.stage(PendingWrite::RecognitionPeriod);
        pending.stage(PendingWrite::Fov);
        pending.stage(PendingWrite::FocalDistance);
        pending.stage(PendingWrite::Fov);

        assert_eq!(
            pending.drain(),
            vec![
                PendingWrite::Fov,
                PendingWrite::FocalDistance,
                PendingWrite::RecognitionPeriod
            ]
        );
        assert!(pending.is_empty());
        assert!(pending.drain().is_empty());
    }

    #[test]
    fn base_sensor_writes_come_first() {
        let mut pending = PendingWrites::new();
        pending.stage(PendingWrite::Fov);
        pending.stage(PendingWrite::ImageRequest);
        pending.stage(PendingWrite::SamplingPeriod);
        assert_eq!(
            pending.drain(),
            vec![
                PendingWrite::SamplingPeriod,
                PendingWrite::ImageRequest,
                PendingWrite::Fov
            ]
        );
    }
}
