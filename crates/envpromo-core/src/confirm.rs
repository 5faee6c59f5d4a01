//! Confirmation seam for pruning orphaned journey nodes

/// Decides whether orphaned nodes found after a journey delete are removed
pub trait PruneConfirm: Send + Sync {
    /// Return `true` to remove `node_ids`
    fn confirm_prune(&self, node_ids: &[String]) -> bool;
}

/// Always confirms
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm;

impl PruneConfirm for AutoConfirm {
    fn confirm_prune(&self, _node_ids: &[String]) -> bool {
        true
    }
}

/// Always declines
#[derive(Debug, Clone, Copy, Default)]
pub struct Decline;

impl PruneConfirm for Decline {
    fn confirm_prune(&self, _node_ids: &[String]) -> bool {
        false
    }
}
