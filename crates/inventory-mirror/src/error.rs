use resource_sync::SyncError;
use thiserror::Error;

/// Errors surfaced by the mirror application.
#[derive(Error, Debug)]
pub enum MirrorError {
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("Invalid snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("Agent already attached: {0}")]
    DuplicateAgent(String),

    #[error("Watcher stopped, notification from {0} dropped")]
    WatcherStopped(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_errors_convert() {
        let err: MirrorError = SyncError::NotFound("sys-1".into()).into();
        assert!(matches!(err, MirrorError::Sync(SyncError::NotFound(_))));
        assert!(err.to_string().contains("sys-1"));
    }
}
