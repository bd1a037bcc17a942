//! View lifetimes for in-flight requests

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};

/// Tracks whether the view that started a request is still mounted
///
/// Clones share the flag. Once [`ViewScope::unmount`] is called, results
/// guarded by the scope come back as [`Error::Cancelled`] and must not be
/// applied. The request itself is not aborted.
#[derive(Debug, Clone)]
pub struct ViewScope {
    mounted: Arc<AtomicBool>,
}

impl Default for ViewScope {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewScope {
    pub fn new() -> Self {
        Self {
            mounted: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::SeqCst);
    }

    /// Awaits `fut`, then drops its output if the view went away meanwhile
    pub async fn run<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let result = fut.await;
        if self.is_mounted() {
            result
        } else {
            Err(Error::Cancelled)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn results_pass_through_while_mounted() {
        let scope = ViewScope::new();
        let value = scope.run(async { Ok::<_, Error>(3) }).await.unwrap();
        assert_eq!(value, 3);
    }

    #[tokio::test]
    async fn results_are_dropped_after_unmount() {
        let scope = ViewScope::new();
        let handle = scope.clone();
        let result = scope
            .run(async move {
                handle.unmount();
                Ok::<_, Error>(3)
            })
            .await;
        assert!(matches!(result, Err(Error::Cancelled)));
        assert!(!scope.is_mounted());
    }
}
