use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// At-most-one-concurrent-computation guard, keyed by cache key.
///
/// Two workers handed the same search query serialize here: the winner
/// computes, the loser re-checks the cache after acquiring the lock and
/// finds the winner's entry. Scratch directories are keyed by the same
/// key, so this guard also protects the scratch namespace.
#[derive(Debug, Default)]
pub(crate) struct InflightQueries {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl InflightQueries {
    pub(crate) async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self
                .locks
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(key.to_string()).or_default())
        };
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn same_key_serializes() {
        let inflight = Arc::new(InflightQueries::default());
        let guard = inflight.acquire("key").await;

        let contender = {
            let inflight = Arc::clone(&inflight);
            tokio::spawn(async move {
                let _guard = inflight.acquire("key").await;
            })
        };

        // Held guard blocks the contender.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn distinct_keys_do_not_block() {
        let inflight = InflightQueries::default();
        let _a = inflight.acquire("a").await;
        let _b = tokio::time::timeout(Duration::from_millis(100), inflight.acquire("b"))
            .await
            .unwrap();
    }
}
