//! Deadline and concurrency budget for collaborator calls.
//!
//! One budget is created per request. Per-key lookups are spawned on a
//! [`JoinSet`] and fanned back in keyed by their input, so evaluation order
//! never shows in the result. The first failure returns immediately; dropping
//! the set aborts every lookup still in flight, as does dropping the request
//! future itself.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::error::{Collaborator, SearchError, StoreError};

#[derive(Debug, Clone)]
pub struct LookupBudget {
    permits: Arc<Semaphore>,
    timeout: Duration,
}

impl LookupBudget {
    /// `max_concurrent` is clamped to at least one permit.
    #[must_use]
    pub fn new(max_concurrent: usize, timeout: Duration) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            timeout,
        }
    }

    /// Run one collaborator call under the deadline.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::CollaboratorUnavailable`] if the call fails or
    /// does not finish within the budget's timeout.
    pub async fn call<T, Fut>(&self, collaborator: Collaborator, call: Fut) -> Result<T, SearchError>
    where
        Fut: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(error)) => {
                tracing::warn!(%collaborator, %error, "collaborator lookup failed");
                Err(SearchError::unavailable(collaborator, error))
            }
            Err(_) => {
                tracing::warn!(%collaborator, timeout = ?self.timeout, "collaborator lookup timed out");
                Err(SearchError::unavailable(
                    collaborator,
                    format!("timed out after {:?}", self.timeout),
                ))
            }
        }
    }

    /// Look every key up concurrently and collect the answers by key.
    ///
    /// At most `max_concurrent` lookups run at once. Any failure fails the
    /// whole batch and no partial map is returned.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::CollaboratorUnavailable`] if any lookup fails,
    /// times out, or its task dies.
    pub async fn fan_out<K, V, F, Fut>(
        &self,
        collaborator: Collaborator,
        keys: impl IntoIterator<Item = K>,
        lookup: F,
    ) -> Result<BTreeMap<K, V>, SearchError>
    where
        K: Ord + Clone + Send + 'static,
        V: Send + 'static,
        F: Fn(K) -> Fut,
        Fut: Future<Output = Result<V, StoreError>> + Send + 'static,
    {
        let mut set = JoinSet::new();

        for key in keys {
            let budget = self.clone();
            let call = lookup(key.clone());
            set.spawn(async move {
                let _permit = Arc::clone(&budget.permits)
                    .acquire_owned()
                    .await
                    .map_err(|error| SearchError::unavailable(collaborator, error))?;
                let value = budget.call(collaborator, call).await?;
                Ok::<_, SearchError>((key, value))
            });
        }

        let mut results = BTreeMap::new();
        while let Some(joined) = set.join_next().await {
            let (key, value) = joined.map_err(|error| {
                SearchError::unavailable(collaborator, format!("lookup task failed: {error}"))
            })??;
            results.insert(key, value);
        }
        Ok(results)
    }
}
