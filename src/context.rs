//! Process-lifetime resolution state: snippets, variables and AI settings.
//!
//! Readers take a cheap `Arc` of the current snapshot; writers build a new
//! snapshot and swap it in whole, so a resolution never sees a torn update.

use crate::error::Result;
use crate::models::{AiConfig, Snippet, StoreData, Variables};
use crate::storage::{Store, StoreChange};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub snippets: Vec<Snippet>,
    pub variables: Variables,
    pub ai: AiConfig,
}

impl From<StoreData> for Snapshot {
    fn from(data: StoreData) -> Self {
        Self {
            snippets: data.snippets,
            variables: data.custom_variables,
            ai: data.ai,
        }
    }
}

#[derive(Debug, Default)]
pub struct ResolutionContext {
    current: RwLock<Arc<Snapshot>>,
}

impl ResolutionContext {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    pub fn from_store(store: &Store) -> Result<Self> {
        Ok(Self::new(store.load()?.into()))
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.current.read())
    }

    /// Swap in a complete new snapshot
    pub fn replace(&self, snapshot: Snapshot) {
        *self.current.write() = Arc::new(snapshot);
    }

    /// Apply one store change by copying the current snapshot and swapping it
    pub fn apply(&self, change: StoreChange) {
        let mut next = (*self.snapshot()).clone();
        match change {
            StoreChange::Snippets(snippets) => next.snippets = snippets,
            StoreChange::Variables(variables) => next.variables = variables,
            StoreChange::Ai(ai) => next.ai = ai,
            StoreChange::Categories(_) => return,
        }
        self.replace(next);
    }

    /// Load a context from `store` and keep it following later writes.
    ///
    /// The change subscription is taken before the initial load, so a write
    /// landing in between is applied rather than lost. The task runs until aborted.
    pub fn follow(store: Arc<Store>) -> Result<(Arc<Self>, JoinHandle<()>)> {
        let changes = store.subscribe();
        let context = Arc::new(Self::from_store(&store)?);
        let handle = Arc::clone(&context).listen(changes, store);
        Ok((context, handle))
    }

    fn listen(self: Arc<Self>, mut changes: Receiver<StoreChange>, store: Arc<Store>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(change) => {
                        debug!("applying store change to resolution context");
                        self.apply(change);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "resolution context lagged behind the store, reloading");
                        match store.load() {
                            Ok(data) => self.replace(data.into()),
                            Err(e) => warn!("failed to reload store: {}", e),
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn apply_swaps_only_the_changed_collection() {
        let context = ResolutionContext::new(Snapshot {
            snippets: vec![Snippet::new("/a", "A")],
            ..Default::default()
        });
        let before = context.snapshot();

        let mut vars = BTreeMap::new();
        vars.insert("name".to_string(), "Bob".to_string());
        context.apply(StoreChange::Variables(vars));

        let after = context.snapshot();
        assert_eq!(after.variables["name"], "Bob");
        assert_eq!(after.snippets, before.snippets);
        // The earlier reader still holds its untouched snapshot
        assert!(before.variables.is_empty());
    }

    async fn wait_for(context: &ResolutionContext, name: &str) {
        for _ in 0..50 {
            if context.snapshot().variables.contains_key(name) {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn follow_loads_then_tracks_store_writes() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(Store::new(dir.path().join("quickfill.json")));
        store.save_snippet(Snippet::new("/a", "A")).unwrap();

        let (context, handle) = ResolutionContext::follow(Arc::clone(&store)).unwrap();
        assert_eq!(context.snapshot().snippets.len(), 1);

        store.save_custom_variable("team", "core", None).unwrap();
        wait_for(&context, "team").await;
        assert_eq!(context.snapshot().variables["team"], "core");
        handle.abort();
    }

    #[tokio::test]
    async fn write_between_subscribe_and_load_is_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(Store::new(dir.path().join("quickfill.json")));

        // Same order as follow: subscribe, a write lands, then the load
        let changes = store.subscribe();
        store.save_custom_variable("early", "yes", None).unwrap();
        let context = Arc::new(ResolutionContext::new(Snapshot::default()));
        let handle = Arc::clone(&context).listen(changes, Arc::clone(&store));

        wait_for(&context, "early").await;
        assert_eq!(context.snapshot().variables["early"], "yes");
        handle.abort();
    }
}
