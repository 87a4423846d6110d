//! Per-location cache of compiled modules
//!
//! Concurrent requests for the same location share one compilation: the first caller
//! installs a shared future in the slot and every later caller awaits a clone of it.
//! A successful result replaces the future with the module, a failure empties the slot
//! so the next request compiles again. Shard locks are never held across an await.

use crate::compiler::ProxyCompiler;
use crate::error::ProxyError;
use crate::module::CompiledModule;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use dws_core::ServiceLocation;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

/// Outcome shared by every caller waiting on the same compilation
pub type SharedResult = Result<Arc<CompiledModule>, Arc<ProxyError>>;

type CompileTask = Shared<BoxFuture<'static, SharedResult>>;

enum Slot {
    Ready(Arc<CompiledModule>),
    Compiling { generation: u64, task: CompileTask },
}

#[derive(Clone)]
pub struct ProxyCache {
    slots: Arc<DashMap<ServiceLocation, Slot>>,
    compiler: Arc<dyn ProxyCompiler>,
    generation: Arc<AtomicU64>,
}

impl ProxyCache {
    pub fn new(compiler: Arc<dyn ProxyCompiler>) -> Self {
        Self {
            slots: Arc::new(DashMap::new()),
            compiler,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// The module of a location, compiling it when nothing is cached
    pub async fn get_or_compile(&self, location: &ServiceLocation) -> SharedResult {
        let (generation, task) = match self.slots.entry(location.clone()) {
            Entry::Occupied(entry) => match entry.get() {
                Slot::Ready(module) => return Ok(Arc::clone(module)),
                Slot::Compiling { generation, task } => {
                    debug!(%location, "Joining compilation in flight");
                    (*generation, task.clone())
                }
            },
            Entry::Vacant(entry) => {
                let generation = self.generation.fetch_add(1, Ordering::Relaxed);
                let compiler = Arc::clone(&self.compiler);
                let target = location.clone();
                let task = async move {
                    compiler
                        .compile(&target)
                        .await
                        .map(Arc::new)
                        .map_err(Arc::new)
                }
                .boxed()
                .shared();

                info!(%location, generation, "Compiling client module");
                entry.insert(Slot::Compiling {
                    generation,
                    task: task.clone(),
                });
                (generation, task)
            }
        };

        self.finish(location, generation, task).await
    }

    /// The module of a location without ever compiling
    ///
    /// Waits for a compilation already in flight.
    pub async fn resolve(&self, location: &ServiceLocation) -> SharedResult {
        let (generation, task) = match self.slots.get(location) {
            Some(slot) => match slot.value() {
                Slot::Ready(module) => return Ok(Arc::clone(module)),
                Slot::Compiling { generation, task } => (*generation, task.clone()),
            },
            None => {
                return Err(Arc::new(ProxyError::Resolution {
                    location: location.clone(),
                    reason: "no client module has been compiled for this location".to_string(),
                }));
            }
        };

        self.finish(location, generation, task).await
    }

    /// Drop the cached module so the next request compiles again
    ///
    /// Callers already holding the module keep using it. A compilation in flight still
    /// completes for its waiters but is not stored.
    pub fn invalidate(&self, location: &ServiceLocation) -> bool {
        let removed = self.slots.remove(location).is_some();
        if removed {
            info!(%location, "Client module invalidated");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn clear(&self) {
        self.slots.clear();
    }

    async fn finish(
        &self,
        location: &ServiceLocation,
        generation: u64,
        task: CompileTask,
    ) -> SharedResult {
        let result = task.await;
        self.settle(location, generation, &result);
        result
    }

    /// Store the outcome unless the slot was invalidated or replaced meanwhile
    fn settle(&self, location: &ServiceLocation, generation: u64, result: &SharedResult) {
        let Entry::Occupied(mut entry) = self.slots.entry(location.clone()) else {
            return;
        };
        let current = matches!(
            entry.get(),
            Slot::Compiling { generation: pending, .. } if *pending == generation
        );
        if !current {
            return;
        }

        match result {
            Ok(module) => {
                entry.insert(Slot::Ready(Arc::clone(module)));
            }
            Err(error) => {
                debug!(%location, %error, "Compilation failed, slot cleared");
                entry.remove();
            }
        }
    }
}
