/*!
 * Policy Store
 * Hot-reloadable holder of the active rule table
 *
 * Reads are a single atomic pointer load. A reload parses and validates the
 * complete document before anything is published; a rejected document leaves
 * the active table untouched. Evaluators hold their own `Arc` to the table
 * they were created from, so in-flight evaluations finish against the version
 * they started with.
 */

use super::loader::PolicyLoader;
use super::table::RuleTable;
use crate::core::errors::LoadResult;
use crate::evaluator::config::EvaluatorConfig;
use crate::evaluator::engine::Evaluator;
use arc_swap::ArcSwap;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

/// One published policy version
#[derive(Debug, Clone)]
pub struct PolicySnapshot {
    version: u64,
    table: Arc<RuleTable>,
}

impl PolicySnapshot {
    /// Monotonic version, 0 for the initial table
    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[inline]
    pub fn table(&self) -> &Arc<RuleTable> {
        &self.table
    }
}

/// Shared, swappable policy
///
/// Cloning shares the same underlying cell.
#[derive(Clone)]
pub struct PolicyStore {
    current: Arc<ArcSwap<PolicySnapshot>>,
    loader: PolicyLoader,
}

impl PolicyStore {
    /// Store starting with an empty table (every label unknown)
    pub fn new(loader: PolicyLoader) -> Self {
        Self::with_table(loader, RuleTable::empty())
    }

    pub fn with_table(loader: PolicyLoader, table: RuleTable) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(PolicySnapshot {
                version: 0,
                table: Arc::new(table),
            })),
            loader,
        }
    }

    /// Current snapshot (lock-free)
    #[inline]
    pub fn snapshot(&self) -> Arc<PolicySnapshot> {
        self.current.load_full()
    }

    /// Current table (lock-free)
    #[inline]
    pub fn table(&self) -> Arc<RuleTable> {
        Arc::clone(&self.current.load().table)
    }

    #[inline]
    pub fn version(&self) -> u64 {
        self.current.load().version
    }

    pub fn loader(&self) -> &PolicyLoader {
        &self.loader
    }

    /// Evaluator bound to the current table
    pub fn evaluator(&self, config: EvaluatorConfig) -> Evaluator {
        Evaluator::new(self.table())
            .with_config(config)
            .with_resolver(self.loader.resolver())
    }

    /// Load `document` and publish it if the whole document is valid
    pub fn reload(&self, document: &str) -> LoadResult<Arc<PolicySnapshot>> {
        match self.loader.load(document) {
            Ok(loaded) => Ok(self.publish(loaded.table)),
            Err(e) => {
                error!(
                    violations = e.violations.len(),
                    active_version = self.version(),
                    "Policy reload rejected; keeping active table"
                );
                Err(e)
            }
        }
    }

    /// Read `path` and publish it if the whole document is valid
    pub fn reload_file(&self, path: impl AsRef<Path>) -> LoadResult<Arc<PolicySnapshot>> {
        match self.loader.load_file(path) {
            Ok(loaded) => Ok(self.publish(loaded.table)),
            Err(e) => {
                error!(
                    violations = e.violations.len(),
                    active_version = self.version(),
                    "Policy reload rejected; keeping active table"
                );
                Err(e)
            }
        }
    }

    /// Publish an already-validated table
    pub fn publish(&self, table: RuleTable) -> Arc<PolicySnapshot> {
        let table = Arc::new(table);
        let mut installed = None;

        // The closure may run more than once under contention
        self.current.rcu(|old| {
            let next = Arc::new(PolicySnapshot {
                version: old.version + 1,
                table: Arc::clone(&table),
            });
            installed = Some(Arc::clone(&next));
            next
        });

        let snapshot = installed.unwrap_or_else(|| self.current.load_full());
        info!(
            version = snapshot.version,
            rules = snapshot.table.len(),
            "Policy published"
        );
        snapshot
    }
}
