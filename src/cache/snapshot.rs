//! JSON-file backed cache implementation.
//!
//! A snapshot file holds an array of package records. It stands in for the
//! live system package database: the binary and the integration tests load
//! one and serve every query from it.

use std::path::Path;

use anyhow::{Context, Result};

use crate::cache::{Cache, ProgressFn};
use crate::error::QueryError;
use crate::package::PackageInstance;

/// A package cache loaded from a JSON snapshot file.
pub struct SnapshotCache {
    packages: Vec<PackageInstance>,
    /// Names marked for upgrade by the last planning pass.
    pending: Vec<String>,
}

impl SnapshotCache {
    /// Load a snapshot file, reporting coarse progress through `progress`.
    pub fn load(path: &Path, progress: ProgressFn<'_>) -> Result<Self> {
        progress(0);
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot {:?}", path))?;
        progress(50);
        let packages: Vec<PackageInstance> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse snapshot {:?}", path))?;
        progress(100);
        log::info!("Loaded {} packages from {:?}", packages.len(), path);
        Ok(SnapshotCache {
            packages,
            pending: Vec::new(),
        })
    }

    /// Build a cache directly from package records.
    pub fn from_packages(packages: Vec<PackageInstance>) -> Self {
        SnapshotCache {
            packages,
            pending: Vec::new(),
        }
    }
}

impl Cache for SnapshotCache {
    fn packages(&self) -> Vec<PackageInstance> {
        self.packages.clone()
    }

    fn lookup(&self, name: &str) -> Option<PackageInstance> {
        self.packages.iter().find(|p| p.name == name).cloned()
    }

    fn plan_upgrades(&mut self) -> Result<(), QueryError> {
        self.pending = self
            .packages
            .iter()
            .filter(|p| {
                p.is_installed
                    && p.installed_version
                        .as_deref()
                        .is_some_and(|v| v != p.candidate_version)
            })
            .map(|p| p.name.clone())
            .collect();
        log::debug!("Upgrade planning marked {} packages", self.pending.len());
        Ok(())
    }

    fn changed_set(&self) -> Vec<PackageInstance> {
        self.packages
            .iter()
            .filter(|p| self.pending.contains(&p.name))
            .cloned()
            .collect()
    }
}
