//! In-memory set of registered migrations.

use super::error::MigrationError;
use super::migration::Migration;
use std::collections::HashSet;

pub(crate) struct Entry {
    pub(crate) migration: Box<dyn Migration>,
    pub(crate) done: bool,
}

/// Registered migrations plus their applied flags.
///
/// Versions are collected during startup and sorted once by [`Registry::freeze`];
/// after that the set is closed to new registrations.
#[derive(Default)]
pub(crate) struct Registry {
    entries: Vec<Entry>,
    versions: HashSet<String>,
    frozen: bool,
}

impl Registry {
    pub(crate) fn register(&mut self, migration: Box<dyn Migration>) -> Result<(), MigrationError> {
        let version = migration.version().to_string();
        if self.frozen {
            return Err(MigrationError::RegistryFrozen(version));
        }
        if version.trim().is_empty() {
            return Err(MigrationError::InvalidVersion(version));
        }
        if !self.versions.insert(version.clone()) {
            return Err(MigrationError::DuplicateVersion(version));
        }
        self.entries.push(Entry {
            migration,
            done: false,
        });
        Ok(())
    }

    /// Sort by version and close the registry.
    pub(crate) fn freeze(&mut self) {
        if !self.frozen {
            self.entries
                .sort_by(|a, b| a.migration.version().cmp(b.migration.version()));
            self.frozen = true;
        }
    }

    pub(crate) fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [Entry] {
        &mut self.entries
    }

    /// Index of `version`. Only meaningful once frozen (sorted).
    pub(crate) fn position(&self, version: &str) -> Option<usize> {
        self.entries
            .binary_search_by(|e| e.migration.version().cmp(version))
            .ok()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)] // Test code - expect is acceptable
mod tests {
    use super::*;
    use crate::migration::FnMigration;

    fn noop(version: &str) -> Box<dyn Migration> {
        Box::new(FnMigration::new(version, |_| Ok(()), |_| Ok(())))
    }

    #[test]
    fn test_freeze_sorts_once() {
        let mut registry = Registry::default();
        for version in ["20240301000000", "20240101000000", "20240201000000"] {
            registry.register(noop(version)).expect("registers");
        }
        registry.freeze();
        let versions: Vec<_> = registry
            .entries()
            .iter()
            .map(|e| e.migration.version())
            .collect();
        assert_eq!(versions, ["20240101000000", "20240201000000", "20240301000000"]);
        assert_eq!(registry.position("20240201000000"), Some(1));
        assert_eq!(registry.position("20240401000000"), None);
    }

    #[test]
    fn test_duplicate_and_frozen_registration() {
        let mut registry = Registry::default();
        registry.register(noop("001")).expect("registers");
        assert!(matches!(
            registry.register(noop("001")),
            Err(MigrationError::DuplicateVersion(v)) if v == "001"
        ));
        assert!(matches!(
            registry.register(noop(" ")),
            Err(MigrationError::InvalidVersion(_))
        ));

        registry.freeze();
        assert!(matches!(
            registry.register(noop("002")),
            Err(MigrationError::RegistryFrozen(_))
        ));
        assert_eq!(registry.len(), 1);
    }
}
