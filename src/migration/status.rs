//! Migration status tracking

/// State of one registered migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationState {
    pub version: String,
    pub name: String,
    pub applied: bool,
}

/// Snapshot of every registered migration, in version order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationStatus {
    pub migrations: Vec<MigrationState>,
    pub applied_count: usize,
    pub pending_count: usize,
}

impl MigrationStatus {
    #[must_use]
    pub fn new(migrations: Vec<MigrationState>) -> Self {
        let applied_count = migrations.iter().filter(|m| m.applied).count();
        let pending_count = migrations.len() - applied_count;
        Self {
            migrations,
            applied_count,
            pending_count,
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.migrations.len()
    }

    /// Check if all migrations are applied
    #[must_use]
    pub fn is_up_to_date(&self) -> bool {
        self.pending_count == 0
    }

    pub fn applied(&self) -> impl Iterator<Item = &MigrationState> {
        self.migrations.iter().filter(|m| m.applied)
    }

    pub fn pending(&self) -> impl Iterator<Item = &MigrationState> {
        self.migrations.iter().filter(|m| !m.applied)
    }

    /// Get the latest applied migration version
    #[must_use]
    pub fn latest_applied_version(&self) -> Option<&str> {
        self.applied().last().map(|m| m.version.as_str())
    }

    /// Get the next pending migration version
    #[must_use]
    pub fn next_pending_version(&self) -> Option<&str> {
        self.pending().next().map(|m| m.version.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(version: &str, applied: bool) -> MigrationState {
        MigrationState {
            version: version.to_string(),
            name: format!("m_{version}"),
            applied,
        }
    }

    #[test]
    fn test_counts_and_cursors() {
        let status = MigrationStatus::new(vec![
            state("001", true),
            state("002", true),
            state("003", false),
        ]);
        assert_eq!(status.total(), 3);
        assert_eq!(status.applied_count, 2);
        assert_eq!(status.pending_count, 1);
        assert!(!status.is_up_to_date());
        assert_eq!(status.latest_applied_version(), Some("002"));
        assert_eq!(status.next_pending_version(), Some("003"));
    }

    #[test]
    fn test_empty_status_is_up_to_date() {
        let status = MigrationStatus::default();
        assert!(status.is_up_to_date());
        assert_eq!(status.latest_applied_version(), None);
    }
}
