use std::time::Instant;

/// Notice that a cell committed a new value
///
/// Carries the revision only. Read the cell for the value; by then it may
/// already be past `revision`.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    /// Key the cell was created with
    pub key: &'static str,
    pub revision: u64,
    committed_at: Instant,
}

impl ChangeEvent {
    pub fn new(key: &'static str, revision: u64) -> Self {
        Self {
            key,
            revision,
            committed_at: Instant::now(),
        }
    }

    pub fn committed_at(&self) -> Instant {
        self.committed_at
    }

    /// Time since the change was committed
    pub fn age(&self) -> std::time::Duration {
        self.committed_at.elapsed()
    }
}

// Two notices of the same commit are equal whenever they were created
impl PartialEq for ChangeEvent {
    fn eq(&self, other: &Self) -> bool {
        (self.key, self.revision) == (other.key, other.revision)
    }
}

impl Eq for ChangeEvent {}
