use std::fmt;

use serde::{Deserialize, Serialize};

/// Addressing key for a job.
///
/// Assigned by the [`JobRegistry`](crate::registry::JobRegistry) in creation
/// order starting at 0 and never reused. Serialized as a bare integer so the
/// UI can key its progress widgets on it directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(u64);

impl JobId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for JobId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
