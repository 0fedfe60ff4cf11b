/// Review state shared by anomalies and dead-letter rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewStatus {
    Resolved,
    NeedsCheck,
}

impl ReviewStatus {
    pub fn code(&self) -> i32 {
        match self {
            ReviewStatus::Resolved => 1,
            ReviewStatus::NeedsCheck => 99,
        }
    }
}
