use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnomalyType {
    InvalidAmount,
}

impl AnomalyType {
    pub fn code(&self) -> i32 {
        match self {
            AnomalyType::InvalidAmount => 1,
        }
    }
}

impl Display for AnomalyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnomalyType::InvalidAmount => f.write_str("invalid_amount"),
        }
    }
}
