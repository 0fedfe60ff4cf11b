use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailedEventType {
    PublishPaymentSuccess,
}

impl FailedEventType {
    pub fn code(&self) -> i32 {
        match self {
            FailedEventType::PublishPaymentSuccess => 1,
        }
    }
}

impl Display for FailedEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailedEventType::PublishPaymentSuccess => f.write_str("publish_payment_success"),
        }
    }
}
