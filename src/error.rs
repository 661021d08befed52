use std::fmt;

/// Outcomes of engine operations that are not a plain success.
///
/// `QueueFull` and `EmptyQueue` are expected, recoverable conditions left to
/// the caller. `InvalidConfiguration` only occurs when building an engine.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum QueueError {
    QueueFull,
    EmptyQueue,
    InvalidConfiguration(String),
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::QueueFull => f.write_str("queue is full"),
            Self::EmptyQueue => f.write_str("no waiting jobs"),
            Self::InvalidConfiguration(reason) => {
                write!(f, "invalid configuration: {reason}")
            },
        }
    }
}

impl std::error::Error for QueueError {}
