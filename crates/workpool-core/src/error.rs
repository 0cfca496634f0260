//! Error types for the workpool active worker pool

use core::fmt;

/// Result type for pool operations
pub type PoolResult<T> = Result<T, PoolError>;

/// Errors that can occur in pool operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// Construction-time configuration violation (negative bound, max < initial, ...)
    ConfigInvalid(&'static str),

    /// An admission, wait, or batch operation observed that the pool is stopping
    ShuttingDown,

    /// A user callable terminated abnormally; carries the captured failure
    ItemFailed(ItemError),

    /// Raised only from `throw_aggregate` when at least one tracked item failed
    AggregateFailed(Vec<ItemError>),
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolError::ConfigInvalid(reason) => write!(f, "invalid pool configuration: {}", reason),
            PoolError::ShuttingDown => write!(f, "pool is shutting down"),
            PoolError::ItemFailed(e) => write!(f, "item failed: {}", e),
            PoolError::AggregateFailed(errs) => {
                write!(f, "{} item(s) failed: ", errs.len())?;
                for (i, e) in errs.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for PoolError {}

impl From<ItemError> for PoolError {
    fn from(e: ItemError) -> Self {
        PoolError::ItemFailed(e)
    }
}

/// A captured failure from a single user callable
///
/// This is the crate's analogue of the source library's exception-kind
/// enumeration: rather than wrapping every possible user exception type
/// (explicitly out of scope, see spec §1), a callable's error is reduced
/// to a message plus an optional panic flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemError {
    message: String,
    panicked: bool,
}

impl ItemError {
    /// Build from a user-supplied error value via its `Display` impl
    pub fn from_display(err: &dyn fmt::Display) -> Self {
        ItemError {
            message: err.to_string(),
            panicked: false,
        }
    }

    /// Build from a caught panic payload (see `std::panic::catch_unwind`)
    pub fn from_panic_payload(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "worker panicked with a non-string payload".to_string()
        };
        ItemError {
            message,
            panicked: true,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// True if this failure came from a Rust panic rather than an `Err` return
    pub fn did_panic(&self) -> bool {
        self.panicked
    }
}

impl fmt::Display for ItemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.panicked {
            write!(f, "panic: {}", self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for ItemError {}

impl From<String> for ItemError {
    fn from(message: String) -> Self {
        ItemError {
            message,
            panicked: false,
        }
    }
}

impl From<&str> for ItemError {
    fn from(message: &str) -> Self {
        ItemError {
            message: message.to_string(),
            panicked: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = PoolError::ShuttingDown;
        assert_eq!(format!("{}", e), "pool is shutting down");

        let e = PoolError::ConfigInvalid("max_workers < initial_workers");
        assert!(format!("{}", e).contains("max_workers < initial_workers"));
    }

    #[test]
    fn test_item_error_from_str() {
        let e: ItemError = "boom".into();
        assert_eq!(e.message(), "boom");
        assert!(!e.did_panic());
        assert_eq!(format!("{}", e), "boom");
    }

    #[test]
    fn test_item_error_conversion_to_pool_error() {
        let item_err: ItemError = "boom".into();
        let pool_err: PoolError = item_err.clone().into();
        assert!(matches!(pool_err, PoolError::ItemFailed(e) if e == item_err));
    }

    #[test]
    fn test_aggregate_display() {
        let errs = vec![ItemError::from("a"), ItemError::from("b")];
        let e = PoolError::AggregateFailed(errs);
        let s = format!("{}", e);
        assert!(s.starts_with("2 item(s) failed"));
        assert!(s.contains('a'));
        assert!(s.contains('b'));
    }
}
