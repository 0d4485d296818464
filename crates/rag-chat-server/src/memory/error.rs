use thiserror::Error;

#[derive(Error, Debug)]
pub enum MemoryError {
    /// Connection-kind failure: the durable store could not be reached
    #[error("Durable history store unavailable: {0}")]
    Unavailable(String),

    #[error("History store error: {0}")]
    Store(String),

    #[error("Malformed history record: {0}")]
    Codec(#[from] serde_json::Error),
}

impl MemoryError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, MemoryError::Unavailable(_))
    }
}

impl From<redis::RedisError> for MemoryError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_connection_refusal()
            || err.is_io_error()
            || err.is_connection_dropped()
            || err.is_timeout()
        {
            MemoryError::Unavailable(err.to_string())
        } else {
            MemoryError::Store(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_errors_are_unavailable() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err: MemoryError = redis::RedisError::from(io).into();
        assert!(err.is_unavailable());
    }

    #[test]
    fn test_config_errors_are_store_errors() {
        let redis_err = redis::Client::open("not a redis url").unwrap_err();
        let err: MemoryError = redis_err.into();
        assert!(!err.is_unavailable());
        assert!(matches!(err, MemoryError::Store(_)));
    }
}
