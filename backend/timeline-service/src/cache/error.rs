//! Cache error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    /// Backend could not be reached (connection refused, dropped, timed out)
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid cache data: {0}")]
    InvalidData(String),
}

impl CacheError {
    /// Classify a Redis error: transport failures become `Unavailable`.
    pub fn from_redis(err: redis::RedisError) -> Self {
        if err.is_io_error() || err.is_connection_dropped() || err.is_timeout() {
            CacheError::Unavailable(err.to_string())
        } else {
            CacheError::Redis(err)
        }
    }

    /// Short label used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            CacheError::Unavailable(_) => "unavailable",
            CacheError::Redis(_) => "redis",
            CacheError::Serialization(_) => "serialize",
            CacheError::InvalidData(_) => "invalid_data",
        }
    }
}

pub type CacheResult<T> = Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CacheError::Unavailable("connection refused".to_string());
        assert_eq!(err.to_string(), "Cache unavailable: connection refused");
        assert_eq!(err.kind(), "unavailable");
    }

    #[test]
    fn test_error_from_serde() {
        let json_err = serde_json::from_str::<String>("invalid json").unwrap_err();
        let err: CacheError = json_err.into();
        assert!(matches!(err, CacheError::Serialization(_)));
        assert_eq!(err.kind(), "serialize");
    }

    #[test]
    fn test_io_error_is_unavailable() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = CacheError::from_redis(redis::RedisError::from(io));
        assert!(matches!(err, CacheError::Unavailable(_)));
    }

    #[test]
    fn test_protocol_error_stays_redis() {
        let redis_err = redis::RedisError::from((redis::ErrorKind::TypeError, "bad type"));
        let err = CacheError::from_redis(redis_err);
        assert!(matches!(err, CacheError::Redis(_)));
    }
}
