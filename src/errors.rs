/*
 *
 *  *
 *  *      Copyright (c) 2018-2025, SnackCloud All rights reserved.
 *  *
 *  *   Redistribution and use in source and binary forms, with or without
 *  *   modification, are permitted provided that the following conditions are met:
 *  *
 *  *   Redistributions of source code must retain the above copyright notice,
 *  *   this list of conditions and the following disclaimer.
 *  *   Redistributions in binary form must reproduce the above copyright
 *  *   notice, this list of conditions and the following disclaimer in the
 *  *   documentation and/or other materials provided with the distribution.
 *  *   Neither the name of the www.snackcloud.cn developer nor the names of its
 *  *   contributors may be used to endorse or promote products derived from
 *  *   this software without specific prior written permission.
 *  *   Author: SnackCloud
 *  *
 *
 */

use redis::RedisError;
use thiserror::Error;

pub type LockResult<T> = std::result::Result<T, LockError>;

#[derive(Error, Debug)]
pub enum LockError {
    /// Rejected before any store call was made
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Redis error: {0}")]
    RedisError(#[from] RedisError),

    #[error("Connection pool error: {0}")]
    PoolError(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

impl LockError {
    /// Transport-level failures. Acquisition loops retry these, watchdogs skip them.
    pub fn is_store_unavailable(&self) -> bool {
        matches!(
            self,
            LockError::RedisError(_) | LockError::PoolError(_) | LockError::StoreUnavailable(_)
        )
    }
}

impl From<r2d2::Error> for LockError {
    fn from(err: r2d2::Error) -> Self {
        LockError::PoolError(err.to_string())
    }
}

impl From<deadpool::managed::PoolError<RedisError>> for LockError {
    fn from(err: deadpool::managed::PoolError<RedisError>) -> Self {
        LockError::PoolError(err.to_string())
    }
}

impl From<deadpool::managed::BuildError> for LockError {
    fn from(err: deadpool::managed::BuildError) -> Self {
        LockError::PoolError(err.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for LockError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        LockError::StoreUnavailable(format!("response timed out: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_unavailable_classification() {
        assert!(LockError::PoolError("exhausted".to_string()).is_store_unavailable());
        assert!(LockError::StoreUnavailable("down".to_string()).is_store_unavailable());
        assert!(!LockError::InvalidArgument("wait".to_string()).is_store_unavailable());
        assert!(!LockError::ConfigError("url".to_string()).is_store_unavailable());
    }

    #[test]
    fn test_error_messages() {
        let err = LockError::InvalidArgument("wait time must be greater than zero".to_string());
        assert_eq!(err.to_string(), "Invalid argument: wait time must be greater than zero");
    }
}
