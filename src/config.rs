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
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::{LockError, LockResult};

/// What a watchdog does once the store reports that its token no longer owns the key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeaseLossPolicy {
    /// Log the mismatch and keep renewing on schedule until cancelled
    KeepRenewing,
    /// Terminate the watchdog on the first mismatch
    Stop,
}

impl Default for LeaseLossPolicy {
    fn default() -> Self {
        Self::KeepRenewing
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockConfig {
    /// Redis URL, e.g. `redis://127.0.0.1:6379`
    pub url: String,
    /// Database number
    pub database: Option<i64>,
    /// PASSWORD
    pub password: Option<String>,
    /// Connection pool size
    pub pool_size: u32,
    /// Connection timeout time
    pub connection_timeout: Duration,
    /// Response timeout time
    pub response_timeout: Duration,
    /// Backoff between failed acquisition attempts
    pub retry_delay: Duration,
    /// Default watchdog cadence for locks created without an explicit interval
    pub renewal_interval: Option<Duration>,
    pub lease_loss_policy: LeaseLossPolicy,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            database: None,
            password: None,
            pool_size: 10,
            connection_timeout: Duration::from_secs(3),
            response_timeout: Duration::from_secs(3),
            retry_delay: Duration::from_millis(30),
            renewal_interval: None,
            lease_loss_policy: LeaseLossPolicy::default(),
        }
    }
}

impl LockConfig {
    pub fn single_server(address: &str) -> Self {
        Self {
            url: address.to_string(),
            ..Default::default()
        }
    }

    pub fn with_database(mut self, db: i64) -> Self {
        self.database = Some(db);
        self
    }

    pub fn with_password(mut self, password: &str) -> Self {
        self.password = Some(password.to_string());
        self
    }

    pub fn with_pool_size(mut self, size: u32) -> Self {
        self.pool_size = size;
        self
    }

    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_renewal_interval(mut self, interval: Duration) -> Self {
        self.renewal_interval = Some(interval);
        self
    }

    pub fn with_lease_loss_policy(mut self, policy: LeaseLossPolicy) -> Self {
        self.lease_loss_policy = policy;
        self
    }

    pub fn validate(&self) -> LockResult<()> {
        if self.url.is_empty() {
            return Err(LockError::ConfigError("Redis URL cannot be empty".to_string()));
        }
        if self.pool_size == 0 {
            return Err(LockError::ConfigError("Pool size cannot be zero".to_string()));
        }
        if self.retry_delay.is_zero() {
            return Err(LockError::ConfigError(
                "Retry delay must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = LockConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retry_delay, Duration::from_millis(30));
        assert_eq!(config.renewal_interval, None);
        assert_eq!(config.lease_loss_policy, LeaseLossPolicy::KeepRenewing);
    }

    #[test]
    fn test_builder() {
        let config = LockConfig::single_server("redis://10.0.0.1:6380")
            .with_database(2)
            .with_pool_size(4)
            .with_renewal_interval(Duration::from_secs(3))
            .with_lease_loss_policy(LeaseLossPolicy::Stop);

        assert_eq!(config.url, "redis://10.0.0.1:6380");
        assert_eq!(config.database, Some(2));
        assert_eq!(config.pool_size, 4);
        assert_eq!(config.renewal_interval, Some(Duration::from_secs(3)));
        assert_eq!(config.lease_loss_policy, LeaseLossPolicy::Stop);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(matches!(
            LockConfig::single_server("").validate(),
            Err(LockError::ConfigError(_))
        ));
        assert!(matches!(
            LockConfig::default().with_pool_size(0).validate(),
            Err(LockError::ConfigError(_))
        ));
        assert!(matches!(
            LockConfig::default().with_retry_delay(Duration::ZERO).validate(),
            Err(LockError::ConfigError(_))
        ));
    }

    #[test]
    fn test_config_serde() {
        let config = LockConfig::default().with_renewal_interval(Duration::from_millis(500));
        let json = serde_json::to_string(&config).unwrap();
        let parsed: LockConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.renewal_interval, Some(Duration::from_millis(500)));
        assert_eq!(parsed.pool_size, config.pool_size);
    }
}
