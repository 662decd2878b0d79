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
use std::sync::Arc;
use std::time::Duration;

use crate::{AsyncRLock, AsyncRedisConnectionManager, AsyncRedisStoreGateway, AsyncStoreGateway, LockConfig, LockResult};

// Asynchronous client
pub struct AsyncLockClient {
    config: LockConfig,
    gateway: Arc<dyn AsyncStoreGateway>,
}

impl AsyncLockClient {
    pub async fn new(config: LockConfig) -> LockResult<Self> {
        let connection_manager = Arc::new(AsyncRedisConnectionManager::new(&config).await?);
        let gateway = Arc::new(AsyncRedisStoreGateway::new(connection_manager));
        Ok(Self { config, gateway })
    }

    pub fn with_gateway(config: LockConfig, gateway: Arc<dyn AsyncStoreGateway>) -> LockResult<Self> {
        config.validate()?;
        Ok(Self { config, gateway })
    }

    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    pub fn gateway(&self) -> &Arc<dyn AsyncStoreGateway> {
        &self.gateway
    }

    pub fn get_lock(&self, name: &str, renewal_interval: Option<Duration>) -> AsyncRLock {
        AsyncRLock::new(
            self.gateway.clone(),
            name.to_string(),
            renewal_interval.or(self.config.renewal_interval),
        )
        .with_retry_delay(self.config.retry_delay)
        .with_lease_loss_policy(self.config.lease_loss_policy)
    }
}

impl Clone for AsyncLockClient {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            gateway: self.gateway.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LockError, MemoryStore, WatchdogState};

    #[tokio::test]
    async fn test_watchdog_follows_config_default() {
        let store = MemoryStore::new();
        let config = LockConfig::default()
            .with_renewal_interval(Duration::from_millis(50))
            .with_retry_delay(Duration::from_millis(5));
        let client = AsyncLockClient::with_gateway(config, Arc::new(store.clone())).unwrap();

        let lock = client.get_lock("job-42", None);
        assert!(lock.acquire_within(Duration::from_secs(1), Duration::from_millis(500)).await.unwrap());
        assert_eq!(lock.watchdog_state().await, WatchdogState::Active);

        let other = client.get_lock("job-42", None);
        assert!(!other.acquire_within(Duration::from_millis(100), Duration::from_millis(500)).await.unwrap());

        assert!(lock.release().await.unwrap());
        assert_eq!(lock.watchdog_state().await, WatchdogState::Stopped);
        assert!(other.acquire_within(Duration::from_millis(100), Duration::from_millis(500)).await.unwrap());
        assert!(other.release().await.unwrap());
    }

    #[tokio::test]
    async fn test_unbounded_acquire_starts_no_watchdog() {
        let store = MemoryStore::new();
        let config = LockConfig::default().with_renewal_interval(Duration::from_millis(50));
        let client = AsyncLockClient::with_gateway(config, Arc::new(store.clone())).unwrap();

        let lock = client.get_lock("job-42", None);
        assert!(lock.acquire(Duration::ZERO).await.unwrap());
        assert_eq!(lock.watchdog_state().await, WatchdogState::Stopped);
        assert!(lock.release().await.unwrap());
    }

    #[test]
    fn test_with_gateway_rejects_zero_retry_delay() {
        let config = LockConfig::default().with_retry_delay(Duration::ZERO);
        let result = AsyncLockClient::with_gateway(config, Arc::new(MemoryStore::new()));
        assert!(matches!(result, Err(LockError::ConfigError(_))));
    }
}
