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

use crate::{LockConfig, LockResult, RLock, RedisStoreGateway, StoreGateway, SyncRedisConnectionManager};

// Synchronous client
pub struct LockClient {
    config: LockConfig,
    gateway: Arc<dyn StoreGateway>,
}

impl LockClient {
    /// Connect to the configured Redis server.
    pub fn new(config: LockConfig) -> LockResult<Self> {
        let connection_manager = Arc::new(SyncRedisConnectionManager::new(&config)?);
        let gateway = Arc::new(RedisStoreGateway::new(connection_manager));
        Ok(Self { config, gateway })
    }

    /// Use an existing gateway, e.g. a [`crate::MemoryStore`]. The config is
    /// validated the same way [`LockClient::new`] validates it.
    pub fn with_gateway(config: LockConfig, gateway: Arc<dyn StoreGateway>) -> LockResult<Self> {
        config.validate()?;
        Ok(Self { config, gateway })
    }

    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    pub fn gateway(&self) -> &Arc<dyn StoreGateway> {
        &self.gateway
    }

    /// A fresh lock handle for `name`. Without an explicit `renewal_interval` the
    /// configured default applies.
    pub fn get_lock(&self, name: &str, renewal_interval: Option<Duration>) -> RLock {
        RLock::new(
            self.gateway.clone(),
            name.to_string(),
            renewal_interval.or(self.config.renewal_interval),
        )
        .with_retry_delay(self.config.retry_delay)
        .with_lease_loss_policy(self.config.lease_loss_policy)
    }
}

impl Clone for LockClient {
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
    use crate::{LeaseLossPolicy, LockError, MemoryStore};

    #[test]
    fn test_get_lock_applies_config() {
        let config = LockConfig::default()
            .with_renewal_interval(Duration::from_secs(3))
            .with_lease_loss_policy(LeaseLossPolicy::Stop);
        let client = LockClient::with_gateway(config, Arc::new(MemoryStore::new())).unwrap();

        let lock = client.get_lock("job-42", None);
        assert_eq!(lock.name(), "job-42");
        assert_eq!(lock.renewal_interval(), Some(Duration::from_secs(3)));

        let lock = client.get_lock("job-42", Some(Duration::from_secs(1)));
        assert_eq!(lock.renewal_interval(), Some(Duration::from_secs(1)));

        let lock = client.get_lock("job-42", Some(Duration::ZERO));
        assert_eq!(lock.renewal_interval(), None);
    }

    #[test]
    fn test_locks_from_one_client_exclude_each_other() {
        let store = MemoryStore::new();
        let client = LockClient::with_gateway(LockConfig::default(), Arc::new(store.clone())).unwrap();

        let first = client.get_lock("job-42", None);
        let second = client.clone().get_lock("job-42", None);

        assert!(first.try_acquire(Duration::from_secs(10)).unwrap());
        assert!(!second.try_acquire(Duration::from_secs(10)).unwrap());
        assert!(first.release().unwrap());
        assert!(second.try_acquire(Duration::from_secs(10)).unwrap());
        assert!(second.release().unwrap());
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let result = LockClient::new(LockConfig::default().with_pool_size(0));
        assert!(matches!(result, Err(LockError::ConfigError(_))));
    }

    #[test]
    fn test_with_gateway_rejects_zero_retry_delay() {
        let config = LockConfig::default().with_retry_delay(Duration::ZERO);
        let result = LockClient::with_gateway(config, Arc::new(MemoryStore::new()));
        assert!(matches!(result, Err(LockError::ConfigError(_))));
    }
}
