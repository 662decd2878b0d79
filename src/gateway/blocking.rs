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

use crate::gateway::StoreGateway;
use crate::{num_milliseconds, scripts, LockResult, SyncRedisConnectionManager};

/// [`StoreGateway`] over a pooled, blocking Redis connection
pub struct RedisStoreGateway {
    connection_manager: Arc<SyncRedisConnectionManager>,
}

impl RedisStoreGateway {
    pub fn new(connection_manager: Arc<SyncRedisConnectionManager>) -> Self {
        Self { connection_manager }
    }

    pub fn get_connection_manager(&self) -> &Arc<SyncRedisConnectionManager> {
        &self.connection_manager
    }
}

impl StoreGateway for RedisStoreGateway {
    fn set_if_absent(&self, key: &str, token: &str, ttl: Duration) -> LockResult<bool> {
        let mut conn = self.connection_manager.get_connection()?;
        let acquired: i64 = scripts::ACQUIRE_SCRIPT
            .key(key)
            .arg(token)
            .arg(num_milliseconds(&ttl))
            .invoke(&mut *conn)?;
        Ok(acquired == 1)
    }

    fn compare_and_extend(&self, key: &str, token: &str, ttl: Duration) -> LockResult<bool> {
        let mut conn = self.connection_manager.get_connection()?;
        let renewed: i64 = scripts::RENEW_SCRIPT
            .key(key)
            .arg(token)
            .arg(num_milliseconds(&ttl))
            .invoke(&mut *conn)?;
        Ok(renewed == 1)
    }

    fn compare_and_delete(&self, key: &str, token: &str) -> LockResult<bool> {
        let mut conn = self.connection_manager.get_connection()?;
        let released: i64 = scripts::UNLOCK_SCRIPT
            .key(key)
            .arg(token)
            .invoke(&mut *conn)?;
        Ok(released == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LockConfig;

    fn redis_url() -> String {
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string())
    }

    #[test]
    #[ignore = "requires a running Redis server (REDIS_URL)"]
    fn test_redis_gateway_round_trip() {
        let config = LockConfig::single_server(&redis_url());
        let manager = Arc::new(SyncRedisConnectionManager::new(&config).unwrap());
        let gateway = RedisStoreGateway::new(manager);
        let key = format!("redis-lock:test:{}", crate::get_lock_id());

        assert!(gateway.set_if_absent(&key, "a", Duration::from_secs(5)).unwrap());
        assert!(!gateway.set_if_absent(&key, "b", Duration::from_secs(5)).unwrap());
        assert!(gateway.set_if_absent(&key, "a", Duration::from_secs(5)).unwrap());

        assert!(gateway.compare_and_extend(&key, "a", Duration::from_secs(10)).unwrap());
        assert!(!gateway.compare_and_extend(&key, "b", Duration::from_secs(10)).unwrap());

        assert!(!gateway.compare_and_delete(&key, "b").unwrap());
        assert!(gateway.compare_and_delete(&key, "a").unwrap());
        assert!(!gateway.compare_and_delete(&key, "a").unwrap());
    }
}
