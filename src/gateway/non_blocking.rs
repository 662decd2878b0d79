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
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::gateway::AsyncStoreGateway;
use crate::{num_milliseconds, scripts, AsyncRedisConnectionManager, LockResult};

/// [`AsyncStoreGateway`] over a deadpool-managed multiplexed Redis connection
pub struct AsyncRedisStoreGateway {
    connection_manager: Arc<AsyncRedisConnectionManager>,
}

impl AsyncRedisStoreGateway {
    pub fn new(connection_manager: Arc<AsyncRedisConnectionManager>) -> Self {
        Self { connection_manager }
    }

    pub fn get_connection_manager(&self) -> &Arc<AsyncRedisConnectionManager> {
        &self.connection_manager
    }
}

#[async_trait]
impl AsyncStoreGateway for AsyncRedisStoreGateway {
    async fn set_if_absent(&self, key: &str, token: &str, ttl: Duration) -> LockResult<bool> {
        let mut conn = self.connection_manager.get_connection().await?;
        let mut invocation = scripts::ACQUIRE_SCRIPT.key(key);
        invocation.arg(token).arg(num_milliseconds(&ttl));
        let acquired: i64 = timeout(
            self.connection_manager.response_timeout(),
            invocation.invoke_async(&mut *conn),
        )
        .await??;
        Ok(acquired == 1)
    }

    async fn compare_and_extend(&self, key: &str, token: &str, ttl: Duration) -> LockResult<bool> {
        let mut conn = self.connection_manager.get_connection().await?;
        let mut invocation = scripts::RENEW_SCRIPT.key(key);
        invocation.arg(token).arg(num_milliseconds(&ttl));
        let renewed: i64 = timeout(
            self.connection_manager.response_timeout(),
            invocation.invoke_async(&mut *conn),
        )
        .await??;
        Ok(renewed == 1)
    }

    async fn compare_and_delete(&self, key: &str, token: &str) -> LockResult<bool> {
        let mut conn = self.connection_manager.get_connection().await?;
        let mut invocation = scripts::UNLOCK_SCRIPT.key(key);
        invocation.arg(token);
        let released: i64 = timeout(
            self.connection_manager.response_timeout(),
            invocation.invoke_async(&mut *conn),
        )
        .await??;
        Ok(released == 1)
    }
}
