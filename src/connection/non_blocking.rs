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
use deadpool::managed::Metrics;
use deadpool::Runtime;
use redis::Client;
use std::time::Duration;

use crate::config::LockConfig;
use crate::connection::connection_info;
use crate::errors::LockResult;

type AsyncRedisPool = deadpool::managed::Pool<AsyncSingleRedisConnectionManager>;

pub type AsyncRedisConnection = deadpool::managed::Object<AsyncSingleRedisConnectionManager>;

pub struct AsyncSingleRedisConnectionManager {
    client: Client,
}

#[async_trait::async_trait]
impl deadpool::managed::Manager for AsyncSingleRedisConnectionManager {
    type Type = redis::aio::MultiplexedConnection;
    type Error = redis::RedisError;

    async fn create(&self) -> Result<Self::Type, Self::Error> {
        self.client.get_multiplexed_async_connection().await
    }

    async fn recycle(&self, conn: &mut Self::Type, _metrics: &Metrics) -> deadpool::managed::RecycleResult<Self::Error> {
        // Check that the connection is still valid
        let pong: redis::RedisResult<String> = redis::cmd("PING").query_async(conn).await;
        match pong {
            Ok(pong) if pong == "PONG" => Ok(()),
            Ok(_) => Err(deadpool::managed::RecycleError::Message("Invalid PONG response".into())),
            Err(e) => Err(deadpool::managed::RecycleError::Backend(e)),
        }
    }
}

// Asynchronous connection manager
pub struct AsyncRedisConnectionManager {
    pool: AsyncRedisPool,
    response_timeout: Duration,
}

impl AsyncRedisConnectionManager {
    pub async fn new(config: &LockConfig) -> LockResult<Self> {
        config.validate()?;

        let client = Client::open(connection_info(config)?)?;
        let pool = deadpool::managed::Pool::builder(AsyncSingleRedisConnectionManager { client })
            .max_size(config.pool_size as usize)
            .wait_timeout(Some(config.connection_timeout))
            .create_timeout(Some(config.connection_timeout))
            .runtime(Runtime::Tokio1)
            .build()?;

        Ok(Self {
            pool,
            response_timeout: config.response_timeout,
        })
    }

    pub async fn get_connection(&self) -> LockResult<AsyncRedisConnection> {
        Ok(self.pool.get().await?)
    }

    /// Upper bound on a single store round trip
    pub fn response_timeout(&self) -> Duration {
        self.response_timeout
    }
}
