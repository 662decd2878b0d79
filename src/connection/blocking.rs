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
use r2d2::{Pool, PooledConnection};
use redis::Client;
use std::time::Duration;

use crate::config::LockConfig;
use crate::connection::connection_info;
use crate::errors::LockResult;

type RedisPool = Pool<Client>;

pub type RedisConnection = PooledConnection<Client>;

// Synchronize the connection manager
pub struct SyncRedisConnectionManager {
    pool: RedisPool,
    response_timeout: Duration,
}

impl SyncRedisConnectionManager {
    pub fn new(config: &LockConfig) -> LockResult<Self> {
        config.validate()?;

        let client = Client::open(connection_info(config)?)?;
        let pool = Pool::builder()
            .max_size(config.pool_size)
            .connection_timeout(config.connection_timeout)
            .build(client)?;

        Ok(Self {
            pool,
            response_timeout: config.response_timeout,
        })
    }

    /// Check out a pooled connection with the response timeout applied to its socket.
    pub fn get_connection(&self) -> LockResult<RedisConnection> {
        let conn = self.pool.get()?;
        conn.set_read_timeout(Some(self.response_timeout))?;
        conn.set_write_timeout(Some(self.response_timeout))?;
        Ok(conn)
    }

    pub fn pool_state(&self) -> r2d2::State {
        self.pool.state()
    }
}
