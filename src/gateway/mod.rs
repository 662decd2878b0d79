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
//! The three conditional primitives a lock needs from the shared store.
//!
//! Every call mutates remote state at most once and never retries; retry policy
//! belongs to the lock and the watchdog.
mod blocking;
mod memory;
mod non_blocking;

pub use blocking::*;
pub use memory::*;
pub use non_blocking::*;

use async_trait::async_trait;
use std::time::Duration;

use crate::LockResult;

/// Blocking store gateway
pub trait StoreGateway: Send + Sync {
    /// Create `key -> token` only if the key is absent. A zero `ttl` writes a non-expiring entry.
    ///
    /// Also succeeds, resetting the TTL, when `key` already holds `token`: an attempt
    /// retried after its reply was lost must not be locked out by its own write.
    fn set_if_absent(&self, key: &str, token: &str, ttl: Duration) -> LockResult<bool>;

    /// Atomically reset the TTL of `key` if it still holds `token`.
    fn compare_and_extend(&self, key: &str, token: &str, ttl: Duration) -> LockResult<bool>;

    /// Atomically delete `key` if it still holds `token`.
    fn compare_and_delete(&self, key: &str, token: &str) -> LockResult<bool>;
}

/// Asynchronous version of [`StoreGateway`]
#[async_trait]
pub trait AsyncStoreGateway: Send + Sync {
    async fn set_if_absent(&self, key: &str, token: &str, ttl: Duration) -> LockResult<bool>;
    async fn compare_and_extend(&self, key: &str, token: &str, ttl: Duration) -> LockResult<bool>;
    async fn compare_and_delete(&self, key: &str, token: &str) -> LockResult<bool>;
}
