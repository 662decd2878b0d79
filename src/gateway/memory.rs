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
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::gateway::{AsyncStoreGateway, StoreGateway};
use crate::{LockError, LockResult};

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(value: &str, ttl: Duration) -> Self {
        Self {
            value: value.to_string(),
            expires_at: deadline(ttl),
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

fn deadline(ttl: Duration) -> Option<Instant> {
    if ttl.is_zero() {
        None
    } else {
        Some(Instant::now() + ttl)
    }
}

/// In-process store with the same atomicity as the Redis gateway: every
/// operation runs under one mutex, and TTLs expire lazily on access.
///
/// Clones share the same entries, so one `MemoryStore` can stand in for a
/// Redis server shared by several clients.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
    unavailable: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of `key`, if present and not expired.
    pub fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock();
        Self::live_entry(&mut entries, key).map(|entry| entry.value.clone())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Remaining lifetime of `key`; `Some(Duration::MAX)` for a non-expiring entry.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let mut entries = self.entries.lock();
        Self::live_entry(&mut entries, key).map(|entry| match entry.expires_at {
            Some(at) => at.saturating_duration_since(Instant::now()),
            None => Duration::MAX,
        })
    }

    /// Overwrite `key` unconditionally, as another holder would after the previous lease expired.
    pub fn put(&self, key: &str, value: &str, ttl: Duration) {
        self.entries.lock().insert(key.to_string(), Entry::new(value, ttl));
    }

    /// Drop `key` as if its TTL had just run out.
    pub fn expire_now(&self, key: &str) -> bool {
        self.entries.lock().remove(key).is_some()
    }

    /// Make every gateway call fail with [`LockError::StoreUnavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of gateway operations attempted so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn live_entry<'a>(entries: &'a mut HashMap<String, Entry>, key: &str) -> Option<&'a mut Entry> {
        let now = Instant::now();
        if entries.get(key).is_some_and(|entry| entry.is_expired(now)) {
            entries.remove(key);
        }
        entries.get_mut(key)
    }

    fn begin_call(&self) -> LockResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(LockError::StoreUnavailable("memory store is offline".to_string()));
        }
        Ok(())
    }
}

impl StoreGateway for MemoryStore {
    fn set_if_absent(&self, key: &str, token: &str, ttl: Duration) -> LockResult<bool> {
        self.begin_call()?;
        let mut entries = self.entries.lock();
        match Self::live_entry(&mut entries, key) {
            Some(entry) if entry.value == token => {
                entry.expires_at = deadline(ttl);
                Ok(true)
            }
            Some(_) => Ok(false),
            None => {
                entries.insert(key.to_string(), Entry::new(token, ttl));
                Ok(true)
            }
        }
    }

    fn compare_and_extend(&self, key: &str, token: &str, ttl: Duration) -> LockResult<bool> {
        self.begin_call()?;
        let mut entries = self.entries.lock();
        match Self::live_entry(&mut entries, key) {
            Some(entry) if entry.value == token => {
                entry.expires_at = deadline(ttl);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn compare_and_delete(&self, key: &str, token: &str) -> LockResult<bool> {
        self.begin_call()?;
        let mut entries = self.entries.lock();
        let owned = Self::live_entry(&mut entries, key).is_some_and(|entry| entry.value == token);
        if owned {
            entries.remove(key);
        }
        Ok(owned)
    }
}

#[async_trait]
impl AsyncStoreGateway for MemoryStore {
    async fn set_if_absent(&self, key: &str, token: &str, ttl: Duration) -> LockResult<bool> {
        StoreGateway::set_if_absent(self, key, token, ttl)
    }

    async fn compare_and_extend(&self, key: &str, token: &str, ttl: Duration) -> LockResult<bool> {
        StoreGateway::compare_and_extend(self, key, token, ttl)
    }

    async fn compare_and_delete(&self, key: &str, token: &str) -> LockResult<bool> {
        StoreGateway::compare_and_delete(self, key, token)
    }
}
