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
//! Mutual exclusion over a shared Redis server.
//!
//! A lock is a single key whose value is a fresh ownership token. It is taken
//! with `SET NX`, kept alive by an optional watchdog that re-extends the TTL
//! while the token still matches, and released by a compare-and-delete script
//! so a holder can never remove somebody else's lease.
//!
//! ```no_run
//! use redis_lock::{LockClient, LockConfig, LockResult};
//! use std::time::Duration;
//!
//! fn main() -> LockResult<()> {
//!     let client = LockClient::new(LockConfig::single_server("redis://127.0.0.1:6379"))?;
//!     let lock = client.get_lock("job-42", Some(Duration::from_secs(3)));
//!
//!     if lock.acquire_within(Duration::from_secs(2), Duration::from_secs(10))? {
//!         // Execute protected code
//!         lock.release()?;
//!     }
//!     Ok(())
//! }
//! ```
mod config;
mod errors;
mod util;
mod client;
mod lock;
mod scripts;
mod connection;
mod gateway;

pub use config::*;
pub use errors::*;
pub use util::*;
pub use client::*;
pub use lock::*;
pub use scripts::*;
pub use connection::*;
pub use gateway::*;
