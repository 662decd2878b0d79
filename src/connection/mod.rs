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
mod blocking;
mod non_blocking;

pub use blocking::*;
pub use non_blocking::*;

use redis::{ConnectionInfo, IntoConnectionInfo};

use crate::config::LockConfig;
use crate::errors::LockResult;

/// Resolve the configured URL, applying the database and password overrides.
pub(crate) fn connection_info(config: &LockConfig) -> LockResult<ConnectionInfo> {
    let mut info = config.url.as_str().into_connection_info()?;
    if let Some(db) = config.database {
        info.redis.db = db;
    }
    if let Some(password) = &config.password {
        info.redis.password = Some(password.clone());
    }
    Ok(info)
}
