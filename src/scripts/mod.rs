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
use once_cell::sync::Lazy;
use redis::Script;

/// Acquire script: `SET NX` that also accepts a replay of the token already stored
///
/// KEYS[1] lock key, ARGV[1] ownership token, ARGV[2] lease in milliseconds (0 = no expiry)
pub static ACQUIRE_SCRIPT: Lazy<Script> = Lazy::new(|| {
    Script::new(r#"
        local key = KEYS[1]
        local token = ARGV[1]
        local ttl = tonumber(ARGV[2])

        local current = redis.call('get', key)
        if current == false then
            if ttl > 0 then
                redis.call('set', key, token, 'PX', ttl)
            else
                redis.call('set', key, token)
            end
            return 1  -- Lock acquisition successfully
        end

        -- An earlier attempt with this token landed but its reply was lost
        if current == token then
            if ttl > 0 then
                redis.call('pexpire', key, ttl)
            else
                redis.call('persist', key)
            end
            return 1
        end

        return 0  -- The lock is held by another token
    "#)
});

/// Renewal script
///
/// KEYS[1] lock key, ARGV[1] ownership token, ARGV[2] lease in milliseconds (0 = no expiry)
pub static RENEW_SCRIPT: Lazy<Script> = Lazy::new(|| {
    Script::new(r#"
        local key = KEYS[1]
        local token = ARGV[1]
        local ttl = tonumber(ARGV[2])

        -- Only the current holder may extend the lease
        if redis.call('get', key) == token then
            if ttl > 0 then
                redis.call('pexpire', key, ttl)
            else
                redis.call('persist', key)
            end
            return 1  -- Successful renewal
        end

        return 0  -- The token no longer owns the key
    "#)
});

/// Unlock script
///
/// KEYS[1] lock key, ARGV[1] ownership token
pub static UNLOCK_SCRIPT: Lazy<Script> = Lazy::new(|| {
    Script::new(r#"
        local key = KEYS[1]
        local token = ARGV[1]

        if redis.call('get', key) == token then
            redis.call('del', key)
            return 1  -- Lock released
        end

        return 0  -- Held by someone else, or already expired
    "#)
});
