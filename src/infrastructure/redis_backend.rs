//! Redis-backed quota store.
//!
//! Shares quota state across multiple service instances so they enforce a
//! single consistent limit per actor. The whole quota check runs inside
//! one server-side Lua script, which Redis executes atomically: no other
//! command interleaves between the script's read of the configuration and
//! state and its conditional write. Cross-process races are eliminated by
//! construction rather than by optimistic retry.
//!
//! ## Data layout
//!
//! Both records are stored as plain Redis lists under a configurable
//! prefix (default `arl:`):
//!
//! - `arl:<event_type>` - `[max_allowed, over_interval, lockout_interval]`
//! - `arl:<event_type>:<actor>` - `[score, last_updated_at, last_blocked_at]`,
//!   with a TTL of `over_interval + lockout_interval` so idle actors'
//!   state self-expires.
//!
//! ## Script lifecycle
//!
//! The script is registered once at connect time via `SCRIPT LOAD` and
//! invoked by SHA. Redis may evict cached scripts (restarts,
//! `SCRIPT FLUSH`); on a `NOSCRIPT` reply the backend re-registers the
//! script and retries the call exactly once. Any remaining failure is
//! surfaced to the caller unchanged.

use crate::application::ports::{QuotaBackend, QuotaError};
use crate::domain::config::EventTypeConfig;
use crate::domain::state::ActorState;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{Client, ErrorKind, RedisError};
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Marker the script embeds in its error reply when the event type has
/// no stored configuration. The client maps replies containing it to
/// [`QuotaError::ConfigNotDefined`].
const NO_CONFIG_MARKER: &str = "No config found";

/// The atomic quota check.
///
/// Mirrors `crate::domain::quota::evaluate` exactly; both must change in
/// lockstep. KEYS[1] is the configuration list, KEYS[2] the actor state
/// list. ARGV[1] is the caller's unix timestamp, ARGV[2] the event count
/// (0 for a peek).
const QUOTA_SCRIPT: &str = r#"
local config = redis.call('lrange', KEYS[1], 0, -1)
if not next(config) then
  return redis.error_reply('No config found for event type - '..KEYS[1])
end

local max_allowed = tonumber(config[1])
local over_interval = tonumber(config[2])
local lockout_interval = tonumber(config[3])
local expire_in = over_interval + lockout_interval

local t1 = tonumber(ARGV[1])
local count = tonumber(ARGV[2]) or 0

local key = KEYS[2]
local tuple = redis.call('lrange', key, 0, -1)
-- Tuple format: {score, last_updated_at, last_blocked_at}

local score

if not next(tuple) then
  score = count
  if count > 0 then
    redis.call('rpush', key, score, t1, 0)
    redis.call('expire', key, expire_in)
  end
else
  score = tonumber(tuple[1])
  local t0 = tonumber(tuple[2])
  local blocked_at = tonumber(tuple[3])

  -- Scores only move on counted events outside the lockout window.
  -- Zero-count peeks report the stored score undecayed.
  if count > 0 and t1 - blocked_at > lockout_interval then
    score = score - (max_allowed / over_interval) * (t1 - t0)
    if score < 0 then
      score = 0
    end

    score = score + count
    if score >= max_allowed then
      score = max_allowed
      redis.call('lset', key, 2, t1)
    end

    redis.call('lset', key, 0, string.format('%.4f', score))
    redis.call('lset', key, 1, t1)
    redis.call('expire', key, expire_in)
  end
end

return tostring(1.0 - score / max_allowed)
"#;

/// Configuration for the Redis backend.
#[derive(Debug, Clone)]
pub struct RedisBackendConfig {
    /// Prefix applied to every key (default: `arl:`). Lets several
    /// limiters, or tests, share one Redis without colliding.
    pub key_prefix: String,
}

impl Default for RedisBackendConfig {
    fn default() -> Self {
        Self {
            key_prefix: "arl:".to_string(),
        }
    }
}

/// Redis implementation of [`QuotaBackend`].
///
/// Cheap to clone; clones share the underlying connection.
pub struct RedisBackend {
    connection: Arc<RwLock<ConnectionManager>>,
    config: RedisBackendConfig,
    /// SHA1 of [`QUOTA_SCRIPT`] as registered with the server. The
    /// digest is a pure function of the script text, so re-registration
    /// after eviction always yields the same value.
    script_sha: String,
}

impl fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisBackend")
            .field("config", &self.config)
            .field("script_sha", &self.script_sha)
            .finish_non_exhaustive()
    }
}

impl Clone for RedisBackend {
    fn clone(&self) -> Self {
        Self {
            connection: Arc::clone(&self.connection),
            config: self.config.clone(),
            script_sha: self.script_sha.clone(),
        }
    }
}

impl RedisBackend {
    /// Connect to Redis with the default configuration.
    ///
    /// # Errors
    /// Returns an error if the connection or the initial script
    /// registration fails.
    pub async fn connect(url: &str) -> Result<Self, RedisError> {
        Self::connect_with_config(url, RedisBackendConfig::default()).await
    }

    /// Connect to Redis with a custom configuration.
    ///
    /// # Errors
    /// Returns an error if the connection or the initial script
    /// registration fails.
    pub async fn connect_with_config(
        url: &str,
        config: RedisBackendConfig,
    ) -> Result<Self, RedisError> {
        let client = Client::open(url)?;
        let mut connection = ConnectionManager::new(client).await?;

        let script_sha = load_script(&mut connection).await?;

        Ok(Self {
            connection: Arc::new(RwLock::new(connection)),
            config,
            script_sha,
        })
    }

    /// SHA1 digest of the registered quota script.
    pub fn script_sha(&self) -> &str {
        &self.script_sha
    }

    fn config_key(&self, event_type: &str) -> String {
        format!("{}{}", self.config.key_prefix, event_type)
    }

    fn state_key(&self, event_type: &str, actor: &str) -> String {
        format!("{}{}:{}", self.config.key_prefix, event_type, actor)
    }

    async fn eval_quota(
        &self,
        config_key: &str,
        state_key: &str,
        now: i64,
        count: u32,
    ) -> Result<f64, RedisError> {
        let mut conn = self.connection.write().await;

        let first = invoke_script(&mut conn, &self.script_sha, config_key, state_key, now, count)
            .await;
        match first {
            Err(err) if err.kind() == ErrorKind::NoScriptError => {
                // The server's script cache was flushed; re-register and
                // retry exactly once.
                tracing::debug!("quota script missing from server cache, re-registering");
                load_script(&mut conn).await?;
                invoke_script(&mut conn, &self.script_sha, config_key, state_key, now, count)
                    .await
            }
            other => other,
        }
    }
}

/// Register the quota script, returning its SHA1 digest.
async fn load_script(conn: &mut ConnectionManager) -> Result<String, RedisError> {
    redis::cmd("SCRIPT")
        .arg("LOAD")
        .arg(QUOTA_SCRIPT)
        .query_async(conn)
        .await
}

async fn invoke_script(
    conn: &mut ConnectionManager,
    sha: &str,
    config_key: &str,
    state_key: &str,
    now: i64,
    count: u32,
) -> Result<f64, RedisError> {
    redis::cmd("EVALSHA")
        .arg(sha)
        .arg(2)
        .arg(config_key)
        .arg(state_key)
        .arg(now)
        .arg(count)
        .query_async(conn)
        .await
}

fn parse_config(fields: &[String]) -> Option<EventTypeConfig> {
    // A list that is missing fields, or holds unparsable ones, is
    // treated as no configuration at all.
    let [max_allowed, over_interval, lockout_interval] = fields else {
        return None;
    };
    EventTypeConfig::new(
        max_allowed.parse().ok()?,
        over_interval.parse().ok()?,
        lockout_interval.parse().ok()?,
    )
    .ok()
}

fn parse_state(fields: &[String]) -> Option<ActorState> {
    let [score, last_updated_at, last_blocked_at] = fields else {
        return None;
    };
    Some(ActorState {
        score: score.parse().ok()?,
        last_updated_at: last_updated_at.parse().ok()?,
        last_blocked_at: last_blocked_at.parse().ok()?,
    })
}

#[async_trait]
impl QuotaBackend for RedisBackend {
    async fn put_config(
        &self,
        event_type: &str,
        config: &EventTypeConfig,
    ) -> Result<(), QuotaError> {
        let key = self.config_key(event_type);
        let mut conn = self.connection.write().await;

        // MULTI/EXEC so no reader observes a partially written tuple.
        redis::pipe()
            .atomic()
            .del(&key)
            .ignore()
            .rpush(
                &key,
                vec![
                    i64::from(config.max_allowed()),
                    config.over_interval() as i64,
                    config.lockout_interval() as i64,
                ],
            )
            .ignore()
            .query_async::<()>(&mut *conn)
            .await?;

        Ok(())
    }

    async fn fetch_config(&self, event_type: &str) -> Result<Option<EventTypeConfig>, QuotaError> {
        let key = self.config_key(event_type);
        let mut conn = self.connection.write().await;

        let fields: Vec<String> = redis::cmd("LRANGE")
            .arg(&key)
            .arg(0)
            .arg(-1)
            .query_async(&mut *conn)
            .await?;

        Ok(parse_config(&fields))
    }

    async fn apply(
        &self,
        event_type: &str,
        actor: &str,
        now: i64,
        count: u32,
    ) -> Result<f64, QuotaError> {
        let config_key = self.config_key(event_type);
        let state_key = self.state_key(event_type, actor);

        match self.eval_quota(&config_key, &state_key, now, count).await {
            Ok(remaining) => Ok(remaining),
            Err(err) if err.to_string().contains(NO_CONFIG_MARKER) => {
                Err(QuotaError::ConfigNotDefined(event_type.to_owned()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn fetch_state(
        &self,
        event_type: &str,
        actor: &str,
        _now: i64,
    ) -> Result<Option<ActorState>, QuotaError> {
        // Expiry is Redis's own: an expired key simply reads back empty.
        let key = self.state_key(event_type, actor);
        let mut conn = self.connection.write().await;

        let fields: Vec<String> = redis::cmd("LRANGE")
            .arg(&key)
            .arg(0)
            .arg(-1)
            .query_async(&mut *conn)
            .await?;

        Ok(parse_state(&fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_complete_tuple() {
        let fields = vec!["10".to_string(), "3600".to_string(), "300".to_string()];
        let config = parse_config(&fields).unwrap();
        assert_eq!(config.max_allowed(), 10);
        assert_eq!(config.over_interval(), 3600);
        assert_eq!(config.lockout_interval(), 300);
    }

    #[test]
    fn test_parse_config_partial_tuple_is_absent() {
        assert_eq!(parse_config(&[]), None);
        assert_eq!(parse_config(&["10".to_string()]), None);
        assert_eq!(parse_config(&["10".to_string(), "3600".to_string()]), None);
    }

    #[test]
    fn test_parse_config_garbage_is_absent() {
        let fields = vec!["ten".to_string(), "3600".to_string(), "300".to_string()];
        assert_eq!(parse_config(&fields), None);
    }

    #[test]
    fn test_parse_state_round_trip() {
        let fields = vec![
            "7.5000".to_string(),
            "1700000000".to_string(),
            "0".to_string(),
        ];
        let state = parse_state(&fields).unwrap();
        assert_eq!(state.score, 7.5);
        assert_eq!(state.last_updated_at, 1_700_000_000);
        assert_eq!(state.last_blocked_at, 0);
    }

    #[test]
    fn test_parse_state_partial_tuple_is_absent() {
        assert_eq!(parse_state(&["7.5".to_string()]), None);
    }

    #[test]
    fn test_key_layout() {
        let config = RedisBackendConfig::default();
        assert_eq!(config.key_prefix, "arl:");
    }
}
