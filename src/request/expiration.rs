//! Expiration Policy
//!
//! Computes when an entry goes stale (soft expiry) and when it must be
//! purged even for fallback reads (hard delete).

use std::time::Duration;

use chrono::{DateTime, Local, TimeZone};
use serde_json::Value;

use crate::request::Params;

/// Absolute expiry instant: Unix milliseconds or an RFC 3339 string
pub const EXPIRE_TIME_PARAM: &str = "dtExpireTime";

/// Relative expiry in milliseconds, may be negative
pub const MAX_AGE_PARAM: &str = "dtMaxAge";

/// Default time a stale entry stays available for fallback reads
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(7 * 24 * 60 * 60);

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

// == Expiration ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expiration {
    /// Unix milliseconds after which normal reads miss
    pub soft_expire_at: i64,
    /// Unix milliseconds after which the entry is removed; never before soft expiry
    pub hard_delete_at: i64,
}

// == Expiration Policy ==
#[derive(Debug, Clone, Copy)]
pub struct ExpirationPolicy {
    grace_period_ms: i64,
}

impl Default for ExpirationPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_GRACE_PERIOD)
    }
}

impl ExpirationPolicy {
    pub fn new(grace_period: Duration) -> Self {
        Self {
            grace_period_ms: i64::try_from(grace_period.as_millis()).unwrap_or(i64::MAX),
        }
    }

    /// Resolves expiry from the request params.
    ///
    /// Priority: `dtExpireTime`, then `now + dtMaxAge`, then the end of the
    /// current local day. Unparseable directives are ignored.
    pub fn compute(&self, params: &Params, now_ms: i64) -> Expiration {
        let soft_expire_at = params
            .get(EXPIRE_TIME_PARAM)
            .and_then(parse_instant)
            .or_else(|| {
                params
                    .get(MAX_AGE_PARAM)
                    .and_then(parse_millis)
                    .map(|max_age| now_ms.saturating_add(max_age))
            })
            .unwrap_or_else(|| end_of_day_ms(now_ms));

        Expiration {
            soft_expire_at,
            hard_delete_at: soft_expire_at.saturating_add(self.grace_period_ms),
        }
    }
}

/// Returns 23:59:59.999 local time on the day containing `now_ms`.
///
/// Falls back to the end of the UTC day if the local zone cannot represent
/// that instant.
pub fn end_of_day_ms(now_ms: i64) -> i64 {
    Local
        .timestamp_millis_opt(now_ms)
        .single()
        .and_then(|now| now.date_naive().and_hms_milli_opt(23, 59, 59, 999))
        .and_then(|end| end.and_local_timezone(Local).latest())
        .map(|end| end.timestamp_millis())
        .unwrap_or_else(|| now_ms - now_ms.rem_euclid(DAY_MS) + DAY_MS - 1)
}

fn parse_millis(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
        }
        _ => None,
    }
}

fn parse_instant(value: &Value) -> Option<i64> {
    parse_millis(value).or_else(|| {
        value
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
            .map(|instant| instant.timestamp_millis())
    })
}
