//! Per-call options and parameter directives.

use std::fmt;

use serde_json::Value;

use crate::request::Params;

/// Bypass the cache for this call
pub const DISABLE_CACHE_PARAM: &str = "__disableCache";

/// Serve soft-expired data (forced fallback read)
pub const FORCE_TO_CACHE_PARAM: &str = "__forceToCache";

/// Log cache decisions for this call at info level
pub const SHOW_LOG_PARAM: &str = "__showLog";

/// Computes the identity token of a request, e.g. from the current user.
pub type IdentityKeyFn<'a> = &'a dyn Fn(&str, &Params) -> String;

// == Cache Options ==
/// Options for a single `set_cache`/`get_cache` call.
#[derive(Clone, Copy, Default)]
pub struct CacheOptions<'a> {
    /// Identity token source; absent means the empty identity
    pub identity_key: Option<IdentityKeyFn<'a>>,
    /// Serve soft-expired data, same as the `__forceToCache` directive
    pub force_to_cache: bool,
}

impl<'a> CacheOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identity(mut self, identity_key: IdentityKeyFn<'a>) -> Self {
        self.identity_key = Some(identity_key);
        self
    }

    pub fn force_to_cache(mut self) -> Self {
        self.force_to_cache = true;
        self
    }

    pub(crate) fn identity(&self, url: &str, params: &Params) -> String {
        self.identity_key
            .map(|identity_key| identity_key(url, params))
            .unwrap_or_default()
    }
}

impl fmt::Debug for CacheOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheOptions")
            .field("identity_key", &self.identity_key.is_some())
            .field("force_to_cache", &self.force_to_cache)
            .finish()
    }
}

/// Reads a directive as a flag: `true`, `"true"`, `"1"` or a non-zero number.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(s)) => s == "true" || s == "1",
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => false,
    }
}

/// Payloads that are never cached: null, `{}`, `[]` and `""`.
pub fn is_empty_payload(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}
