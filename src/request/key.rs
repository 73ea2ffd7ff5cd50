//! Key Canonicalizer
//!
//! Derives the cache key of a request from its path, any query string
//! embedded in it, and the explicit parameters.

use std::collections::{BTreeMap, HashSet};

use serde_json::Value;
use url::form_urlencoded;

use crate::request::Params;

/// Parameter names containing this marker are cache directives, never identity.
pub const DIRECTIVE_MARKER: &str = "__";

/// Parameters that vary per call or carry credentials.
pub const DEFAULT_VOLATILE_PARAMS: &[&str] = &[
    "_",
    "_t",
    "timestamp",
    "callback",
    "jsonp",
    "jsonpCallback",
    "token",
    "_tb_token_",
    "csrf_token",
    "_csrf",
    "dtExpireTime",
    "dtMaxAge",
];

// == Key Canonicalizer ==
#[derive(Debug, Clone)]
pub struct KeyCanonicalizer {
    volatile: HashSet<String>,
}

impl Default for KeyCanonicalizer {
    fn default() -> Self {
        Self::new(DEFAULT_VOLATILE_PARAMS.iter().copied())
    }
}

impl KeyCanonicalizer {
    /// Creates a canonicalizer that ignores the given parameter names.
    pub fn new<I, S>(volatile_params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            volatile: volatile_params.into_iter().map(Into::into).collect(),
        }
    }

    // == Canonicalize ==
    /// Builds `path-?k1=v1&k2=v2` with keys sorted, or `path-` with no params.
    ///
    /// Explicit params override same-named query params embedded in `url`.
    pub fn canonicalize(&self, url: &str, params: &Params) -> String {
        let url = url.split_once('#').map_or(url, |(head, _)| head);
        let (path, query) = match url.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (url, None),
        };

        let mut merged: BTreeMap<String, String> = BTreeMap::new();
        if let Some(query) = query {
            for (name, value) in form_urlencoded::parse(query.as_bytes()) {
                merged.insert(name.into_owned(), value.into_owned());
            }
        }
        for (name, value) in params {
            merged.insert(name.clone(), stringify(value));
        }

        let query = merged
            .iter()
            .filter(|(name, _)| self.is_identity_param(name))
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("&");

        if query.is_empty() {
            format!("{}-", path)
        } else {
            format!("{}-?{}", path, query)
        }
    }

    /// Returns true if the parameter takes part in the cache key.
    pub fn is_identity_param(&self, name: &str) -> bool {
        !name.contains(DIRECTIVE_MARKER) && !self.volatile.contains(name)
    }
}

/// Renders a parameter value without type information.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
