//! Option resolution: defaults + call options -> [`RequestConfig`].

use http::{HeaderMap, HeaderName, HeaderValue, Method};
use tracing::warn;
use url::Url;

use crate::config::DEFAULT_TIMEOUT;
use crate::{FetchOptions, RequestConfig};

/// Merge call options over factory defaults and resolve the target address.
pub fn resolve(defaults: &FetchOptions, call: FetchOptions, target: impl Into<String>) -> RequestConfig {
    let options = defaults.overlay(call);

    let target = append_query(target, &options.query);
    let url = match options.base_url.as_deref() {
        Some(base) => resolve_base_url(base, &target),
        None => target,
    };

    RequestConfig {
        url,
        method: options.method.unwrap_or(Method::GET),
        headers: merge_headers(&options.headers, &[]),
        body: options.body,
        timeout: options.timeout.unwrap_or(DEFAULT_TIMEOUT),
        retry: options.retry.unwrap_or(false),
        response_type: options.response_type.unwrap_or_default(),
        interceptors: options.interceptors,
    }
}

/// Union two header lists into one container, `overrides` winning per name.
///
/// Names compare case-insensitively. Entries that are not valid header
/// names or values are skipped.
pub fn merge_headers(defaults: &[(String, String)], overrides: &[(String, String)]) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(defaults.len() + overrides.len());

    for (name, value) in defaults.iter().chain(overrides) {
        match (
            HeaderName::try_from(name.as_str()),
            HeaderValue::try_from(value.as_str()),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => warn!(header = %name, "Skipping invalid header"),
        }
    }

    headers
}

/// Append `key=value` pairs to `target`.
///
/// Values are not percent-encoded. A single `?` separates the pairs from
/// the address unless the address already ends with one.
pub fn append_query(target: impl Into<String>, query: &[(String, String)]) -> String {
    let mut target = target.into();
    if query.is_empty() {
        return target;
    }

    if !target.ends_with('?') {
        target.push('?');
    }
    let joined = query
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");
    target.push_str(&joined);
    target
}

/// Resolve `target` against `base` with standard URL rules.
///
/// Falls back to `target` verbatim when resolution fails; the transport
/// then reports the malformed address.
pub fn resolve_base_url(base: &str, target: &str) -> String {
    let resolved = Url::parse(base)
        .and_then(|base| base.join(target))
        .or_else(|_| Url::parse(target));

    match resolved {
        Ok(url) => url.into(),
        Err(e) => {
            warn!(base = %base, target = %target, error = %e, "Could not resolve URL");
            target.to_string()
        }
    }
}
