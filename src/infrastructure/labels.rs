//! Static label resolution.
//!
//! Configured label values may carry `${hostname}` and `${worker_id}`
//! placeholders. They are expanded exactly once, when the filter is built;
//! record processing never re-reads the environment. An unrecognized
//! placeholder refuses the configuration.

use crate::application::config::ConfigError;
use std::collections::BTreeMap;

/// Expand placeholders in every configured label value.
///
/// Returns the resolved `(key, value)` pairs in map order.
pub fn resolve(
    labels: &BTreeMap<String, String>,
    worker_id: u32,
) -> Result<Vec<(String, String)>, ConfigError> {
    let hostname = local_hostname();
    let worker = worker_id.to_string();

    labels
        .iter()
        .map(|(key, value)| {
            let resolved = expand(value, &hostname, &worker).map_err(|placeholder| {
                ConfigError::UnknownPlaceholder {
                    label: key.clone(),
                    placeholder,
                }
            })?;
            Ok((key.clone(), resolved))
        })
        .collect()
}

/// Sanitize a field path into a metric label identifier.
///
/// Label names are restricted to `[A-Za-z0-9_]`; anything else (the dots
/// of a path, dashes, slashes) maps to `_`, and a leading digit gets a
/// `_` prefix.
pub fn sanitize(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 1);
    for (i, c) in path.chars().enumerate() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if i == 0 && c.is_ascii_digit() {
                out.push('_');
            }
            out.push(c);
        } else {
            out.push('_');
        }
    }
    out
}

/// Replace `${...}` occurrences in one label value.
///
/// Returns the offending placeholder text on an unknown name.
fn expand(value: &str, hostname: &str, worker: &str) -> Result<String, String> {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = match after.find('}') {
            Some(end) => end,
            // An unterminated `${` is taken literally.
            None => {
                out.push_str(&rest[start..]);
                return Ok(out);
            }
        };
        match &after[..end] {
            "hostname" => out.push_str(hostname),
            "worker_id" => out.push_str(worker),
            unknown => return Err(format!("${{{}}}", unknown)),
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

fn local_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}
