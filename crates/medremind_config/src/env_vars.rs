//! Environment naming for MedRemind configuration and secrets.
//!
//! Plain settings are overridden through `MEDREMIND__<SECTION>__<KEY>`, which
//! the `config` crate handles. Credentials such as `push.access_token` or a
//! database URL with a password are written as `"secret_from_env"` in config
//! files and resolved here from `MEDREMIND_SECRET_<SECTION>_<KEY>`.

use serde_json::Value;
use std::env;
use tracing::warn;

/// The default prefix for configuration environment variables
pub const DEFAULT_PREFIX: &str = "MEDREMIND";

pub const SECRET_PREFIX: &str = "MEDREMIND_SECRET";

/// Separator between prefix, section and key for plain overrides
pub const CONFIG_SEPARATOR: &str = "__";

/// Placeholder value replaced from the secret environment variables
pub const SECRET_MARKER: &str = "secret_from_env";

/// Prefix for plain overrides; `PREFIX` may change it for side-by-side deployments
pub fn get_config_prefix() -> String {
    env::var("PREFIX").unwrap_or_else(|_| DEFAULT_PREFIX.to_string())
}

/// Name of the variable holding the secret at a dotted config path
///
/// `push.access_token` maps to `MEDREMIND_SECRET_PUSH_ACCESS_TOKEN`.
pub fn secret_env_var<S: AsRef<str>>(path: &[S]) -> String {
    let mut name = SECRET_PREFIX.to_string();
    for segment in path {
        name.push('_');
        name.push_str(&segment.as_ref().to_uppercase());
    }
    name
}

/// Replaces every [`SECRET_MARKER`] in `value` from its secret variable
///
/// Markers without a matching variable are left in place and logged, so the
/// consumer can tell an unset secret from an empty one. Returns the number
/// of markers replaced.
pub fn inject_env_vars(value: &mut Value) -> usize {
    let mut path = Vec::new();
    resolve_markers(value, &mut path)
}

fn resolve_markers(value: &mut Value, path: &mut Vec<String>) -> usize {
    match value {
        Value::Object(map) => map
            .iter_mut()
            .map(|(key, child)| {
                path.push(key.clone());
                let replaced = resolve_markers(child, path);
                path.pop();
                replaced
            })
            .sum(),
        Value::String(s) if s.as_str() == SECRET_MARKER => {
            let name = secret_env_var(path.as_slice());
            match env::var(&name) {
                Ok(secret) => {
                    *s = secret;
                    1
                }
                Err(_) => {
                    warn!("{} is not set, {} stays unresolved", name, path.join("."));
                    0
                }
            }
        }
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_secret_env_var_names() {
        assert_eq!(
            secret_env_var(&["push", "access_token"]),
            "MEDREMIND_SECRET_PUSH_ACCESS_TOKEN"
        );
        assert_eq!(
            secret_env_var(&["database", "url"]),
            "MEDREMIND_SECRET_DATABASE_URL"
        );
    }

    #[test]
    fn test_inject_env_vars_replaces_marker() {
        env::set_var("MEDREMIND_SECRET_PUSHTEST_ACCESS_TOKEN", "expo-access-token");
        let mut value = json!({
            "pushtest": { "access_token": "secret_from_env", "dry_run": false }
        });

        assert_eq!(inject_env_vars(&mut value), 1);
        assert_eq!(value["pushtest"]["access_token"], "expo-access-token");
        assert_eq!(value["pushtest"]["dry_run"], false);
    }

    #[test]
    fn test_unset_secret_keeps_marker() {
        env::remove_var("MEDREMIND_SECRET_DBTEST_URL");
        let mut value = json!({ "dbtest": { "url": "secret_from_env" } });

        assert_eq!(inject_env_vars(&mut value), 0);
        assert_eq!(value["dbtest"]["url"], SECRET_MARKER);
    }
}
