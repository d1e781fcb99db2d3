//! Layered settings lookup

use std::env;
use std::fs;
use std::path::Path;

const DEFAULT_SECRETS_DIR: &str = "/run/secrets";

/// Resolves a named setting from the deployment secrets directory, falling
/// back to process environment variables.
///
/// Absence is a normal outcome; callers decide whether it is fatal.
pub fn get_setting(key: &str) -> Option<String> {
    if let Some(value) = read_secret(key) {
        return Some(value);
    }
    env::var(key).ok()
}

fn read_secret(key: &str) -> Option<String> {
    let dir = env::var("SECRETS_DIR").unwrap_or_else(|_| DEFAULT_SECRETS_DIR.to_owned());
    let value = fs::read_to_string(Path::new(&dir).join(key)).ok()?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_owned())
    }
}
