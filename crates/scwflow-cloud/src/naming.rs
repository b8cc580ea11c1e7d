//! Generated resource names

use rand::Rng;
use rand::distributions::Alphanumeric;

/// `prefix-xxxxxxxx` with a lowercase alphanumeric suffix
pub fn random_name(prefix: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("{}-{}", prefix, suffix)
}
