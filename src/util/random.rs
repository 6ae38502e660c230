//! Non-cryptographic identifiers for DOM elements.

use rand::Rng;
use rand::distributions::Alphanumeric;

/// `prefix` followed by `length` characters drawn uniformly from `[A-Za-z0-9]`.
pub fn random_id(prefix: &str, length: usize) -> String {
    let mut id = String::with_capacity(prefix.len() + length);
    id.push_str(prefix);
    id.extend(
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(length)
            .map(char::from),
    );
    id
}
