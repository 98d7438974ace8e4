use crate::env;
use rand::Rng;
use rand::distr::Alphanumeric;
use tracing::debug;

/// Generate a random session identifier of `length` characters.
///
/// Characters are drawn uniformly from `A-Z`, `a-z` and `0-9` (62 symbols).
/// The generator is not cryptographically secure.
pub fn generate(length: usize) -> String {
    let id: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect();

    debug!("Generated session identifier of length {}", length);
    id
}

/// Generate an identifier with the default length
pub fn generate_default() -> String {
    generate(env::session::DEFAULT_ID_LENGTH)
}

/// Check that an identifier is safe to use as a file name.
///
/// Accepts 1..=128 characters from `[A-Za-z0-9_-]`.
pub fn is_valid(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= env::session::MAX_ID_LENGTH
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
