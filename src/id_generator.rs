//! Short identifier generation for shared documents.

use rand::Rng;
use regex::Regex;
use std::sync::LazyLock;

/// Length of every generated identifier
pub const ID_LENGTH: usize = 10;

/// URL-safe alphabet, 64 symbols
const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

static ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{10}$").expect("static id pattern"));

/// Generate a fresh random identifier
pub fn generate_id() -> String {
    let mut rng = rand::rng();
    (0..ID_LENGTH)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Whether `id` has the shape of a generated identifier
pub fn is_valid_id(id: &str) -> bool {
    ID_PATTERN.is_match(id)
}
