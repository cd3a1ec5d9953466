//! Address generation and normalization.

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Length of generated local parts.
pub const LOCAL_PART_LENGTH: usize = 10;

/// Length of generated mailbox passwords.
pub const PASSWORD_LENGTH: usize = 12;

const LOCAL_PART_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Generate a random local part of lowercase letters and digits.
pub fn generate_local_part(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| LOCAL_PART_ALPHABET[rng.gen_range(0..LOCAL_PART_ALPHABET.len())] as char)
        .collect()
}

/// Generate a random alphanumeric password.
pub fn generate_password(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Join a local part and a domain.
pub fn full_address(local: &str, domain: &str) -> String {
    format!("{}@{}", local, domain).to_lowercase()
}

/// Canonical form used for storage and lookups: trimmed, without angle
/// brackets, lowercased.
pub fn normalize(address: &str) -> String {
    address
        .trim()
        .trim_start_matches('<')
        .trim_end_matches('>')
        .trim()
        .to_lowercase()
}

/// Text before the first `@`, or the whole input when there is none.
pub fn local_part(input: &str) -> &str {
    let input = input.trim();
    input.split('@').next().unwrap_or(input)
}

/// Text after the last `@`, if any.
pub fn domain_of(address: &str) -> Option<&str> {
    address
        .rsplit_once('@')
        .map(|(_, domain)| domain)
        .filter(|domain| !domain.is_empty())
}
