//! Per-job correlation tokens.
//!
//! A token is handed to the external encoder as its third positional
//! argument. It is a bookkeeping value for the encoder only and carries no
//! security guarantee: collisions are improbable, not impossible.

use rand::Rng;

/// Default number of characters in a generated token.
pub const DEFAULT_TOKEN_LENGTH: usize = 20;

/// Token alphabet: lowercase base-36.
const TOKEN_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generate a random token of exactly `length` characters.
pub fn generate_token(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| TOKEN_ALPHABET[rng.random_range(0..TOKEN_ALPHABET.len())] as char)
        .collect()
}
