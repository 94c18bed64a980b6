use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;

/// Generates a cryptographically random state parameter for `OAuth2`.
///
/// Returns a 22-character URL-safe string (16 random bytes → base64url,
/// 128 bits of entropy). Generated fresh per login attempt; a state value
/// is consumed at the callback and never reused.
#[must_use]
pub fn generate_state() -> String {
    let random_bytes: [u8; 16] = rand::rng().random();
    URL_SAFE_NO_PAD.encode(random_bytes)
}

/// Compares the state stored in the login cookie against the value the
/// provider sent back.
///
/// Exact byte equality, no normalization. Absence on either side is a
/// normal "invalid" outcome, not a fault.
#[must_use]
pub fn verify_state(stored: Option<&str>, received: Option<&str>) -> bool {
    match (stored, received) {
        (Some(stored), Some(received)) => stored == received,
        _ => false,
    }
}
