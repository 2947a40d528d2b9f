//! Stateless confirmation codes.
//!
//! The code is an HMAC over the user's persisted identity fields, so it is
//! never stored: it can be re-derived for verification at any time, and any
//! change to the user row (username, email, role) invalidates codes issued
//! before the change.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::models::User;

type HmacSha256 = Hmac<Sha256>;

fn user_state(user: &User) -> String {
    format!(
        "{}:{}:{}:{}",
        user.id,
        user.username,
        user.email,
        user.role.to_str()
    )
}

/// Derive the confirmation code for a user's current state.
pub fn make_code(user: &User, secret: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(user_state(user).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time verification against the user's current state.
pub fn check_code(user: &User, secret: &[u8], code: &str) -> bool {
    let Ok(bytes) = hex::decode(code) else {
        return false;
    };

    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(user_state(user).as_bytes());
    mac.verify_slice(&bytes).is_ok()
}
