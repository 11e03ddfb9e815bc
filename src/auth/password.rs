use hex::encode as hex_encode;
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;

/// Hash a password as `pbkdf2:sha256:<iterations>$<salt>$<hex>`.
///
/// The format matches the store files this console inherits (werkzeug's
/// scheme), so existing deployments keep their accounts.
pub fn hash_password(password: &str, iterations: u32) -> String {
    let mut salt_bytes = [0u8; 12];
    rand::rngs::OsRng.fill_bytes(&mut salt_bytes);
    let salt = hex_encode(salt_bytes);
    let mut derived = [0u8; 32];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), iterations, &mut derived);
    format!("pbkdf2:sha256:{}${}${}", iterations, salt, hex_encode(derived))
}

/// Check a candidate password against a stored hash. Unrecognized hash
/// formats verify as false rather than erroring.
pub fn verify_password(stored: &str, candidate: &str) -> bool {
    let Some(rest) = stored.strip_prefix("pbkdf2:sha256:") else {
        return false;
    };
    let Some((iterations, salt_and_hash)) = rest.split_once('$') else {
        return false;
    };
    let Some((salt, expected)) = salt_and_hash.split_once('$') else {
        return false;
    };
    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    let mut derived = [0u8; 32];
    pbkdf2_hmac::<Sha256>(candidate.as_bytes(), salt.as_bytes(), iterations, &mut derived);
    hex_encode(derived) == expected
}

/// 16 random bytes, hex-encoded. Unguessable, cookie-safe.
pub fn random_session_id() -> String {
    let mut bytes = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex_encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trips() {
        let hash = hash_password("hunter2", 1000);
        assert!(hash.starts_with("pbkdf2:sha256:1000$"));
        assert!(verify_password(&hash, "hunter2"));
        assert!(!verify_password(&hash, "hunter3"));
    }

    #[test]
    fn two_hashes_of_one_password_differ_by_salt() {
        let a = hash_password("same", 1000);
        let b = hash_password("same", 1000);
        assert_ne!(a, b);
        assert!(verify_password(&a, "same"));
        assert!(verify_password(&b, "same"));
    }

    #[test]
    fn malformed_hashes_never_verify() {
        assert!(!verify_password("", "pw"));
        assert!(!verify_password("plaintext", "plaintext"));
        assert!(!verify_password("pbkdf2:sha256:notanumber$ab$cd", "pw"));
        assert!(!verify_password("pbkdf2:md5:1000$ab$cd", "pw"));
    }

    #[test]
    fn session_ids_are_hex_and_unique() {
        let a = random_session_id();
        let b = random_session_id();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
