//! Room Codes
//!
//! Short human-readable join codes. The alphabet is uppercase letters and
//! digits with the visually ambiguous `0 O I 1` removed; lookups are
//! case-normalized so users can type codes however they like.

use crate::core::rng::SeededRng;

/// Characters a room code may contain.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Fixed code length.
pub const CODE_LENGTH: usize = 6;

/// Draw a fresh code from the alphabet.
pub fn generate_code(rng: &mut SeededRng) -> String {
    (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.next_index(CODE_ALPHABET.len())] as char)
        .collect()
}

/// Uppercase a user-supplied code for lookup.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_shape() {
        let mut rng = SeededRng::new(42);
        for _ in 0..100 {
            let code = generate_code(&mut rng);
            assert_eq!(code.len(), CODE_LENGTH);
            assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn test_ambiguous_characters_excluded() {
        for forbidden in [b'0', b'O', b'I', b'1'] {
            assert!(!CODE_ALPHABET.contains(&forbidden));
        }
    }

    #[test]
    fn test_generation_is_seed_deterministic() {
        let mut a = SeededRng::new(7);
        let mut b = SeededRng::new(7);
        assert_eq!(generate_code(&mut a), generate_code(&mut b));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_code("ab2xyz"), "AB2XYZ");
        assert_eq!(normalize_code("  Q2W3E4 "), "Q2W3E4");
    }
}
