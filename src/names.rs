// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use rand::Rng;

const DEFAULT_SUFFIX_LEN: usize = 5;
const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Random lowercase alphanumeric string of the given length
pub fn random_string_lower(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

/// Appends a short random suffix so repeated runs do not collide.
/// The result stays a valid Kubernetes object name for lowercase bases.
pub fn append_random_string(base: &str) -> String {
    format!("{}-{}", base, random_string_lower(DEFAULT_SUFFIX_LEN))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_random_string_format() {
        let name = append_random_string("upgrade-wl");
        assert!(name.starts_with("upgrade-wl-"));
        assert_eq!(name.len(), "upgrade-wl-".len() + DEFAULT_SUFFIX_LEN);
    }

    #[test]
    fn test_suffix_is_lowercase_alphanumeric() {
        let suffix = random_string_lower(32);
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_names_differ_between_calls() {
        let a = append_random_string("wl");
        let b = append_random_string("wl");
        assert_ne!(a, b);
    }
}
