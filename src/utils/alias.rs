//! Alias generation and validation.
//!
//! Generated aliases are 6 characters drawn uniformly from `[A-Za-z0-9]`.
//! Custom aliases may also use `-` and `_` and be up to 32 characters long.

use rand::distr::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Mutex, PoisonError};

/// Length of generated aliases.
pub const GENERATED_ALIAS_LENGTH: usize = 6;

/// Shortest accepted custom alias.
pub const MIN_ALIAS_LENGTH: usize = 6;

/// Longest accepted custom alias.
pub const MAX_ALIAS_LENGTH: usize = 32;

/// Aliases that would be shadowed by fixed routes.
const RESERVED_ALIASES: &[&str] = &["health"];

/// Source of random aliases.
///
/// Owns its random number generator so tests can construct it from a fixed
/// seed and get a reproducible sequence.
pub struct AliasGenerator {
    rng: Mutex<StdRng>,
}

impl AliasGenerator {
    /// Creates a generator seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Creates a deterministic generator.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Draws a fresh alias.
    pub fn generate(&self) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);

        loop {
            let alias: String = (&mut *rng)
                .sample_iter(Alphanumeric)
                .take(GENERATED_ALIAS_LENGTH)
                .map(char::from)
                .collect();

            if !RESERVED_ALIASES.contains(&alias.as_str()) {
                return alias;
            }
        }
    }
}

impl Default for AliasGenerator {
    fn default() -> Self {
        Self::from_entropy()
    }
}

/// Checks a user-provided alias.
///
/// # Rules
///
/// - Length: 6-32 characters
/// - Allowed characters: ASCII letters, digits, `-` and `_`
/// - Cannot be a reserved route name
///
/// # Errors
///
/// Returns a short description of the first rule violated.
pub fn validate_alias(alias: &str) -> Result<(), &'static str> {
    if alias.len() < MIN_ALIAS_LENGTH || alias.len() > MAX_ALIAS_LENGTH {
        return Err("alias must be 6-32 characters");
    }

    if !alias
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err("alias can only contain letters, digits, '-' and '_'");
    }

    if RESERVED_ALIASES.contains(&alias) {
        return Err("alias is reserved");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_alias_shape() {
        let generator = AliasGenerator::from_entropy();

        for _ in 0..100 {
            let alias = generator.generate();
            assert_eq!(alias.len(), GENERATED_ALIAS_LENGTH);
            assert!(alias.chars().all(|c| c.is_ascii_alphanumeric()));
            assert!(validate_alias(&alias).is_ok());
        }
    }

    #[test]
    fn test_seeded_generators_agree() {
        let a = AliasGenerator::from_seed(42);
        let b = AliasGenerator::from_seed(42);

        let first: Vec<String> = (0..5).map(|_| a.generate()).collect();
        let second: Vec<String> = (0..5).map(|_| b.generate()).collect();

        assert_eq!(first, second);
    }

    #[test]
    fn test_generated_aliases_rarely_collide() {
        let generator = AliasGenerator::from_seed(7);
        let aliases: HashSet<String> = (0..1000).map(|_| generator.generate()).collect();

        assert!(aliases.len() > 990);
    }

    #[test]
    fn test_validate_alias_accepts_allowed_set() {
        assert!(validate_alias("abc123").is_ok());
        assert!(validate_alias("My_Link-2025").is_ok());
        assert!(validate_alias(&"a".repeat(32)).is_ok());
    }

    #[test]
    fn test_validate_alias_length_bounds() {
        assert!(validate_alias("abc12").is_err());
        assert!(validate_alias(&"a".repeat(33)).is_err());
    }

    #[test]
    fn test_validate_alias_rejects_other_characters() {
        assert!(validate_alias("abc 123").is_err());
        assert!(validate_alias("abc/123").is_err());
        assert!(validate_alias("привет-мир").is_err());
    }

    #[test]
    fn test_validate_alias_rejects_reserved() {
        assert_eq!(validate_alias("health"), Err("alias is reserved"));
    }
}
