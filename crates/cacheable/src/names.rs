//! Entry point name derivation
//!
//! A cacheable method `N` with optional trailing punctuation `P` (`?`, `!`, `=`)
//! gets four companions: `N_with_cache P`, `N_without_cache P`, `N_key_format P`
//! and `clear_N_cache P`. The public name `N P` itself becomes the dispatcher.

use crate::error::{Error, Result};

const PUNCTUATION: [char; 3] = ['?', '!', '='];

/// Which generated operation a name routes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryPoint {
    /// Public name: bypass check, then cache-or-compute
    Dispatch,
    /// Forced cache-or-compute
    WithCache,
    /// Forced call to the original body
    WithoutCache,
    /// Key computation only
    KeyFormat,
    /// Invalidation of the entry for the given arguments
    ClearCache,
}

/// The five names generated for one cacheable method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedNames {
    original: String,
    with_cache: String,
    without_cache: String,
    key_format: String,
    clear_cache: String,
}

impl DerivedNames {
    /// Derive names for `original`, rejecting names that are not identifiers
    pub fn new(original: &str) -> Result<Self> {
        validate_method_name(original)?;

        let (stem, punctuation) = split_punctuation(original);
        Ok(Self {
            original: original.to_string(),
            with_cache: format!("{stem}_with_cache{punctuation}"),
            without_cache: format!("{stem}_without_cache{punctuation}"),
            key_format: format!("{stem}_key_format{punctuation}"),
            clear_cache: format!("clear_{stem}_cache{punctuation}"),
        })
    }

    /// The public (dispatcher) name
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Name of the forced cache-or-compute entry point
    pub fn with_cache(&self) -> &str {
        &self.with_cache
    }

    /// Name of the uncached entry point
    pub fn without_cache(&self) -> &str {
        &self.without_cache
    }

    /// Name of the key-computation entry point
    pub fn key_format(&self) -> &str {
        &self.key_format
    }

    /// Name of the invalidation entry point
    pub fn clear_cache(&self) -> &str {
        &self.clear_cache
    }

    /// Every generated name paired with the operation it routes to
    pub fn routes(&self) -> [(&str, EntryPoint); 5] {
        [
            (self.original.as_str(), EntryPoint::Dispatch),
            (self.with_cache.as_str(), EntryPoint::WithCache),
            (self.without_cache.as_str(), EntryPoint::WithoutCache),
            (self.key_format.as_str(), EntryPoint::KeyFormat),
            (self.clear_cache.as_str(), EntryPoint::ClearCache),
        ]
    }
}

fn split_punctuation(name: &str) -> (&str, &str) {
    match name.char_indices().last() {
        Some((idx, c)) if PUNCTUATION.contains(&c) => (&name[..idx], &name[idx..]),
        _ => (name, ""),
    }
}

/// Check that `name` is an identifier with at most one trailing `?`, `!` or `=`
pub fn validate_method_name(name: &str) -> Result<()> {
    let (stem, _) = split_punctuation(name);
    let mut chars = stem.chars();

    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };

    if valid {
        Ok(())
    } else {
        Err(Error::InvalidMethodName(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_plain_name() {
        let names = DerivedNames::new("star_count").unwrap();

        assert_eq!(names.original(), "star_count");
        assert_eq!(names.with_cache(), "star_count_with_cache");
        assert_eq!(names.without_cache(), "star_count_without_cache");
        assert_eq!(names.key_format(), "star_count_key_format");
        assert_eq!(names.clear_cache(), "clear_star_count_cache");
    }

    #[test]
    fn test_punctuation_moves_to_suffix() {
        for p in ["?", "!", "="] {
            let names = DerivedNames::new(&format!("valid{p}")).unwrap();
            assert_eq!(names.with_cache(), format!("valid_with_cache{p}"));
            assert_eq!(names.without_cache(), format!("valid_without_cache{p}"));
            assert_eq!(names.key_format(), format!("valid_key_format{p}"));
            assert_eq!(names.clear_cache(), format!("clear_valid_cache{p}"));
        }
    }

    #[test]
    fn test_only_one_trailing_character_is_stripped() {
        assert!(DerivedNames::new("really??").is_err());
        assert!(DerivedNames::new("a?b").is_err());
    }

    #[test]
    fn test_rejects_non_identifiers() {
        for bad in ["", "?", "1abc", "star count", "[]", "foo-bar"] {
            assert!(
                matches!(DerivedNames::new(bad), Err(Error::InvalidMethodName(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_routes_cover_every_entry_point() {
        let names = DerivedNames::new("to_s").unwrap();
        let routes = names.routes();

        assert_eq!(routes[0], ("to_s", EntryPoint::Dispatch));
        assert_eq!(routes[4], ("clear_to_s_cache", EntryPoint::ClearCache));
    }

    proptest! {
        #[test]
        fn prop_derived_names_share_stem_and_suffix(
            stem in "[a-z_][a-z0-9_]{0,16}",
            suffix in prop::sample::select(vec!["", "?", "!", "="]),
        ) {
            let original = format!("{stem}{suffix}");
            let names = DerivedNames::new(&original).unwrap();

            for (name, entry) in names.routes() {
                prop_assert!(name.ends_with(suffix));
                prop_assert!(name.contains(stem.as_str()));
                if entry != EntryPoint::Dispatch {
                    prop_assert_ne!(name, original.as_str());
                }
            }
        }
    }
}
