use strsim::levenshtein;

use crate::errors::{Result, RollupError};

/// Maximum edit distance for which an unknown tag gets a suggestion.
const SUGGESTION_DISTANCE: usize = 3;

/// Closed enumerations that travel over the wire as fixed string tags.
///
/// Parsing is case-insensitive; unknown tags are rejected with a
/// `Validation` error naming the closest known tag.
pub trait Tagged: Copy + PartialEq + Sized + 'static {
    /// Human label used in error messages ("view", "dimension", ...).
    const KIND: &'static str;
    const TAGS: &'static [(&'static str, Self)];

    fn tag(self) -> &'static str {
        Self::TAGS
            .iter()
            .find(|(_, value)| *value == self)
            .map(|(tag, _)| *tag)
            .unwrap_or_default()
    }

    fn parse_tag(raw: &str) -> Result<Self> {
        let needle = raw.trim();
        if let Some((_, value)) = Self::TAGS
            .iter()
            .find(|(tag, _)| tag.eq_ignore_ascii_case(needle))
        {
            return Ok(*value);
        }
        let mut message = format!("unknown {} `{}`", Self::KIND, needle);
        if let Some(best) = closest_tag(needle, Self::TAGS.iter().map(|(tag, _)| *tag)) {
            message.push_str(&format!(" (did you mean `{}`?)", best));
        }
        Err(RollupError::Validation(message))
    }

    fn all() -> Vec<Self> {
        Self::TAGS.iter().map(|(_, value)| *value).collect()
    }
}

/// Returns the candidate closest to `input`, if any is close enough to be a
/// plausible typo.
pub fn closest_tag<'a>(input: &str, candidates: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let needle = input.to_ascii_lowercase();
    candidates
        .map(|candidate| (levenshtein(&candidate.to_ascii_lowercase(), &needle), candidate))
        .min_by_key(|(distance, _)| *distance)
        .filter(|(distance, _)| *distance <= SUGGESTION_DISTANCE)
        .map(|(_, candidate)| candidate)
}

/// Wires a [`Tagged`] enum into `Display`, `FromStr` and serde's
/// `try_from`/`into` string conversions.
macro_rules! impl_tagged {
    ($ty:ty) => {
        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str($crate::domain::common::Tagged::tag(*self))
            }
        }

        impl std::str::FromStr for $ty {
            type Err = $crate::errors::RollupError;

            fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
                <$ty as $crate::domain::common::Tagged>::parse_tag(raw)
            }
        }

        impl TryFrom<String> for $ty {
            type Error = $crate::errors::RollupError;

            fn try_from(raw: String) -> std::result::Result<Self, Self::Error> {
                <$ty as $crate::domain::common::Tagged>::parse_tag(&raw)
            }
        }

        impl From<$ty> for &'static str {
            fn from(value: $ty) -> Self {
                $crate::domain::common::Tagged::tag(value)
            }
        }
    };
}

pub(crate) use impl_tagged;
