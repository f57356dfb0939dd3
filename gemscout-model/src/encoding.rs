//! Ordinal encoding of categorical features.
#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

/// Code reserved for categories not seen while fitting.
pub const UNKNOWN_CATEGORY: u32 = u32::MAX;

/// Maps category labels to dense integer codes in sorted label order.
///
/// # Examples
/// ```
/// use gemscout_model::{OrdinalEncoder, UNKNOWN_CATEGORY};
///
/// let encoder = OrdinalEncoder::fit(["Thai", "Cafe", "Thai"]);
/// assert_eq!(encoder.encode("Cafe"), 0);
/// assert_eq!(encoder.encode("Thai"), 1);
/// assert_eq!(encoder.encode("Peranakan"), UNKNOWN_CATEGORY);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrdinalEncoder {
    categories: Vec<String>,
}

impl OrdinalEncoder {
    /// Learn the sorted set of distinct labels.
    #[must_use]
    pub fn fit<'a, I>(labels: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut categories: Vec<String> = labels.into_iter().map(str::to_owned).collect();
        categories.sort_unstable();
        categories.dedup();
        Self { categories }
    }

    /// Code for `label`, or [`UNKNOWN_CATEGORY`] when it was not fitted.
    #[must_use]
    pub fn encode(&self, label: &str) -> u32 {
        self.categories
            .binary_search_by(|known| known.as_str().cmp(label))
            .ok()
            .and_then(|code| u32::try_from(code).ok())
            .unwrap_or(UNKNOWN_CATEGORY)
    }

    /// Label for `code`, if it is a fitted code.
    #[must_use]
    pub fn decode(&self, code: u32) -> Option<&str> {
        usize::try_from(code)
            .ok()
            .and_then(|index| self.categories.get(index))
            .map(String::as_str)
    }

    /// Number of fitted categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Whether no categories were fitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn codes_follow_sorted_order() {
        let encoder = OrdinalEncoder::fit(["Tampines", "Bedok", "Outram", "Bedok"]);
        assert_eq!(encoder.len(), 3);
        assert_eq!(encoder.encode("Bedok"), 0);
        assert_eq!(encoder.encode("Outram"), 1);
        assert_eq!(encoder.encode("Tampines"), 2);
        assert_eq!(encoder.decode(2), Some("Tampines"));
        assert_eq!(encoder.decode(UNKNOWN_CATEGORY), None);
    }

    #[rstest]
    fn empty_encoder_maps_everything_to_unknown() {
        let encoder = OrdinalEncoder::fit(std::iter::empty());
        assert!(encoder.is_empty());
        assert_eq!(encoder.encode("anything"), UNKNOWN_CATEGORY);
    }
}
