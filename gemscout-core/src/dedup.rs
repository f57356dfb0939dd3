//! Collapse repeated scrapes of the same establishment.

use std::collections::HashMap;

use log::info;

use crate::normalize::NormalizedListing;

/// A listing that survived deduplication, with the size of its name group.
#[derive(Debug, Clone, PartialEq)]
pub struct UniqueListing {
    /// The most-reviewed listing of its name group.
    pub listing: NormalizedListing,
    /// How many normalized listings shared this exact name.
    pub occurrences: usize,
}

/// Keep one listing per exact name: the one with the most reviews.
///
/// Ties keep the first listing encountered. Output order follows the first
/// appearance of each name.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use gemscout_core::{NormalizedListing, deduplicate};
///
/// let listing = |name: &str, reviews| NormalizedListing {
///     name: name.into(),
///     location: Coord { x: 103.85, y: 1.30 },
///     rating: 4.0,
///     review_count: reviews,
///     price_level: None,
///     category: "Other".into(),
///     url: None,
/// };
/// let unique = deduplicate(vec![listing("A", 10), listing("A", 50), listing("B", 5)]);
/// assert_eq!(unique.len(), 2);
/// assert_eq!(unique[0].listing.review_count, 50);
/// assert_eq!(unique[0].occurrences, 2);
/// ```
#[must_use]
pub fn deduplicate(listings: Vec<NormalizedListing>) -> Vec<UniqueListing> {
    let input = listings.len();
    let mut slots: HashMap<String, usize> = HashMap::with_capacity(listings.len());
    let mut unique: Vec<UniqueListing> = Vec::new();
    for listing in listings {
        match slots.get(&listing.name) {
            Some(&slot) => {
                let Some(kept) = unique.get_mut(slot) else {
                    continue;
                };
                kept.occurrences += 1;
                if listing.review_count > kept.listing.review_count {
                    kept.listing = listing;
                }
            }
            None => {
                slots.insert(listing.name.clone(), unique.len());
                unique.push(UniqueListing {
                    listing,
                    occurrences: 1,
                });
            }
        }
    }
    info!(
        "deduplicated {input} listings into {} unique names",
        unique.len()
    );
    unique
}
