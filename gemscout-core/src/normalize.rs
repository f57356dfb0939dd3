//! Coordinate normalization and field validation for raw listings.
//!
//! Map listings carry two positions: the nominal latitude/longitude of the
//! search result and the pin embedded in the place URL (`!3d<lat>!4d<lon>`).
//! The pin is the more precise one and wins when present. Listings outside
//! the configured bounding box are discarded here, before any spatial join,
//! because the nearest-zone fallbacks are too coarse to reject them later.

use geo::Coord;
use log::{debug, info};
use regex::Regex;

use crate::config::{CoordinateOverride, OTHER_CATEGORY, PipelineConfig};
use crate::cuisine::deduce_cuisine;
use crate::listing::{PriceLevel, RawListing};

/// Valid rating range on the source platform.
pub const RATING_RANGE: std::ops::RangeInclusive<f64> = 1.0..=5.0;

/// Extracts the pin coordinate embedded in a place URL.
#[derive(Debug, Clone)]
pub struct PinPattern {
    latitude: Regex,
    longitude: Regex,
}

impl PinPattern {
    /// Compile the pin expressions.
    ///
    /// # Errors
    /// Returns the regex compilation error; the patterns are fixed so this
    /// only fails if the regex engine rejects them.
    pub fn compile() -> Result<Self, regex::Error> {
        Ok(Self {
            latitude: Regex::new(r"!3d(-?\d+(?:\.\d+)?)")?,
            longitude: Regex::new(r"!4d(-?\d+(?:\.\d+)?)")?,
        })
    }

    /// Return the pin as `x = lon`, `y = lat`, if the URL carries one.
    ///
    /// # Examples
    /// ```
    /// use geo::Coord;
    /// use gemscout_core::PinPattern;
    ///
    /// let pins = PinPattern::compile().unwrap();
    /// let url = "https://www.google.com/maps/place/X/data=!4m7!3m6!3d1.2803!4d103.8442!16s";
    /// assert_eq!(pins.extract(url), Some(Coord { x: 103.8442, y: 1.2803 }));
    /// assert_eq!(pins.extract("https://example.com"), None);
    /// ```
    #[must_use]
    pub fn extract(&self, url: &str) -> Option<Coord<f64>> {
        let lat = capture_number(&self.latitude, url)?;
        let lon = capture_number(&self.longitude, url)?;
        Some(Coord { x: lon, y: lat })
    }
}

fn capture_number(pattern: &Regex, text: &str) -> Option<f64> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|value| value.as_str().parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

/// A listing with validated fields and a guaranteed in-bounds position.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedListing {
    /// Trimmed display name.
    pub name: String,
    /// WGS84 position, `x = lon`, `y = lat`.
    pub location: Coord<f64>,
    /// Star rating in `1..=5`.
    pub rating: f64,
    /// Number of reviews.
    pub review_count: u64,
    /// Parsed price tier.
    pub price_level: Option<PriceLevel>,
    /// Listed or deduced cuisine.
    pub category: String,
    /// Source identifier.
    pub url: Option<String>,
}

/// Why a listing was discarded during normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropReason {
    /// No usable name, so the listing cannot be deduplicated.
    MissingName,
    /// Neither a pin nor a nominal coordinate was usable.
    MissingGeometry,
    /// The coordinate lies outside the target bounding box.
    OutOfBounds,
    /// Rating absent, non-finite, or outside `1..=5`.
    InvalidRating,
}

/// Counts gathered while normalizing a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NormalizeReport {
    /// Listings read.
    pub input: usize,
    /// Listings that passed validation.
    pub kept: usize,
    /// Positions taken from a URL pin.
    pub pins_used: usize,
    /// Positions replaced by a manual override.
    pub overrides_applied: usize,
    /// Categories inferred from the name.
    pub cuisines_deduced: usize,
    /// Dropped for [`DropReason::MissingName`].
    pub missing_name: usize,
    /// Dropped for [`DropReason::MissingGeometry`].
    pub missing_geometry: usize,
    /// Dropped for [`DropReason::OutOfBounds`].
    pub out_of_bounds: usize,
    /// Dropped for [`DropReason::InvalidRating`].
    pub invalid_rating: usize,
}

impl NormalizeReport {
    fn record_drop(&mut self, reason: DropReason) {
        match reason {
            DropReason::MissingName => self.missing_name += 1,
            DropReason::MissingGeometry => self.missing_geometry += 1,
            DropReason::OutOfBounds => self.out_of_bounds += 1,
            DropReason::InvalidRating => self.invalid_rating += 1,
        }
    }

    /// Total number of discarded listings.
    #[must_use]
    pub const fn dropped(&self) -> usize {
        self.missing_name + self.missing_geometry + self.out_of_bounds + self.invalid_rating
    }
}

/// Validate listings, repair their coordinates and apply the bounding box.
///
/// Order is preserved among the surviving listings.
///
/// # Examples
/// ```
/// use gemscout_core::{PinPattern, PipelineConfig, RawListing, normalize_listings};
///
/// let pins = PinPattern::compile().unwrap();
/// let listings = vec![
///     RawListing::new("Inside", 1.30, 103.85, 4.2),
///     RawListing::new("Johor", 1.55, 103.75, 4.0),
/// ];
/// let (kept, report) = normalize_listings(listings, &PipelineConfig::default(), &pins);
/// assert_eq!(kept.len(), 1);
/// assert_eq!(report.out_of_bounds, 1);
/// ```
#[must_use]
pub fn normalize_listings(
    listings: Vec<RawListing>,
    config: &PipelineConfig,
    pins: &PinPattern,
) -> (Vec<NormalizedListing>, NormalizeReport) {
    let mut report = NormalizeReport {
        input: listings.len(),
        ..NormalizeReport::default()
    };
    let mut kept = Vec::with_capacity(listings.len());
    for listing in listings {
        match normalize_one(listing, config, pins, &mut report) {
            Ok(normalized) => kept.push(normalized),
            Err(reason) => {
                debug!("dropping listing: {reason:?}");
                report.record_drop(reason);
            }
        }
    }
    report.kept = kept.len();
    info!(
        "normalized {} of {} listings ({} out of bounds, {} without geometry, {} without name, {} invalid rating)",
        report.kept,
        report.input,
        report.out_of_bounds,
        report.missing_geometry,
        report.missing_name,
        report.invalid_rating
    );
    (kept, report)
}

fn normalize_one(
    listing: RawListing,
    config: &PipelineConfig,
    pins: &PinPattern,
    report: &mut NormalizeReport,
) -> Result<NormalizedListing, DropReason> {
    let name = listing
        .name
        .map(|name| name.trim().to_owned())
        .filter(|name| !name.is_empty())
        .ok_or(DropReason::MissingName)?;

    let pin = listing.url.as_deref().and_then(|url| pins.extract(url));
    let nominal = match (listing.latitude, listing.longitude) {
        (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some(Coord { x: lon, y: lat }),
        _ => None,
    };
    let mut location = match (pin, nominal) {
        (Some(pin), _) => {
            report.pins_used += 1;
            pin
        }
        (None, Some(nominal)) => nominal,
        (None, None) => return Err(DropReason::MissingGeometry),
    };
    if let Some(fix) = find_override(&config.overrides, &name) {
        report.overrides_applied += 1;
        location = Coord {
            x: fix.lon,
            y: fix.lat,
        };
    }
    if !config.bounds.contains(location) {
        return Err(DropReason::OutOfBounds);
    }

    let rating = listing
        .rating
        .filter(|rating| rating.is_finite() && RATING_RANGE.contains(rating))
        .ok_or(DropReason::InvalidRating)?;

    let category = match listing.category.map(|text| text.trim().to_owned()) {
        Some(text) if !text.is_empty() => text,
        _ if config.features.deduce_missing_cuisine => {
            report.cuisines_deduced += 1;
            deduce_cuisine(&name).to_owned()
        }
        _ => OTHER_CATEGORY.to_owned(),
    };

    Ok(NormalizedListing {
        review_count: listing
            .review_count
            .and_then(|count| u64::try_from(count).ok())
            .unwrap_or(0),
        price_level: listing.price_level.as_deref().and_then(PriceLevel::parse),
        url: listing.url,
        name,
        location,
        rating,
        category,
    })
}

fn find_override<'a>(
    overrides: &'a [CoordinateOverride],
    name: &str,
) -> Option<&'a CoordinateOverride> {
    let lowered = name.to_lowercase();
    overrides
        .iter()
        .find(|fix| lowered.contains(&fix.name_contains.to_lowercase()))
}
