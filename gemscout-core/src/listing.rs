use serde::{Deserialize, Serialize};

/// A restaurant record as produced by the scraping collaborator.
///
/// Every field is optional: scraped text is best-effort and validation is
/// the job of [`normalize_listings`](crate::normalize_listings). Coordinates
/// are WGS84 degrees.
///
/// # Examples
/// ```
/// use gemscout_core::RawListing;
///
/// let listing: RawListing = serde_json::from_str(
///     r#"{"name": "Tian Tian", "latitude": 1.28, "longitude": 103.84, "rating": 4.3}"#,
/// ).unwrap();
/// assert_eq!(listing.name.as_deref(), Some("Tian Tian"));
/// assert!(listing.review_count.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawListing {
    /// Display name; may embed a pin or a cuisine hint.
    pub name: Option<String>,
    /// Nominal latitude, used when the URL carries no pin.
    #[serde(alias = "lat")]
    pub latitude: Option<f64>,
    /// Nominal longitude, used when the URL carries no pin.
    #[serde(alias = "lon", alias = "lng")]
    pub longitude: Option<f64>,
    /// Average star rating.
    pub rating: Option<f64>,
    /// Number of reviews; negative or missing counts as zero.
    pub review_count: Option<i64>,
    /// Dollar-sign price tier.
    pub price_level: Option<String>,
    /// Listed cuisine, if any.
    pub category: Option<String>,
    /// Source identifier; for map listings this is the place URL.
    #[serde(alias = "source_id")]
    pub url: Option<String>,
}

impl RawListing {
    /// Construct a listing with a name, position and rating.
    ///
    /// Remaining fields start empty and can be filled with the `with_*`
    /// builders.
    #[must_use]
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64, rating: f64) -> Self {
        Self {
            name: Some(name.into()),
            latitude: Some(latitude),
            longitude: Some(longitude),
            rating: Some(rating),
            ..Self::default()
        }
    }

    /// Set the review count.
    #[must_use]
    pub fn with_review_count(mut self, review_count: i64) -> Self {
        self.review_count = Some(review_count);
        self
    }

    /// Set the price tier text (`$` to `$$$$`).
    #[must_use]
    pub fn with_price_level(mut self, price_level: impl Into<String>) -> Self {
        self.price_level = Some(price_level.into());
        self
    }

    /// Set the free-text category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set the source identifier.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// Price tier advertised by a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriceLevel {
    /// `$`
    Budget,
    /// `$$`
    Moderate,
    /// `$$$`
    Expensive,
    /// `$$$$`
    Luxury,
}

impl PriceLevel {
    /// Parse the dollar-sign notation used by map listings.
    ///
    /// # Examples
    /// ```
    /// use gemscout_core::PriceLevel;
    ///
    /// assert_eq!(PriceLevel::parse(" $$ "), Some(PriceLevel::Moderate));
    /// assert_eq!(PriceLevel::parse("cheap"), None);
    /// ```
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim() {
            "$" => Some(Self::Budget),
            "$$" => Some(Self::Moderate),
            "$$$" => Some(Self::Expensive),
            "$$$$" => Some(Self::Luxury),
            _ => None,
        }
    }

    /// Numeric tier in `1..=4`.
    #[must_use]
    pub const fn as_number(self) -> u8 {
        match self {
            Self::Budget => 1,
            Self::Moderate => 2,
            Self::Expensive => 3,
            Self::Luxury => 4,
        }
    }

    /// Dollar-sign notation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Budget => "$",
            Self::Moderate => "$$",
            Self::Expensive => "$$$",
            Self::Luxury => "$$$$",
        }
    }
}

impl std::fmt::Display for PriceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
