//! Keyword-based cuisine deduction for listings without a category.
//!
//! Each keyword found in the lowercase name adds its length to its
//! cuisine's score, so specific phrases ("bak kut teh") outweigh short
//! generic ones ("pho"). The highest score wins; ties go to the cuisine
//! listed first.

use crate::config::OTHER_CATEGORY;

const CUISINE_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "Japanese",
        &[
            "sushi", "ramen", "izakaya", "japanese", "tempura", "udon", "soba", "yakiniku",
            "yakitori", "donburi", "bento", "teriyaki", "tonkatsu", "omakase", "unagi",
            "takoyaki", "okonomiyaki", "shabu", "wagyu", "kyoto", "osaka", "tokyo", "katsu",
        ],
    ),
    (
        "Korean",
        &[
            "korean", "korea", "kimchi", "bibimbap", "bulgogi", "kbbq", "soju", "seoul",
            "samgyeopsal", "jjigae", "tteok", "galbi", "dakgalbi", "pojangmacha",
        ],
    ),
    (
        "Chinese",
        &[
            "chinese", "dim sum", "dumpling", "canton", "szechuan", "sichuan", "peking",
            "hunan", "teochew", "hokkien", "hainanese", "hong kong", "wok", "noodle",
            "congee", "bak kut teh", "char siu", "claypot", "hot pot", "hotpot", "steamboat",
            "porridge", "roast", "yum cha",
        ],
    ),
    (
        "Indian",
        &[
            "indian", "curry", "tandoori", "biryani", "naan", "masala", "dosa", "thali",
            "punjabi", "tikka", "paneer", "banana leaf", "prata", "bhavan", "tiffin",
        ],
    ),
    (
        "Thai",
        &[
            "thai", "tom yum", "pad thai", "bangkok", "phuket", "somtam", "mookata",
            "boat noodle", "siam", "sawadee",
        ],
    ),
    (
        "Vietnamese",
        &["vietnamese", "vietnam", "pho", "banh mi", "hanoi", "saigon", "goi cuon"],
    ),
    (
        "Malay",
        &[
            "malay", "nasi lemak", "rendang", "mee goreng", "nasi goreng", "rojak", "otah",
            "ayam", "ikan", "sambal", "kampung", "warung", "penang", "restoran", "mandi",
        ],
    ),
    (
        "Italian",
        &[
            "italian", "pasta", "pizza", "risotto", "trattoria", "osteria", "ristorante",
            "pizzeria", "gelato", "napoli",
        ],
    ),
    (
        "Western",
        &[
            "western", "grill", "steakhouse", "steak", "burger", "bistro", "brasserie",
            "brunch", "diner", "gastropub", "tavern", "pub", "french", "spanish", "german",
        ],
    ),
    (
        "Mexican",
        &["mexican", "taco", "burrito", "quesadilla", "nachos", "cantina", "fajita"],
    ),
    (
        "Middle Eastern",
        &[
            "turkish", "lebanese", "arabic", "kebab", "shawarma", "falafel", "hummus",
            "mezze", "persian", "greek",
        ],
    ),
    (
        "Seafood",
        &["seafood", "fish", "crab", "lobster", "prawn", "oyster", "clam", "mussel"],
    ),
    (
        "Hawker",
        &[
            "hawker", "food court", "food centre", "kopitiam", "coffee shop", "zi char",
            "eating house", "food village",
        ],
    ),
    (
        "Cafe",
        &["cafe", "café", "bakery", "patisserie", "dessert", "cake", "bubble tea", "toast"],
    ),
    (
        "Fast Food",
        &[
            "mcdonald", "kfc", "burger king", "subway", "popeyes", "jollibee", "five guys",
            "shake shack", "texas chicken",
        ],
    ),
    ("BBQ", &["bbq", "barbecue", "charcoal", "smokehouse"]),
];

/// Deduce a cuisine from a restaurant name, or "Other" when nothing matches.
///
/// # Examples
/// ```
/// use gemscout_core::deduce_cuisine;
///
/// assert_eq!(deduce_cuisine("Ichiban Sushi Bar"), "Japanese");
/// assert_eq!(deduce_cuisine("Song Fa Bak Kut Teh"), "Chinese");
/// assert_eq!(deduce_cuisine("Xyzzy"), "Other");
/// ```
#[must_use]
pub fn deduce_cuisine(name: &str) -> &'static str {
    let lowered = name.to_lowercase();
    let mut best: Option<(&'static str, usize)> = None;
    for (cuisine, keywords) in CUISINE_KEYWORDS {
        let score: usize = keywords
            .iter()
            .filter(|keyword| lowered.contains(**keyword))
            .map(|keyword| keyword.len())
            .sum();
        if score > 0 && best.is_none_or(|(_, top)| score > top) {
            best = Some((*cuisine, score));
        }
    }
    best.map_or(OTHER_CATEGORY, |(cuisine, _)| cuisine)
}
