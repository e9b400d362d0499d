//! Item entity - a unique Brand + Blend in the collection

use serde::{Deserialize, Serialize};

/// Blend category
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BlendType {
    Aromatic,
    English,
    Burley,
    Virginia,
    Other,
}

impl BlendType {
    pub const ALL: [BlendType; 5] = [
        BlendType::Aromatic,
        BlendType::English,
        BlendType::Burley,
        BlendType::Virginia,
        BlendType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BlendType::Aromatic => "Aromatic",
            BlendType::English => "English",
            BlendType::Burley => "Burley",
            BlendType::Virginia => "Virginia",
            BlendType::Other => "Other",
        }
    }
}

impl std::fmt::Display for BlendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BlendType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        BlendType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().to_lowercase() == wanted)
            .ok_or_else(|| {
                format!(
                    "Invalid blend type: {}. Use aromatic, english, burley, virginia, or other",
                    s
                )
            })
    }
}

/// A blend in the collection, identified by (brand, blend)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Database id (None until persisted)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    pub brand: String,
    pub blend: String,

    #[serde(rename = "type")]
    pub blend_type: Option<BlendType>,

    #[serde(default)]
    pub subgenre: String,
    #[serde(default)]
    pub cut: String,
    #[serde(default)]
    pub components: String,
    #[serde(default)]
    pub flavoring: String,

    /// Number of tins on hand
    pub quantity: i64,

    /// Rating on a 0.0 - 5.0 scale
    pub rating: Option<f64>,

    #[serde(default)]
    pub favorite: bool,
    #[serde(default)]
    pub disliked: bool,

    /// Whether the blend is still being produced
    pub in_production: bool,

    #[serde(default)]
    pub notes: String,
}

/// Upper bound of the rating scale
pub const RATING_SCALE: f64 = 5.0;

/// Ratings are stored to two decimal places
pub fn round_rating(rating: f64) -> f64 {
    (rating * 100.0).round() / 100.0
}

/// Quantity given to new items when none is supplied
pub const DEFAULT_QUANTITY: i64 = 1;

impl Item {
    /// Create an unsaved item with default field values
    pub fn new(brand: impl Into<String>, blend: impl Into<String>) -> Self {
        Self {
            id: None,
            brand: brand.into(),
            blend: blend.into(),
            blend_type: None,
            subgenre: String::new(),
            cut: String::new(),
            components: String::new(),
            flavoring: String::new(),
            quantity: DEFAULT_QUANTITY,
            rating: None,
            favorite: false,
            disliked: false,
            in_production: true,
            notes: String::new(),
        }
    }

    /// Display name, "Brand - Blend"
    pub fn display_name(&self) -> String {
        format!("{} - {}", self.brand, self.blend)
    }

    /// Neither favorite nor disliked
    pub fn is_neutral(&self) -> bool {
        !self.favorite && !self.disliked
    }

    /// Set favorite, clearing disliked when turning it on
    pub fn set_favorite(&mut self, favorite: bool) {
        self.favorite = favorite;
        if favorite {
            self.disliked = false;
        }
    }

    /// Set disliked, clearing favorite when turning it on
    pub fn set_disliked(&mut self, disliked: bool) {
        self.disliked = disliked;
        if disliked {
            self.favorite = false;
        }
    }
}
