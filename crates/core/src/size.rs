//! Cup sizes for sized menu items.

use serde::{Deserialize, Serialize};

/// Serving size of a menu item.
///
/// Drinks typically carry recipes per size; food and other unsized items use
/// `Regular`, which is also the default when an order line names no size.
#[derive(
    Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum CupSize {
    #[default]
    Regular,
    Small,
    Medium,
    Large,
}

impl CupSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            CupSize::Regular => "regular",
            CupSize::Small => "small",
            CupSize::Medium => "medium",
            CupSize::Large => "large",
        }
    }
}

impl core::fmt::Display for CupSize {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
