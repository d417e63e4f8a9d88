//! Product catalog - the two paid tiers and their ledger product ids

use serde::{Deserialize, Serialize};

use crate::ProductId;

pub const MONTHLY_PRODUCT: &str = "com.textwidget.premium.automonthly";
pub const LIFETIME_PRODUCT: &str = "com.textwidget.premium.lifetime";

/// Paid tier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Monthly,
    Lifetime,
}

impl Tier {
    pub fn title(self) -> &'static str {
        match self {
            Tier::Monthly => "Monthly membership",
            Tier::Lifetime => "Lifetime membership",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Tier::Monthly => "Renews every month, cancel at any time",
            Tier::Lifetime => "Pay once, use forever",
        }
    }

    /// Features unlocked by either tier
    pub fn features(self) -> &'static [&'static str] {
        &[
            "Unlimited AI text generation",
            "More generation templates",
            "Early access to new features",
            "No advertising",
        ]
    }
}

/// Mapping between tiers and ledger product ids
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCatalog {
    pub monthly: ProductId,
    pub lifetime: ProductId,
}

impl Default for ProductCatalog {
    fn default() -> Self {
        ProductCatalog {
            monthly: ProductId::new(MONTHLY_PRODUCT),
            lifetime: ProductId::new(LIFETIME_PRODUCT),
        }
    }
}

impl ProductCatalog {
    pub fn tier_of(&self, product: &ProductId) -> Option<Tier> {
        if *product == self.lifetime {
            Some(Tier::Lifetime)
        } else if *product == self.monthly {
            Some(Tier::Monthly)
        } else {
            None
        }
    }

    pub fn product_for(&self, tier: Tier) -> &ProductId {
        match tier {
            Tier::Monthly => &self.monthly,
            Tier::Lifetime => &self.lifetime,
        }
    }

    /// All purchasable product ids
    pub fn product_ids(&self) -> [&ProductId; 2] {
        [&self.monthly, &self.lifetime]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_lookup() {
        let catalog = ProductCatalog::default();
        assert_eq!(catalog.tier_of(&LIFETIME_PRODUCT.into()), Some(Tier::Lifetime));
        assert_eq!(catalog.tier_of(&MONTHLY_PRODUCT.into()), Some(Tier::Monthly));
        assert_eq!(catalog.tier_of(&"com.other".into()), None);
        assert_eq!(catalog.product_for(Tier::Monthly).as_str(), MONTHLY_PRODUCT);
    }
}
