//! Reference dimension tables: geography and product

mod data;
pub mod loader;

pub use data::{Geography, Product};
pub use loader::{load_geography, load_products};

use std::collections::HashMap;

/// Read-only reference context passed into the join and view layers
///
/// Shared dimension tables are explicit context, not ambient state: every
/// component that needs a lookup receives a borrow of this struct.
#[derive(Debug, Clone, Default)]
pub struct DimensionContext {
    geography: HashMap<String, Geography>,
    products: HashMap<String, Product>,
}

impl DimensionContext {
    pub fn new(geography: Vec<Geography>, products: Vec<Product>) -> Self {
        Self {
            geography: geography
                .into_iter()
                .map(|g| (g.state_code.clone(), g))
                .collect(),
            products: products
                .into_iter()
                .map(|p| (p.product_key.clone(), p))
                .collect(),
        }
    }

    pub fn geography(&self, state_code: &str) -> Option<&Geography> {
        self.geography.get(state_code)
    }

    pub fn product(&self, product_key: &str) -> Option<&Product> {
        self.products.get(product_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_lookups() {
        let ctx = DimensionContext::new(
            vec![Geography {
                state_code: "NY".into(),
                region_code: "NE".into(),
                market_tier: "Tier 1".into(),
            }],
            vec![Product {
                product_key: "AUTO_STANDARD".into(),
                line_of_business: "Auto".into(),
                plan_name: "Standard".into(),
            }],
        );

        assert_eq!(ctx.geography("NY").unwrap().region_code, "NE");
        assert!(ctx.geography("ZZ").is_none());
        assert_eq!(ctx.product("AUTO_STANDARD").unwrap().line_of_business, "Auto");
        assert!(ctx.product("AUTO_MISSING").is_none());
    }
}
