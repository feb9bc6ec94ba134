//! Public resource slugs and the storage collections behind them.

pub mod normalize;

pub use normalize::normalize_payload;

use std::collections::HashMap;

/// Kebab-case resource slug to snake_case collection name.
const RESOURCE_TABLE: &[(&str, &str)] = &[
    ("customers", "customers"),
    ("vehicles", "vehicles"),
    ("suppliers", "suppliers"),
    ("service-items", "service_items"),
    ("quotes", "quotes"),
    ("quote-items", "quote_items"),
    ("maintenance-reminders", "maintenance_reminders"),
    ("service-orders", "service_orders"),
    ("stock-movements", "stock_movements"),
    ("vehicle-mileage-history", "vehicle_mileage_history"),
];

/// Static, read-only mapping loaded once at startup and shared by every request.
#[derive(Debug, Clone)]
pub struct ResourceMap {
    tables: HashMap<&'static str, &'static str>,
}

impl ResourceMap {
    pub fn new() -> Self {
        Self {
            tables: RESOURCE_TABLE.iter().copied().collect(),
        }
    }

    /// Resolve a public slug to its collection; `None` means the route is unknown.
    pub fn resolve_collection(&self, slug: &str) -> Option<&'static str> {
        self.tables.get(slug).copied()
    }

    pub fn slugs(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.tables.keys().copied()
    }
}

impl Default for ResourceMap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_kebab_slugs_to_snake_collections() {
        let map = ResourceMap::new();
        assert_eq!(map.resolve_collection("service-items"), Some("service_items"));
        assert_eq!(map.resolve_collection("vehicle-mileage-history"), Some("vehicle_mileage_history"));
        assert_eq!(map.resolve_collection("customers"), Some("customers"));
    }

    #[test]
    fn unknown_slugs_do_not_resolve() {
        let map = ResourceMap::new();
        assert_eq!(map.resolve_collection("service_items"), None);
        assert_eq!(map.resolve_collection("profiles"), None);
        assert_eq!(map.resolve_collection("admin"), None);
        assert_eq!(map.resolve_collection(""), None);
    }

    #[test]
    fn exposes_all_ten_resources() {
        assert_eq!(ResourceMap::new().slugs().count(), 10);
    }
}
