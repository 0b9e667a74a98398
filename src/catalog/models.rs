use serde::{Deserialize, Serialize};

/// How access to an application is granted
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Reachable by direct URL navigation, outside the portal session
    Native,
    /// Requires a freshly issued access grant before use
    Portal,
}

/// One entry in the application catalog.
///
/// Fetched as an immutable snapshot per dashboard load; never mutated
/// client-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationDescriptor {
    /// Stable identifier / slug
    pub id: String,
    /// Display name
    pub name: String,
    /// Short description for the card
    pub description: String,
    /// Icon (emoji or icon name)
    pub icon: String,
    /// Exactly one category per descriptor
    pub category: Category,
    /// Browser-visible URL; expected for native entries, optional otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Short-lived, application-scoped token issued for one portal entry.
///
/// Transient: consumed immediately by the caller and never persisted.
/// Never log or display the raw token.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessGrant {
    pub access_token: String,
    pub app_id: String,
}

/// Immutable catalog snapshot for one dashboard load.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    applications: Vec<ApplicationDescriptor>,
}

impl Catalog {
    pub fn new(applications: Vec<ApplicationDescriptor>) -> Self {
        Self { applications }
    }

    /// Empty catalog, used when a fetch is degraded rather than fatal.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.applications.is_empty()
    }

    pub fn len(&self) -> usize {
        self.applications.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ApplicationDescriptor> {
        self.applications.iter()
    }

    /// Entries reachable by direct navigation
    pub fn native(&self) -> Vec<&ApplicationDescriptor> {
        self.applications
            .iter()
            .filter(|a| a.category == Category::Native)
            .collect()
    }

    /// Entries requiring a brokered access grant
    pub fn portal(&self) -> Vec<&ApplicationDescriptor> {
        self.applications
            .iter()
            .filter(|a| a.category == Category::Portal)
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&ApplicationDescriptor> {
        self.applications.iter().find(|a| a.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_catalog_json() -> &'static str {
        r#"[
            {
                "id": "app1",
                "name": "Wiki",
                "description": "Team knowledge base",
                "icon": "book",
                "category": "native",
                "url": "https://wiki.example.com",
                "is_active": true
            },
            {
                "id": "portal1",
                "name": "Analytics",
                "description": "Usage analytics",
                "icon": "chart",
                "category": "portal",
                "is_active": true
            }
        ]"#
    }

    #[test]
    fn test_deserialize_catalog_entries() {
        let apps: Vec<ApplicationDescriptor> =
            serde_json::from_str(sample_catalog_json()).unwrap();
        assert_eq!(apps.len(), 2);
        assert_eq!(apps[0].category, Category::Native);
        assert_eq!(apps[0].url.as_deref(), Some("https://wiki.example.com"));
        assert_eq!(apps[1].category, Category::Portal);
        assert_eq!(apps[1].url, None);
    }

    #[test]
    fn test_partition_by_category() {
        let apps: Vec<ApplicationDescriptor> =
            serde_json::from_str(sample_catalog_json()).unwrap();
        let catalog = Catalog::new(apps);

        let native_ids: Vec<&str> = catalog.native().iter().map(|a| a.id.as_str()).collect();
        let portal_ids: Vec<&str> = catalog.portal().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(native_ids, vec!["app1"]);
        assert_eq!(portal_ids, vec!["portal1"]);
    }

    #[test]
    fn test_lookup_by_id() {
        let apps: Vec<ApplicationDescriptor> =
            serde_json::from_str(sample_catalog_json()).unwrap();
        let catalog = Catalog::new(apps);

        assert_eq!(catalog.get("portal1").unwrap().name, "Analytics");
        assert!(catalog.get("missing").is_none());
    }

    #[test]
    fn test_empty_catalog_has_empty_sections() {
        let catalog = Catalog::empty();
        assert!(catalog.is_empty());
        assert!(catalog.native().is_empty());
        assert!(catalog.portal().is_empty());
    }
}
