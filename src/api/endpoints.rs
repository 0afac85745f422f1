//! Paths of the catalog REST API
//!
//! Reads live under `/api/public/` and need no credentials. Writes use the
//! admin paths, which differ per resource in their "new" suffix.

use std::fmt;

/// Site identifier used by the single-site analytics views
pub const DEFAULT_ANALYTICS_SITE: &str = "quimicaindustrial";

/// A catalog resource managed through the admin API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Products,
    Categories,
    Presentations,
    Banners,
}

impl Resource {
    /// All catalog resources, in display order
    pub const ALL: [Resource; 4] = [
        Resource::Products,
        Resource::Categories,
        Resource::Presentations,
        Resource::Banners,
    ];

    /// Path segment used by the backend for this resource
    fn segment(self) -> &'static str {
        match self {
            Resource::Products => "productos",
            Resource::Categories => "categorias",
            Resource::Presentations => "presentaciones",
            Resource::Banners => "banners",
        }
    }

    /// Public, cacheable listing path
    pub fn list_path(self) -> String {
        format!("/api/public/{}", self.segment())
    }

    /// Admin path for creating a new item
    pub fn create_path(self) -> String {
        // The backend names the route after the noun's grammatical gender
        let suffix = match self {
            Resource::Products | Resource::Banners => "nuevo",
            Resource::Categories | Resource::Presentations => "nueva",
        };
        format!("/api/{}/{}", self.segment(), suffix)
    }

    /// Admin path for updating or deleting the item `id`
    pub fn item_path(self, id: &str) -> String {
        format!("/api/{}/{}", self.segment(), id)
    }

    /// Human-readable plural name
    pub fn label(self) -> &'static str {
        match self {
            Resource::Products => "products",
            Resource::Categories => "categories",
            Resource::Presentations => "presentations",
            Resource::Banners => "banners",
        }
    }

    /// Parses a resource name, accepting English and backend spellings
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "products" | "product" | "productos" => Some(Resource::Products),
            "categories" | "category" | "categorias" => Some(Resource::Categories),
            "presentations" | "presentation" | "presentaciones" => {
                Some(Resource::Presentations)
            }
            "banners" | "banner" => Some(Resource::Banners),
            _ => None,
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An analytics report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalyticsView {
    /// Aggregate overview for one site
    Overview { site: String },
    /// Raw event list for one site
    Events { site: String },
    /// Overview across every site
    Combined,
}

impl AnalyticsView {
    /// Path of this report
    pub fn path(&self) -> String {
        match self {
            AnalyticsView::Overview { site } => format!("/api/analytics/{}/overview", site),
            AnalyticsView::Events { site } => format!("/api/analytics/{}/events", site),
            AnalyticsView::Combined => "/api/analytics/combined/overview".to_string(),
        }
    }
}
