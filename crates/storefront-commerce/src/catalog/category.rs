//! Category and brand reference data.

use crate::error::CommerceError;
use crate::ids::{BrandId, CategoryId};
use crate::validation::ValidationErrors;
use serde::{Deserialize, Serialize};

/// A product category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    /// Unique category identifier.
    pub id: CategoryId,
    /// Category name.
    pub name: String,
    /// URL-friendly slug (unique).
    pub slug: String,
    /// Category description.
    #[serde(default)]
    pub description: Option<String>,
    /// Parent category ID (None for root categories).
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
    /// Whether the category is shown in navigation.
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Sort order position.
    #[serde(default)]
    pub sort_order: i32,
}

impl Category {
    /// Create an active root category.
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id: CategoryId::generate(),
            name: name.into(),
            slug: slug.into(),
            description: None,
            parent_id: None,
            is_active: true,
            sort_order: 0,
        }
    }

    pub fn with_id(mut self, id: impl Into<CategoryId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<CategoryId>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_sort_order(mut self, sort_order: i32) -> Self {
        self.sort_order = sort_order;
        self
    }

    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Check if this is a root category.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn validate(&self) -> Result<(), CommerceError> {
        validate_reference(self.id.as_str(), &self.name, &self.slug)
    }
}

/// A product manufacturer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Brand {
    /// Unique brand identifier.
    pub id: BrandId,
    /// Brand name.
    pub name: String,
    /// URL-friendly slug (unique).
    pub slug: String,
    /// Brand description.
    #[serde(default)]
    pub description: Option<String>,
    /// Manufacturer website.
    #[serde(default)]
    pub website: Option<String>,
    /// Whether the brand is shown in filters.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Brand {
    /// Create an active brand.
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id: BrandId::generate(),
            name: name.into(),
            slug: slug.into(),
            description: None,
            website: None,
            is_active: true,
        }
    }

    pub fn with_id(mut self, id: impl Into<BrandId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_website(mut self, website: impl Into<String>) -> Self {
        self.website = Some(website.into());
        self
    }

    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    pub fn validate(&self) -> Result<(), CommerceError> {
        validate_reference(self.id.as_str(), &self.name, &self.slug)
    }
}

/// A category with the number of available products in it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategorySummary {
    #[serde(flatten)]
    pub category: Category,
    pub product_count: i64,
}

/// A brand with the number of available products carrying it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BrandSummary {
    #[serde(flatten)]
    pub brand: Brand,
    pub product_count: i64,
}

fn validate_reference(id: &str, name: &str, slug: &str) -> Result<(), CommerceError> {
    let mut errors = ValidationErrors::new();
    if id.trim().is_empty() {
        errors.add("id", "Id is required");
    }
    if name.trim().is_empty() {
        errors.add("name", "Name is required");
    }
    if slug.trim().is_empty() {
        errors.add("slug", "Slug is required");
    }
    errors.into_result().map_err(CommerceError::from)
}

fn default_true() -> bool {
    true
}
