//! Product filter expressions.
//!
//! A [`Filter`] can be evaluated against an in-memory [`Product`] or
//! rendered into a parameterized SQL `WHERE` fragment over the `products`
//! table. Both renderings agree: a filter that renders to no predicate
//! matches every product.

use crate::catalog::Product;
use crate::ids::{BrandId, CategoryId};
use crate::money::Money;
use serde::{Deserialize, Serialize};
use storefront_db::Value;

/// SQL rendering of a filter that imposes no constraint.
pub const NO_PREDICATE: &str = "1=1";

/// A product filter expression.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Filter {
    /// Matches everything.
    All,
    /// Only products offered for sale.
    Available,
    /// Products in any of the categories. Empty means no constraint.
    CategoryIn(Vec<CategoryId>),
    /// Products of any of the brands. Empty means no constraint.
    BrandIn(Vec<BrandId>),
    /// Price within the inclusive bounds.
    PriceRange {
        min: Option<Money>,
        max: Option<Money>,
    },
    /// Case-insensitive substring over the searchable fields.
    Text(String),
    /// All sub-filters must match.
    And(Vec<Filter>),
    /// At least one sub-filter must match.
    Or(Vec<Filter>),
}

impl Filter {
    /// Create a category filter.
    pub fn categories<I>(ids: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<CategoryId>,
    {
        Filter::CategoryIn(ids.into_iter().map(Into::into).collect())
    }

    /// Create a brand filter.
    pub fn brands<I>(ids: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<BrandId>,
    {
        Filter::BrandIn(ids.into_iter().map(Into::into).collect())
    }

    /// Create a price range filter.
    pub fn price_range(min: Option<Money>, max: Option<Money>) -> Self {
        Filter::PriceRange { min, max }
    }

    /// Create a text search filter.
    pub fn text(query: impl Into<String>) -> Self {
        Filter::Text(query.into())
    }

    /// Combine filters with AND.
    pub fn and(self, other: Filter) -> Self {
        match self {
            Filter::And(mut parts) => {
                parts.push(other);
                Filter::And(parts)
            }
            Filter::All => other,
            first => Filter::And(vec![first, other]),
        }
    }

    /// Evaluate the filter against a product.
    pub fn matches(&self, product: &Product) -> bool {
        match self {
            Filter::All => true,
            Filter::Available => product.is_available,
            Filter::CategoryIn(ids) => ids.is_empty() || ids.contains(&product.category_id),
            Filter::BrandIn(ids) => {
                ids.is_empty()
                    || product
                        .brand_id
                        .as_ref()
                        .is_some_and(|brand| ids.contains(brand))
            }
            Filter::PriceRange { min, max } => {
                let price = product.price.amount_cents;
                min.map_or(true, |m| price >= m.amount_cents)
                    && max.map_or(true, |m| price <= m.amount_cents)
            }
            Filter::Text(query) => match normalize_text(query) {
                Some(needle) => product.search_text().contains(&needle),
                None => true,
            },
            Filter::And(parts) => parts.iter().all(|f| f.matches(product)),
            Filter::Or(parts) => parts.is_empty() || parts.iter().any(|f| f.matches(product)),
        }
    }

    /// Build SQL WHERE clause component.
    ///
    /// Returns [`NO_PREDICATE`] when the filter does not constrain anything.
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        self.compile()
            .unwrap_or_else(|| (NO_PREDICATE.to_string(), Vec::new()))
    }

    /// Whether the filter constrains nothing.
    pub fn is_unconstrained(&self) -> bool {
        self.compile().is_none()
    }

    fn compile(&self) -> Option<(String, Vec<Value>)> {
        match self {
            Filter::All => None,
            Filter::Available => Some(("is_available = 1".to_string(), Vec::new())),
            Filter::CategoryIn(ids) => in_clause("category_id", ids.iter().map(|id| id.as_str())),
            Filter::BrandIn(ids) => in_clause("brand_id", ids.iter().map(|id| id.as_str())),
            Filter::PriceRange { min, max } => {
                let mut clauses = Vec::new();
                let mut values = Vec::new();
                if let Some(min) = min {
                    clauses.push("price_cents >= ?");
                    values.push(Value::from(min.amount_cents));
                }
                if let Some(max) = max {
                    clauses.push("price_cents <= ?");
                    values.push(Value::from(max.amount_cents));
                }
                if clauses.is_empty() {
                    None
                } else {
                    Some((clauses.join(" AND "), values))
                }
            }
            Filter::Text(query) => normalize_text(query).map(|needle| {
                (
                    "search_text LIKE ? ESCAPE '\\'".to_string(),
                    vec![Value::from(format!("%{}%", escape_like(&needle)))],
                )
            }),
            Filter::And(parts) => {
                let compiled: Vec<_> = parts.iter().filter_map(Filter::compile).collect();
                join_clauses(compiled, " AND ")
            }
            Filter::Or(parts) => {
                let compiled: Option<Vec<_>> = parts.iter().map(Filter::compile).collect();
                // One unconstrained branch makes the whole disjunction unconstrained.
                join_clauses(compiled?, " OR ")
            }
        }
    }
}

fn normalize_text(query: &str) -> Option<String> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn in_clause<'a>(column: &str, ids: impl Iterator<Item = &'a str>) -> Option<(String, Vec<Value>)> {
    let values: Vec<Value> = ids.map(Value::from).collect();
    if values.is_empty() {
        return None;
    }
    let placeholders = vec!["?"; values.len()].join(", ");
    Some((format!("{} IN ({})", column, placeholders), values))
}

fn join_clauses(parts: Vec<(String, Vec<Value>)>, separator: &str) -> Option<(String, Vec<Value>)> {
    match parts.len() {
        0 => None,
        1 => parts.into_iter().next(),
        _ => {
            let mut clauses = Vec::with_capacity(parts.len());
            let mut values = Vec::new();
            for (clause, params) in parts {
                clauses.push(format!("({})", clause));
                values.extend(params);
            }
            Some((clauses.join(separator), values))
        }
    }
}
