//! Catalog query builder.

use crate::ids::{BrandId, CategoryId};
use crate::money::{Currency, Money};
use crate::search::Filter;
use serde::{Deserialize, Serialize};

/// Page size used when the request doesn't specify one.
pub const DEFAULT_PAGE_SIZE: i64 = 12;
/// Largest page size a request may ask for.
pub const MAX_PAGE_SIZE: i64 = 48;

/// A catalog listing request.
///
/// Filters combine with AND across dimensions and OR within one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductQuery {
    /// Restrict to these categories (empty means any).
    #[serde(default)]
    pub category_ids: Vec<CategoryId>,
    /// Restrict to these brands (empty means any).
    #[serde(default)]
    pub brand_ids: Vec<BrandId>,
    /// Inclusive lower price bound.
    #[serde(default)]
    pub price_min: Option<Money>,
    /// Inclusive upper price bound.
    #[serde(default)]
    pub price_max: Option<Money>,
    /// Free-text search.
    #[serde(default)]
    pub search: Option<String>,
    /// Current page (1-indexed).
    #[serde(default = "default_page")]
    pub page: i64,
    /// Items per page; the configured default when absent.
    #[serde(default)]
    pub per_page: Option<i64>,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl ProductQuery {
    /// First page, no filters.
    pub fn new() -> Self {
        Self {
            category_ids: Vec::new(),
            brand_ids: Vec::new(),
            price_min: None,
            price_max: None,
            search: None,
            page: 1,
            per_page: None,
        }
    }

    pub fn with_categories<I>(mut self, ids: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<CategoryId>,
    {
        self.category_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_brands<I>(mut self, ids: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<BrandId>,
    {
        self.brand_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_price_range(mut self, min: Option<Money>, max: Option<Money>) -> Self {
        self.price_min = min;
        self.price_max = max;
        self
    }

    /// Set the text query. Blank input clears it.
    pub fn with_search(mut self, q: impl Into<String>) -> Self {
        let q = q.into();
        self.search = if q.trim().is_empty() { None } else { Some(q) };
        self
    }

    /// Set pagination, clamping to `page >= 1` and `1..=MAX_PAGE_SIZE`.
    pub fn with_pagination(mut self, page: i64, per_page: i64) -> Self {
        self.page = page.max(1);
        self.per_page = Some(per_page.clamp(1, MAX_PAGE_SIZE));
        self
    }

    /// Resolve `(page, per_page)` against configured limits.
    pub fn page_request(&self, default_page_size: i64, max_page_size: i64) -> (i64, i64) {
        let max = max_page_size.max(1);
        let per_page = self.per_page.unwrap_or(default_page_size).clamp(1, max);
        (self.page.max(1), per_page)
    }

    /// The full listing filter: available products matching every dimension.
    pub fn filter(&self) -> Filter {
        self.filter_without_price()
            .and(Filter::price_range(self.price_min, self.price_max))
    }

    /// The listing filter with the price dimension left out, used to compute
    /// the selectable price range.
    pub fn filter_without_price(&self) -> Filter {
        let mut filter = Filter::Available
            .and(Filter::CategoryIn(self.category_ids.clone()))
            .and(Filter::BrandIn(self.brand_ids.clone()));
        if let Some(search) = &self.search {
            filter = filter.and(Filter::text(search.clone()));
        }
        filter
    }

    /// Parse storefront query-string parameters.
    ///
    /// Recognized keys: `category` and `brand` (comma-separated ids, `all`
    /// for no filter), `minPrice` and `maxPrice` (decimals, unparsable
    /// values ignored), `search`, `page`, `limit`. Unknown keys are ignored.
    pub fn from_pairs<'a, I>(pairs: I, currency: Currency) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut query = Self::new();
        for (key, value) in pairs {
            match key {
                "category" => query.category_ids = parse_id_list(value),
                "brand" => query.brand_ids = parse_id_list(value),
                "minPrice" => query.price_min = parse_price(value, currency),
                "maxPrice" => query.price_max = parse_price(value, currency),
                "search" => query = query.with_search(value),
                "page" => query.page = value.trim().parse::<i64>().unwrap_or(1).max(1),
                "limit" => query.per_page = value.trim().parse::<i64>().ok(),
                _ => {}
            }
        }
        query
    }
}

fn default_page() -> i64 {
    1
}

fn parse_id_list<T: From<String>>(value: &str) -> Vec<T> {
    if value.trim().eq_ignore_ascii_case("all") {
        return Vec::new();
    }
    value
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| T::from(id.to_string()))
        .collect()
}

fn parse_price(value: &str, currency: Currency) -> Option<Money> {
    Money::parse(value, currency).filter(|m| !m.is_negative())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_builder() {
        let query = ProductQuery::new()
            .with_categories(["printers"])
            .with_search("laser")
            .with_pagination(0, 500);

        assert_eq!(query.page, 1);
        assert_eq!(query.per_page, Some(MAX_PAGE_SIZE));
        assert_eq!(query.category_ids, vec![CategoryId::new("printers")]);
    }

    #[test]
    fn test_page_request_defaults() {
        let query = ProductQuery::new();
        assert_eq!(query.page_request(DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE), (1, 12));

        let query = ProductQuery {
            page: -3,
            per_page: Some(0),
            ..ProductQuery::new()
        };
        assert_eq!(query.page_request(DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE), (1, 1));
    }

    #[test]
    fn test_where_clause() {
        let query = ProductQuery::new()
            .with_categories(["a", "b"])
            .with_brands(["x"])
            .with_price_range(Some(Money::new(1000, Currency::RUB)), None);

        let (clause, values) = query.filter().to_sql();
        assert!(clause.contains("is_available = 1"));
        assert!(clause.contains("category_id IN (?, ?)"));
        assert!(clause.contains("brand_id IN (?)"));
        assert!(clause.contains("price_cents >= ?"));
        assert_eq!(values.len(), 4);

        let (without_price, _) = query.filter_without_price().to_sql();
        assert!(!without_price.contains("price_cents"));
    }

    #[test]
    fn test_from_pairs() {
        let query = ProductQuery::from_pairs(
            [
                ("category", "printers, scanners"),
                ("brand", "all"),
                ("minPrice", "1500.50"),
                ("maxPrice", "abc"),
                ("search", "  "),
                ("page", "3"),
                ("limit", "24"),
                ("utm_source", "mail"),
            ],
            Currency::RUB,
        );

        assert_eq!(
            query.category_ids,
            vec![CategoryId::new("printers"), CategoryId::new("scanners")]
        );
        assert!(query.brand_ids.is_empty());
        assert_eq!(query.price_min, Some(Money::new(150050, Currency::RUB)));
        assert_eq!(query.price_max, None);
        assert_eq!(query.search, None);
        assert_eq!(query.page, 3);
        assert_eq!(query.per_page, Some(24));
    }

    #[test]
    fn test_from_pairs_bad_page() {
        let query = ProductQuery::from_pairs([("page", "zero"), ("limit", "x")], Currency::RUB);
        assert_eq!(query.page, 1);
        assert_eq!(query.per_page, None);
    }
}
