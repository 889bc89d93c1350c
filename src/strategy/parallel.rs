//! Parallel Queries
//!
//! Uses Rayon to run several catalog queries against one source at once.
//! Each query opens its own handle and scans independently.

use rayon::prelude::*;

use crate::catalog::{
    count_products, count_spare_parts, list_product_names, list_spare_parts, Page, Product,
    Source, SpareParts,
};
use crate::error::Result;

/// A catalog query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    CountProducts,
    CountSpareParts,
    ProductNames(Page),
    SpareParts(Page),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryResult {
    Count(usize),
    ProductNames(Vec<Product>),
    SpareParts(Vec<(String, SpareParts)>),
}

/// Product and spare-part totals of one export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogSummary {
    pub products: usize,
    pub spare_parts: usize,
}

/// Run one query to completion
pub fn run_query<S: Source>(source: S, query: Query) -> Result<QueryResult> {
    Ok(match query {
        Query::CountProducts => QueryResult::Count(count_products(source)?),
        Query::CountSpareParts => QueryResult::Count(count_spare_parts(source)?),
        Query::ProductNames(page) => QueryResult::ProductNames(list_product_names(source, page)?),
        Query::SpareParts(page) => QueryResult::SpareParts(list_spare_parts(source, page)?),
    })
}

/// Run queries in parallel; results come back in query order
pub fn run_parallel<S>(source: S, queries: &[Query]) -> Vec<Result<QueryResult>>
where
    S: Source + Clone + Sync,
{
    queries
        .par_iter()
        .map(|&query| run_query(source.clone(), query))
        .collect()
}

/// Count products and part-bearing products side by side
pub fn summarize<S>(source: S) -> Result<CatalogSummary>
where
    S: Source + Clone + Send,
{
    let other = source.clone();
    let (products, spare_parts) =
        rayon::join(move || count_products(source), move || count_spare_parts(other));
    Ok(CatalogSummary {
        products: products?,
        spare_parts: spare_parts?,
    })
}
