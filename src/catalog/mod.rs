//! Catalog extraction over a product export.
//!
//! Product records are `item` elements whose parent is `items`. Each query
//! opens its source, scans it once, and keeps no state afterwards.

pub mod page;
pub mod path;
pub mod query;
pub mod record;
pub mod source;

pub use page::{Page, Paged};
pub use path::PathTracker;
pub use query::{
    count_products, count_spare_parts, list_product_names, list_spare_parts, product_names,
    spare_parts,
};
pub use record::{
    extract_name_and_image, extract_parts, Product, ProductSummary, RecordElement, SpareParts,
};
pub use source::{FromReader, Source};

/// Container of product records
pub const ITEMS: &str = "items";
/// Product record, and the name holder inside a part
pub const ITEM: &str = "item";
/// Spare-part container inside a product
pub const PARTS: &str = "parts";
pub const PART: &str = "part";
pub const NAME: &str = "name";
pub const IMAGE: &str = "image";

/// Name reported for part-bearing products without a name
pub const UNKNOWN_PRODUCT: &str = "Unknown Product";
