//! Product records and the extraction rules applied to them.
//!
//! A [`RecordElement`] is the materialized subtree of one product `item`.
//! Extraction never looks past it, so every function here is a pure
//! function of the record.

use super::{IMAGE, ITEM, NAME, PART, PARTS, UNKNOWN_PRODUCT};

/// An element captured during a scan: tag, attributes and element children
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordElement {
    pub tag: String,
    /// Attributes in document order
    pub attributes: Vec<(String, String)>,
    pub children: Vec<RecordElement>,
}

impl RecordElement {
    pub fn new(tag: impl Into<String>, attributes: Vec<(String, String)>) -> Self {
        RecordElement {
            tag: tag.into(),
            attributes,
            children: Vec::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// First direct child with the given tag
    pub fn child(&self, tag: &str) -> Option<&RecordElement> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// Direct children with the given tag, in document order
    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a RecordElement> {
        self.children.iter().filter(move |c| c.tag == tag)
    }

    /// Tag-only copy left in an ancestor when a nested record is handed out
    /// on its own
    pub fn stub(&self) -> RecordElement {
        RecordElement::new(self.tag.clone(), Vec::new())
    }
}

/// The raw `name` and `image` attributes of a record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductSummary {
    pub name: Option<String>,
    pub image: Option<String>,
}

impl ProductSummary {
    /// The record as a named product; `None` when the name is absent or empty
    pub fn into_product(self) -> Option<Product> {
        match self.name {
            Some(name) if !name.is_empty() => Some(Product {
                name,
                image: self.image,
            }),
            _ => None,
        }
    }

    /// Name to display, falling back to "Unknown Product"
    pub fn display_name(&self) -> String {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name.to_owned(),
            _ => UNKNOWN_PRODUCT.to_owned(),
        }
    }
}

/// A product record with a non-empty name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub name: String,
    pub image: Option<String>,
}

/// Spare-part names of one product, plus the product image
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpareParts {
    pub parts: Vec<String>,
    pub image: Option<String>,
}

/// Read the record's own `name` and `image` attributes.
pub fn extract_name_and_image(element: &RecordElement) -> ProductSummary {
    ProductSummary {
        name: element.attribute(NAME).map(str::to_owned),
        image: element.attribute(IMAGE).map(str::to_owned),
    }
}

/// Collect part names from `parts/part/item[@name]`.
///
/// Only the first `parts` container and the first `item` of each `part` are
/// looked at. Entries without a non-empty name are skipped.
pub fn extract_parts(element: &RecordElement) -> Vec<String> {
    let Some(container) = element.child(PARTS) else {
        return Vec::new();
    };
    container
        .children_named(PART)
        .filter_map(|part| part.child(ITEM))
        .filter_map(|item| item.attribute(NAME))
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Build the spare-parts entry for a record, or `None` if it lists no parts
pub fn spare_parts_entry(element: &RecordElement) -> Option<(String, SpareParts)> {
    let parts = extract_parts(element);
    if parts.is_empty() {
        return None;
    }
    let summary = extract_name_and_image(element);
    Some((
        summary.display_name(),
        SpareParts {
            parts,
            image: summary.image,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn el(tag: &str, pairs: &[(&str, &str)], children: Vec<RecordElement>) -> RecordElement {
        RecordElement {
            tag: tag.to_string(),
            attributes: attrs(pairs),
            children,
        }
    }

    fn part(name: Option<&str>) -> RecordElement {
        let children = match name {
            Some(n) => vec![el("item", &[("name", n)], vec![])],
            None => vec![],
        };
        el("part", &[], children)
    }

    #[test]
    fn test_name_and_image() {
        let record = el("item", &[("name", "Pump"), ("image", "pump.png")], vec![]);
        assert_eq!(
            extract_name_and_image(&record),
            ProductSummary {
                name: Some("Pump".into()),
                image: Some("pump.png".into()),
            }
        );
        let bare = el("item", &[], vec![]);
        assert_eq!(extract_name_and_image(&bare), ProductSummary::default());
    }

    #[test]
    fn test_empty_name_is_not_a_product() {
        let summary = extract_name_and_image(&el("item", &[("name", "")], vec![]));
        assert_eq!(summary.display_name(), UNKNOWN_PRODUCT);
        assert_eq!(summary.into_product(), None);
    }

    #[test]
    fn test_extract_parts_in_order() {
        let record = el(
            "item",
            &[("name", "P1")],
            vec![el(
                "parts",
                &[],
                vec![part(Some("A")), part(None), part(Some("")), part(Some("B"))],
            )],
        );
        assert_eq!(extract_parts(&record), vec!["A", "B"]);
    }

    #[test]
    fn test_only_first_parts_container_and_first_item() {
        let first = el(
            "part",
            &[],
            vec![
                el("item", &[("name", "first")], vec![]),
                el("item", &[("name", "second")], vec![]),
            ],
        );
        let record = el(
            "item",
            &[],
            vec![
                el("parts", &[], vec![first]),
                el("parts", &[], vec![part(Some("ignored"))]),
            ],
        );
        assert_eq!(extract_parts(&record), vec!["first"]);
    }

    #[test]
    fn test_parts_must_be_direct_children() {
        let record = el(
            "item",
            &[],
            vec![el("group", &[], vec![el("parts", &[], vec![part(Some("A"))])])],
        );
        assert!(extract_parts(&record).is_empty());
    }

    #[test]
    fn test_spare_parts_entry_defaults_name() {
        let record = el(
            "item",
            &[("image", "x.png")],
            vec![el("parts", &[], vec![part(Some("A"))])],
        );
        let (name, parts) = spare_parts_entry(&record).unwrap();
        assert_eq!(name, "Unknown Product");
        assert_eq!(parts.parts, vec!["A"]);
        assert_eq!(parts.image.as_deref(), Some("x.png"));

        let no_parts = el("item", &[("name", "P")], vec![el("parts", &[], vec![part(None)])]);
        assert_eq!(spare_parts_entry(&no_parts), None);
    }

    #[test]
    fn test_stub_drops_content() {
        let record = el("item", &[("name", "P")], vec![el("parts", &[], vec![])]);
        assert_eq!(record.stub(), el("item", &[], vec![]));
    }
}
