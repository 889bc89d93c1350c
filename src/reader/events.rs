//! XML Event Types
//!
//! Owned element events pulled from a stream. Character data, comments,
//! processing instructions and the prolog are validated by the reader and
//! never surface: the catalog scan only reacts to element structure.

/// Element-level parsing event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlEvent {
    /// Start of an element: <name attrs...>
    StartElement(StartElement),
    /// End of an element: </name>
    EndElement(EndElement),
    /// Empty element: <name attrs.../>
    EmptyElement(StartElement),
}

/// Start element event data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartElement {
    /// Full element name (prefix included)
    pub name: String,
    /// Attributes in document order, entities decoded
    pub attributes: Vec<(String, String)>,
}

impl StartElement {
    pub fn new(name: impl Into<String>, attributes: Vec<(String, String)>) -> Self {
        StartElement {
            name: name.into(),
            attributes,
        }
    }

    /// Get an attribute value by name
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// End element event data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndElement {
    pub name: String,
}

impl EndElement {
    pub fn new(name: impl Into<String>) -> Self {
        EndElement { name: name.into() }
    }
}

impl XmlEvent {
    pub fn name(&self) -> &str {
        match self {
            XmlEvent::StartElement(e) | XmlEvent::EmptyElement(e) => &e.name,
            XmlEvent::EndElement(e) => &e.name,
        }
    }

    /// Check if this is a start element event
    pub fn is_start_element(&self) -> bool {
        matches!(self, XmlEvent::StartElement(_) | XmlEvent::EmptyElement(_))
    }

    /// Get as start element if applicable
    pub fn as_start_element(&self) -> Option<&StartElement> {
        match self {
            XmlEvent::StartElement(e) | XmlEvent::EmptyElement(e) => Some(e),
            XmlEvent::EndElement(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_element_attribute_lookup() {
        let elem = StartElement::new(
            "item",
            vec![
                ("name".to_string(), "Pump".to_string()),
                ("image".to_string(), "pump.png".to_string()),
            ],
        );
        assert_eq!(elem.attribute("name"), Some("Pump"));
        assert_eq!(elem.attribute("image"), Some("pump.png"));
        assert_eq!(elem.attribute("sku"), None);
    }

    #[test]
    fn test_event_accessors() {
        let start = XmlEvent::EmptyElement(StartElement::new("item", vec![]));
        assert!(start.is_start_element());
        assert_eq!(start.name(), "item");

        let end = XmlEvent::EndElement(EndElement::new("items"));
        assert!(!end.is_start_element());
        assert!(end.as_start_element().is_none());
        assert_eq!(end.name(), "items");
    }
}
