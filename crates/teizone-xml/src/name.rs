//! Namespace-qualified names

use std::fmt;

/// The `xml:` namespace, implicitly bound in every document.
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// The namespace of `xmlns` declarations.
pub const XMLNS_NS: &str = "http://www.w3.org/2000/xmlns/";

/// An expanded XML name: optional namespace URI plus local name.
///
/// Prefixes are a serialization detail and are not part of the name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct QName {
    ns: Option<String>,
    local: String,
}

impl QName {
    /// Create a name in the given namespace
    #[inline]
    #[must_use]
    pub fn new(ns: &str, local: &str) -> Self {
        Self {
            ns: Some(ns.to_string()),
            local: local.to_string(),
        }
    }

    /// Create a name in no namespace
    #[inline]
    #[must_use]
    pub fn local(local: &str) -> Self {
        Self {
            ns: None,
            local: local.to_string(),
        }
    }

    /// Create a name in the `xml:` namespace (e.g. `xml:id`)
    #[inline]
    #[must_use]
    pub fn xml(local: &str) -> Self {
        Self::new(XML_NS, local)
    }

    /// Create a name from an optional namespace
    #[inline]
    #[must_use]
    pub fn with_ns(ns: Option<&str>, local: &str) -> Self {
        Self {
            ns: ns.map(str::to_string),
            local: local.to_string(),
        }
    }

    /// Namespace URI, if any
    #[inline]
    #[must_use]
    pub fn ns(&self) -> Option<&str> {
        self.ns.as_deref()
    }

    /// Local part of the name
    #[inline]
    #[must_use]
    pub fn local_name(&self) -> &str {
        &self.local
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ns {
            Some(ns) => write!(f, "{{{ns}}}{}", self.local),
            None => f.write_str(&self.local),
        }
    }
}
