//! Entity kinds encoded in the first character of an eid

use std::fmt;

/// Semantic kind of an annotated entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// `n` - genealogical node
    Node,
    /// `t` - text block
    Text,
    /// `d` - diagram
    Diagram,
    /// `p` - picture
    Picture,
    /// `g` - group
    Group,
    /// `c` - connection
    Connection,
    /// Any other leading character, or an empty eid
    Unknown,
}

impl EntityKind {
    /// Map an eid to its kind by its first character
    #[must_use]
    pub fn from_eid(eid: &str) -> Self {
        match eid.chars().next() {
            Some('n') => Self::Node,
            Some('t') => Self::Text,
            Some('d') => Self::Diagram,
            Some('p') => Self::Picture,
            Some('g') => Self::Group,
            Some('c') => Self::Connection,
            _ => Self::Unknown,
        }
    }

    /// Value of the entry `type` attribute, `None` for unknown kinds
    #[must_use]
    pub const fn type_name(self) -> Option<&'static str> {
        match self {
            Self::Node => Some("node"),
            Self::Text => Some("text"),
            Self::Diagram => Some("diagram"),
            Self::Picture => Some("picture"),
            Self::Group => Some("group"),
            Self::Connection => Some("connection"),
            Self::Unknown => None,
        }
    }

    /// Whether the kind maps to an entry type
    #[inline]
    #[must_use]
    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name().unwrap_or("unknown"))
    }
}
