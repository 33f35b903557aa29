use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Position of an entry in an element's reference array.
pub type SlotPosition = usize;

/// Identifier of an element held by the registry.
///
/// Ids are issued by the registry's allocator and never change once assigned.
/// The value `0` is reserved: inside a reference array it marks an empty slot
/// and it never names a live element.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(u64);

impl ElementId {
    /// The empty-slot sentinel.
    pub const EMPTY: ElementId = ElementId(0);

    /// Create an id from its raw integer value.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw integer value.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns `true` for the empty-slot sentinel.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ElementId({})", self.0)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ElementId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<ElementId> for u64 {
    fn from(id: ElementId) -> Self {
        id.0
    }
}

impl FromStr for ElementId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| TypeError::InvalidElementId(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_empty_sentinel() {
        assert!(ElementId::EMPTY.is_empty());
        assert!(ElementId::new(0).is_empty());
        assert!(!ElementId::new(1).is_empty());
    }

    #[test]
    fn parse_from_str() {
        assert_eq!("42".parse::<ElementId>().unwrap(), ElementId::new(42));
        assert_eq!(" 7 ".parse::<ElementId>().unwrap(), ElementId::new(7));
        assert!("-1".parse::<ElementId>().is_err());
        assert!("abc".parse::<ElementId>().is_err());
    }

    #[test]
    fn serializes_as_plain_integer() {
        let json = serde_json::to_string(&ElementId::new(12)).unwrap();
        assert_eq!(json, "12");
        let back: ElementId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ElementId::new(12));
    }

    #[test]
    fn ordering_follows_raw_value() {
        assert!(ElementId::new(1) < ElementId::new(2));
    }
}
