//! Cross-element index pointers and their text literal.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::id::ElementId;

/// Prefix of the pointer literal accepted from front ends.
pub const POINTER_PREFIX: &str = "ptr:";

/// Separator between the element id and the index key.
pub const POINTER_SEPARATOR: &str = "::";

/// A typed reference to an indexed column, attribute, or key on another
/// element.
///
/// The literal form is `ptr:<element_id>::<index_key>`. Whether the pointer is
/// valid depends on registry state and is checked by the registry, not here.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IndexPointer {
    pub target_element_id: ElementId,
    pub index_key: String,
}

impl IndexPointer {
    pub fn new(target_element_id: ElementId, index_key: impl Into<String>) -> Self {
        Self {
            target_element_id,
            index_key: index_key.into(),
        }
    }
}

impl fmt::Display for IndexPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{POINTER_PREFIX}{}{POINTER_SEPARATOR}{}",
            self.target_element_id, self.index_key
        )
    }
}

impl FromStr for IndexPointer {
    type Err = TypeError;

    fn from_str(literal: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| TypeError::InvalidPointerLiteral {
            literal: literal.to_string(),
            reason: reason.to_string(),
        };

        let body = literal
            .strip_prefix(POINTER_PREFIX)
            .ok_or_else(|| invalid("missing `ptr:` prefix"))?;
        let (id, key) = body
            .split_once(POINTER_SEPARATOR)
            .ok_or_else(|| invalid("expected `<element_id>::<index_key>`"))?;
        let id = id
            .parse::<u64>()
            .map_err(|_| invalid("element id is not an integer"))?;
        if key.is_empty() {
            return Err(invalid("index key is empty"));
        }

        Ok(Self::new(ElementId::new(id), key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_literal() {
        let ptr: IndexPointer = "ptr:4::email".parse().unwrap();
        assert_eq!(ptr.target_element_id, ElementId::new(4));
        assert_eq!(ptr.index_key, "email");
    }

    #[test]
    fn key_may_contain_separator() {
        let ptr: IndexPointer = "ptr:4::a::b".parse().unwrap();
        assert_eq!(ptr.index_key, "a::b");
    }

    #[test]
    fn display_matches_literal() {
        let ptr = IndexPointer::new(ElementId::new(9), "name");
        assert_eq!(ptr.to_string(), "ptr:9::name");
        assert_eq!(ptr.to_string().parse::<IndexPointer>().unwrap(), ptr);
    }

    #[test]
    fn rejects_malformed_literals() {
        for bad in ["4::email", "ptr:4", "ptr:x::email", "ptr:4::", "ptr:-2::k"] {
            let err = bad.parse::<IndexPointer>().unwrap_err();
            assert!(
                matches!(err, TypeError::InvalidPointerLiteral { .. }),
                "{bad} should be rejected"
            );
        }
    }
}
