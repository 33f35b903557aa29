use serde::Serialize;
use slotbook_types::{ElementId, SlotPosition};

use crate::state::RegistryState;

/// A slot whose target id is not in the registry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DanglingSlot {
    pub owner: ElementId,
    pub position: SlotPosition,
    pub target: ElementId,
}

/// Result of a full reference-integrity scan.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    /// Elements that no slot path from the root reaches.
    pub unreachable: Vec<ElementId>,
    pub dangling: Vec<DanglingSlot>,
}

impl IntegrityReport {
    pub(crate) fn scan(state: &RegistryState) -> Self {
        let reachable = state.reachable_from_root();
        let unreachable = state
            .elements
            .keys()
            .filter(|id| !reachable.contains(id))
            .copied()
            .collect();
        let dangling = state
            .elements
            .values()
            .flat_map(|el| {
                el.occupied_slots()
                    .filter(|(_, target)| !state.elements.contains_key(target))
                    .map(|(position, target)| DanglingSlot {
                        owner: el.id,
                        position,
                        target,
                    })
            })
            .collect();
        Self {
            unreachable,
            dangling,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.unreachable.is_empty() && self.dangling.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use slotbook_element::{Element, ElementKind};

    use crate::ElementRegistry;

    use super::*;

    #[test]
    fn fresh_registry_is_clean() {
        let mut reg = ElementRegistry::new();
        reg.create_element(ElementKind::Table, "t", None).unwrap();
        assert!(reg.integrity_report().is_clean());
    }

    #[test]
    fn reports_unreachable_and_dangling() {
        let mut reg = ElementRegistry::new();
        let root = reg.root_id();
        let loose = ElementId::new(8);
        reg.state
            .elements
            .insert(loose, Element::empty(loose, "loose", ElementKind::Graph));
        reg.state.elements.get_mut(&root).unwrap().refs =
            vec![ElementId::EMPTY, ElementId::new(21)];

        let report = reg.integrity_report();
        assert_eq!(report.unreachable, vec![loose]);
        assert_eq!(
            report.dangling,
            vec![DanglingSlot {
                owner: root,
                position: 1,
                target: ElementId::new(21)
            }]
        );
        assert!(!report.is_clean());
    }
}
