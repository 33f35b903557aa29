//! Slot placement rules shared by `create_element` and `createref`.

use slotbook_types::{ElementId, SlotPosition};

use crate::error::{RegistryError, RegistryResult};

/// Put `target` into `refs` and return the position used.
///
/// Without a position the first empty slot is reused, else the array grows
/// by one. An explicit position inside the array must hold an empty slot; a
/// position past the end pads with empty slots up to it.
pub(crate) fn place(
    refs: &mut Vec<ElementId>,
    target: ElementId,
    position: Option<SlotPosition>,
) -> RegistryResult<SlotPosition> {
    match position {
        None => match refs.iter().position(|id| id.is_empty()) {
            Some(pos) => {
                refs[pos] = target;
                Ok(pos)
            }
            None => {
                refs.push(target);
                Ok(refs.len() - 1)
            }
        },
        Some(pos) if pos < refs.len() => {
            if !refs[pos].is_empty() {
                return Err(RegistryError::SlotOccupied {
                    position: pos,
                    occupant: refs[pos],
                });
            }
            refs[pos] = target;
            Ok(pos)
        }
        Some(pos) => {
            refs.resize(pos, ElementId::EMPTY);
            refs.push(target);
            Ok(pos)
        }
    }
}

/// The id held by an occupied slot.
pub(crate) fn occupant(refs: &[ElementId], position: SlotPosition) -> RegistryResult<ElementId> {
    let id = refs
        .get(position)
        .copied()
        .ok_or(RegistryError::SlotOutOfRange {
            position,
            len: refs.len(),
        })?;
    if id.is_empty() {
        return Err(RegistryError::SlotEmpty(position));
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[u64]) -> Vec<ElementId> {
        raw.iter().copied().map(ElementId::new).collect()
    }

    #[test]
    fn reuses_first_empty_slot() {
        let mut refs = ids(&[5, 0, 7, 0]);
        assert_eq!(place(&mut refs, ElementId::new(9), None).unwrap(), 1);
        assert_eq!(refs, ids(&[5, 9, 7, 0]));
    }

    #[test]
    fn appends_when_full() {
        let mut refs = ids(&[5, 7]);
        assert_eq!(place(&mut refs, ElementId::new(9), None).unwrap(), 2);
        assert_eq!(refs, ids(&[5, 7, 9]));
    }

    #[test]
    fn explicit_position_must_be_empty() {
        let mut refs = ids(&[5, 0]);
        assert!(matches!(
            place(&mut refs, ElementId::new(9), Some(0)),
            Err(RegistryError::SlotOccupied { position: 0, .. })
        ));
        assert_eq!(refs, ids(&[5, 0]));
        assert_eq!(place(&mut refs, ElementId::new(9), Some(1)).unwrap(), 1);
    }

    #[test]
    fn explicit_position_past_end_pads() {
        let mut refs = ids(&[5]);
        assert_eq!(place(&mut refs, ElementId::new(9), Some(4)).unwrap(), 4);
        assert_eq!(refs, ids(&[5, 0, 0, 0, 9]));
    }

    #[test]
    fn occupant_checks_range_and_emptiness() {
        let refs = ids(&[5, 0]);
        assert_eq!(occupant(&refs, 0).unwrap(), ElementId::new(5));
        assert!(matches!(occupant(&refs, 1), Err(RegistryError::SlotEmpty(1))));
        assert!(matches!(
            occupant(&refs, 2),
            Err(RegistryError::SlotOutOfRange { position: 2, len: 2 })
        ));
    }
}
