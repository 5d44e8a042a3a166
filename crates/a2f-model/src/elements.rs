//! Element blocks (`*ELEMENT` sections) and their lookup index.

use std::cell::OnceCell;

use crate::topology::ElementType;

/// One `*ELEMENT` block: a single element type, an optional inherent group
/// and the elements in declaration order.
#[derive(Debug, Clone)]
pub struct ElementSection {
    pub element_type: ElementType,
    /// `ELSET=` given on the `*ELEMENT` header.
    pub group: Option<String>,
    elements: Vec<(u64, Vec<u64>)>,
    index: OnceCell<RangeIndex>,
}

impl ElementSection {
    pub fn new(element_type: ElementType, group: Option<String>) -> Self {
        Self {
            element_type,
            group,
            elements: Vec::new(),
            index: OnceCell::new(),
        }
    }

    pub fn push(&mut self, id: u64, nodes: Vec<u64>) {
        self.elements.push((id, nodes));
        self.index = OnceCell::new();
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Elements sorted by ID; a repeated ID keeps its last definition.
    pub fn sorted(&self) -> Vec<(u64, &[u64])> {
        self.range_index()
            .slots
            .iter()
            .map(|&(id, slot)| (id, self.elements[slot].1.as_slice()))
            .collect()
    }

    pub fn max_id(&self) -> Option<u64> {
        self.range_index().slots.last().map(|&(id, _)| id)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.range_index().contains(id)
    }

    pub fn nodes_of(&self, id: u64) -> Option<&[u64]> {
        let index = self.range_index();
        if !index.contains(id) {
            return None;
        }
        index
            .slot(id)
            .map(|slot| self.elements[slot].1.as_slice())
    }

    pub fn range_index(&self) -> &RangeIndex {
        self.index.get_or_init(|| RangeIndex::build(&self.elements))
    }
}

/// Sorted element IDs compressed into contiguous `[start, end]` runs.
///
/// Built on first use and reused for every membership query against the
/// section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeIndex {
    runs: Vec<(u64, u64)>,
    slots: Vec<(u64, usize)>,
}

impl RangeIndex {
    fn build(elements: &[(u64, Vec<u64>)]) -> Self {
        let mut slots: Vec<(u64, usize)> = elements
            .iter()
            .enumerate()
            .map(|(slot, (id, _))| (*id, slot))
            .collect();
        slots.sort_unstable();
        let mut deduped: Vec<(u64, usize)> = Vec::with_capacity(slots.len());
        for entry in slots {
            match deduped.last_mut() {
                Some(last) if last.0 == entry.0 => *last = entry,
                _ => deduped.push(entry),
            }
        }

        let mut runs: Vec<(u64, u64)> = Vec::new();
        for &(id, _) in &deduped {
            match runs.last_mut() {
                Some(run) if id == run.1 + 1 => run.1 = id,
                _ => runs.push((id, id)),
            }
        }

        Self {
            runs,
            slots: deduped,
        }
    }

    pub fn runs(&self) -> &[(u64, u64)] {
        &self.runs
    }

    pub fn contains(&self, id: u64) -> bool {
        let pos = self.runs.partition_point(|&(start, _)| start <= id);
        pos > 0 && id <= self.runs[pos - 1].1
    }

    fn slot(&self, id: u64) -> Option<usize> {
        self.slots
            .binary_search_by_key(&id, |&(k, _)| k)
            .ok()
            .map(|i| self.slots[i].1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(ids: &[u64]) -> ElementSection {
        let mut sec = ElementSection::new(ElementType::Tet4, None);
        for &id in ids {
            sec.push(id, vec![id * 10, id * 10 + 1, id * 10 + 2, id * 10 + 3]);
        }
        sec
    }

    #[test]
    fn compresses_sorted_runs() {
        let sec = section(&[7, 1, 2, 3, 9, 8, 20]);
        assert_eq!(sec.range_index().runs(), &[(1, 3), (7, 9), (20, 20)]);
        assert!(sec.contains(8));
        assert!(!sec.contains(4));
        assert!(!sec.contains(0));
        assert!(!sec.contains(21));
        assert_eq!(sec.max_id(), Some(20));
    }

    #[test]
    fn looks_up_nodes_by_id() {
        let sec = section(&[5, 3]);
        assert_eq!(sec.nodes_of(3), Some(&[30, 31, 32, 33][..]));
        assert_eq!(sec.nodes_of(4), None);
        let ids: Vec<u64> = sec.sorted().iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![3, 5]);
    }

    #[test]
    fn index_is_rebuilt_after_push() {
        let mut sec = section(&[1]);
        assert!(!sec.contains(2));
        sec.push(2, vec![1, 2, 3, 4]);
        assert!(sec.contains(2));
    }

    #[test]
    fn later_definition_wins() {
        let mut sec = section(&[1]);
        sec.push(1, vec![9, 9, 9, 9]);
        assert_eq!(sec.nodes_of(1), Some(&[9, 9, 9, 9][..]));
        assert_eq!(sec.sorted().len(), 1);
    }
}
