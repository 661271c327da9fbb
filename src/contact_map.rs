use std::collections::HashMap;

use crate::types::CategoryMask;

/// Pairwise opt-in for non-blocking contact tests between categories.
#[derive(Clone, Debug, Default)]
pub struct ContactTestMap {
    map: HashMap<u32, u32>,
}

impl ContactTestMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Let `category` observe contacts with everything in `other`.
    pub fn map_contact(&mut self, category: CategoryMask, other: CategoryMask) {
        *self.map.entry(category.bits()).or_insert(0) |= other.bits();
    }

    /// Drop `category`'s own registrations and any registration naming it.
    pub fn unregister(&mut self, category: CategoryMask) {
        self.map.remove(&category.bits());
        for bits in self.map.values_mut() {
            *bits &= !category.bits();
        }
        self.map.retain(|_, bits| *bits != 0);
    }

    pub fn reset(&mut self) {
        self.map.clear();
    }

    /// Either side registered for the other. Empty masks never match.
    pub fn can_have_contact(&self, a: CategoryMask, b: CategoryMask) -> bool {
        if a.is_empty() || b.is_empty() {
            return false;
        }
        let registered = |x: CategoryMask, y: CategoryMask| {
            self.map.get(&x.bits()).is_some_and(|bits| bits & y.bits() == y.bits())
        };
        registered(a, b) || registered(b, a)
    }
}
