use std::collections::HashMap;
use std::fmt;

use log::debug;
use serde::{Deserialize, Deserializer, Serialize};

/// Identity of a registered field, shared with the native peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct FieldId(i32);

impl FieldId {
    /// Returned by registration when the subsystem is not running.
    pub const INVALID: FieldId = FieldId(-1);

    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> i32 {
        self.0
    }

    pub const fn is_valid(self) -> bool {
        self.0 >= 0
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for FieldId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        crate::protocol::wire::int(deserializer).map(FieldId)
    }
}

/// Owns the live fields and hands out their ids.
///
/// Ids come from a counter and are never reused for the lifetime of the
/// registry, so a late event for a removed field cannot reach a newer one.
#[derive(Debug)]
pub struct FieldRegistry<T> {
    active: bool,
    next_id: i32,
    fields: HashMap<FieldId, T>,
}

impl<T> Default for FieldRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FieldRegistry<T> {
    pub fn new() -> Self {
        Self {
            active: true,
            next_id: 0,
            fields: HashMap::new(),
        }
    }

    /// A registry for a subsystem that failed to start. Every registration
    /// yields [`FieldId::INVALID`].
    pub fn inactive() -> Self {
        Self {
            active: false,
            ..Self::new()
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn register(&mut self, field: T) -> FieldId {
        if !self.active {
            debug!("field registry inactive; refusing registration");
            return FieldId::INVALID;
        }

        let id = FieldId(self.next_id);
        self.next_id += 1;
        self.fields.insert(id, field);
        id
    }

    /// Removing an unknown or already removed id is a no-op.
    pub fn remove(&mut self, id: FieldId) -> Option<T> {
        self.fields.remove(&id)
    }

    pub fn resolve(&self, id: FieldId) -> Option<&T> {
        self.fields.get(&id)
    }

    pub fn resolve_mut(&mut self, id: FieldId) -> Option<&mut T> {
        self.fields.get_mut(&id)
    }

    pub fn ids(&self) -> Vec<FieldId> {
        let mut ids: Vec<FieldId> = self.fields.keys().copied().collect();
        ids.sort_by_key(|id| id.get());
        ids
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (FieldId, &mut T)> {
        self.fields.iter_mut().map(|(id, field)| (*id, field))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic_and_never_reused() {
        let mut registry = FieldRegistry::new();
        let a = registry.register("a");
        let b = registry.register("b");
        assert_eq!((a.get(), b.get()), (0, 1));

        registry.remove(a);
        let c = registry.register("c");
        assert_eq!(c.get(), 2);
        assert_eq!(registry.resolve(c), Some(&"c"));
        assert_eq!(registry.resolve(a), None);
    }

    #[test]
    fn remove_is_idempotent() {
        let mut registry = FieldRegistry::new();
        let id = registry.register(7_u8);

        assert_eq!(registry.remove(id), Some(7));
        assert_eq!(registry.remove(id), None);
        assert_eq!(registry.remove(FieldId::new(99)), None);
        assert!(registry.is_empty());
    }

    #[test]
    fn inactive_registry_returns_sentinel() {
        let mut registry = FieldRegistry::inactive();
        let id = registry.register(1_u8);

        assert_eq!(id, FieldId::INVALID);
        assert!(!id.is_valid());
        assert!(registry.is_empty());
        assert_eq!(registry.remove(id), None);
    }

    #[test]
    fn ids_are_listed_in_registration_order() {
        let mut registry = FieldRegistry::new();
        for value in 0..5_u8 {
            registry.register(value);
        }
        registry.remove(FieldId::new(2));

        let ids: Vec<i32> = registry.ids().into_iter().map(FieldId::get).collect();
        assert_eq!(ids, [0, 1, 3, 4]);
    }
}
