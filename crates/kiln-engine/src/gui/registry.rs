use std::collections::BTreeMap;

use imgui::TextureId;

use super::RenderError;

/// Maps ImGui texture ids to renderer-owned texture handles.
///
/// Ids are allocated from 1 upwards and never reused, so a stale id held by
/// the application after unregistration fails to resolve instead of aliasing
/// a newer texture. Id 0 (ImGui's "unset" value) never resolves.
#[derive(Debug)]
pub struct TextureRegistry<T> {
    entries: BTreeMap<usize, T>,
    next: usize,
}

impl<T> TextureRegistry<T> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next: 1,
        }
    }

    /// Stores `value` under a fresh id.
    pub fn insert(&mut self, value: T) -> TextureId {
        let id = self.next;
        self.next += 1;
        self.entries.insert(id, value);
        TextureId::new(id)
    }

    /// Stores `value` under `id`, returning the previous entry if any.
    ///
    /// Replacing under an id that was never allocated reserves it, so later
    /// `insert` calls do not hand it out again.
    pub fn replace(&mut self, id: TextureId, value: T) -> Option<T> {
        let raw = id.id();
        if raw >= self.next {
            self.next = raw + 1;
        }
        self.entries.insert(raw, value)
    }

    /// Removes the entry for `id`. Unknown ids are ignored.
    pub fn remove(&mut self, id: TextureId) -> Option<T> {
        self.entries.remove(&id.id())
    }

    pub fn get(&self, id: TextureId) -> Option<&T> {
        self.entries.get(&id.id())
    }

    /// Like [`get`](Self::get), but a missing entry is a render error.
    pub fn resolve(&self, id: TextureId) -> Result<&T, RenderError> {
        self.get(id).ok_or(RenderError::UnregisteredTexture(id))
    }

    pub fn contains(&self, id: TextureId) -> bool {
        self.entries.contains_key(&id.id())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = TextureId> + '_ {
        self.entries.keys().map(|&id| TextureId::new(id))
    }
}

impl<T> Default for TextureRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_start_at_one_and_increase() {
        let mut reg = TextureRegistry::new();
        let a = reg.insert("font");
        let b = reg.insert("image");
        assert_eq!(a.id(), 1);
        assert_eq!(b.id(), 2);
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn unset_id_never_resolves() {
        let mut reg = TextureRegistry::new();
        reg.insert(());
        assert!(matches!(
            reg.resolve(TextureId::new(0)),
            Err(RenderError::UnregisteredTexture(id)) if id.id() == 0
        ));
    }

    #[test]
    fn removed_ids_are_not_reused() {
        let mut reg = TextureRegistry::new();
        let a = reg.insert(10);
        assert_eq!(reg.remove(a), Some(10));
        let b = reg.insert(20);
        assert_ne!(a, b);
        assert!(reg.resolve(a).is_err());
        assert_eq!(reg.resolve(b).ok(), Some(&20));
    }

    #[test]
    fn removing_unknown_id_is_a_no_op() {
        let mut reg: TextureRegistry<u8> = TextureRegistry::new();
        assert_eq!(reg.remove(TextureId::new(42)), None);
        assert!(reg.is_empty());
    }

    #[test]
    fn replace_swaps_existing_entry() {
        let mut reg = TextureRegistry::new();
        let id = reg.insert("old");
        assert_eq!(reg.replace(id, "new"), Some("old"));
        assert_eq!(reg.get(id), Some(&"new"));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn replace_with_foreign_id_reserves_it() {
        let mut reg = TextureRegistry::new();
        assert_eq!(reg.replace(TextureId::new(7), 'x'), None);
        let next = reg.insert('y');
        assert_eq!(next.id(), 8);
        assert!(reg.contains(TextureId::new(7)));
    }

    #[test]
    fn ids_iterate_in_ascending_order() {
        let mut reg = TextureRegistry::new();
        let a = reg.insert(());
        let b = reg.insert(());
        let c = reg.insert(());
        reg.remove(b);
        assert_eq!(reg.ids().collect::<Vec<_>>(), vec![a, c]);
    }
}
