use image::RgbaImage;

use crate::entry::{Entry, EntryId};

/// The ordered list of entries the user is currently editing.
///
/// Entries are addressed by their stable [`EntryId`]. The 1-based display index of
/// every entry is recomputed from the current order after each structural change,
/// so indices always form the dense sequence `1..=len`.
#[derive(Debug, Default, Clone)]
pub struct WorkingSet {
    entries: Vec<Entry>,
    version: usize,
}

impl WorkingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bumped on every change, structural or not.
    pub fn version(&self) -> usize {
        self.version
    }

    /// Index the next added entry will get.
    pub fn next_index(&self) -> usize {
        self.entries.len() + 1
    }

    /// Number of entries that take part in composition.
    pub fn checked_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_checked()).count()
    }

    pub fn push_image(&mut self, image: RgbaImage) -> EntryId {
        self.push(Entry::image(self.next_index(), Some(image)))
    }

    pub fn push_text(&mut self) -> EntryId {
        self.push(Entry::text(self.next_index()))
    }

    /// Append an already constructed entry; its index is overwritten.
    pub fn push(&mut self, entry: Entry) -> EntryId {
        let id = entry.id();
        self.entries.push(entry);
        self.renumber();
        id
    }

    pub fn get(&self, id: EntryId) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id() == id)
    }

    /// Mutable access for annotation and comment edits. Counts as a modification.
    pub fn get_mut(&mut self, id: EntryId) -> Option<&mut Entry> {
        let entry = self.entries.iter_mut().find(|e| e.id() == id)?;
        self.version += 1;
        Some(entry)
    }

    pub fn position(&self, id: EntryId) -> Option<usize> {
        self.entries.iter().position(|e| e.id() == id)
    }

    pub fn remove(&mut self, id: EntryId) -> Option<Entry> {
        let position = self.position(id)?;
        let removed = self.entries.remove(position);
        self.renumber();
        Some(removed)
    }

    /// Move an entry to `target` (0-based, clamped to the end), shifting the others.
    /// Returns `false` if the id is unknown.
    pub fn move_to(&mut self, id: EntryId, target: usize) -> bool {
        let Some(from) = self.position(id) else {
            return false;
        };
        let to = target.min(self.entries.len() - 1);
        if from != to {
            let entry = self.entries.remove(from);
            self.entries.insert(to, entry);
            self.renumber();
        }
        true
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.renumber();
    }

    /// Drop everything and take over `entries` in the given order, e.g. after a history restore.
    pub fn replace_with(&mut self, entries: Vec<Entry>) {
        self.entries = entries;
        self.renumber();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    fn renumber(&mut self) {
        for (position, entry) in self.entries.iter_mut().enumerate() {
            entry.set_index(position + 1);
        }
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indices(set: &WorkingSet) -> Vec<usize> {
        set.iter().map(Entry::index).collect()
    }

    #[test]
    fn indices_stay_dense_after_remove() {
        let mut set = WorkingSet::new();
        let a = set.push_text();
        let b = set.push_image(RgbaImage::new(2, 2));
        let c = set.push_text();
        assert_eq!(indices(&set), vec![1, 2, 3]);

        set.remove(b).unwrap();
        assert_eq!(indices(&set), vec![1, 2]);
        assert_eq!(set.get(a).unwrap().index(), 1);
        assert_eq!(set.get(c).unwrap().index(), 2);
        assert_eq!(set.next_index(), 3);
    }

    #[test]
    fn move_keeps_identity() {
        let mut set = WorkingSet::new();
        let a = set.push_text();
        let b = set.push_text();
        let c = set.push_text();

        assert!(set.move_to(c, 0));
        let order: Vec<_> = set.iter().map(Entry::id).collect();
        assert_eq!(order, vec![c, a, b]);
        assert_eq!(indices(&set), vec![1, 2, 3]);

        // Targets past the end are clamped
        assert!(set.move_to(c, 99));
        assert_eq!(set.get(c).unwrap().index(), 3);
        assert!(!set.move_to(EntryId::new(), 0));
    }

    #[test]
    fn replace_with_renumbers() {
        let mut set = WorkingSet::new();
        set.push_text();
        set.replace_with(vec![Entry::text(4), Entry::text(9).with_checked(false)]);
        assert_eq!(indices(&set), vec![1, 2]);
        assert_eq!(set.checked_count(), 1);

        set.clear();
        assert!(set.is_empty());
        assert_eq!(set.next_index(), 1);
    }
}
