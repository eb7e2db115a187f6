/// Indexed storage with reuse of freed slots.
///
/// A `Slab` hands out small `usize` keys that stay valid until the entry is
/// removed. Freed keys are recycled by later insertions, so a key must not
/// be used after its [`remove`](Self::remove).
pub(crate) struct Slab<T> {
    /// Occupied and vacant slots.
    entries: Vec<Option<T>>,

    /// Stack of vacant keys that can be reused.
    free: Vec<usize>,
}

impl<T> Slab<T> {
    /// Creates an empty slab with room for `capacity` entries.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            free: Vec::new(),
        }
    }

    /// Inserts a value and returns its key.
    ///
    /// Vacant slots are reused before the slab grows.
    pub(crate) fn insert(&mut self, item: T) -> usize {
        match self.free.pop() {
            Some(key) => {
                self.entries[key] = Some(item);
                key
            }
            None => {
                self.entries.push(Some(item));
                self.entries.len() - 1
            }
        }
    }

    /// Removes and returns the value stored at `key`.
    ///
    /// # Panics
    ///
    /// Panics if `key` is out of range or vacant.
    pub(crate) fn remove(&mut self, key: usize) -> T {
        let item = self
            .entries
            .get_mut(key)
            .and_then(Option::take)
            .expect("Slab::remove on a vacant key");

        self.free.push(key);
        item
    }

    pub(crate) fn get_mut(&mut self, key: usize) -> Option<&mut T> {
        self.entries.get_mut(key).and_then(Option::as_mut)
    }

    /// Iterates over occupied entries with their keys.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(key, entry)| entry.as_ref().map(|item| (key, item)))
    }

    /// Iterates mutably over occupied entries with their keys.
    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut T)> {
        self.entries
            .iter_mut()
            .enumerate()
            .filter_map(|(key, entry)| entry.as_mut().map(|item| (key, item)))
    }

    /// Number of occupied entries.
    pub(crate) fn len(&self) -> usize {
        self.entries.len() - self.free.len()
    }
}
