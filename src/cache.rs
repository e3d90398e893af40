use std::cell::{OnceCell, RefCell};
use std::collections::HashMap;
use std::hash::Hash;

/// Anything that caches derived values should implement this. Mutating
/// methods call it before touching the state the caches were derived from.
pub trait InvalidateCache {
    /// Invalidate *all* internal caches so future queries recompute correctly.
    fn invalidate_cache(&mut self);
}

impl<T: InvalidateCache + ?Sized> InvalidateCache for Box<T> {
    #[inline]
    fn invalidate_cache(&mut self) {
        (**self).invalidate_cache();
    }
}

/// A value computed at most once until invalidated.
#[derive(Debug, Clone)]
pub struct Lazy<T> {
    cell: OnceCell<T>,
}

impl<T> Default for Lazy<T> {
    fn default() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }
}

impl<T: Clone> Lazy<T> {
    /// Creates an empty cell.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached value, computing it with `init` on a miss.
    ///
    /// A failed computation leaves the cell empty.
    ///
    /// # Errors
    ///
    /// Propagates the error returned by `init`.
    pub fn get_or_try_init<E>(&self, init: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
        if let Some(value) = self.cell.get() {
            return Ok(value.clone());
        }
        let value = init()?;
        // `init` may have filled the cell re-entrantly; keep the first value.
        Ok(self.cell.get_or_init(|| value).clone())
    }

    /// Returns the cached value without computing it.
    #[must_use]
    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }

    /// Drops the cached value.
    pub fn invalidate(&mut self) {
        self.cell.take();
    }
}

/// Values memoized by key, e.g. per coordinate space.
///
/// Lookups never fail on their own: if the map is already borrowed (a
/// computation re-entered the same memo) the value is computed without
/// being stored.
#[derive(Debug, Clone)]
pub struct Memo<K, V> {
    entries: RefCell<HashMap<K, V>>,
}

impl<K, V> Default for Memo<K, V> {
    fn default() -> Self {
        Self {
            entries: RefCell::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Memo<K, V> {
    /// Creates an empty memo.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value for `key`, computing it with `compute` on a miss.
    ///
    /// # Errors
    ///
    /// Propagates the error returned by `compute`; nothing is stored.
    pub fn get_or_try_insert<E>(
        &self,
        key: &K,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Ok(entries) = self.entries.try_borrow() {
            if let Some(value) = entries.get(key) {
                tracing::trace!("memo hit");
                return Ok(value.clone());
            }
        }
        let value = compute()?;
        if let Ok(mut entries) = self.entries.try_borrow_mut() {
            entries.insert(key.clone(), value.clone());
        }
        Ok(value)
    }

    /// Returns `true` if a value is cached for `key`.
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.entries
            .try_borrow()
            .is_ok_and(|entries| entries.contains_key(key))
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.try_borrow().map_or(0, |entries| entries.len())
    }

    /// Returns `true` if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every cached value.
    pub fn invalidate(&mut self) {
        self.entries.get_mut().clear();
    }
}

/// Objects cached by list position.
#[derive(Debug, Clone)]
pub struct PositionCache<T> {
    entries: RefCell<HashMap<usize, T>>,
}

impl<T> Default for PositionCache<T> {
    fn default() -> Self {
        Self {
            entries: RefCell::new(HashMap::new()),
        }
    }
}

impl<T: Clone> PositionCache<T> {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the object at `position`, building it with `build` on a miss.
    pub fn get_or_insert_with(&self, position: usize, build: impl FnOnce() -> T) -> T {
        if let Some(value) = self.get(position) {
            return value;
        }
        let value = build();
        if let Ok(mut entries) = self.entries.try_borrow_mut() {
            entries.insert(position, value.clone());
        }
        value
    }

    /// Returns the cached object at `position`.
    #[must_use]
    pub fn get(&self, position: usize) -> Option<T> {
        self.entries
            .try_borrow()
            .ok()
            .and_then(|entries| entries.get(&position).cloned())
    }

    /// Stores `value` at `position`.
    pub fn insert(&mut self, position: usize, value: T) {
        self.entries.get_mut().insert(position, value);
    }

    /// Forgets the object at `position`.
    pub fn pop(&mut self, position: usize) -> Option<T> {
        self.entries.get_mut().remove(&position)
    }

    /// Forgets `position` and moves every later entry down by one, keeping
    /// the cache aligned with a list that had `position` removed.
    pub fn remove_and_shift(&mut self, position: usize) {
        let entries = self.entries.get_mut();
        entries.remove(&position);
        let shifted: HashMap<usize, T> = entries
            .drain()
            .map(|(k, v)| if k > position { (k - 1, v) } else { (k, v) })
            .collect();
        *entries = shifted;
    }

    /// Positions currently cached.
    #[must_use]
    pub fn positions(&self) -> Vec<usize> {
        let mut positions: Vec<usize> = self
            .entries
            .try_borrow()
            .map(|entries| entries.keys().copied().collect())
            .unwrap_or_default();
        positions.sort_unstable();
        positions
    }

    /// Drops every cached object.
    pub fn clear(&mut self) {
        self.entries.get_mut().clear();
    }
}
