//! # Slot Stack
//!
//! Fixed-capacity LIFO of recyclable slot indices.

/// A pre-allocated stack of `u16` slot indices.
///
/// Recycling is LIFO: the most recently freed slot is handed out first,
/// which keeps recently touched memory hot in cache.
///
/// # Thread Safety
///
/// This stack is NOT thread-safe. It is owned by a single entity store.
///
/// # Example
///
/// ```rust
/// use lockstep_core::SlotStack;
///
/// let mut free = SlotStack::with_capacity(4);
/// assert!(free.push(2));
/// assert!(free.push(3));
/// assert_eq!(free.pop(), Some(3));
/// ```
#[derive(Debug, Clone)]
pub struct SlotStack {
    /// Backing storage, sized once.
    data: Box<[u16]>,
    /// Number of occupied entries.
    len: usize,
}

impl SlotStack {
    /// Creates an empty stack that can hold `capacity` indices.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![0; capacity].into_boxed_slice(),
            len: 0,
        }
    }

    /// Returns the maximum number of indices.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Returns the number of indices currently stored.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no index is stored.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Pushes an index. O(1), no allocation.
    ///
    /// Returns `false` (and stores nothing) when the stack is full.
    #[inline]
    pub fn push(&mut self, index: u16) -> bool {
        let Some(slot) = self.data.get_mut(self.len) else {
            return false;
        };
        *slot = index;
        self.len += 1;
        true
    }

    /// Pops the most recently pushed index. O(1), no allocation.
    #[inline]
    pub fn pop(&mut self) -> Option<u16> {
        self.len = self.len.checked_sub(1)?;
        Some(self.data[self.len])
    }

    /// Drops every stored index without touching the backing storage.
    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }
}
