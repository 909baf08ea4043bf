//! Cache line padding to prevent false sharing.

use std::fmt;
use std::ops::{Deref, DerefMut};

/// Size of a cache line on most modern CPUs
pub const CACHE_LINE_SIZE: usize = 64;

/// A value padded to the size of a cache line to prevent false sharing.
#[repr(align(64))]
pub struct CachePadded<T> {
    value: T,
}

impl<T> CachePadded<T> {
    /// Create a new cache-padded value
    pub const fn new(value: T) -> Self {
        Self { value }
    }

    /// Unwrap the cache-padded value
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> Deref for CachePadded<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> DerefMut for CachePadded<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T: fmt::Debug> fmt::Debug for CachePadded<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CachePadded").field(&self.value).finish()
    }
}

impl<T: Default> Default for CachePadded<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
