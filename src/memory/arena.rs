//! Byte Arena
//!
//! Growable byte buffer whose capacity is always a whole number of pages.

use std::alloc::{handle_alloc_error, Layout};
use std::collections::TryReserveError;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::OnceLock;

use super::AllocationStats;

/// Page size used when the platform cannot be asked
const FALLBACK_PAGE_SIZE: usize = 4096;

/// Growable byte buffer with page-granular capacity
///
/// `size` is the logical length, `capacity` the allocated length. The
/// invariant `capacity >= size` always holds, and `capacity` is always a
/// multiple of [`ByteArena::granularity`].
///
/// ## Out of memory
/// Growing an arena never fails gracefully. If the system cannot supply
/// the memory the process aborts through [`std::alloc::handle_alloc_error`]
/// after logging the request. Callers upstream rely on allocation always
/// succeeding.
pub struct ByteArena {
    /// Backing storage; its length is the arena capacity
    data: Vec<u8>,
    /// Logical length
    size: usize,
}

impl ByteArena {
    /// Create an empty arena with no memory allocated
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            size: 0,
        }
    }

    /// Create an arena of `size` zeroed bytes
    pub fn with_size(size: usize) -> Self {
        let mut arena = Self::new();
        arena.reset(size);
        arena
    }

    /// Create an arena holding a copy of `bytes`
    pub fn from_slice(bytes: &[u8]) -> Self {
        let mut arena = Self::with_size(bytes.len());
        arena.copy_from_slice(bytes);
        arena
    }

    /// The page size all capacities are rounded to (a power of two)
    pub fn granularity() -> usize {
        static PAGE_SIZE: OnceLock<usize> = OnceLock::new();
        *PAGE_SIZE.get_or_init(query_page_size)
    }

    /// Logical length in bytes
    pub fn size(&self) -> usize {
        self.size
    }

    /// Allocated length in bytes
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.size]
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data[..self.size]
    }

    /// The data followed by `padding` bytes of spare capacity, if there is room
    pub fn padded(&self, padding: usize) -> Option<&[u8]> {
        let end = self.size.checked_add(padding)?;
        self.data.get(..end)
    }

    /// Change the size without preserving the contents
    ///
    /// Capacity grows to fit `size` and is never reduced.
    pub fn reset(&mut self, size: usize) {
        if size > self.capacity() {
            let capacity = capacity_for_size(size);
            let old_capacity = self.capacity();
            // Drop the old block first so peak usage stays at one block
            self.data = Vec::new();
            self.data = allocate_zeroed(capacity);
            AllocationStats::track_change(old_capacity, capacity);
        }
        self.size = size;
    }

    /// Change the size, preserving the first `min(old, new)` bytes
    ///
    /// Capacity grows to fit `size` and is never reduced.
    pub fn resize(&mut self, size: usize) {
        self.reserve(size);
        self.size = size;
    }

    /// Make sure at least `capacity` bytes are allocated, keeping the contents
    pub fn reserve(&mut self, capacity: usize) {
        if capacity <= self.capacity() {
            return;
        }
        let old_capacity = self.capacity();
        let new_capacity = capacity_for_size(capacity);
        if let Err(err) = self.data.try_reserve_exact(new_capacity - old_capacity) {
            out_of_memory(new_capacity, err);
        }
        self.data.resize(new_capacity, 0);
        AllocationStats::track_change(old_capacity, new_capacity);
    }

    /// Release capacity beyond the page-rounded size, if there is any
    pub fn shrink_to_fit(&mut self) {
        let new_capacity = capacity_for_size(self.size);
        let old_capacity = self.capacity();
        if new_capacity < old_capacity {
            self.data.truncate(new_capacity);
            self.data.shrink_to_fit();
            AllocationStats::track_change(old_capacity, new_capacity);
        }
    }

    /// Discard the contents, keeping the capacity
    pub fn clear(&mut self) {
        self.size = 0;
    }
}

impl Default for ByteArena {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ByteArena {
    fn drop(&mut self) {
        AllocationStats::track_deallocation(self.capacity());
    }
}

impl Deref for ByteArena {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl DerefMut for ByteArena {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.as_mut_slice()
    }
}

impl AsRef<[u8]> for ByteArena {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl From<&[u8]> for ByteArena {
    fn from(bytes: &[u8]) -> Self {
        Self::from_slice(bytes)
    }
}

impl PartialEq for ByteArena {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for ByteArena {}

impl fmt::Debug for ByteArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteArena")
            .field("size", &self.size)
            .field("capacity", &self.capacity())
            .finish()
    }
}

// =============================================================================
// Private Helpers
// =============================================================================

/// Round `size` up to a whole number of pages
fn capacity_for_size(size: usize) -> usize {
    let mask = ByteArena::granularity() - 1;
    match size.checked_add(mask) {
        Some(padded) => padded & !mask,
        None => panic!("ByteArena: capacity overflow for {} bytes", size),
    }
}

fn allocate_zeroed(capacity: usize) -> Vec<u8> {
    let mut data = Vec::new();
    if let Err(err) = data.try_reserve_exact(capacity) {
        out_of_memory(capacity, err);
    }
    data.resize(capacity, 0);
    data
}

/// Abort the process: arenas never report allocation failure to callers
fn out_of_memory(capacity: usize, err: TryReserveError) -> ! {
    tracing::error!(capacity, %err, "ByteArena allocation failed, aborting");
    match Layout::from_size_align(capacity, 1) {
        Ok(layout) => handle_alloc_error(layout),
        Err(_) => panic!("ByteArena: capacity overflow for {} bytes", capacity),
    }
}

#[cfg(unix)]
fn query_page_size() -> usize {
    // SAFETY: sysconf has no preconditions and only reads system configuration
    let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    match usize::try_from(page_size) {
        Ok(size) if size.is_power_of_two() => size,
        _ => FALLBACK_PAGE_SIZE,
    }
}

#[cfg(not(unix))]
fn query_page_size() -> usize {
    FALLBACK_PAGE_SIZE
}
