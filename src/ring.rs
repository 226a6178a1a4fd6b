//! Fixed-capacity FIFO ring for the capture and bulk stages.
//!
//! # Overview
//! - Capacity is a power of two, checked at construction; indices wrap with a bitmask.
//! - One slot always stays empty, so a ring of capacity `N` holds at most `N - 1` elements
//!   and `head == tail` always means empty.
//! - A push into a full ring fails with [`Full`] and hands the element back; nothing is
//!   overwritten.
//! - Slot storage is allocated once in [`RingBuffer::new`]; `push`/`pop` never allocate.
//!
//! # Notes
//! - Mutation takes `&mut self`. Sharing between contexts is the owner's job (a spinlock on
//!   the capture side, a mutex on the bulk side).
//! - `peak` is the occupancy high-water mark since construction or the last `clear`.

use alloc::boxed::Box;
use core::fmt;
use core::mem::MaybeUninit;

use crate::error::{Error, Full};

pub struct RingBuffer<T> {
    slots: Box<[MaybeUninit<T>]>,
    mask: usize,
    head: usize,
    tail: usize,
    peak: usize,
}

impl<T> RingBuffer<T> {
    pub fn new(capacity: usize) -> Result<Self, Error> {
        if capacity == 0 || !capacity.is_power_of_two() {
            return Err(Error::CapacityInvalid { capacity });
        }
        Ok(Self {
            slots: Box::new_uninit_slice(capacity),
            mask: capacity - 1,
            head: 0,
            tail: 0,
            peak: 0,
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.mask + 1
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.head.wrapping_sub(self.tail) & self.mask
    }

    /// Free slots left before a push fails.
    #[inline]
    pub fn space(&self) -> usize {
        self.mask - self.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.space() == 0
    }

    #[inline]
    pub fn peak(&self) -> usize {
        self.peak
    }

    pub fn push(&mut self, item: T) -> Result<(), Full<T>> {
        if self.is_full() {
            return Err(Full(item));
        }
        self.slots[self.head].write(item);
        self.head = (self.head + 1) & self.mask;
        self.peak = self.peak.max(self.len());
        Ok(())
    }

    pub fn pop(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        // SAFETY: slots in [tail, head) were written by `push` and not yet read.
        let item = unsafe { self.slots[self.tail].assume_init_read() };
        self.tail = (self.tail + 1) & self.mask;
        Some(item)
    }

    /// The element `pop` would return next.
    #[inline]
    pub fn peek(&self) -> Option<&T> {
        if self.is_empty() {
            return None;
        }
        // SAFETY: as in `pop`; the slot stays owned by the ring.
        Some(unsafe { self.slots[self.tail].assume_init_ref() })
    }

    /// Drop every held element and reset indices and `peak`.
    pub fn clear(&mut self) {
        while self.pop().is_some() {}
        self.head = 0;
        self.tail = 0;
        self.peak = 0;
    }
}

impl<T> Drop for RingBuffer<T> {
    fn drop(&mut self) {
        while self.pop().is_some() {}
    }
}

impl<T> fmt::Debug for RingBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .field("head", &self.head)
            .field("tail", &self.tail)
            .field("peak", &self.peak)
            .finish()
    }
}
