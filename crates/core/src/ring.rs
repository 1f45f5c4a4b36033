// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixed-capacity ring buffer for observational entries.
//!
//! Backs the console and network buffers. Pushes overwrite the oldest entry
//! once the buffer is full; readers get a snapshot copy so they never hold
//! the lock across rendering. `update` iterates newest-first because the
//! event router matches response/finish/fail events against the most recent
//! request with the same id.

use parking_lot::Mutex;

/// Thread-safe bounded FIFO. Cheap to share via `Arc`.
#[derive(Debug)]
pub struct Ring<T> {
    inner: Mutex<RingInner<T>>,
}

#[derive(Debug)]
struct RingInner<T> {
    slots: Vec<Option<T>>,
    head: usize,
    len: usize,
}

impl<T> Ring<T> {
    /// Create a ring with the given capacity. Capacity is clamped to ≥ 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self { inner: Mutex::new(RingInner { slots, head: 0, len: 0 }) }
    }

    /// Append an entry, overwriting the oldest when full.
    pub fn push(&self, value: T) {
        let mut g = self.inner.lock();
        let cap = g.slots.len();
        if g.len < cap {
            let idx = (g.head + g.len) % cap;
            g.slots[idx] = Some(value);
            g.len += 1;
        } else {
            let head = g.head;
            g.slots[head] = Some(value);
            g.head = (head + 1) % cap;
        }
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.inner.lock().len
    }

    /// True when no entries are held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fixed capacity.
    pub fn cap(&self) -> usize {
        self.inner.lock().slots.len()
    }

    /// Drop every entry. Slots are cleared so held references are released.
    pub fn clear(&self) {
        let mut g = self.inner.lock();
        for slot in g.slots.iter_mut() {
            *slot = None;
        }
        g.head = 0;
        g.len = 0;
    }

    /// Remove every entry matching the predicate, preserving order of the rest.
    pub fn remove_if(&self, mut pred: impl FnMut(&T) -> bool) {
        let mut g = self.inner.lock();
        let cap = g.slots.len();
        let mut retained: Vec<T> = Vec::with_capacity(g.len);
        for i in 0..g.len {
            let idx = (g.head + i) % cap;
            if let Some(v) = g.slots[idx].take() {
                if !pred(&v) {
                    retained.push(v);
                }
            }
        }
        g.head = 0;
        g.len = retained.len();
        for (i, v) in retained.into_iter().enumerate() {
            g.slots[i] = Some(v);
        }
    }

    /// Visit entries newest-first, allowing in-place mutation. Stops at the
    /// first call that returns `true`. Visits at most `len` entries.
    pub fn update(&self, mut f: impl FnMut(&mut T) -> bool) {
        let mut g = self.inner.lock();
        let cap = g.slots.len();
        let head = g.head;
        for i in (0..g.len).rev() {
            let idx = (head + i) % cap;
            if let Some(v) = g.slots[idx].as_mut() {
                if f(v) {
                    break;
                }
            }
        }
    }
}

impl<T: Clone> Ring<T> {
    /// Snapshot of all entries, oldest-first.
    pub fn all(&self) -> Vec<T> {
        let g = self.inner.lock();
        let cap = g.slots.len();
        let mut out = Vec::with_capacity(g.len);
        for i in 0..g.len {
            let idx = (g.head + i) % cap;
            if let Some(v) = &g.slots[idx] {
                out.push(v.clone());
            }
        }
        out
    }
}

#[cfg(test)]
#[path = "ring_tests.rs"]
mod tests;
