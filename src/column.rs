// Copyright 2024 Saptak Santra
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Type-erased, contiguous component storage for a single archetype column.
//!
//! Each `Column` is a flat byte buffer holding `count` elements of a fixed
//! `elem_size`, laid out back to back with no padding between elements. The
//! growth policy (`min(cap/2, 1000)`, minimum step 1) and the swap-remove
//! compaction scheme mirror the original `ComponentStorage` growth logic.

use crate::error::{EcsError, Result};

/// A single component's contiguous storage within an archetype.
pub struct Column {
    elem_size: usize,
    count: usize,
    capacity: usize,
    bytes: Vec<u8>,
}

impl Column {
    pub fn new(elem_size: usize) -> Self {
        Self {
            elem_size,
            count: 0,
            capacity: 0,
            bytes: Vec::new(),
        }
    }

    pub fn elem_size(&self) -> usize {
        self.elem_size
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Next growth target given the current capacity: grow by
    /// `min(capacity / 2, 1000)`, with a minimum step of 1 so an empty or
    /// single-slot column can still grow. Errors instead of wrapping if the
    /// addition would overflow `usize`.
    fn next_capacity(capacity: usize) -> Result<usize> {
        let step = (capacity / 2).clamp(1, 1000);
        capacity.checked_add(step).ok_or(EcsError::GrowthOverflow)
    }

    fn ensure_capacity(&mut self, needed: usize) -> Result<()> {
        while self.capacity < needed {
            let next = Self::next_capacity(self.capacity)?;
            self.bytes.resize(next * self.elem_size, 0);
            self.capacity = next;
        }
        Ok(())
    }

    /// Append `bytes` (exactly `elem_size` long) as a new row, growing the
    /// backing buffer first if needed. Returns the new row's index.
    pub fn append(&mut self, value: &[u8]) -> Result<usize> {
        debug_assert_eq!(value.len(), self.elem_size);
        self.ensure_capacity(self.count + 1)?;
        let row = self.count;
        let offset = row * self.elem_size;
        self.bytes[offset..offset + self.elem_size].copy_from_slice(value);
        self.count += 1;
        Ok(row)
    }

    /// Overwrite the value at `row` in place.
    pub fn write(&mut self, row: usize, value: &[u8]) -> Result<()> {
        debug_assert_eq!(value.len(), self.elem_size);
        self.bounds_check(row)?;
        let offset = row * self.elem_size;
        self.bytes[offset..offset + self.elem_size].copy_from_slice(value);
        Ok(())
    }

    /// Read the raw bytes stored at `row`.
    pub fn read(&self, row: usize) -> Result<&[u8]> {
        self.bounds_check(row)?;
        let offset = row * self.elem_size;
        Ok(&self.bytes[offset..offset + self.elem_size])
    }

    /// Mutable view of the raw bytes stored at `row`.
    pub fn read_mut(&mut self, row: usize) -> Result<&mut [u8]> {
        self.bounds_check(row)?;
        let offset = row * self.elem_size;
        let size = self.elem_size;
        Ok(&mut self.bytes[offset..offset + size])
    }

    /// Remove `row` by swapping the last element into its place (if `row`
    /// isn't already the last element) and truncating the count by one.
    /// Returns the index of the row that was moved into `row`'s place, if
    /// any (`None` when `row` was the last element).
    pub fn swap_remove(&mut self, row: usize) -> Result<Option<usize>> {
        self.bounds_check(row)?;
        let last = self.count - 1;
        if row != last {
            let (head, tail) = self.bytes.split_at_mut(last * self.elem_size);
            let dst = &mut head[row * self.elem_size..row * self.elem_size + self.elem_size];
            dst.copy_from_slice(&tail[..self.elem_size]);
        }
        self.count -= 1;
        Ok(if row == last { None } else { Some(last) })
    }

    pub fn clear(&mut self) {
        self.count = 0;
    }

    fn bounds_check(&self, row: usize) -> Result<()> {
        if row >= self.count {
            Err(EcsError::OutOfBounds {
                index: row,
                count: self.count,
            })
        } else {
            Ok(())
        }
    }
}
