// Copyright 2023 Datafuse Labs.
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

use core::ops::Range;
use std::collections::HashMap;

use log::debug;

use crate::constants::STRING_HEADER_SIZE;
use crate::variant::Slot;

/// Size in bytes charged for every slot (tree node).
pub const SLOT_SIZE: usize = std::mem::size_of::<Slot>();

/// Pool bytes needed by an array of `n` elements, excluding nested content.
pub const fn sizeof_array(n: usize) -> usize {
    n * SLOT_SIZE
}

/// Pool bytes needed by an object of `n` members, excluding keys and nested content.
pub const fn sizeof_object(n: usize) -> usize {
    n * SLOT_SIZE
}

/// Pool bytes needed by one owned string of `n` bytes.
pub const fn sizeof_string(n: usize) -> usize {
    STRING_HEADER_SIZE + n
}

/// How much memory a pool may use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capacity {
    /// A hard limit in bytes. Allocations beyond it fail with an overflow.
    Fixed(usize),
    /// Grow on demand.
    Elastic,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct SlotId(u32);

impl SlotId {
    /// The document root. It lives outside the accounted slot region and is
    /// never freed.
    pub(crate) const ROOT: SlotId = SlotId(0);

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct StringId(u32);

impl StringId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, Debug)]
struct StringNode {
    offset: usize,
    len: usize,
    // zero means the record is garbage waiting for compaction
    refs: u32,
}

impl StringNode {
    fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.len
    }
}

/// The memory pool owning every slot and string of one document.
///
/// The pool has two regions growing toward each other inside one budget: the
/// string table and the slot arena. Both are addressed by small integer
/// handles, so the backing storage may move or shrink at any time.
///
/// Allocation never panics or returns an error. When the budget is exhausted
/// the allocation returns `None` and the pool remembers it overflowed.
#[derive(Clone, Debug)]
pub struct MemoryPool {
    capacity: Capacity,
    slots: Vec<Slot>,
    free_slots: Option<SlotId>,
    heap: Vec<u8>,
    strings: Vec<StringNode>,
    // live records only, keyed by content
    index: HashMap<Box<[u8]>, StringId>,
    string_bytes: usize,
    builder: Vec<u8>,
    overflowed: bool,
}

impl MemoryPool {
    pub fn new(capacity: Capacity) -> MemoryPool {
        let mut slots = Vec::new();
        slots.push(Slot::default());
        Self {
            capacity,
            slots,
            free_slots: None,
            heap: Vec::new(),
            strings: Vec::new(),
            index: HashMap::new(),
            string_bytes: 0,
            builder: Vec::new(),
            overflowed: false,
        }
    }

    /// Bytes currently used by strings and slots, garbage included.
    pub fn memory_usage(&self) -> usize {
        self.string_bytes + self.slot_bytes()
    }

    /// Bytes the pool may use (fixed pools) or has allocated (elastic pools).
    pub fn capacity(&self) -> usize {
        match self.capacity {
            Capacity::Fixed(bytes) => bytes,
            Capacity::Elastic => {
                self.slots.capacity().saturating_sub(1) * SLOT_SIZE
                    + self.heap.capacity()
                    + self.strings.capacity() * STRING_HEADER_SIZE
            }
        }
    }

    /// Whether any allocation failed since the last [`MemoryPool::clear`].
    pub fn overflowed(&self) -> bool {
        self.overflowed
    }

    /// Drops every slot and string at once. The root becomes null.
    pub fn clear(&mut self) {
        self.slots.truncate(1);
        self.slots[0] = Slot::default();
        self.free_slots = None;
        self.heap.clear();
        self.strings.clear();
        self.index.clear();
        self.string_bytes = 0;
        self.builder.clear();
        self.overflowed = false;
    }

    fn slot_bytes(&self) -> usize {
        (self.slots.len() - 1) * SLOT_SIZE
    }

    fn reserve(&mut self, bytes: usize) -> bool {
        if let Capacity::Fixed(capacity) = self.capacity {
            let usage = self.memory_usage();
            if usage + bytes > capacity {
                if !self.overflowed {
                    debug!(
                        "memory pool overflow: requested {} bytes, usage {}, capacity {}",
                        bytes, usage, capacity
                    );
                }
                self.overflowed = true;
                return false;
            }
        }
        true
    }

    #[inline]
    pub(crate) fn slot(&self, id: SlotId) -> &Slot {
        &self.slots[id.index()]
    }

    #[inline]
    pub(crate) fn slot_mut(&mut self, id: SlotId) -> &mut Slot {
        &mut self.slots[id.index()]
    }

    /// Takes a slot from the free list, or bump-allocates a new one.
    pub(crate) fn alloc_slot(&mut self) -> Option<SlotId> {
        if let Some(id) = self.free_slots {
            self.free_slots = self.slot(id).next;
            *self.slot_mut(id) = Slot::default();
            return Some(id);
        }
        let Ok(index) = u32::try_from(self.slots.len()) else {
            self.overflowed = true;
            return None;
        };
        if !self.reserve(SLOT_SIZE) {
            return None;
        }
        self.slots.push(Slot::default());
        Some(SlotId(index))
    }

    /// Puts a detached slot on the free list. Its content must already be released.
    pub(crate) fn free_slot(&mut self, id: SlotId) {
        debug_assert_ne!(id, SlotId::ROOT);
        *self.slot_mut(id) = Slot {
            next: self.free_slots,
            ..Slot::default()
        };
        self.free_slots = Some(id);
    }

    fn find_string(&self, value: &[u8]) -> Option<StringId> {
        self.index.get(value).copied()
    }

    /// Stores `value` in the string table, sharing an identical record if
    /// one exists.
    pub(crate) fn save_string(&mut self, value: &[u8]) -> Option<StringId> {
        if let Some(id) = self.find_string(value) {
            self.strings[id.index()].refs += 1;
            return Some(id);
        }
        let Ok(index) = u32::try_from(self.strings.len()) else {
            self.overflowed = true;
            return None;
        };
        if !self.reserve(sizeof_string(value.len())) {
            return None;
        }
        let offset = self.heap.len();
        self.heap.extend_from_slice(value);
        self.strings.push(StringNode {
            offset,
            len: value.len(),
            refs: 1,
        });
        self.string_bytes += sizeof_string(value.len());
        self.index.insert(value.into(), StringId(index));
        Some(StringId(index))
    }

    #[inline]
    pub(crate) fn string(&self, id: StringId) -> &[u8] {
        &self.heap[self.strings[id.index()].range()]
    }

    /// Drops one reference. Unreferenced records at the end of the table are
    /// reclaimed immediately, the others at the next compaction.
    pub(crate) fn dereference_string(&mut self, id: StringId) {
        let node = &mut self.strings[id.index()];
        if node.refs == 0 {
            return;
        }
        node.refs -= 1;
        if node.refs > 0 {
            return;
        }
        let range = node.range();
        self.index.remove(&self.heap[range]);
        while let Some(last) = self.strings.last() {
            if last.refs > 0 {
                break;
            }
            self.heap.truncate(last.offset);
            self.string_bytes -= sizeof_string(last.len);
            self.strings.pop();
        }
    }

    /// Starts a new string in the builder, replacing any unfinished one.
    pub(crate) fn start_string(&mut self) {
        self.builder.clear();
    }

    /// Appends to the string being built. Fails when the finished string
    /// could not fit in an empty pool. Free space is only charged when the
    /// string is saved, since it may match an existing record.
    pub(crate) fn append_string(&mut self, bytes: &[u8]) -> bool {
        if let Capacity::Fixed(capacity) = self.capacity {
            let needed = sizeof_string(self.builder.len() + bytes.len());
            if needed > capacity {
                if !self.overflowed {
                    debug!(
                        "string of {} bytes exceeds pool capacity {}",
                        needed, capacity
                    );
                }
                self.overflowed = true;
                return false;
            }
        }
        self.builder.extend_from_slice(bytes);
        true
    }

    pub(crate) fn built_string(&self) -> &[u8] {
        &self.builder
    }

    /// Commits the string builder into the string table.
    pub(crate) fn save_built_string(&mut self) -> Option<StringId> {
        let builder = std::mem::take(&mut self.builder);
        let id = self.save_string(&builder);
        self.builder = builder;
        self.builder.clear();
        id
    }

    /// Drops garbage strings and free slots, then releases unused capacity.
    /// A fixed pool's capacity becomes its current usage.
    pub fn shrink_to_fit(&mut self) {
        let before = self.memory_usage();
        self.compact_strings();
        self.compact_slots();
        self.slots.shrink_to_fit();
        self.heap.shrink_to_fit();
        self.strings.shrink_to_fit();
        self.builder = Vec::new();
        if let Capacity::Fixed(_) = self.capacity {
            self.capacity = Capacity::Fixed(self.memory_usage());
        }
        debug!(
            "memory pool compacted from {} to {} bytes",
            before,
            self.memory_usage()
        );
    }

    fn compact_strings(&mut self) {
        if self.strings.iter().all(|node| node.refs > 0) {
            return;
        }
        let mut remap = Vec::with_capacity(self.strings.len());
        let mut heap = Vec::new();
        let mut strings = Vec::new();
        let mut string_bytes = 0;
        self.index.clear();
        for node in self.strings.iter() {
            if node.refs == 0 {
                remap.push(None);
                continue;
            }
            let id = StringId(strings.len() as u32);
            remap.push(Some(id));
            let offset = heap.len();
            let value = &self.heap[node.range()];
            heap.extend_from_slice(value);
            self.index.insert(value.into(), id);
            strings.push(StringNode {
                offset,
                len: node.len,
                refs: node.refs,
            });
            string_bytes += sizeof_string(node.len);
        }
        for slot in self.slots.iter_mut() {
            slot.remap_strings(|id| remap[id.index()]);
        }
        self.heap = heap;
        self.strings = strings;
        self.string_bytes = string_bytes;
    }

    fn compact_slots(&mut self) {
        if self.free_slots.is_none() {
            return;
        }
        let mut free = vec![false; self.slots.len()];
        let mut cur = self.free_slots;
        while let Some(id) = cur {
            free[id.index()] = true;
            cur = self.slot(id).next;
        }
        let mut remap = Vec::with_capacity(self.slots.len());
        let mut live = 0u32;
        for is_free in free.iter() {
            if *is_free {
                remap.push(None);
            } else {
                remap.push(Some(SlotId(live)));
                live += 1;
            }
        }
        let mut slots = Vec::with_capacity(live as usize);
        for (slot, is_free) in self.slots.iter().zip(free.iter()) {
            if *is_free {
                continue;
            }
            let mut slot = *slot;
            slot.remap_links(|id| remap[id.index()]);
            slots.push(slot);
        }
        self.slots = slots;
        self.free_slots = None;
    }
}
