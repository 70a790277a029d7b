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

use crate::pool::MemoryPool;
use crate::pool::SlotId;
use crate::pool::StringId;

/// One node of the document tree.
///
/// A slot holds a tagged value, the key when it is an object member, and the
/// index of its next sibling. Links are slot indices, never addresses, so the
/// arena can be reallocated and compacted freely.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Slot {
    pub(crate) content: Content,
    pub(crate) key: Option<Key>,
    pub(crate) next: Option<SlotId>,
}

/// The tagged payload of a slot. Exactly one interpretation is valid per tag.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) enum Content {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    /// Caller-owned text, never copied.
    LinkedString(&'static str),
    /// Text stored in the pool string table.
    OwnedString(StringId),
    /// Preformatted fragment written verbatim, never copied.
    LinkedRaw(&'static [u8]),
    /// Preformatted fragment stored in the pool string table.
    OwnedRaw(StringId),
    Array(Collection),
    Object(Collection),
}

/// Head and tail of a singly linked chain of child slots.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Collection {
    pub(crate) head: Option<SlotId>,
    pub(crate) tail: Option<SlotId>,
}

#[derive(Clone, Copy, Debug)]
pub(crate) enum Key {
    Linked(&'static str),
    Owned(StringId),
}

/// A member key supplied by a caller: either linked or copied into the pool.
#[derive(Clone, Copy, Debug)]
pub(crate) enum KeyRef<'k> {
    Linked(&'static str),
    Copied(&'k [u8]),
}

impl KeyRef<'_> {
    fn as_bytes(&self) -> &[u8] {
        match self {
            KeyRef::Linked(s) => s.as_bytes(),
            KeyRef::Copied(b) => b,
        }
    }
}

impl Content {
    pub(crate) fn is_collection(&self) -> bool {
        matches!(self, Content::Array(_) | Content::Object(_))
    }

    fn collection(&self) -> Option<Collection> {
        match self {
            Content::Array(c) | Content::Object(c) => Some(*c),
            _ => None,
        }
    }
}

impl Slot {
    pub(crate) fn remap_links(&mut self, remap: impl Fn(SlotId) -> Option<SlotId>) {
        self.next = self.next.and_then(&remap);
        match &mut self.content {
            Content::Array(c) | Content::Object(c) => {
                c.head = c.head.and_then(&remap);
                c.tail = c.tail.and_then(&remap);
            }
            _ => {}
        }
    }

    pub(crate) fn remap_strings(&mut self, remap: impl Fn(StringId) -> Option<StringId>) {
        if let Some(Key::Owned(id)) = &mut self.key {
            if let Some(new_id) = remap(*id) {
                *id = new_id;
            }
        }
        match &mut self.content {
            Content::OwnedString(id) | Content::OwnedRaw(id) => {
                if let Some(new_id) = remap(*id) {
                    *id = new_id;
                }
            }
            _ => {}
        }
    }
}

/// Iterates the child slots of an array or object in insertion order.
pub(crate) struct Children<'a> {
    pool: &'a MemoryPool,
    next: Option<SlotId>,
}

impl Iterator for Children<'_> {
    type Item = SlotId;

    fn next(&mut self) -> Option<SlotId> {
        let id = self.next?;
        self.next = self.pool.slot(id).next;
        Some(id)
    }
}

// Variant operations. Every setter releases the previous payload (string
// references, child subtrees) before storing the new one.
impl MemoryPool {
    pub(crate) fn content(&self, id: SlotId) -> Content {
        self.slot(id).content
    }

    pub(crate) fn children(&self, id: SlotId) -> Children<'_> {
        let next = self.content(id).collection().and_then(|c| c.head);
        Children { pool: self, next }
    }

    pub(crate) fn key_bytes(&self, key: Key) -> &[u8] {
        match key {
            Key::Linked(s) => s.as_bytes(),
            Key::Owned(id) => self.string(id),
        }
    }

    pub(crate) fn slot_key(&self, id: SlotId) -> Option<&[u8]> {
        self.slot(id).key.map(|key| self.key_bytes(key))
    }

    pub(crate) fn clear_variant(&mut self, id: SlotId) {
        let content = std::mem::take(&mut self.slot_mut(id).content);
        self.release_content(content);
    }

    fn release_content(&mut self, content: Content) {
        match content {
            Content::OwnedString(s) | Content::OwnedRaw(s) => self.dereference_string(s),
            Content::Array(c) | Content::Object(c) => {
                let mut cur = c.head;
                while let Some(child) = cur {
                    cur = self.slot(child).next;
                    self.release_slot(child);
                }
            }
            _ => {}
        }
    }

    // Releases a detached slot with its key and subtree.
    fn release_slot(&mut self, id: SlotId) {
        let slot = std::mem::take(self.slot_mut(id));
        if let Some(Key::Owned(key)) = slot.key {
            self.dereference_string(key);
        }
        self.release_content(slot.content);
        self.free_slot(id);
    }

    fn set_content(&mut self, id: SlotId, content: Content) {
        let old = std::mem::replace(&mut self.slot_mut(id).content, content);
        self.release_content(old);
    }

    pub(crate) fn set_null(&mut self, id: SlotId) {
        self.set_content(id, Content::Null);
    }

    pub(crate) fn set_bool(&mut self, id: SlotId, value: bool) {
        self.set_content(id, Content::Bool(value));
    }

    pub(crate) fn set_integer(&mut self, id: SlotId, value: i64) {
        self.set_content(id, Content::Int(value));
    }

    pub(crate) fn set_unsigned(&mut self, id: SlotId, value: u64) {
        self.set_content(id, Content::UInt(value));
    }

    pub(crate) fn set_float(&mut self, id: SlotId, value: f64) {
        self.set_content(id, Content::Float(value));
    }

    pub(crate) fn set_linked_string(&mut self, id: SlotId, value: &'static str) {
        self.set_content(id, Content::LinkedString(value));
    }

    pub(crate) fn set_linked_raw(&mut self, id: SlotId, value: &'static [u8]) {
        self.set_content(id, Content::LinkedRaw(value));
    }

    /// Copies `value` into the string table. On overflow the slot becomes null.
    pub(crate) fn set_string(&mut self, id: SlotId, value: &[u8]) -> bool {
        let saved = self.save_string(value);
        self.set_saved(id, saved, false)
    }

    pub(crate) fn set_raw(&mut self, id: SlotId, value: &[u8]) -> bool {
        let saved = self.save_string(value);
        self.set_saved(id, saved, true)
    }

    /// Commits the string builder into the slot.
    pub(crate) fn set_built_string(&mut self, id: SlotId, raw: bool) -> bool {
        let saved = self.save_built_string();
        self.set_saved(id, saved, raw)
    }

    fn set_saved(&mut self, id: SlotId, saved: Option<StringId>, raw: bool) -> bool {
        match saved {
            Some(s) if raw => {
                self.set_content(id, Content::OwnedRaw(s));
                true
            }
            Some(s) => {
                self.set_content(id, Content::OwnedString(s));
                true
            }
            None => {
                self.set_content(id, Content::Null);
                false
            }
        }
    }

    pub(crate) fn to_array(&mut self, id: SlotId) {
        self.set_content(id, Content::Array(Collection::default()));
    }

    pub(crate) fn to_object(&mut self, id: SlotId) {
        self.set_content(id, Content::Object(Collection::default()));
    }

    fn append_child(&mut self, parent: SlotId, child: SlotId) {
        let (mut c, is_array) = match self.content(parent) {
            Content::Array(c) => (c, true),
            Content::Object(c) => (c, false),
            _ => return,
        };
        match c.tail {
            Some(tail) => self.slot_mut(tail).next = Some(child),
            None => c.head = Some(child),
        }
        c.tail = Some(child);
        self.slot_mut(parent).content = if is_array {
            Content::Array(c)
        } else {
            Content::Object(c)
        };
    }

    /// Appends an empty element. A null slot is turned into an array first.
    pub(crate) fn add_element(&mut self, id: SlotId) -> Option<SlotId> {
        match self.content(id) {
            Content::Null => self.to_array(id),
            Content::Array(_) => {}
            _ => return None,
        }
        let child = self.alloc_slot()?;
        self.append_child(id, child);
        Some(child)
    }

    pub(crate) fn get_element(&self, id: SlotId, index: usize) -> Option<SlotId> {
        match self.content(id) {
            Content::Array(_) => self.children(id).nth(index),
            _ => None,
        }
    }

    pub(crate) fn get_member(&self, id: SlotId, key: &[u8]) -> Option<SlotId> {
        match self.content(id) {
            Content::Object(_) => self
                .children(id)
                .find(|child| self.slot_key(*child) == Some(key)),
            _ => None,
        }
    }

    /// Finds the member named `key`, or appends a null member with that key.
    /// A null slot is turned into an object first.
    pub(crate) fn get_or_add_member(&mut self, id: SlotId, key: KeyRef<'_>) -> Option<SlotId> {
        match self.content(id) {
            Content::Null => self.to_object(id),
            Content::Object(_) => {}
            _ => return None,
        }
        if let Some(member) = self.get_member(id, key.as_bytes()) {
            return Some(member);
        }
        let key = match key {
            KeyRef::Linked(s) => Key::Linked(s),
            KeyRef::Copied(bytes) => Key::Owned(self.save_string(bytes)?),
        };
        self.append_member(id, key)
    }

    /// Same as [`MemoryPool::get_or_add_member`] with the key taken from the
    /// string builder. The key is only committed when a new member is added.
    pub(crate) fn get_or_add_member_from_builder(&mut self, id: SlotId) -> Option<SlotId> {
        if let Some(member) = self.get_member(id, self.built_string()) {
            return Some(member);
        }
        let key = self.save_built_string()?;
        self.append_member(id, Key::Owned(key))
    }

    fn append_member(&mut self, id: SlotId, key: Key) -> Option<SlotId> {
        let Some(child) = self.alloc_slot() else {
            if let Key::Owned(s) = key {
                self.dereference_string(s);
            }
            return None;
        };
        self.slot_mut(child).key = Some(key);
        self.append_child(id, child);
        Some(child)
    }

    fn unlink_child(&mut self, parent: SlotId, target: SlotId) {
        let Some(mut c) = self.content(parent).collection() else {
            return;
        };
        let mut prev = None;
        let mut cur = c.head;
        while let Some(child) = cur {
            if child == target {
                break;
            }
            prev = Some(child);
            cur = self.slot(child).next;
        }
        if cur.is_none() {
            return;
        }
        let next = self.slot(target).next;
        match prev {
            Some(p) => self.slot_mut(p).next = next,
            None => c.head = next,
        }
        if c.tail == Some(target) {
            c.tail = prev;
        }
        self.slot_mut(target).next = None;
        let content = &mut self.slot_mut(parent).content;
        match content {
            Content::Array(old) | Content::Object(old) => *old = c,
            _ => {}
        }
        self.release_slot(target);
    }

    pub(crate) fn remove_element(&mut self, id: SlotId, index: usize) -> bool {
        match self.get_element(id, index) {
            Some(child) => {
                self.unlink_child(id, child);
                true
            }
            None => false,
        }
    }

    pub(crate) fn remove_member(&mut self, id: SlotId, key: &[u8]) -> bool {
        match self.get_member(id, key) {
            Some(child) => {
                self.unlink_child(id, child);
                true
            }
            None => false,
        }
    }

    pub(crate) fn size(&self, id: SlotId) -> usize {
        self.children(id).count()
    }

    /// Depth of the deepest container below `id`: 0 for a scalar, 1 for an
    /// empty container.
    pub(crate) fn nesting(&self, id: SlotId) -> usize {
        if !self.content(id).is_collection() {
            return 0;
        }
        let deepest = self
            .children(id)
            .map(|child| self.nesting(child))
            .max()
            .unwrap_or(0);
        deepest + 1
    }

    /// Deep-copies `src` (owned by `src_pool`) into `dst`. Linked strings stay
    /// linked, owned strings are saved into this pool.
    pub(crate) fn copy_variant(&mut self, dst: SlotId, src_pool: &MemoryPool, src: SlotId) -> bool {
        match src_pool.content(src) {
            Content::OwnedString(s) => self.set_string(dst, src_pool.string(s)),
            Content::OwnedRaw(s) => self.set_raw(dst, src_pool.string(s)),
            Content::Array(_) => {
                self.to_array(dst);
                for child in src_pool.children(src) {
                    let Some(element) = self.add_element(dst) else {
                        return false;
                    };
                    if !self.copy_variant(element, src_pool, child) {
                        return false;
                    }
                }
                true
            }
            Content::Object(_) => {
                self.to_object(dst);
                for child in src_pool.children(src) {
                    let key = match src_pool.slot(child).key {
                        Some(Key::Linked(s)) => KeyRef::Linked(s),
                        Some(Key::Owned(s)) => KeyRef::Copied(src_pool.string(s)),
                        None => continue,
                    };
                    let Some(member) = self.get_or_add_member(dst, key) else {
                        return false;
                    };
                    if !self.copy_variant(member, src_pool, child) {
                        return false;
                    }
                }
                true
            }
            scalar => {
                self.set_content(dst, scalar);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::sizeof_object;
    use crate::pool::sizeof_string;
    use crate::pool::Capacity;

    #[test]
    fn test_overwrite_releases_string() {
        let mut pool = MemoryPool::new(Capacity::Elastic);
        let root = SlotId::ROOT;
        assert!(pool.set_string(root, b"hello"));
        assert_eq!(pool.memory_usage(), sizeof_string(5));
        pool.set_integer(root, 42);
        assert_eq!(pool.memory_usage(), 0);
        assert!(matches!(pool.content(root), Content::Int(42)));
    }

    #[test]
    fn test_member_key_overwrite() {
        let mut pool = MemoryPool::new(Capacity::Elastic);
        let root = SlotId::ROOT;
        let a = pool.get_or_add_member(root, KeyRef::Copied(b"a")).unwrap();
        pool.set_integer(a, 1);
        let again = pool.get_or_add_member(root, KeyRef::Copied(b"a")).unwrap();
        assert_eq!(a, again);
        pool.set_integer(again, 2);
        assert_eq!(pool.size(root), 1);
        assert_eq!(pool.memory_usage(), sizeof_object(1) + sizeof_string(1));
    }

    #[test]
    fn test_remove_member_recycles_slot() {
        let mut pool = MemoryPool::new(Capacity::Elastic);
        let root = SlotId::ROOT;
        for key in [&b"a"[..], b"b", b"c"] {
            let member = pool.get_or_add_member(root, KeyRef::Copied(key)).unwrap();
            pool.set_bool(member, true);
        }
        let used = pool.memory_usage();
        assert!(pool.remove_member(root, b"b"));
        assert_eq!(pool.size(root), 2);
        let keys: Vec<_> = pool
            .children(root)
            .map(|c| pool.slot_key(c).unwrap().to_vec())
            .collect();
        assert_eq!(keys, vec![b"a".to_vec(), b"c".to_vec()]);

        // the freed slot is reused before the arena grows
        let d = pool.get_or_add_member(root, KeyRef::Linked("d")).unwrap();
        pool.set_bool(d, false);
        assert!(pool.memory_usage() <= used);
        assert_eq!(pool.size(root), 3);
    }

    #[test]
    fn test_remove_tail_element() {
        let mut pool = MemoryPool::new(Capacity::Elastic);
        let root = SlotId::ROOT;
        for i in 0..3 {
            let e = pool.add_element(root).unwrap();
            pool.set_integer(e, i);
        }
        assert!(pool.remove_element(root, 2));
        assert!(!pool.remove_element(root, 2));
        let e = pool.add_element(root).unwrap();
        pool.set_integer(e, 7);
        let values: Vec<_> = pool
            .children(root)
            .map(|c| match pool.content(c) {
                Content::Int(v) => v,
                _ => -1,
            })
            .collect();
        assert_eq!(values, vec![0, 1, 7]);
    }

    #[test]
    fn test_nesting() {
        let mut pool = MemoryPool::new(Capacity::Elastic);
        let root = SlotId::ROOT;
        assert_eq!(pool.nesting(root), 0);
        pool.to_array(root);
        assert_eq!(pool.nesting(root), 1);
        let inner = pool.add_element(root).unwrap();
        pool.to_object(inner);
        assert_eq!(pool.nesting(root), 2);
    }
}
