use crate::Depth;

const NIL: usize = usize::MAX;
const PRESENT: Depth = Depth::MAX;

/// Backtrackable set of indices in `[0, capacity)`.
///
/// Present indices form a doubly linked list in ascending order, so `first`, `last`,
/// `next` and `prev` are O(1). Removed indices keep their links; they are pushed on a
/// stack together with the depth at which they were removed, and restoring them in
/// reverse order relinks each one exactly where it was.
#[derive(Clone, Debug)]
pub struct ReversibleIndexSet {
    next: Vec<usize>,
    prev: Vec<usize>,
    head: usize,
    tail: usize,
    size: usize,
    removed_at: Vec<Depth>,
    removed: Vec<usize>,
}

impl ReversibleIndexSet {
    pub fn new(capacity: usize) -> Self {
        let next = (0..capacity)
            .map(|a| if a + 1 < capacity { a + 1 } else { NIL })
            .collect();
        let prev = (0..capacity)
            .map(|a| if a == 0 { NIL } else { a - 1 })
            .collect();
        Self {
            next,
            prev,
            head: if capacity > 0 { 0 } else { NIL },
            tail: capacity.checked_sub(1).unwrap_or(NIL),
            size: capacity,
            removed_at: vec![PRESENT; capacity],
            removed: Vec::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.removed_at.len()
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn contains(&self, a: usize) -> bool {
        a < self.removed_at.len() && self.removed_at[a] == PRESENT
    }

    pub fn first(&self) -> Option<usize> {
        (self.head != NIL).then_some(self.head)
    }

    pub fn last(&self) -> Option<usize> {
        (self.tail != NIL).then_some(self.tail)
    }

    /// Smallest present index greater than `a`. `a` must be present.
    pub fn next(&self, a: usize) -> Option<usize> {
        debug_assert!(self.contains(a));
        let n = self.next[a];
        (n != NIL).then_some(n)
    }

    /// Greatest present index smaller than `a`. `a` must be present.
    pub fn prev(&self, a: usize) -> Option<usize> {
        debug_assert!(self.contains(a));
        let p = self.prev[a];
        (p != NIL).then_some(p)
    }

    /// Depth at which `a` was removed, `None` if it is present.
    pub fn removed_at(&self, a: usize) -> Option<Depth> {
        let d = self.removed_at[a];
        (d != PRESENT).then_some(d)
    }

    /// Most recently removed index.
    pub fn last_removed(&self) -> Option<usize> {
        self.removed.last().copied()
    }

    pub fn remove(&mut self, a: usize, depth: Depth) {
        assert!(self.contains(a), "index {a} is not present in the set");
        debug_assert!(
            self.removed
                .last()
                .map_or(true, |&b| self.removed_at[b] <= depth),
            "removal at depth {depth} follows a removal made deeper in the search"
        );
        let (p, n) = (self.prev[a], self.next[a]);
        if p == NIL {
            self.head = n;
        } else {
            self.next[p] = n;
        }
        if n == NIL {
            self.tail = p;
        } else {
            self.prev[n] = p;
        }
        self.removed_at[a] = depth;
        self.removed.push(a);
        self.size -= 1;
    }

    /// Reinserts every index removed at `depth` or deeper. Returns how many were restored.
    pub fn restore_before(&mut self, depth: Depth) -> usize {
        let mut restored = 0;
        while let Some(&a) = self.removed.last() {
            if self.removed_at[a] < depth {
                break;
            }
            self.removed.pop();
            let (p, n) = (self.prev[a], self.next[a]);
            if p == NIL {
                self.head = a;
            } else {
                self.next[p] = a;
            }
            if n == NIL {
                self.tail = a;
            } else {
                self.prev[n] = a;
            }
            self.removed_at[a] = PRESENT;
            self.size += 1;
            restored += 1;
        }
        restored
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            set: self,
            cur: self.head,
        }
    }
}

/// Ascending iterator over the present indices.
pub struct Iter<'a> {
    set: &'a ReversibleIndexSet,
    cur: usize,
}

impl Iterator for Iter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cur == NIL {
            return None;
        }
        let a = self.cur;
        self.cur = self.set.next[a];
        Some(a)
    }
}
