use crate::Depth;

/// Backtrackable sparse set over `[0, capacity)`.
///
/// `dense[..limit]` holds the present elements in no particular order and
/// `dense[limit..]` the removed ones, most recently removed first. Removal swaps the
/// element just past the present prefix. Restoration only moves `limit` back, which
/// is why one frame per depth is enough.
#[derive(Clone, Debug)]
pub struct ReversibleSparseSet {
    dense: Vec<usize>,
    sparse: Vec<usize>,
    limit: usize,
    /// `(depth, limit before the first removal at that depth)`
    frames: Vec<(Depth, usize)>,
}

impl ReversibleSparseSet {
    pub fn new(capacity: usize) -> Self {
        Self {
            dense: (0..capacity).collect(),
            sparse: (0..capacity).collect(),
            limit: capacity,
            frames: Vec::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.limit
    }

    pub fn is_empty(&self) -> bool {
        self.limit == 0
    }

    pub fn contains(&self, e: usize) -> bool {
        e < self.sparse.len() && self.sparse[e] < self.limit
    }

    /// Present elements.
    pub fn present(&self) -> &[usize] {
        &self.dense[..self.limit]
    }

    /// Removed elements.
    pub fn absent(&self) -> &[usize] {
        &self.dense[self.limit..]
    }

    pub fn remove(&mut self, e: usize, depth: Depth) {
        assert!(self.contains(e), "element {e} is not present in the set");
        match self.frames.last() {
            Some(&(d, _)) if d == depth => {}
            Some(&(d, _)) => {
                debug_assert!(d < depth, "removal at depth {depth} follows depth {d}");
                self.frames.push((depth, self.limit));
            }
            None => self.frames.push((depth, self.limit)),
        }
        let i = self.sparse[e];
        let j = self.limit - 1;
        let f = self.dense[j];
        self.dense.swap(i, j);
        self.sparse[e] = j;
        self.sparse[f] = i;
        self.limit -= 1;
    }

    /// Reinserts every element removed at `depth` or deeper.
    pub fn restore_before(&mut self, depth: Depth) {
        while let Some(&(d, limit)) = self.frames.last() {
            if d < depth {
                break;
            }
            self.limit = limit;
            self.frames.pop();
        }
    }
}
