//! Maximum matching between scope positions and values, kept from one call to the next.
//!
//! The matching is repaired rather than recomputed: pairs whose value left the domain
//! are dropped and only the positions left unmatched are searched for augmenting
//! paths. Filtering follows Régin's construction. In the residual graph unmatched
//! edges go from position to value, matched edges from value to position, free values
//! point to a sink that points back to every matched value. An unmatched edge belongs
//! to some maximum matching iff both ends lie in the same strongly connected component.

use crate::domain::Domain;
use crate::scc::Scc;
use rustc_hash::FxHashMap;

const NIL: usize = usize::MAX;

pub struct Matcher {
    /// Value of every value node.
    val_of: Vec<i64>,
    /// For each position, value node of each initial domain index.
    node_of: Vec<Vec<usize>>,
    var2val: Vec<usize>,
    val2var: Vec<usize>,
    pred: Vec<usize>,
    seen: Vec<u32>,
    stamp: u32,
    queue: Vec<usize>,
    gr: Vec<Vec<usize>>,
    scc: Scc,
    inconsistent: Vec<(usize, usize)>,
}

impl Matcher {
    pub fn new(doms: &[&Domain]) -> Self {
        let mut val_of: Vec<i64> = doms
            .iter()
            .flat_map(|d| d.initial_values().iter().copied())
            .collect();
        val_of.sort_unstable();
        val_of.dedup();
        let node: FxHashMap<i64, usize> = val_of.iter().enumerate().map(|(g, &v)| (v, g)).collect();
        let node_of = doms
            .iter()
            .map(|d| d.initial_values().iter().map(|v| node[v]).collect())
            .collect();
        let n = doms.len();
        let m = val_of.len();
        Self {
            val_of,
            node_of,
            var2val: vec![NIL; n],
            val2var: vec![NIL; m],
            pred: vec![NIL; m],
            seen: vec![0; m],
            stamp: 0,
            queue: Vec::with_capacity(n),
            gr: vec![Vec::new(); n + m + 1],
            scc: Scc::new(),
            inconsistent: Vec::new(),
        }
    }

    pub fn n_values(&self) -> usize {
        self.val_of.len()
    }

    pub fn value(&self, g: usize) -> i64 {
        self.val_of[g]
    }

    /// Value matched to position `x`, if any.
    pub fn matched_value(&self, x: usize) -> Option<i64> {
        let g = self.var2val[x];
        (g != NIL).then(|| self.val_of[g])
    }

    fn unmatch_removed(&mut self, doms: &[&Domain]) {
        for (x, dom) in doms.iter().enumerate() {
            let g = self.var2val[x];
            if g != NIL && !dom.contains_value(self.val_of[g]) {
                self.var2val[x] = NIL;
                self.val2var[g] = NIL;
            }
        }
    }

    /// Breadth-first search for an augmenting path from the unmatched position `root`.
    fn augment(&mut self, root: usize, doms: &[&Domain]) -> bool {
        self.stamp = self.stamp.wrapping_add(1);
        if self.stamp == 0 {
            self.seen.fill(0);
            self.stamp = 1;
        }
        self.queue.clear();
        self.queue.push(root);
        let mut head = 0;
        while head < self.queue.len() {
            let y = self.queue[head];
            head += 1;
            for a in doms[y].iter() {
                let g = self.node_of[y][a];
                if g == self.var2val[y] || self.seen[g] == self.stamp {
                    continue;
                }
                self.seen[g] = self.stamp;
                self.pred[g] = y;
                if self.val2var[g] == NIL {
                    let mut g = g;
                    while g != NIL {
                        let y = self.pred[g];
                        let prev = self.var2val[y];
                        self.var2val[y] = g;
                        self.val2var[g] = y;
                        g = prev;
                    }
                    return true;
                }
                self.queue.push(self.val2var[g]);
            }
        }
        false
    }

    /// Repairs the matching and completes it. Returns `false` when some position
    /// cannot be matched.
    pub fn find_maximum_matching(&mut self, doms: &[&Domain]) -> bool {
        self.unmatch_removed(doms);
        for x in 0..doms.len() {
            if self.var2val[x] == NIL && !self.augment(x, doms) {
                return false;
            }
        }
        true
    }

    /// `(position, domain index)` pairs that belong to no maximum matching. Must follow a
    /// successful [`Matcher::find_maximum_matching`] on the same domains.
    pub fn inconsistent_pairs(&mut self, doms: &[&Domain]) -> &[(usize, usize)] {
        let n = doms.len();
        let m = self.val_of.len();
        let sink = n + m;
        for adj in &mut self.gr {
            adj.clear();
        }
        for (x, dom) in doms.iter().enumerate() {
            for a in dom.iter() {
                let g = self.node_of[x][a];
                if g != self.var2val[x] {
                    self.gr[x].push(n + g);
                }
            }
        }
        for g in 0..m {
            match self.val2var[g] {
                NIL => self.gr[n + g].push(sink),
                x => {
                    self.gr[n + g].push(x);
                    self.gr[sink].push(n + g);
                }
            }
        }
        self.scc.compute(&self.gr);
        self.inconsistent.clear();
        for (x, dom) in doms.iter().enumerate() {
            for a in dom.iter() {
                let g = self.node_of[x][a];
                if g != self.var2val[x] && !self.scc.same_component(x, n + g) {
                    self.inconsistent.push((x, a));
                }
            }
        }
        &self.inconsistent
    }
}
