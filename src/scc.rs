const UNVISITED: usize = usize::MAX;

/// Strongly connected components by Tarjan's algorithm, run with an explicit call stack.
/// The scratch buffers are kept between calls so repeated runs on graphs of the same
/// size do not allocate.
pub struct Scc {
    index: Vec<usize>,
    low: Vec<usize>,
    on_stack: Vec<bool>,
    stack: Vec<usize>,
    calls: Vec<(usize, usize)>,
    comp: Vec<usize>,
    n_comps: usize,
}

impl Scc {
    pub fn new() -> Self {
        Self {
            index: Vec::new(),
            low: Vec::new(),
            on_stack: Vec::new(),
            stack: Vec::new(),
            calls: Vec::new(),
            comp: Vec::new(),
            n_comps: 0,
        }
    }

    /// Labels every vertex of `gr` with its component; returns the number of components.
    pub fn compute(&mut self, gr: &[Vec<usize>]) -> usize {
        let n = gr.len();
        self.index.clear();
        self.index.resize(n, UNVISITED);
        self.low.clear();
        self.low.resize(n, 0);
        self.on_stack.clear();
        self.on_stack.resize(n, false);
        self.comp.clear();
        self.comp.resize(n, 0);
        self.stack.clear();
        self.calls.clear();
        self.n_comps = 0;
        let mut counter = 0;
        for root in 0..n {
            if self.index[root] != UNVISITED {
                continue;
            }
            self.visit(root, &mut counter);
            while let Some(frame) = self.calls.last_mut() {
                let v = frame.0;
                if frame.1 < gr[v].len() {
                    let u = gr[v][frame.1];
                    frame.1 += 1;
                    if self.index[u] == UNVISITED {
                        self.visit(u, &mut counter);
                    } else if self.on_stack[u] {
                        self.low[v] = self.low[v].min(self.index[u]);
                    }
                    continue;
                }
                self.calls.pop();
                if let Some(&(p, _)) = self.calls.last() {
                    self.low[p] = self.low[p].min(self.low[v]);
                }
                if self.low[v] == self.index[v] {
                    while let Some(w) = self.stack.pop() {
                        self.on_stack[w] = false;
                        self.comp[w] = self.n_comps;
                        if w == v {
                            break;
                        }
                    }
                    self.n_comps += 1;
                }
            }
        }
        self.n_comps
    }

    fn visit(&mut self, v: usize, counter: &mut usize) {
        self.index[v] = *counter;
        self.low[v] = *counter;
        *counter += 1;
        self.stack.push(v);
        self.on_stack[v] = true;
        self.calls.push((v, 0));
    }

    /// Component of `v` in the last computed graph.
    pub fn component(&self, v: usize) -> usize {
        self.comp[v]
    }

    pub fn same_component(&self, v: usize, u: usize) -> bool {
        self.comp[v] == self.comp[u]
    }
}
