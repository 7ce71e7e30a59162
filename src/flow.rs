//! Maximum flow by Dinic's algorithm on a small residual network.
//!
//! Edges are stored in pairs: edge `e` and its reverse `e ^ 1`. Capacities may be raised
//! between calls to [`FlowNetwork::max_flow`], which then augments on top of the flow
//! already present.

pub struct FlowEdge {
    pub to: usize,
    pub flow: i32,
    pub capacity: i32,
}

impl FlowEdge {
    pub fn new(to: usize, capacity: i32) -> Self {
        Self {
            to,
            flow: 0,
            capacity,
        }
    }

    fn residual(&self) -> i32 {
        self.capacity - self.flow
    }
}

pub struct FlowNetwork {
    edges: Vec<FlowEdge>,
    graph: Vec<Vec<usize>>,
    ptr: Vec<usize>,
    level: Vec<i32>,
    q: Vec<usize>,
}

impl FlowNetwork {
    pub fn new(n_nodes: usize) -> Self {
        Self {
            edges: Vec::new(),
            graph: vec![Vec::new(); n_nodes],
            ptr: vec![0; n_nodes],
            level: vec![-1; n_nodes],
            q: Vec::with_capacity(n_nodes),
        }
    }

    /// Adds `from -> to` with the given capacity and returns its id.
    pub fn add_edge(&mut self, from: usize, to: usize, capacity: i32) -> usize {
        let e = self.edges.len();
        self.edges.push(FlowEdge::new(to, capacity));
        self.edges.push(FlowEdge::new(from, 0));
        self.graph[from].push(e);
        self.graph[to].push(e + 1);
        e
    }

    pub fn edge(&self, e: usize) -> &FlowEdge {
        &self.edges[e]
    }

    pub fn flow(&self, e: usize) -> i32 {
        self.edges[e].flow
    }

    /// Changes the capacity of edge `e`; it must stay at least its current flow.
    pub fn set_capacity(&mut self, e: usize, capacity: i32) {
        assert!(capacity >= self.edges[e].flow, "capacity below the flow on edge {e}");
        self.edges[e].capacity = capacity;
    }

    fn bfs(&mut self, s: usize, t: usize) -> bool {
        self.level.fill(-1);
        self.level[s] = 0;
        self.q.clear();
        self.q.push(s);
        let mut qh = 0;
        while qh < self.q.len() {
            let v = self.q[qh];
            qh += 1;
            for &id in &self.graph[v] {
                let u = self.edges[id].to;
                if self.edges[id].residual() == 0 || self.level[u] != -1 {
                    continue;
                }
                self.level[u] = self.level[v] + 1;
                self.q.push(u);
            }
        }
        self.level[t] != -1
    }

    fn dfs(&mut self, v: usize, t: usize, pushed: i32) -> i32 {
        if pushed == 0 {
            return 0;
        }
        if v == t {
            return pushed;
        }
        while self.ptr[v] < self.graph[v].len() {
            let id = self.graph[v][self.ptr[v]];
            let u = self.edges[id].to;
            if self.level[v] + 1 != self.level[u] || self.edges[id].residual() == 0 {
                self.ptr[v] += 1;
                continue;
            }
            let nxt = self.dfs(u, t, pushed.min(self.edges[id].residual()));
            if nxt > 0 {
                self.edges[id].flow += nxt;
                self.edges[id ^ 1].flow -= nxt;
                return nxt;
            }
            self.ptr[v] += 1;
        }
        0
    }

    /// Pushes as much additional flow from `s` to `t` as possible; returns the amount.
    pub fn max_flow(&mut self, s: usize, t: usize) -> i32 {
        let mut flow = 0;
        while self.bfs(s, t) {
            self.ptr.fill(0);
            loop {
                let pushed = self.dfs(s, t, i32::MAX);
                if pushed == 0 {
                    break;
                }
                flow += pushed;
            }
        }
        flow
    }
}
