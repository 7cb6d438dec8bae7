// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Maximum-weight matching in general graphs.
//!
//! This is Edmonds' blossom algorithm with the primal-dual bookkeeping of
//! Galil's "Efficient algorithms for finding maximum matching in graphs"
//! (ACM Computing Surveys, 1986), running in O(n³).
//!
//! ## Representation
//!
//! - Vertices are `0..n`; non-trivial blossoms reuse ids `n..2n`.
//! - Edge `k` has endpoints `2k` (its first vertex) and `2k + 1` (its second
//!   vertex); `p ^ 1` is the opposite endpoint of `p`.
//! - `mate[v]` is the remote endpoint of the matched edge at `v`.
//! - Labels: 0 = unlabeled, 1 = S (outer), 2 = T (inner), 5 = S marked during
//!   a blossom scan, -1 = released blossom.
//!
//! ## Determinism
//!
//! The algorithm never consults hash order or randomness: for identical input
//! (vertex numbering and edge order) it returns an identical matching.
//!
//! ## Integrality
//!
//! All arithmetic is on `i64`. Weights are doubled internally so every dual
//! variable and every half-slack stays integral; the returned matching is an
//! exact optimum, not an approximation.

const NONE: usize = usize::MAX;

const UNLABELED: i8 = 0;
const S_LABEL: i8 = 1;
const T_LABEL: i8 = 2;
const SCAN_MARK: i8 = 5;
const RELEASED: i8 = -1;

/// Computes a maximum-weight matching.
///
/// # Arguments
///
/// * `vertex_count` - Number of vertices; vertices are numbered `0..vertex_count`
/// * `edges` - Undirected edges `(u, v, weight)` with `u != v`
/// * `max_cardinality` - When true, only maximum-cardinality matchings are
///   considered and the heaviest of those is returned
///
/// # Returns
///
/// `mate[v]` is the vertex matched to `v`, or `None` if `v` is single.
#[must_use]
pub fn max_weight_matching(
    vertex_count: usize,
    edges: &[(usize, usize, i64)],
    max_cardinality: bool,
) -> Vec<Option<usize>> {
    if vertex_count == 0 || edges.is_empty() {
        return vec![None; vertex_count];
    }

    let doubled: Vec<(usize, usize, i64)> =
        edges.iter().map(|&(u, v, w)| (u, v, w * 2)).collect();

    let mut solver: Solver<'_> = Solver::new(vertex_count, &doubled);
    solver.solve(max_cardinality);
    solver.into_mates()
}

struct Solver<'a> {
    edges: &'a [(usize, usize, i64)],
    n: usize,
    endpoint: Vec<usize>,
    neighbend: Vec<Vec<usize>>,
    mate: Vec<usize>,
    label: Vec<i8>,
    labelend: Vec<usize>,
    inblossom: Vec<usize>,
    blossomparent: Vec<usize>,
    blossomchilds: Vec<Vec<usize>>,
    blossombase: Vec<usize>,
    blossomendps: Vec<Vec<usize>>,
    bestedge: Vec<usize>,
    blossombestedges: Vec<Option<Vec<usize>>>,
    unusedblossoms: Vec<usize>,
    dualvar: Vec<i64>,
    allowedge: Vec<bool>,
    queue: Vec<usize>,
}

impl<'a> Solver<'a> {
    fn new(n: usize, edges: &'a [(usize, usize, i64)]) -> Self {
        let maxweight: i64 = edges.iter().map(|&(_, _, w)| w).max().unwrap_or(0).max(0);

        let mut endpoint: Vec<usize> = Vec::with_capacity(2 * edges.len());
        let mut neighbend: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (k, &(i, j, _)) in edges.iter().enumerate() {
            endpoint.push(i);
            endpoint.push(j);
            neighbend[i].push(2 * k + 1);
            neighbend[j].push(2 * k);
        }

        let mut blossombase: Vec<usize> = (0..n).collect();
        blossombase.extend(std::iter::repeat_n(NONE, n));

        let mut dualvar: Vec<i64> = vec![maxweight; n];
        dualvar.extend(std::iter::repeat_n(0, n));

        Self {
            edges,
            n,
            endpoint,
            neighbend,
            mate: vec![NONE; n],
            label: vec![UNLABELED; 2 * n],
            labelend: vec![NONE; 2 * n],
            inblossom: (0..n).collect(),
            blossomparent: vec![NONE; 2 * n],
            blossomchilds: vec![Vec::new(); 2 * n],
            blossombase,
            blossomendps: vec![Vec::new(); 2 * n],
            bestedge: vec![NONE; 2 * n],
            blossombestedges: vec![None; 2 * n],
            unusedblossoms: (n..2 * n).collect(),
            dualvar,
            allowedge: vec![false; edges.len()],
            queue: Vec::new(),
        }
    }

    fn into_mates(self) -> Vec<Option<usize>> {
        self.mate
            .iter()
            .map(|&p| (p != NONE).then(|| self.endpoint[p]))
            .collect()
    }

    fn slack(&self, k: usize) -> i64 {
        let (i, j, w) = self.edges[k];
        self.dualvar[i] + self.dualvar[j] - 2 * w
    }

    fn leaves(&self, b: usize) -> Vec<usize> {
        let mut out: Vec<usize> = Vec::new();
        self.collect_leaves(b, &mut out);
        out
    }

    fn collect_leaves(&self, b: usize, out: &mut Vec<usize>) {
        if b < self.n {
            out.push(b);
            return;
        }
        for &t in &self.blossomchilds[b] {
            if t < self.n {
                out.push(t);
            } else {
                self.collect_leaves(t, out);
            }
        }
    }

    /// Index into a blossom's child list with Python-style negative wrap.
    fn child_at(&self, b: usize, index: isize) -> usize {
        let list: &[usize] = &self.blossomchilds[b];
        list[wrap(index, list.len())]
    }

    fn endp_at(&self, b: usize, index: isize) -> usize {
        let list: &[usize] = &self.blossomendps[b];
        list[wrap(index, list.len())]
    }

    fn assign_label(&mut self, w: usize, t: i8, p: usize) {
        let b: usize = self.inblossom[w];
        self.label[w] = t;
        self.label[b] = t;
        self.labelend[w] = p;
        self.labelend[b] = p;
        self.bestedge[w] = NONE;
        self.bestedge[b] = NONE;
        if t == S_LABEL {
            let leaves: Vec<usize> = self.leaves(b);
            self.queue.extend(leaves);
        } else if t == T_LABEL {
            let base: usize = self.blossombase[b];
            let mate_endpoint: usize = self.mate[base];
            self.assign_label(self.endpoint[mate_endpoint], S_LABEL, mate_endpoint ^ 1);
        }
    }

    /// Traces back from `v` and `w` to find a new blossom or an augmenting path.
    ///
    /// Returns the base of the new blossom, or `NONE` for an augmenting path.
    fn scan_blossom(&mut self, v: usize, w: usize) -> usize {
        let mut path: Vec<usize> = Vec::new();
        let mut base: usize = NONE;
        let (mut v, mut w) = (v, w);

        while v != NONE || w != NONE {
            let mut b: usize = self.inblossom[v];
            if self.label[b] == SCAN_MARK {
                base = self.blossombase[b];
                break;
            }
            path.push(b);
            self.label[b] = SCAN_MARK;
            if self.labelend[b] == NONE {
                v = NONE;
            } else {
                v = self.endpoint[self.labelend[b]];
                b = self.inblossom[v];
                v = self.endpoint[self.labelend[b]];
            }
            if w != NONE {
                std::mem::swap(&mut v, &mut w);
            }
        }

        for b in path {
            self.label[b] = S_LABEL;
        }
        base
    }

    /// Builds a new blossom with the given base, closed by edge `k`.
    fn add_blossom(&mut self, base: usize, k: usize) {
        let (v, w, _) = self.edges[k];
        let bb: usize = self.inblossom[base];
        let mut bv: usize = self.inblossom[v];
        let mut bw: usize = self.inblossom[w];

        let Some(b) = self.unusedblossoms.pop() else {
            return;
        };
        self.blossombase[b] = base;
        self.blossomparent[b] = NONE;
        self.blossomparent[bb] = b;

        let mut path: Vec<usize> = Vec::new();
        let mut endps: Vec<usize> = Vec::new();
        while bv != bb {
            self.blossomparent[bv] = b;
            path.push(bv);
            endps.push(self.labelend[bv]);
            let next: usize = self.endpoint[self.labelend[bv]];
            bv = self.inblossom[next];
        }
        path.push(bb);
        path.reverse();
        endps.reverse();
        endps.push(2 * k);
        while bw != bb {
            self.blossomparent[bw] = b;
            path.push(bw);
            endps.push(self.labelend[bw] ^ 1);
            let next: usize = self.endpoint[self.labelend[bw]];
            bw = self.inblossom[next];
        }

        self.blossomchilds[b] = path.clone();
        self.blossomendps[b] = endps;
        self.label[b] = S_LABEL;
        self.labelend[b] = self.labelend[bb];
        self.dualvar[b] = 0;

        for leaf in self.leaves(b) {
            if self.label[self.inblossom[leaf]] == T_LABEL {
                // T-vertices become S-vertices inside the new blossom.
                self.queue.push(leaf);
            }
            self.inblossom[leaf] = b;
        }

        let mut bestedgeto: Vec<usize> = vec![NONE; 2 * self.n];
        for &child in &path {
            let nblists: Vec<Vec<usize>> = match self.blossombestedges[child].take() {
                Some(list) => vec![list],
                None => self
                    .leaves(child)
                    .into_iter()
                    .map(|leaf| self.neighbend[leaf].iter().map(|&p| p / 2).collect())
                    .collect(),
            };
            for nblist in nblists {
                for edge in nblist {
                    let (i, j, _) = self.edges[edge];
                    let j: usize = if self.inblossom[j] == b { i } else { j };
                    let bj: usize = self.inblossom[j];
                    if bj != b
                        && self.label[bj] == S_LABEL
                        && (bestedgeto[bj] == NONE
                            || self.slack(edge) < self.slack(bestedgeto[bj]))
                    {
                        bestedgeto[bj] = edge;
                    }
                }
            }
            self.bestedge[child] = NONE;
        }

        let list: Vec<usize> = bestedgeto.into_iter().filter(|&e| e != NONE).collect();
        self.bestedge[b] = NONE;
        for &edge in &list {
            if self.bestedge[b] == NONE || self.slack(edge) < self.slack(self.bestedge[b]) {
                self.bestedge[b] = edge;
            }
        }
        self.blossombestedges[b] = Some(list);
    }

    /// Dissolves blossom `b`, relabeling its children where required.
    fn expand_blossom(&mut self, b: usize, endstage: bool) {
        let childs: Vec<usize> = self.blossomchilds[b].clone();
        for &s in &childs {
            self.blossomparent[s] = NONE;
            if s < self.n {
                self.inblossom[s] = s;
            } else if endstage && self.dualvar[s] == 0 {
                self.expand_blossom(s, endstage);
            } else {
                for leaf in self.leaves(s) {
                    self.inblossom[leaf] = s;
                }
            }
        }

        if !endstage && self.label[b] == T_LABEL {
            // Walk from the entry child to the base along the even-length side,
            // relabeling T/S alternately.
            let entrychild: usize = self.inblossom[self.endpoint[self.labelend[b] ^ 1]];
            let len: isize = to_isize(childs.len());
            let mut j: isize = to_isize(
                childs
                    .iter()
                    .position(|&c| c == entrychild)
                    .unwrap_or_default(),
            );
            let (jstep, endptrick): (isize, usize) = if j & 1 == 1 {
                j -= len;
                (1, 0)
            } else {
                (-1, 1)
            };
            let trick: isize = to_isize(endptrick);

            let mut p: usize = self.labelend[b];
            while j != 0 {
                self.label[self.endpoint[p ^ 1]] = UNLABELED;
                let e: usize = self.endp_at(b, j - trick);
                self.label[self.endpoint[e ^ endptrick ^ 1]] = UNLABELED;
                self.assign_label(self.endpoint[p ^ 1], T_LABEL, p);
                self.allowedge[e / 2] = true;
                j += jstep;
                p = self.endp_at(b, j - trick) ^ endptrick;
                self.allowedge[p / 2] = true;
                j += jstep;
            }

            let bv: usize = self.child_at(b, j);
            let entry: usize = self.endpoint[p ^ 1];
            self.label[entry] = T_LABEL;
            self.label[bv] = T_LABEL;
            self.labelend[entry] = p;
            self.labelend[bv] = p;
            self.bestedge[bv] = NONE;
            j += jstep;

            while self.child_at(b, j) != entrychild {
                let bv: usize = self.child_at(b, j);
                if self.label[bv] == S_LABEL {
                    j += jstep;
                    continue;
                }
                let reached: Option<usize> = self
                    .leaves(bv)
                    .into_iter()
                    .find(|&leaf| self.label[leaf] != UNLABELED);
                if let Some(leaf) = reached {
                    self.label[leaf] = UNLABELED;
                    let base_mate: usize = self.mate[self.blossombase[bv]];
                    self.label[self.endpoint[base_mate]] = UNLABELED;
                    self.assign_label(leaf, T_LABEL, self.labelend[leaf]);
                }
                j += jstep;
            }
        }

        self.label[b] = RELEASED;
        self.labelend[b] = NONE;
        self.blossomchilds[b] = Vec::new();
        self.blossomendps[b] = Vec::new();
        self.blossombase[b] = NONE;
        self.blossombestedges[b] = None;
        self.bestedge[b] = NONE;
        self.unusedblossoms.push(b);
    }

    /// Swaps matched/unmatched edges inside blossom `b` so that `v` becomes its base.
    fn augment_blossom(&mut self, b: usize, v: usize) {
        let mut t: usize = v;
        while self.blossomparent[t] != b {
            t = self.blossomparent[t];
        }
        if t >= self.n {
            self.augment_blossom(t, v);
        }

        let len: isize = to_isize(self.blossomchilds[b].len());
        let i: usize = self.blossomchilds[b]
            .iter()
            .position(|&c| c == t)
            .unwrap_or_default();
        let mut j: isize = to_isize(i);
        let (jstep, endptrick): (isize, usize) = if j & 1 == 1 {
            j -= len;
            (1, 0)
        } else {
            (-1, 1)
        };
        let trick: isize = to_isize(endptrick);

        while j != 0 {
            j += jstep;
            let first: usize = self.child_at(b, j);
            let p: usize = self.endp_at(b, j - trick) ^ endptrick;
            if first >= self.n {
                self.augment_blossom(first, self.endpoint[p]);
            }
            j += jstep;
            let second: usize = self.child_at(b, j);
            if second >= self.n {
                self.augment_blossom(second, self.endpoint[p ^ 1]);
            }
            self.mate[self.endpoint[p]] = p ^ 1;
            self.mate[self.endpoint[p ^ 1]] = p;
        }

        self.blossomchilds[b].rotate_left(i);
        self.blossomendps[b].rotate_left(i);
        self.blossombase[b] = self.blossombase[self.blossomchilds[b][0]];
    }

    /// Augments the matching along the path through edge `k`.
    fn augment_matching(&mut self, k: usize) {
        let (v, w, _) = self.edges[k];
        for (start, start_p) in [(v, 2 * k + 1), (w, 2 * k)] {
            let mut s: usize = start;
            let mut p: usize = start_p;
            loop {
                let bs: usize = self.inblossom[s];
                if bs >= self.n {
                    self.augment_blossom(bs, s);
                }
                self.mate[s] = p;
                if self.labelend[bs] == NONE {
                    // Reached a single vertex; this half of the path is done.
                    break;
                }
                let t: usize = self.endpoint[self.labelend[bs]];
                let bt: usize = self.inblossom[t];
                s = self.endpoint[self.labelend[bt]];
                let j: usize = self.endpoint[self.labelend[bt] ^ 1];
                if bt >= self.n {
                    self.augment_blossom(bt, j);
                }
                self.mate[j] = self.labelend[bt];
                p = self.labelend[bt] ^ 1;
            }
        }
    }

    fn reset_stage(&mut self) {
        self.label.fill(UNLABELED);
        self.bestedge.fill(NONE);
        for entry in &mut self.blossombestedges[self.n..] {
            *entry = None;
        }
        self.allowedge.fill(false);
        self.queue.clear();

        for v in 0..self.n {
            if self.mate[v] == NONE && self.label[self.inblossom[v]] == UNLABELED {
                self.assign_label(v, S_LABEL, NONE);
            }
        }
    }

    /// Grows alternating trees from the queue. Returns true once augmented.
    fn scan_queue(&mut self) -> bool {
        while let Some(v) = self.queue.pop() {
            let neighbours: Vec<usize> = self.neighbend[v].clone();
            for p in neighbours {
                let k: usize = p / 2;
                let w: usize = self.endpoint[p];
                if self.inblossom[v] == self.inblossom[w] {
                    continue;
                }

                let mut kslack: i64 = 0;
                if !self.allowedge[k] {
                    kslack = self.slack(k);
                    if kslack <= 0 {
                        self.allowedge[k] = true;
                    }
                }

                if self.allowedge[k] {
                    if self.label[self.inblossom[w]] == UNLABELED {
                        self.assign_label(w, T_LABEL, p ^ 1);
                    } else if self.label[self.inblossom[w]] == S_LABEL {
                        let base: usize = self.scan_blossom(v, w);
                        if base == NONE {
                            self.augment_matching(k);
                            return true;
                        }
                        self.add_blossom(base, k);
                    } else if self.label[w] == UNLABELED {
                        // w is inside a T-blossom but not yet reached from outside.
                        self.label[w] = T_LABEL;
                        self.labelend[w] = p ^ 1;
                    }
                } else if self.label[self.inblossom[w]] == S_LABEL {
                    let b: usize = self.inblossom[v];
                    if self.bestedge[b] == NONE || kslack < self.slack(self.bestedge[b]) {
                        self.bestedge[b] = k;
                    }
                } else if self.label[w] == UNLABELED
                    && (self.bestedge[w] == NONE || kslack < self.slack(self.bestedge[w]))
                {
                    self.bestedge[w] = k;
                }
            }
        }
        false
    }

    /// Performs one dual adjustment. Returns true when the stage must end.
    fn adjust_duals(&mut self, max_cardinality: bool) -> bool {
        let mut deltatype: i8 = -1;
        let mut delta: i64 = 0;
        let mut deltaedge: usize = NONE;
        let mut deltablossom: usize = NONE;

        if !max_cardinality {
            deltatype = 1;
            delta = self.dualvar[..self.n].iter().copied().min().unwrap_or(0);
        }

        for v in 0..self.n {
            if self.label[self.inblossom[v]] == UNLABELED && self.bestedge[v] != NONE {
                let d: i64 = self.slack(self.bestedge[v]);
                if deltatype == -1 || d < delta {
                    delta = d;
                    deltatype = 2;
                    deltaedge = self.bestedge[v];
                }
            }
        }

        for b in 0..2 * self.n {
            if self.blossomparent[b] == NONE
                && self.label[b] == S_LABEL
                && self.bestedge[b] != NONE
            {
                let d: i64 = self.slack(self.bestedge[b]) / 2;
                if deltatype == -1 || d < delta {
                    delta = d;
                    deltatype = 3;
                    deltaedge = self.bestedge[b];
                }
            }
        }

        for b in self.n..2 * self.n {
            if self.blossombase[b] != NONE
                && self.blossomparent[b] == NONE
                && self.label[b] == T_LABEL
                && (deltatype == -1 || self.dualvar[b] < delta)
            {
                delta = self.dualvar[b];
                deltatype = 4;
                deltablossom = b;
            }
        }

        if deltatype == -1 {
            // Maximum cardinality reached; finish with a final dual update.
            deltatype = 1;
            delta = self.dualvar[..self.n]
                .iter()
                .copied()
                .min()
                .unwrap_or(0)
                .max(0);
        }

        for v in 0..self.n {
            match self.label[self.inblossom[v]] {
                S_LABEL => self.dualvar[v] -= delta,
                T_LABEL => self.dualvar[v] += delta,
                _ => {}
            }
        }
        for b in self.n..2 * self.n {
            if self.blossombase[b] != NONE && self.blossomparent[b] == NONE {
                match self.label[b] {
                    S_LABEL => self.dualvar[b] += delta,
                    T_LABEL => self.dualvar[b] -= delta,
                    _ => {}
                }
            }
        }

        match deltatype {
            1 => return true,
            2 => {
                self.allowedge[deltaedge] = true;
                let (i, j, _) = self.edges[deltaedge];
                let s_vertex: usize = if self.label[self.inblossom[i]] == UNLABELED {
                    j
                } else {
                    i
                };
                self.queue.push(s_vertex);
            }
            3 => {
                self.allowedge[deltaedge] = true;
                let (i, _, _) = self.edges[deltaedge];
                self.queue.push(i);
            }
            _ => self.expand_blossom(deltablossom, false),
        }
        false
    }

    fn solve(&mut self, max_cardinality: bool) {
        for _ in 0..self.n {
            self.reset_stage();

            let mut augmented: bool = false;
            loop {
                if self.scan_queue() {
                    augmented = true;
                    break;
                }
                if self.adjust_duals(max_cardinality) {
                    break;
                }
            }

            if !augmented {
                break;
            }

            // Expand S-blossoms whose dual reached zero at the end of the stage.
            for b in self.n..2 * self.n {
                if self.blossomparent[b] == NONE
                    && self.blossombase[b] != NONE
                    && self.label[b] == S_LABEL
                    && self.dualvar[b] == 0
                {
                    self.expand_blossom(b, true);
                }
            }
        }
    }
}

fn wrap(index: isize, len: usize) -> usize {
    let len: isize = to_isize(len);
    usize::try_from(index.rem_euclid(len)).unwrap_or_default()
}

fn to_isize(value: usize) -> isize {
    isize::try_from(value).unwrap_or(isize::MAX)
}
