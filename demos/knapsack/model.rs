// Copyright 2020 Xavier Gillard
//
// Permission is hereby granted, free of charge, to any person obtaining a copy of
// this software and associated documentation files (the "Software"), to deal in
// the Software without restriction, including without limitation the rights to
// use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS
// FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR
// COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER
// IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.


//! The 0/1 knapsack as a column generation model. Each item is a column
//! (variable) of the master problem whose payload is the weight of the item.
//! The relaxation is solved with the greedy algorithm of Dantzig, which is
//! exact for the linear relaxation of a single knapsack constraint.

use bcp::*;

/// The type tag of the item columns
pub const ITEM: u32 = 1;

/// An item that can be put in the knapsack
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Item {
    pub profit: f64,
    pub weight: f64,
}

/// A knapsack instance
#[derive(Debug, Clone, PartialEq)]
pub struct Knapsack {
    pub capacity: f64,
    pub items   : Vec<Item>,
}
impl Knapsack {
    /// The column representing the i-th item. Maximizing the profit means
    /// minimizing its opposite.
    pub fn column(&self, i: usize) -> Variable {
        let item = self.items[i];
        Variable { id: i as u64, tag: ITEM, lb: 0.0, ub: 1.0, obj: -item.profit, data: item.weight.to_le_bytes().to_vec() }
    }
    /// All the columns of the problem
    pub fn columns(&self) -> Vec<Variable> {
        (0..self.items.len()).map(|i| self.column(i)).collect()
    }
    /// The total profit of the items selected by the given solution
    pub fn profit(&self, solution: &Solution) -> f64 {
        self.items.iter().enumerate()
            .map(|(i, it)| it.profit * solution.value_of(i as u64))
            .sum()
    }
    /// The total weight of the items selected by the given solution
    pub fn weight(&self, solution: &Solution) -> f64 {
        self.items.iter().enumerate()
            .map(|(i, it)| it.weight * solution.value_of(i as u64))
            .sum()
    }
    /// The optimal profit computed with the classic dynamic program (this
    /// requires integer weights and capacity)
    pub fn optimum(&self) -> f64 {
        let capacity = self.capacity as usize;
        let mut best = vec![0.0_f64; capacity + 1];
        for item in self.items.iter() {
            let w = item.weight as usize;
            for c in (w..=capacity).rev() {
                best[c] = best[c].max(best[c - w] + item.profit);
            }
        }
        best[capacity]
    }
}

/// Decodes the weight of an item column
pub fn weight_of(v: &Variable) -> f64 {
    let mut bytes = [0_u8; 8];
    if v.tag == ITEM && v.data.len() == 8 {
        bytes.copy_from_slice(&v.data);
    }
    f64::from_le_bytes(bytes)
}

/// The linear relaxation of the knapsack restricted to the columns present in
/// the formulation. The only dual value is the one of the capacity constraint.
/// The cutoff is ignored: the objective of a restricted formulation is not a
/// valid bound until pricing has converged.
#[derive(Debug, Clone, Copy)]
pub struct DantzigLp {
    pub capacity: f64,
}
impl LpSolver for DantzigLp {
    fn solve(&mut self, lp: &Formulation, _cutoff: f64) -> LpResult {
        let bounds = lp.effective_bounds();
        let mut x    = vec![0.0; bounds.len()];
        let mut room = self.capacity;
        let mut obj  = 0.0;
        for (i, (lb, ub)) in bounds.iter().enumerate() {
            if lb > ub {
                return LpResult::infeasible(1);
            }
            if *lb >= 1.0 {
                x[i]  = 1.0;
                room -= weight_of(&lp.variables[i]);
                obj  += lp.variables[i].obj;
            }
        }
        if room < 0.0 {
            return LpResult::infeasible(1);
        }

        let ratio = |i: usize| -lp.variables[i].obj / weight_of(&lp.variables[i]).max(f64::EPSILON);
        let mut free = (0..bounds.len())
            .filter(|i| bounds[*i].0 < 1.0 && bounds[*i].1 >= 1.0 && lp.variables[*i].obj < 0.0)
            .collect::<Vec<_>>();
        free.sort_by(|a, b| ratio(*b).total_cmp(&ratio(*a)));

        let mut dual = 0.0;
        for i in free {
            let w = weight_of(&lp.variables[i]);
            if w <= room {
                x[i]  = 1.0;
                room -= w;
                obj  += lp.variables[i].obj;
            } else {
                let f = room / w;
                x[i]  = f;
                obj  += lp.variables[i].obj * f;
                dual  = ratio(i);
                break;
            }
        }
        let iterations = x.len().max(1);
        LpResult::optimal(obj, x, vec![dual], iterations)
    }
}

/// Prices the items which are not in the formulation yet: an item enters the
/// formulation when its reduced cost is negative. At most `batch` items enter
/// per round (the most negative first).
#[derive(Debug, Clone)]
pub struct ItemPricing {
    pub pool : Vec<Variable>,
    pub batch: usize,
}
impl ColumnGenerator for ItemPricing {
    fn generate_columns(&self, lp: &Formulation, res: &LpResult) -> Vec<Variable> {
        let lambda = res.dual.first().copied().unwrap_or(0.0);
        let reduced = |v: &Variable| v.obj + lambda * weight_of(v);
        let mut entering = self.pool.iter()
            .filter(|v| lp.position(v.id).is_none())
            .filter(|v| reduced(v) < -1e-9)
            .collect::<Vec<_>>();
        entering.sort_by(|a, b| reduced(a).total_cmp(&reduced(b)));
        entering.into_iter().take(self.batch.max(1)).cloned().collect()
    }
}

/// Branches on the fractional item, or on up to `width` free items (the
/// fractional one first, then by decreasing profit/weight ratio) so that
/// strong branching has something to choose from.
#[derive(Debug, Clone, Copy)]
pub struct ItemBranching {
    pub width: usize,
}
impl ItemBranching {
    fn on(var: u64) -> BranchingCandidate {
        BranchingCandidate::new(vec![
            vec![BoundChange { var, lb: 0.0, ub: 0.0 }],
            vec![BoundChange { var, lb: 1.0, ub: 1.0 }],
        ])
    }
}
impl BranchingRule for ItemBranching {
    fn select(&self, lp: &Formulation, res: &LpResult) -> Branching {
        let fractional = res.primal.iter()
            .position(|x| (x - x.round()).abs() > 1e-9);
        let fractional = match fractional {
            Some(i) => i,
            None => return Branching::Integral,
        };

        let bounds = lp.effective_bounds();
        let mut others = (0..bounds.len())
            .filter(|i| *i != fractional && bounds[*i].0 < bounds[*i].1)
            .collect::<Vec<_>>();
        let ratio = |i: usize| -lp.variables[i].obj / weight_of(&lp.variables[i]).max(f64::EPSILON);
        others.sort_by(|a, b| ratio(*b).total_cmp(&ratio(*a)));

        let candidates = std::iter::once(fractional)
            .chain(others)
            .take(self.width.max(1))
            .map(|i| Self::on(lp.variables[i].id))
            .collect();
        Branching::Candidates(candidates)
    }
}
