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


//! This module provides some utilities to write unit tests, the most notable
//! of which are a tiny knapsack relaxation and scripted mocks of the
//! pluggable policies.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::*;

/// A knapsack item (maximize profit is minimize -profit). Its weight is the
/// application payload of the variable.
pub fn item(id: u64, profit: f64, weight: f64) -> Variable {
    Variable { id, tag: 0, lb: 0.0, ub: 1.0, obj: -profit, data: weight.to_le_bytes().to_vec() }
}
pub fn weight_of(v: &Variable) -> f64 {
    let mut bytes = [0_u8; 8];
    bytes.copy_from_slice(&v.data[..8]);
    f64::from_le_bytes(bytes)
}
pub fn items(spec: &[(f64, f64)]) -> Vec<Payload> {
    spec.iter().enumerate()
        .map(|(i, (p, w))| Payload::from(item(i as u64, *p, *w)))
        .collect()
}
/// Solves a 0/1 knapsack by brute force (only for tiny instances)
pub fn brute_force(spec: &[(f64, f64)], capacity: f64) -> f64 {
    let n = spec.len();
    let mut best = 0.0_f64;
    for mask in 0_usize..(1 << n) {
        let (mut p, mut w) = (0.0, 0.0);
        for (i, (pi, wi)) in spec.iter().enumerate() {
            if mask & (1 << i) != 0 {
                p += pi;
                w += wi;
            }
        }
        if w <= capacity {
            best = best.max(p);
        }
    }
    -best
}

/// The linear relaxation of a 0/1 knapsack, solved greedily (Dantzig bound).
/// The only dual value is the profit/weight ratio of the critical item.
#[derive(Debug, Clone, Copy)]
pub struct KnapsackLp {
    pub capacity: f64
}
impl LpSolver for KnapsackLp {
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
        if room < -1e-9 {
            return LpResult::infeasible(1);
        }
        let mut free = (0..bounds.len())
            .filter(|i| bounds[*i].0 < 1.0 && bounds[*i].1 >= 1.0 && lp.variables[*i].obj < 0.0)
            .collect::<Vec<_>>();
        let ratio = |i: usize| -lp.variables[i].obj / weight_of(&lp.variables[i]);
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
        LpResult::optimal(obj, x, vec![dual], 1)
    }
}

/// Prices the items of a pool: an item enters when its profit/weight ratio
/// beats the dual value of the capacity.
#[derive(Debug, Clone)]
pub struct KnapsackPricing {
    pub pool: Vec<Variable>
}
impl ColumnGenerator for KnapsackPricing {
    fn generate_columns(&self, lp: &Formulation, res: &LpResult) -> Vec<Variable> {
        let lambda = res.dual.first().copied().unwrap_or(0.0);
        self.pool.iter()
            .filter(|v| lp.position(v.id).is_none())
            .filter(|v| v.obj + lambda * weight_of(v) < -1e-9)
            .cloned()
            .collect()
    }
}

/// Branches on (at most `width`) fractional variables: x = 0 or x = 1
#[derive(Debug, Clone, Copy)]
pub struct Fractional {
    pub width: usize
}
impl BranchingRule for Fractional {
    fn select(&self, lp: &Formulation, res: &LpResult) -> Branching {
        let candidates = res.primal.iter().enumerate()
            .filter(|(_, x)| (*x - x.round()).abs() > 1e-9)
            .take(self.width)
            .map(|(i, _)| {
                let var = lp.variables[i].id;
                BranchingCandidate::new(vec![
                    vec![BoundChange { var, lb: 0.0, ub: 0.0 }],
                    vec![BoundChange { var, lb: 1.0, ub: 1.0 }],
                ])
            })
            .collect::<Vec<_>>();
        if candidates.is_empty() {
            Branching::Integral
        } else {
            Branching::Candidates(candidates)
        }
    }
}

/// As long as the solution is fractional, branches on (at most `width`) of
/// the variables which are not fixed yet, integral or not. This yields
/// several candidates, hence strong branching.
#[derive(Debug, Clone, Copy)]
pub struct Unfixed {
    pub width: usize
}
impl BranchingRule for Unfixed {
    fn select(&self, lp: &Formulation, res: &LpResult) -> Branching {
        if res.primal.iter().all(|x| (x - x.round()).abs() <= 1e-9) {
            return Branching::Integral;
        }
        let candidates = lp.effective_bounds().iter().enumerate()
            .filter(|(_, (lb, ub))| lb < ub)
            .take(self.width)
            .map(|(i, _)| {
                let var = lp.variables[i].id;
                BranchingCandidate::new(vec![
                    vec![BoundChange { var, lb: 0.0, ub: 0.0 }],
                    vec![BoundChange { var, lb: 1.0, ub: 1.0 }],
                ])
            })
            .collect();
        Branching::Candidates(candidates)
    }
}

/// A solver which replays a script of results (the last one repeats forever)
/// and remembers the formulations it was given.
#[derive(Debug, Clone, Default)]
pub struct Scripted {
    pub script: Vec<LpResult>,
    pub seen  : Arc<Mutex<Vec<Formulation>>>,
}
impl Scripted {
    pub fn new(script: Vec<LpResult>) -> Self {
        Scripted { script, seen: Arc::default() }
    }
}
impl LpSolver for Scripted {
    fn solve(&mut self, lp: &Formulation, _cutoff: f64) -> LpResult {
        let mut seen = self.seen.lock();
        let i = seen.len().min(self.script.len() - 1);
        seen.push(lp.clone());
        self.script[i].clone()
    }
}

/// A branching rule which always answers the same
#[derive(Debug, Clone)]
pub struct Always(pub Branching);
impl BranchingRule for Always {
    fn select(&self, _: &Formulation, _: &LpResult) -> Branching {
        self.0.clone()
    }
}

/// An observer which remembers every incumbent
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    pub seen: Arc<Mutex<Vec<Solution>>>
}
impl SolutionObserver for Recorder {
    fn on_incumbent(&self, solution: &Solution) {
        self.seen.lock().push(solution.clone());
    }
}
