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


//! This module defines the `Solver` trait.

use crate::{BcpResult, Completion, Solution};

/// This is the solver abstraction. It is implemented by a structure that
/// runs the branch-and-cut-and-price search to find the best possible
/// solution to a given problem.
pub trait Solver {
    /// This method orders the solver to search for the optimal solution.
    /// It returns a structure standing for the outcome of the attempted
    /// minimization. Such a `Completion` may either be marked **exact** if
    /// the minimization has been carried out until optimality was proved. Or
    /// it can be inexact, in which case it means that the process was
    /// stopped because of some cutoff criterion or because nodes had to be
    /// dropped.
    ///
    /// Four cases are to be distinguished:
    ///
    /// * `is_exact` and `best_value` present: `best_value` is the minimum.
    /// * `!is_exact` and `best_value` present: the best value known at the
    ///   time the search stopped.
    /// * `is_exact` and no `best_value`: the problem is infeasible.
    /// * `!is_exact` and no `best_value`: no feasible solution was found
    ///   before the search stopped.
    ///
    /// Errors are reserved to fatal conditions (malformed messages, lost
    /// workers, a node failure under the escalate policy).
    fn minimize(&mut self) -> BcpResult<Completion>;
    /// The value of the best solution that has been found
    fn best_value(&self) -> Option<f64>;
    /// The best solution that has been found
    fn best_solution(&self) -> Option<Solution>;
    /// The tightest lower bound that can be guaranteed so far (-inf when
    /// nothing is known; the best value when optimality is proved)
    fn best_bound(&self) -> f64;
    /// Sets a known feasible solution. It is only kept when it improves the
    /// current incumbent.
    fn set_incumbent(&mut self, solution: Solution);
    /// The number of nodes whose relaxation has been solved
    fn explored(&self) -> usize;

    /// Computes the optimality gap
    fn gap(&self) -> f64 {
        let ub = self.best_value().unwrap_or(f64::INFINITY);
        let lb = self.best_bound();
        if !ub.is_finite() || !lb.is_finite() {
            1.0
        } else {
            let aub = ub.abs();
            let alb = lb.abs();
            let u = aub.max(alb);
            let l = aub.min(alb);
            if u == 0.0 {
                0.0
            } else {
                (u - l) / u
            }
        }
    }
}
