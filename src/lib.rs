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


//! # BCP
//! BCP is the coordination core of a distributed branch-and-cut-and-price
//! engine. It explores a search tree of relaxation subproblems: every node is
//! solved by an external relaxation solver (see `LpSolver`), strengthened by
//! the cuts and columns your generators produce, and split by your branching
//! rule. The framework takes care of everything in between: the tree search,
//! the orchestration of a pool of worker processes and the allocation of those
//! workers between node processing and strong branching.
//!
//! ## Architecture
//! ```text
//! Coordinator (single threaded, drains its inbox one message at a time)
//!   ├── Scheduler   (free worker ids, node cap, rate based allocation)
//!   ├── NodeStore   (node arena + candidate fringe ordered by a NodeRanking)
//!   └── Channel ──────── Worker 0 .. Worker n (one LpSolver each)
//! ```
//! The workers never share memory with the coordinator: every interaction is
//! a `Message` which is encoded to bytes before it crosses a `Channel`.
//!
//! ## Quick Example
//! The following sketches the minimal pieces you need to provide. A complete
//! example (knapsack with column generation and strong branching) lives in
//! the `demos` folder of the repository.
//! ```
//! # use bcp::*;
//! # use std::sync::Arc;
//! // a relaxation "solver" for min x s.t. 0.5 <= x <= 1
//! struct Toy;
//! impl LpSolver for Toy {
//!     fn solve(&mut self, lp: &Formulation, _cutoff: f64) -> LpResult {
//!         let (lb, ub) = lp.effective_bounds()[0];
//!         let x = lb.max(0.5);
//!         if x > ub {
//!             LpResult::infeasible(1)
//!         } else {
//!             LpResult::optimal(x, vec![x], vec![], 1)
//!         }
//!     }
//! }
//! // branch on x when it is fractional
//! struct Round;
//! impl BranchingRule for Round {
//!     fn select(&self, lp: &Formulation, res: &LpResult) -> Branching {
//!         let x = res.primal[0];
//!         if x.fract() == 0.0 {
//!             Branching::Integral
//!         } else {
//!             let id = lp.variables[0].id;
//!             Branching::Candidates(vec![BranchingCandidate::new(vec![
//!                 vec![BoundChange { var: id, lb: 0.0, ub: x.floor() }],
//!                 vec![BoundChange { var: id, lb: x.ceil(), ub: 1.0 }],
//!             ])])
//!         }
//!     }
//! }
//!
//! let x = Variable { id: 0, tag: 0, lb: 0.0, ub: 1.0, obj: 1.0, data: vec![] };
//! let params = ParametersBuilder::default().nb_workers(2).build().unwrap();
//! let factory = |_w: WorkerId| Toy;
//! let mut solver = ParallelSolver::new(
//!     &factory, &NoColumns, &NoCuts, &Round,
//!     vec![Payload::Variable(Arc::new(x))], params).unwrap();
//!
//! let outcome = solver.minimize().unwrap();
//! assert!(outcome.is_exact);
//! assert_eq!(Some(1.0), outcome.best_value);
//! ```

mod common;
mod config;
mod error;
mod abstraction;
mod implementation;

pub use common::*;
pub use config::*;
pub use error::*;
pub use abstraction::*;
pub use implementation::*;

#[cfg(test)]
pub(crate) mod test_utils;
