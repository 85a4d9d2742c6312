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


//! This module defines the interface to the external relaxation solver: the
//! `Formulation` it is handed, the `LpResult` it returns and the `TermCode`
//! flags which summarize how the solve terminated.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{BoundChange, Cut, Payload, Variable, WorkerId};

/// This structure stores a compact set of flags telling how a relaxation
/// solve terminated. Several flags may be on at the same time (for instance
/// an iteration limit may be reached after optimality was proved).
///
/// # Example
/// ```
/// # use bcp::TermCode;
/// let code = TermCode::empty()
///     .with(TermCode::PROVEN_OPTIMAL)
///     .with(TermCode::DUAL_OBJ_LIMIT_REACHED);
/// assert!(code.is_optimal());
/// assert!(code.is_obj_limit_reached());
/// assert!(!code.is_abandoned());
/// ```
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default, Serialize, Deserialize)]
pub struct TermCode(u8);
impl TermCode {
    /// The solver gave up (numerical trouble, internal error, ...)
    pub const ABANDONED: u8 = 1;
    pub const PROVEN_OPTIMAL: u8 = 2;
    pub const PROVEN_PRIMAL_INFEASIBLE: u8 = 4;
    /// The relaxation is unbounded
    pub const PROVEN_DUAL_INFEASIBLE: u8 = 8;
    pub const PRIMAL_OBJ_LIMIT_REACHED: u8 = 16;
    pub const DUAL_OBJ_LIMIT_REACHED: u8 = 32;
    pub const ITERATION_LIMIT_REACHED: u8 = 64;

    /// A set of flags where none is turned on
    #[inline]
    pub fn empty() -> Self {
        TermCode(0)
    }
    /// Rebuilds the flags from their raw representation
    #[inline]
    pub fn from_bits(bits: u8) -> Self {
        TermCode(bits)
    }
    /// The raw representation of the flags
    #[inline]
    pub fn bits(self) -> u8 {
        self.0
    }
    /// Returns a copy of self having the given flag turned on
    #[inline]
    pub fn with(self, flag: u8) -> Self {
        TermCode(self.0 | flag)
    }
    /// Checks whether the given flag is on
    #[inline]
    pub fn test(self, flag: u8) -> bool {
        self.0 & flag == flag
    }
    #[inline]
    pub fn is_abandoned(self) -> bool {
        self.test(TermCode::ABANDONED)
    }
    #[inline]
    pub fn is_optimal(self) -> bool {
        self.test(TermCode::PROVEN_OPTIMAL)
    }
    #[inline]
    pub fn is_primal_infeasible(self) -> bool {
        self.test(TermCode::PROVEN_PRIMAL_INFEASIBLE)
    }
    #[inline]
    pub fn is_dual_infeasible(self) -> bool {
        self.test(TermCode::PROVEN_DUAL_INFEASIBLE)
    }
    /// Returns true iff either the primal or the dual objective limit was hit
    #[inline]
    pub fn is_obj_limit_reached(self) -> bool {
        self.test(TermCode::PRIMAL_OBJ_LIMIT_REACHED) || self.test(TermCode::DUAL_OBJ_LIMIT_REACHED)
    }
    #[inline]
    pub fn is_iteration_limit_reached(self) -> bool {
        self.test(TermCode::ITERATION_LIMIT_REACHED)
    }
}

/// The outcome of one relaxation solve
#[derive(Debug, Clone, PartialEq)]
pub struct LpResult {
    pub termcode  : TermCode,
    pub iterations: usize,
    /// Objective value of the relaxation (meaningless unless optimal or an
    /// objective limit was reached)
    pub objective : f64,
    /// Primal values, one per variable of the formulation (in order)
    pub primal    : Vec<f64>,
    /// Dual values, one per cut of the formulation (in order)
    pub dual      : Vec<f64>,
}
impl LpResult {
    /// The solver gave up; no solution is available
    pub fn abandoned(iterations: usize) -> Self {
        LpResult { termcode: TermCode::from_bits(TermCode::ABANDONED), iterations,
            objective: f64::NAN, primal: vec![], dual: vec![] }
    }
    /// The relaxation was solved to optimality
    pub fn optimal(objective: f64, primal: Vec<f64>, dual: Vec<f64>, iterations: usize) -> Self {
        LpResult { termcode: TermCode::from_bits(TermCode::PROVEN_OPTIMAL), iterations,
            objective, primal, dual }
    }
    /// The relaxation admits no feasible solution
    pub fn infeasible(iterations: usize) -> Self {
        LpResult { termcode: TermCode::from_bits(TermCode::PROVEN_PRIMAL_INFEASIBLE), iterations,
            objective: f64::INFINITY, primal: vec![], dual: vec![] }
    }
}

/// The complete relaxation of one search tree node: every variable and cut
/// introduced on the path from the root, plus the bound changes decided by
/// the branchings along that path.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Formulation {
    pub variables    : Vec<Arc<Variable>>,
    pub cuts         : Vec<Arc<Cut>>,
    pub bound_changes: Vec<BoundChange>,
}
impl Formulation {
    /// Adds an object to the formulation
    pub fn push(&mut self, object: Payload) {
        match object {
            Payload::Variable(v) => self.variables.push(v),
            Payload::Cut(c)      => self.cuts.push(c),
        }
    }
    /// Returns the position of the variable with the given id (if any)
    pub fn position(&self, var: u64) -> Option<usize> {
        self.variables.iter().position(|v| v.id == var)
    }
    /// Returns true iff an object with that id is already part of the
    /// formulation
    pub fn contains(&self, object: &Payload) -> bool {
        match object {
            Payload::Variable(v) => self.variables.iter().any(|x| x.id == v.id),
            Payload::Cut(c)      => self.cuts.iter().any(|x| x.id == c.id),
        }
    }
    /// The bounds of each variable (in order) once all the bound changes
    /// have been applied. Successive changes on the same variable intersect.
    pub fn effective_bounds(&self) -> Vec<(f64, f64)> {
        let mut bounds = self.variables.iter().map(|v| (v.lb, v.ub)).collect::<Vec<_>>();
        for change in self.bound_changes.iter() {
            if let Some(pos) = self.position(change.var) {
                let (lb, ub) = bounds[pos];
                bounds[pos] = (lb.max(change.lb), ub.min(change.ub));
            }
        }
        bounds
    }
}

/// This is the interface of the relaxation solver. Each worker owns its own
/// instance: the solver is never shared between workers.
pub trait LpSolver {
    /// Solves the relaxation. `cutoff` is the objective value above which the
    /// solver may stop early and flag an objective limit.
    fn solve(&mut self, lp: &Formulation, cutoff: f64) -> LpResult;
}

/// Creates one relaxation solver per worker
pub trait SolverFactory: Sync {
    type Solver: LpSolver;

    fn create(&self, worker: WorkerId) -> Self::Solver;
}
impl <S: LpSolver, F: Fn(WorkerId) -> S + Sync> SolverFactory for F {
    type Solver = S;

    fn create(&self, worker: WorkerId) -> S {
        self(worker)
    }
}

#[cfg(test)]
mod test_lp {
    use std::sync::Arc;

    use crate::*;

    fn var(id: u64, lb: f64, ub: f64) -> Arc<Variable> {
        Arc::new(Variable { id, tag: 0, lb, ub, obj: 1.0, data: vec![] })
    }

    #[test]
    fn empty_termcode_has_no_flag() {
        let code = TermCode::empty();
        assert!(!code.is_abandoned());
        assert!(!code.is_optimal());
        assert!(!code.is_primal_infeasible());
        assert!(!code.is_dual_infeasible());
        assert!(!code.is_obj_limit_reached());
        assert!(!code.is_iteration_limit_reached());
    }
    #[test]
    fn termcode_flags_accumulate() {
        let code = TermCode::empty()
            .with(TermCode::ITERATION_LIMIT_REACHED)
            .with(TermCode::PRIMAL_OBJ_LIMIT_REACHED);
        assert!(code.is_iteration_limit_reached());
        assert!(code.is_obj_limit_reached());
        assert!(!code.is_optimal());
        assert_eq!(80, code.bits());
        assert_eq!(code, TermCode::from_bits(80));
    }
    #[test]
    fn constructors_set_the_expected_flags() {
        assert!(LpResult::abandoned(3).termcode.is_abandoned());
        assert!(LpResult::infeasible(3).termcode.is_primal_infeasible());
        let opt = LpResult::optimal(1.0, vec![1.0], vec![], 3);
        assert!(opt.termcode.is_optimal());
        assert_eq!(3, opt.iterations);
    }
    #[test]
    fn effective_bounds_intersect_all_changes() {
        let lp = Formulation {
            variables: vec![var(1, 0.0, 10.0), var(2, 0.0, 1.0)],
            cuts: vec![],
            bound_changes: vec![
                BoundChange { var: 1, lb: 2.0, ub: 10.0 },
                BoundChange { var: 1, lb: 0.0, ub: 5.0 },
                BoundChange { var: 9, lb: 1.0, ub: 1.0 }, // unknown var is ignored
            ],
        };
        assert_eq!(vec![(2.0, 5.0), (0.0, 1.0)], lp.effective_bounds());
    }
    #[test]
    fn push_dispatches_on_the_payload_kind() {
        let mut lp = Formulation::default();
        lp.push(Payload::Variable(var(1, 0.0, 1.0)));
        lp.push(Cut { id: 7, tag: 0, lb: 0.0, ub: 1.0, data: vec![] }.into());
        assert_eq!(1, lp.variables.len());
        assert_eq!(1, lp.cuts.len());
        assert_eq!(Some(0), lp.position(1));
        assert_eq!(None, lp.position(7));
        assert!(lp.contains(&Payload::Variable(var(1, 0.0, 1.0))));
    }
    #[test]
    fn closures_are_solver_factories() {
        struct Dummy(usize);
        impl LpSolver for Dummy {
            fn solve(&mut self, _: &Formulation, _: f64) -> LpResult {
                LpResult::abandoned(self.0)
            }
        }
        let factory = |w: WorkerId| Dummy(w.id());
        let mut solver = factory.create(WorkerId(4));
        assert_eq!(4, solver.solve(&Formulation::default(), 0.0).iterations);
    }
}
