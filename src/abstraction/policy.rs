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


//! This module defines the pluggable policies of the engine: the generation
//! of columns and cuts, and the branching rule. None of them prescribes any
//! particular algorithm.

use crate::{BoundChange, Cut, Formulation, LpResult, Variable};

/// Pricing: produces the variables (columns) that should be added to the
/// relaxation given its current solution. Returning an empty vector means
/// that no column with a negative reduced cost exists.
pub trait ColumnGenerator {
    fn generate_columns(&self, lp: &Formulation, res: &LpResult) -> Vec<Variable>;
}

/// Separation: produces the cuts violated by the current solution of the
/// relaxation. Returning an empty vector means that nothing is violated.
pub trait CutGenerator {
    fn generate_cuts(&self, lp: &Formulation, res: &LpResult) -> Vec<Cut>;
}

/// A generator that never produces any column
#[derive(Debug, Default, Copy, Clone)]
pub struct NoColumns;
impl ColumnGenerator for NoColumns {
    fn generate_columns(&self, _: &Formulation, _: &LpResult) -> Vec<Variable> {
        vec![]
    }
}

/// A generator that never produces any cut
#[derive(Debug, Default, Copy, Clone)]
pub struct NoCuts;
impl CutGenerator for NoCuts {
    fn generate_cuts(&self, _: &Formulation, _: &LpResult) -> Vec<Cut> {
        vec![]
    }
}

/// One way of splitting a node: each child is described by the bound changes
/// it applies on top of its parent's formulation.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchingCandidate {
    pub children: Vec<Vec<BoundChange>>,
}
impl BranchingCandidate {
    pub fn new(children: Vec<Vec<BoundChange>>) -> Self {
        Self { children }
    }
}

/// The decision of a branching rule
#[derive(Debug, Clone, PartialEq)]
pub enum Branching {
    /// The solution of the relaxation is a feasible solution of the problem
    Integral,
    /// The node must be split. When more than one candidate is given, they
    /// are compared with strong branching.
    Candidates(Vec<BranchingCandidate>),
}

/// Decides how a node whose relaxation has been solved is to be split.
pub trait BranchingRule {
    /// Inspects the (final) relaxation of a node and decides whether it is
    /// integral or proposes branching candidates. An empty list of
    /// candidates is understood as `Integral`.
    fn select(&self, lp: &Formulation, res: &LpResult) -> Branching;
    /// Scores a candidate from the estimated bounds of its children (an
    /// infeasible child is estimated at +inf). The candidate having the
    /// highest score is selected. By default, this is the worst bound of the
    /// weakest child: the candidate that lifts every child the most wins.
    fn score(&self, child_bounds: &[f64]) -> f64 {
        child_bounds.iter().copied().fold(f64::INFINITY, f64::min)
    }
}
