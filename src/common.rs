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


//! This module defines the most basic data types that are used throughout all
//! the code of our library (both at the abstraction and implementation levels).
//! These are also the types your client library is likely to work with.

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

/// This type denotes a worker process (a 'slot' of parallel capacity). The
/// universe of worker ids is known in advance: ids are registered in batches
/// with the scheduler and are never removed afterwards.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct WorkerId(pub usize);
impl WorkerId {
    #[inline]
    /// This function returns the id (numeric value) of the worker.
    ///
    /// # Examples:
    /// ```
    /// # use bcp::WorkerId;
    /// assert_eq!(0, WorkerId(0).id());
    /// assert_eq!(7, WorkerId(7).id());
    /// ```
    pub fn id(self) -> usize {
        self.0
    }
}
impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}", self.0)
    }
}

/// The address of a channel endpoint.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ProcessId {
    /// The tree manager. There is exactly one of these.
    Coordinator,
    /// One of the worker processes
    Worker(WorkerId),
}
impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessId::Coordinator => write!(f, "coordinator"),
            ProcessId::Worker(w)   => write!(f, "{w}"),
        }
    }
}

/// A handle to a search tree node. It is a plain index in the arena of the
/// node store, it never owns anything.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct NodeId(pub usize);
impl NodeId {
    #[inline]
    /// This function returns the index of the node in the arena
    pub fn id(self) -> usize {
        self.0
    }
}
impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// The two kinds of work a worker id can be borrowed for.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum SlotKind {
    /// Transient evaluation of branching candidates on behalf of a node
    StrongBranching,
    /// Long lived processing of one search tree node
    NodeProcessing,
}

/// The lifecycle status of a search tree node.
///
/// `Candidate → Processing → {Pruned | FeasibleIntegral | Branched | Deferred | Failed}`
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum NodeStatus {
    /// Waiting in the fringe to be dispatched
    Candidate,
    /// Currently being processed by some worker
    Processing,
    /// Processed and split into children
    Branched,
    /// Saved for the next phase of the search
    Deferred,
    /// Proven not to contain any improving solution
    Pruned,
    /// The relaxation of the node had an integral optimal solution
    FeasibleIntegral,
    /// The relaxation solver gave up on this node
    Failed,
}
impl NodeStatus {
    /// Returns true iff the node will never be processed again.
    pub fn is_terminal(self) -> bool {
        matches!(self, NodeStatus::Branched | NodeStatus::Pruned | NodeStatus::FeasibleIntegral | NodeStatus::Failed)
    }
}

/// The phases of the search. In the `Pricing` phase, nodes are solved with
/// column generation only; in the `BranchAndCut` phase cuts are separated too
/// and the tree is branched on.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Phase {
    Pricing,
    BranchAndCut,
}
impl Phase {
    /// The phase that follows this one (if any)
    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::Pricing      => Some(Phase::BranchAndCut),
            Phase::BranchAndCut => None,
        }
    }
    /// Returns true iff cut separation is performed during this phase
    pub fn separates_cuts(self) -> bool {
        self == Phase::BranchAndCut
    }
}

/// A variable of the relaxation. The core never looks into `data`: it is the
/// application specific encoding of the variable, and `tag` tells the
/// application which decoder to use. Once created, a variable is immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    /// Application type tag. It leads the encoding of the variable.
    pub tag: u32,
    /// Stable identity of the variable
    pub id: u64,
    pub lb: f64,
    pub ub: f64,
    /// Objective coefficient
    pub obj: f64,
    /// Opaque application payload
    pub data: Vec<u8>,
}

/// A cut (row) of the relaxation: `lb <= row(x) <= ub` where the row itself is
/// encoded by the application in `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cut {
    /// Application type tag
    pub tag: u32,
    /// Stable identity of the cut
    pub id: u64,
    pub lb: f64,
    pub ub: f64,
    /// Opaque application payload
    pub data: Vec<u8>,
}

/// The closed set of objects a node can introduce in the formulation. They are
/// reference counted because a node shares them (read only) with all of its
/// descendants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Payload {
    Variable(Arc<Variable>),
    Cut(Arc<Cut>),
}
impl Payload {
    /// The stable identity of the wrapped object
    pub fn id(&self) -> u64 {
        match self {
            Payload::Variable(v) => v.id,
            Payload::Cut(c)      => c.id,
        }
    }
    /// The application type tag of the wrapped object
    pub fn tag(&self) -> u32 {
        match self {
            Payload::Variable(v) => v.tag,
            Payload::Cut(c)      => c.tag,
        }
    }
    pub fn is_variable(&self) -> bool {
        matches!(self, Payload::Variable(_))
    }
}
impl From<Variable> for Payload {
    fn from(v: Variable) -> Self {
        Payload::Variable(Arc::new(v))
    }
}
impl From<Cut> for Payload {
    fn from(c: Cut) -> Self {
        Payload::Cut(Arc::new(c))
    }
}

/// A branching decision tightening the bounds of variable `var` to `[lb, ub]`
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundChange {
    pub var: u64,
    pub lb : f64,
    pub ub : f64,
}

/// The value assigned to one variable in a solution
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarValue {
    pub var  : u64,
    pub value: f64,
}

/// A feasible (integral) solution of the problem. Only the variables having
/// a non zero value are listed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Solution {
    pub objective: f64,
    pub values   : Vec<VarValue>,
}
impl Solution {
    /// Returns the value of the given variable in this solution
    pub fn value_of(&self, var: u64) -> f64 {
        self.values.iter()
            .find(|v| v.var == var)
            .map(|v| v.value)
            .unwrap_or(0.0)
    }
}

/// The key under which a candidate node is ordered in the fringe
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NodeKey {
    pub node : NodeId,
    /// Lower bound of the node
    pub bound: f64,
    pub depth: usize,
    /// Creation order of the node
    pub seq  : usize,
}

/// A reason explaining why the search stopped before it could prove optimality
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Reason {
    /// It stopped because the configured cutoff criterion was met
    CutoffOccurred,
    /// It was asked to terminate
    Terminated,
    /// Some nodes were dropped after their relaxation failed
    NodesDropped,
}

/// The outcome of a search
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// is the given solution exact (proved optimal) or is it an approximation ?
    pub is_exact: bool,
    /// if present the value of the best solution that was found
    pub best_value: Option<f64>,
}
