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


//! The messages of the coordination protocol.
//!
//! The protocol is asynchronous. The only guarantee it relies upon is that
//! the messages sent by one process to another are received in the order
//! they were sent. The coordinator dispatches nodes (`DispatchNode`) and
//! every dispatch is answered by exactly one `NodeProcessed`, possibly
//! preceded by a `ReportIncumbent` from the same worker. While processing a
//! node, a worker may borrow helpers for strong branching: it asks the
//! coordinator (`RequestBranchingIds`), talks to the granted helpers directly
//! (`EvaluateCandidate` / `CandidateEvaluated`) and each helper gives itself
//! back to the coordinator (`ReleaseBranchingId`) once it has answered.

use serde::{Deserialize, Serialize};

use crate::*;

/// Everything a worker needs to process a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeAssignment {
    pub node : NodeId,
    pub phase: Phase,
    pub depth: usize,
    /// The bound of the node known at the time it was dispatched
    pub bound: f64,
    /// The value of the incumbent (+inf when there is none)
    pub cutoff: f64,
    /// The full formulation of the node (inherited objects and bound changes)
    pub formulation: Formulation,
}

/// One child of one branching candidate to evaluate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateChild {
    pub candidate: usize,
    pub child    : usize,
    pub changes  : Vec<BoundChange>,
}

/// A strong branching job sent to a helper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateBatch {
    pub node       : NodeId,
    pub cutoff     : f64,
    pub formulation: Formulation,
    pub tasks      : Vec<CandidateChild>,
}

/// The evaluation of one child by a helper
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidateEstimate {
    pub candidate: usize,
    pub child    : usize,
    pub objective: f64,
    pub termcode : TermCode,
}

/// Why the relaxation of a node could not be used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureReason {
    /// The solver gave up
    Abandoned,
    /// The iteration limit was hit before optimality was proved
    IterationLimit,
    /// The relaxation is unbounded
    Unbounded,
}

/// A child created by branching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildSpec {
    /// Lower bound estimate of the child
    pub bound: f64,
    pub bound_changes: Vec<BoundChange>,
}

/// The result of processing a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeOutcome {
    /// The relaxation has no feasible solution
    Infeasible,
    /// The bound of the node does not improve on the incumbent
    BoundPruned { bound: f64 },
    /// The relaxation solution is integral; it was reported as incumbent
    FeasibleIntegral { objective: f64 },
    /// The node is split into the given children
    Branched { bound: f64, children: Vec<ChildSpec> },
    /// The node needs branching but the current phase does not branch
    Deferred { bound: f64 },
    /// The relaxation could not be solved
    Failed(FailureReason),
}

/// What a worker sends back after processing a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeReport {
    pub node      : NodeId,
    pub outcome   : NodeOutcome,
    /// The variables and cuts generated while processing the node
    pub generated : Vec<Payload>,
    /// Total number of solver iterations spent on the node
    pub iterations: usize,
}

/// The messages exchanged by the processes. The index of the variant leads
/// the encoding of a message: new variants must be appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    /// Registers new worker ids with the scheduler
    AddIds(Vec<WorkerId>),
    /// Asks for (at most) that many helpers
    RequestBranchingIds(usize),
    /// The answer to `RequestBranchingIds` (possibly empty)
    BranchingIdsGranted(Vec<WorkerId>),
    ReleaseBranchingId(WorkerId),
    RequestNodeId,
    /// The answer to `RequestNodeId`
    NodeIdGranted(Option<WorkerId>),
    ReleaseNodeId(WorkerId),
    DispatchNode(NodeAssignment),
    NodeProcessed(NodeReport),
    EvaluateCandidate(CandidateBatch),
    CandidateEvaluated(Vec<CandidateEstimate>),
    ReportIncumbent(Solution),
    Terminate,
}
impl Message {
    /// A short name for the logs
    pub fn name(&self) -> &'static str {
        match self {
            Message::AddIds(_)              => "AddIds",
            Message::RequestBranchingIds(_) => "RequestBranchingIds",
            Message::BranchingIdsGranted(_) => "BranchingIdsGranted",
            Message::ReleaseBranchingId(_)  => "ReleaseBranchingId",
            Message::RequestNodeId          => "RequestNodeId",
            Message::NodeIdGranted(_)       => "NodeIdGranted",
            Message::ReleaseNodeId(_)       => "ReleaseNodeId",
            Message::DispatchNode(_)        => "DispatchNode",
            Message::NodeProcessed(_)       => "NodeProcessed",
            Message::EvaluateCandidate(_)   => "EvaluateCandidate",
            Message::CandidateEvaluated(_)  => "CandidateEvaluated",
            Message::ReportIncumbent(_)     => "ReportIncumbent",
            Message::Terminate              => "Terminate",
        }
    }
}
