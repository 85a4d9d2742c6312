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


use crate::{BoundChange, NodeId, NodeKey, NodeStatus, Payload, Phase};

/// What a node adds on top of its parent's formulation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeDelta {
    /// The variables and cuts introduced while processing this node (the
    /// initial formulation for the root)
    pub objects: Vec<Payload>,
    /// The bound changes applied by the branching that created this node
    pub bound_changes: Vec<BoundChange>,
}

/// A node of the search tree
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub id    : NodeId,
    /// The parent of this node (None for the root). This is a plain handle.
    pub parent: Option<NodeId>,
    pub depth : usize,
    /// Lower bound on the objective of any solution in this subtree
    pub bound : f64,
    pub status: NodeStatus,
    pub phase : Phase,
    pub delta : NodeDelta,
    /// How many times this node was put back in the fringe after a failure
    pub retries: usize,
    /// Creation order
    pub seq   : usize,
}
impl TreeNode {
    /// The key under which this node is ordered in the fringe
    pub fn key(&self) -> NodeKey {
        NodeKey { node: self.id, bound: self.bound, depth: self.depth, seq: self.seq }
    }
}
