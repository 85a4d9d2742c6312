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


//! This module provides the node store: the arena holding every node of the
//! search tree along with the fringe of the candidates.

use crate::*;

/// Counters describing the search tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TreeStats {
    /// Nodes created (root included)
    pub created   : usize,
    /// Nodes whose processing completed (whatever the outcome)
    pub processed : usize,
    pub pruned    : usize,
    pub branched  : usize,
    pub integral  : usize,
    pub deferred  : usize,
    pub failed    : usize,
    /// Number of times a failed node was put back in the fringe
    pub retried   : usize,
}

/// The arena of the search tree nodes plus the fringe of the candidates.
/// Nodes are never removed from the arena: terminal nodes stay around because
/// their descendants still need their delta to rebuild a formulation.
pub struct NodeStore<O: NodeRanking> {
    arena   : Vec<TreeNode>,
    fringe  : SimpleFringe<O>,
    deferred: Vec<NodeId>,
    stats   : TreeStats,
}

impl <O: NodeRanking> NodeStore<O> {
    /// Creates an empty store whose candidates are ordered by `ranking`
    pub fn new(ranking: O) -> Self {
        NodeStore {
            arena   : vec![],
            fringe  : SimpleFringe::new(ranking),
            deferred: vec![],
            stats   : TreeStats::default(),
        }
    }

    /// Creates the root node with the initial formulation. The root is a
    /// candidate right away.
    pub fn create_root(&mut self, objects: Vec<Payload>, phase: Phase) -> NodeId {
        let id = self.alloc(None, 0, f64::NEG_INFINITY, phase, NodeDelta { objects, bound_changes: vec![] });
        let key = self.arena[id.id()].key();
        self.fringe.push(key);
        id
    }

    /// Creates a child of `parent`. The child is *not* put in the fringe:
    /// the caller either dives into it or `enqueue`s it.
    pub fn create_child(&mut self, parent: NodeId, bound: f64, bound_changes: Vec<BoundChange>) -> BcpResult<NodeId> {
        let p = self.node(parent)?;
        let (depth, phase) = (p.depth + 1, p.phase);
        let bound = bound.max(p.bound);
        Ok(self.alloc(Some(parent), depth, bound, phase, NodeDelta { objects: vec![], bound_changes }))
    }

    /// Puts the node in the fringe
    pub fn enqueue(&mut self, id: NodeId) -> BcpResult<()> {
        let node = self.node_mut(id)?;
        node.status = NodeStatus::Candidate;
        let key = node.key();
        self.fringe.push(key);
        Ok(())
    }

    /// Puts a failed node back in the fringe (for another attempt)
    pub fn retry(&mut self, id: NodeId) -> BcpResult<()> {
        self.node_mut(id)?.retries += 1;
        self.stats.retried += 1;
        self.stats.processed += 1;
        self.enqueue(id)
    }

    /// Pops the most promising candidate
    pub fn pop_candidate(&mut self) -> Option<NodeId> {
        self.fringe.pop().map(|k| k.node)
    }

    pub fn node(&self, id: NodeId) -> BcpResult<&TreeNode> {
        self.arena.get(id.id()).ok_or(BcpError::UnknownNode(id))
    }
    pub fn node_mut(&mut self, id: NodeId) -> BcpResult<&mut TreeNode> {
        self.arena.get_mut(id.id()).ok_or(BcpError::UnknownNode(id))
    }

    /// Changes the status of a node and keeps the counters up to date
    pub fn set_status(&mut self, id: NodeId, status: NodeStatus) -> BcpResult<()> {
        let node = self.node_mut(id)?;
        let was  = node.status;
        node.status = status;

        if was == NodeStatus::Processing && status != NodeStatus::Processing {
            self.stats.processed += 1;
        }
        match status {
            NodeStatus::Pruned           => self.stats.pruned   += 1,
            NodeStatus::Branched         => self.stats.branched += 1,
            NodeStatus::FeasibleIntegral => self.stats.integral += 1,
            NodeStatus::Failed           => self.stats.failed   += 1,
            NodeStatus::Deferred         => self.stats.deferred += 1,
            NodeStatus::Candidate | NodeStatus::Processing => {},
        }
        Ok(())
    }

    /// Attaches the objects generated while processing the node to it: they
    /// are inherited by all of its descendants.
    pub fn record_generated(&mut self, id: NodeId, objects: Vec<Payload>) -> BcpResult<()> {
        let node = self.node_mut(id)?;
        for o in objects {
            let known = node.delta.objects.iter()
                .any(|x| x.id() == o.id() && x.is_variable() == o.is_variable());
            if !known {
                node.delta.objects.push(o);
            }
        }
        Ok(())
    }

    /// Saves the node for the next phase of the search
    pub fn defer(&mut self, id: NodeId, bound: f64) -> BcpResult<()> {
        let node = self.node_mut(id)?;
        node.bound = node.bound.max(bound);
        self.set_status(id, NodeStatus::Deferred)?;
        self.deferred.push(id);
        Ok(())
    }

    /// Hands over the nodes saved for the next phase
    pub fn take_deferred(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.deferred)
    }

    /// Prunes every candidate whose bound is not below `threshold`. Returns
    /// the number of pruned candidates.
    pub fn prune_all(&mut self, threshold: f64) -> usize {
        let mut keep   = vec![];
        let mut pruned = 0;
        while let Some(key) = self.fringe.pop() {
            if key.bound >= threshold {
                if let Some(node) = self.arena.get_mut(key.node.id()) {
                    node.status = NodeStatus::Pruned;
                }
                pruned += 1;
            } else {
                keep.push(key);
            }
        }
        for key in keep {
            self.fringe.push(key);
        }
        self.stats.pruned += pruned;
        pruned
    }

    /// Assembles the full formulation of a node by walking the parent chain:
    /// the objects and bound changes appear in root to node order.
    pub fn formulation_of(&self, id: NodeId) -> BcpResult<Formulation> {
        let mut path = vec![];
        let mut cur  = Some(id);
        while let Some(n) = cur {
            let node = self.node(n)?;
            path.push(node);
            cur = node.parent;
        }

        let mut lp = Formulation::default();
        for node in path.iter().rev() {
            for o in node.delta.objects.iter() {
                lp.push(o.clone());
            }
            lp.bound_changes.extend_from_slice(&node.delta.bound_changes);
        }
        Ok(lp)
    }

    /// The smallest bound among the candidates (None when there is none)
    pub fn best_candidate_bound(&self) -> Option<f64> {
        if self.fringe.is_empty() {
            None
        } else {
            Some(self.fringe.best_bound())
        }
    }
    /// The number of candidates in the fringe
    pub fn nb_candidates(&self) -> usize {
        self.fringe.len()
    }
    /// The smallest bound among the nodes saved for the next phase
    pub fn deferred_bound(&self) -> Option<f64> {
        self.deferred.iter()
            .filter_map(|id| self.arena.get(id.id()))
            .map(|n| n.bound)
            .reduce(f64::min)
    }
    /// The number of nodes saved for the next phase
    pub fn nb_deferred(&self) -> usize {
        self.deferred.len()
    }
    /// The number of nodes ever created
    pub fn len(&self) -> usize {
        self.arena.len()
    }
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }
    pub fn stats(&self) -> TreeStats {
        self.stats
    }

    fn alloc(&mut self, parent: Option<NodeId>, depth: usize, bound: f64, phase: Phase, delta: NodeDelta) -> NodeId {
        let id = NodeId(self.arena.len());
        self.arena.push(TreeNode {
            id,
            parent,
            depth,
            bound,
            status: NodeStatus::Candidate,
            phase,
            delta,
            retries: 0,
            seq: id.id(),
        });
        self.stats.created += 1;
        id
    }
}
