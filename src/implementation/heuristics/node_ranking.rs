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


//! This module provides the implementation of the node rankings that are
//! used to set the ordering of the fringe. Remember that the fringe pops the
//! node which compares `Greater` first.

use std::cmp::Ordering;

use crate::{NodeKey, NodeRanking, SearchOrder};

/// The BestBound strategy always selects the node having the smallest lower
/// bound in the fringe. Ties are broken in favor of the deepest node (it is
/// closer to a feasible solution) and then of the oldest one.
///
/// # Example
/// ```
/// # use bcp::*;
/// let key = |id, bound, depth| NodeKey { node: NodeId(id), bound, depth, seq: id };
///
/// let mut fringe = SimpleFringe::new(BestBound);
/// fringe.push(key(0, 10.0, 1));
/// fringe.push(key(1,  5.0, 1));
/// fringe.push(key(2,  5.0, 3));
/// fringe.push(key(3, 20.0, 0));
///
/// assert_eq!(NodeId(2), fringe.pop().unwrap().node); // bound 5, deeper
/// assert_eq!(NodeId(1), fringe.pop().unwrap().node);
/// assert_eq!(NodeId(0), fringe.pop().unwrap().node);
/// assert_eq!(NodeId(3), fringe.pop().unwrap().node);
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct BestBound;
impl NodeRanking for BestBound {
    fn compare(&self, a: &NodeKey, b: &NodeKey) -> Ordering {
        b.bound.total_cmp(&a.bound)
            .then_with(|| a.depth.cmp(&b.depth))
            .then_with(|| b.seq.cmp(&a.seq))
    }
}

/// Explores the tree level by level. Among the nodes of a same level, the
/// oldest comes first.
#[derive(Debug, Default, Clone, Copy)]
pub struct BreadthFirst;
impl NodeRanking for BreadthFirst {
    fn compare(&self, a: &NodeKey, b: &NodeKey) -> Ordering {
        b.depth.cmp(&a.depth)
            .then_with(|| b.seq.cmp(&a.seq))
    }
}

/// Explores the deepest node first. Among the nodes of a same level, the
/// one with the best bound and then the youngest one come first.
#[derive(Debug, Default, Clone, Copy)]
pub struct DepthFirst;
impl NodeRanking for DepthFirst {
    fn compare(&self, a: &NodeKey, b: &NodeKey) -> Ordering {
        a.depth.cmp(&b.depth)
            .then_with(|| b.bound.total_cmp(&a.bound))
            .then_with(|| a.seq.cmp(&b.seq))
    }
}

impl NodeRanking for SearchOrder {
    fn compare(&self, a: &NodeKey, b: &NodeKey) -> Ordering {
        match self {
            SearchOrder::BestBound    => BestBound.compare(a, b),
            SearchOrder::BreadthFirst => BreadthFirst.compare(a, b),
            SearchOrder::DepthFirst   => DepthFirst.compare(a, b),
        }
    }
}
