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


//! This module defines the traits used to encapsulate the heuristics of the
//! search: the order of the candidate nodes, the stopping criterion, the
//! source of time and the reaction to new incumbents.

use std::{cmp::Ordering, time::Instant};

use crate::{NodeKey, Solution};

/// A node ranking orders the candidate nodes of the fringe. The node which
/// compares `Greater` is the one that gets selected first.
pub trait NodeRanking {
    fn compare(&self, a: &NodeKey, b: &NodeKey) -> Ordering;
}

/// This trait encapsulates a criterion (external to the search) which
/// imposes to stop searching for a better solution. Typically, this is done
/// to grant a given time budget to the search.
pub trait Cutoff {
    /// Returns true iff the criterion is met and the search must stop.
    fn must_stop(&self) -> bool;
}

/// The source of time used by the scheduler. It is abstracted away so that
/// the rate window and the idle time accounting can be tested deterministically.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// A hook called every time the incumbent improves.
pub trait SolutionObserver {
    fn on_incumbent(&self, solution: &Solution);
}

/// An observer that does nothing
#[derive(Debug, Default, Copy, Clone)]
pub struct NoObserver;
impl SolutionObserver for NoObserver {
    fn on_incumbent(&self, _: &Solution) {}
}
