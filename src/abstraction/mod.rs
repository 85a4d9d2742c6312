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


//! This module (and its submodules) provide the abstractions for the basic
//! building blocks of the engine. A client willing to use our library to
//! implement a branch-and-cut-and-price algorithm for a particular problem
//! should look into the `lp` and `policy` submodules. These are the places
//! where `LpSolver`, `ColumnGenerator`, `CutGenerator` and `BranchingRule`
//! are defined: the pieces one *must* provide.

mod lp;
mod policy;
mod channel;
mod heuristics;
mod fringe;
mod solver;

pub use lp::*;
pub use policy::*;
pub use channel::*;
pub use heuristics::*;
pub use fringe::*;
pub use solver::*;
