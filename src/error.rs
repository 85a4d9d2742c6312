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


//! This module groups the errors that might occur while setting up or running
//! a search. Note that resource exhaustion (no free worker, node cap reached)
//! is *not* an error: it is a normal outcome that callers handle by retrying.

use crate::{WorkerId, NodeId, ProcessId, SlotKind, FailureReason};

/// This enumeration simply groups the kind of errors that might occur when
/// running the coordinator, a worker or when loading the configuration.
#[derive(Debug, thiserror::Error)]
pub enum BcpError {
    /// The configuration is inconsistent (fatal at startup)
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// There was an io related error
    #[error("io error {0}")]
    Io(#[from] std::io::Error),
    /// The configuration file is not valid toml
    #[error("config parse error {0}")]
    Toml(#[from] toml::de::Error),
    /// A frame received from the wire could not be decoded
    #[error("malformed frame of {len} bytes: {reason}")]
    Malformed { len: usize, reason: String },
    /// A message could not be turned into a frame
    #[error("cannot encode {message}: {reason}")]
    Encoding { message: &'static str, reason: String },
    /// The same worker id was registered twice
    #[error("worker {0} was already registered")]
    DuplicateWorker(WorkerId),
    /// The worker id was never registered with the scheduler
    #[error("unknown worker {0}")]
    UnknownWorker(WorkerId),
    /// A worker was released for a kind of work it was not committed to
    #[error("worker {worker} is not committed to {kind:?}")]
    NotCommitted { worker: WorkerId, kind: SlotKind },
    /// The node handle does not belong to the node store
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
    /// A node failed and the failure policy says to escalate
    #[error("node {node} failed: {reason:?}")]
    NodeFailed { node: NodeId, reason: FailureReason },
    /// The peer process is gone
    #[error("channel to {0} is disconnected")]
    Disconnected(ProcessId),
    /// A message that makes no sense in the current state was received
    #[error("unexpected {message} message from {from}")]
    Unexpected { from: ProcessId, message: &'static str },
    /// A worker process stopped before being told to
    #[error("worker {0} stopped unexpectedly")]
    WorkerLost(WorkerId),
}

pub type BcpResult<T> = Result<T, BcpError>;
