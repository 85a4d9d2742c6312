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


//! This module defines the abstract message transport between the processes
//! of the engine.

use std::time::Duration;

use crate::{BcpResult, Message, ProcessId};

/// A message along with the address of its sender
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub from   : ProcessId,
    pub message: Message,
}

/// One endpoint of the transport. The only guarantee a channel needs to
/// provide is that the messages from one given sender are delivered in the
/// order they were sent.
pub trait Channel {
    /// The address of this endpoint
    fn me(&self) -> ProcessId;
    /// Returns true iff this endpoint knows an address for the given process.
    /// It says nothing about whether that process is still listening.
    fn reaches(&self, to: ProcessId) -> bool;
    /// Sends a message to the given process
    fn send(&self, to: ProcessId, message: &Message) -> BcpResult<()>;
    /// Blocks until a message is received
    fn recv(&self) -> BcpResult<Envelope>;
    /// Waits at most `timeout` for a message. `Ok(None)` means nothing
    /// arrived in time.
    fn recv_timeout(&self, timeout: Duration) -> BcpResult<Option<Envelope>>;
}
