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


//! An in-process transport: every process is a thread and every endpoint
//! owns an unbounded crossbeam channel as its inbox. Messages are encoded to
//! bytes when they are sent and decoded when they are received, exactly as
//! they would be with an out of process transport.

use std::{sync::Arc, time::Duration};

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use fxhash::FxHashMap;
use parking_lot::RwLock;
use tracing::{debug, error};

use crate::*;

/// What actually travels through the crossbeam channels
#[derive(Debug)]
struct Frame {
    from : ProcessId,
    bytes: Vec<u8>,
}

/// The builder of a fully connected in-process network.
///
/// # Example
/// ```
/// # use bcp::*;
/// let (coordinator, workers) = LocalNetwork::build(&[WorkerId(0), WorkerId(1)]);
/// workers[1].send(ProcessId::Coordinator, &Message::RequestNodeId).unwrap();
///
/// let env = coordinator.recv().unwrap();
/// assert_eq!(ProcessId::Worker(WorkerId(1)), env.from);
/// assert_eq!(Message::RequestNodeId, env.message);
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalNetwork;
impl LocalNetwork {
    /// Creates the endpoint of the coordinator and one endpoint per worker
    /// (in the order of `workers`).
    pub fn build(workers: &[WorkerId]) -> (LocalChannel, Vec<LocalChannel>) {
        let mut senders = FxHashMap::default();

        let (tx, coordinator_inbox) = channel::unbounded();
        senders.insert(ProcessId::Coordinator, tx);
        let mut inboxes = Vec::with_capacity(workers.len());
        for w in workers {
            let (tx, rx) = channel::unbounded();
            senders.insert(ProcessId::Worker(*w), tx);
            inboxes.push((*w, rx));
        }

        let postman = Arc::new(RwLock::new(senders));
        let coordinator = LocalChannel {
            me: ProcessId::Coordinator,
            inbox: coordinator_inbox,
            postman: Arc::clone(&postman),
        };
        let workers = inboxes.into_iter()
            .map(|(w, inbox)| LocalChannel { me: ProcessId::Worker(w), inbox, postman: Arc::clone(&postman) })
            .collect();
        (coordinator, workers)
    }
}

type Postman = Arc<RwLock<FxHashMap<ProcessId, Sender<Frame>>>>;

/// One endpoint of a `LocalNetwork`
pub struct LocalChannel {
    me     : ProcessId,
    inbox  : Receiver<Frame>,
    postman: Postman,
}
impl LocalChannel {
    /// Connects a new worker to the network this endpoint belongs to, and
    /// returns the endpoint of that worker. This is how a worker joins a
    /// search that is already running.
    ///
    /// # Example
    /// ```
    /// # use bcp::*;
    /// let (coordinator, _workers) = LocalNetwork::build(&[WorkerId(0)]);
    /// assert!(!coordinator.reaches(ProcessId::Worker(WorkerId(4))));
    ///
    /// let late = coordinator.attach(WorkerId(4)).unwrap();
    /// assert!(coordinator.reaches(ProcessId::Worker(WorkerId(4))));
    /// coordinator.send(late.me(), &Message::Terminate).unwrap();
    /// assert_eq!(Message::Terminate, late.recv().unwrap().message);
    /// ```
    pub fn attach(&self, worker: WorkerId) -> BcpResult<LocalChannel> {
        let me = ProcessId::Worker(worker);
        let mut senders = self.postman.write();
        if senders.contains_key(&me) {
            return Err(BcpError::DuplicateWorker(worker));
        }
        let (tx, inbox) = channel::unbounded();
        senders.insert(me, tx);
        debug!(worker = %worker, "attached to the local network");
        Ok(LocalChannel { me, inbox, postman: Arc::clone(&self.postman) })
    }
    /// Sends raw bytes as if they were an encoded message
    pub fn send_bytes(&self, to: ProcessId, bytes: Vec<u8>) -> BcpResult<()> {
        let tx = self.postman.read().get(&to).cloned().ok_or(BcpError::Disconnected(to))?;
        tx.send(Frame { from: self.me, bytes }).map_err(|_| BcpError::Disconnected(to))
    }
    /// The number of frames waiting in the inbox
    pub fn pending(&self) -> usize {
        self.inbox.len()
    }
    fn open(&self, frame: Frame) -> BcpResult<Envelope> {
        match from_bytes::<Message>(&frame.bytes) {
            Ok(message) => Ok(Envelope { from: frame.from, message }),
            Err(e) => {
                error!(me = %self.me, from = %frame.from, error = %e, "could not decode message");
                Err(e)
            }
        }
    }
}
impl Channel for LocalChannel {
    fn me(&self) -> ProcessId {
        self.me
    }
    fn reaches(&self, to: ProcessId) -> bool {
        self.postman.read().contains_key(&to)
    }
    fn send(&self, to: ProcessId, message: &Message) -> BcpResult<()> {
        self.send_bytes(to, to_bytes(message)?)
    }
    fn recv(&self) -> BcpResult<Envelope> {
        let frame = self.inbox.recv().map_err(|_| BcpError::Disconnected(self.me))?;
        self.open(frame)
    }
    fn recv_timeout(&self, timeout: Duration) -> BcpResult<Option<Envelope>> {
        match self.inbox.recv_timeout(timeout) {
            Ok(frame)                            => self.open(frame).map(Some),
            Err(RecvTimeoutError::Timeout)       => Ok(None),
            Err(RecvTimeoutError::Disconnected)  => Err(BcpError::Disconnected(self.me)),
        }
    }
}
