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


//! The worker process shell. A worker is a single threaded state machine
//! driven by the messages it receives: it processes the nodes dispatched by
//! the coordinator and, when lent as a helper, evaluates strong branching
//! candidates on behalf of another worker.

use fxhash::FxHashSet;
use tracing::{debug, error, trace};

use crate::*;

/// The subset of the parameters a worker cares about
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkerParams {
    pub granularity: f64,
    pub max_generation_rounds: usize,
    pub strong_branching_candidates: usize,
}
impl From<&Parameters> for WorkerParams {
    fn from(p: &Parameters) -> Self {
        WorkerParams {
            granularity: p.granularity,
            max_generation_rounds: p.max_generation_rounds,
            strong_branching_candidates: p.strong_branching_candidates,
        }
    }
}
impl Default for WorkerParams {
    fn default() -> Self {
        Self::from(&Parameters::default())
    }
}

/// The user supplied policies. They are shared (read only) by all workers.
#[derive(Clone, Copy)]
pub struct Policies<'a> {
    pub columns  : &'a (dyn ColumnGenerator + Sync),
    pub cuts     : &'a (dyn CutGenerator + Sync),
    pub branching: &'a (dyn BranchingRule + Sync),
}

/// The estimated bound of each child of each candidate
type Estimates = Vec<Vec<f64>>;

/// A worker process
pub struct Worker<'a, C: Channel, S: LpSolver> {
    id      : WorkerId,
    channel : C,
    solver  : S,
    policies: Policies<'a>,
    params  : WorkerParams,
}

impl <'a, C: Channel, S: LpSolver> Worker<'a, C, S> {
    pub fn new(id: WorkerId, channel: C, solver: S, policies: Policies<'a>, params: WorkerParams) -> Self {
        Worker { id, channel, solver, policies, params }
    }

    /// Serves the messages until told to terminate. A fatal error (e.g. a
    /// message that cannot be decoded) stops the worker; the coordinator is
    /// then notified with a `Terminate` message.
    ///
    /// A peer going away is not an error: endpoints are only dropped once
    /// the search is over.
    pub fn run(&mut self) -> BcpResult<()> {
        match self.serve() {
            Err(BcpError::Disconnected(peer)) => {
                debug!(worker = %self.id, %peer, "peer gone, stopping");
                Ok(())
            },
            Err(e) => {
                error!(worker = %self.id, error = %e, "worker stopped");
                let _ = self.channel.send(ProcessId::Coordinator, &Message::Terminate);
                Err(e)
            },
            Ok(()) => Ok(()),
        }
    }

    fn serve(&mut self) -> BcpResult<()> {
        loop {
            let Envelope { from, message } = self.channel.recv()?;
            match message {
                Message::DispatchNode(assignment) => {
                    let node = assignment.node;
                    match self.process_node(assignment)? {
                        Some(report) => {
                            debug!(worker = %self.id, %node, outcome = ?report.outcome, "node processed");
                            self.channel.send(ProcessId::Coordinator, &Message::NodeProcessed(report))?;
                        },
                        None => return Ok(()),
                    }
                },
                Message::EvaluateCandidate(batch) => self.help(from, batch)?,
                Message::Terminate => return Ok(()),
                other => return Err(BcpError::Unexpected { from, message: other.name() }),
            }
        }
    }

    /// Processes one node. `None` means the worker was told to terminate
    /// while it was waiting for its helpers.
    fn process_node(&mut self, a: NodeAssignment) -> BcpResult<Option<NodeReport>> {
        let mut lp         = a.formulation;
        let mut generated  = vec![];
        let mut iterations = 0;
        let mut rounds     = 0;
        let report = |outcome: NodeOutcome, generated: Vec<Payload>, iterations: usize| -> BcpResult<Option<NodeReport>> {
            Ok(Some(NodeReport { node: a.node, outcome, generated, iterations }))
        };

        let (res, converged) = loop {
            let res = self.solver.solve(&lp, a.cutoff);
            iterations += res.iterations;
            if let Some(outcome) = Self::interpret(&res) {
                return report(outcome, generated, iterations);
            }

            let mut fresh = self.policies.columns.generate_columns(&lp, &res).into_iter()
                .map(Payload::from)
                .collect::<Vec<_>>();
            let converged = fresh.is_empty();
            if converged {
                // the relaxation bound is only valid once pricing has converged
                if res.objective >= a.cutoff - self.params.granularity {
                    return report(NodeOutcome::BoundPruned { bound: res.objective }, generated, iterations);
                }
                if a.phase.separates_cuts() {
                    fresh.extend(self.policies.cuts.generate_cuts(&lp, &res).into_iter().map(Payload::from));
                }
            }

            let mut ids = FxHashSet::default();
            fresh.retain(|o| !lp.contains(o) && ids.insert((o.is_variable(), o.id())));
            if fresh.is_empty() || rounds >= self.params.max_generation_rounds {
                break (res, converged);
            }
            trace!(worker = %self.id, node = %a.node, round = rounds, objects = fresh.len(), "formulation extended");
            for o in fresh {
                lp.push(o.clone());
                generated.push(o);
            }
            rounds += 1;
        };

        let bound = if converged { a.bound.max(res.objective) } else { a.bound };
        let candidates = match self.policies.branching.select(&lp, &res) {
            Branching::Candidates(c) if !c.is_empty() => c,
            _ => {
                let solution = Self::solution(&lp, &res);
                let objective = solution.objective;
                self.channel.send(ProcessId::Coordinator, &Message::ReportIncumbent(solution))?;
                return report(NodeOutcome::FeasibleIntegral { objective }, generated, iterations);
            }
        };
        if a.phase == Phase::Pricing {
            return report(NodeOutcome::Deferred { bound }, generated, iterations);
        }

        let children = match self.strong_branching(a.node, a.cutoff, &lp, bound, candidates)? {
            Some(children) => children,
            None => return Ok(None),
        };
        report(NodeOutcome::Branched { bound, children }, generated, iterations)
    }

    /// The outcomes that do not require looking at the solution
    fn interpret(res: &LpResult) -> Option<NodeOutcome> {
        let code = res.termcode;
        if code.is_abandoned() {
            Some(NodeOutcome::Failed(FailureReason::Abandoned))
        } else if code.is_primal_infeasible() {
            Some(NodeOutcome::Infeasible)
        } else if code.is_dual_infeasible() {
            Some(NodeOutcome::Failed(FailureReason::Unbounded))
        } else if code.is_obj_limit_reached() {
            Some(NodeOutcome::BoundPruned { bound: res.objective })
        } else if code.is_iteration_limit_reached() && !code.is_optimal() {
            Some(NodeOutcome::Failed(FailureReason::IterationLimit))
        } else if !code.is_optimal() {
            Some(NodeOutcome::Failed(FailureReason::Abandoned))
        } else {
            None
        }
    }

    fn solution(lp: &Formulation, res: &LpResult) -> Solution {
        let values = lp.variables.iter().zip(res.primal.iter())
            .filter(|(_, x)| **x != 0.0)
            .map(|(v, x)| VarValue { var: v.id, value: *x })
            .collect();
        Solution { objective: res.objective, values }
    }

    /// Picks the best candidate and returns its children. When there are
    /// several candidates, each child is evaluated (by the helpers the
    /// coordinator lends us, and by ourselves) and the candidate having the
    /// best score is kept. Infeasible children are dropped.
    fn strong_branching(&mut self, node: NodeId, cutoff: f64, lp: &Formulation, bound: f64,
        mut candidates: Vec<BranchingCandidate>) -> BcpResult<Option<Vec<ChildSpec>>>
    {
        candidates.truncate(self.params.strong_branching_candidates.max(1));
        if candidates.len() == 1 {
            let children = candidates.swap_remove(0).children.into_iter()
                .map(|bound_changes| ChildSpec { bound, bound_changes })
                .collect();
            return Ok(Some(children));
        }

        let tasks = candidates.iter().enumerate()
            .flat_map(|(c, cand)| cand.children.iter().enumerate()
                .map(move |(k, changes)| CandidateChild { candidate: c, child: k, changes: changes.clone() }))
            .collect::<Vec<_>>();

        let estimates = match self.evaluate_candidates(node, cutoff, lp, &candidates, tasks)? {
            Some(e) => e,
            None => return Ok(None),
        };

        let mut best: Option<(usize, f64)> = None;
        for (c, est) in estimates.iter().enumerate() {
            let bounds = est.iter().map(|b| b.max(bound)).collect::<Vec<_>>();
            let score  = self.policies.branching.score(&bounds);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((c, score));
            }
        }
        let chosen = best.map_or(0, |(c, _)| c);
        debug!(worker = %self.id, %node, candidates = candidates.len(), chosen, "strong branching done");

        let children = candidates.swap_remove(chosen).children.into_iter()
            .zip(estimates[chosen].iter())
            .filter(|(_, est)| **est < f64::INFINITY)
            .map(|(bound_changes, est)| ChildSpec { bound: est.max(bound), bound_changes })
            .collect();
        Ok(Some(children))
    }

    /// Asks for helpers, distributes the children among the helpers and
    /// ourselves, and gathers the estimates.
    fn evaluate_candidates(&mut self, node: NodeId, cutoff: f64, lp: &Formulation,
        candidates: &[BranchingCandidate], tasks: Vec<CandidateChild>) -> BcpResult<Option<Estimates>>
    {
        self.channel.send(ProcessId::Coordinator, &Message::RequestBranchingIds(tasks.len()))?;
        let helpers = loop {
            let Envelope { from, message } = self.channel.recv()?;
            match message {
                Message::BranchingIdsGranted(ids) => break ids,
                Message::Terminate => return Ok(None),
                other => return Err(BcpError::Unexpected { from, message: other.name() }),
            }
        };

        // round robin: slot 0 is ours, slot i is helper i-1
        let mut shares = vec![vec![]; helpers.len() + 1];
        for (i, task) in tasks.into_iter().enumerate() {
            shares[i % (helpers.len() + 1)].push(task);
        }
        let mine = shares.remove(0);
        for (helper, share) in helpers.iter().zip(shares.into_iter()) {
            let batch = CandidateBatch { node, cutoff, formulation: lp.clone(), tasks: share };
            self.channel.send(ProcessId::Worker(*helper), &Message::EvaluateCandidate(batch))?;
        }

        let mut estimates = candidates.iter()
            .map(|c| vec![f64::NEG_INFINITY; c.children.len()])
            .collect::<Estimates>();
        for e in self.evaluate(lp, cutoff, &mine) {
            estimates[e.candidate][e.child] = Self::estimate(&e);
        }

        let mut waiting = helpers.len();
        while waiting > 0 {
            let Envelope { from, message } = self.channel.recv()?;
            match message {
                Message::CandidateEvaluated(answers) => {
                    for e in answers {
                        let slot = estimates.get_mut(e.candidate).and_then(|c| c.get_mut(e.child))
                            .ok_or(BcpError::Unexpected { from, message: "CandidateEvaluated" })?;
                        *slot = Self::estimate(&e);
                    }
                    waiting -= 1;
                },
                Message::Terminate => return Ok(None),
                other => return Err(BcpError::Unexpected { from, message: other.name() }),
            }
        }
        trace!(worker = %self.id, %node, helpers = helpers.len(), "candidates evaluated");
        Ok(Some(estimates))
    }

    /// Solves the relaxation of each child
    fn evaluate(&mut self, lp: &Formulation, cutoff: f64, tasks: &[CandidateChild]) -> Vec<CandidateEstimate> {
        tasks.iter()
            .map(|task| {
                let mut child = lp.clone();
                child.bound_changes.extend_from_slice(&task.changes);
                let res = self.solver.solve(&child, cutoff);
                CandidateEstimate { candidate: task.candidate, child: task.child,
                    objective: res.objective, termcode: res.termcode }
            })
            .collect()
    }

    /// The bound of a child as told by its estimate (+inf when infeasible,
    /// -inf when nothing can be said)
    fn estimate(e: &CandidateEstimate) -> f64 {
        let code = e.termcode;
        if code.is_primal_infeasible() {
            f64::INFINITY
        } else if code.is_optimal() || code.is_obj_limit_reached() {
            e.objective
        } else {
            f64::NEG_INFINITY
        }
    }

    /// Helper role: evaluates the given children for `requester`, then gives
    /// itself back to the coordinator.
    fn help(&mut self, requester: ProcessId, batch: CandidateBatch) -> BcpResult<()> {
        let answers = self.evaluate(&batch.formulation, batch.cutoff, &batch.tasks);
        trace!(worker = %self.id, node = %batch.node, %requester, children = answers.len(), "helped");
        self.channel.send(requester, &Message::CandidateEvaluated(answers))?;
        self.channel.send(ProcessId::Coordinator, &Message::ReleaseBranchingId(self.id))
    }
}
