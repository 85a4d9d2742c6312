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


//! This module defines the parameters recognized by the engine. They can
//! either be loaded from a toml file (every key is optional) or assembled in
//! code with the `ParametersBuilder`.
//!
//! # Example
//! ```
//! # use bcp::*;
//! let params = Parameters::from_toml_str(r#"
//!     search_order = "depth-first"
//!     max_node_id_count = 4
//!     min_branching_ids = 3
//! "#).unwrap();
//! assert_eq!(SearchOrder::DepthFirst, params.search_order);
//! assert_eq!(4, params.max_node_id_count);
//! assert_eq!(1.0, params.max_node_id_ratio); // default
//! ```

use std::{path::Path, time::Duration};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::{BcpError, BcpResult};

/// The longest duration (seconds) accepted for any time related parameter
pub const MAX_DURATION_SECS: f64 = 365.0 * 24.0 * 3600.0;

/// The order in which candidate nodes are selected from the fringe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchOrder {
    /// Smallest lower bound first
    #[default]
    BestBound,
    /// Shallowest node first (fifo among equals)
    BreadthFirst,
    /// Deepest node first (lifo among equals)
    DepthFirst,
}

/// What to do with a node whose relaxation could not be solved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Give up on the node; optimality can no longer be proven
    Drop,
    /// Put the node back in the fringe (at most `max_node_retries` times)
    #[default]
    Retry,
    /// Abort the whole search with an error
    Escalate,
}

/// All the knobs of the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[serde(default)]
#[builder(default)]
pub struct Parameters {
    /// Scales the allocation computed in static mode
    pub over_estimation_static: f64,
    /// Scales the allocation computed in rate based mode
    pub over_estimation_rate: f64,
    /// The scheduler switches to rate based mode when the fraction of free
    /// ids (among those not processing nodes) drops below `1 - threshold`
    pub switch_to_rate_threshold: f64,
    /// Expected time (seconds) to solve the root node. When absent, it is
    /// measured on the actual root node.
    #[builder(setter(strip_option))]
    pub time_root_node_solve: Option<f64>,
    /// The rate window spans `ceil(time_root_node_solve * horizon_factor)` seconds
    pub horizon_factor: f64,
    /// At most `floor(ratio * nb ids)` ids may process nodes simultaneously
    pub max_node_id_ratio: f64,
    /// At most that many ids may process nodes simultaneously
    pub max_node_id_count: usize,
    /// Upper bound on the number of ids granted for strong branching
    pub max_branching_ids: usize,
    /// Requests for at least that many ids are refused rather than partially granted
    pub min_branching_ids: usize,
    pub search_order: SearchOrder,
    /// Wall clock budget (seconds) of the search
    #[builder(setter(strip_option))]
    pub max_run_time: Option<f64>,
    /// Time (seconds) the outstanding workers are given to finish once the
    /// search has been told to stop
    pub termination_grace: f64,
    /// Enables diving
    pub dive: bool,
    pub dive_quality_ratio_with_incumbent: f64,
    pub dive_quality_ratio_without_incumbent: f64,
    /// A node is pruned when its bound is not better than the incumbent by
    /// more than this amount
    pub granularity: f64,
    /// Run a column generation only phase before branch-and-cut
    pub pricing_phase: bool,
    /// Maximum number of cut/column generation rounds per node
    pub max_generation_rounds: usize,
    /// Maximum number of branching candidates evaluated by strong branching
    pub strong_branching_candidates: usize,
    pub failure_policy: FailurePolicy,
    pub max_node_retries: usize,
    /// Number of worker processes
    pub nb_workers: usize,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            over_estimation_static: 1.5,
            over_estimation_rate: 1.2,
            switch_to_rate_threshold: 0.1,
            time_root_node_solve: None,
            horizon_factor: 2.0,
            max_node_id_ratio: 1.0,
            max_node_id_count: usize::MAX,
            max_branching_ids: usize::MAX,
            min_branching_ids: 1,
            search_order: SearchOrder::BestBound,
            max_run_time: None,
            termination_grace: 5.0,
            dive: true,
            dive_quality_ratio_with_incumbent: 0.1,
            dive_quality_ratio_without_incumbent: 0.1,
            granularity: 0.0,
            pricing_phase: false,
            max_generation_rounds: 50,
            strong_branching_candidates: 8,
            failure_policy: FailurePolicy::Retry,
            max_node_retries: 1,
            nb_workers: num_cpus::get(),
        }
    }
}

impl Parameters {
    /// Loads (and validates) the parameters from a toml file
    pub fn from_file<P: AsRef<Path>>(path: P) -> BcpResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
    /// Parses (and validates) the parameters from a toml document
    pub fn from_toml_str(text: &str) -> BcpResult<Self> {
        let params: Parameters = toml::from_str(text)?;
        params.validate()?;
        Ok(params)
    }
    /// The time budget of the search, if any
    pub fn max_run_time(&self) -> Option<Duration> {
        self.max_run_time.map(seconds)
    }
    /// The grace period granted to outstanding workers
    pub fn termination_grace(&self) -> Duration {
        seconds(self.termination_grace)
    }
    /// Rejects the inconsistent configurations
    pub fn validate(&self) -> BcpResult<()> {
        fn invalid(msg: String) -> BcpResult<()> {
            Err(BcpError::InvalidConfig(msg))
        }
        if self.nb_workers == 0 {
            return invalid("nb_workers must be at least 1".to_string());
        }
        if !(self.over_estimation_static > 0.0) || !(self.over_estimation_rate > 0.0) {
            return invalid(format!("over estimation factors must be positive (static {}, rate {})",
                self.over_estimation_static, self.over_estimation_rate));
        }
        if !(0.0..=1.0).contains(&self.switch_to_rate_threshold) {
            return invalid(format!("switch_to_rate_threshold must lie in [0, 1] (got {})", self.switch_to_rate_threshold));
        }
        if !(self.horizon_factor > 0.0) {
            return invalid(format!("horizon_factor must be positive (got {})", self.horizon_factor));
        }
        if !self.horizon_factor.is_finite() {
            return invalid(format!("horizon_factor must be finite (got {})", self.horizon_factor));
        }
        if let Some(t) = self.time_root_node_solve.filter(|t| !is_duration(*t)) {
            return invalid(format!("time_root_node_solve must lie in [0, {MAX_DURATION_SECS}] (got {t})"));
        }
        if !(self.max_node_id_ratio > 0.0) || self.max_node_id_count == 0 {
            return invalid("the node id cap must allow at least one node".to_string());
        }
        if self.min_branching_ids > self.max_branching_ids {
            return invalid(format!("min_branching_ids ({}) exceeds max_branching_ids ({})",
                self.min_branching_ids, self.max_branching_ids));
        }
        if let Some(t) = self.max_run_time.filter(|t| !is_duration(*t)) {
            return invalid(format!("max_run_time must lie in [0, {MAX_DURATION_SECS}] (got {t})"));
        }
        if !is_duration(self.termination_grace) {
            return invalid(format!("termination_grace must lie in [0, {MAX_DURATION_SECS}] (got {})", self.termination_grace));
        }
        if !(self.granularity >= 0.0) {
            return invalid(format!("granularity must not be negative (got {})", self.granularity));
        }
        if self.dive_quality_ratio_with_incumbent < 0.0 || self.dive_quality_ratio_without_incumbent < 0.0 {
            return invalid("dive quality ratios must not be negative".to_string());
        }
        Ok(())
    }
}

/// True iff `x` is an acceptable number of seconds (NaN is not)
fn is_duration(x: f64) -> bool {
    (0.0..=MAX_DURATION_SECS).contains(&x)
}
/// Converts a number of seconds, saturating instead of panicking
fn seconds(x: f64) -> Duration {
    Duration::try_from_secs_f64(x.max(0.0)).unwrap_or(Duration::MAX)
}
