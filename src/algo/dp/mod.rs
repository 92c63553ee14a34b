//! Dynamic programming planners for finite MDPs with a fully known, deterministic model

pub mod agent;
pub mod greedy;
pub mod q_value_iteration;
pub mod value_iteration;

use std::{
    fmt,
    ops::{Index, IndexMut},
};

use log::debug;

use crate::{
    assert_interval,
    error::{Error, Result},
};

pub use agent::DPAgent;
pub use greedy::{best_action, greedy_from_q, greedy_from_v};
pub use q_value_iteration::{q_value_iteration, q_value_iteration_from};
pub use value_iteration::{value_iteration, value_iteration_from};

/// Which table a policy should be read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    /// State values, `V(s)`
    V,
    /// State-action values, `Q(s, a)`
    Q,
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableKind::V => write!(f, "V"),
            TableKind::Q => write!(f, "Q"),
        }
    }
}

/// How the per-sweep convergence delta is measured
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeltaCriterion {
    /// Largest absolute change of any entry
    #[default]
    Absolute,
    /// Largest decrease of any entry; sweeps in which values only grow report a delta of zero
    Decrease,
}

impl DeltaCriterion {
    fn change(self, old: f64, new: f64) -> f64 {
        match self {
            DeltaCriterion::Absolute => (old - new).abs(),
            DeltaCriterion::Decrease => (old - new).max(0.0),
        }
    }
}

/// Configuration shared by the DP solvers
#[derive(Debug, Clone)]
pub struct DPConfig {
    /// Discount factor - must be between 0 and 1
    ///
    /// **Default**: `1.0`
    pub gamma: f64,
    /// Convergence threshold, sweeping stops once the delta drops strictly below it
    ///
    /// **Default**: `0.001`
    pub theta: f64,
    /// Upper bound on the number of sweeps before giving up with [`Error::NonConvergence`]
    ///
    /// **Default**: `10_000`
    pub max_sweeps: u32,
    /// **Default**: [`DeltaCriterion::Absolute`]
    pub criterion: DeltaCriterion,
}

impl Default for DPConfig {
    fn default() -> Self {
        Self {
            gamma: 1.0,
            theta: 0.001,
            max_sweeps: 10_000,
            criterion: DeltaCriterion::default(),
        }
    }
}

impl DPConfig {
    /// **Panics** if `gamma` is not in `[0,1]`, or if `theta` or `max_sweeps` is not positive
    pub(crate) fn validate(&self) {
        assert_interval!(self.gamma, 0.0, 1.0);
        assert!(self.theta > 0.0, "`theta` must be positive.");
        assert!(self.max_sweeps > 0, "`max_sweeps` must be positive.");
    }
}

/// A solved table together with the delta observed in each sweep
#[derive(Debug, Clone, PartialEq)]
pub struct Solution<T> {
    pub table: T,
    pub deltas: Vec<f64>,
}

impl<T> Solution<T> {
    /// Number of sweeps it took to converge
    pub fn sweeps(&self) -> usize {
        self.deltas.len()
    }
}

/// Dense state value table, one entry per state
#[derive(Debug, Clone, PartialEq)]
pub struct ValueTable(Vec<f64>);

impl ValueTable {
    pub fn zeros(n_states: usize) -> Self {
        Self(vec![0.0; n_states])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

impl From<Vec<f64>> for ValueTable {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

impl Index<usize> for ValueTable {
    type Output = f64;

    fn index(&self, state: usize) -> &Self::Output {
        &self.0[state]
    }
}

impl IndexMut<usize> for ValueTable {
    fn index_mut(&mut self, state: usize) -> &mut Self::Output {
        &mut self.0[state]
    }
}

/// Dense state-action value table of shape `n_states x n_actions`, stored row-major
#[derive(Debug, Clone, PartialEq)]
pub struct ActionValueTable {
    n_states: usize,
    n_actions: usize,
    values: Vec<f64>,
}

impl ActionValueTable {
    pub fn zeros(n_states: usize, n_actions: usize) -> Self {
        Self {
            n_states,
            n_actions,
            values: vec![0.0; n_states * n_actions],
        }
    }

    pub fn n_states(&self) -> usize {
        self.n_states
    }

    pub fn n_actions(&self) -> usize {
        self.n_actions
    }

    /// Values of every action in `state`, in action order
    pub fn row(&self, state: usize) -> &[f64] {
        let start = state * self.n_actions;
        &self.values[start..start + self.n_actions]
    }

    /// `max_a Q(state, a)`
    pub fn max(&self, state: usize) -> f64 {
        self.row(state)
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }
}

impl Index<(usize, usize)> for ActionValueTable {
    type Output = f64;

    fn index(&self, (state, action): (usize, usize)) -> &Self::Output {
        &self.values[state * self.n_actions + action]
    }
}

impl IndexMut<(usize, usize)> for ActionValueTable {
    fn index_mut(&mut self, (state, action): (usize, usize)) -> &mut Self::Output {
        &mut self.values[state * self.n_actions + action]
    }
}

/// Run synchronous sweeps over `values` until the delta drops below `theta`
///
/// Each sweep computes every new entry from a snapshot of the previous sweep via
/// `backup(previous, index)`.
///
/// **Returns** the delta of every completed sweep
fn sweep_until_converged<F>(config: &DPConfig, values: &mut [f64], mut backup: F) -> Result<Vec<f64>>
where
    F: FnMut(&[f64], usize) -> f64,
{
    let mut deltas = Vec::new();
    let mut previous = values.to_vec();

    for sweep in 1..=config.max_sweeps {
        let mut delta = 0.0_f64;
        for (i, value) in values.iter_mut().enumerate() {
            let new_value = backup(&previous, i);
            delta = delta.max(config.criterion.change(*value, new_value));
            *value = new_value;
        }
        deltas.push(delta);
        debug!("sweep {sweep}: delta {delta}");

        if delta < config.theta {
            return Ok(deltas);
        }
        previous.copy_from_slice(values);
    }

    Err(Error::NonConvergence {
        sweeps: config.max_sweeps,
        delta: deltas.last().copied().unwrap_or(f64::NAN),
    })
}
