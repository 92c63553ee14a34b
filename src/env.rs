use std::{
    collections::BTreeMap,
    fmt::{self, Display},
    ops::{Deref, DerefMut, Range},
    str::FromStr,
};

use crate::error::{Error, Result};

/// Represents a Markov decision process, defining the dynamics of an environment
/// in which an agent can operate.
///
/// This base trait represents the common case of a discrete-time MDP with one agent
/// and a finite state space and action space.
pub trait Environment {
    /// A representation of the state of the environment to be passed to an agent
    type State;

    /// A representation of an action that an agent can take to affect the environment
    type Action;

    /// Determine if the state is active or terminal
    fn is_active(&self) -> bool;

    /// Update the environment in response to an action taken by an agent, producing a new state and associated reward
    ///
    /// **Returns** `(next_state, reward)`, where `next_state` is `None` once the episode has terminated
    fn step(&mut self, action: Self::Action) -> (Option<Self::State>, f64);

    /// Reset the environment to an initial state
    ///
    /// **Returns** the state
    fn reset(&mut self) -> Self::State;
}

/// An environment whose states are densely indexed `0..n_states`
pub trait DiscreteStateSpace: Environment<State = usize> {
    /// Number of states
    fn n_states(&self) -> usize;

    /// All states in index order
    fn states(&self) -> Range<usize> {
        0..self.n_states()
    }
}

/// An environment with a finite action set shared by all states
pub trait DiscreteActionSpace: Environment {
    /// Get the available actions, in a fixed order
    ///
    /// The returned vec should never be empty, instead specify an action that represents doing nothing if necessary.
    fn actions(&self) -> Vec<Self::Action>;

    fn n_actions(&self) -> usize {
        self.actions().len()
    }
}

/// A fully known, deterministic model of the environment dynamics
///
/// Planning algorithms query the model directly instead of stepping the environment,
/// so [`transition`](Model::transition) must not mutate anything.
pub trait Model: Environment {
    /// The outcome of taking `action` in `state`
    ///
    /// **Returns** `(next_state, reward)`. Identical inputs always yield identical outputs.
    fn transition(&self, state: Self::State, action: Self::Action) -> (Self::State, f64);

    /// The state the environment is currently in
    fn current_state(&self) -> Self::State;
}

/// An environment that keeps a [`Report`] about the running episode
pub trait Reporting {
    fn report(&mut self) -> &mut Report;
}

/// Look up the action named by `label` among the environment's actions
///
/// Labels are parsed with the action type's [`FromStr`] impl after trimming whitespace.
///
/// **Errors** with [`Error::InvalidAction`] if the label names none of the environment's actions
pub fn parse_action<E>(env: &E, label: &str) -> Result<E::Action>
where
    E: DiscreteActionSpace,
    E::Action: FromStr + PartialEq + Display,
{
    let label = label.trim();
    let actions = env.actions();
    label
        .parse::<E::Action>()
        .ok()
        .filter(|a| actions.contains(a))
        .ok_or_else(|| Error::InvalidAction {
            label: label.to_owned(),
            available: format_actions(&actions),
        })
}

/// Apply the action named by `label` to the environment
///
/// An unrecognized label leaves the environment untouched, see [`parse_action`].
///
/// **Returns** the outcome of [`Environment::step`]
pub fn act_label<E>(env: &mut E, label: &str) -> Result<(Option<E::State>, f64)>
where
    E: DiscreteActionSpace,
    E::Action: FromStr + PartialEq + Display,
{
    let action = parse_action(env, label)?;
    Ok(env.step(action))
}

/// Comma separated list of action labels, for prompts and error messages
pub fn format_actions<A: Display>(actions: &[A]) -> String {
    actions
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Named numeric counters an environment keeps about the current episode
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    values: BTreeMap<&'static str, f64>,
}

impl Report {
    /// Create a report tracking the given keys, all starting at zero
    pub fn new(keys: Vec<&'static str>) -> Self {
        Self {
            values: keys.into_iter().map(|k| (k, 0.0)).collect(),
        }
    }

    /// The tracked keys in sorted order
    pub fn keys(&self) -> Vec<&'static str> {
        self.values.keys().copied().collect()
    }

    /// Return the current values and reset every counter to zero
    pub fn take(&mut self) -> Report {
        let taken = self.clone();
        self.values.values_mut().for_each(|v| *v = 0.0);
        taken
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{key}: {value}")?;
        }
        Ok(())
    }
}

impl Deref for Report {
    type Target = BTreeMap<&'static str, f64>;

    fn deref(&self) -> &Self::Target {
        &self.values
    }
}

impl DerefMut for Report {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.values
    }
}
