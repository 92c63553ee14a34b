//! Greedy action selection from a solved table
//!
//! Both variants scan actions in the environment's order and keep the first action
//! with the strictly greatest value, so earlier actions win ties. Any action whose
//! transition yields a positive immediate reward is taken as goal-reaching and
//! returned right away, regardless of how it ranks by value.

use crate::{
    env::{DiscreteActionSpace, DiscreteStateSpace, Model},
    error::{Error, Result},
};

use super::{ActionValueTable, TableKind, ValueTable};

/// Greedy action in `state` according to the state value table `v`
///
/// **Errors** with [`Error::TableShape`] if `v` was not solved for an environment of
/// this size, or [`Error::EmptyActionSpace`] if there is nothing to choose from
pub fn greedy_from_v<E>(v: &ValueTable, env: &E, state: usize) -> Result<E::Action>
where
    E: DiscreteStateSpace + DiscreteActionSpace + Model,
    E::Action: Copy,
{
    if v.len() != env.n_states() {
        return Err(Error::TableShape {
            expected: env.n_states(),
            found: v.len(),
        });
    }

    let mut best: Option<(E::Action, f64)> = None;
    for action in env.actions() {
        let (next_state, reward) = env.transition(state, action);
        if reward > 0.0 {
            return Ok(action);
        }
        let value = v[next_state];
        if best.map_or(true, |(_, best_value)| value > best_value) {
            best = Some((action, value));
        }
    }
    best.map(|(action, _)| action).ok_or(Error::EmptyActionSpace)
}

/// Greedy action in `state` according to the state-action value table `q`
///
/// **Errors** with [`Error::TableShape`] unless `q` has one row per state and one
/// column per action of `env`, or [`Error::EmptyActionSpace`] if there is nothing to
/// choose from
pub fn greedy_from_q<E>(q: &ActionValueTable, env: &E, state: usize) -> Result<E::Action>
where
    E: DiscreteStateSpace + DiscreteActionSpace + Model,
    E::Action: Copy,
{
    let actions = env.actions();
    if q.n_actions() != actions.len() || q.n_states() != env.n_states() {
        return Err(Error::TableShape {
            expected: env.n_states() * actions.len(),
            found: q.n_states() * q.n_actions(),
        });
    }

    let mut best = *actions.first().ok_or(Error::EmptyActionSpace)?;
    let mut best_value = q[(state, 0)];
    for (a, &action) in actions.iter().enumerate() {
        let (_, reward) = env.transition(state, action);
        if reward > 0.0 {
            return Ok(action);
        }
        if q[(state, a)] > best_value {
            best = action;
            best_value = q[(state, a)];
        }
    }
    Ok(best)
}

/// Greedy action in `state` read from the table of the requested `kind`
///
/// **Errors** with [`Error::UninitializedTable`] if that table has not been solved,
/// so the caller can fall back to manual selection. Shape errors are passed on from
/// [`greedy_from_v`] and [`greedy_from_q`].
pub fn best_action<E>(
    v: Option<&ValueTable>,
    q: Option<&ActionValueTable>,
    kind: TableKind,
    env: &E,
    state: usize,
) -> Result<E::Action>
where
    E: DiscreteStateSpace + DiscreteActionSpace + Model,
    E::Action: Copy,
{
    match kind {
        TableKind::V => greedy_from_v(v.ok_or(Error::UninitializedTable(kind))?, env, state),
        TableKind::Q => greedy_from_q(q.ok_or(Error::UninitializedTable(kind))?, env, state),
    }
}
