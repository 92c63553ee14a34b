use log::info;

use crate::{
    env::{DiscreteActionSpace, DiscreteStateSpace, Model},
    error::{Error, Result},
};

use super::{sweep_until_converged, DPConfig, Solution, ValueTable};

/// Value iteration starting from an all-zero table
///
/// Every sweep applies the Bellman optimality backup
/// `V(s) = max_a [r(s,a) + gamma * V(s')]` to each state until the largest change
/// in a sweep is below `theta`.
///
/// **Panics** if `config` is invalid, see [`DPConfig`]
pub fn value_iteration<E>(env: &E, config: &DPConfig) -> Result<Solution<ValueTable>>
where
    E: DiscreteStateSpace + DiscreteActionSpace + Model,
    E::Action: Copy,
{
    value_iteration_from(env, config, ValueTable::zeros(env.n_states()))
}

/// Value iteration starting from `initial`
///
/// **Errors** with [`Error::TableShape`] if `initial` does not have one entry per state
pub fn value_iteration_from<E>(
    env: &E,
    config: &DPConfig,
    initial: ValueTable,
) -> Result<Solution<ValueTable>>
where
    E: DiscreteStateSpace + DiscreteActionSpace + Model,
    E::Action: Copy,
{
    config.validate();
    let actions = env.actions();
    if actions.is_empty() {
        return Err(Error::EmptyActionSpace);
    }
    if initial.len() != env.n_states() {
        return Err(Error::TableShape {
            expected: env.n_states(),
            found: initial.len(),
        });
    }

    info!("Starting value iteration over {} states", env.n_states());
    let mut values = initial.0;
    let deltas = sweep_until_converged(config, &mut values, |v, state| {
        actions
            .iter()
            .map(|&action| {
                let (next_state, reward) = env.transition(state, action);
                reward + config.gamma * v[next_state]
            })
            .fold(f64::NEG_INFINITY, f64::max)
    })?;
    info!("Value iteration converged after {} sweeps", deltas.len());

    Ok(Solution {
        table: ValueTable(values),
        deltas,
    })
}
