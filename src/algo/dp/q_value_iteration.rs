use log::info;

use crate::{
    env::{DiscreteActionSpace, DiscreteStateSpace, Model},
    error::{Error, Result},
};

use super::{sweep_until_converged, ActionValueTable, DPConfig, Solution};

/// Q-value iteration starting from an all-zero table
///
/// Every sweep backs up each state-action pair in the environment's action order:
/// `Q(s,a) = r(s,a) + gamma * max_a' Q(s',a')`.
///
/// **Panics** if `config` is invalid, see [`DPConfig`]
pub fn q_value_iteration<E>(env: &E, config: &DPConfig) -> Result<Solution<ActionValueTable>>
where
    E: DiscreteStateSpace + DiscreteActionSpace + Model,
    E::Action: Copy,
{
    let initial = ActionValueTable::zeros(env.n_states(), env.n_actions());
    q_value_iteration_from(env, config, initial)
}

/// Q-value iteration starting from `initial`
///
/// **Errors** with [`Error::TableShape`] if `initial` is not `n_states x n_actions`
pub fn q_value_iteration_from<E>(
    env: &E,
    config: &DPConfig,
    initial: ActionValueTable,
) -> Result<Solution<ActionValueTable>>
where
    E: DiscreteStateSpace + DiscreteActionSpace + Model,
    E::Action: Copy,
{
    config.validate();
    let actions = env.actions();
    let n_actions = actions.len();
    if n_actions == 0 {
        return Err(Error::EmptyActionSpace);
    }
    let n_states = env.n_states();
    let expected = n_states * n_actions;
    if initial.n_actions() != n_actions || initial.n_states() != n_states {
        return Err(Error::TableShape {
            expected,
            found: initial.values.len(),
        });
    }

    info!(
        "Starting Q-value iteration over {} state-action pairs",
        expected
    );
    let mut values = initial.values;
    let deltas = sweep_until_converged(config, &mut values, |q, i| {
        let (state, a) = (i / n_actions, i % n_actions);
        let (next_state, reward) = env.transition(state, actions[a]);
        let next = &q[next_state * n_actions..(next_state + 1) * n_actions];
        let max_next = next.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        reward + config.gamma * max_next
    })?;
    info!("Q-value iteration converged after {} sweeps", deltas.len());

    Ok(Solution {
        table: ActionValueTable {
            n_states,
            n_actions,
            values,
        },
        deltas,
    })
}

#[cfg(test)]
mod tests {
    use float_eq::assert_float_eq;
    use rstest::rstest;

    use super::*;
    use crate::{
        algo::dp::{tests::TableMdp, value_iteration, DeltaCriterion},
        env::tests::Corridor,
    };

    /// Largest violation of the Bellman optimality equation over all state-action pairs
    fn bellman_residual(env: &Corridor, q: &ActionValueTable, gamma: f64) -> f64 {
        let mut residual = 0.0_f64;
        for s in env.states() {
            for (a, action) in env.actions().into_iter().enumerate() {
                let (next, r) = env.transition(s, action);
                residual = residual.max((q[(s, a)] - (r + gamma * q.max(next))).abs());
            }
        }
        residual
    }

    #[test]
    fn corridor_action_values() {
        let env = Corridor::new(3);
        let q = q_value_iteration(&env, &DPConfig::default()).unwrap().table;
        // rows: [stay, next]
        assert_float_eq!(q.row(0).to_vec(), vec![8.0, 9.0], abs_all <= 1e-9);
        assert_float_eq!(q.row(1).to_vec(), vec![9.0, 10.0], abs_all <= 1e-9);
        assert_float_eq!(q.row(2).to_vec(), vec![0.0, 0.0], abs_all <= 1e-9);
    }

    #[rstest]
    #[case(1.0, 1e-3)]
    #[case(0.9, 1e-3)]
    #[case(0.3, 1e-6)]
    fn converged_table_satisfies_bellman_optimality(#[case] gamma: f64, #[case] theta: f64) {
        let env = Corridor::new(6);
        let config = DPConfig {
            gamma,
            theta,
            ..Default::default()
        };
        let q = q_value_iteration(&env, &config).unwrap().table;
        assert_eq!(q.n_states(), 6);
        assert_eq!(q.n_actions(), 2);
        assert!(bellman_residual(&env, &q, gamma) < theta);
    }

    #[test]
    fn max_over_actions_matches_state_values() {
        let env = Corridor::new(5);
        let config = DPConfig {
            gamma: 0.9,
            theta: 1e-9,
            ..Default::default()
        };
        let v = value_iteration(&env, &config).unwrap().table;
        let q = q_value_iteration(&env, &config).unwrap().table;
        for s in env.states() {
            assert_float_eq!(q.max(s), v[s], abs <= 1e-6);
        }
    }

    #[test]
    fn resolving_from_converged_table_is_idempotent() {
        let env = Corridor::new(4);
        let config = DPConfig::default();
        let first = q_value_iteration(&env, &config).unwrap();
        let second = q_value_iteration_from(&env, &config, first.table.clone()).unwrap();
        assert_eq!(second.sweeps(), 1);
        assert_eq!(first.table, second.table);
    }

    #[test]
    fn deltas_do_not_increase_when_discounted() {
        let env = Corridor::new(8);
        let config = DPConfig {
            gamma: 0.9,
            theta: 1e-8,
            ..Default::default()
        };
        let solution = q_value_iteration(&env, &config).unwrap();
        let deltas = solution.deltas;
        assert!(deltas.len() > 1);
        assert!(deltas.windows(2).all(|w| w[1] <= w[0]), "{deltas:?}");
    }

    #[test]
    fn decrease_criterion_stops_when_values_only_grow() {
        let env = TableMdp::rewarding_goal();
        let config = DPConfig {
            criterion: DeltaCriterion::Decrease,
            ..Default::default()
        };
        let q = q_value_iteration(&env, &config).unwrap().table;
        assert_eq!(q.row(0), &[0.0, 10.0]);
        assert_eq!(q.row(1), &[10.0, 10.0]);
    }

    #[test]
    fn diverging_values_report_non_convergence() {
        let env = TableMdp::rewarding_goal();
        let config = DPConfig {
            max_sweeps: 20,
            ..Default::default()
        };
        let err = q_value_iteration(&env, &config).unwrap_err();
        assert!(matches!(err, Error::NonConvergence { sweeps: 20, .. }));
    }

    #[test]
    fn initial_table_must_match_shape() {
        let env = Corridor::new(3);
        let err = q_value_iteration_from(&env, &DPConfig::default(), ActionValueTable::zeros(3, 3))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::TableShape {
                expected: 6,
                found: 9
            }
        ));
    }
}
