use std::{
    fmt::Display,
    io::{self, BufRead, Write},
    str::FromStr,
};

use log::{info, warn};

use crate::{
    env::{
        format_actions, parse_action, DiscreteActionSpace, DiscreteStateSpace, Model, Report,
        Reporting,
    },
    error::{Error, Result},
};

use super::{
    best_action, q_value_iteration, value_iteration, ActionValueTable, DPConfig, TableKind,
    ValueTable,
};

const RULE: &str = "--------------------------------------";

/// A planning agent for environments with a fully known model
///
/// The agent owns whichever tables it has solved so far. Policies are read from
/// them explicitly, one table kind per episode. As a tabular method, a small discrete
/// state and action space is required.
#[derive(Debug, Clone, Default)]
pub struct DPAgent {
    config: DPConfig,
    v: Option<ValueTable>,
    q: Option<ActionValueTable>,
}

impl DPAgent {
    /// Initialize a new `DPAgent`
    ///
    /// **Panics** if `config` is invalid, see [`DPConfig`]
    pub fn new(config: DPConfig) -> Self {
        config.validate();
        Self {
            config,
            v: None,
            q: None,
        }
    }

    pub fn config(&self) -> &DPConfig {
        &self.config
    }

    /// Get the agent's state value table, if solved
    pub fn value_table(&self) -> Option<&ValueTable> {
        self.v.as_ref()
    }

    /// Get the agent's state-action value table, if solved
    pub fn q_table(&self) -> Option<&ActionValueTable> {
        self.q.as_ref()
    }

    /// Solve for the state value table, replacing any previous one
    pub fn value_iteration<E>(&mut self, env: &E) -> Result<&ValueTable>
    where
        E: DiscreteStateSpace + DiscreteActionSpace + Model,
        E::Action: Copy,
    {
        let solution = value_iteration(env, &self.config)?;
        Ok(&*self.v.insert(solution.table))
    }

    /// Solve for the state-action value table, replacing any previous one
    pub fn q_value_iteration<E>(&mut self, env: &E) -> Result<&ActionValueTable>
    where
        E: DiscreteStateSpace + DiscreteActionSpace + Model,
        E::Action: Copy,
    {
        let solution = q_value_iteration(env, &self.config)?;
        Ok(&*self.q.insert(solution.table))
    }

    /// Greedy action in the environment's current state according to the `kind` table
    pub fn greedy_action<E>(&self, env: &E, kind: TableKind) -> Result<E::Action>
    where
        E: DiscreteStateSpace + DiscreteActionSpace + Model,
        E::Action: Copy,
    {
        best_action(
            self.v.as_ref(),
            self.q.as_ref(),
            kind,
            env,
            env.current_state(),
        )
    }

    /// Run one interactive episode from the environment's initial state
    ///
    /// Each step suggests the greedy action from the `kind` table and reads one line
    /// from `input`: an empty line accepts the suggestion, anything else must name an
    /// action. Invalid names are rejected and asked for again. Without a solved table
    /// every action has to be typed in. Maps, prompts and the environment's report
    /// after each step go to `output`.
    ///
    /// **Returns** the environment's report for the episode, leaving it cleared
    ///
    /// **Errors** if `input` runs out before the episode terminates, or if the table
    /// does not fit the environment
    pub fn go<E, R, W>(
        &self,
        env: &mut E,
        kind: TableKind,
        input: &mut R,
        output: &mut W,
    ) -> Result<Report>
    where
        E: DiscreteStateSpace + DiscreteActionSpace + Model + Reporting + Display,
        E::Action: Copy + FromStr + PartialEq + Display,
        R: BufRead,
        W: Write,
    {
        env.reset();
        env.report().take();
        writeln!(output, "Start executing. Current map:")?;
        writeln!(output, "{env}")?;

        while env.is_active() {
            let greedy = match self.greedy_action(env, kind) {
                Ok(action) => Some(action),
                Err(err @ Error::UninitializedTable(_)) => {
                    warn!("{err}");
                    writeln!(
                        output,
                        "No optimal {kind} table was detected. Only manual execution possible."
                    )?;
                    None
                }
                Err(err) => return Err(err),
            };

            let action = self.choose(env, kind, greedy, input, output)?;
            env.step(action);

            writeln!(output, "Executed action: {action}")?;
            writeln!(output, "Episode so far: {}", env.report())?;
            writeln!(output, "{RULE}\nNew map:")?;
            writeln!(output, "{env}")?;
        }

        writeln!(output, "Found the goal! Exiting")?;
        let report = env.report().take();
        info!("Episode finished ({report})");
        Ok(report)
    }

    /// Prompt until the user accepts `greedy` or names a valid action
    fn choose<E, R, W>(
        &self,
        env: &E,
        kind: TableKind,
        greedy: Option<E::Action>,
        input: &mut R,
        output: &mut W,
    ) -> Result<E::Action>
    where
        E: DiscreteActionSpace,
        E::Action: Copy + FromStr + PartialEq + Display,
        R: BufRead,
        W: Write,
    {
        loop {
            match greedy {
                Some(action) => {
                    writeln!(output, "Greedy action ({kind} table) = {action}")?;
                    write!(
                        output,
                        "Choose an action by typing it in full, then hit enter. Just hit enter to execute the greedy action: "
                    )?;
                }
                None => write!(
                    output,
                    "Choose an action by typing it in full, then hit enter. Available are {}: ",
                    format_actions(&env.actions())
                )?,
            }
            output.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "input closed before the episode terminated",
                )
                .into());
            }

            if let (true, Some(action)) = (line.trim().is_empty(), greedy) {
                return Ok(action);
            }
            match parse_action(env, &line) {
                Ok(action) => return Ok(action),
                Err(err @ Error::InvalidAction { .. }) => writeln!(output, "{err}. Try again")?,
                Err(err) => return Err(err),
            }
        }
    }
}
