use std::{
    env,
    error::Error,
    io::{self, BufRead, Write},
    path::PathBuf,
};

use dp::{
    algo::dp::{DPAgent, DPConfig, TableKind},
    gym::GridWorld,
};
use tracing_subscriber::EnvFilter;

fn pause(input: &mut impl BufRead, message: &str) -> io::Result<()> {
    print!("{message}");
    io::stdout().flush()?;
    input.read_line(&mut String::new())?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let path = env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("demos/dp_grid_world/prison.txt"));
    let mut env = GridWorld::load(&path)?;
    let mut agent = DPAgent::new(DPConfig::default());

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();

    pause(&mut input, "Press enter to run value iteration")?;
    agent.value_iteration(&env)?;
    pause(&mut input, "Press enter to start execution of optimal policy according to V")?;
    agent.go(&mut env, TableKind::V, &mut input, &mut output)?;

    pause(&mut input, "Press enter to run Q-value iteration")?;
    agent.q_value_iteration(&env)?;
    pause(&mut input, "Press enter to start execution of optimal policy according to Q")?;
    agent.go(&mut env, TableKind::Q, &mut input, &mut output)?;

    Ok(())
}
