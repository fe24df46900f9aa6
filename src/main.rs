mod cli;

use clap::Parser;
use color_eyre::eyre::Result;
use tracing_subscriber::EnvFilter;

use caasp_env::{Role, SshSettings, output};
use cli::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let ssh = SshSettings::resolve(cli.ssh_user, &cli.ssh_key)?;
    let environment = caasp_env::generate(&cli.state, &ssh)?;
    let rendered = output::render(&environment, cli.format)?;

    tracing::info!(
        state = %cli.state.display(),
        masters = environment.count(Role::Master),
        workers = environment.count(Role::Worker),
        "environment generated"
    );

    print!("{}", rendered);

    Ok(())
}
