mod cli;
mod paths;
mod run;
mod settings;

use anyhow::{Context, Result};
use cli::{Command, ConfigAction, RunArgs};
use paths::AppPaths;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Some(Command::Config(config_cmd)) => handle_config_command(config_cmd.action, &cli.run),
        None => run::run(cli.run),
    }
}

fn handle_config_command(action: ConfigAction, args: &RunArgs) -> Result<()> {
    let paths = AppPaths::discover()?;
    let path = run::config_path(args, &paths);

    match action {
        ConfigAction::Where => {
            println!("Configuration:");
            println!("  config dir:  {}", paths.config_dir().display());
            println!(
                "  config file: {} ({})",
                path.display(),
                if path.exists() { "present" } else { "missing" }
            );
            Ok(())
        }
        ConfigAction::Show => {
            let config = run::effective_config(args, &path)?;
            let rendered = config
                .redacted()
                .to_toml_string()
                .context("failed to render configuration")?;
            print!("{rendered}");
            Ok(())
        }
    }
}
