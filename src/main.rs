mod cli;
mod console;
mod core;
mod http;
mod modules;
mod reporting;
mod scanner;

use crate::cli::args::Cli;
use crate::console::{Console, Flow};
use crate::core::discovery::discover;
use crate::core::module::Catalog;
use crate::core::workspace::WorkspaceManager;
use crate::reporting::status;
use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use std::fs;
use tracing_subscriber::EnvFilter;

const BANNER: &str = r#"
  ██████╗ ███████╗██╗  ██╗
 ██╔═══██╗██╔════╝╚██╗██╔╝
 ██║   ██║███████╗ ╚███╔╝
 ██║   ██║╚════██║ ██╔██╗
 ╚██████╔╝███████║██╔╝ ██╗
  ╚═════╝ ╚══════╝╚═╝  ╚═╝

  OutSystems security testing console
  FOR AUTHORIZED TESTING ONLY
"#;

fn print_banner() {
    println!("{}", BANNER.cyan());
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    if cli.show_banner() {
        print_banner();
    }

    let workspace = WorkspaceManager::new(&cli.workspaces).with_context(|| {
        format!(
            "Cannot create workspaces directory {}",
            cli.workspaces.display()
        )
    })?;

    tracing::debug!("Workspaces directory: {}", workspace.base_dir().display());

    let catalog = Catalog::builtin();
    tracing::debug!("Built-in modules: {}", catalog.ids().collect::<Vec<_>>().join(", "));

    let discovery = discover(&cli.modules_dir, &catalog);
    for err in &discovery.errors {
        status::failure(err.to_string());
    }
    status::info(format!("{} modules loaded", discovery.registry.len()));

    let mut console = Console::new(discovery.registry, workspace);

    let mut startup = Vec::new();
    if let Some(target) = &cli.target {
        startup.push(format!("set TARGET {}", target));
    }
    if let Some(resource) = &cli.resource {
        let content = fs::read_to_string(resource)
            .with_context(|| format!("Cannot read resource file {}", resource.display()))?;
        startup.extend(content.lines().map(String::from));
    }
    startup.extend(cli.execute_commands());

    if console.run_script(startup).await == Flow::Continue {
        console.run().await?;
    }

    println!("Goodbye!");
    Ok(())
}
