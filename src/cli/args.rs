use clap::Parser;
use std::path::PathBuf;

/// OSX – interactive security-testing console for OutSystems applications
#[derive(Parser, Debug)]
#[command(
    name = "osx",
    version,
    about = "OSX – interactive security-testing console for OutSystems applications",
    long_about = r#"
OSX is an msfconsole-style console for assessing OutSystems applications.

  • Modules are declared by definition files in the modules directory
  • Global options (TARGET, THREADS, TIMEOUT, PROXY, USER_AGENT) are shared
    by every module; module options live with the selected module
  • Setting TARGET opens a per-target workspace holding scan results,
    an activity log and an evidence directory
"#,
    after_help = r#"EXAMPLES:
  osx
  osx -t https://victim.example.com/App
  osx -t https://victim.example.com/App -x "use osscan; run; exit"
  osx -r engagement.rc --no-banner

CONSOLE COMMANDS:
  help, show modules, show options, use <name|number>, options,
  set <option> <value>, unset <option>, run, back, workspace, exit"#
)]
pub struct Cli {
    /// Directory containing module definition files
    #[arg(short = 'm', long = "modules-dir", env = "OSX_MODULES_DIR", default_value = "modules")]
    pub modules_dir: PathBuf,

    /// Base directory for per-target workspaces
    #[arg(short = 'w', long = "workspaces", env = "OSX_WORKSPACES", default_value = "workspaces")]
    pub workspaces: PathBuf,

    /// Target URL, same as `set TARGET <url>` at startup
    #[arg(short, long, env = "OSX_TARGET")]
    pub target: Option<String>,

    /// Run console commands from a file before going interactive
    #[arg(short, long)]
    pub resource: Option<PathBuf>,

    /// ';'-separated console commands run after the resource file
    #[arg(short = 'x', long = "execute")]
    pub execute: Option<String>,

    /// Skip the banner display
    #[arg(long, help_heading = "OUTPUT")]
    pub no_banner: bool,

    /// Quiet mode (no banner)
    #[arg(short, long, help_heading = "OUTPUT")]
    pub quiet: bool,

    /// Verbose output (debug level)
    #[arg(short, long, help_heading = "OUTPUT")]
    pub verbose: bool,
}

impl Cli {
    pub fn show_banner(&self) -> bool {
        !self.no_banner && !self.quiet
    }

    /// Commands given with `-x`, split on ';'
    pub fn execute_commands(&self) -> Vec<String> {
        self.execute
            .as_deref()
            .map(|cmds| {
                cmds.split(';')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }
}
