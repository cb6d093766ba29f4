//! Interactive console (msfconsole style)
//!
//! The console is a two-state machine: no module selected, or one module
//! selected together with a working copy of its options. Global options live
//! for the whole session; setting `TARGET` opens the matching workspace.

pub mod command;
pub mod table;

use crate::console::command::{Command, ShowTarget, COMMAND_WORDS};
use crate::core::error::ConsoleError;
use crate::core::options::{canonical, resolve, validate_required, OptionSet, TARGET};
use crate::core::registry::ModuleRegistry;
use crate::core::workspace::WorkspaceManager;
use crate::reporting::status;
use futures::FutureExt;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Context, Editor, Helper, Highlighter, Hinter, Validator};
use std::any::Any;
use std::panic::AssertUnwindSafe;

const PROMPT_NAME: &str = "osx";

/// What the caller should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

#[derive(Debug)]
enum State {
    NoModuleSelected,
    ModuleSelected { name: String, options: OptionSet },
}

pub struct Console {
    registry: ModuleRegistry,
    globals: OptionSet,
    state: State,
    workspace: WorkspaceManager,
}

impl Console {
    pub fn new(registry: ModuleRegistry, workspace: WorkspaceManager) -> Self {
        Self {
            registry,
            globals: OptionSet::globals(),
            state: State::NoModuleSelected,
            workspace,
        }
    }

    pub fn prompt(&self) -> String {
        match self.current_module() {
            Some(name) => format!("{} {} > ", PROMPT_NAME, name),
            None => format!("{} > ", PROMPT_NAME),
        }
    }

    pub fn current_module(&self) -> Option<&str> {
        match &self.state {
            State::ModuleSelected { name, .. } => Some(name),
            State::NoModuleSelected => None,
        }
    }

    pub fn globals(&self) -> &OptionSet {
        &self.globals
    }

    pub fn module_options(&self) -> Option<&OptionSet> {
        match &self.state {
            State::ModuleSelected { options, .. } => Some(options),
            State::NoModuleSelected => None,
        }
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    #[cfg(test)]
    pub fn workspace(&self) -> &WorkspaceManager {
        &self.workspace
    }

    /// Parse and apply one command line.
    pub async fn execute(&mut self, line: &str) -> Result<Flow, ConsoleError> {
        match Command::parse(line)? {
            Command::Empty => {}
            Command::Help => println!("{}", table::help()),
            Command::Show(ShowTarget::Modules) => println!("{}", table::modules(&self.registry)),
            Command::Show(ShowTarget::Options) => {
                let module = self.current_module().zip(self.module_options());
                println!("{}", table::options(&self.globals, module));
            }
            Command::Use(identifier) => self.use_module(&identifier)?,
            Command::Set { name, value } => self.set_option(&name, &value)?,
            Command::Unset(name) => self.unset_option(&name)?,
            Command::Run => self.run_module().await?,
            Command::Back => self.back()?,
            Command::Workspace => self.show_workspace(),
            Command::Exit => return Ok(Flow::Exit),
        }
        Ok(Flow::Continue)
    }

    fn use_module(&mut self, identifier: &str) -> Result<(), ConsoleError> {
        let descriptor = self.registry.lookup(identifier)?;
        let name = descriptor.name.clone();
        let options = descriptor.options.clone();

        status::info(format!("Using module: {}", name));
        tracing::debug!("Selected module {}", name);
        self.state = State::ModuleSelected { name, options };
        Ok(())
    }

    /// Global scope first, then the selected module's working copy.
    /// A TARGET only takes effect once its workspace exists.
    fn set_option(&mut self, name: &str, value: &str) -> Result<(), ConsoleError> {
        if canonical(name) == TARGET {
            let path = self.workspace.create_workspace(value)?;
            self.globals.set_value(name, value);
            println!("{} => {}", name, value);
            status::info(format!("Workspace created: {}", path.display()));
            self.log(&format!("Target set to: {}", value));
            return Ok(());
        }

        if self.globals.set_value(name, value) {
            println!("{} => {}", name, value);
            return Ok(());
        }

        if let State::ModuleSelected { options, .. } = &mut self.state {
            if options.set_value(name, value) {
                println!("{} => {}", name, value);
                return Ok(());
            }
        }

        Err(ConsoleError::UnknownOption(name.to_string()))
    }

    fn unset_option(&mut self, name: &str) -> Result<(), ConsoleError> {
        let found = self.globals.set_value(name, "")
            || match &mut self.state {
                State::ModuleSelected { options, .. } => options.set_value(name, ""),
                State::NoModuleSelected => false,
            };

        if !found {
            return Err(ConsoleError::UnknownOption(name.to_string()));
        }
        println!("Unsetting {}...", name);
        Ok(())
    }

    fn back(&mut self) -> Result<(), ConsoleError> {
        match self.state {
            State::NoModuleSelected => Err(ConsoleError::NoModuleSelected),
            State::ModuleSelected { .. } => {
                self.state = State::NoModuleSelected;
                Ok(())
            }
        }
    }

    /// Validate, resolve and run the selected module. Failures and panics
    /// are turned into `ConsoleError::Execution`; the selection is kept.
    async fn run_module(&mut self) -> Result<(), ConsoleError> {
        let State::ModuleSelected { name, options } = &self.state else {
            return Err(ConsoleError::NoModuleSelected);
        };

        let missing = validate_required(&self.globals, options);
        if !missing.is_empty() {
            return Err(ConsoleError::Validation { missing });
        }

        let descriptor = self
            .registry
            .get(name)
            .ok_or_else(|| ConsoleError::InvalidModule(name.clone()))?;
        let config = resolve(&self.globals, options);
        let entry = descriptor.entry.clone();
        let name = name.clone();

        status::info(format!("Running module: {}", name));
        self.log(&format!("Started module: {}", name));

        let outcome = AssertUnwindSafe(entry.run(config, &self.workspace))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                Err(anyhow::anyhow!("module panicked: {}", panic_message(panic.as_ref())))
            });

        match outcome {
            Ok(()) => {
                self.log(&format!("Completed module: {}", name));
                status::success("Module execution completed");
                Ok(())
            }
            Err(source) => {
                tracing::debug!("Module {} failed: {:?}", name, source);
                self.log(&format!("ExecutionError: module {} failed - {:#}", name, source));
                Err(ConsoleError::Execution {
                    module: name,
                    source,
                })
            }
        }
    }

    fn show_workspace(&self) {
        match self.workspace.summary() {
            Some(summary) => {
                status::info(format!("Current workspace: {}", summary.path.display()));
                match self.workspace.info() {
                    Ok(Some(info)) => {
                        println!("    Target: {}", info.target_url);
                        println!("    Created: {}", info.created);
                        println!("    Scans performed: {}", info.scans_performed.len());
                    }
                    Ok(None) => {}
                    Err(e) => tracing::warn!("{}", e),
                }
                println!("    Scan results: {} files", summary.scan_files);
                println!("    Log files: {} files", summary.log_files);
            }
            None => status::warning("No workspace active (set TARGET first)"),
        }
    }

    /// Activity logging never interrupts a command.
    fn log(&self, message: &str) {
        if let Err(e) = self.workspace.log_activity(message) {
            tracing::warn!("Could not write activity log: {}", e);
        }
    }

    /// Feed non-interactive commands through `execute`, echoing each after the
    /// prompt. Blank lines and `#` comments are skipped.
    pub async fn run_script<I, S>(&mut self, lines: I) -> Flow
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for line in lines {
            let line = line.as_ref().trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            println!("{}{}", self.prompt(), line);
            match self.execute(line).await {
                Ok(Flow::Exit) => return Flow::Exit,
                Ok(Flow::Continue) => {}
                Err(e) => report(&e),
            }
        }
        Flow::Continue
    }

    /// Interactive loop until `exit` or end of input.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        let mut editor: Editor<ConsoleHelper, DefaultHistory> = Editor::new()?;
        editor.set_helper(Some(ConsoleHelper::new(self.registry(), self.globals())));

        loop {
            match editor.readline(&self.prompt()) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    if let Err(e) = editor.add_history_entry(line) {
                        tracing::debug!("History not updated: {}", e);
                    }
                    match self.execute(line).await {
                        Ok(Flow::Exit) => break,
                        Ok(Flow::Continue) => {}
                        Err(e) => report(&e),
                    }
                }
                Err(ReadlineError::Interrupted) => status::warning("Use 'exit' to quit"),
                Err(ReadlineError::Eof) => break,
                Err(e) => return Err(e.into()),
            }
        }

        Ok(())
    }
}

fn report(err: &ConsoleError) {
    status::failure(err.to_string());
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Tab completion over command words, module names and option names.
#[derive(Helper, Hinter, Highlighter, Validator)]
pub struct ConsoleHelper {
    modules: Vec<String>,
    options: Vec<String>,
}

impl ConsoleHelper {
    pub fn new(registry: &ModuleRegistry, globals: &OptionSet) -> Self {
        let mut options: Vec<String> = globals.names().map(String::from).collect();
        for module in registry.iter() {
            for name in module.options.names() {
                if !options.iter().any(|o| o == name) {
                    options.push(name.to_string());
                }
            }
        }

        Self {
            modules: registry.names().map(String::from).collect(),
            options,
        }
    }

    /// Start of the word under the cursor and its possible completions
    pub fn candidates(&self, line: &str, pos: usize) -> (usize, Vec<String>) {
        let head = &line[..pos];
        let start = head.rfind(char::is_whitespace).map(|i| i + 1).unwrap_or(0);
        let word = &head[start..];

        let pool: Vec<&str> = if start == 0 {
            COMMAND_WORDS.to_vec()
        } else {
            match head.split_whitespace().next().map(|w| w.to_lowercase()) {
                Some(cmd) if cmd == "use" => self.modules.iter().map(String::as_str).collect(),
                Some(cmd) if cmd == "set" || cmd == "unset" => {
                    self.options.iter().map(String::as_str).collect()
                }
                Some(cmd) if cmd == "show" => vec!["modules", "options"],
                _ => Vec::new(),
            }
        };

        let lower = word.to_lowercase();
        let matches = pool
            .into_iter()
            .filter(|c| c.to_lowercase().starts_with(&lower))
            .map(String::from)
            .collect();
        (start, matches)
    }
}

impl Completer for ConsoleHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (start, matches) = self.candidates(line, pos);
        let pairs = matches
            .into_iter()
            .map(|m| Pair {
                display: m.clone(),
                replacement: m,
            })
            .collect();
        Ok((start, pairs))
    }
}
