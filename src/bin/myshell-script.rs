//! myshell-script CLI
//!
//! Run `.myshell` scripts (or txtar bundles) against the builtin host shell.

use anyhow::{bail, Context};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use myshell_script::{RunConfig, ScriptRunner, Shell};

#[derive(Parser, Debug)]
#[command(name = "myshell-script")]
#[command(author = "nzinfo <li.monan@gmail.com>")]
#[command(version)]
#[command(about = "Run .myshell scripts")]
struct Cli {
    /// Script file or directory of scripts
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Only run scripts whose name contains this string
    #[arg(short = 'f', long)]
    filter: Option<String>,

    /// Verbose output: show the execution log of every script
    #[arg(short, long)]
    verbose: bool,

    /// Do not echo command output while running
    #[arg(short, long)]
    quiet: bool,

    /// Run every script in a fresh temporary directory
    #[arg(long)]
    isolate: bool,

    /// Keep temporary working directories (for debugging)
    #[arg(short = 'k', long = "keep")]
    keep: bool,

    /// Root directory for temporary working directories
    #[arg(long = "workdir")]
    workdir: Option<PathBuf>,

    /// File extensions to match
    #[arg(long = "ext", default_values = [".myshell", ".txtar"])]
    extensions: Vec<String>,

    /// Preset script variables (NAME=VALUE)
    #[arg(short = 'e', long = "var")]
    vars: Vec<String>,

    /// Show number of scripts without running
    #[arg(long = "count")]
    count: bool,

    /// List builtin commands and condition operators
    #[arg(long = "list-commands")]
    list_commands: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<bool> {
    if cli.list_commands {
        print_commands();
        return Ok(true);
    }

    let vars = cli.vars.iter()
        .map(|v| parse_var(v))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let config = RunConfig {
        path: cli.path.clone(),
        filter: cli.filter,
        workdir_root: cli.workdir,
        isolate: cli.isolate,
        preserve_work: cli.keep,
        setup: None,
        vars,
        passthrough: !cli.quiet,
        verbose: cli.verbose,
        extensions: cli.extensions,
    };

    let runner = ScriptRunner::new(config);

    if cli.count {
        let count = runner.count_scripts()
            .with_context(|| format!("cannot scan {}", cli.path.display()))?;
        println!("Found {} script(s)", count);
        return Ok(true);
    }

    let summary = runner.run_all()
        .with_context(|| format!("cannot run {}", cli.path.display()))?;

    let many = summary.scripts.len() > 1;
    for script in &summary.scripts {
        for diag in &script.diagnostics {
            eprintln!("{}", diag);
        }
        if let Some(ref err) = script.error {
            for line in err.lines() {
                eprintln!("{}", line);
            }
        }
        if (cli.verbose || !script.passed) && !script.log.is_empty() {
            eprintln!("--- log: {} ---", script.name);
            eprint!("{}", script.log);
        }
        if let Some(ref wd) = script.workdir {
            eprintln!("workdir: {}", wd.display());
        }
        if many || cli.verbose {
            let status = if script.passed { "PASS" } else { "FAIL" };
            eprintln!("{}  {} ({}ms)", status, script.name, script.duration.as_millis());
        }
    }

    if many || cli.verbose {
        eprintln!();
        eprintln!("{}", summary.summary());
    }

    Ok(summary.all_passed())
}

/// Parse a `NAME=VALUE` preset.
fn parse_var(spec: &str) -> anyhow::Result<(String, String)> {
    let Some((name, value)) = spec.split_once('=') else {
        bail!("invalid variable '{}': expected NAME=VALUE", spec);
    };
    if name.is_empty() {
        bail!("invalid variable '{}': empty name", spec);
    }
    Ok((name.to_string(), value.to_string()))
}

fn print_commands() {
    println!("Builtin commands:");
    println!();

    let shell = Shell::new();
    let mut cmds: Vec<_> = shell.commands.iter().collect();
    cmds.sort_by_key(|(name, _)| (*name).clone());

    for (name, cmd) in &cmds {
        let usage = cmd.usage();
        println!("  {:<12} {} {}", name, usage.summary, usage.args);
    }

    println!();
    println!("Condition operators (in priority order):");
    println!();

    for (token, op) in myshell_script::default_operators() {
        println!("  {:<12} {}", token, op.summary());
    }

    println!();
    println!("Anything else runs as an external program on PATH.");
}
