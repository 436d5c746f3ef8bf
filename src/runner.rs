//! Script runner
//!
//! Discovers script files (a single file or a directory tree), runs each one
//! with a fresh `State`, and reports results.
//!
//! Two file formats are accepted:
//! - plain scripts (`.myshell`), run in the current directory or an isolated
//!   temp directory, with an optional sibling `<name>.expected` transcript
//! - txtar bundles (`.txtar`), whose comment section is the script and whose
//!   files are extracted into a temp working directory first; a bundled file
//!   named `expected` holds the expected transcript

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use similar::TextDiff;
use crate::engine::Engine;
use crate::error::ScriptError;
use crate::shell::Shell;
use crate::state::State;

/// Name of the bundled file holding the expected transcript
const EXPECTED_FILE: &str = "expected";

/// Configuration for the script runner
pub struct RunConfig {
    /// Script file, or directory to scan for scripts
    pub path: PathBuf,
    /// Optional filter: only run scripts whose name contains this string
    pub filter: Option<String>,
    /// Root directory for temp working directories
    pub workdir_root: Option<PathBuf>,
    /// Run plain scripts in a fresh temp directory too
    pub isolate: bool,
    /// Preserve temp working directories after the run
    pub preserve_work: bool,
    /// Setup function called before each script
    pub setup: Option<Box<dyn Fn(&mut SetupEnv) -> anyhow::Result<()> + Send>>,
    /// Variables every script starts with
    pub vars: Vec<(String, String)>,
    /// Echo command output to the process stdout while running
    pub passthrough: bool,
    /// Verbose mode: keep the per-line execution log
    pub verbose: bool,
    /// File extensions to scan
    pub extensions: Vec<String>,
}

/// Environment available during setup
pub struct SetupEnv {
    /// The working directory for the script
    pub work_dir: PathBuf,
    /// Variables to preset
    pub vars: Vec<(String, String)>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("."),
            filter: None,
            workdir_root: None,
            isolate: false,
            preserve_work: false,
            setup: None,
            vars: Vec::new(),
            passthrough: false,
            verbose: false,
            extensions: vec![".myshell".into(), ".txtar".into()],
        }
    }
}

/// Result of running all scripts
#[derive(Debug)]
pub struct RunSummary {
    /// Individual script results
    pub scripts: Vec<ScriptResult>,
    /// Total duration
    pub duration: Duration,
}

impl RunSummary {
    /// Check if every script passed
    pub fn all_passed(&self) -> bool {
        self.scripts.iter().all(|s| s.passed)
    }

    /// Count passed scripts
    pub fn passed_count(&self) -> usize {
        self.scripts.iter().filter(|s| s.passed).count()
    }

    /// Count failed scripts
    pub fn failed_count(&self) -> usize {
        self.scripts.iter().filter(|s| !s.passed).count()
    }

    /// Format a summary line
    pub fn summary(&self) -> String {
        format!(
            "{} passed, {} failed ({}ms)",
            self.passed_count(),
            self.failed_count(),
            self.duration.as_millis(),
        )
    }
}

/// Result of a single script run
#[derive(Debug)]
pub struct ScriptResult {
    /// Script name (filename without extension)
    pub name: String,
    /// Source file path
    pub file: PathBuf,
    /// No diagnostics, no fatal error, transcript matched
    pub passed: bool,
    /// Fatal error or transcript mismatch
    pub error: Option<String>,
    /// Non-fatal errors reported during the run
    pub diagnostics: Vec<ScriptError>,
    /// Stdout of every forwarded line
    pub output: String,
    /// Execution log
    pub log: String,
    /// Duration
    pub duration: Duration,
    /// Working directory (if a temp dir was preserved)
    pub workdir: Option<PathBuf>,
}

/// A script loaded from disk, ready to run
struct Prepared {
    script: String,
    expected: Option<String>,
    workdir: PathBuf,
    tmpdir: Option<tempfile::TempDir>,
}

/// The script runner
pub struct ScriptRunner {
    engine: Engine,
    shell: Shell,
    config: RunConfig,
}

impl ScriptRunner {
    /// Create a new runner with the given config
    pub fn new(config: RunConfig) -> Self {
        Self::with_parts(Engine::new(), Shell::new(), config)
    }

    /// Create a new runner with a custom engine and shell
    pub fn with_parts(engine: Engine, mut shell: Shell, config: RunConfig) -> Self {
        shell.passthrough = config.passthrough;
        let mut engine = engine;
        engine.quiet = engine.quiet || !config.verbose;
        Self { engine, shell, config }
    }

    /// Get mutable reference to the shell (for registering custom commands)
    pub fn shell_mut(&mut self) -> &mut Shell {
        &mut self.shell
    }

    /// Get mutable reference to the engine (for registering custom operators)
    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    /// Discover script files at the configured path
    pub fn discover(&self) -> Result<Vec<PathBuf>, std::io::Error> {
        let mut files = Vec::new();
        let path = &self.config.path;

        if !path.exists() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("script path not found: {}", path.display()),
            ));
        }

        if path.is_file() {
            files.push(path.clone());
            return Ok(files);
        }

        self.scan_dir(path, &mut files)?;
        files.sort();
        Ok(files)
    }

    fn scan_dir(&self, dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), std::io::Error> {
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();

            if path.is_dir() {
                self.scan_dir(&path, files)?;
            } else if self.is_script_file(&path) {
                if let Some(ref filter) = self.config.filter {
                    if !script_name(&path).contains(filter.as_str()) {
                        continue;
                    }
                }
                files.push(path);
            }
        }
        Ok(())
    }

    fn is_script_file(&self, path: &Path) -> bool {
        match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => self.config.extensions.iter().any(|ext| name.ends_with(ext.as_str())),
            None => false,
        }
    }

    /// Run all discovered scripts
    pub fn run_all(&self) -> Result<RunSummary, std::io::Error> {
        let start = Instant::now();
        let scripts = self.discover()?
            .iter()
            .map(|file| self.run_one(file))
            .collect();

        Ok(RunSummary {
            scripts,
            duration: start.elapsed(),
        })
    }

    /// Count the number of scripts that would be run
    pub fn count_scripts(&self) -> Result<usize, std::io::Error> {
        Ok(self.discover()?.len())
    }

    /// Run a single script file
    pub fn run_one(&self, file: &Path) -> ScriptResult {
        let start = Instant::now();
        let name = script_name(file);

        let prepared = match self.prepare(file) {
            Ok(p) => p,
            Err(error) => {
                return ScriptResult {
                    name,
                    file: file.to_path_buf(),
                    passed: false,
                    error: Some(error),
                    diagnostics: Vec::new(),
                    output: String::new(),
                    log: String::new(),
                    duration: start.elapsed(),
                    workdir: None,
                };
            }
        };

        let mut state = State::new(prepared.workdir.clone());
        let error = self.execute(file, &prepared, &mut state);
        let passed = error.is_none() && state.diagnostics.is_empty();

        let workdir = match prepared.tmpdir {
            Some(tmpdir) if self.config.preserve_work || !passed => {
                let path = tmpdir.path().to_path_buf();
                std::mem::forget(tmpdir); // leak to preserve
                Some(path)
            }
            _ => None,
        };

        ScriptResult {
            name,
            file: file.to_path_buf(),
            passed,
            error,
            diagnostics: state.diagnostics,
            output: state.output,
            log: state.log,
            duration: start.elapsed(),
            workdir,
        }
    }

    /// Load the script and set up its working directory.
    fn prepare(&self, file: &Path) -> Result<Prepared, String> {
        let data = std::fs::read_to_string(file).map_err(|e| {
            ScriptError::new(crate::error::ErrorKind::FileError,
                format!("cannot read script {}: {}", file.display(), e)).to_string()
        })?;

        if file.extension().and_then(|e| e.to_str()) == Some("txtar") {
            return self.prepare_bundle(file, &data);
        }

        let expected_path = file.with_extension("expected");
        let expected = if expected_path.is_file() {
            let content = std::fs::read_to_string(&expected_path)
                .map_err(|e| format!("failed to read {}: {}", expected_path.display(), e))?;
            Some(content.replace("\r\n", "\n"))
        } else {
            None
        };

        let (workdir, tmpdir) = if self.config.isolate {
            let tmpdir = self.create_workdir(&script_name(file))
                .map_err(|e| format!("failed to create workdir: {}", e))?;
            (tmpdir.path().to_path_buf(), Some(tmpdir))
        } else {
            let cwd = std::env::current_dir()
                .map_err(|e| format!("failed to get current directory: {}", e))?;
            (cwd, None)
        };

        Ok(Prepared { script: data, expected, workdir, tmpdir })
    }

    /// Decode a txtar bundle and extract its files into a temp workdir.
    fn prepare_bundle(&self, file: &Path, data: &str) -> Result<Prepared, String> {
        let archive = emx_txtar::Decoder::new().decode(data)
            .map_err(|e| format!("failed to parse txtar: {}", e))?;

        let tmpdir = self.create_workdir(&script_name(file))
            .map_err(|e| format!("failed to create workdir: {}", e))?;
        let workdir = tmpdir.path().to_path_buf();

        let scratch = State::new(workdir.clone());
        let mut expected = None;
        for entry in &archive.files {
            let path = scratch.resolve_path(&entry.name);
            if !path.starts_with(&workdir) {
                return Err(format!("archive file '{}' escapes the working directory", entry.name));
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| format!("failed to extract {}: {}", entry.name, e))?;
            }
            std::fs::write(&path, &entry.data)
                .map_err(|e| format!("failed to extract {}: {}", entry.name, e))?;

            if entry.name == EXPECTED_FILE {
                let content = scratch.read_file(EXPECTED_FILE)
                    .map_err(|e| format!("failed to read {}: {}", EXPECTED_FILE, e))?;
                expected = Some(content);
            }
        }

        Ok(Prepared {
            script: archive.comment.to_string(),
            expected,
            workdir,
            tmpdir: Some(tmpdir),
        })
    }

    /// Run setup and the script. Returns an error message if the case failed
    /// for a reason other than diagnostics.
    fn execute(&self, file: &Path, prepared: &Prepared, state: &mut State) -> Option<String> {
        for (k, v) in &self.config.vars {
            state.set_var(k.as_str(), v.as_str());
        }

        if let Some(ref setup) = self.config.setup {
            let mut env = SetupEnv {
                work_dir: prepared.workdir.clone(),
                vars: Vec::new(),
            };
            if let Err(e) = setup(&mut env) {
                return Some(format!("setup failed: {:#}", e));
            }
            for (k, v) in env.vars {
                state.set_var(k, v);
            }
        }

        let filename = file.to_string_lossy();
        self.engine.execute(&self.shell, state, &prepared.script, &filename);

        let expected = prepared.expected.as_deref()?;
        if state.output == expected {
            return None;
        }
        let diff = TextDiff::from_lines(expected, state.output.as_str())
            .unified_diff()
            .header("expected", "actual")
            .to_string();
        Some(format!("output does not match expected\n{}", diff))
    }

    fn create_workdir(&self, name: &str) -> Result<tempfile::TempDir, std::io::Error> {
        let prefix = format!("myshell-{}-", name);
        if let Some(ref root) = self.config.workdir_root {
            std::fs::create_dir_all(root)?;
            tempfile::Builder::new()
                .prefix(&prefix)
                .tempdir_in(root)
        } else {
            tempfile::Builder::new()
                .prefix(&prefix)
                .tempdir()
        }
    }
}

/// Script name: file name up to the first `.`
fn script_name(path: &Path) -> String {
    path.file_name()
        .and_then(|s| s.to_str())
        .and_then(|s| s.split('.').next())
        .unwrap_or("unknown")
        .to_string()
}

/// Builder API for convenient runner construction
pub struct RunnerBuilder {
    config: RunConfig,
    engine: Option<Engine>,
    shell: Option<Shell>,
}

impl RunnerBuilder {
    /// Start building a runner for the given file or directory
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            config: RunConfig {
                path: path.into(),
                ..Default::default()
            },
            engine: None,
            shell: None,
        }
    }

    /// Set the name filter
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.config.filter = Some(filter.into());
        self
    }

    /// Set the root for temp working directories
    pub fn workdir_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.workdir_root = Some(root.into());
        self
    }

    /// Run plain scripts in isolated temp directories
    pub fn isolate(mut self, isolate: bool) -> Self {
        self.config.isolate = isolate;
        self
    }

    /// Preserve temp working directories
    pub fn preserve_work(mut self, preserve: bool) -> Self {
        self.config.preserve_work = preserve;
        self
    }

    /// Preset a variable for every script
    pub fn var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.vars.push((name.into(), value.into()));
        self
    }

    /// Set a setup hook
    pub fn setup(mut self, setup: impl Fn(&mut SetupEnv) -> anyhow::Result<()> + Send + 'static) -> Self {
        self.config.setup = Some(Box::new(setup));
        self
    }

    /// Enable verbose logging
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.config.verbose = verbose;
        self
    }

    /// Set file extensions to scan
    pub fn extensions(mut self, exts: Vec<String>) -> Self {
        self.config.extensions = exts;
        self
    }

    /// Use a custom engine
    pub fn engine(mut self, engine: Engine) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Use a custom shell
    pub fn shell(mut self, shell: Shell) -> Self {
        self.shell = Some(shell);
        self
    }

    /// Build and return the runner
    pub fn build(self) -> ScriptRunner {
        ScriptRunner::with_parts(
            self.engine.unwrap_or_default(),
            self.shell.unwrap_or_default(),
            self.config,
        )
    }

    /// Build and run all scripts
    pub fn run(self) -> Result<RunSummary, std::io::Error> {
        self.build().run_all()
    }
}

/// Convenience function: create a runner builder for a file or directory
pub fn run(path: impl Into<PathBuf>) -> RunnerBuilder {
    RunnerBuilder::new(path)
}

/// Run scripts and integrate with `#[test]` by panicking on failure.
///
/// Usage in cargo tests:
/// ```rust,ignore
/// #[test]
/// fn scripts() {
///     myshell_script::run_and_assert("tests/scripts");
/// }
/// ```
pub fn run_and_assert(path: impl Into<PathBuf>) {
    run_and_assert_with(path, |_| {});
}

/// Like `run_and_assert` but allows shell customization.
pub fn run_and_assert_with(path: impl Into<PathBuf>, customize: impl FnOnce(&mut Shell)) {
    let config = RunConfig {
        path: path.into(),
        isolate: true,
        verbose: std::env::var("MYSHELL_SCRIPT_VERBOSE").is_ok(),
        preserve_work: std::env::var("MYSHELL_SCRIPT_WORK").is_ok(),
        ..Default::default()
    };

    let mut runner = ScriptRunner::new(config);
    customize(runner.shell_mut());
    let summary = runner.run_all().expect("failed to run scripts");

    for script in &summary.scripts {
        if script.passed {
            eprintln!("PASS  {} ({}ms)", script.name, script.duration.as_millis());
            continue;
        }
        eprintln!("FAIL  {}", script.name);
        if let Some(ref err) = script.error {
            eprintln!("  {}", err);
        }
        for diag in &script.diagnostics {
            eprintln!("  {}", diag);
        }
        if !script.log.is_empty() {
            eprintln!("  --- log ---");
            for line in script.log.lines() {
                eprintln!("  {}", line);
            }
        }
        if let Some(ref wd) = script.workdir {
            eprintln!("  workdir: {}", wd.display());
        }
    }

    eprintln!("\n{}", summary.summary());

    if !summary.all_passed() {
        panic!("{} script(s) failed", summary.failed_count());
    }
}
