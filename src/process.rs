//! Child process execution with live classification of tool output.
//!
//! Every line the tool writes (stdout and stderr, merged as produced) lands
//! verbatim in a log file inside the working directory. On the console the
//! lines are either echoed or condensed into a per-step spinner, with error
//! and warning lines surfaced through `tracing`.

use std::ffi::OsStr;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use tracing::{debug, error, info, warn};

use crate::context::ExecutionContext;
use crate::error::{CancelReason, FlowError};
use crate::tools::resolve_program;

/// Nominal upper bound for one tool invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2 * 60 * 60);

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const TERMINATE_GRACE: Duration = Duration::from_secs(3);

fn line_regex(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .expect("line classifier pattern must compile")
}

static ENABLE_ECHO: Lazy<Regex> = Lazy::new(|| line_regex(r"^={12}=*\( \*ENABLE ECHO\* \)={12}=*"));
static DISABLE_ECHO: Lazy<Regex> =
    Lazy::new(|| line_regex(r"^={12}=*\( \*DISABLE ECHO\* \)={12}=*"));
static STEP: Lazy<Regex> = Lazy::new(|| line_regex(r"^={12}=*\(\s*(?P<step>[^)]+?)\s*\)={12}=*"));
static ERROR: Lazy<Regex> = Lazy::new(|| line_regex(r"^\s*error:?(?:\s|$)"));
static WARNING: Lazy<Regex> = Lazy::new(|| line_regex(r"^\s*warning:?(?:\s|$)"));
static CRITICAL_WARNING: Lazy<Regex> =
    Lazy::new(|| line_regex(r"^\s*critical\s+warning:?(?:\s|$)"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass<'a> {
    EnableEcho,
    DisableEcho,
    Step(&'a str),
    Error,
    Warning,
    CriticalWarning,
    Output,
}

/// Classifies one line of tool output. Earlier rules win.
pub fn classify(line: &str) -> LineClass<'_> {
    if ENABLE_ECHO.is_match(line) {
        return LineClass::EnableEcho;
    }
    if DISABLE_ECHO.is_match(line) {
        return LineClass::DisableEcho;
    }
    if let Some(step) = STEP.captures(line).and_then(|caps| caps.name("step")) {
        return LineClass::Step(step.as_str());
    }
    if ERROR.is_match(line) {
        LineClass::Error
    } else if WARNING.is_match(line) {
        LineClass::Warning
    } else if CRITICAL_WARNING.is_match(line) {
        LineClass::CriticalWarning
    } else {
        LineClass::Output
    }
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Turn a non-zero exit into [`FlowError::NonZeroExit`].
    pub check: bool,
    /// Echo every line regardless of the echo markers.
    pub echo: bool,
    /// Label of the spinner shown before the first step marker.
    pub initial_step: Option<String>,
    pub timeout: Option<Duration>,
    /// Log file, relative to the working directory. Defaults to
    /// `<program>_stdout.log`.
    pub log_file: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            check: true,
            echo: false,
            initial_step: None,
            timeout: Some(DEFAULT_TIMEOUT),
            log_file: None,
            env: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExecutionReport {
    pub program: String,
    /// `None` when the child was ended by a signal.
    pub exit_code: Option<i32>,
    pub duration: Duration,
    pub log_file: PathBuf,
    pub steps: Vec<String>,
    pub errors: usize,
    pub critical_warnings: usize,
    pub warnings: usize,
    pub lines: usize,
}

impl ExecutionReport {
    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

pub struct ProcessRunner<'a> {
    ctx: &'a ExecutionContext,
    cwd: PathBuf,
}

impl<'a> ProcessRunner<'a> {
    pub fn new(ctx: &'a ExecutionContext, cwd: impl Into<PathBuf>) -> Self {
        Self {
            ctx,
            cwd: cwd.into(),
        }
    }

    pub fn run<S: AsRef<OsStr>>(
        &self,
        program: &str,
        args: &[S],
        options: &RunOptions,
    ) -> Result<ExecutionReport, FlowError> {
        let resolved = resolve_program(program, &self.ctx.tools)?;
        let name = Path::new(program)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| program.to_string());
        let log_path = self.cwd.join(
            options
                .log_file
                .clone()
                .unwrap_or_else(|| PathBuf::from(format!("{name}_stdout.log"))),
        );
        let log = File::create(&log_path).map_err(|error| FlowError::io(&log_path, error))?;
        let mut log = BufWriter::new(log);

        let mut command = Command::new(&resolved);
        command
            .args(args)
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (key, value) in &options.env {
            command.env(key, value);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            // Own process group, so cleanup reaches whatever the tool forks.
            command.process_group(0);
        }
        debug!(program = %resolved.display(), cwd = %self.cwd.display(), "spawning");
        info!("Running `{name}` in {}", self.cwd.display());
        info!("Logging to {}", log_path.display());

        let mut child = command.spawn().map_err(|error| match error.kind() {
            ErrorKind::NotFound | ErrorKind::PermissionDenied => FlowError::ExecutableNotFound {
                program: resolved.display().to_string(),
            },
            _ => FlowError::io(&resolved, error),
        })?;

        let (tx, rx) = mpsc::channel();
        let mut readers = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_reader(stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_reader(stderr, tx.clone()));
        }
        drop(tx);
        let mut guard = ChildGuard::new(child);

        let started = Instant::now();
        let interrupted = || -> Option<CancelReason> {
            if self.ctx.cancel.is_cancelled() {
                return Some(CancelReason::Interrupted);
            }
            match options.timeout {
                Some(limit) if started.elapsed() >= limit => Some(CancelReason::Timeout(limit)),
                _ => None,
            }
        };

        let mut report = ExecutionReport {
            program: name.clone(),
            exit_code: None,
            duration: Duration::ZERO,
            log_file: log_path.clone(),
            steps: Vec::new(),
            errors: 0,
            critical_warnings: 0,
            warnings: 0,
            lines: 0,
        };
        let mut console = Console::new(
            options.initial_step.as_deref().unwrap_or(&name),
            self.ctx.options.quiet,
            self.ctx.options.verbose || options.echo,
            io::stdout(),
        );

        loop {
            if let Some(reason) = interrupted() {
                console.finish(false);
                let _ = log.flush();
                guard.terminate();
                return Err(FlowError::Cancelled {
                    program: name,
                    reason,
                });
            }
            match rx.recv_timeout(POLL_INTERVAL) {
                Ok(line) => {
                    writeln!(log, "{line}").map_err(|error| FlowError::io(&log_path, error))?;
                    console.handle(&line, &mut report);
                }
                Err(RecvTimeoutError::Timeout) => {
                    // The tool is gone but something it forked still holds the pipe.
                    if guard
                        .try_wait()
                        .map_err(|error| FlowError::io(&resolved, error))?
                        .is_some()
                    {
                        guard.terminate();
                    }
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        let status = loop {
            if let Some(status) = guard
                .try_wait()
                .map_err(|error| FlowError::io(&resolved, error))?
            {
                break status;
            }
            if let Some(reason) = interrupted() {
                console.finish(false);
                let _ = log.flush();
                guard.terminate();
                return Err(FlowError::Cancelled {
                    program: name,
                    reason,
                });
            }
            thread::sleep(POLL_INTERVAL);
        };
        guard.terminate();
        for reader in readers {
            let _ = reader.join();
        }
        log.flush()
            .map_err(|error| FlowError::io(&log_path, error))?;

        report.exit_code = status.code();
        report.duration = started.elapsed();
        console.finish(status.success());
        debug!(
            exit_code = ?report.exit_code,
            steps = report.steps.len(),
            errors = report.errors,
            warnings = report.warnings,
            "`{name}` finished in {:.1}s",
            report.duration.as_secs_f64()
        );

        if !status.success() {
            let code = status.code().unwrap_or(-1);
            if options.check {
                return Err(FlowError::NonZeroExit {
                    program: name,
                    code,
                    log: log_path,
                });
            }
            warn!("`{name}` exited with return code {code}; see {}", log_path.display());
        }
        Ok(report)
    }
}

fn spawn_reader<R: Read + Send + 'static>(stream: R, tx: Sender<String>) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    while matches!(buf.last(), Some(b'\n' | b'\r')) {
                        buf.pop();
                    }
                    if tx.send(String::from_utf8_lossy(&buf).into_owned()).is_err() {
                        break;
                    }
                }
            }
        }
    })
}

/// Owns the child and its process group so that every exit path stops them:
/// terminate, wait out a grace period, then kill. Members of the group left
/// behind by a child that already exited are killed as well.
struct ChildGuard {
    child: Child,
    reaped: bool,
    cleaned: bool,
}

impl ChildGuard {
    fn new(child: Child) -> Self {
        Self {
            child,
            reaped: false,
            cleaned: false,
        }
    }

    fn try_wait(&mut self) -> io::Result<Option<ExitStatus>> {
        let status = self.child.try_wait()?;
        if status.is_some() {
            self.reaped = true;
        }
        Ok(status)
    }

    fn terminate(&mut self) {
        if self.cleaned {
            return;
        }
        self.cleaned = true;
        signal_group(&self.child, GroupSignal::Terminate);
        let deadline = Instant::now() + TERMINATE_GRACE;
        while !self.reaped && Instant::now() < deadline {
            match self.try_wait() {
                Ok(Some(_)) => {}
                Ok(None) => thread::sleep(Duration::from_millis(50)),
                Err(_) => break,
            }
        }
        if !self.reaped {
            warn!(pid = self.child.id(), "child ignored SIGTERM, killing");
        }
        signal_group(&self.child, GroupSignal::Kill);
        if !self.reaped {
            let _ = self.child.kill();
            let _ = self.child.wait();
            self.reaped = true;
        }
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        self.terminate();
    }
}

#[derive(Debug, Clone, Copy)]
enum GroupSignal {
    Terminate,
    Kill,
}

#[cfg(unix)]
fn signal_group(child: &Child, signal: GroupSignal) {
    let signal = match signal {
        GroupSignal::Terminate => libc::SIGTERM,
        GroupSignal::Kill => libc::SIGKILL,
    };
    let Ok(pgid) = libc::pid_t::try_from(child.id()) else {
        return;
    };
    // SAFETY: killpg only takes integers and has no memory-safety
    // preconditions. The group id is the child's pid (see `process_group(0)`)
    // and stays reserved while any member, including the unreaped leader, is
    // alive. Once the group is empty the call fails with ESRCH, which is
    // ignored.
    unsafe {
        libc::killpg(pgid, signal);
    }
}

#[cfg(not(unix))]
fn signal_group(_child: &Child, _signal: GroupSignal) {}

/// Console side of a run: a per-step spinner, or the raw lines when echo is
/// on. Echoed lines go to `out`.
struct Console<W: Write> {
    spinner: Option<ProgressBar>,
    step: String,
    quiet: bool,
    verbose: bool,
    echo: bool,
    out: W,
}

impl<W: Write> Console<W> {
    fn new(initial_step: &str, quiet: bool, verbose: bool, out: W) -> Self {
        let mut console = Self {
            spinner: None,
            step: initial_step.to_string(),
            quiet,
            verbose,
            echo: false,
            out,
        };
        if !verbose {
            console.start_spinner();
        }
        console
    }

    fn start_spinner(&mut self) {
        if self.quiet {
            return;
        }
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message(self.step.clone());
        self.spinner = Some(spinner);
    }

    fn handle(&mut self, line: &str, report: &mut ExecutionReport) {
        report.lines += 1;
        let class = classify(line);
        match class {
            LineClass::EnableEcho => {
                if !self.quiet && !self.echo {
                    self.complete_step(true);
                    self.echo = true;
                }
                return;
            }
            LineClass::DisableEcho => {
                self.echo = false;
                return;
            }
            LineClass::Step(step) => report.steps.push(step.to_string()),
            LineClass::Error => report.errors += 1,
            LineClass::CriticalWarning => report.critical_warnings += 1,
            LineClass::Warning => report.warnings += 1,
            LineClass::Output => {}
        }

        if self.verbose || self.echo {
            if !self.quiet {
                self.echo_line(line);
            }
            return;
        }
        match class {
            LineClass::Error | LineClass::CriticalWarning => self.suspend(|| error!("{line}")),
            LineClass::Warning => self.suspend(|| warn!("{line}")),
            LineClass::Step(step) => {
                self.complete_step(true);
                self.step = step.to_string();
                self.start_spinner();
            }
            _ => {
                if let Some(spinner) = &self.spinner {
                    spinner.tick();
                }
            }
        }
    }

    fn echo_line(&mut self, line: &str) {
        let out = &mut self.out;
        match &self.spinner {
            Some(spinner) => spinner.suspend(|| {
                let _ = writeln!(out, "{line}");
            }),
            None => {
                let _ = writeln!(out, "{line}");
            }
        }
    }

    fn suspend<F: FnOnce()>(&self, f: F) {
        match &self.spinner {
            Some(spinner) => spinner.suspend(f),
            None => f(),
        }
    }

    fn complete_step(&mut self, ok: bool) {
        if let Some(spinner) = self.spinner.take() {
            let mark = if ok { "✔".green() } else { "✘".red() };
            spinner.finish_with_message(format!("{mark} {}", self.step));
        }
    }

    fn finish(&mut self, ok: bool) {
        self.complete_step(ok);
        let _ = self.out.flush();
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::context::ExecOptions;
    use std::fs;
    use tempfile::TempDir;

    fn quiet_ctx(dir: &Path) -> ExecutionContext {
        ExecutionContext::new(dir, dir).with_options(ExecOptions {
            quiet: true,
            ..ExecOptions::default()
        })
    }

    fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        path
    }

    #[test]
    fn classifies_control_lines_before_prefixes() {
        let bar = "=".repeat(14);
        assert_eq!(
            classify(&format!("{bar}( *ENABLE ECHO* ){bar}")),
            LineClass::EnableEcho
        );
        assert_eq!(
            classify(&format!("{bar}( *disable echo* ){bar}")),
            LineClass::DisableEcho
        );
        assert_eq!(
            classify(&format!("{bar}(  Place Design ){bar}")),
            LineClass::Step("Place Design")
        );
        assert_eq!(classify("ERROR: [Synth 8-439] module not found"), LineClass::Error);
        assert_eq!(classify("  error something broke"), LineClass::Error);
        assert_eq!(classify("Warning: latch inferred"), LineClass::Warning);
        assert_eq!(
            classify("CRITICAL WARNING: timing not met"),
            LineClass::CriticalWarning
        );
        assert_eq!(classify("errors: 0"), LineClass::Output);
        assert_eq!(classify("no error here"), LineClass::Output);
        assert_eq!(classify("=====( short )====="), LineClass::Output);
    }

    #[test]
    fn records_steps_and_logs_every_line() {
        let temp = TempDir::new().unwrap();
        let bar = "=".repeat(14);
        let script = write_script(
            temp.path(),
            "tool.sh",
            &format!("echo '{bar}( step A ){bar}'\necho 'building'\necho 'WARNING: slow' 1>&2\nexit 0"),
        );
        let ctx = quiet_ctx(temp.path());
        let report = ProcessRunner::new(&ctx, temp.path())
            .run("sh", &[script.as_os_str()], &RunOptions::default())
            .unwrap();

        assert!(report.is_success());
        assert_eq!(report.steps, vec!["step A".to_string()]);
        assert_eq!(report.warnings, 1);
        assert_eq!(report.lines, 3);
        assert_eq!(report.log_file, temp.path().join("sh_stdout.log"));

        let log = fs::read_to_string(&report.log_file).unwrap();
        let mut lines: Vec<&str> = log.lines().collect();
        lines.sort_unstable();
        let mut expected = vec![
            format!("{bar}( step A ){bar}"),
            "building".to_string(),
            "WARNING: slow".to_string(),
        ];
        expected.sort_unstable();
        assert_eq!(lines, expected);
    }

    #[test]
    fn non_zero_exit_is_fatal_when_checked() {
        let temp = TempDir::new().unwrap();
        let script = write_script(temp.path(), "fail.sh", "echo 'ERROR: bad input'\nexit 2");
        let ctx = quiet_ctx(temp.path());
        let err = ProcessRunner::new(&ctx, temp.path())
            .run("sh", &[script.as_os_str()], &RunOptions::default())
            .unwrap_err();
        match err {
            FlowError::NonZeroExit { code, log, .. } => {
                assert_eq!(code, 2);
                assert!(log.ends_with("sh_stdout.log"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_zero_exit_is_reported_when_unchecked() {
        let temp = TempDir::new().unwrap();
        let script = write_script(temp.path(), "fail.sh", "exit 2");
        let ctx = quiet_ctx(temp.path());
        let options = RunOptions {
            check: false,
            log_file: Some(PathBuf::from("fail.log")),
            ..RunOptions::default()
        };
        let report = ProcessRunner::new(&ctx, temp.path())
            .run("sh", &[script.as_os_str()], &options)
            .unwrap();
        assert_eq!(report.exit_code, Some(2));
        assert!(!report.is_success());
        assert!(temp.path().join("fail.log").exists());
    }

    #[test]
    fn missing_executable_is_reported() {
        let temp = TempDir::new().unwrap();
        let ctx = quiet_ctx(temp.path());
        let err = ProcessRunner::new(&ctx, temp.path())
            .run::<&str>("edaflow-definitely-missing-tool", &[], &RunOptions::default())
            .unwrap_err();
        assert!(matches!(err, FlowError::ExecutableNotFound { .. }));
    }

    fn empty_report() -> ExecutionReport {
        ExecutionReport {
            program: "tool".to_string(),
            exit_code: None,
            duration: Duration::ZERO,
            log_file: PathBuf::from("tool_stdout.log"),
            steps: Vec::new(),
            errors: 0,
            critical_warnings: 0,
            warnings: 0,
            lines: 0,
        }
    }

    fn echoed(quiet: bool, verbose: bool, lines: &[&str]) -> (String, ExecutionReport) {
        let mut report = empty_report();
        let mut console = Console::new("tool", quiet, verbose, Vec::new());
        for line in lines {
            console.handle(line, &mut report);
        }
        console.finish(true);
        (String::from_utf8(console.out).unwrap(), report)
    }

    #[test]
    fn echo_markers_toggle_printing() {
        let bar = "=".repeat(14);
        let enable = format!("{bar}( *ENABLE ECHO* ){bar}");
        let disable = format!("{bar}( *DISABLE ECHO* ){bar}");
        let (out, report) = echoed(
            false,
            false,
            &[
                "building",
                enable.as_str(),
                "shown 1",
                "ERROR: shown 2",
                disable.as_str(),
                "after",
                "WARNING: late",
            ],
        );
        assert_eq!(out, "shown 1\nERROR: shown 2\n");
        assert_eq!(report.lines, 7);
        assert_eq!(report.errors, 1);
        assert_eq!(report.warnings, 1);
    }

    #[test]
    fn verbose_prints_everything_but_markers() {
        let bar = "=".repeat(14);
        let enable = format!("{bar}( *ENABLE ECHO* ){bar}");
        let disable = format!("{bar}( *DISABLE ECHO* ){bar}");
        let (out, _) = echoed(false, true, &["a", enable.as_str(), "b", disable.as_str(), "c"]);
        assert_eq!(out, "a\nb\nc\n");

        let (out, report) = echoed(true, false, &[enable.as_str(), "hidden", disable.as_str()]);
        assert!(out.is_empty());
        assert_eq!(report.lines, 3);
    }

    fn process_alive(pid: &str) -> bool {
        let stat = Path::new("/proc").join(pid).join("stat");
        if Path::new("/proc").is_dir() {
            // Zombies waiting for their new parent to reap them count as gone.
            return fs::read_to_string(stat)
                .map(|stat| {
                    stat.rsplit_once(") ")
                        .is_some_and(|(_, rest)| !rest.starts_with('Z'))
                })
                .unwrap_or(false);
        }
        Command::new("kill")
            .args(["-0", pid])
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    #[test]
    fn timeout_stops_the_child_and_what_it_forked() {
        let temp = TempDir::new().unwrap();
        let ctx = quiet_ctx(temp.path());
        let options = RunOptions {
            timeout: Some(Duration::from_secs(1)),
            ..RunOptions::default()
        };
        let started = Instant::now();
        let err = ProcessRunner::new(&ctx, temp.path())
            .run(
                "sh",
                &["-c", "sleep 30 & echo $! > forked.pid; wait"],
                &options,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            FlowError::Cancelled {
                reason: CancelReason::Timeout(_),
                ..
            }
        ));
        assert!(started.elapsed() < Duration::from_secs(10));

        let pid = fs::read_to_string(temp.path().join("forked.pid")).unwrap();
        let pid = pid.trim();
        let deadline = Instant::now() + Duration::from_secs(2);
        while process_alive(pid) && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(50));
        }
        assert!(!process_alive(pid), "forked process {pid} outlived the run");
    }

    #[test]
    fn finished_tool_does_not_wait_for_forked_stragglers() {
        let temp = TempDir::new().unwrap();
        let ctx = quiet_ctx(temp.path());
        let started = Instant::now();
        let report = ProcessRunner::new(&ctx, temp.path())
            .run("sh", &["-c", "sleep 30 & echo $! > forked.pid; echo done"], &RunOptions::default())
            .unwrap();
        assert!(report.is_success());
        assert!(started.elapsed() < Duration::from_secs(10));

        let pid = fs::read_to_string(temp.path().join("forked.pid")).unwrap();
        let deadline = Instant::now() + Duration::from_secs(2);
        while process_alive(pid.trim()) && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(50));
        }
        assert!(!process_alive(pid.trim()));
    }

    #[test]
    fn cancellation_stops_the_child() {
        let temp = TempDir::new().unwrap();
        let ctx = quiet_ctx(temp.path());
        ctx.cancel.cancel();
        let err = ProcessRunner::new(&ctx, temp.path())
            .run("sh", &["-c", "exec sleep 30"], &RunOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            FlowError::Cancelled {
                reason: CancelReason::Interrupted,
                ..
            }
        ));
    }
}
