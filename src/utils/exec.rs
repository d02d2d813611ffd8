//! External command execution.
//!
//! Builder API for the generator, the diagram renderer and `git push`:
//!
//! ```ignore
//! Cmd::new("bundle")
//!     .args(["exec", "jekyll", "build"])
//!     .cwd(root)
//!     .envs([("JEKYLL_ENV", "production")])
//!     .timeout(Some(Duration::from_secs(600)))
//!     .run()?;
//!
//! let svg = Cmd::from_slice(&["dot", "-Tsvg"]).stdin(source).run()?.stdout;
//! ```

use crate::log;
use anyhow::{Context, Result, anyhow, bail};
use portable_pty::{CommandBuilder, NativePtySystem, PtySize, PtySystem};
use regex::Regex;
use std::{
    ffi::{OsStr, OsString},
    io::{Read, Write},
    path::{Path, PathBuf},
    process::{Child, Command, ExitStatus, Output, Stdio},
    sync::OnceLock,
    thread,
    time::{Duration, Instant},
};

/// Poll interval while waiting on a child with a deadline.
const WAIT_POLL: Duration = Duration::from_millis(50);

/// Command builder for external process execution.
#[derive(Default)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    envs: Vec<(String, String)>,
    stdin_data: Option<Vec<u8>>,
    timeout: Option<Duration>,
    use_pty: bool,
    filter: Option<&'static FilterRule>,
}

impl Cmd {
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            program: program.as_ref().to_owned(),
            ..Default::default()
        }
    }

    /// Create from a command array (e.g. `["bundle", "exec", "jekyll", "build"]`).
    pub fn from_slice<S: AsRef<OsStr>>(cmd: &[S]) -> Self {
        let mut iter = cmd.iter();
        let program = iter
            .next()
            .map(|s| s.as_ref().to_owned())
            .unwrap_or_default();
        Self::new(program).args(iter)
    }

    /// Add a single argument. Empty arguments are dropped.
    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        let arg = arg.as_ref();
        if !arg.is_empty() {
            self.args.push(arg.to_owned());
        }
        self
    }

    pub fn args<I, S>(self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        args.into_iter().fold(self, Self::arg)
    }

    pub fn cwd<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.cwd = Some(dir.as_ref().to_owned());
        self
    }

    pub fn envs<K, V, I>(mut self, vars: I) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (k, v) in vars {
            self.envs.push((k.as_ref().to_owned(), v.as_ref().to_owned()));
        }
        self
    }

    /// Bytes written to the child's stdin.
    pub fn stdin<D: AsRef<[u8]>>(mut self, data: D) -> Self {
        self.stdin_data = Some(data.as_ref().to_vec());
        self
    }

    /// Kill the child and fail once the deadline passes.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run inside a pseudo-terminal so the child can prompt for credentials
    /// and print progress. Ignored when stdin data is set.
    pub fn pty(mut self, enable: bool) -> Self {
        self.use_pty = enable;
        self
    }

    pub fn filter(mut self, filter: &'static FilterRule) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn program_name(&self) -> String {
        self.program.to_string_lossy().to_string()
    }

    /// Fail early when the program is not on `PATH`.
    pub fn ensure_available(&self) -> Result<()> {
        let program = Path::new(&self.program);
        if program.components().count() > 1 {
            if program.exists() {
                return Ok(());
            }
            bail!("`{}` does not exist", program.display());
        }
        which::which(&self.program)
            .map(|_| ())
            .with_context(|| format!("`{}` not found on PATH", self.program_name()))
    }

    /// Execute the command, failing on non-zero exit.
    ///
    /// The failure message carries the child's stderr and stdout verbatim.
    pub fn run(self) -> Result<Output> {
        let filter = self.filter.unwrap_or(&EMPTY_FILTER);
        if self.use_pty && self.stdin_data.is_none() {
            self.run_with_pty(filter)
        } else {
            self.run_piped(filter)
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).envs(self.envs.iter().cloned());
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        cmd
    }

    /// Spawn with piped stdio. Stdin is fed and both outputs drained on
    /// helper threads so large payloads cannot fill a pipe and stall.
    fn run_piped(self, filter: &'static FilterRule) -> Result<Output> {
        let name = self.program_name();

        let mut cmd = self.command();
        cmd.stdin(if self.stdin_data.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

        let mut child = cmd
            .spawn()
            .with_context(|| format!("Failed to execute `{name}`"))?;

        let writer = match (child.stdin.take(), self.stdin_data) {
            (Some(mut stdin), Some(data)) => Some(thread::spawn(move || stdin.write_all(&data))),
            _ => None,
        };
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = wait(&mut child, self.timeout, &name)?;

        if let Some(writer) = writer {
            // A child that exits without reading all input is not an error by itself
            let _ = writer.join();
        }
        let output = Output {
            status,
            stdout: join_reader(stdout)?,
            stderr: join_reader(stderr)?,
        };

        if !output.status.success() {
            bail!(format_error(&name, &output, filter));
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        filter.log(&name, stderr.trim());
        Ok(output)
    }

    fn run_with_pty(self, filter: &'static FilterRule) -> Result<Output> {
        let name = self.program_name();

        let mut builder = CommandBuilder::new(&self.program);
        builder.args(&self.args);
        for (k, v) in &self.envs {
            builder.env(k, v);
        }
        if let Some(dir) = &self.cwd {
            builder.cwd(dir);
        }

        let pair = NativePtySystem::default().openpty(PtySize {
            rows: 24,
            cols: 80,
            pixel_width: 0,
            pixel_height: 0,
        })?;

        let mut child = pair.slave.spawn_command(builder)?;
        drop(pair.slave);

        // PTY reads block until EOF
        let mut reader = pair.master.try_clone_reader()?;
        let output_handle = thread::spawn(move || {
            let mut output = String::new();
            let _ = reader.read_to_string(&mut output);
            output
        });

        let status = child.wait()?;
        drop(pair.master);

        let output = output_handle
            .join()
            .map_err(|_| anyhow!("Failed to join output reader thread"))?;

        if !status.success() {
            bail!("Command `{name}` failed with exit code {}\n{}", status.exit_code(), output.trim());
        }
        filter.log(&name, &output);

        Ok(Output {
            status: exit_status(status.exit_code()),
            stdout: output.into_bytes(),
            stderr: Vec::new(),
        })
    }
}

type Reader = Option<thread::JoinHandle<std::io::Result<Vec<u8>>>>;

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Reader {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            pipe.read_to_end(&mut buf)?;
            Ok(buf)
        })
    })
}

fn join_reader(reader: Reader) -> Result<Vec<u8>> {
    match reader {
        Some(handle) => handle
            .join()
            .map_err(|_| anyhow!("output reader thread panicked"))?
            .context("Failed to read command output"),
        None => Ok(Vec::new()),
    }
}

fn wait(child: &mut Child, timeout: Option<Duration>, name: &str) -> Result<ExitStatus> {
    let Some(timeout) = timeout else {
        return child
            .wait()
            .with_context(|| format!("Failed to wait for `{name}`"));
    };

    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            bail!("Command `{name}` timed out after {}s", timeout.as_secs());
        }
        thread::sleep(WAIT_POLL);
    }
}

#[cfg(unix)]
#[allow(clippy::cast_possible_wrap)]
fn exit_status(code: u32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    ExitStatus::from_raw((code as i32) << 8)
}

#[cfg(windows)]
fn exit_status(code: u32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    ExitStatus::from_raw(code)
}

// ============================================================================
// Output Filtering
// ============================================================================

/// Filter rule for command output logging.
pub struct FilterRule {
    /// Prefixes to skip when logging output.
    pub skip_prefixes: &'static [&'static str],
}

impl FilterRule {
    pub const fn new(skip_prefixes: &'static [&'static str]) -> Self {
        Self { skip_prefixes }
    }

    fn should_skip(&self, line: &str) -> bool {
        line.is_empty() || self.skip_prefixes.iter().any(|p| line.starts_with(p))
    }

    /// Log output lines that pass the filter.
    pub fn log(&self, name: &str, output: &str) {
        let lines: Vec<_> = output
            .lines()
            .filter(|line| !self.should_skip(strip_ansi(line).trim()))
            .collect();

        if !lines.is_empty() {
            log!(name; "{}", lines.join("\n"));
        }
    }
}

pub const EMPTY_FILTER: FilterRule = FilterRule::new(&[]);

/// Skip all output.
pub const SILENT_FILTER: FilterRule = FilterRule::new(&[""]);

fn strip_ansi(s: &str) -> std::borrow::Cow<'_, str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\x1b\[[0-9;]*m").expect("valid ANSI regex"));
    re.replace_all(s, "")
}

fn format_error(name: &str, output: &Output, filter: &FilterRule) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);

    let error_msg = filter
        .skip_prefixes
        .iter()
        .filter(|p| !p.is_empty())
        .fold(stderr.trim(), |s, p| s.trim_start_matches(p).trim_start());

    let mut msg = format!("Command `{name}` failed with {}", output.status);
    if !error_msg.is_empty() {
        msg.push('\n');
        msg.push_str(error_msg);
    }
    let stdout = stdout.trim();
    if !stdout.is_empty() {
        msg.push_str("\nStdout:\n");
        msg.push_str(stdout);
    }
    msg
}
