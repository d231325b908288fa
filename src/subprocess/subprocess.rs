// ABOUTME: Subprocess builder and runner.
// ABOUTME: Spawns without a shell; stdin is written concurrently with output reads.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::sync::{Notify, Semaphore};

use super::ExecResult;
use crate::error::ExecError;
use crate::sample::transcript;
use crate::trace::trace_action;
use crate::transcript::{Event, EventMeta, SubprocessEvent};

struct SubprocessGate {
    limit: usize,
    semaphore: Arc<Semaphore>,
}

fn gate_cell() -> &'static RwLock<SubprocessGate> {
    static GATE: OnceLock<RwLock<SubprocessGate>> = OnceLock::new();
    GATE.get_or_init(|| {
        let limit = num_cpus::get().max(1);
        RwLock::new(SubprocessGate {
            limit,
            semaphore: Arc::new(Semaphore::new(limit)),
        })
    })
}

/// Set the maximum number of concurrent subprocesses.
///
/// `None` resets to the number of available CPUs. Subprocesses already
/// holding a slot keep it; new runs use the new gate.
pub fn init_max_subprocesses(max: Option<usize>) {
    let limit = max.unwrap_or_else(num_cpus::get).max(1);
    let mut gate = gate_cell().write().unwrap_or_else(PoisonError::into_inner);
    *gate = SubprocessGate {
        limit,
        semaphore: Arc::new(Semaphore::new(limit)),
    };
    tracing::debug!(limit, "max subprocesses initialized");
}

/// The current maximum number of concurrent subprocesses.
pub fn max_subprocesses() -> usize {
    gate_cell()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .limit
}

fn subprocess_semaphore() -> Arc<Semaphore> {
    Arc::clone(
        &gate_cell()
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .semaphore,
    )
}

/// A command to run on the host.
///
/// ```ignore
/// let result = Subprocess::new(["git", "status"])
///     .cwd("/repo")
///     .timeout(Duration::from_secs(30))
///     .run()
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct Subprocess {
    args: Vec<String>,
    input: Option<Vec<u8>>,
    cwd: Option<PathBuf>,
    env: HashMap<String, String>,
    capture_output: bool,
    output_limit: Option<usize>,
    timeout: Option<Duration>,
    concurrency: bool,
}

impl Subprocess {
    /// Create a subprocess from a program and its arguments.
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            input: None,
            cwd: None,
            env: HashMap::new(),
            capture_output: true,
            output_limit: None,
            timeout: None,
            concurrency: true,
        }
    }

    /// Data written to the process's stdin, which is then closed.
    pub fn input(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.input = Some(input.into());
        self
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Add environment variables on top of the inherited environment.
    pub fn env<I, K, V>(mut self, env: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env
            .extend(env.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Capture stdout/stderr (default). When false the streams are inherited.
    pub fn capture_output(mut self, capture: bool) -> Self {
        self.capture_output = capture;
        self
    }

    /// Stop reading a stream once it exceeds `limit` bytes. The process is
    /// killed and the result is marked truncated.
    pub fn output_limit(mut self, limit: usize) -> Self {
        self.output_limit = Some(limit);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set an optional timeout.
    pub fn maybe_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether to wait for a slot in the global subprocess gate (default).
    pub fn concurrency(mut self, concurrency: bool) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Run the command to completion.
    pub async fn run(self) -> Result<ExecResult, ExecError> {
        if self.args.is_empty() {
            return Err(ExecError::EmptyCommand);
        }

        let _permit = if self.concurrency {
            Some(
                subprocess_semaphore()
                    .acquire_owned()
                    .await
                    .map_err(|_| crate::error::ConcurrencyError::Closed("subprocesses".into()))?,
            )
        } else {
            None
        };

        let message = self.args.join(" ");
        let args = self.args.clone();
        let result = trace_action("Subprocess", &message, self.spawn_and_wait()).await;

        transcript().record(Event::Subprocess(SubprocessEvent {
            meta: EventMeta::now(),
            args,
            returncode: result.as_ref().ok().map(|r| r.returncode),
            timed_out: matches!(result, Err(ExecError::Timeout(_))),
        }));
        result
    }

    async fn spawn_and_wait(self) -> Result<ExecResult, ExecError> {
        let mut cmd = Command::new(&self.args[0]);
        cmd.args(&self.args[1..]);
        cmd.envs(&self.env);
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }
        cmd.stdin(if self.input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });
        if self.capture_output {
            cmd.stdout(Stdio::piped());
            cmd.stderr(Stdio::piped());
        } else {
            cmd.stdout(Stdio::inherit());
            cmd.stderr(Stdio::inherit());
        }
        cmd.kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| ExecError::Spawn {
            program: self.args[0].clone(),
            source,
        })?;

        if let (Some(input), Some(mut stdin)) = (self.input, child.stdin.take()) {
            tokio::spawn(async move {
                // The child may exit without reading its input.
                if let Err(e) = stdin.write_all(&input).await {
                    tracing::debug!("failed writing subprocess stdin: {}", e);
                }
            });
        }

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let limit = self.output_limit;

        let tripped = Notify::new();

        let run = async {
            let readers = async {
                tokio::join!(
                    read_limited(stdout, limit, &tripped),
                    read_limited(stderr, limit, &tripped)
                )
            };
            tokio::pin!(readers);
            // A stream over the limit is no longer drained, so the child must
            // be killed before waiting on the other stream.
            let (out, err) = tokio::select! {
                outputs = &mut readers => outputs,
                () = tripped.notified() => {
                    child.start_kill()?;
                    readers.await
                }
            };
            let (stdout, stdout_truncated) = out?;
            let (stderr, stderr_truncated) = err?;
            let truncated = stdout_truncated || stderr_truncated;
            if truncated {
                if let Err(e) = child.start_kill() {
                    tracing::debug!("kill after output limit: {}", e);
                }
            }
            let status = child.wait().await?;
            Ok::<_, ExecError>((status, stdout, stderr, truncated))
        };

        let timeout = self.timeout;
        let outcome = match timeout {
            None => Ok(run.await),
            Some(timeout) => tokio::time::timeout(timeout, run).await,
        };
        let (status, stdout, stderr, truncated) = match outcome {
            Ok(result) => result?,
            Err(_) => {
                if let Err(e) = child.kill().await {
                    tracing::warn!("failed to kill timed out subprocess: {}", e);
                }
                return Err(ExecError::Timeout(timeout.unwrap_or_default()));
            }
        };

        Ok(to_exec_result(status, stdout, stderr, truncated))
    }
}

fn to_exec_result(status: ExitStatus, stdout: Vec<u8>, stderr: Vec<u8>, truncated: bool) -> ExecResult {
    ExecResult {
        success: status.success(),
        returncode: status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
        truncated,
    }
}

/// Read a stream to EOF, or until more than `limit` bytes arrive. Returns the
/// bytes read (at most `limit`) and whether the stream was cut short;
/// `tripped` is notified when it was.
async fn read_limited<R>(
    reader: Option<R>,
    limit: Option<usize>,
    tripped: &Notify,
) -> std::io::Result<(Vec<u8>, bool)>
where
    R: AsyncRead + Unpin,
{
    let Some(mut reader) = reader else {
        return Ok((Vec::new(), false));
    };
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            return Ok((buf, false));
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(limit) = limit {
            if buf.len() > limit {
                buf.truncate(limit);
                tripped.notify_one();
                return Ok((buf, true));
            }
        }
    }
}
