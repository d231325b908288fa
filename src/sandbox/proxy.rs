// ABOUTME: SandboxEnvironmentProxy - wraps any backend to enforce output limits
// ABOUTME: and timeout retries, and to record sandbox events in the transcript.

use std::sync::Arc;
use std::time::Instant;

use super::{
    ExecOptions, MAX_EXEC_OUTPUT_SIZE, MAX_READ_FILE_SIZE, SandboxConnection, SandboxEnvironment,
    attempt_timeouts, limits::truncate_utf8,
};
use crate::error::{ExecError, SandboxError};
use crate::subprocess::ExecResult;
use crate::trace::trace_action;
use crate::transcript::{Event, EventMeta, SandboxAction, SandboxEvent, Transcript};

/// Longest output/input excerpt stored in a sandbox event.
const EVENT_EXCERPT_BYTES: usize = 2048;

/// A named handle to a sandbox environment.
///
/// This is what sample code receives from [`sandbox()`](crate::sample::sandbox).
/// Cloning is cheap and shares the backend.
#[derive(Clone)]
pub struct SandboxEnvironmentProxy {
    name: String,
    inner: Arc<dyn SandboxEnvironment>,
    transcript: Transcript,
}

impl SandboxEnvironmentProxy {
    pub fn new(
        name: impl Into<String>,
        inner: Arc<dyn SandboxEnvironment>,
        transcript: Transcript,
    ) -> Self {
        Self {
            name: name.into(),
            inner,
            transcript,
        }
    }

    /// Name of the environment within its sample.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The wrapped backend.
    pub fn inner(&self) -> &Arc<dyn SandboxEnvironment> {
        &self.inner
    }

    /// Execute a command.
    ///
    /// # Errors
    ///
    /// - [`SandboxError::Timeout`] when every attempt timed out.
    /// - [`SandboxError::OutputLimitExceeded`] when stdout or stderr is larger
    ///   than [`MAX_EXEC_OUTPUT_SIZE`].
    pub async fn exec<S: AsRef<str>>(
        &self,
        cmd: &[S],
        options: ExecOptions,
    ) -> Result<ExecResult, SandboxError> {
        let cmd: Vec<String> = cmd.iter().map(|s| s.as_ref().to_string()).collect();
        let message = format!("exec ({}): {}", self.name, cmd.join(" "));
        let start = Instant::now();

        let result = trace_action("Sandbox", &message, async {
            let result = self.exec_with_retry(&cmd, &options).await?;
            verify_exec_result_size(result)
        })
        .await;

        let (code, output, error) = match &result {
            Ok(r) => (
                Some(r.returncode),
                Some(truncate_utf8(&r.combined_output(), EVENT_EXCERPT_BYTES).to_string()),
                None,
            ),
            Err(e) => (None, None, Some(e.to_string())),
        };
        let input = options
            .input
            .as_ref()
            .map(|i| truncate_utf8(&String::from_utf8_lossy(i), EVENT_EXCERPT_BYTES).to_string());
        self.record(SandboxAction::Exec, start, |event| {
            event.cmd = Some(cmd.join(" "));
            event.input = input;
            event.result = code;
            event.output = output;
            event.error = error;
        });
        result
    }

    async fn exec_with_retry(
        &self,
        cmd: &[String],
        options: &ExecOptions,
    ) -> Result<ExecResult, SandboxError> {
        let timeouts = attempt_timeouts(options.timeout, options.timeout_retry);
        let mut attempt = 0;
        loop {
            let mut attempt_options = options.clone();
            attempt_options.timeout = timeouts[attempt];
            match self.inner.exec(cmd, &attempt_options).await.map_err(normalize) {
                Err(SandboxError::Timeout(after)) if attempt + 1 < timeouts.len() => {
                    attempt += 1;
                    tracing::warn!(
                        sandbox = %self.name,
                        attempt = attempt + 1,
                        "command timed out after {:?}, retrying with timeout {:?}",
                        after,
                        timeouts[attempt]
                    );
                }
                result => return result,
            }
        }
    }

    /// Read a file as bytes.
    ///
    /// # Errors
    ///
    /// [`SandboxError::OutputLimitExceeded`] when the file is larger than
    /// [`MAX_READ_FILE_SIZE`], plus the backend's not-found / permission /
    /// directory errors.
    pub async fn read_file(&self, file: &str) -> Result<Vec<u8>, SandboxError> {
        let message = format!("read_file ({}): {}", self.name, file);
        let start = Instant::now();
        let result = trace_action("Sandbox", &message, async {
            let contents = self.inner.read_file(file).await?;
            if contents.len() > MAX_READ_FILE_SIZE {
                return Err(SandboxError::OutputLimitExceeded {
                    limit: MAX_READ_FILE_SIZE,
                    truncated_output: None,
                });
            }
            Ok(contents)
        })
        .await;

        let error = result.as_ref().err().map(ToString::to_string);
        self.record(SandboxAction::ReadFile, start, |event| {
            event.file = Some(file.to_string());
            event.error = error;
        });
        result
    }

    /// Read a file and decode it as UTF-8.
    pub async fn read_file_text(&self, file: &str) -> Result<String, SandboxError> {
        let bytes = self.read_file(file).await?;
        String::from_utf8(bytes).map_err(|_| SandboxError::UnicodeDecode(file.to_string()))
    }

    /// Write bytes to a file.
    pub async fn write_file(&self, file: &str, contents: &[u8]) -> Result<(), SandboxError> {
        let message = format!("write_file ({}): {}", self.name, file);
        let start = Instant::now();
        let result = trace_action("Sandbox", &message, self.inner.write_file(file, contents)).await;

        let error = result.as_ref().err().map(ToString::to_string);
        self.record(SandboxAction::WriteFile, start, |event| {
            event.file = Some(file.to_string());
            event.error = error;
        });
        result
    }

    /// Write text to a file.
    pub async fn write_file_text(&self, file: &str, contents: &str) -> Result<(), SandboxError> {
        self.write_file(file, contents.as_bytes()).await
    }

    pub async fn connection(&self) -> Result<SandboxConnection, SandboxError> {
        self.inner.connection().await
    }

    fn record(&self, action: SandboxAction, start: Instant, fill: impl FnOnce(&mut SandboxEvent)) {
        let mut event = SandboxEvent {
            meta: EventMeta::now(),
            sandbox: self.name.clone(),
            action,
            cmd: None,
            file: None,
            input: None,
            result: None,
            output: None,
            error: None,
            working_time: start.elapsed().as_secs_f64(),
        };
        fill(&mut event);
        self.transcript.record(Event::Sandbox(event));
    }
}

impl std::fmt::Debug for SandboxEnvironmentProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SandboxEnvironmentProxy")
            .field("name", &self.name)
            .field("kind", &self.inner.kind())
            .finish()
    }
}

fn normalize(err: SandboxError) -> SandboxError {
    match err {
        SandboxError::Exec(ExecError::Timeout(after)) => SandboxError::Timeout(after),
        other => other,
    }
}

fn verify_exec_result_size(result: ExecResult) -> Result<ExecResult, SandboxError> {
    let oversized = result.truncated
        || result.stdout.len() > MAX_EXEC_OUTPUT_SIZE
        || result.stderr.len() > MAX_EXEC_OUTPUT_SIZE;
    if oversized {
        let excerpt = if result.stdout.len() >= result.stderr.len() {
            &result.stdout
        } else {
            &result.stderr
        };
        return Err(SandboxError::OutputLimitExceeded {
            limit: MAX_EXEC_OUTPUT_SIZE,
            truncated_output: Some(truncate_utf8(excerpt, MAX_EXEC_OUTPUT_SIZE).to_string()),
        });
    }
    Ok(result)
}
