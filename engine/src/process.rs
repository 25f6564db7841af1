//! Subprocess execution context: each job runs in a fresh `repsq worker`.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};

use crate::executor::{ComputeJob, ContextReport, Executor};
use crate::protocol::{WorkerError, WorkerReply, WorkerRequest, decode_line, encode_line};

const MAX_STDERR_BYTES: u64 = 64 * 1024;

/// RAII guard that kills a child process on drop.
///
/// Wrap a spawned child immediately after `spawn()` so an aborted job future
/// cannot leak it. Call `disarm()` once the child has exited on its own.
pub(crate) struct ChildGuard {
    child: Option<Child>,
}

impl ChildGuard {
    pub(crate) fn new(child: Child) -> Self {
        Self { child: Some(child) }
    }

    pub(crate) fn child_mut(&mut self) -> &mut Child {
        self.child.as_mut().expect("child present until disarm")
    }

    pub(crate) fn disarm(&mut self) {
        self.child = None;
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        let Some(child) = self.child.as_mut() else {
            return;
        };
        let _ = child.start_kill();
        let _ = child.try_wait();
    }
}

/// Spawns `<program> worker` per job and speaks the line protocol over stdio.
///
/// Termination is an OS-level kill, so a preempted job stops immediately even
/// mid-convolution.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    program: PathBuf,
    args: Vec<OsString>,
}

impl ProcessExecutor {
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: vec![OsString::from("worker")],
        }
    }

    /// Replace the default `worker` argument list.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// The currently running executable, which carries the `worker` subcommand.
    pub fn current_exe() -> std::io::Result<Self> {
        Ok(Self::new(std::env::current_exe()?))
    }

    async fn run(program: PathBuf, args: Vec<OsString>, job: ComputeJob) -> Result<ContextReport, WorkerError> {
        let mut cmd = Command::new(&program);
        cmd.args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn()?;
        let mut guard = ChildGuard::new(child);

        let stdin = guard.child_mut().stdin.take();
        let stdout = guard.child_mut().stdout.take();
        let stderr = guard.child_mut().stderr.take();
        let (Some(mut stdin), Some(stdout)) = (stdin, stdout) else {
            return Err(WorkerError::Io(std::io::Error::other(
                "failed to capture worker stdio",
            )));
        };

        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::with_capacity(1024);
            if let Some(stderr) = stderr {
                let _ = stderr.take(MAX_STDERR_BYTES).read_to_end(&mut buf).await;
            }
            String::from_utf8_lossy(&buf).into_owned()
        });

        let line = encode_line(&WorkerRequest::new(job.id, &job.request))?;
        stdin.write_all(line.as_bytes()).await?;
        stdin.shutdown().await?;
        drop(stdin);

        let mut reply_line = String::new();
        let read = BufReader::new(stdout).read_line(&mut reply_line).await?;
        let status = guard.child_mut().wait().await?;
        guard.disarm();
        let stderr_text = stderr_task.await.unwrap_or_default();

        if read == 0 {
            tracing::warn!(
                job_id = %job.id,
                %status,
                stderr = %stderr_text.trim(),
                "Worker exited without replying"
            );
            return Err(WorkerError::NoReply);
        }

        match decode_line::<WorkerReply>(&reply_line)? {
            WorkerReply::Completed { job_id, result } => {
                if job_id == job.id {
                    Ok(ContextReport::Finished(result))
                } else {
                    Err(WorkerError::WrongJob {
                        expected: job.id,
                        found: job_id,
                    })
                }
            }
            WorkerReply::Failed {
                job_id: Some(found),
                ..
            } if found != job.id => Err(WorkerError::WrongJob {
                expected: job.id,
                found,
            }),
            WorkerReply::Failed { message, .. } => Ok(ContextReport::Failed(message)),
        }
    }
}

impl Executor for ProcessExecutor {
    fn name(&self) -> &'static str {
        "process"
    }

    fn execute(&self, job: ComputeJob, _interrupt: Arc<AtomicBool>) -> BoxFuture<'static, ContextReport> {
        let program = self.program.clone();
        let args = self.args.clone();
        async move {
            Self::run(program, args, job)
                .await
                .unwrap_or_else(|err| ContextReport::Failed(err.to_string()))
        }
        .boxed()
    }
}
