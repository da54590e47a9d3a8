//! Sandbox provider capability
//!
//! The judge never talks to a container runtime directly. It asks a
//! [`SandboxProvider`] to run a build-and-run command against a bind-mounted
//! directory, then streams stdin in and output frames out through the returned
//! handle. [`DockerSandbox`] is the production provider.

pub mod docker;
pub mod languages;

use std::path::PathBuf;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::{AppResult, JudgeError};

pub use docker::DockerSandbox;
pub use languages::LanguageHandler;

/// Writable stdin of a running sandbox
pub type StdinWriter = Pin<Box<dyn AsyncWrite + Send>>;

/// Live output of a running sandbox, ending when the process exits
pub type OutputStream = BoxStream<'static, AppResult<OutputFrame>>;

/// A chunk of program output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputFrame {
    Stdout(Bytes),
    Stderr(Bytes),
}

/// What to run and where
#[derive(Debug, Clone)]
pub struct RunSpec {
    pub image: String,
    /// Shell command run through `sh -c`
    pub command: String,
    /// Host directory mounted at `working_dir`
    pub bind_path: PathBuf,
    pub working_dir: String,
}

/// Identifies one sandbox instance
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SandboxHandle {
    pub id: String,
}

/// An isolated execution environment runtime.
///
/// Implementations must support many concurrent handles; the only state they
/// may share between handles is their own connection.
#[async_trait]
pub trait SandboxProvider: Send + Sync {
    /// Create and start an instance with stdin left open for one attach
    async fn run(&self, spec: &RunSpec) -> AppResult<SandboxHandle>;

    /// Attach to the instance's stdin
    async fn stdin(&self, handle: &SandboxHandle) -> AppResult<StdinWriter>;

    /// Follow the instance's stdout and stderr until it exits
    async fn output(&self, handle: &SandboxHandle) -> AppResult<OutputStream>;

    /// Wait for the instance to exit and return its exit status
    async fn wait(&self, handle: &SandboxHandle) -> AppResult<i64>;

    /// Force-remove the instance
    async fn remove(&self, handle: &SandboxHandle) -> AppResult<()>;
}

/// Write all of `data` to a sandbox stdin, then close it.
///
/// Partial writes are retried until every byte is delivered. A write that
/// accepts nothing or fails is a transport error; data is never truncated.
pub async fn deliver_stdin<W>(writer: &mut W, data: &[u8]) -> AppResult<usize>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut written = 0;
    while written < data.len() {
        let n = writer
            .write(&data[written..])
            .await
            .map_err(|e| JudgeError::Transport(format!("writing stdin: {}", e)))?;
        if n == 0 {
            return Err(JudgeError::Transport(format!(
                "stdin closed after {} of {} bytes",
                written,
                data.len()
            )));
        }
        written += n;
        tracing::trace!(written, total = data.len(), "Delivered stdin bytes");
    }

    // Judged programs commonly read until end of input
    writer
        .shutdown()
        .await
        .map_err(|e| JudgeError::Transport(format!("closing stdin: {}", e)))?;

    Ok(written)
}
