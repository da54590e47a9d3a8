//! Docker-backed sandbox provider

use async_trait::async_trait;
use bollard::{
    API_DEFAULT_VERSION, Docker,
    errors::Error as DockerError,
    container::{AttachContainerResults, LogOutput},
    models::{ContainerCreateBody, HostConfig},
    query_parameters::{
        AttachContainerOptionsBuilder, CreateContainerOptionsBuilder, LogsOptionsBuilder,
        RemoveContainerOptionsBuilder, StartContainerOptions, WaitContainerOptionsBuilder,
    },
};
use futures::StreamExt;
use uuid::Uuid;

use crate::{
    config::DockerConfig,
    constants::CONTAINER_PREFIX,
    error::{AppResult, JudgeError},
};

use super::{OutputFrame, OutputStream, RunSpec, SandboxHandle, SandboxProvider, StdinWriter};

/// Seconds before a request to the Docker daemon times out
const DOCKER_TIMEOUT_SECS: u64 = 120;

/// Runs each submission in a fresh container
#[derive(Debug, Clone)]
pub struct DockerSandbox {
    docker: Docker,
}

impl DockerSandbox {
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }

    /// Connect using the configured socket, or the platform defaults
    pub fn connect(config: &DockerConfig) -> AppResult<Self> {
        let docker = match &config.socket_path {
            Some(path) => Docker::connect_with_socket(path, DOCKER_TIMEOUT_SECS, API_DEFAULT_VERSION)?,
            None => Docker::connect_with_socket_defaults()?,
        };
        Ok(Self::new(docker))
    }

    /// Version string reported by the daemon
    pub async fn version(&self) -> AppResult<String> {
        let version = self.docker.version().await?;
        Ok(version.version.unwrap_or_default())
    }
}

#[async_trait]
impl SandboxProvider for DockerSandbox {
    async fn run(&self, spec: &RunSpec) -> AppResult<SandboxHandle> {
        // Docker only accepts absolute bind sources
        let bind_path = tokio::fs::canonicalize(&spec.bind_path).await.map_err(|e| {
            JudgeError::Staging(format!(
                "could not resolve {}: {}",
                spec.bind_path.display(),
                e
            ))
        })?;

        let name = format!("{}-{}", CONTAINER_PREFIX, Uuid::new_v4());
        let options = CreateContainerOptionsBuilder::default().name(&name).build();

        let host_config = HostConfig {
            binds: Some(vec![format!(
                "{}:{}",
                bind_path.display(),
                spec.working_dir
            )]),
            ..Default::default()
        };

        let config = ContainerCreateBody {
            image: Some(spec.image.clone()),
            cmd: Some(vec!["sh".to_string(), "-c".to_string(), spec.command.clone()]),
            working_dir: Some(spec.working_dir.clone()),
            attach_stdin: Some(true),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            open_stdin: Some(true),
            stdin_once: Some(true),
            host_config: Some(host_config),
            ..Default::default()
        };

        let container = self.docker.create_container(Some(options), config).await?;
        let handle = SandboxHandle { id: container.id };

        if let Err(e) = self
            .docker
            .start_container(&handle.id, None::<StartContainerOptions>)
            .await
        {
            // The caller never sees this handle, so clean it up here
            if let Err(remove_err) = self.remove(&handle).await {
                tracing::warn!(container = %handle.id, "Failed to remove unstarted container: {}", remove_err);
            }
            return Err(e.into());
        }

        tracing::debug!(container = %handle.id, name = %name, image = %spec.image, "Container started");
        Ok(handle)
    }

    async fn stdin(&self, handle: &SandboxHandle) -> AppResult<StdinWriter> {
        let options = AttachContainerOptionsBuilder::default()
            .stdin(true)
            .stream(true)
            .build();

        let AttachContainerResults { input, .. } = self
            .docker
            .attach_container(&handle.id, Some(options))
            .await?;

        Ok(input)
    }

    async fn output(&self, handle: &SandboxHandle) -> AppResult<OutputStream> {
        let options = LogsOptionsBuilder::default()
            .follow(true)
            .stdout(true)
            .stderr(true)
            .build();

        let frames = self
            .docker
            .logs(&handle.id, Some(options))
            .filter_map(|frame| async move {
                match frame {
                    Ok(LogOutput::StdOut { message }) => Some(Ok(OutputFrame::Stdout(message))),
                    Ok(LogOutput::StdErr { message }) => Some(Ok(OutputFrame::Stderr(message))),
                    Ok(_) => None,
                    Err(e) => Some(Err(JudgeError::from(e))),
                }
            })
            .boxed();

        Ok(frames)
    }

    async fn wait(&self, handle: &SandboxHandle) -> AppResult<i64> {
        let options = WaitContainerOptionsBuilder::default()
            .condition("not-running")
            .build();

        let mut exits = self.docker.wait_container(&handle.id, Some(options));
        let status = match exits.next().await {
            Some(Ok(response)) => response.status_code,
            // bollard reports a non-zero exit as an error carrying the code
            Some(Err(DockerError::DockerContainerWaitError { code, .. })) => code,
            Some(Err(e)) => return Err(e.into()),
            None => {
                return Err(JudgeError::Transport(format!(
                    "wait stream for {} closed unexpectedly",
                    handle.id
                )));
            }
        };

        tracing::debug!(container = %handle.id, status, "Container exited");
        Ok(status)
    }

    async fn remove(&self, handle: &SandboxHandle) -> AppResult<()> {
        let options = RemoveContainerOptionsBuilder::default().force(true).build();

        self.docker
            .remove_container(&handle.id, Some(options))
            .await?;

        tracing::debug!(container = %handle.id, "Container removed");
        Ok(())
    }
}
