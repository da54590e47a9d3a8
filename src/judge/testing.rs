//! In-process sandbox used by the judge tests.
//!
//! The "program" an instance runs is chosen from the staged sources:
//! anything containing `syntax error` fails to build and exits 1, anything
//! calling `len(` prints the length of each input line, anything mentioning
//! `wrong` prints `wrong`, everything else echoes its input.
//! Input starting with `hang`, `crash` or `slow` changes how the run behaves.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, DuplexStream};

use crate::{
    config::Config,
    error::{AppResult, JudgeError},
    models::Payload,
    sandbox::{OutputFrame, OutputStream, RunSpec, SandboxHandle, SandboxProvider, StdinWriter},
    store::Catalog,
};

use super::Judge;

#[derive(Debug, Clone, Copy)]
enum Program {
    Broken,
    LineLengths,
    Wrong,
    Echo,
}

impl Program {
    fn detect(sources: &str) -> Self {
        if sources.contains("syntax error") {
            Program::Broken
        } else if sources.contains("len(") {
            Program::LineLengths
        } else if sources.contains("wrong") {
            Program::Wrong
        } else {
            Program::Echo
        }
    }

    fn run(self, input: &str) -> OutputFrame {
        let stdout = match self {
            Program::Broken => {
                return OutputFrame::Stderr(Bytes::from_static(b"SyntaxError: invalid syntax\n"));
            }
            Program::LineLengths => input
                .lines()
                .map(|line| format!("{}\n", line.trim().len()))
                .collect::<String>(),
            Program::Wrong => "wrong\n".to_string(),
            Program::Echo => input.to_string(),
        };
        OutputFrame::Stdout(Bytes::from(stdout))
    }

    fn exit_status(self) -> i64 {
        match self {
            Program::Broken => 1,
            _ => 0,
        }
    }
}

struct Instance {
    program: Program,
    stdin: Option<DuplexStream>,
    input: Option<DuplexStream>,
}

#[derive(Default)]
pub(crate) struct FakeSandbox {
    instances: Mutex<HashMap<String, Instance>>,
    created: AtomicUsize,
    removed: AtomicUsize,
    live: AtomicUsize,
    peak: AtomicUsize,
}

impl FakeSandbox {
    pub(crate) fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub(crate) fn removed(&self) -> usize {
        self.removed.load(Ordering::SeqCst)
    }

    pub(crate) fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub(crate) fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn with_instance<T>(
        &self,
        handle: &SandboxHandle,
        f: impl FnOnce(&mut Instance) -> Option<T>,
    ) -> AppResult<T> {
        let mut instances = self.instances.lock().unwrap();
        let instance = instances
            .get_mut(&handle.id)
            .ok_or_else(|| JudgeError::Transport(format!("no such container: {}", handle.id)))?;
        f(instance).ok_or_else(|| JudgeError::Transport("already attached".into()))
    }
}

#[async_trait]
impl SandboxProvider for FakeSandbox {
    async fn run(&self, spec: &RunSpec) -> AppResult<SandboxHandle> {
        let mut sources = String::new();
        for entry in std::fs::read_dir(&spec.bind_path).unwrap() {
            sources.push_str(&std::fs::read_to_string(entry.unwrap().path()).unwrap());
        }

        let id = format!("fake-{}", self.created.fetch_add(1, Ordering::SeqCst));
        let live = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(live, Ordering::SeqCst);

        let (stdin, input) = tokio::io::duplex(4096);
        self.instances.lock().unwrap().insert(
            id.clone(),
            Instance {
                program: Program::detect(&sources),
                stdin: Some(stdin),
                input: Some(input),
            },
        );
        Ok(SandboxHandle { id })
    }

    async fn stdin(&self, handle: &SandboxHandle) -> AppResult<StdinWriter> {
        let writer = self.with_instance(handle, |instance| instance.stdin.take())?;
        Ok(Box::pin(writer))
    }

    async fn output(&self, handle: &SandboxHandle) -> AppResult<OutputStream> {
        let (program, mut input) =
            self.with_instance(handle, |instance| Some((instance.program, instance.input.take()?)))?;

        let frames = async move {
            let mut stdin = String::new();
            if let Err(e) = input.read_to_string(&mut stdin).await {
                return broken(e.to_string());
            }

            if stdin.starts_with("hang") {
                return stream::pending::<AppResult<OutputFrame>>().boxed();
            }
            if stdin.starts_with("crash") {
                tokio::time::sleep(Duration::from_millis(20)).await;
                return broken("connection reset by peer".to_string());
            }
            if stdin.starts_with("slow") {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }

            stream::iter(vec![Ok(program.run(&stdin))]).boxed()
        };

        Ok(stream::once(frames).flatten().boxed())
    }

    async fn wait(&self, handle: &SandboxHandle) -> AppResult<i64> {
        self.with_instance(handle, |instance| Some(instance.program.exit_status()))
    }

    async fn remove(&self, handle: &SandboxHandle) -> AppResult<()> {
        if self.instances.lock().unwrap().remove(&handle.id).is_none() {
            return Err(JudgeError::Transport(format!("no such container: {}", handle.id)));
        }
        self.removed.fetch_add(1, Ordering::SeqCst);
        self.live.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

fn broken(message: String) -> OutputStream {
    stream::iter(vec![Err(JudgeError::Transport(message))]).boxed()
}

/// A config whose staging directories land in a fresh temporary root
pub(crate) fn workspace() -> (TempDir, Config) {
    let root = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.storage.workspace_dir = root.path().to_path_buf();
    (root, config)
}

pub(crate) fn judge_with(sandbox: Arc<FakeSandbox>, store: Catalog, config: Config) -> Judge {
    Judge::new(sandbox, Arc::new(store), config)
}

pub(crate) fn line_length_payload() -> Payload {
    Payload::new("prob-1", "python").with_file(
        "main.py",
        "import sys\nfor line in sys.stdin:\n    print(len(line.strip()))\n",
    )
}

pub(crate) fn echo_payload() -> Payload {
    Payload::new("prob-1", "python").with_file(
        "main.py",
        "import sys\nsys.stdout.write(sys.stdin.read())\n",
    )
}

pub(crate) fn wrong_payload() -> Payload {
    Payload::new("prob-1", "python").with_file("main.py", "print('wrong')\n")
}

/// Poll until every instance created on `sandbox` has been removed
pub(crate) async fn wait_until_idle(sandbox: &FakeSandbox) {
    for _ in 0..100 {
        if sandbox.live() == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
