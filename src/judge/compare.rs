//! Line-by-line comparison of program output with expected output

use std::io;
use std::sync::{Arc, Mutex, PoisonError};

use futures::StreamExt;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::io::StreamReader;

use crate::{
    error::{AppResult, JudgeError},
    sandbox::{OutputFrame, OutputStream},
};

/// Program output kept for single ad-hoc runs
#[derive(Debug, Default)]
pub struct OutputCapture {
    stdout: Mutex<Vec<u8>>,
    stderr: Mutex<Vec<u8>>,
}

impl OutputCapture {
    fn push_stdout(&self, bytes: &[u8]) {
        self.stdout
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(bytes);
    }

    fn push_stderr(&self, bytes: &[u8]) {
        self.stderr
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(bytes);
    }

    pub fn stdout(&self) -> String {
        let buf = self.stdout.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buf).into_owned()
    }

    pub fn stderr(&self) -> String {
        let buf = self.stderr.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

/// Turn sandbox output frames into a readable stdout stream.
///
/// Stderr frames are dropped unless a capture is given.
pub fn stdout_reader(
    output: OutputStream,
    capture: Option<Arc<OutputCapture>>,
) -> impl AsyncBufRead + Send + Unpin {
    let stdout = output.filter_map(move |frame| {
        let capture = capture.clone();
        async move {
            match frame {
                Ok(OutputFrame::Stdout(bytes)) => {
                    if let Some(capture) = &capture {
                        capture.push_stdout(&bytes);
                    }
                    Some(Ok(bytes))
                }
                Ok(OutputFrame::Stderr(bytes)) => {
                    if let Some(capture) = &capture {
                        capture.push_stderr(&bytes);
                    }
                    None
                }
                Err(e) => Some(Err(io::Error::other(e))),
            }
        }
    });

    StreamReader::new(stdout.boxed())
}

/// Compare two streams line by line.
///
/// The first differing line, or the first line present in only one stream,
/// is a mismatch. Both streams must end at the same point.
pub async fn compare_lines<A, E>(mut actual: A, mut expected: E) -> AppResult<()>
where
    A: AsyncBufRead + Unpin,
    E: AsyncBufRead + Unpin,
{
    let mut actual_line = Vec::new();
    let mut expected_line = Vec::new();
    let mut line = 0;

    loop {
        line += 1;
        let got = next_line(&mut actual, &mut actual_line)
            .await
            .map_err(|e| JudgeError::Transport(format!("reading program output: {}", e)))?;
        let want = next_line(&mut expected, &mut expected_line)
            .await
            .map_err(|e| JudgeError::ProblemStore(format!("reading expected output: {}", e)))?;

        match (got, want) {
            (false, false) => return Ok(()),
            (true, true) if actual_line == expected_line => continue,
            (got, want) => {
                return Err(JudgeError::mismatch(
                    line,
                    want.then_some(expected_line.as_slice()),
                    got.then_some(actual_line.as_slice()),
                ));
            }
        }
    }
}

/// Read one line without its terminator; false at end of stream
async fn next_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<bool>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    if reader.read_until(b'\n', buf).await? == 0 {
        return Ok(false);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    Ok(true)
}
