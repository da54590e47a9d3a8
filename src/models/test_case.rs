//! Test case model

use std::fmt;
use std::io::Cursor;
use std::pin::Pin;

use tokio::io::{AsyncRead, AsyncReadExt};

/// A readable stream owned by a test case
pub type CaseStream = Pin<Box<dyn AsyncRead + Send>>;

/// An input stream paired with the output it should produce.
///
/// A test case is consumed exactly once by the judge; dropping it closes
/// both streams.
pub struct TestCase {
    /// Identifier derived from the input file's name
    pub id: String,
    pub input: CaseStream,
    pub expected: CaseStream,
}

impl TestCase {
    pub fn new(
        id: impl Into<String>,
        input: impl AsyncRead + Send + 'static,
        expected: impl AsyncRead + Send + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            input: Box::pin(input),
            expected: Box::pin(expected),
        }
    }

    /// Build a test case from in-memory input and expected output
    pub fn from_strings(
        id: impl Into<String>,
        input: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::new(
            id,
            Cursor::new(input.into().into_bytes()),
            Cursor::new(expected.into().into_bytes()),
        )
    }

    /// Drain the input stream into a string
    pub async fn read_input(&mut self) -> std::io::Result<String> {
        let mut buf = Vec::new();
        self.input.read_to_end(&mut buf).await?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase").field("id", &self.id).finish_non_exhaustive()
    }
}
