//! Problem store backed by a problems directory
//!
//! Layout of one problem:
//!
//! ```text
//! <root>/<id>/
//!     problem.json              optional title, description and tags
//!     testcases/input01.txt     paired with testcases/output01.txt
//!     solution.json             reference solution payload, or
//!     solution/<language>/...   reference solution sources
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::{
    constants::{
        languages,
        store_layout::{
            INPUT_MARKER, OUTPUT_MARKER, PROBLEM_FILE, SOLUTION_DIR, SOLUTION_FILE, TESTCASES_DIR,
        },
    },
    error::{AppResult, JudgeError},
    models::{IoExample, JudgeData, Payload, ProblemMeta, ProblemRef, TestCase},
    sandbox::LanguageHandler,
};

use super::{Catalog, ProblemStore};

/// An input file and the expected output file it is paired with
#[derive(Debug, Clone, PartialEq, Eq)]
struct CasePaths {
    id: String,
    input: PathBuf,
    expected: PathBuf,
}

/// Problem store reading fixtures straight from disk
#[derive(Debug, Clone)]
pub struct DirProblemStore {
    root: PathBuf,
}

impl DirProblemStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load the reference solution, optionally from a preferred language's
    /// sources only
    pub async fn read_solution(&self, problem_id: &str, preferred: Option<&str>) -> AppResult<Payload> {
        let dir = self.problem_dir(problem_id)?;
        read_solution_in(&dir, problem_id, preferred).await
    }

    /// Build the full definition of one problem
    pub async fn load_problem(&self, problem_id: &str) -> AppResult<JudgeData> {
        let dir = self.problem_dir(problem_id)?;
        load_problem_in(&dir, problem_id).await
    }

    /// Load every problem under the root.
    ///
    /// A root that itself has a `testcases` directory is a single problem
    /// named after the root. Subdirectories without test cases are skipped.
    pub async fn load_all(&self) -> AppResult<Catalog> {
        let mut catalog = Catalog::default();

        if is_dir(&self.root.join(TESTCASES_DIR)).await {
            let id = self
                .root
                .canonicalize()
                .ok()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
                .ok_or_else(|| {
                    JudgeError::ProblemStore(format!(
                        "cannot name problem at {}",
                        self.root.display()
                    ))
                })?;
            catalog.insert(load_problem_in(&self.root, &id).await?);
            return Ok(catalog);
        }

        let mut ids = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| io_error("reading", &self.root, e))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| io_error("reading", &self.root, e))?
        {
            if is_dir(&entry.path().join(TESTCASES_DIR)).await {
                ids.push(entry.file_name().to_string_lossy().into_owned());
            } else {
                tracing::debug!(path = %entry.path().display(), "Skipping entry without test cases");
            }
        }
        ids.sort();

        for id in ids {
            catalog.insert(load_problem_in(&self.root.join(&id), &id).await?);
        }
        tracing::info!(root = %self.root.display(), problems = catalog.len(), "Loaded problems");
        Ok(catalog)
    }

    fn problem_dir(&self, problem_id: &str) -> AppResult<PathBuf> {
        if problem_id.is_empty()
            || problem_id == "."
            || problem_id == ".."
            || problem_id.contains(['/', '\\'])
        {
            return Err(JudgeError::ProblemStore(format!(
                "invalid problem id: {:?}",
                problem_id
            )));
        }
        Ok(self.root.join(problem_id))
    }
}

#[async_trait]
impl ProblemStore for DirProblemStore {
    async fn test_cases(&self, problem_id: &str) -> AppResult<Vec<TestCase>> {
        let dir = self.problem_dir(problem_id)?;

        let mut cases = Vec::new();
        for paths in case_paths(&dir).await? {
            let input = tokio::fs::File::open(&paths.input)
                .await
                .map_err(|e| io_error("opening", &paths.input, e))?;
            let expected = tokio::fs::File::open(&paths.expected)
                .await
                .map_err(|e| io_error("opening", &paths.expected, e))?;
            cases.push(TestCase::new(paths.id, input, expected));
        }

        tracing::debug!(problem = %problem_id, cases = cases.len(), "Loaded test cases");
        Ok(cases)
    }

    async fn reference_solution(&self, problem_id: &str) -> AppResult<Payload> {
        self.read_solution(problem_id, None).await
    }
}

/// Pair every input file with its expected output, sorted by input name
async fn case_paths(problem_dir: &Path) -> AppResult<Vec<CasePaths>> {
    let dir = problem_dir.join(TESTCASES_DIR);
    let mut entries = tokio::fs::read_dir(&dir)
        .await
        .map_err(|e| io_error("reading", &dir, e))?;

    let mut cases = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| io_error("reading", &dir, e))?
    {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.contains(INPUT_MARKER) {
            continue;
        }

        let expected = dir.join(name.replacen(INPUT_MARKER, OUTPUT_MARKER, 1));
        if !tokio::fs::try_exists(&expected).await.unwrap_or(false) {
            return Err(JudgeError::ProblemStore(format!(
                "missing expected output {} for {}",
                expected.display(),
                name
            )));
        }

        cases.push(CasePaths {
            input: entry.path(),
            expected,
            id: name,
        });
    }

    cases.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(cases)
}

async fn load_problem_in(dir: &Path, problem_id: &str) -> AppResult<JudgeData> {
    let meta = match tokio::fs::read(dir.join(PROBLEM_FILE)).await {
        Ok(raw) => serde_json::from_slice::<ProblemMeta>(&raw)?,
        Err(e) if e.kind() == ErrorKind::NotFound => ProblemMeta::default(),
        Err(e) => return Err(io_error("reading", &dir.join(PROBLEM_FILE), e)),
    };

    let mut io = Vec::new();
    for paths in case_paths(dir).await? {
        io.push(IoExample {
            input: read_text(&paths.input).await?,
            output: read_text(&paths.expected).await?,
        });
    }

    let solution = match read_solution_in(dir, problem_id, None).await {
        Ok(solution) => Some(solution),
        Err(e) => {
            tracing::warn!(problem = %problem_id, "No usable reference solution: {}", e);
            None
        }
    };

    Ok(JudgeData::from_parts(problem_id, meta, io, solution))
}

/// `solution.json` wins; otherwise the first language directory under
/// `solution/` holding matching sources
async fn read_solution_in(
    dir: &Path,
    problem_id: &str,
    preferred: Option<&str>,
) -> AppResult<Payload> {
    match tokio::fs::read(dir.join(SOLUTION_FILE)).await {
        Ok(raw) => {
            let mut payload: Payload = serde_json::from_slice(&raw)?;
            payload.problem.get_or_insert_with(|| ProblemRef {
                id: problem_id.to_string(),
            });
            return Ok(payload);
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(io_error("reading", &dir.join(SOLUTION_FILE), e)),
    }

    let candidates = match preferred {
        Some(language) => vec![language],
        None => languages::ALL.to_vec(),
    };
    for language in candidates {
        let handler = LanguageHandler::for_language(language)
            .map_err(|e| JudgeError::ProblemStore(e.to_string()))?;
        let sources = dir.join(SOLUTION_DIR).join(language);
        if !is_dir(&sources).await {
            continue;
        }

        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(&sources)
            .await
            .map_err(|e| io_error("reading", &sources, e))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| io_error("reading", &sources, e))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            if handler.matches_file(&name) {
                names.push(name);
            }
        }
        names.sort();
        if names.is_empty() {
            continue;
        }

        let mut payload = Payload::new(problem_id, handler.language());
        for name in names {
            let content = read_text(&sources.join(&name)).await?;
            payload = payload.with_file(name, content);
        }
        return Ok(payload);
    }

    Err(JudgeError::ProblemStore(format!(
        "no reference solution for {}",
        problem_id
    )))
}

async fn read_text(path: &Path) -> AppResult<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| io_error("reading", path, e))
}

async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
}

fn io_error(action: &str, path: &Path, e: std::io::Error) -> JudgeError {
    JudgeError::ProblemStore(format!("{} {}: {}", action, path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn seed_problem(root: &Path, id: &str) {
        let dir = root.join(id);
        write(&dir.join("testcases/input01.txt"), "hello\nhi\n");
        write(&dir.join("testcases/output01.txt"), "5\n2\n");
        write(&dir.join("testcases/input00.txt"), "hi\n");
        write(&dir.join("testcases/output00.txt"), "2\n");
        write(
            &dir.join("problem.json"),
            r#"{"title": "line lengths", "tags": {"difficulty": ["easy"]}}"#,
        );
        write(&dir.join("solution/python/abc.py"), "print(len(input()))\n");
        write(&dir.join("solution/python/abc.pyc"), "\u{0}bytecode");
    }

    #[tokio::test]
    async fn test_cases_paired_and_sorted() {
        let root = tempfile::tempdir().unwrap();
        seed_problem(root.path(), "prob-1");
        let store = DirProblemStore::new(root.path());

        let mut cases = store.test_cases("prob-1").await.unwrap();
        let ids: Vec<_> = cases.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["input00.txt", "input01.txt"]);

        assert_eq!(cases[1].read_input().await.unwrap(), "hello\nhi\n");
        let mut expected = String::new();
        cases[1].expected.read_to_string(&mut expected).await.unwrap();
        assert_eq!(expected, "5\n2\n");
    }

    #[tokio::test]
    async fn test_missing_fixtures_are_store_errors() {
        let root = tempfile::tempdir().unwrap();
        let store = DirProblemStore::new(root.path());

        let err = store.test_cases("prob-1").await.unwrap_err();
        assert!(matches!(err, JudgeError::ProblemStore(_)));

        write(&root.path().join("prob-2/testcases/input01.txt"), "1\n");
        let err = store.test_cases("prob-2").await.unwrap_err();
        assert!(err.to_string().contains("missing expected output"));

        let err = store.test_cases("../prob-1").await.unwrap_err();
        assert!(err.to_string().contains("invalid problem id"));
    }

    #[tokio::test]
    async fn test_solution_sources_filtered_by_extension() {
        let root = tempfile::tempdir().unwrap();
        seed_problem(root.path(), "prob-1");
        let store = DirProblemStore::new(root.path());

        let solution = store.reference_solution("prob-1").await.unwrap();

        assert_eq!(solution.language, "python");
        assert_eq!(solution.problem_id().unwrap(), "prob-1");
        let names: Vec<_> = solution.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["abc.py"]);

        let err = store.read_solution("prob-1", Some("go")).await.unwrap_err();
        assert!(err.to_string().contains("no reference solution"));
    }

    #[tokio::test]
    async fn test_solution_json_preferred() {
        let root = tempfile::tempdir().unwrap();
        seed_problem(root.path(), "prob-1");
        write(
            &root.path().join("prob-1/solution.json"),
            r#"{"language": "cpp", "files": [{"Name": "main.cpp", "Content": "int main() {}"}]}"#,
        );
        let store = DirProblemStore::new(root.path());

        let solution = store.reference_solution("prob-1").await.unwrap();

        assert_eq!(solution.language, "cpp");
        assert_eq!(solution.files[0].name, "main.cpp");
        assert_eq!(solution.problem_id().unwrap(), "prob-1");
    }

    #[tokio::test]
    async fn test_load_all() {
        let root = tempfile::tempdir().unwrap();
        seed_problem(root.path(), "prob-1");
        seed_problem(root.path(), "prob-2");
        std::fs::create_dir_all(root.path().join("drafts")).unwrap();
        let store = DirProblemStore::new(root.path());

        let catalog = store.load_all().await.unwrap();

        assert_eq!(catalog.len(), 2);
        let problem = catalog.get("prob-1").unwrap();
        assert_eq!(problem.title, "line lengths");
        assert_eq!(problem.tags.difficulty, ["easy"]);
        assert_eq!(problem.io.len(), 2);
        assert_eq!(problem.io[1].output, "5\n2\n");
        assert!(problem.solution.is_some());
    }

    #[tokio::test]
    async fn test_root_as_single_problem() {
        let root = tempfile::tempdir().unwrap();
        seed_problem(root.path(), "prob-1");
        let store = DirProblemStore::new(root.path().join("prob-1"));

        let catalog = store.load_all().await.unwrap();

        assert_eq!(catalog.len(), 1);
        assert!(catalog.get("prob-1").is_some());
    }
}
