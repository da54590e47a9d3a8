//! Problem definition model

use serde::{Deserialize, Serialize};

use super::Payload;

/// One example input with its expected output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoExample {
    pub input: String,
    pub output: String,
}

/// Classification tags of a problem
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tags {
    #[serde(default)]
    pub company: Vec<String>,
    #[serde(default)]
    pub difficulty: Vec<String>,
}

/// Descriptive fields read from a problem's `problem.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemMeta {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Tags,
}

/// Everything needed to judge a problem without touching the problem directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeData {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub io: Vec<IoExample>,
    #[serde(default)]
    pub tags: Tags,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution: Option<Payload>,
}

impl JudgeData {
    /// Assemble judge data from its parts
    pub fn from_parts(
        id: impl Into<String>,
        meta: ProblemMeta,
        io: Vec<IoExample>,
        solution: Option<Payload>,
    ) -> Self {
        Self {
            id: id.into(),
            title: meta.title,
            description: meta.description,
            io,
            tags: meta.tags,
            solution,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const RAW: &str = r##"{
      "prob-1": {
        "id": "prob-1",
        "title": "sort in decreasing order",
        "description": "Given an array, sort it in decreasing order",
        "io": [
          {"input": "hello\nhi\n", "output": "5\n2\n"},
          {"input": "hi\nhello\n", "output": "2\n5\n"}
        ],
        "tags": {"company": ["microsoft", "google"], "difficulty": ["easy"]},
        "solution": {
          "files": [{"Name": "main.py", "Content": "pass"}],
          "language": "python",
          "stdin": ""
        }
      },
      "prob-2": {
        "id": "prob-2",
        "io": [],
        "solution": {
          "files": [{"Name": "main.cpp", "Content": "# include <iostream>\nint main() {}"}],
          "language": "cpp",
          "stdin": ""
        }
      }
    }"##;

    #[test]
    fn test_decode_catalog() {
        let data: HashMap<String, JudgeData> = serde_json::from_str(RAW).unwrap();

        let first = &data["prob-1"];
        assert_eq!(first.io.len(), 2);
        assert_eq!(first.io[0].output, "5\n2\n");
        assert_eq!(first.tags.difficulty, ["easy"]);
        assert_eq!(first.solution.as_ref().unwrap().files[0].name, "main.py");

        let second = &data["prob-2"];
        assert!(second.title.is_empty());
        assert!(second.tags.company.is_empty());
        assert_eq!(second.solution.as_ref().unwrap().language, "cpp");
    }
}
