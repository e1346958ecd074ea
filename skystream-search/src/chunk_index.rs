//! Bridge to the external chunk index tool.
//!
//! The pre-built spatial index is queried by spawning `assoc`, which
//! applies a conservative positional pre-filter (candidates are always
//! a superset of true matches) plus an optional relational constraint,
//! writes candidates to a match file and reports a JSON status on
//! stdout.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;
use tracing::debug;

use skystream_core::ChunkIndexSpec;

use crate::error::{Result, SearchError};

/// Status report printed by `assoc`.
#[derive(Debug, Deserialize)]
pub struct AssocResponse {
    pub stat: String,
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub props: AssocProps,
}

#[derive(Debug, Default, Deserialize)]
pub struct AssocProps {
    #[serde(rename = "num-recorded-matches", default)]
    pub num_recorded_matches: i64,
}

#[derive(Debug, Clone)]
pub struct ChunkIndexBridge {
    binary: PathBuf,
}

impl Default for ChunkIndexBridge {
    fn default() -> ChunkIndexBridge {
        ChunkIndexBridge {
            binary: PathBuf::from("assoc"),
        }
    }
}

impl ChunkIndexBridge {
    pub fn new() -> ChunkIndexBridge {
        ChunkIndexBridge::default()
    }

    /// Overrides the tool binary, for deployments where `assoc` is not
    /// on the PATH.
    pub fn with_binary(binary: impl Into<PathBuf>) -> ChunkIndexBridge {
        ChunkIndexBridge {
            binary: binary.into(),
        }
    }

    /// Runs the positional pre-filter. Candidates within `radius_deg`
    /// of any position in `pos_file` land in `match_file`, with the
    /// query-side columns prefixed `in_`. Returns the number of
    /// recorded matches.
    pub fn query(
        &self,
        spec: &ChunkIndexSpec,
        pos_file: &Path,
        match_file: &Path,
        radius_deg: f64,
        dbnames: &[String],
        where_clause: Option<&str>,
    ) -> Result<u64> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("-j")
            .arg("-q")
            .arg("-t")
            .arg(pos_file)
            .arg("-I")
            .arg("-T")
            .arg(match_file)
            .arg("-i")
            .arg(&spec.path)
            .arg("-M")
            .arg(format!("{radius_deg:?} deg"))
            .arg("-C")
            .arg(dbnames.join(","))
            .arg("-r")
            .arg(&spec.columns[0])
            .arg("-c")
            .arg("*")
            .arg("-p")
            .arg("in_");
        if let Some(w) = where_clause {
            cmd.arg("-w").arg(w);
        }
        debug!(index = %spec.path.display(), radius_deg, "invoking chunk index");
        let output = cmd.output()?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let response: AssocResponse = serde_json::from_str(stdout.trim())
            .map_err(|_| SearchError::ChunkIndexOutput(stdout.trim().to_owned()))?;
        interpret_response(response)
    }
}

fn interpret_response(response: AssocResponse) -> Result<u64> {
    if response.stat != "OK" {
        return Err(SearchError::ChunkIndex(response.msg));
    }
    Ok(response.props.num_recorded_matches.max(0) as u64)
}
