//! Shell-script transcoders
//!
//! Each script receives the real transcoder argument list, picks out the value
//! after `-i` into `$input`, then runs the given body. Unix only.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Prologue that extracts the `-i` argument into `$input`
const PARSE_INPUT: &str = r#"#!/bin/sh
input=""
while [ $# -gt 0 ]; do
  if [ "$1" = "-i" ]; then
    shift
    input="$1"
  fi
  shift
done
"#;

pub struct FakeTranscoder {
    dir: TempDir,
    path: PathBuf,
}

impl FakeTranscoder {
    /// Write an executable script whose body runs after argument parsing
    pub fn new(body: &str) -> Self {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let path = dir.path().join("fake-ffmpeg");

        std::fs::write(&path, format!("{}{}\n", PARSE_INPUT, body)).expect("Should write script");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("Should chmod script");

        Self { dir, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Scratch directory that lives as long as the transcoder
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}
