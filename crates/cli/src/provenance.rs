use anyhow::{Context, Result};
use qcar::controller::TrainReport;
use qcar::SimCfg;
use serde::Serialize;
use std::ffi::OsString;
use std::fs;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::process::Command;

/// What a training run used and produced.
pub struct Payload<'a> {
    pub cfg: &'a SimCfg,
    /// Track file requested on the command line (`None` = built-in corridor).
    pub track: Option<&'a Path>,
    pub report: &'a TrainReport,
}

#[derive(Serialize)]
struct Callsite {
    file: &'static str,
    line: u32,
}

#[derive(Serialize)]
struct Sidecar<'a> {
    code_rev: String,
    version: &'static str,
    callsite: Callsite,
    cfg: &'a SimCfg,
    track: Option<String>,
    report: &'a TrainReport,
    outputs: Vec<String>,
}

/// Write `<table>.provenance.json` next to a saved Q-table.
#[track_caller]
pub fn write_sidecar(table: &Path, payload: Payload<'_>) -> Result<PathBuf> {
    let path = provenance_path(table);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating provenance dir {}", parent.display()))?;
        }
    }
    let caller = Location::caller();
    let doc = Sidecar {
        code_rev: current_git_rev(),
        version: qcar::VERSION,
        callsite: Callsite {
            file: caller.file(),
            line: caller.line(),
        },
        cfg: payload.cfg,
        track: payload.track.map(|p| p.display().to_string()),
        report: payload.report,
        outputs: vec![table.display().to_string()],
    };
    fs::write(&path, serde_json::to_vec_pretty(&doc)?)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

fn provenance_path(table: &Path) -> PathBuf {
    let mut name = table
        .file_stem()
        .map_or_else(|| OsString::from("q_table"), |s| s.to_os_string());
    name.push(".provenance.json");
    table.with_file_name(name)
}

/// Commit hash from `GIT_COMMIT` (build time, then run time) or `git`.
fn current_git_rev() -> String {
    let from_env = option_env!("GIT_COMMIT")
        .map(str::to_string)
        .or_else(|| std::env::var("GIT_COMMIT").ok())
        .filter(|rev| !rev.is_empty());
    if let Some(rev) = from_env {
        return rev;
    }
    Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|out| out.status.success())
        .and_then(|out| String::from_utf8(out.stdout).ok())
        .map(|rev| rev.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
