//! Runtime call tracing.
//!
//! Spawns `python3` with an embedded bootstrap that installs a
//! `sys.setprofile` hook, runs the target program, and dumps caller/callee
//! edge counts to a handoff file. The hook is process-wide, so edges from
//! every traced thread are counted under one lock. The traced program is
//! allowed to fail; whatever was collected up to that point is kept.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{GraphError, Result};

/// Exit code the bootstrap uses when the traced program raised.
const STOPPED_EARLY: i32 = 3;

const PY_BOOTSTRAP: &str = r#"
import json, runpy, sys, threading

handoff = sys.argv[1]
mode = sys.argv[2]
target = sys.argv[3]
sys.argv = [target] + sys.argv[4:]

counts = {}
lock = threading.Lock()

def profiler(frame, event, arg):
    if event != "call":
        return
    callee = frame.f_code.co_name
    back = frame.f_back
    caller = back.f_code.co_name if back else "<top>"
    with lock:
        key = (caller, callee)
        counts[key] = counts.get(key, 0) + 1

status = 0
sys.setprofile(profiler)
try:
    if mode == "module":
        runpy.run_module(target, run_name="__main__")
    else:
        runpy.run_path(target, run_name="__main__")
except BaseException:
    status = 3
finally:
    sys.setprofile(None)

rows = [
    {"caller": caller, "callee": callee, "calls": n}
    for (caller, callee), n in sorted(counts.items())
]
with open(handoff, "w") as fh:
    json.dump(rows, fh)
sys.exit(status)
"#;

/// How the resolved target is handed to `runpy`.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceTarget {
    /// A script file or a directory with `__main__.py`, run by path.
    Path(PathBuf),
    /// An importable module name, run with `runpy.run_module`.
    Module(String),
}

impl TraceTarget {
    /// Directory the child runs from under `--chdir`.
    fn working_dir(&self) -> Option<PathBuf> {
        match self {
            TraceTarget::Path(path) if path.is_file() => {
                path.parent().map(Path::to_path_buf)
            }
            TraceTarget::Path(path) => Some(path.clone()),
            TraceTarget::Module(_) => None,
        }
    }
}

/// Resolves what the user named into something `runpy` can run:
/// a `.py` file directly, a directory via `__main__.py`, a directory's
/// single script, a choice read from stdin when the directory has several,
/// or an importable module name as a last resort.
pub fn resolve_target(target: &str) -> Result<TraceTarget> {
    let path = Path::new(target);

    if path.is_file() {
        if path.extension().and_then(|e| e.to_str()) == Some("py") {
            return Ok(TraceTarget::Path(path.to_path_buf()));
        }
        return Err(GraphError::Trace(format!("{target} is not a python file")));
    }

    if path.is_dir() {
        if path.join("__main__.py").is_file() {
            return Ok(TraceTarget::Path(path.to_path_buf()));
        }
        let scripts = directory_scripts(path)?;
        return match scripts.len() {
            0 => Err(GraphError::Trace(format!(
                "no python files found in {target}"
            ))),
            1 => Ok(TraceTarget::Path(scripts.into_iter().next().unwrap_or_default())),
            _ => {
                let choice = prompt_choice(&scripts, &mut std::io::stdin().lock())?;
                Ok(TraceTarget::Path(choice))
            }
        };
    }

    if module_exists(target) {
        return Ok(TraceTarget::Module(target.to_string()));
    }
    Err(GraphError::Trace(format!("cannot resolve target {target}")))
}

fn directory_scripts(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut scripts = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("py") {
            scripts.push(path);
        }
    }
    scripts.sort();
    Ok(scripts)
}

/// Numbered menu on stderr, answer on stdin. Empty or unparseable input
/// picks the first entry.
fn prompt_choice(scripts: &[PathBuf], input: &mut impl BufRead) -> Result<PathBuf> {
    let mut err = std::io::stderr();
    writeln!(err, "several python files found:")?;
    for (i, script) in scripts.iter().enumerate() {
        writeln!(err, "  {}: {}", i + 1, script.display())?;
    }
    write!(err, "which one to trace [1]: ")?;
    err.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    let index = line.trim().parse::<usize>().unwrap_or(1);
    let index = index.clamp(1, scripts.len()) - 1;
    Ok(scripts[index].clone())
}

fn module_exists(name: &str) -> bool {
    Command::new("python3")
        .args([
            "-c",
            "import importlib.util, sys; sys.exit(0 if importlib.util.find_spec(sys.argv[1]) else 1)",
            name,
        ])
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Traces the target and writes `runtime_calls.json` to the directory the
/// command was launched from. Returns the written path. Failing to capture
/// any edge at all is an error.
pub fn run_trace(target: &str, chdir: bool, args: &[String]) -> Result<PathBuf> {
    let launch_dir = std::env::current_dir()?;
    let resolved = resolve_target(target)?;
    let handoff = std::env::temp_dir().join(format!("code-graph-trace-{}.json", Uuid::new_v4()));

    let mut cmd = Command::new("python3");
    cmd.arg("-c").arg(PY_BOOTSTRAP).arg(&handoff);
    match &resolved {
        TraceTarget::Path(path) => cmd.arg("path").arg(path),
        TraceTarget::Module(name) => cmd.arg("module").arg(name),
    };
    cmd.args(args);
    if chdir {
        if let Some(dir) = resolved.working_dir() {
            cmd.current_dir(dir);
        }
    }

    info!(target = %target, "tracing");
    let status = cmd.status()?;
    if status.code() == Some(STOPPED_EARLY) {
        info!("traced program stopped early, partial data usable");
    }

    let rows = read_handoff(&handoff)?;
    let _ = std::fs::remove_file(&handoff);
    if rows.as_array().is_none_or(|a| a.is_empty()) {
        return Err(GraphError::Trace("no trace data captured".to_string()));
    }

    write_trace(&launch_dir, &rows)
}

fn read_handoff(handoff: &Path) -> Result<serde_json::Value> {
    let text = std::fs::read_to_string(handoff)
        .map_err(|_| GraphError::Trace("no trace data captured".to_string()))?;
    Ok(serde_json::from_str(&text)?)
}

fn write_trace(launch_dir: &Path, rows: &serde_json::Value) -> Result<PathBuf> {
    let json = serde_json::to_string_pretty(rows)?;
    let primary = launch_dir.join("runtime_calls.json");
    match std::fs::write(&primary, &json) {
        Ok(()) => Ok(primary),
        Err(err) => {
            warn!(%err, path = %primary.display(), "falling back to current directory");
            let fallback = PathBuf::from("runtime_calls.json");
            std::fs::write(&fallback, &json)?;
            Ok(fallback)
        }
    }
}
