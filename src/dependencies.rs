//! External package classification and installed-version resolution.
//!
//! Mirrors what `importlib.metadata` gives a Python process: a stdlib name
//! check plus a site-packages scan mapping distribution names to versions.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::process::Command;

use once_cell::sync::{Lazy, OnceCell};
use tracing::debug;

/// Top-level CPython standard library module names (3.12 vintage), the
/// moral equivalent of `sys.stdlib_module_names`.
const STDLIB_MODULES: &[&str] = &[
    "__future__",
    "_thread",
    "abc",
    "aifc",
    "argparse",
    "array",
    "ast",
    "asyncio",
    "atexit",
    "audioop",
    "base64",
    "bdb",
    "binascii",
    "bisect",
    "builtins",
    "bz2",
    "calendar",
    "cgi",
    "cgitb",
    "chunk",
    "cmath",
    "cmd",
    "code",
    "codecs",
    "codeop",
    "collections",
    "colorsys",
    "compileall",
    "concurrent",
    "configparser",
    "contextlib",
    "contextvars",
    "copy",
    "copyreg",
    "cProfile",
    "crypt",
    "csv",
    "ctypes",
    "curses",
    "dataclasses",
    "datetime",
    "dbm",
    "decimal",
    "difflib",
    "dis",
    "doctest",
    "email",
    "encodings",
    "ensurepip",
    "enum",
    "errno",
    "faulthandler",
    "fcntl",
    "filecmp",
    "fileinput",
    "fnmatch",
    "fractions",
    "ftplib",
    "functools",
    "gc",
    "getopt",
    "getpass",
    "gettext",
    "glob",
    "graphlib",
    "grp",
    "gzip",
    "hashlib",
    "heapq",
    "hmac",
    "html",
    "http",
    "idlelib",
    "imaplib",
    "imghdr",
    "importlib",
    "inspect",
    "io",
    "ipaddress",
    "itertools",
    "json",
    "keyword",
    "lib2to3",
    "linecache",
    "locale",
    "logging",
    "lzma",
    "mailbox",
    "mailcap",
    "marshal",
    "math",
    "mimetypes",
    "mmap",
    "modulefinder",
    "msilib",
    "msvcrt",
    "multiprocessing",
    "netrc",
    "nis",
    "nntplib",
    "ntpath",
    "numbers",
    "operator",
    "optparse",
    "os",
    "ossaudiodev",
    "pathlib",
    "pdb",
    "pickle",
    "pickletools",
    "pipes",
    "pkgutil",
    "platform",
    "plistlib",
    "poplib",
    "posix",
    "posixpath",
    "pprint",
    "profile",
    "pstats",
    "pty",
    "pwd",
    "py_compile",
    "pyclbr",
    "pydoc",
    "queue",
    "quopri",
    "random",
    "re",
    "readline",
    "reprlib",
    "resource",
    "rlcompleter",
    "runpy",
    "sched",
    "secrets",
    "select",
    "selectors",
    "shelve",
    "shlex",
    "shutil",
    "signal",
    "site",
    "smtplib",
    "sndhdr",
    "socket",
    "socketserver",
    "spwd",
    "sqlite3",
    "sre_compile",
    "sre_constants",
    "sre_parse",
    "ssl",
    "stat",
    "statistics",
    "string",
    "stringprep",
    "struct",
    "subprocess",
    "sunau",
    "symtable",
    "sys",
    "sysconfig",
    "syslog",
    "tabnanny",
    "tarfile",
    "telnetlib",
    "tempfile",
    "termios",
    "test",
    "textwrap",
    "threading",
    "time",
    "timeit",
    "tkinter",
    "token",
    "tokenize",
    "tomllib",
    "trace",
    "traceback",
    "tracemalloc",
    "tty",
    "turtle",
    "turtledemo",
    "types",
    "typing",
    "unicodedata",
    "unittest",
    "urllib",
    "uu",
    "uuid",
    "venv",
    "warnings",
    "wave",
    "weakref",
    "webbrowser",
    "winreg",
    "winsound",
    "wsgiref",
    "xdrlib",
    "xml",
    "xmlrpc",
    "zipapp",
    "zipfile",
    "zipimport",
    "zlib",
    "zoneinfo",
];

static STDLIB: Lazy<HashSet<&'static str>> =
    Lazy::new(|| STDLIB_MODULES.iter().copied().collect());

pub fn is_stdlib(name: &str) -> bool {
    STDLIB.contains(name)
}

/// PEP 503-style normalization so import names match `.dist-info` directory
/// names (`Typing-Extensions` and `typing_extensions` collapse together).
fn normalize(name: &str) -> String {
    name.to_ascii_lowercase()
        .chars()
        .map(|c| if c == '-' || c == '.' { '_' } else { c })
        .collect()
}

/// Resolves installed versions of external packages by scanning
/// `*.dist-info` directories in site-packages. Every failure mode here is
/// non-fatal: an unresolvable package simply has no version.
pub struct SitePackages {
    roots: Vec<PathBuf>,
    index: OnceCell<HashMap<String, String>>,
}

impl SitePackages {
    pub fn with_roots(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            index: OnceCell::new(),
        }
    }

    /// Locates site-packages directories: the `CODE_GRAPH_SITE_PACKAGES` env
    /// override, then an active virtualenv, then one `python3` sysconfig
    /// probe.
    pub fn discover() -> Self {
        if let Ok(paths) = std::env::var("CODE_GRAPH_SITE_PACKAGES") {
            return Self::with_roots(std::env::split_paths(&paths).collect());
        }

        let mut roots = Vec::new();
        if let Ok(venv) = std::env::var("VIRTUAL_ENV") {
            roots.extend(venv_site_packages(Path::new(&venv)));
        }
        if roots.is_empty() {
            if let Some(purelib) = python_purelib() {
                roots.push(purelib);
            }
        }
        Self::with_roots(roots)
    }

    pub fn version(&self, import_name: &str) -> Option<String> {
        self.dist_index().get(&normalize(import_name)).cloned()
    }

    fn dist_index(&self) -> &HashMap<String, String> {
        self.index.get_or_init(|| {
            let mut index = HashMap::new();
            for root in &self.roots {
                let Ok(entries) = std::fs::read_dir(root) else {
                    debug!(path = %root.display(), "site-packages not readable");
                    continue;
                };
                for entry in entries.flatten() {
                    let file_name = entry.file_name();
                    let Some(name) = file_name.to_str() else {
                        continue;
                    };
                    let Some(stem) = name.strip_suffix(".dist-info") else {
                        continue;
                    };
                    if let Some((dist, version)) = stem.split_once('-') {
                        index.insert(normalize(dist), version.to_string());
                    }
                }
            }
            index
        })
    }
}

fn venv_site_packages(venv: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let lib = venv.join("lib");
    if let Ok(entries) = std::fs::read_dir(&lib) {
        for entry in entries.flatten() {
            let candidate = entry.path().join("site-packages");
            if candidate.is_dir() {
                found.push(candidate);
            }
        }
    }
    let windows = venv.join("Lib").join("site-packages");
    if windows.is_dir() {
        found.push(windows);
    }
    found
}

fn python_purelib() -> Option<PathBuf> {
    let output = Command::new("python3")
        .args([
            "-c",
            "import sysconfig; print(sysconfig.get_paths()['purelib'])",
        ])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let path = String::from_utf8(output.stdout).ok()?;
    let path = path.trim();
    (!path.is_empty()).then(|| PathBuf::from(path))
}
