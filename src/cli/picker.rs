//! `ptl --pick`: choose a saved snapshot interactively.
//!
//! Candidates are `*.json` files under the working directory that actually
//! load as snapshots: a `ptl snapshot` file (`fetchedAt` + `products`) or a
//! bare product array saved straight from the endpoint. Other JSON files
//! (package manifests, editor settings, ...) are skipped during discovery, so
//! the list only offers files `--snapshot` would accept.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::AppError;
use crate::io::read_snapshot_json;

/// How many directory levels below the working directory are searched.
const SEARCH_DEPTH: usize = 4;

/// Directories never searched.
const SKIP_DIRS: [&str; 4] = [".git", "target", "node_modules", "debug"];

/// A file that loaded as a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotCandidate {
    pub path: PathBuf,
    pub source: String,
    pub fetched_at: DateTime<Utc>,
    pub products: usize,
}

impl SnapshotCandidate {
    fn label(&self) -> String {
        format!(
            "{}  {} product(s), {} at {}",
            display_path(&self.path),
            self.products,
            self.source,
            self.fetched_at.format("%Y-%m-%d %H:%M UTC")
        )
    }
}

/// What the user typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Choice {
    /// Empty line: the newest snapshot.
    Newest,
    Number(usize),
    Path(PathBuf),
    Quit,
}

fn parse_choice(line: &str) -> Choice {
    let line = line.trim();
    if line.is_empty() {
        Choice::Newest
    } else if line.eq_ignore_ascii_case("q") {
        Choice::Quit
    } else if let Ok(n) = line.parse::<usize>() {
        Choice::Number(n)
    } else {
        Choice::Path(PathBuf::from(line))
    }
}

/// List snapshots found under the working directory and ask for one.
pub fn prompt_for_snapshot_path() -> Result<PathBuf, AppError> {
    let candidates = discover_snapshots(Path::new("."), SEARCH_DEPTH);
    if candidates.is_empty() {
        return Err(AppError::usage(
            "No snapshots found. Save one with `ptl snapshot --out <file.json>`.",
        ));
    }

    let stdin = io::stdin();
    choose(&candidates, &mut stdin.lock(), &mut io::stdout())
}

fn choose<R: BufRead, W: Write>(candidates: &[SnapshotCandidate], input: &mut R, out: &mut W) -> Result<PathBuf, AppError> {
    let io_err = |e: io::Error| AppError::usage(format!("Snapshot prompt failed: {e}"));

    writeln!(out, "Snapshots (newest first):").map_err(io_err)?;
    for (i, c) in candidates.iter().enumerate() {
        writeln!(out, "{:>3}) {}", i + 1, c.label()).map_err(io_err)?;
    }

    loop {
        write!(out, "Pick 1-{}, Enter for newest, a path, or q: ", candidates.len()).map_err(io_err)?;
        out.flush().map_err(io_err)?;

        let mut line = String::new();
        if input.read_line(&mut line).map_err(io_err)? == 0 {
            return Err(AppError::usage(
                "No selection made. Pass `--snapshot <file.json>` instead of `--pick`.",
            ));
        }

        let picked = match parse_choice(&line) {
            Choice::Quit => return Err(AppError::usage("Canceled.")),
            Choice::Newest => candidates.first().map(|c| c.path.clone()),
            Choice::Number(n) => n.checked_sub(1).and_then(|i| candidates.get(i)).map(|c| c.path.clone()),
            Choice::Path(path) => match inspect_snapshot(&path) {
                Ok(c) => Some(c.path),
                Err(err) => {
                    writeln!(out, "{err}").map_err(io_err)?;
                    continue;
                }
            },
        };
        match picked {
            Some(path) => return Ok(path),
            None => writeln!(out, "No snapshot with that number.").map_err(io_err)?,
        }
    }
}

/// Load `path` as a snapshot and describe it.
///
/// Fails for missing files, non-JSON, JSON that is neither a snapshot object
/// nor a product array, and arrays with no usable product entry.
pub fn inspect_snapshot(path: &Path) -> Result<SnapshotCandidate, AppError> {
    if path.is_dir() {
        return Err(AppError::usage(format!("{} is a directory, not a snapshot.", path.display())));
    }
    let loaded = read_snapshot_json(path)?;
    if loaded.ingest.products.is_empty() && !loaded.ingest.dropped.is_empty() {
        return Err(AppError::usage(format!(
            "{} has no usable products ({} entries skipped).",
            path.display(),
            loaded.ingest.dropped.len()
        )));
    }
    Ok(SnapshotCandidate {
        path: path.to_path_buf(),
        source: loaded.source,
        fetched_at: loaded.fetched_at,
        products: loaded.ingest.products.len(),
    })
}

/// Snapshots under `root`, newest first (path breaks ties).
pub fn discover_snapshots(root: &Path, max_depth: usize) -> Vec<SnapshotCandidate> {
    let mut found: Vec<SnapshotCandidate> = json_files(root, max_depth)
        .into_iter()
        .filter_map(|path| match inspect_snapshot(&path) {
            Ok(c) => Some(c),
            Err(err) => {
                debug!(path = %path.display(), "not a snapshot: {err}");
                None
            }
        })
        .collect();
    found.sort_by(|a, b| b.fetched_at.cmp(&a.fetched_at).then_with(|| a.path.cmp(&b.path)));
    found
}

/// Breadth-first walk collecting `*.json` files.
fn json_files(root: &Path, max_depth: usize) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut pending = vec![(root.to_path_buf(), 0usize)];
    while let Some((dir, depth)) = pending.pop() {
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            match entry.file_type() {
                Ok(t) if t.is_dir() && depth < max_depth && !is_skipped(&path) => pending.push((path, depth + 1)),
                Ok(t) if t.is_file() && is_json(&path) => files.push(path),
                _ => {}
            }
        }
    }
    files
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn is_skipped(dir: &Path) -> bool {
    dir.file_name()
        .and_then(|s| s.to_str())
        .is_some_and(|name| SKIP_DIRS.contains(&name))
}

fn display_path(path: &Path) -> String {
    path.strip_prefix(".").unwrap_or(path).display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ptl-picker-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn snapshot_body(fetched_at: &str, ids: &[&str]) -> String {
        let products: Vec<String> = ids
            .iter()
            .map(|id| format!(r#"{{"productId": "{id}", "actualSeries": [{{"daysBefore": 3, "cumulative": 1}}]}}"#))
            .collect();
        format!(
            r#"{{"tool": "ptl", "source": "api", "fetchedAt": "{fetched_at}", "products": [{}]}}"#,
            products.join(",")
        )
    }

    #[test]
    fn discovery_keeps_only_loadable_snapshots() {
        let dir = temp_dir("discover");
        fs::write(dir.join("old.json"), snapshot_body("2026-01-01T00:00:00Z", &["a"])).unwrap();
        fs::write(dir.join("new.json"), snapshot_body("2026-06-01T00:00:00Z", &["a", "b"])).unwrap();
        fs::write(dir.join("package.json"), r#"{"name": "site", "version": "1.0.0"}"#).unwrap();
        fs::write(dir.join("junk.json"), "[1, 2, 3]").unwrap();
        fs::write(dir.join("broken.json"), "{").unwrap();
        fs::create_dir_all(dir.join("target")).unwrap();
        fs::write(dir.join("target").join("t.json"), snapshot_body("2026-09-01T00:00:00Z", &["z"])).unwrap();

        let found = discover_snapshots(&dir, 2);
        let names: Vec<_> = found
            .iter()
            .filter_map(|c| c.path.file_name().and_then(|n| n.to_str()))
            .collect();
        assert_eq!(names, vec!["new.json", "old.json"]);
        assert_eq!(found[0].products, 2);
        assert_eq!(found[0].source, "api");
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn depth_limit_is_respected() {
        let dir = temp_dir("depth");
        let deep = dir.join("a").join("b");
        fs::create_dir_all(&deep).unwrap();
        fs::write(deep.join("s.json"), snapshot_body("2026-01-01T00:00:00Z", &["a"])).unwrap();
        assert!(discover_snapshots(&dir, 1).is_empty());
        assert_eq!(discover_snapshots(&dir, 2).len(), 1);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn bare_product_array_is_a_snapshot() {
        let dir = temp_dir("bare");
        let file = dir.join("raw.json");
        fs::write(&file, r#"[{"productId": "x"}]"#).unwrap();
        let c = inspect_snapshot(&file).unwrap();
        assert_eq!(c.products, 1);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn choices_parse() {
        assert_eq!(parse_choice("\n"), Choice::Newest);
        assert_eq!(parse_choice(" 2 "), Choice::Number(2));
        assert_eq!(parse_choice("Q"), Choice::Quit);
        assert_eq!(parse_choice("snaps/x.json"), Choice::Path(PathBuf::from("snaps/x.json")));
    }

    #[test]
    fn prompt_retries_until_a_snapshot_is_chosen() {
        let dir = temp_dir("prompt");
        let notes = dir.join("notes.json");
        fs::write(&notes, r#"{"todo": []}"#).unwrap();
        fs::write(dir.join("s.json"), snapshot_body("2026-02-01T00:00:00Z", &["a"])).unwrap();
        let candidates = discover_snapshots(&dir, 0);

        let typed = format!("0\n{}\n1\n", notes.display());
        let mut out = Vec::new();
        let picked = choose(&candidates, &mut Cursor::new(typed), &mut out).unwrap();
        assert_eq!(picked, candidates[0].path);

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("1 product(s), api at 2026-02-01 00:00 UTC"));
        assert!(printed.contains("No snapshot with that number."));
        assert!(printed.contains("missing `products`"));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn enter_picks_newest_and_q_or_eof_cancel() {
        let candidates = vec![
            SnapshotCandidate {
                path: PathBuf::from("new.json"),
                source: "api".to_string(),
                fetched_at: Utc::now(),
                products: 1,
            },
            SnapshotCandidate {
                path: PathBuf::from("old.json"),
                source: "api".to_string(),
                fetched_at: DateTime::<Utc>::UNIX_EPOCH,
                products: 1,
            },
        ];
        assert_eq!(
            choose(&candidates, &mut Cursor::new("\n"), &mut Vec::new()).unwrap(),
            PathBuf::from("new.json")
        );
        let err = choose(&candidates, &mut Cursor::new("q\n"), &mut Vec::new()).unwrap_err();
        assert_eq!(err.to_string(), "Canceled.");
        assert!(choose(&candidates, &mut Cursor::new(""), &mut Vec::new()).is_err());
    }
}
