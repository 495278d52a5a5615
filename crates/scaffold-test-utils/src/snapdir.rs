//! Render a whole directory as one string for `insta` snapshots.
//! - Respects `.gitignore` and `.ignore` files, skips `.git`
//! - Includes hidden files such as `.config/.cprc.json`
//! - Only includes UTF-8 text files (CRLF→LF), ignores binary files
//! - Deterministic path order

use ignore::WalkBuilder;
use std::{fs, path::Path};

/// Snapshot `root` against an inline snapshot.
#[macro_export]
macro_rules! assert_dir_snapshot {
    ($root:expr, @$snapshot:literal) => {
        insta::assert_snapshot!($crate::snapdir::dir_manifest($root), @$snapshot)
    };
}

/// `=== <path>` followed by the file body, for every file under `root`.
pub fn dir_manifest(root: impl AsRef<Path>) -> String {
    let base = fs::canonicalize(root.as_ref()).expect("failed to canonicalize root path");

    let mut wb = WalkBuilder::new(&base);
    wb.hidden(false)
        .git_ignore(true)
        .ignore(true)
        .git_exclude(true)
        .git_global(false)
        .parents(false)
        .filter_entry(|dent| dent.file_name() != ".git");

    let mut entries: Vec<(String, String)> = Vec::new();

    for dent in wb.build().filter_map(Result::ok) {
        let p = dent.path();
        if p == base {
            continue;
        }
        let Some(ft) = dent.file_type() else { continue };
        if !ft.is_file() {
            continue;
        }

        let rel = p
            .strip_prefix(&base)
            .expect("path should be within base")
            .to_string_lossy()
            .replace('\\', "/");

        let buf = fs::read(p).expect("failed to read file");
        if let Ok(s) = std::str::from_utf8(&buf) {
            let mut body = s.replace("\r\n", "\n");
            if !body.ends_with('\n') {
                body.push('\n');
            }
            entries.push((rel, body));
        }
    }

    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let mut out = String::new();
    for (rel, body) in entries {
        out.push_str(&format!("=== {rel}\n"));
        out.push_str(&body);
    }
    out
}
