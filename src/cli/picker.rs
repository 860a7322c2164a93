//! Interactive CSV picker.
//!
//! Kept separate from clap parsing: clap handles structured flags, the picker covers
//! "run `fitclean` and choose a CSV". It lists `*.csv` files under the working
//! directory; previous `cleaned_*.csv` exports are listed after the raw files.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use crate::error::AppError;

const DEFAULT_SEARCH_DEPTH: usize = 4;

/// Prompt on stdin/stdout for a CSV path.
///
/// Accepts a number from the list or an explicit path; `q` cancels.
pub fn prompt_for_csv_path() -> Result<PathBuf, AppError> {
    let files = discover_csv_files(Path::new("."));
    if files.is_empty() {
        return Err(AppError::new(
            2,
            "No .csv files found. Provide one with `fitclean clean -f <file.csv>`.",
        ));
    }

    let stdin = io::stdin();
    let stdout = io::stdout();
    choose_from(&files, &mut stdin.lock(), &mut stdout.lock())
}

fn choose_from<R: BufRead, W: Write>(files: &[PathBuf], input: &mut R, out: &mut W) -> Result<PathBuf, AppError> {
    let io_err = |e: io::Error| AppError::new(2, format!("Terminal I/O failed: {e}"));

    writeln!(out, "Found {} CSV file(s):", files.len()).map_err(io_err)?;
    for (idx, path) in files.iter().enumerate() {
        writeln!(out, "{:>3}) {}", idx + 1, pretty_path(path)).map_err(io_err)?;
    }

    loop {
        write!(out, "Select a file by number (1-{}) or type a path (q to quit): ", files.len()).map_err(io_err)?;
        out.flush().map_err(io_err)?;

        let mut line = String::new();
        if input.read_line(&mut line).map_err(io_err)? == 0 {
            return Err(AppError::new(
                2,
                "No input received. Provide a CSV path with `-f <file.csv>`.",
            ));
        }

        let line = line.trim();
        if line.eq_ignore_ascii_case("q") {
            return Err(AppError::new(2, "Canceled."));
        }

        if let Ok(choice) = line.parse::<usize>() {
            if (1..=files.len()).contains(&choice) {
                return validate_csv_path(&files[choice - 1]);
            }
            writeln!(out, "Invalid choice: {choice}. Enter a number between 1 and {}.", files.len())
                .map_err(io_err)?;
            continue;
        }

        match validate_csv_path(Path::new(line)) {
            Ok(path) => return Ok(path),
            Err(err) => writeln!(out, "{err}").map_err(io_err)?,
        }
    }
}

/// Check that `path` names an existing `.csv` file.
pub fn validate_csv_path(path: &Path) -> Result<PathBuf, AppError> {
    if !path.exists() {
        return Err(AppError::new(2, format!("CSV file not found: {}", path.display())));
    }
    if path.is_dir() {
        return Err(AppError::new(
            2,
            format!("Expected a file, got a directory: {}", path.display()),
        ));
    }
    if !has_csv_extension(path) {
        return Err(AppError::new(
            2,
            format!("Expected a .csv file (got: {}). Use -f to pass a CSV path.", path.display()),
        ));
    }
    Ok(path.to_path_buf())
}

/// `*.csv` files under `root`: raw files first, then `cleaned_*` exports, each sorted.
pub fn discover_csv_files(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    walk(root, 0, &mut out);
    out.sort_by_key(|p| (is_cleaned_export(p), pretty_path(p)));
    out
}

fn walk(dir: &Path, depth: usize, out: &mut Vec<PathBuf>) {
    if depth > DEFAULT_SEARCH_DEPTH {
        return;
    }
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            if !should_skip_dir(&path) {
                walk(&path, depth + 1, out);
            }
        } else if file_type.is_file() && has_csv_extension(&path) {
            out.push(path);
        }
    }
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

fn is_cleaned_export(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .is_some_and(|name| name.starts_with("cleaned_"))
}

fn should_skip_dir(path: &Path) -> bool {
    let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
    matches!(name, ".git" | "target" | "node_modules")
}

fn pretty_path(path: &Path) -> String {
    path.strip_prefix("./").unwrap_or(path).display().to_string()
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn lists_raw_files_before_cleaned_exports() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["cleaned_b.csv", "b.csv", "a.CSV", "notes.txt"] {
            fs::write(dir.path().join(name), "x").unwrap();
        }
        fs::create_dir(dir.path().join("target")).unwrap();
        fs::write(dir.path().join("target").join("skip.csv"), "x").unwrap();

        let names: Vec<String> = discover_csv_files(dir.path())
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.CSV", "b.csv", "cleaned_b.csv"]);
    }

    #[test]
    fn picks_by_number_after_a_bad_choice() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("prices.csv");
        fs::write(&file, "Date,Price\n").unwrap();

        let mut input = Cursor::new("9\n1\n");
        let mut out = Vec::new();
        let picked = choose_from(&[file.clone()], &mut input, &mut out).unwrap();
        assert_eq!(picked, file);
        assert!(String::from_utf8(out).unwrap().contains("Invalid choice: 9"));
    }

    #[test]
    fn quitting_cancels() {
        let mut input = Cursor::new("q\n");
        let err = choose_from(&[PathBuf::from("x.csv")], &mut input, &mut Vec::<u8>::new()).unwrap_err();
        assert_eq!(err.to_string(), "Canceled.");
    }
}
