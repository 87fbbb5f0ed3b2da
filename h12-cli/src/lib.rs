use anyhow::{Context, Result};
use h12_transform::{TRANSFORM_VERSION, TransformOptions, Transformer, has_region};
use std::fs;
use std::path::{Path, PathBuf};

/// Where `build_cmd` writes when no output directory is given.
pub const DEFAULT_OUT_DIR: &str = "target/h12-gen";

/// Every `*.rs` file under `input` (or `input` itself when it is a file),
/// sorted, as (absolute path, path relative to `input`).
fn sources(input: &Path) -> Result<Vec<(PathBuf, PathBuf)>> {
    if input.is_file() {
        let name = input
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("out.rs"));
        return Ok(vec![(input.to_path_buf(), name)]);
    }

    fn walk(root: &Path, dir: &Path, found: &mut Vec<(PathBuf, PathBuf)>) -> Result<()> {
        let entries = fs::read_dir(dir).with_context(|| format!("failed to list {}", dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            if path.is_dir() {
                walk(root, &path, found)?;
            } else if path.extension().is_some_and(|e| e == "rs") {
                let rel = path.strip_prefix(root).unwrap_or(path.as_path()).to_path_buf();
                found.push((path, rel));
            }
        }
        Ok(())
    }

    let mut found = Vec::new();
    walk(input, input, &mut found)?;
    found.sort();
    Ok(found)
}

fn transform_file(transformer: &Transformer, path: &Path) -> Result<(String, bool)> {
    let src = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let rewritten = has_region(&src);
    let code = transformer
        .transform(&src)
        .with_context(|| format!("failed to transform {}", path.display()))?;
    Ok((code, rewritten))
}

/// Transform one file, or every `*.rs` file below a directory, into
/// `out_dir` keeping relative paths. Returns the written paths.
pub fn build_cmd(input: &Path, out_dir: Option<&Path>, options: TransformOptions) -> Result<Vec<PathBuf>> {
    let transformer = Transformer::new(options);
    let out_dir = out_dir
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_DIR));

    let mut written = Vec::new();
    for (path, rel) in sources(input)? {
        let (mut code, rewritten) = transform_file(&transformer, &path)?;
        if rewritten {
            code.push_str(&format!(
                "\npub const H12_TRANSFORM_VERSION: &str = \"{TRANSFORM_VERSION}\";\n"
            ));
        }

        let out_path = out_dir.join(&rel);
        if let Some(dir) = out_path.parent() {
            fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
        }
        fs::write(&out_path, code)
            .with_context(|| format!("failed to write {}", out_path.display()))?;
        tracing::info!(input = %path.display(), output = %out_path.display(), rewritten, "generated");
        written.push(out_path);
    }
    Ok(written)
}

/// Transform in memory with validation on, writing nothing. Returns how
/// many files were checked.
pub fn check_cmd(input: &Path, options: TransformOptions) -> Result<usize> {
    let transformer = Transformer::new(options.validate(true));
    let files = sources(input)?;
    for (path, _) in &files {
        transform_file(&transformer, path)?;
        tracing::debug!(input = %path.display(), "ok");
    }
    Ok(files.len())
}
