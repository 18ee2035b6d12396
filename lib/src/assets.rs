//! Copying a site's static assets into the output directory.

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::error::{Chainable, Result};

/// Copies every file under `src` into `dst`, keeping relative paths.
///
/// With the `sass` feature, `.scss` and `.sass` files are compiled to `.css`
/// instead of copied, and partials (`_name.scss`) are skipped. A missing `src`
/// copies nothing. Returns the number of files written.
///
/// The walk itself is serial, so this can run inside a busy rayon pool.
pub fn copy_dir(src: &Path, dst: &Path) -> Result<usize> {
    if !src.is_dir() {
        tracing::debug!(path = %src.display(), "no static directory");
        return Ok(0);
    }

    let mut files: Vec<PathBuf> = vec![];
    let walker = jwalk::WalkDir::new(src)
        .parallelism(jwalk::Parallelism::Serial)
        .sort(true)
        .skip_hidden(true);

    for entry in walker {
        let entry = entry?;
        if entry.file_type.is_file() {
            files.push(entry.path());
        }
    }

    let written = files.par_iter()
        .map(|path| {
            let relative = path.strip_prefix(src).unwrap_or(path);
            copy_file(path, &dst.join(relative))
        })
        .collect::<Result<Vec<bool>>>()?;

    Ok(written.into_iter().filter(|&w| w).count())
}

#[cfg(feature = "sass")]
fn copy_file(src: &Path, dst: &Path) -> Result<bool> {
    match src.extension().and_then(|e| e.to_str()) {
        Some("scss") | Some("sass") => compile_sass(src, &dst.with_extension("css")),
        _ => copy(src, dst),
    }
}

#[cfg(not(feature = "sass"))]
fn copy_file(src: &Path, dst: &Path) -> Result<bool> {
    copy(src, dst)
}

fn copy(src: &Path, dst: &Path) -> Result<bool> {
    if let Some(parent) = dst.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::copy(src, dst).chain_with(|| error! {
        "failed to copy asset",
        "source path" => src.display(),
        "destination path" => dst.display(),
    })?;

    Ok(true)
}

#[cfg(feature = "sass")]
fn compile_sass(src: &Path, dst: &Path) -> Result<bool> {
    let is_partial = src.file_name()
        .and_then(|name| name.to_str())
        .map_or(false, |name| name.starts_with('_'));

    if is_partial {
        return Ok(false);
    }

    let css = grass::from_path(src, &grass::Options::default())
        .map_err(|e| error!("failed to render sass as css", "path" => src.display(), e))?;

    crate::util::write_file(dst, css)?;
    Ok(true)
}
