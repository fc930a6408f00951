/// Fetches sentence-transformers model files from the HuggingFace hub.
///
/// Files already on disk are left alone, so a populated model directory
/// never touches the network.
use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

/// Hub host; files resolve under `{HF_HOST}/{repo_id}/resolve/main`.
const HF_HOST: &str = "https://huggingface.co";

/// Local file name paired with its path inside the hub repository.
const MODEL_FILES: &[(&str, &str)] = &[
    ("model.onnx", "onnx/model.onnx"),
    ("tokenizer.json", "tokenizer.json"),
    ("config.json", "config.json"),
    ("tokenizer_config.json", "tokenizer_config.json"),
    ("special_tokens_map.json", "special_tokens_map.json"),
];

/// Check whether all required model files exist in `model_dir`.
#[must_use]
pub fn all_files_present(model_dir: &Path) -> bool {
    MODEL_FILES
        .iter()
        .all(|(name, _)| model_dir.join(name).exists())
}

fn file_url(repo_id: &str, remote_path: &str) -> String {
    format!("{HF_HOST}/{repo_id}/resolve/main/{remote_path}")
}

/// Download whichever model files are missing from `model_dir`.
///
/// `repo_id` is a hub repository such as
/// `sentence-transformers/all-mpnet-base-v2`.
pub fn download_model_files(model_dir: &Path, repo_id: &str) -> Result<()> {
    fs::create_dir_all(model_dir)
        .with_context(|| format!("failed to create models directory: {}", model_dir.display()))?;

    if all_files_present(model_dir) {
        debug!("All model files found in {}", model_dir.display());
        return Ok(());
    }

    info!("Downloading {repo_id} into {} (one-time)", model_dir.display());

    for &(filename, remote_path) in MODEL_FILES {
        let dest = model_dir.join(filename);
        if dest.exists() {
            continue;
        }

        let url = file_url(repo_id, remote_path);
        info!("Downloading {filename}");
        download_file(&dest, &url).with_context(|| format!("failed to download {filename}"))?;
    }

    info!("Model download complete");
    Ok(())
}

/// Stream one file to disk behind a progress bar.
///
/// Data lands in a `.part` file first so an interrupted download is retried
/// on the next run instead of being mistaken for a complete file.
fn download_file(dest: &Path, url: &str) -> Result<()> {
    let mut resp =
        reqwest::blocking::get(url).with_context(|| format!("HTTP request failed: {url}"))?;

    if !resp.status().is_success() {
        anyhow::bail!("bad status: {} for {url}", resp.status());
    }

    let pb = match resp.content_length() {
        Some(total) if total > 0 => {
            let pb = ProgressBar::new(total);
            let style = ProgressStyle::default_bar()
                .template("  {bar:40.cyan/blue} {percent}% ({bytes}/{total_bytes}) {msg}")
                .context("invalid progress template")?
                .progress_chars("█▓░");
            pb.set_style(style);
            pb
        }
        _ => ProgressBar::new_spinner(),
    };

    let partial = dest.with_extension("part");
    let file = fs::File::create(&partial)
        .with_context(|| format!("failed to create file: {}", partial.display()))?;

    let mut writer = pb.wrap_write(file);
    io::copy(&mut resp, &mut writer).context("failed to write response body")?;
    pb.finish_and_clear();

    fs::rename(&partial, dest)
        .with_context(|| format!("failed to move download into {}", dest.display()))?;
    Ok(())
}
