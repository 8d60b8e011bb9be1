// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use anyhow::{Context, Result, anyhow};
use kdam::BarExt;
use reqwest::{Client, redirect::Policy};
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use sorrel_core::ut::track::{progress_bar, progress_log};

/// Download a file over HTTP(S)
///
/// The file is streamed to `<filename>.part` and renamed once complete.
///
/// # Arguments
///
/// * `url` - Remote file location
/// * `output_dir` - Directory to download file to
/// * `filename` - Filename of downloaded file
/// * `silent` - Turn off download messages
#[tokio::main]
pub async fn download_file(url: &str, output_dir: &Path, filename: &str, silent: bool) -> Result<()> {
    let client = create_http_client()?;
    download_file_with_progress(&client, url, output_dir, filename, silent).await?;
    if !silent {
        println!();
    }
    progress_log("Complete", !silent);
    Ok(())
}

fn create_http_client() -> Result<Client> {
    Client::builder()
        .user_agent(concat!("sorrel/", env!("CARGO_PKG_VERSION")))
        .redirect(Policy::limited(10))
        .build()
        .context("Failed to create HTTP client")
}

async fn download_file_with_progress(
    client: &Client,
    url: &str,
    output_dir: &Path,
    filename: &str,
    silent: bool,
) -> Result<()> {
    let mut resp = client
        .get(url)
        .send()
        .await
        .context("Failed to send download request")?
        .error_for_status()
        .context("Download request was rejected")?;

    let total_size = resp.content_length().unwrap_or(0);
    let mut pb = progress_bar(
        total_size as usize,
        format!("Downloading {}", filename).as_str(),
        !silent,
    );

    if total_size == 0 {
        return Err(anyhow!(
            "Download could not be started. Please check connection and try again."
        ));
    }

    progress_log(
        format!(
            "Starting {} download ({:.3} GB)",
            filename,
            total_size as f64 / 1e9
        )
        .as_str(),
        !silent,
    );

    tokio::fs::create_dir_all(output_dir)
        .await
        .context("Failed to create output directory")?;

    let partial = output_dir.join(format!("{}.part", filename));
    let mut file = File::create(&partial)
        .await
        .context("Failed to create output file")?;

    while let Some(chunk) = resp.chunk().await.context("Failed to read chunk")? {
        file.write_all(&chunk)
            .await
            .context("Failed to write chunk to file")?;

        if !silent {
            pb.update(chunk.len())?;
        }
    }

    file.flush().await.context("Failed to flush output file")?;

    tokio::fs::rename(&partial, output_dir.join(filename))
        .await
        .context("Failed to move downloaded file into place")?;

    Ok(())
}
