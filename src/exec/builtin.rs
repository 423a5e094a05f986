// src/exec/builtin.rs

//! Stock handlers available to job graphs loaded from a config file.
//!
//! | name          | arguments         |
//! |---------------|-------------------|
//! | `create_dir`  | `path`            |
//! | `remove_dir`  | `path`            |
//! | `create_file` | `path`            |
//! | `write_file`  | `path`, `content` |
//! | `append_file` | `path`, `content` |
//! | `read_file`   | `path`            |
//! | `remove_file` | `path`            |
//! | `http_get`    | `url`             |

use anyhow::{Context, Result};
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::exec::HandlerRegistry;
use crate::job::JobArgs;
use crate::job::body::str_arg;

/// How much of a fetched response body gets logged.
const HTTP_PREVIEW_CHARS: usize = 100;

/// Registry pre-populated with every built-in handler.
pub fn builtin_registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    registry
        .register_fn("create_dir", create_dir)
        .register_fn("remove_dir", remove_dir)
        .register_fn("create_file", create_file)
        .register_fn("write_file", write_file)
        .register_fn("append_file", append_file)
        .register_fn("read_file", read_file)
        .register_fn("remove_file", remove_file)
        .register_fn("http_get", http_get);
    registry
}

async fn create_dir(args: JobArgs) -> Result<()> {
    let path = str_arg(&args, "path")?;
    tokio::fs::create_dir_all(path)
        .await
        .with_context(|| format!("creating directory '{path}'"))?;
    info!(path, "created directory");
    Ok(())
}

async fn remove_dir(args: JobArgs) -> Result<()> {
    let path = str_arg(&args, "path")?;
    tokio::fs::remove_dir(path)
        .await
        .with_context(|| format!("removing directory '{path}'"))?;
    info!(path, "removed directory");
    Ok(())
}

async fn create_file(args: JobArgs) -> Result<()> {
    let path = str_arg(&args, "path")?;
    tokio::fs::write(path, b"")
        .await
        .with_context(|| format!("creating file '{path}'"))?;
    info!(path, "created empty file");
    Ok(())
}

async fn write_file(args: JobArgs) -> Result<()> {
    let path = str_arg(&args, "path")?;
    let content = str_arg(&args, "content")?;
    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("writing file '{path}'"))?;
    info!(path, bytes = content.len(), "wrote file");
    Ok(())
}

async fn append_file(args: JobArgs) -> Result<()> {
    let path = str_arg(&args, "path")?;
    let content = str_arg(&args, "content")?;
    let mut file = tokio::fs::OpenOptions::new()
        .append(true)
        .open(path)
        .await
        .with_context(|| format!("opening '{path}' for append"))?;
    file.write_all(content.as_bytes())
        .await
        .with_context(|| format!("appending to '{path}'"))?;
    file.flush().await?;
    info!(path, bytes = content.len(), "appended to file");
    Ok(())
}

async fn read_file(args: JobArgs) -> Result<()> {
    let path = str_arg(&args, "path")?;
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading file '{path}'"))?;
    info!(path, %content, "read file");
    Ok(())
}

async fn remove_file(args: JobArgs) -> Result<()> {
    let path = str_arg(&args, "path")?;
    tokio::fs::remove_file(path)
        .await
        .with_context(|| format!("removing file '{path}'"))?;
    info!(path, "removed file");
    Ok(())
}

async fn http_get(args: JobArgs) -> Result<()> {
    let url = str_arg(&args, "url")?;
    let resp = reqwest::get(url)
        .await
        .with_context(|| format!("requesting '{url}'"))?;

    let status = resp.status();
    if !status.is_success() {
        warn!(url, status = status.as_u16(), "request did not succeed");
        return Ok(());
    }

    let body = resp.text().await.with_context(|| format!("reading body of '{url}'"))?;
    let preview: String = body.chars().take(HTTP_PREVIEW_CHARS).collect();
    info!(url, %preview, "fetched data");
    Ok(())
}
