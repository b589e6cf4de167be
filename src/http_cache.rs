use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info};

use crate::http_client::http_client;

/// Where a fetched match page is kept: `<dir>/<comp_token>--<match_id>.html`.
#[derive(Debug, Clone, Copy)]
pub struct CacheTarget<'a> {
    pub dir: &'a Path,
    pub comp_token: &'a str,
    pub match_id: &'a str,
    /// Re-fetch even when the page is already cached.
    pub force: bool,
}

impl CacheTarget<'_> {
    pub fn path(&self) -> PathBuf {
        self.dir.join(cache_file_name(self.comp_token, self.match_id))
    }
}

pub fn cache_file_name(comp_token: &str, match_id: &str) -> String {
    format!("{comp_token}--{match_id}.html")
}

/// Competition token encoded in a cached page's file name.
pub fn comp_token_from_file_name(file_name: &str) -> &str {
    file_name.split("--").next().unwrap_or(file_name)
}

/// Returns the page at `uri`, served from the cache when a target is given
/// and already populated.
///
/// `http(s)` URIs are requested with the shared client, posting `form`
/// when it is non-empty. Anything else is read as a local path.
pub fn fetch_html_cached(
    uri: &str,
    form: &[(&str, &str)],
    target: Option<&CacheTarget<'_>>,
) -> Result<String> {
    if let Some(target) = target {
        let path = target.path();
        if !target.force && path.exists() {
            debug!(path = %path.display(), "page cache hit");
            return fs::read_to_string(&path)
                .with_context(|| format!("read cached page {}", path.display()));
        }
    }

    let body = fetch_html(uri, form)?;

    if let Some(target) = target {
        save_page(&target.path(), &body)?;
    }
    Ok(body)
}

fn fetch_html(uri: &str, form: &[(&str, &str)]) -> Result<String> {
    if uri.starts_with("http://") || uri.starts_with("https://") {
        let client = http_client()?;
        let req = if form.is_empty() {
            client.get(uri)
        } else {
            client.post(uri).form(form)
        };
        info!(uri, ?form, "requesting page");
        let resp = req.send().with_context(|| format!("request {uri}"))?;
        let status = resp.status();
        let body = resp.text().context("failed reading body")?;
        if !status.is_success() {
            return Err(anyhow!("http {}: {}", status, uri));
        }
        return Ok(body);
    }

    let path = uri.strip_prefix("file://").unwrap_or(uri);
    debug!(path, "reading local page");
    fs::read_to_string(path).with_context(|| format!("read page {path}"))
}

fn save_page(path: &Path, body: &str) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("create cache dir {}", dir.display()))?;
    }
    let tmp = path.with_extension("html.tmp");
    fs::write(&tmp, body).context("write cached page")?;
    fs::rename(&tmp, path).context("swap cached page")?;
    debug!(path = %path.display(), "page cached");
    Ok(())
}
