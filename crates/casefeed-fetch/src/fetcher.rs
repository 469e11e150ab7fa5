//! Cached HTTP downloads with manual redirect following.
//!
//! Each URL maps to one file in the cache directory. A cached file is
//! returned as-is without touching the network, so a populated cache makes a
//! run fully offline and reproducible.

use std::{
  io::ErrorKind,
  path::{Path, PathBuf},
  time::Duration,
};

use reqwest::{
  Client, StatusCode,
  header::LOCATION,
  redirect::Policy,
};
use tracing::{debug, info};
use url::Url;

use crate::{Error, Result};

/// Redirect hops followed before giving up.
pub const MAX_REDIRECTS: usize = 10;

/// Fetches dataset payloads as text, reading through an optional cache.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct Fetcher {
  client:    Client,
  cache_dir: Option<PathBuf>,
}

impl Fetcher {
  pub fn new(cache_dir: Option<PathBuf>) -> Result<Self> {
    let client = Client::builder()
      .redirect(Policy::none())
      .timeout(Duration::from_secs(300))
      .build()?;
    Ok(Self { client, cache_dir })
  }

  pub fn cache_dir(&self) -> Option<&Path> { self.cache_dir.as_deref() }

  /// Where the download of `url` is cached, if caching is enabled.
  pub fn cache_path(&self, url: &str) -> Option<PathBuf> {
    self.cache_dir.as_ref().map(|dir| dir.join(cache_file_name(url)))
  }

  /// Return the body at `url`, from the cache when present.
  pub async fn fetch(&self, url: &str) -> Result<String> {
    let cache_path = self.cache_path(url);

    if let Some(path) = &cache_path {
      match tokio::fs::read_to_string(path).await {
        Ok(body) => {
          info!(path = %path.display(), "using existing download");
          return Ok(body);
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(Error::io(path, e)),
      }
    }

    let body = self.download(url).await?;

    if let (Some(dir), Some(path)) = (&self.cache_dir, &cache_path) {
      tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| Error::io(dir, e))?;
      debug!(path = %path.display(), "saving download");
      tokio::fs::write(path, &body)
        .await
        .map_err(|e| Error::io(path, e))?;
    }
    Ok(body)
  }

  async fn download(&self, url: &str) -> Result<String> {
    let original = Url::parse(url)?;
    let mut current = original.clone();

    for _ in 0..=MAX_REDIRECTS {
      info!(url = %current, "downloading");
      let resp = self.client.get(current.clone()).send().await?;
      let status = resp.status();

      if status == StatusCode::MOVED_PERMANENTLY || status == StatusCode::FOUND {
        let location = resp
          .headers()
          .get(LOCATION)
          .and_then(|v| v.to_str().ok())
          .ok_or_else(|| Error::MissingLocation(current.to_string()))?;
        let next = redirect_target(&original, &current, location)?;
        info!(from = %current, to = %next, "redirected");
        current = next;
        continue;
      }

      if !status.is_success() {
        return Err(Error::Status { url: current.to_string(), status });
      }
      return Ok(resp.text().await?);
    }

    Err(Error::TooManyRedirects(url.to_string()))
  }
}

/// The URL a redirect leads to: `location` resolved against `current`, with
/// only its path and query carried onto `original`. Scheme, host and port
/// always stay those of the first request.
pub fn redirect_target(
  original: &Url,
  current: &Url,
  location: &str,
) -> Result<Url> {
  let resolved = current.join(location)?;
  let mut next = original.clone();
  next.set_path(resolved.path());
  next.set_query(resolved.query());
  Ok(next)
}

/// A filesystem-safe file name for `url`.
///
/// Drops the scheme, a leading `www.` and trailing slashes. Path separators
/// become `!`; other characters that are reserved in file names (and `!` and
/// `%` themselves) are percent-escaped, so a query or port never reads as a
/// path segment.
pub fn cache_file_name(url: &str) -> String {
  let name = url.split_once("://").map_or(url, |(_, rest)| rest);
  let name = name.strip_prefix("www.").unwrap_or(name);
  let name = name.trim_end_matches('/');

  let mut out = String::with_capacity(name.len());
  for c in name.chars() {
    match c {
      '/' => out.push('!'),
      '!' | '%' | '<' | '>' | ':' | '"' | '\\' | '|' | '?' | '*' => escape(&mut out, c),
      c if c.is_control() => escape(&mut out, c),
      c => out.push(c),
    }
  }
  out
}

fn escape(out: &mut String, c: char) {
  let mut buf = [0; 4];
  for byte in c.encode_utf8(&mut buf).bytes() {
    out.push_str(&format!("%{byte:02X}"));
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn cache_names_drop_scheme_and_reserved_characters() {
    assert_eq!(
      cache_file_name("https://www.example.org/data/"),
      "example.org!data"
    );
    assert_eq!(
      cache_file_name("https://api.example.org/v2/data?areaType=nation&format=json"),
      "api.example.org!v2!data%3FareaType=nation&format=json"
    );
    assert_eq!(
      cache_file_name("http://127.0.0.1:8080/a.csv"),
      "127.0.0.1%3A8080!a.csv"
    );
  }

  #[test]
  fn cache_names_keep_distinct_queries_apart() {
    let overview = cache_file_name("https://h.org/data?areaType=overview");
    let nation = cache_file_name("https://h.org/data?areaType=nation");
    assert_ne!(overview, nation);
  }

  #[test]
  fn cache_names_tell_query_from_path() {
    assert_ne!(
      cache_file_name("https://h.org/a?b"),
      cache_file_name("https://h.org/a/b")
    );
    assert_ne!(
      cache_file_name("http://h.org:80/a"),
      cache_file_name("http://h.org/80/a")
    );
    assert_ne!(
      cache_file_name("https://h.org/a!b"),
      cache_file_name("https://h.org/a/b")
    );
    assert_ne!(
      cache_file_name("https://h.org/a%3Fb"),
      cache_file_name("https://h.org/a?b")
    );
  }

  #[test]
  fn redirect_keeps_original_host() {
    let original = Url::parse("https://data.example.org/old/file.json?v=1").unwrap();

    let next = redirect_target(
      &original,
      &original,
      "https://cdn.elsewhere.net/new/file.json?v=2",
    )
    .unwrap();
    assert_eq!(next.as_str(), "https://data.example.org/new/file.json?v=2");

    let relative = redirect_target(&original, &next, "../moved.json").unwrap();
    assert_eq!(relative.as_str(), "https://data.example.org/moved.json");
  }

  #[test]
  fn redirect_without_query_clears_it() {
    let original = Url::parse("http://h.org/a?x=1").unwrap();
    let next = redirect_target(&original, &original, "/b").unwrap();
    assert_eq!(next.as_str(), "http://h.org/b");
  }

  #[test]
  fn fetcher_without_cache_dir_has_no_cache_path() {
    let fetcher = Fetcher::new(None).unwrap();
    assert!(fetcher.cache_dir().is_none());
    assert!(fetcher.cache_path("https://h.org/a").is_none());
  }
}
