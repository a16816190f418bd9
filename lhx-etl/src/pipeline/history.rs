//! Scrobble history download and reload

use crate::cache::{get_or_fetch, CacheKey, CacheStore, FileCacheStore, Fetcher};
use crate::error::{CacheError, EtlResult};
use crate::extractors::{merge_pages, parse_recent_tracks_page};
use crate::models::ScrobbleRecord;
use crate::pipeline::enrich::{fill_cache, FillSummary};
use std::io::ErrorKind;
use std::path::Path;
use tracing::{error, info, warn};

/// Outcome of a [`download_history`] run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    /// `totalPages` reported by the first page
    pub total_pages: u32,
    /// Counts for pages 2..=total_pages
    pub pages: FillSummary,
}

/// Download every history page that is not cached yet
///
/// Page 1 is read first to learn `totalPages`. With `refresh_first` set it
/// is always re-fetched, since that is where new scrobbles appear; the other
/// pages are only fetched when missing. Page 1 failing is fatal, later pages
/// are counted and skipped.
pub async fn download_history<S, F>(
    store: &S,
    fetcher: &F,
    refresh_first: bool,
) -> EtlResult<DownloadSummary>
where
    S: CacheStore + ?Sized,
    F: Fetcher + ?Sized,
{
    let first_key = CacheKey::Page(1);
    let first_body = if refresh_first {
        let body = fetcher.fetch(&first_key).await?;
        store.put(&first_key, &body)?;
        body
    } else {
        get_or_fetch(store, fetcher, &first_key).await?.body
    };

    let first = parse_recent_tracks_page(&first_body)?;
    let total_pages = first.total_pages;
    info!(total_pages, "History size known");

    let pages = fill_cache(store, fetcher, (2..=total_pages).map(CacheKey::Page)).await?;
    if pages.failed > 0 {
        warn!(failed = pages.failed, "Some history pages could not be downloaded");
    }

    Ok(DownloadSummary { total_pages, pages })
}

/// Page numbers of the `<n>.xml` files in `dir`, ascending
///
/// Only canonical names count: `01.xml` or `+1.xml` would alias page 1 and
/// load it twice, so they are skipped with a warning like any other file.
/// A missing directory has no pages.
pub fn list_page_numbers(dir: &Path) -> EtlResult<Vec<u32>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(dir = %dir.display(), "History directory does not exist");
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(CacheError::Io {
                path: dir.to_path_buf(),
                source,
            }
            .into())
        }
    };

    let mut pages = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| CacheError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();

        let is_xml = path.extension().map_or(false, |ext| ext == "xml");
        let number = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.parse::<u32>().ok().filter(|n| n.to_string() == s));

        match (is_xml, number) {
            (true, Some(n)) => pages.push(n),
            _ => warn!(file = %path.display(), "Skipping file that is not a history page"),
        }
    }

    pages.sort_unstable();
    Ok(pages)
}

/// Parse and merge every cached page under `dir`, newest first
pub fn load_history(dir: &Path) -> EtlResult<Vec<ScrobbleRecord>> {
    let store = FileCacheStore::new(dir);
    let numbers = list_page_numbers(dir)?;

    let mut pages = Vec::with_capacity(numbers.len());
    for number in numbers {
        let key = CacheKey::Page(number);
        let Some(body) = store.get(&key)? else {
            continue;
        };
        let page = parse_recent_tracks_page(&body).map_err(|e| {
            error!(page = number, error = %e, "Cached history page is malformed");
            e
        })?;
        pages.push(page);
    }

    let page_count = pages.len();
    let records = merge_pages(pages);
    info!(pages = page_count, scrobbles = records.len(), "Loaded history");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_list_page_numbers_sorts_numerically() {
        let dir = TempDir::new().unwrap();
        for name in ["10.xml", "2.xml", "1.xml", "notes.txt", "abc.xml", "3.json"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }

        assert_eq!(list_page_numbers(dir.path()).unwrap(), vec![1, 2, 10]);
    }

    #[test]
    fn test_list_page_numbers_ignores_padded_aliases() {
        let dir = TempDir::new().unwrap();
        for name in ["1.xml", "01.xml", "+1.xml", "002.xml"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }

        assert_eq!(list_page_numbers(dir.path()).unwrap(), vec![1]);
    }

    #[test]
    fn test_list_page_numbers_missing_dir() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(list_page_numbers(&missing).unwrap().is_empty());
    }
}
