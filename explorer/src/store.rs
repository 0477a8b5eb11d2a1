//! Capture catalog loading.
//!
//! The two site documents are fetched together, parsed once and kept as an
//! immutable [`Catalog`] shared with the carousel and the map explorer.

use anyhow::{anyhow, Context, Result};
use shared::format::{is_campus_id, parse_campus_id};
use shared::models::{parse_metadata, CaptureRecord, LocationEntry, LocationsDocument};
use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

pub const METADATA_PATH: &str = "data/metadata.json";
pub const LOCATIONS_PATH: &str = "data/locations.json";

/// Somewhere the site documents can be read from.
pub trait DocumentSource {
    fn fetch(&self, path: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// A site bundle, either on disk or behind an HTTP base URL.
#[derive(Debug)]
pub enum Source {
    Dir(PathBuf),
    Http {
        base_url: String,
        client: reqwest::Client,
    },
}

impl Source {
    pub fn parse(location: &str, timeout: Duration) -> Result<Self> {
        if location.starts_with("http://") || location.starts_with("https://") {
            let client = reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .context("Failed to create HTTP client")?;
            Ok(Source::Http {
                base_url: location.trim_end_matches('/').to_string(),
                client,
            })
        } else {
            Ok(Source::Dir(PathBuf::from(location)))
        }
    }

    pub fn describe(&self, path: &str) -> String {
        match self {
            Source::Dir(root) => root.join(path).display().to_string(),
            Source::Http { base_url, .. } => format!("{}/{}", base_url, path),
        }
    }
}

impl DocumentSource for Source {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>> {
        let location = self.describe(path);
        match self {
            Source::Dir(_) => tokio::fs::read(&location)
                .await
                .with_context(|| format!("Failed to read {}", location)),
            Source::Http { client, .. } => {
                let response = client
                    .get(&location)
                    .send()
                    .await
                    .with_context(|| format!("Failed to fetch {}", location))?;
                let status = response.status();
                if !status.is_success() {
                    return Err(anyhow!("HTTP error fetching {}: status {}", location, status));
                }
                let bytes = response
                    .bytes()
                    .await
                    .with_context(|| format!("Failed to read body of {}", location))?;
                Ok(bytes.to_vec())
            }
        }
    }
}

/// The loaded capture set and its location index. Never mutated after load.
#[derive(Debug, Default)]
pub struct Catalog {
    captures: HashMap<String, CaptureRecord>,
    /// Capture ids as they appear in `metadata.json`.
    order: Vec<String>,
    locations: LocationsDocument,
}

impl Catalog {
    pub fn new(records: Vec<CaptureRecord>, locations: LocationsDocument) -> Self {
        let mut captures = HashMap::with_capacity(records.len());
        let mut order = Vec::with_capacity(records.len());
        for record in records {
            if captures.contains_key(&record.id) {
                log::warn!("Duplicate capture {}, keeping the first", record.id);
                continue;
            }
            order.push(record.id.clone());
            captures.insert(record.id.clone(), record);
        }

        for (region, entries) in locations.regions() {
            for id in entries.iter().flat_map(LocationEntry::capture_ids) {
                if !captures.contains_key(id) {
                    log::warn!("Location in {} references unknown capture {}", region, id);
                }
            }
        }
        Catalog {
            captures,
            order,
            locations,
        }
    }

    pub fn from_json(metadata: &[u8], locations: &[u8]) -> Result<Self> {
        let captures = parse_metadata(metadata).context("Invalid capture metadata")?;
        let locations = serde_json::from_slice(locations).context("Invalid locations document")?;
        Ok(Catalog::new(captures, locations))
    }

    pub fn capture_count(&self) -> usize {
        self.captures.len()
    }

    pub fn get_capture(&self, id: &str) -> Option<&CaptureRecord> {
        self.captures.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.captures.contains_key(id)
    }

    /// Sites of one region, empty for an unknown region.
    pub fn locations_for(&self, region: &str) -> &[LocationEntry] {
        self.locations.get(region)
    }

    pub fn regions(&self) -> impl Iterator<Item = (&str, &[LocationEntry])> {
        self.locations.regions()
    }

    pub fn site_count(&self) -> usize {
        self.locations.site_count()
    }

    /// All capture ids, in document order.
    pub fn all_capture_ids(&self) -> Vec<String> {
        self.order.clone()
    }

    pub fn captures(&self) -> impl Iterator<Item = &CaptureRecord> {
        self.order.iter().filter_map(|id| self.captures.get(id))
    }

    /// Earliest and latest captures that carry a timestamp.
    pub fn capture_span(&self) -> Option<(&CaptureRecord, &CaptureRecord)> {
        let dated = || self.captures().filter(|record| record.timestamp.is_some());
        let first = dated().min_by_key(|record| record.timestamp)?;
        let last = dated().max_by_key(|record| record.timestamp)?;
        Some((first, last))
    }

    /// Captures taken at campus site `location`, ordered by capture index.
    pub fn captures_at_campus_location(&self, location: u32) -> Vec<&str> {
        let mut found: Vec<_> = self
            .order
            .iter()
            .filter_map(|id| parse_campus_id(id).map(|campus| (campus, id.as_str())))
            .filter(|(campus, _)| campus.location == location)
            .collect();
        found.sort();
        found.into_iter().map(|(_, id)| id).collect()
    }

    pub fn is_campus_capture(&self, id: &str) -> bool {
        self.contains(id) && is_campus_id(id)
    }
}

/// Loads the catalog once and hands the same snapshot to every caller.
pub struct DataStore<S = Source> {
    source: S,
    loaded: OnceCell<Option<Arc<Catalog>>>,
}

impl<S: DocumentSource> DataStore<S> {
    pub fn new(source: S) -> Self {
        DataStore {
            source,
            loaded: OnceCell::new(),
        }
    }

    /// Fetch and index both documents. Callers arriving while a load is in
    /// flight wait for it; the outcome, failure included, is kept for the life
    /// of the store.
    pub async fn load(&self) -> Option<Arc<Catalog>> {
        self.loaded
            .get_or_init(|| async {
                match self.fetch_catalog().await {
                    Ok(catalog) => {
                        log::info!(
                            "Loaded {} captures across {} sites",
                            catalog.capture_count(),
                            catalog.site_count()
                        );
                        Some(Arc::new(catalog))
                    }
                    Err(e) => {
                        log::error!("Error loading data: {:#}", e);
                        None
                    }
                }
            })
            .await
            .clone()
    }

    async fn fetch_catalog(&self) -> Result<Catalog> {
        let (metadata, locations) = futures::future::try_join(
            self.source.fetch(METADATA_PATH),
            self.source.fetch(LOCATIONS_PATH),
        )
        .await?;
        Catalog::from_json(&metadata, &locations)
    }

    pub fn catalog(&self) -> Option<&Arc<Catalog>> {
        self.loaded.get().and_then(Option::as_ref)
    }

    pub fn capture_count(&self) -> Option<usize> {
        self.catalog().map(|catalog| catalog.capture_count())
    }

    pub fn get_capture(&self, id: &str) -> Option<&CaptureRecord> {
        self.catalog()?.get_capture(id)
    }

    pub fn locations_for(&self, region: &str) -> &[LocationEntry] {
        match self.catalog() {
            Some(catalog) => catalog.locations_for(region),
            None => &[],
        }
    }

    pub fn all_capture_ids(&self) -> Vec<String> {
        self.catalog()
            .map(|catalog| catalog.all_capture_ids())
            .unwrap_or_default()
    }
}
