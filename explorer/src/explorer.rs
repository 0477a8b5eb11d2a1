//! Explore page: one marker per site, a thumbnail strip for multi-capture
//! sites, and a detail panel plus panorama viewer for the selected capture.

use serde::Serialize;
use shared::assets::{CaptureAssets, ViewerVars, VIEWER_TARGET};
use shared::details::CaptureDetails;
use shared::format::capitalize;
use shared::models::{LatLng, LocationEntry};
use std::str::FromStr;
use std::sync::Arc;

use crate::store::Catalog;
use crate::widgets::{DetailPanel, MapWidget, PanoramaWidget};

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MapView {
    pub center: LatLng,
    pub zoom: u8,
}

/// Fixed camera framings the user can toggle between.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MapPreset {
    City,
    Campus,
}

impl MapPreset {
    pub fn view(self) -> MapView {
        match self {
            MapPreset::City => MapView {
                center: LatLng {
                    lat: 40.7831,
                    lng: -73.9712,
                },
                zoom: 12,
            },
            MapPreset::Campus => MapView {
                center: LatLng {
                    lat: 40.807677,
                    lng: -73.962402,
                },
                zoom: 17,
            },
        }
    }
}

impl FromStr for MapPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<MapPreset, String> {
        match s {
            "city" | "nyc" => Ok(MapPreset::City),
            "campus" | "columbia" => Ok(MapPreset::Campus),
            other => Err(format!("unknown map preset: {}", other)),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Marker {
    pub region: String,
    pub position: LatLng,
    pub tooltip: String,
    pub site: LocationEntry,
}

impl Marker {
    fn new(region: &str, site: &LocationEntry) -> Self {
        let label = match site {
            LocationEntry::Single { capture_id, .. } => capture_id.as_str(),
            // "loc8_0" -> "loc8"
            LocationEntry::Multi { capture_ids, .. } => capture_ids
                .first()
                .and_then(|id| id.split('_').next())
                .unwrap_or_default(),
        };
        Marker {
            region: region.to_string(),
            position: site.coordinate(),
            tooltip: format!("{} Location {}", capitalize(region), label),
            site: site.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExplorerEvent {
    MarkerClicked(usize),
    StripThumbnailClicked(String),
    PresetSelected(MapPreset),
    Select(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExplorerEffect {
    PlaceMarker(usize),
    SetView(MapView),
    ShowStrip(Vec<String>),
    HideStrip,
    SetNoDataHint(bool),
    ShowDetails(Box<CaptureDetails>),
    EmbedViewer { target: String, vars: ViewerVars },
}

pub struct MapExplorer {
    catalog: Arc<Catalog>,
    markers: Vec<Marker>,
    selected: Option<String>,
    strip: Option<Vec<String>>,
    preset: MapPreset,
}

impl MapExplorer {
    pub fn init(catalog: Arc<Catalog>) -> (Self, Vec<ExplorerEffect>) {
        let markers: Vec<Marker> = catalog
            .regions()
            .flat_map(|(region, sites)| sites.iter().map(move |site| Marker::new(region, site)))
            .collect();

        let mut explorer = MapExplorer {
            catalog,
            markers,
            selected: None,
            strip: None,
            preset: MapPreset::City,
        };

        let mut effects = vec![ExplorerEffect::SetView(explorer.preset.view())];
        effects.extend((0..explorer.markers.len()).map(ExplorerEffect::PlaceMarker));

        if let Some(first) = explorer.catalog.all_capture_ids().into_iter().next() {
            effects.extend(explorer.select(&first));
            effects.push(ExplorerEffect::SetNoDataHint(true));
        }
        (explorer, effects)
    }

    pub fn dispatch(&mut self, event: ExplorerEvent) -> Vec<ExplorerEffect> {
        match event {
            ExplorerEvent::MarkerClicked(index) => self.click_marker(index),
            ExplorerEvent::StripThumbnailClicked(id) | ExplorerEvent::Select(id) => self.select(&id),
            ExplorerEvent::PresetSelected(preset) => {
                self.preset = preset;
                vec![ExplorerEffect::SetView(preset.view())]
            }
        }
    }

    fn click_marker(&mut self, index: usize) -> Vec<ExplorerEffect> {
        let Some(marker) = self.markers.get(index) else {
            log::warn!("No marker #{}", index);
            return vec![];
        };

        match marker.site.clone() {
            LocationEntry::Single { capture_id, .. } => {
                if !self.catalog.contains(&capture_id) {
                    log::warn!("No metadata found for capture: {}", capture_id);
                    return vec![];
                }
                let mut effects = self.select(&capture_id);
                self.strip = None;
                effects.push(ExplorerEffect::HideStrip);
                effects.push(ExplorerEffect::SetNoDataHint(false));
                effects
            }
            LocationEntry::Multi { capture_ids, .. } => {
                let first = capture_ids.first().cloned();
                self.strip = Some(capture_ids.clone());
                let mut effects = vec![ExplorerEffect::ShowStrip(capture_ids)];
                if let Some(first) = first {
                    effects.extend(self.select(&first));
                }
                effects.push(ExplorerEffect::SetNoDataHint(false));
                effects
            }
        }
    }

    /// Refresh the detail panel, then re-embed the panorama viewer.
    fn select(&mut self, id: &str) -> Vec<ExplorerEffect> {
        let Some(record) = self.catalog.get_capture(id) else {
            log::warn!("No metadata found for capture: {}", id);
            return vec![];
        };
        self.selected = Some(id.to_string());
        vec![
            ExplorerEffect::ShowDetails(Box::new(CaptureDetails::from_record(record))),
            ExplorerEffect::EmbedViewer {
                target: VIEWER_TARGET.to_string(),
                vars: CaptureAssets::new(id).viewer_vars(),
            },
        ]
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn strip(&self) -> Option<&[String]> {
        self.strip.as_deref()
    }

    pub fn preset(&self) -> MapPreset {
        self.preset
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }
}

/// Push explorer effects out to the page widgets.
pub fn apply<S>(explorer: &MapExplorer, effects: Vec<ExplorerEffect>, surface: &mut S)
where
    S: MapWidget + PanoramaWidget + DetailPanel,
{
    for effect in effects {
        match effect {
            ExplorerEffect::PlaceMarker(index) => {
                if let Some(marker) = explorer.markers().get(index) {
                    surface.place_marker(index, marker);
                }
            }
            ExplorerEffect::SetView(view) => surface.set_view(view),
            ExplorerEffect::ShowStrip(ids) => surface.show_strip(&ids),
            ExplorerEffect::HideStrip => surface.hide_strip(),
            ExplorerEffect::SetNoDataHint(visible) => surface.set_no_data_hint(visible),
            ExplorerEffect::ShowDetails(details) => surface.show_details(&details),
            ExplorerEffect::EmbedViewer { target, vars } => surface.embed(&target, &vars),
        }
    }
}
