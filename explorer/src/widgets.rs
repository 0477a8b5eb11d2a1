//! Seams to the page: the map widget, the panorama viewer and the panels the
//! state machines drive. `ConsoleSurface` renders all of them as text.

use shared::assets::{CaptureAssets, ViewerVars};
use shared::details::CaptureDetails;
use std::io::Write;

use crate::explorer::{MapView, Marker};

pub trait MapWidget {
    fn place_marker(&mut self, index: usize, marker: &Marker);
    fn set_view(&mut self, view: MapView);
}

pub trait PanoramaWidget {
    /// Tear down whatever is embedded in `target` and embed a fresh viewer.
    fn embed(&mut self, target: &str, vars: &ViewerVars);
}

pub trait DetailPanel {
    fn show_details(&mut self, details: &CaptureDetails);
    fn show_strip(&mut self, capture_ids: &[String]);
    fn hide_strip(&mut self);
    fn set_no_data_hint(&mut self, visible: bool);
}

pub trait CarouselView {
    fn show_main_image(&mut self, id: &str);
    fn layout_grid(&mut self, columns: u32, thumbnails: &[String]);
}

pub struct ConsoleSurface<W: Write> {
    out: W,
}

impl<W: Write> ConsoleSurface<W> {
    pub fn new(out: W) -> Self {
        ConsoleSurface { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    // Output is best effort; a closed stdout must not take the UI down.
    fn line(&mut self, text: std::fmt::Arguments<'_>) {
        if let Err(e) = writeln!(self.out, "{}", text) {
            log::debug!("console write failed: {}", e);
        }
    }
}

impl ConsoleSurface<std::io::Stdout> {
    pub fn stdout() -> Self {
        ConsoleSurface::new(std::io::stdout())
    }
}

impl<W: Write> MapWidget for ConsoleSurface<W> {
    fn place_marker(&mut self, index: usize, marker: &Marker) {
        self.line(format_args!(
            "[marker {} {}] {} at {:.6}, {:.6} ({} captures)",
            index,
            marker.region,
            marker.tooltip,
            marker.position.lat,
            marker.position.lng,
            marker.site.capture_ids().len()
        ));
    }

    fn set_view(&mut self, view: MapView) {
        self.line(format_args!(
            "[map] center {:.6}, {:.6} zoom {}",
            view.center.lat, view.center.lng, view.zoom
        ));
    }
}

impl<W: Write> PanoramaWidget for ConsoleSurface<W> {
    fn embed(&mut self, target: &str, vars: &ViewerVars) {
        let vars = serde_json::to_string(vars).unwrap_or_else(|_| format!("{:?}", vars));
        self.line(format_args!("[viewer #{}] {}", target, vars));
    }
}

impl<W: Write> DetailPanel for ConsoleSurface<W> {
    fn show_details(&mut self, details: &CaptureDetails) {
        self.line(format_args!("{}", details));
    }

    fn show_strip(&mut self, capture_ids: &[String]) {
        self.line(format_args!("[strip] {} captures", capture_ids.len()));
        for id in capture_ids {
            let thumbnail = CaptureAssets::new(id).thumbnail();
            self.line(format_args!("  {} {}", id, thumbnail));
        }
    }

    fn hide_strip(&mut self) {
        self.line(format_args!("[strip] hidden"));
    }

    fn set_no_data_hint(&mut self, visible: bool) {
        if visible {
            self.line(format_args!("[hint] click a marker to explore its captures"));
        }
    }
}

impl<W: Write> CarouselView for ConsoleSurface<W> {
    fn show_main_image(&mut self, id: &str) {
        let image = CaptureAssets::new(id).spherical();
        self.line(format_args!("[main] {}", image));
    }

    fn layout_grid(&mut self, columns: u32, thumbnails: &[String]) {
        let rows = thumbnails.len().div_ceil(columns.max(1) as usize);
        self.line(format_args!(
            "[grid] {} thumbnails in {} columns x {} rows",
            thumbnails.len(),
            columns,
            rows
        ));
    }
}
