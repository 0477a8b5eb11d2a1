use serde::Serialize;

/// Every per-capture asset lives under this directory of the site bundle.
pub const CAPTURES_ROOT: &str = "captures";
/// Multi-face tile layout expected by the panorama viewer.
pub const PANORAMA_FORMAT: &str = "14faces";
/// Element id the panorama viewer is embedded into.
pub const VIEWER_TARGET: &str = "mypanoviewer";

/// Static asset paths of one capture, relative to the site root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptureAssets {
    id: String,
}

impl CaptureAssets {
    pub fn new(id: &str) -> Self {
        CaptureAssets { id: id.to_string() }
    }

    pub fn thumbnail(&self) -> String {
        format!("{}/{}/spherical_thumbnail.jpg", CAPTURES_ROOT, self.id)
    }

    pub fn spherical(&self) -> String {
        format!("{}/{}/spherical.jpg", CAPTURES_ROOT, self.id)
    }

    pub fn panorama(&self) -> String {
        format!("{}/{}/panorama.jpg", CAPTURES_ROOT, self.id)
    }

    /// Prefix of the multi-face tiles, e.g. `captures/loc0_0/loc0_0_`.
    pub fn panorama_prefix(&self) -> String {
        format!("{}/{}/{}_", CAPTURES_ROOT, self.id, self.id)
    }

    pub fn viewer_vars(&self) -> ViewerVars {
        ViewerVars {
            pano: self.panorama_prefix(),
            format: PANORAMA_FORMAT.to_string(),
        }
    }
}

/// Variables handed to the panorama viewer before embedding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ViewerVars {
    pub pano: String,
    pub format: String,
}
