use clap::{Parser, Subcommand};

use crate::carousel::{CarouselEvent, Visibility};
use crate::explorer::{ExplorerEvent, MapPreset};

#[derive(Debug, Parser)]
#[command(about = "UrbanSky capture explorer.")]
pub struct Cli {
    /// Site root: a local directory or an http(s) base URL
    #[arg(env = "URBANSKY_SOURCE", short, long, default_value = ".")]
    pub source: String,
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print capture and site counts
    Summary,
    /// Print the detail panel of one capture
    Show { id: String },
    /// Map explorer; reads `marker <n>`, `thumb <id>`, `select <id>`, `preset <name>` from stdin
    Explore {
        #[arg(long, default_value = "city")]
        preset: MapPreset,
    },
    /// Homepage carousel; reads `pick <id>`, `hide`, `show`, `width <px>` from stdin
    Carousel {
        /// Grid container width in pixels
        #[arg(long, default_value_t = 600)]
        width: u32,
    },
}

/// One line of interactive carousel input.
pub fn parse_carousel_command(line: &str) -> Result<CarouselEvent, String> {
    let mut words = line.split_whitespace();
    match (words.next(), words.next()) {
        (Some("pick"), Some(id)) => Ok(CarouselEvent::ThumbnailSelected(id.to_string())),
        (Some("hide"), None) => Ok(CarouselEvent::VisibilityChanged(Visibility::Hidden)),
        (Some("show"), None) => Ok(CarouselEvent::VisibilityChanged(Visibility::Visible)),
        (Some("width"), Some(width)) => width
            .parse()
            .map(|width| CarouselEvent::Resized { width })
            .map_err(|_| format!("invalid width: {}", width)),
        _ => Err(format!("unknown command: {}", line.trim())),
    }
}

/// One line of interactive explorer input.
pub fn parse_explorer_command(line: &str) -> Result<ExplorerEvent, String> {
    let mut words = line.split_whitespace();
    match (words.next(), words.next()) {
        (Some("marker"), Some(index)) => index
            .parse()
            .map(ExplorerEvent::MarkerClicked)
            .map_err(|_| format!("invalid marker index: {}", index)),
        (Some("thumb"), Some(id)) => Ok(ExplorerEvent::StripThumbnailClicked(id.to_string())),
        (Some("select"), Some(id)) => Ok(ExplorerEvent::Select(id.to_string())),
        (Some("preset"), Some(name)) => name.parse().map(ExplorerEvent::PresetSelected),
        _ => Err(format!("unknown command: {}", line.trim())),
    }
}
