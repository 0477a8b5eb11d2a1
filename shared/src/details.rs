use std::fmt;

use serde::Serialize;

use super::assets::CaptureAssets;
use super::format::{
    format_date, format_irradiance, format_location, format_time, format_weather_key,
    format_weather_raw, format_weather_value,
};
use super::models::{CaptureRecord, WeatherParam};

pub const WEATHER_SOURCE: &str = "MeteoStat";
pub const WEATHER_SOURCE_URL: &str = "https://dev.meteostat.net/python/hourly.html#api";
pub const WEATHER_NOT_AVAILABLE: &str = "Weather data not available";

/// Everything the detail panel shows for one capture, already formatted.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureDetails {
    pub capture_id: String,
    pub date: String,
    pub time: String,
    pub location: String,
    pub irradiance: String,
    pub spherical_image: String,
    pub panorama_image: String,
    pub weather: WeatherPanel,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum WeatherPanel {
    /// Columns of the first observation: the fixed parameters in order, then
    /// any extra keys the observation carried.
    Table { columns: Vec<WeatherColumn> },
    Unavailable,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WeatherColumn {
    pub key: String,
    pub label: String,
    pub value: String,
}

impl WeatherColumn {
    fn new(key: &str, value: String) -> Self {
        WeatherColumn {
            key: key.to_string(),
            label: format_weather_key(key),
            value,
        }
    }
}

impl CaptureDetails {
    pub fn from_record(record: &CaptureRecord) -> Self {
        let assets = CaptureAssets::new(&record.id);
        let weather = match record.first_weather() {
            Some(sample) => WeatherPanel::Table {
                columns: WeatherParam::ALL
                    .into_iter()
                    .map(|param| {
                        WeatherColumn::new(
                            param.key(),
                            format_weather_value(param.key(), sample.get(param)),
                        )
                    })
                    .chain(sample.extra.iter().map(|(key, value)| {
                        WeatherColumn::new(key, format_weather_raw(key, value))
                    }))
                    .collect(),
            },
            None => WeatherPanel::Unavailable,
        };

        CaptureDetails {
            capture_id: record.id.clone(),
            date: format_date(record.timestamp.as_ref()),
            time: format_time(record.timestamp.as_ref()),
            location: format_location(record.gps),
            irradiance: format_irradiance(record.irradiance),
            spherical_image: assets.spherical(),
            panorama_image: assets.panorama(),
            weather,
        }
    }
}

impl fmt::Display for CaptureDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Capture {}", self.capture_id)?;
        writeln!(f, "  Date:       {}", self.date)?;
        writeln!(f, "  Time:       {}", self.time)?;
        writeln!(f, "  Location:   {}", self.location)?;
        writeln!(f, "  Irradiance: {}", self.irradiance)?;
        writeln!(f, "  Spherical:  {}", self.spherical_image)?;
        writeln!(f, "  Panorama:   {}", self.panorama_image)?;
        writeln!(f, "  Weather (from {} <{}>):", WEATHER_SOURCE, WEATHER_SOURCE_URL)?;
        match &self.weather {
            WeatherPanel::Table { columns } => {
                for column in columns {
                    writeln!(f, "    {:<18} {}", column.label, column.value)?;
                }
                Ok(())
            }
            WeatherPanel::Unavailable => writeln!(f, "    {}", WEATHER_NOT_AVAILABLE),
        }
    }
}
