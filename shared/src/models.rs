use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Region key of the dense urban grid (one capture per site).
pub const DENSE_GRID: &str = "manhattan";
/// Region key of the campus grid (several captures per site).
pub const CAMPUS_GRID: &str = "columbia";

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Returns `None` unless both values are finite and inside geographic range.
    pub fn new(lat: f64, lng: f64) -> Option<Self> {
        let valid = lat.is_finite() && lng.is_finite() && lat.abs() <= 90.0 && lng.abs() <= 180.0;
        valid.then_some(LatLng { lat, lng })
    }

    /// `[lat, lng, ...]` as found in the JSON documents.
    pub fn from_pair(values: &[f64]) -> Option<Self> {
        match values {
            [lat, lng, ..] => Self::new(*lat, *lng),
            _ => None,
        }
    }
}

/// The fixed set of hourly weather parameters attached to a capture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WeatherParam {
    Temperature,
    DewPoint,
    Humidity,
    Precipitation,
    Snow,
    WindDirection,
    WindSpeed,
    WindGust,
    Pressure,
    Sunshine,
    CloudCover,
}

impl WeatherParam {
    pub const ALL: [WeatherParam; 11] = [
        WeatherParam::Temperature,
        WeatherParam::DewPoint,
        WeatherParam::Humidity,
        WeatherParam::Precipitation,
        WeatherParam::Snow,
        WeatherParam::WindDirection,
        WeatherParam::WindSpeed,
        WeatherParam::WindGust,
        WeatherParam::Pressure,
        WeatherParam::Sunshine,
        WeatherParam::CloudCover,
    ];

    pub fn key(self) -> &'static str {
        match self {
            WeatherParam::Temperature => "temp",
            WeatherParam::DewPoint => "dwpt",
            WeatherParam::Humidity => "rhum",
            WeatherParam::Precipitation => "prcp",
            WeatherParam::Snow => "snow",
            WeatherParam::WindDirection => "wdir",
            WeatherParam::WindSpeed => "wspd",
            WeatherParam::WindGust => "wpgt",
            WeatherParam::Pressure => "pres",
            WeatherParam::Sunshine => "tsun",
            WeatherParam::CloudCover => "coco",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|param| param.key() == key)
    }

    pub fn label(self) -> &'static str {
        match self {
            WeatherParam::Temperature => "Temperature",
            WeatherParam::DewPoint => "Dew Point",
            WeatherParam::Humidity => "Relative Humidity",
            WeatherParam::Precipitation => "Precipitation",
            WeatherParam::Snow => "Snow",
            WeatherParam::WindDirection => "Wind Direction",
            WeatherParam::WindSpeed => "Wind Speed",
            WeatherParam::WindGust => "Wind Gust",
            WeatherParam::Pressure => "Pressure",
            WeatherParam::Sunshine => "Sunshine Duration",
            WeatherParam::CloudCover => "Cloud Cover",
        }
    }

    /// Unit suffix, including the separating space where one is used.
    pub fn unit(self) -> &'static str {
        match self {
            WeatherParam::Temperature | WeatherParam::DewPoint => " °C",
            WeatherParam::Humidity => "%",
            WeatherParam::Precipitation => " mm",
            WeatherParam::Snow => " cm",
            WeatherParam::WindDirection => "°",
            WeatherParam::WindSpeed | WeatherParam::WindGust => " m/s",
            WeatherParam::Pressure => " hPa",
            WeatherParam::Sunshine => " min",
            WeatherParam::CloudCover => " oktas",
        }
    }
}

/// One hourly observation (Meteostat layout). Keys outside the fixed
/// parameter set are kept verbatim in `extra`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct WeatherSample {
    pub temp: Option<f64>,
    pub dwpt: Option<f64>,
    pub rhum: Option<f64>,
    pub prcp: Option<f64>,
    pub snow: Option<f64>,
    pub wdir: Option<f64>,
    pub wspd: Option<f64>,
    pub wpgt: Option<f64>,
    pub pres: Option<f64>,
    pub tsun: Option<f64>,
    pub coco: Option<f64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl WeatherSample {
    pub fn get(&self, param: WeatherParam) -> Option<f64> {
        match param {
            WeatherParam::Temperature => self.temp,
            WeatherParam::DewPoint => self.dwpt,
            WeatherParam::Humidity => self.rhum,
            WeatherParam::Precipitation => self.prcp,
            WeatherParam::Snow => self.snow,
            WeatherParam::WindDirection => self.wdir,
            WeatherParam::WindSpeed => self.wspd,
            WeatherParam::WindGust => self.wpgt,
            WeatherParam::Pressure => self.pres,
            WeatherParam::Sunshine => self.tsun,
            WeatherParam::CloudCover => self.coco,
        }
    }

    fn slot(&mut self, param: WeatherParam) -> &mut Option<f64> {
        match param {
            WeatherParam::Temperature => &mut self.temp,
            WeatherParam::DewPoint => &mut self.dwpt,
            WeatherParam::Humidity => &mut self.rhum,
            WeatherParam::Precipitation => &mut self.prcp,
            WeatherParam::Snow => &mut self.snow,
            WeatherParam::WindDirection => &mut self.wdir,
            WeatherParam::WindSpeed => &mut self.wspd,
            WeatherParam::WindGust => &mut self.wpgt,
            WeatherParam::Pressure => &mut self.pres,
            WeatherParam::Sunshine => &mut self.tsun,
            WeatherParam::CloudCover => &mut self.coco,
        }
    }

    /// Known parameters that are not numbers read as missing.
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        let mut sample = WeatherSample::default();
        for (key, value) in fields {
            match WeatherParam::from_key(&key) {
                Some(param) => *sample.slot(param) = lenient_number(&value),
                None => {
                    sample.extra.insert(key, value);
                }
            }
        }
        sample
    }
}

/// A number, or a string holding one. Anything else, NaN and infinities
/// included, reads as absent.
fn lenient_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CaptureRecord {
    pub id: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub gps: Option<LatLng>,
    /// Global horizontal irradiance, W/m².
    pub irradiance: Option<f64>,
    pub weather: Vec<WeatherSample>,
}

impl CaptureRecord {
    /// Build a record from one `metadata.json` entry. Each field is read on
    /// its own: an unusable value becomes absent and the rest of the record
    /// is kept. Entries that are not objects are skipped.
    pub fn from_value(id: String, value: Value) -> Option<Self> {
        let Value::Object(mut fields) = value else {
            log::warn!("Capture {}: entry is not an object, skipping", id);
            return None;
        };

        let timestamp = present(fields.remove("date_time")).and_then(|value| {
            let parsed = value.as_str().and_then(parse_timestamp);
            if parsed.is_none() {
                log::warn!("Capture {}: unreadable date_time {}", id, value);
            }
            parsed
        });
        let gps = present(fields.remove("gps")).and_then(|value| {
            let parsed = match value.as_array().map(Vec::as_slice) {
                Some([lat, lng, ..]) => lenient_number(lat)
                    .zip(lenient_number(lng))
                    .and_then(|(lat, lng)| LatLng::new(lat, lng)),
                _ => None,
            };
            if parsed.is_none() {
                log::warn!("Capture {}: invalid gps {}", id, value);
            }
            parsed
        });
        let irradiance = present(fields.remove("ghi")).and_then(|value| {
            let parsed = lenient_number(&value).filter(|ghi| *ghi >= 0.0);
            if parsed.is_none() {
                log::warn!("Capture {}: invalid ghi {}", id, value);
            }
            parsed
        });
        let weather = match present(fields.remove("weather")) {
            None => Vec::new(),
            Some(Value::Array(samples)) => samples
                .into_iter()
                .filter_map(|sample| match sample {
                    Value::Object(sample) => Some(WeatherSample::from_fields(sample)),
                    other => {
                        log::warn!("Capture {}: skipping weather sample {}", id, other);
                        None
                    }
                })
                .collect(),
            Some(other) => {
                log::warn!("Capture {}: weather is not a list: {}", id, other);
                Vec::new()
            }
        };

        Some(CaptureRecord {
            id,
            timestamp,
            gps,
            irradiance,
            weather,
        })
    }

    pub fn first_weather(&self) -> Option<&WeatherSample> {
        self.weather.first()
    }
}

fn present(value: Option<Value>) -> Option<Value> {
    value.filter(|value| !value.is_null())
}

/// Parse `metadata.json`: an object mapping capture id to its fields.
/// Records come back in document order.
pub fn parse_metadata(bytes: &[u8]) -> serde_json::Result<Vec<CaptureRecord>> {
    let document: Map<String, Value> = serde_json::from_slice(bytes)?;
    Ok(document
        .into_iter()
        .filter_map(|(id, value)| CaptureRecord::from_value(id, value))
        .collect())
}

/// ISO-8601 instant. Values without an offset are read as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(date_time) = DateTime::parse_from_rfc3339(value) {
        return Some(date_time.with_timezone(&Utc));
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, pattern) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// A physical site hosting one or more captures.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LocationEntry {
    Single {
        capture_id: String,
        coordinate: LatLng,
    },
    Multi {
        coordinate: LatLng,
        capture_ids: Vec<String>,
    },
}

impl LocationEntry {
    pub fn coordinate(&self) -> LatLng {
        match self {
            LocationEntry::Single { coordinate, .. } | LocationEntry::Multi { coordinate, .. } => {
                *coordinate
            }
        }
    }

    pub fn capture_ids(&self) -> &[String] {
        match self {
            LocationEntry::Single { capture_id, .. } => std::slice::from_ref(capture_id),
            LocationEntry::Multi { capture_ids, .. } => capture_ids,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CaptureKey {
    Text(String),
    Number(serde_json::Number),
}

impl From<CaptureKey> for String {
    fn from(key: CaptureKey) -> Self {
        match key {
            CaptureKey::Text(text) => text,
            CaptureKey::Number(number) => number.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct RawLocation {
    #[serde(default)]
    id: Option<CaptureKey>,
    #[serde(default)]
    coords: Option<Vec<f64>>,
    #[serde(default)]
    captures: Option<Vec<String>>,
}

impl TryFrom<RawLocation> for LocationEntry {
    type Error = &'static str;

    fn try_from(raw: RawLocation) -> Result<Self, Self::Error> {
        let coordinate = raw
            .coords
            .as_deref()
            .and_then(LatLng::from_pair)
            .ok_or("missing or invalid coords")?;
        match (raw.captures, raw.id) {
            (Some(capture_ids), _) if !capture_ids.is_empty() => Ok(LocationEntry::Multi {
                coordinate,
                capture_ids,
            }),
            (_, Some(id)) => Ok(LocationEntry::Single {
                capture_id: id.into(),
                coordinate,
            }),
            _ => Err("neither a capture id nor a non-empty captures list"),
        }
    }
}

/// `locations.json`: named arrays of sites keyed by region.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct LocationsDocument {
    regions: BTreeMap<String, Vec<LocationEntry>>,
}

impl LocationsDocument {
    pub fn get(&self, region: &str) -> &[LocationEntry] {
        self.regions.get(region).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn regions(&self) -> impl Iterator<Item = (&str, &[LocationEntry])> {
        self.regions
            .iter()
            .map(|(name, entries)| (name.as_str(), entries.as_slice()))
    }

    pub fn site_count(&self) -> usize {
        self.regions.values().map(Vec::len).sum()
    }
}

impl<'de> Deserialize<'de> for LocationsDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
        let mut regions = BTreeMap::new();

        for (region, value) in raw {
            let Value::Array(items) = value else {
                log::warn!("Region {} is not a list of locations, skipping", region);
                continue;
            };
            let mut entries = Vec::with_capacity(items.len());
            for (index, item) in items.into_iter().enumerate() {
                let parsed = serde_json::from_value::<RawLocation>(item)
                    .map_err(|e| e.to_string())
                    .and_then(|raw| LocationEntry::try_from(raw).map_err(str::to_string));
                match parsed {
                    Ok(entry) => entries.push(entry),
                    Err(reason) => {
                        log::warn!("Skipping {} location #{}: {}", region, index, reason)
                    }
                }
            }
            regions.insert(region, entries);
        }

        Ok(LocationsDocument { regions })
    }
}
