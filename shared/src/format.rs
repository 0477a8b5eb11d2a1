//! Display strings for capture fields. Every function is pure and renders a
//! placeholder instead of failing on absent input.

use chrono::{DateTime, Utc};

use super::models::{LatLng, WeatherParam};

pub const DATE_NOT_AVAILABLE: &str = "Date not available";
pub const TIME_NOT_AVAILABLE: &str = "Time not available";
pub const LOCATION_NOT_AVAILABLE: &str = "Location data not available";
pub const DATA_NOT_AVAILABLE: &str = "Data not available";
pub const MISSING_VALUE: &str = "-";

const CAMPUS_PREFIX: &str = "loc";

/// e.g. "April 1, 2025"
pub fn format_date(timestamp: Option<&DateTime<Utc>>) -> String {
    match timestamp {
        Some(time) => time.format("%B %-d, %Y").to_string(),
        None => DATE_NOT_AVAILABLE.to_string(),
    }
}

/// e.g. "14:30 UTC"
pub fn format_time(timestamp: Option<&DateTime<Utc>>) -> String {
    match timestamp {
        Some(time) => format!("{} UTC", time.format("%H:%M")),
        None => TIME_NOT_AVAILABLE.to_string(),
    }
}

pub fn format_gps(lat: f64, lng: f64) -> String {
    format!("{:.6}°, {:.6}°", lat, lng)
}

pub fn format_location(gps: Option<LatLng>) -> String {
    match gps {
        Some(LatLng { lat, lng }) => format_gps(lat, lng),
        None => LOCATION_NOT_AVAILABLE.to_string(),
    }
}

pub fn format_irradiance(irradiance: Option<f64>) -> String {
    match irradiance {
        Some(ghi) => format!("{:.2} W/m²", ghi),
        None => DATA_NOT_AVAILABLE.to_string(),
    }
}

pub fn format_weather_value(key: &str, value: Option<f64>) -> String {
    let Some(value) = value else {
        return MISSING_VALUE.to_string();
    };
    match WeatherParam::from_key(key) {
        Some(param) => format!("{:.1}{}", value, param.unit()),
        None => format!("{:.2}", value),
    }
}

/// Like [`format_weather_value`] for values that may not be numbers.
pub fn format_weather_raw(key: &str, value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => MISSING_VALUE.to_string(),
        serde_json::Value::Number(number) => format_weather_value(key, number.as_f64()),
        serde_json::Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

pub fn format_weather_key(key: &str) -> String {
    match WeatherParam::from_key(key) {
        Some(param) => param.label().to_string(),
        None => capitalize(key),
    }
}

pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Position of a campus capture: `loc<location>_<capture>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct CampusId {
    pub location: u32,
    pub capture: u32,
}

pub fn parse_campus_id(id: &str) -> Option<CampusId> {
    let rest = id.strip_prefix(CAMPUS_PREFIX)?;
    let (location, capture) = rest.split_once('_')?;
    Some(CampusId {
        location: parse_digits(location)?,
        capture: parse_digits(capture)?,
    })
}

// `u32::from_str` also accepts a leading '+', which is not part of the id scheme.
fn parse_digits(value: &str) -> Option<u32> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

pub fn is_campus_id(id: &str) -> bool {
    id.starts_with(CAMPUS_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_date_and_time() {
        let time = Utc.with_ymd_and_hms(2025, 4, 1, 9, 5, 0).unwrap();
        assert_eq!(format_date(Some(&time)), "April 1, 2025");
        assert_eq!(format_time(Some(&time)), "09:05 UTC");

        let evening = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(format_date(Some(&evening)), "December 31, 2024");
        assert_eq!(format_time(Some(&evening)), "23:59 UTC");
    }

    #[test]
    fn test_format_date_and_time_missing() {
        assert_eq!(format_date(None), "Date not available");
        assert_eq!(format_time(None), "Time not available");
    }

    #[test]
    fn test_format_gps() {
        assert_eq!(
            format_gps(40.807677, -73.962402),
            "40.807677°, -73.962402°"
        );
        assert_eq!(format_gps(1.5, 2.0), "1.500000°, 2.000000°");
        assert_eq!(format_location(None), "Location data not available");
    }

    #[test]
    fn test_format_irradiance() {
        assert_eq!(format_irradiance(Some(512.347)), "512.35 W/m²");
        assert_eq!(format_irradiance(Some(0.0)), "0.00 W/m²");
        assert_eq!(format_irradiance(None), "Data not available");
    }

    #[test]
    fn test_format_weather_value_units() {
        assert_eq!(format_weather_value("temp", Some(21.34)), "21.3 °C");
        assert_eq!(format_weather_value("dwpt", Some(-2.0)), "-2.0 °C");
        assert_eq!(format_weather_value("rhum", Some(55.0)), "55.0%");
        assert_eq!(format_weather_value("prcp", Some(0.2)), "0.2 mm");
        assert_eq!(format_weather_value("snow", Some(3.0)), "3.0 cm");
        assert_eq!(format_weather_value("wdir", Some(270.0)), "270.0°");
        assert_eq!(format_weather_value("wspd", Some(4.44)), "4.4 m/s");
        assert_eq!(format_weather_value("wpgt", Some(9.0)), "9.0 m/s");
        assert_eq!(format_weather_value("pres", Some(1013.26)), "1013.3 hPa");
        assert_eq!(format_weather_value("tsun", Some(60.0)), "60.0 min");
        assert_eq!(format_weather_value("coco", Some(4.0)), "4.0 oktas");
    }

    #[test]
    fn test_format_weather_value_missing_and_unknown() {
        assert_eq!(format_weather_value("snow", None), "-");
        assert_eq!(format_weather_value("temp", None), "-");
        assert_eq!(format_weather_value("station", Some(72503.0)), "72503.00");
    }

    #[test]
    fn test_format_weather_raw() {
        use serde_json::json;

        assert_eq!(format_weather_raw("temp", &json!(21.34)), "21.3 °C");
        assert_eq!(format_weather_raw("snow", &json!(null)), "-");
        assert_eq!(format_weather_raw("time", &json!("2025-04-01 14:00")), "2025-04-01 14:00");
        assert_eq!(format_weather_raw("flags", &json!(true)), "true");
    }

    #[test]
    fn test_format_weather_key() {
        assert_eq!(format_weather_key("rhum"), "Relative Humidity");
        assert_eq!(format_weather_key("tsun"), "Sunshine Duration");
        assert_eq!(format_weather_key("station"), "Station");
        assert_eq!(format_weather_key(""), "");
    }

    #[test]
    fn test_parse_campus_id() {
        assert_eq!(
            parse_campus_id("loc8_2"),
            Some(CampusId {
                location: 8,
                capture: 2
            })
        );
        assert_eq!(
            parse_campus_id("loc12_10"),
            Some(CampusId {
                location: 12,
                capture: 10
            })
        );
    }

    #[test]
    fn test_parse_campus_id_no_match() {
        assert_eq!(parse_campus_id("1"), None);
        assert_eq!(parse_campus_id("loc"), None);
        assert_eq!(parse_campus_id("loc8"), None);
        assert_eq!(parse_campus_id("loc8_"), None);
        assert_eq!(parse_campus_id("locx_2"), None);
        assert_eq!(parse_campus_id("loc+8_2"), None);
        assert_eq!(parse_campus_id("loc8_2_extra"), None);
        assert_eq!(parse_campus_id("xloc8_2"), None);
    }

    #[test]
    fn test_is_campus_id() {
        assert!(is_campus_id("loc0_7"));
        assert!(!is_campus_id("17"));
    }
}
