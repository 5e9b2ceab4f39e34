// Weather provider
// Thin client over OpenWeatherMap with defined fallbacks: without an API key
// the app still works on a clear-sky default, and a failed call degrades to
// an "unknown" reading instead of surfacing an error.

use serde::{Deserialize, Serialize};

use crate::constants::{BAD_OUTDOOR_CONDITIONS, WEATHER_API_KEY_PLACEHOLDER, WEATHER_FALLBACK_TEMP};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WeatherData {
    pub temp: i32,
    pub condition: String,
    pub icon: String,
    pub is_good_for_outdoor: bool,
}

impl WeatherData {
    /// Default used when no API key is configured.
    fn clear_sky() -> Self {
        WeatherData {
            temp: WEATHER_FALLBACK_TEMP,
            condition: "Clear".to_string(),
            icon: "01d".to_string(),
            is_good_for_outdoor: true,
        }
    }

    /// Fallback when the provider call fails.
    fn unavailable() -> Self {
        WeatherData {
            temp: 0,
            condition: "Unknown".to_string(),
            icon: String::new(),
            is_good_for_outdoor: false,
        }
    }
}

pub fn is_good_for_outdoor(condition: &str) -> bool {
    !BAD_OUTDOOR_CONDITIONS.contains(&condition)
}

/// Fetch current weather for a coordinate. Never fails: missing key or a
/// provider error both map to defined fallback values.
pub async fn fetch_weather(
    client: &reqwest::Client,
    api_key: Option<&str>,
    lat: f64,
    lon: f64,
) -> WeatherData {
    let Some(api_key) = api_key.filter(|k| !k.is_empty() && *k != WEATHER_API_KEY_PLACEHOLDER)
    else {
        return WeatherData::clear_sky();
    };

    match request_weather(client, api_key, lat, lon).await {
        Ok(data) => data,
        Err(e) => {
            log::warn!("Weather fetch failed: {}", e);
            WeatherData::unavailable()
        }
    }
}

async fn request_weather(
    client: &reqwest::Client,
    api_key: &str,
    lat: f64,
    lon: f64,
) -> crate::error::Result<WeatherData> {
    let url = format!(
        "https://api.openweathermap.org/data/2.5/weather?lat={}&lon={}&appid={}&units=metric",
        lat, lon, api_key
    );

    let body: serde_json::Value = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let condition = body
        .pointer("/weather/0/main")
        .and_then(|v| v.as_str())
        .ok_or_else(|| crate::error::VisitLogError::Remote("weather payload missing condition".to_string()))?
        .to_string();
    let icon = body
        .pointer("/weather/0/icon")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    let temp = body
        .pointer("/main/temp")
        .and_then(|v| v.as_f64())
        .unwrap_or_default()
        .round() as i32;

    Ok(WeatherData {
        temp,
        is_good_for_outdoor: is_good_for_outdoor(&condition),
        condition,
        icon,
    })
}
