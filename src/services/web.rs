//! Web lookups: Wikipedia, weather, headlines, Google search.

use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::config::WebConfig;

const WIKIPEDIA_SUMMARY_URL: &str = "https://en.wikipedia.org/api/rest_v1/page/summary/";
const WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
const NEWS_URL: &str = "https://newsapi.org/v2/top-headlines";
const GOOGLE_CSE_URL: &str = "https://www.googleapis.com/customsearch/v1";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const HEADLINE_COUNT: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
    pub link: String,
}

/// The first `n` sentences of a paragraph.
pub fn first_sentences(text: &str, n: usize) -> String {
    let mut out = String::new();
    let mut count = 0;
    let chars: Vec<char> = text.trim().chars().collect();
    for (i, c) in chars.iter().enumerate() {
        out.push(*c);
        let at_boundary = chars.get(i + 1).map_or(true, |next| next.is_whitespace());
        if matches!(c, '.' | '!' | '?') && at_boundary {
            count += 1;
            if count == n {
                break;
            }
        }
    }
    out.trim().to_string()
}

pub fn describe_weather(json: &Value) -> anyhow::Result<String> {
    let temp = json["main"]["temp"]
        .as_f64()
        .ok_or_else(|| anyhow::anyhow!("Weather response has no temperature"))?;
    let city = json["name"].as_str().unwrap_or("there");
    let description = json["weather"][0]["description"].as_str().unwrap_or("unknown conditions");
    let mut line = format!(
        "The temperature in {} is {:.0} degrees Celsius with {}.",
        city, temp, description
    );
    if let Some(humidity) = json["main"]["humidity"].as_f64() {
        line.push_str(&format!(" Humidity is {:.0}%.", humidity));
    }
    Ok(line)
}

pub fn headlines(json: &Value) -> Vec<String> {
    json["articles"]
        .as_array()
        .map(|articles| {
            articles
                .iter()
                .filter_map(|a| a["title"].as_str())
                .filter(|t| !t.trim().is_empty())
                .take(HEADLINE_COUNT)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

pub fn first_hit(json: &Value) -> Option<SearchHit> {
    let item = json["items"].as_array()?.first()?;
    Some(SearchHit {
        title: item["title"].as_str()?.to_string(),
        snippet: item["snippet"].as_str().unwrap_or("").replace('\n', " "),
        link: item["link"].as_str().unwrap_or("").to_string(),
    })
}

pub struct WebClient {
    config: WebConfig,
    client: reqwest::Client,
}

impl WebClient {
    pub fn new(config: WebConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("optimus/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { config, client }
    }

    pub fn has_google(&self) -> bool {
        self.config.google_api_key.is_some() && self.config.google_cse_id.is_some()
    }

    async fn get_json(&self, req: reqwest::RequestBuilder, what: &str) -> anyhow::Result<Value> {
        let resp = req.send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            debug!(what, %status, body = %body, "Web API error");
            anyhow::bail!("{} lookup failed with status {}", what, status);
        }
        Ok(resp.json().await?)
    }

    /// Two-sentence summary of the best matching article.
    pub async fn wikipedia(&self, query: &str) -> anyhow::Result<String> {
        let title = query.trim().replace(' ', "_");
        let url = format!("{}{}", WIKIPEDIA_SUMMARY_URL, super::apps::url_encode(&title));
        let json = self.get_json(self.client.get(url), "Wikipedia").await?;
        let extract = json["extract"].as_str().unwrap_or("").trim();
        if extract.is_empty() {
            anyhow::bail!("Wikipedia has nothing on {}", query.trim());
        }
        Ok(first_sentences(extract, 2))
    }

    pub async fn weather(&self, city: &str) -> anyhow::Result<String> {
        let Some(key) = self.config.weather_api_key.as_deref() else {
            anyhow::bail!("Weather needs an OpenWeatherMap API key in the config.");
        };
        let req = self
            .client
            .get(WEATHER_URL)
            .query(&[("q", city.trim()), ("appid", key), ("units", "metric")]);
        let json = self.get_json(req, "Weather").await?;
        describe_weather(&json)
    }

    pub async fn news(&self) -> anyhow::Result<Vec<String>> {
        let Some(key) = self.config.news_api_key.as_deref() else {
            anyhow::bail!("News needs a NewsAPI key in the config.");
        };
        let page_size = HEADLINE_COUNT.to_string();
        let req = self.client.get(NEWS_URL).query(&[
            ("country", "us"),
            ("pageSize", page_size.as_str()),
            ("apiKey", key),
        ]);
        let json = self.get_json(req, "News").await?;
        Ok(headlines(&json))
    }

    /// Top Google result, or `None` when no search key is configured.
    pub async fn google(&self, query: &str) -> anyhow::Result<Option<SearchHit>> {
        let (Some(key), Some(cx)) = (
            self.config.google_api_key.as_deref(),
            self.config.google_cse_id.as_deref(),
        ) else {
            return Ok(None);
        };
        let req = self
            .client
            .get(GOOGLE_CSE_URL)
            .query(&[("key", key), ("cx", cx), ("q", query.trim())]);
        let json = self.get_json(req, "Search").await?;
        first_hit(&json)
            .map(Some)
            .ok_or_else(|| anyhow::anyhow!("No results for {}", query.trim()))
    }
}
