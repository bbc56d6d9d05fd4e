use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use tracing::debug;

use crate::db::models::{EventInput, Sport};

/// Anything that can hand the engine a batch of normalised events.
/// Retries, restarts and rate limiting of the underlying retrieval live
/// behind this trait.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn load(&self) -> Result<Vec<EventInput>>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}

/// Events from a JSON file: either one array, or one object per line.
pub struct JsonFileSource {
    path: PathBuf,
    label: String,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let label = path.display().to_string();
        JsonFileSource { path, label }
    }
}

#[async_trait]
impl EventSource for JsonFileSource {
    fn name(&self) -> &str {
        &self.label
    }

    async fn load(&self) -> Result<Vec<EventInput>> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read event file {}", self.path.display()))?;
        let events = parse_events(&raw)
            .with_context(|| format!("Invalid event file {}", self.path.display()))?;
        debug!("Loaded {} events from {}", events.len(), self.label);
        Ok(events)
    }
}

/// A JSON array, or JSON lines where blank lines and `#` comments are ignored.
pub fn parse_events(raw: &str) -> Result<Vec<EventInput>> {
    if raw.trim_start().starts_with('[') {
        let values: Vec<Value> = serde_json::from_str(raw).context("Failed to decode event array")?;
        return values
            .into_iter()
            .enumerate()
            .map(|(i, v)| decode_event(v).with_context(|| format!("Invalid event #{}", i + 1)))
            .collect();
    }

    raw.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(i, line)| {
            serde_json::from_str(line)
                .map_err(anyhow::Error::from)
                .and_then(decode_event)
                .with_context(|| format!("Failed to decode event on line {}", i + 1))
        })
        .collect()
}

/// Events without a sport tag get the sport implied by their URL.
fn decode_event(mut value: Value) -> Result<EventInput> {
    if let Some(obj) = value.as_object_mut() {
        if obj.get("sport").map_or(true, Value::is_null) {
            let sport = Sport::from_url(obj.get("match_url").and_then(Value::as_str).unwrap_or(""));
            obj.insert("sport".into(), Value::String(sport.as_str().into()));
        }
    }
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALPHA_BETA: &str = r#"{"match_url": "https://www.livesport.com/pl/mecz/pilka-nozna/a/b/?mid=A1", "home_team": "Alpha", "away_team": "Beta", "sport": "football", "h2h": [{"home": "Alpha", "away": "Beta", "score": "2-1"}]}"#;
    const TENNIS: &str = r#"{"match_url": "https://www.livesport.com/pl/mecz/tenis/x/y/?mid=T1", "home_team": "Iga Swiatek", "away_team": "Coco Gauff", "sport": "tennis", "ranking_a": 2, "ranking_b": 3}"#;

    #[test]
    fn test_parse_array() {
        let raw = format!("[{}, {}]", ALPHA_BETA, TENNIS);
        let events = parse_events(&raw).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].context.sport, Sport::Tennis);
        assert_eq!(events[1].ranking_a, Some(2));
    }

    #[test]
    fn test_parse_json_lines_skips_comments() {
        let raw = format!("# exported 2024-03-01\n{}\n\n  # tennis\n{}\n", ALPHA_BETA, TENNIS);
        let events = parse_events(&raw).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].context.home_team, "Alpha");
        assert_eq!(events[0].h2h.len(), 1);
    }

    #[test]
    fn test_missing_sport_detected_from_url() {
        let raw = r#"[{"match_url": "https://www.livesport.com/pl/mecz/koszykowka/a/b/?mid=K1", "home_team": "A", "away_team": "B"}]"#;
        let events = parse_events(raw).unwrap();
        assert_eq!(events[0].context.sport, Sport::Basketball);
    }

    #[test]
    fn test_unknown_sport_tag_fails() {
        let raw = r#"{"match_url": "u", "home_team": "A", "away_team": "B", "sport": "curling"}"#;
        assert!(parse_events(raw).is_err());
    }

    #[test]
    fn test_parse_reports_bad_line() {
        let raw = format!("{}\n{{\"home_team\": 3}}\n", ALPHA_BETA);
        let err = parse_events(&raw).unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));
    }

    #[tokio::test]
    async fn test_json_file_source_missing_file() {
        let source = JsonFileSource::new("/nonexistent/h2h-scout/events.json");
        assert!(source.load().await.is_err());
    }

    #[tokio::test]
    async fn test_json_file_source_reads_file() {
        let path = std::env::temp_dir().join(format!("h2h-scout-events-{}.jsonl", std::process::id()));
        tokio::fs::write(&path, format!("{}\n{}\n", ALPHA_BETA, TENNIS)).await.unwrap();
        let source = JsonFileSource::new(&path);
        let events = source.load().await.unwrap();
        tokio::fs::remove_file(&path).await.unwrap();
        assert_eq!(events.len(), 2);
    }
}
