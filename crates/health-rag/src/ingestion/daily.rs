//! Daily summaries for the ingest gateway.
//!
//! Record-array exports (`activities.json`, `workouts.json`, ...) are grouped
//! per user and calendar day, then rendered as one sentence block headed by
//! the user's profile. The result feeds [`SummaryUploader`](super::uploader::SummaryUploader).

use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::config::RagConfig;
use crate::error::{Error, Result};

/// Profile file inside the daily export directory
pub const PROFILES_FILE: &str = "users.json";

/// Per-day record files, in aggregation order
pub const DAILY_FILES: &[(&str, RecordKind)] = &[
    ("activities.json", RecordKind::Activity),
    ("workouts.json", RecordKind::Workout),
    ("sleep.json", RecordKind::Sleep),
    ("nutrition.json", RecordKind::Nutrition),
    ("heart_rate.json", RecordKind::HeartRate),
];

/// Kind of a per-day record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Activity,
    Workout,
    Nutrition,
    Sleep,
    HeartRate,
}

/// Static user profile heading every daily summary
#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub name: String,
    pub age: u32,
    pub gender: String,
    /// Height in centimetres
    pub height: f64,
    /// Weight in kilograms
    pub weight: f64,
    pub fitness_level: String,
}

/// User and calendar day a summary covers
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayKey {
    pub user_id: String,
    pub date: String,
}

/// Rendered sentences collected for one user-day
#[derive(Debug, Clone, Default)]
pub struct DayData {
    pub activities: Vec<String>,
    pub workouts: Vec<String>,
    pub nutrition: Vec<String>,
    pub sleep: Vec<String>,
    pub heart_rates: Vec<f64>,
}

/// One rendered summary, ready to post
#[derive(Debug, Clone, PartialEq)]
pub struct DaySummary {
    pub user_id: String,
    pub date: String,
    pub text: String,
}

impl DaySummary {
    /// Body for `POST /ingest`
    pub fn payload(&self) -> Value {
        json!({
            "text": self.text,
            "meta": {
                "user_id": self.user_id,
                "date": self.date,
                "type": "daily_summary",
            }
        })
    }
}

/// Groups records by user and day
#[derive(Debug, Default)]
pub struct DailyAggregator {
    days: BTreeMap<DayKey, DayData>,
    records: usize,
}

impl DailyAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one record; returns `false` when it has no user or date
    pub fn add(&mut self, kind: RecordKind, record: &Map<String, Value>) -> bool {
        let Some(user_id) = record.get("user_id").and_then(scalar_text) else {
            return false;
        };
        let Some(date) = extract_date(record) else {
            return false;
        };

        let day = self.days.entry(DayKey { user_id, date }).or_default();
        match kind {
            RecordKind::Activity => day.activities.push(format!(
                "did {} for {} minutes in {} weather, burning {} calories, covering {} km with {} steps, avg HR {} bpm (max {}).",
                field(record, "activity_type"),
                field(record, "duration"),
                field(record, "weather"),
                field(record, "calories_burned"),
                field(record, "distance"),
                field(record, "steps"),
                field(record, "heart_rate_avg"),
                field(record, "heart_rate_max"),
            )),
            RecordKind::Workout => day.workouts.push(format!(
                "Completed a {} workout for {} minutes, {} sets of {} reps, burned {} calories.",
                field(record, "workout_type"),
                field(record, "duration"),
                field(record, "sets"),
                field(record, "reps"),
                field(record, "calories_burned"),
            )),
            RecordKind::Nutrition => day.nutrition.push(format!(
                "Ate {} calories at {} ({}g protein, {}g carbs, {}g fat).",
                field(record, "calories"),
                field(record, "meal_type"),
                field(record, "protein"),
                field(record, "carbs"),
                field(record, "fat"),
            )),
            RecordKind::Sleep => day.sleep.push(format!(
                "Slept {} hours (deep {}h, REM {}h), quality {}, resting HR {} bpm.",
                field(record, "total_sleep"),
                field(record, "deep_sleep"),
                field(record, "rem_sleep"),
                field(record, "sleep_quality"),
                field(record, "resting_heart_rate"),
            )),
            RecordKind::HeartRate => match record.get("value").and_then(Value::as_f64) {
                Some(bpm) => day.heart_rates.push(bpm),
                None => tracing::warn!("Skipping heart-rate record without a numeric value"),
            },
        }

        self.records += 1;
        true
    }

    /// Records accepted so far
    pub fn records(&self) -> usize {
        self.records
    }

    /// Distinct user-days seen so far
    pub fn days(&self) -> usize {
        self.days.len()
    }

    /// Render every user-day, ordered by user then date
    pub fn summaries(&self, profiles: &HashMap<String, UserProfile>) -> Vec<DaySummary> {
        self.days
            .iter()
            .map(|(key, data)| DaySummary {
                user_id: key.user_id.clone(),
                date: key.date.clone(),
                text: render_summary(profiles.get(&key.user_id), key, data),
            })
            .collect()
    }
}

/// Day of a record: `date`, else `date_time` up to its first space
pub fn extract_date(record: &Map<String, Value>) -> Option<String> {
    let date = match (record.get("date"), record.get("date_time")) {
        (Some(date), _) => date.as_str()?.to_string(),
        (None, Some(date_time)) => {
            let date_time = date_time.as_str()?;
            date_time
                .split_once(' ')
                .map_or(date_time, |(day, _)| day)
                .to_string()
        }
        (None, None) => return None,
    };
    (!date.is_empty()).then_some(date)
}

/// Profile header followed by the day's sentences in a fixed section order
pub fn render_summary(profile: Option<&UserProfile>, key: &DayKey, data: &DayData) -> String {
    let Some(profile) = profile else {
        return format!("Unknown user {} on {}", key.user_id, key.date);
    };

    let mut summary = format!(
        "{} ({} years old {}, {} cm, {} kg, {} fitness level)",
        profile.name,
        profile.age,
        profile.gender,
        profile.height,
        profile.weight,
        profile.fitness_level
    );

    for sentence in data
        .activities
        .iter()
        .chain(&data.workouts)
        .chain(&data.nutrition)
        .chain(&data.sleep)
    {
        summary.push(' ');
        summary.push_str(sentence);
    }

    let range = data.heart_rates.iter().fold(None, |range, &bpm| match range {
        None => Some((bpm, bpm)),
        Some((lo, hi)) => Some((f64::min(lo, bpm), f64::max(hi, bpm))),
    });
    if let Some((lo, hi)) = range {
        summary.push_str(&format!(" Heart rate ranged {}–{} bpm during the day.", lo, hi));
    }

    summary
}

/// Reads a daily export directory
#[derive(Debug, Clone)]
pub struct DailyLoader {
    dir: PathBuf,
}

impl DailyLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<data_dir>/<daily.family>`
    pub fn from_config(config: &RagConfig) -> Self {
        Self::new(config.data.data_dir.join(&config.daily.family))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load `users.json`; the profile file is required
    pub fn load_profiles(&self) -> Result<HashMap<String, UserProfile>> {
        let path = self.dir.join(PROFILES_FILE);
        let bytes = std::fs::read(&path).map_err(|e| {
            Error::file_parse(path.display().to_string(), format!("cannot read profiles: {}", e))
        })?;
        let profiles: Vec<UserProfile> = serde_json::from_slice(&bytes)
            .map_err(|e| Error::file_parse(path.display().to_string(), e.to_string()))?;

        tracing::info!("Loaded {} user profiles", profiles.len());
        Ok(profiles
            .into_iter()
            .map(|p| (p.user_id.clone(), p))
            .collect())
    }

    /// Aggregate every per-day file that exists.
    ///
    /// A missing or unreadable file is skipped with a warning.
    pub fn aggregate(&self) -> DailyAggregator {
        let mut aggregator = DailyAggregator::new();

        for (file, kind) in DAILY_FILES {
            let path = self.dir.join(file);
            if !path.exists() {
                tracing::warn!("Could not open {}", path.display());
                continue;
            }

            let records = match read_records(&path) {
                Ok(records) => records,
                Err(e) => {
                    tracing::error!("Error processing {}: {}", file, e);
                    continue;
                }
            };

            let before = aggregator.records();
            let skipped = records
                .iter()
                .filter(|record| !aggregator.add(*kind, record))
                .count();
            tracing::info!(
                "Processed {}: {} records, {} without user or date",
                file,
                aggregator.records() - before,
                skipped
            );
        }

        aggregator
    }

    /// Profiles plus aggregation, rendered
    pub fn summaries(&self) -> Result<Vec<DaySummary>> {
        let profiles = self.load_profiles()?;
        let aggregator = self.aggregate();
        tracing::info!(
            "Aggregated {} records into {} user-days",
            aggregator.records(),
            aggregator.days()
        );
        Ok(aggregator.summaries(&profiles))
    }
}

fn read_records(path: &Path) -> Result<Vec<Map<String, Value>>> {
    let bytes = std::fs::read(path)?;
    let records: Vec<Value> = serde_json::from_slice(&bytes)
        .map_err(|e| Error::file_parse(path.display().to_string(), e.to_string()))?;

    Ok(records
        .into_iter()
        .filter_map(|record| match record {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect())
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn field(record: &Map<String, Value>, key: &str) -> String {
    match record.get(key) {
        Some(Value::String(s)) => s.clone(),
        None | Some(Value::Null) => "unknown".to_string(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn record(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn profile() -> UserProfile {
        UserProfile {
            user_id: "u1".to_string(),
            name: "Ada".to_string(),
            age: 34,
            gender: "female".to_string(),
            height: 168.0,
            weight: 61.5,
            fitness_level: "intermediate".to_string(),
        }
    }

    #[test]
    fn test_extract_date() {
        assert_eq!(
            extract_date(&record(json!({"date": "2024-03-01"}))).as_deref(),
            Some("2024-03-01")
        );
        assert_eq!(
            extract_date(&record(json!({"date_time": "2024-03-01 07:15:00"}))).as_deref(),
            Some("2024-03-01")
        );
        assert_eq!(
            extract_date(&record(json!({"date_time": "2024-03-02"}))).as_deref(),
            Some("2024-03-02")
        );
        assert_eq!(extract_date(&record(json!({"date": 20240301}))), None);
        assert_eq!(extract_date(&record(json!({"date": ""}))), None);
        assert_eq!(extract_date(&record(json!({"steps": 10}))), None);
    }

    #[test]
    fn test_records_group_per_user_and_day() {
        let mut aggregator = DailyAggregator::new();
        assert!(aggregator.add(
            RecordKind::HeartRate,
            &record(json!({"user_id": "u1", "date_time": "2024-03-01 07:00:00", "value": 72}))
        ));
        assert!(aggregator.add(
            RecordKind::HeartRate,
            &record(json!({"user_id": "u1", "date_time": "2024-03-01 19:30:00", "value": 58}))
        ));
        assert!(aggregator.add(
            RecordKind::HeartRate,
            &record(json!({"user_id": "u1", "date_time": "2024-03-02 07:00:00", "value": 64}))
        ));
        assert!(!aggregator.add(RecordKind::Sleep, &record(json!({"user_id": "u1"}))));
        assert!(!aggregator.add(RecordKind::Sleep, &record(json!({"date": "2024-03-01"}))));

        assert_eq!(aggregator.records(), 3);
        assert_eq!(aggregator.days(), 2);
    }

    #[test]
    fn test_summary_sections_in_order() {
        let mut aggregator = DailyAggregator::new();
        let day = json!({"user_id": "u1", "date": "2024-03-01"});
        let with = |extra: Value| {
            let mut base = record(day.clone());
            base.extend(record(extra));
            base
        };

        aggregator.add(
            RecordKind::Sleep,
            &with(json!({"total_sleep": 7.5, "deep_sleep": 1.5, "rem_sleep": 2, "sleep_quality": "good", "resting_heart_rate": 55})),
        );
        aggregator.add(
            RecordKind::Nutrition,
            &with(json!({"calories": 650, "meal_type": "lunch", "protein": 40, "carbs": 70, "fat": 20})),
        );
        aggregator.add(
            RecordKind::Activity,
            &with(json!({"activity_type": "running", "duration": 30, "weather": "sunny", "calories_burned": 320, "distance": 5.2, "steps": 6400, "heart_rate_avg": 148, "heart_rate_max": 171})),
        );
        aggregator.add(RecordKind::HeartRate, &with(json!({"value": 58})));
        aggregator.add(RecordKind::HeartRate, &with(json!({"value": 171.5})));

        let profiles = HashMap::from([("u1".to_string(), profile())]);
        let summaries = aggregator.summaries(&profiles);
        assert_eq!(summaries.len(), 1);
        assert_eq!(
            summaries[0].text,
            "Ada (34 years old female, 168 cm, 61.5 kg, intermediate fitness level) \
             did running for 30 minutes in sunny weather, burning 320 calories, covering 5.2 km with 6400 steps, avg HR 148 bpm (max 171). \
             Ate 650 calories at lunch (40g protein, 70g carbs, 20g fat). \
             Slept 7.5 hours (deep 1.5h, REM 2h), quality good, resting HR 55 bpm. \
             Heart rate ranged 58–171.5 bpm during the day."
        );
    }

    #[test]
    fn test_unknown_user_and_missing_fields() {
        let mut aggregator = DailyAggregator::new();
        aggregator.add(
            RecordKind::Workout,
            &record(json!({"user_id": "u9", "date": "2024-03-01", "workout_type": "strength"})),
        );
        aggregator.add(
            RecordKind::Workout,
            &record(json!({"user_id": "u1", "date": "2024-03-01", "workout_type": "strength", "sets": 3})),
        );

        let profiles = HashMap::from([("u1".to_string(), profile())]);
        let summaries = aggregator.summaries(&profiles);
        assert_eq!(summaries[0].user_id, "u1");
        assert!(summaries[0].text.ends_with(
            "Completed a strength workout for unknown minutes, 3 sets of unknown reps, burned unknown calories."
        ));
        assert_eq!(summaries[1].text, "Unknown user u9 on 2024-03-01");
    }

    #[test]
    fn test_payload_shape() {
        let summary = DaySummary {
            user_id: "u1".to_string(),
            date: "2024-03-01".to_string(),
            text: "Ada ...".to_string(),
        };
        assert_eq!(
            summary.payload(),
            json!({"text": "Ada ...", "meta": {"user_id": "u1", "date": "2024-03-01", "type": "daily_summary"}})
        );
    }

    #[test]
    fn test_loader_reads_export_directory() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("users.json"),
            r#"[{"user_id": "u1", "name": "Ada", "age": 34, "gender": "female", "height": 168, "weight": 61.5, "fitness_level": "intermediate"}]"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("heart_rate.json"),
            r#"[{"user_id": "u1", "date_time": "2024-03-01 07:00:00", "value": 60}, 5]"#,
        )
        .unwrap();
        fs::write(dir.path().join("sleep.json"), "not json").unwrap();

        let summaries = DailyLoader::new(dir.path()).summaries().unwrap();
        assert_eq!(summaries.len(), 1);
        assert!(summaries[0].text.ends_with("Heart rate ranged 60–60 bpm during the day."));
    }

    #[test]
    fn test_missing_profiles_fail() {
        let dir = TempDir::new().unwrap();
        let err = DailyLoader::new(dir.path()).summaries().unwrap_err();
        assert!(matches!(err, Error::FileParse { .. }));
    }
}
