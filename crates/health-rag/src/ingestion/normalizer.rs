//! Record normalizer: merges every per-user data source into one record per user.
//!
//! Sources are applied in a fixed precedence order:
//! 1. JSON dataset families (`small/`, `medium/`, `large/`), file by file
//! 2. Tabular nutrition data (`extra/nutrition-data.csv`)
//! 3. Wearable-device exports, aggregated per user
//!
//! A missing file or directory is treated as empty input. A file that exists
//! but cannot be parsed as a whole fails with [`Error::FileParse`].

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::DataConfig;
use crate::error::{Error, Result};
use crate::types::UserRecord;

/// A JSON dataset family and the files it may contain
#[derive(Debug, Clone, Copy)]
pub struct DatasetFamily {
    /// Directory name under the data root
    pub name: &'static str,
    /// JSON files, in merge order
    pub files: &'static [&'static str],
}

/// JSON dataset families in merge order
pub const DATASET_FAMILIES: &[DatasetFamily] = &[
    DatasetFamily {
        name: "small",
        files: &[
            "fitness-activities.json",
            "fitness-nutrition.json",
            "fitness-sleep.json",
            "fitness-users.json",
        ],
    },
    DatasetFamily {
        name: "medium",
        files: &[
            "fitness-activities.json",
            "fitness-measurements.json",
            "fitness-users.json",
            "fitness-workouts.json",
        ],
    },
    DatasetFamily {
        name: "large",
        files: &[
            "activities.json",
            "heart_rate.json",
            "measurements.json",
            "nutrition.json",
            "sleep.json",
            "users.json",
            "workouts.json",
        ],
    },
];

/// Tabular nutrition data, relative to the data root
pub const NUTRITION_CSV: &str = "extra/nutrition-data.csv";

/// Wearable export directory, relative to the data root
pub const WEARABLE_DIR: &str = "extra/FitBit Fitness Tracker Data/Fitabase Data 3.12.16-4.11.16";

/// Wearable export files, in merge order
pub const WEARABLE_FILES: &[&str] = &[
    "dailyActivity_merged.csv",
    "heartrate_seconds_merged.csv",
    "hourlyCalories_merged.csv",
    "hourlyIntensities_merged.csv",
    "hourlySteps_merged.csv",
    "minuteCaloriesNarrow_merged.csv",
];

/// How a wearable column is reduced per user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    /// Arithmetic mean of the parseable values
    Mean,
    /// Sum of the parseable values
    Sum,
}

/// Wearable columns: (source column, reduction, stored attribute)
const WEARABLE_COLUMNS: &[(&str, Reduction, &str)] = &[
    ("Calories", Reduction::Mean, "Calories"),
    ("Steps", Reduction::Sum, "Steps"),
    ("Value", Reduction::Mean, "HeartRate"),
    ("HeartRate", Reduction::Mean, "HeartRate"),
    ("Intensity", Reduction::Mean, "Intensity"),
];

/// One named source: user id to flat attributes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSource {
    /// Provenance tag stamped on every record this source touches
    pub name: String,
    /// Per-user attributes, in source order
    pub users: Vec<(String, Map<String, Value>)>,
}

impl RawSource {
    /// Create an empty source
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            users: Vec::new(),
        }
    }

    /// Add one user's attributes
    pub fn with_user(mut self, user_id: impl Into<String>, attributes: Map<String, Value>) -> Self {
        self.users.push((user_id.into(), attributes));
        self
    }
}

/// Merge sources in the order given.
///
/// Later sources overwrite same-named attributes of earlier ones and
/// each merge stamps the source name as the record's provenance tag.
pub fn merge_sources<I>(sources: I) -> BTreeMap<String, UserRecord>
where
    I: IntoIterator<Item = RawSource>,
{
    let mut records: BTreeMap<String, UserRecord> = BTreeMap::new();

    for source in sources {
        for (user_id, attributes) in source.users {
            records
                .entry(user_id.clone())
                .or_insert_with(|| UserRecord::new(user_id))
                .merge(attributes, &source.name);
        }
    }

    records
}

/// Loads and merges every data source under a data root
pub struct RecordNormalizer {
    data_dir: PathBuf,
}

impl RecordNormalizer {
    /// Create a normalizer for a data root
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Create from data configuration
    pub fn from_config(config: &DataConfig) -> Self {
        Self::new(config.data_dir.clone())
    }

    /// Data root
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Load every source and merge into one record per user
    pub fn normalize(&self) -> Result<BTreeMap<String, UserRecord>> {
        let sources = self.load_sources()?;
        let records = merge_sources(sources);

        tracing::info!(
            "Normalized {} user records from {}",
            records.len(),
            self.data_dir.display()
        );

        Ok(records)
    }

    /// Load every available source in precedence order
    pub fn load_sources(&self) -> Result<Vec<RawSource>> {
        let mut sources = Vec::new();

        for family in DATASET_FAMILIES {
            for file in family.files {
                let path = self.data_dir.join(family.name).join(file);
                if !path.is_file() {
                    continue;
                }
                let name = format!("{}/{}", family.name, file);
                sources.push(load_json_source(&path, name)?);
            }
        }

        let nutrition = self.data_dir.join(NUTRITION_CSV);
        if nutrition.is_file() {
            sources.push(load_nutrition_csv(&nutrition, NUTRITION_CSV.to_string())?);
        }

        let wearable_dir = self.data_dir.join(WEARABLE_DIR);
        for file in WEARABLE_FILES {
            let path = wearable_dir.join(file);
            if !path.is_file() {
                continue;
            }
            sources.push(load_wearable_csv(&path, format!("fitbit/{}", file))?);
        }

        Ok(sources)
    }
}

/// Read a JSON file whose top level is `{user_id: {attr: value}}`
pub fn load_json_source(path: &Path, name: String) -> Result<RawSource> {
    let bytes = std::fs::read(path)?;
    let value: Value = serde_json::from_slice(&bytes)
        .map_err(|e| Error::file_parse(path.display().to_string(), e.to_string()))?;

    let Value::Object(users) = value else {
        return Err(Error::file_parse(
            path.display().to_string(),
            "top level must be an object keyed by user id",
        ));
    };

    let mut source = RawSource::new(name);
    for (user_id, attributes) in users {
        match attributes {
            Value::Object(attributes) => source.users.push((user_id, attributes)),
            other => tracing::warn!(
                "Skipping user '{}' in {}: expected an object, got {}",
                user_id,
                source.name,
                other
            ),
        }
    }

    tracing::info!("Loaded {} users from {}", source.users.len(), source.name);
    Ok(source)
}

/// Read the nutrition table: one row per user, keyed by the `user_id` column
pub fn load_nutrition_csv(path: &Path, name: String) -> Result<RawSource> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| Error::file_parse(path.display().to_string(), e.to_string()))?;
    let headers = reader
        .headers()
        .map_err(|e| Error::file_parse(path.display().to_string(), e.to_string()))?
        .clone();

    let id_col = headers
        .iter()
        .position(|h| h.trim() == "user_id")
        .ok_or_else(|| Error::file_parse(path.display().to_string(), "missing 'user_id' column"))?;

    let mut source = RawSource::new(name);
    for (line, row) in reader.records().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!("Skipping row {} of {}: {}", line + 2, source.name, e);
                continue;
            }
        };

        let Some(user_id) = row.get(id_col).map(str::trim).filter(|id| !id.is_empty()) else {
            continue;
        };

        let mut attributes = Map::new();
        for (col, (header, cell)) in headers.iter().zip(row.iter()).enumerate() {
            let cell = cell.trim();
            if col == id_col || cell.is_empty() {
                continue;
            }
            attributes.insert(header.trim().to_string(), parse_cell(cell));
        }

        source.users.push((user_id.to_string(), attributes));
    }

    tracing::info!("Loaded {} rows from {}", source.users.len(), source.name);
    Ok(source)
}

/// Read a wearable export and reduce its time series per user
pub fn load_wearable_csv(path: &Path, name: String) -> Result<RawSource> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| Error::file_parse(path.display().to_string(), e.to_string()))?;
    let headers = reader
        .headers()
        .map_err(|e| Error::file_parse(path.display().to_string(), e.to_string()))?
        .clone();

    let id_col = headers
        .iter()
        .position(|h| h.trim() == "Id")
        .or_else(|| headers.iter().position(|h| h.trim() == "user_id"))
        .ok_or_else(|| {
            Error::file_parse(path.display().to_string(), "missing 'Id' or 'user_id' column")
        })?;

    // (column index, reduction, stored attribute) for columns this file has
    let columns: Vec<(usize, Reduction, &str)> = WEARABLE_COLUMNS
        .iter()
        .filter_map(|(column, reduction, attribute)| {
            headers
                .iter()
                .position(|h| h.trim() == *column)
                .map(|idx| (idx, *reduction, *attribute))
        })
        .collect();

    let mut aggregates: BTreeMap<String, BTreeMap<&str, Accumulator>> = BTreeMap::new();
    let mut row = csv::StringRecord::new();
    let mut skipped = 0usize;

    loop {
        match reader.read_record(&mut row) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) if e.is_io_error() => {
                return Err(Error::file_parse(path.display().to_string(), e.to_string()));
            }
            Err(e) => {
                skipped += 1;
                tracing::debug!("Skipping malformed row in {}: {}", name, e);
                continue;
            }
        }

        let Some(user_id) = row.get(id_col).map(str::trim).filter(|id| !id.is_empty()) else {
            continue;
        };
        let user = aggregates.entry(user_id.to_string()).or_default();

        for &(idx, reduction, attribute) in &columns {
            let acc = user.entry(attribute).or_insert_with(|| Accumulator::new(reduction));
            match row.get(idx).map(str::trim) {
                Some("") | None => {}
                Some(cell) => match cell.parse::<f64>() {
                    Ok(value) if value.is_finite() => acc.add(value),
                    _ => skipped += 1,
                },
            }
        }
    }

    if skipped > 0 {
        tracing::warn!("{}: skipped {} malformed rows or cells", name, skipped);
    }

    let mut source = RawSource::new(name);
    for (user_id, columns) in aggregates {
        let attributes: Map<String, Value> = columns
            .into_iter()
            .filter_map(|(attribute, acc)| acc.finish().map(|v| (attribute.to_string(), Value::from(v))))
            .collect();
        if !attributes.is_empty() {
            source.users.push((user_id, attributes));
        }
    }

    tracing::info!("Aggregated {} users from {}", source.users.len(), source.name);
    Ok(source)
}

/// Running reduction for one user's column
#[derive(Debug, Clone, Copy)]
struct Accumulator {
    reduction: Reduction,
    sum: f64,
    count: usize,
}

impl Accumulator {
    fn new(reduction: Reduction) -> Self {
        Self {
            reduction,
            sum: 0.0,
            count: 0,
        }
    }

    fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    /// `None` when the column never had a value for this user
    fn finish(self) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        match self.reduction {
            Reduction::Mean => Some(self.sum / self.count as f64),
            Reduction::Sum => Some(self.sum),
        }
    }
}

/// Numbers become numbers, everything else stays text
fn parse_cell(cell: &str) -> Value {
    if let Ok(n) = cell.parse::<i64>() {
        return Value::from(n);
    }
    match cell.parse::<f64>() {
        Ok(n) if n.is_finite() => Value::from(n),
        _ => Value::String(cell.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        write(
            root,
            "small/fitness-users.json",
            r#"{"1": {"age": 30, "weight": 70, "height": 1.75}, "2": {"age": 45}}"#,
        );
        write(
            root,
            "medium/fitness-users.json",
            r#"{"1": {"weight": 72, "strength_focus": true}}"#,
        );
        write(
            root,
            "extra/nutrition-data.csv",
            "user_id,calories_intake,protein_g,diet\n2,2100,80,vegan\n3,1800,,keto\n",
        );
        write(
            root,
            &format!("{}/dailyActivity_merged.csv", WEARABLE_DIR),
            "Id,ActivityDate,Steps,Calories\n1,4/12/2016,8000,2000\n1,4/13/2016,6000,2400\n4,4/12/2016,3000,\n",
        );
        write(
            root,
            &format!("{}/heartrate_seconds_merged.csv", WEARABLE_DIR),
            "Id,Time,Value\n4,4/12/2016 7:21:00 AM,70\n4,4/12/2016 7:21:05 AM,80\n",
        );

        dir
    }

    #[test]
    fn test_merge_precedence() {
        let dir = fixture();
        let records = RecordNormalizer::new(dir.path()).normalize().unwrap();

        assert_eq!(records.keys().collect::<Vec<_>>(), vec!["1", "2", "3", "4"]);

        let one = &records["1"];
        assert_eq!(one.get("weight"), Some(&json!(72)));
        assert_eq!(one.get("age"), Some(&json!(30)));
        assert_eq!(one.get("Steps"), Some(&json!(14000.0)));
        assert_eq!(one.get("Calories"), Some(&json!(2200.0)));
        assert_eq!(one.data_source(), Some("fitbit/dailyActivity_merged.csv"));

        let two = &records["2"];
        assert_eq!(two.get("calories_intake"), Some(&json!(2100)));
        assert_eq!(two.get("diet"), Some(&json!("vegan")));
        assert_eq!(two.data_source(), Some("extra/nutrition-data.csv"));

        // Empty cell is not an attribute
        assert!(!records["3"].contains("protein_g"));
    }

    #[test]
    fn test_wearable_absent_columns_are_dropped() {
        let dir = fixture();
        let records = RecordNormalizer::new(dir.path()).normalize().unwrap();

        let four = &records["4"];
        assert_eq!(four.get("Steps"), Some(&json!(3000.0)));
        assert!(!four.contains("Calories"));
        assert_eq!(four.get("HeartRate"), Some(&json!(75.0)));
        assert_eq!(four.data_source(), Some("fitbit/heartrate_seconds_merged.csv"));
    }

    #[test]
    fn test_missing_data_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        let records = RecordNormalizer::new(dir.path().join("nope")).normalize().unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_malformed_file_fails() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "large/users.json", "[1, 2, 3]");

        let err = RecordNormalizer::new(dir.path()).normalize().unwrap_err();
        assert!(matches!(err, Error::FileParse { .. }));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let dir = fixture();
        let normalizer = RecordNormalizer::new(dir.path());
        assert_eq!(normalizer.normalize().unwrap(), normalizer.normalize().unwrap());
    }

    #[test]
    fn test_merge_sources_in_memory() {
        let attrs = |v: Value| v.as_object().unwrap().clone();
        let sources = vec![
            RawSource::new("a").with_user("u", attrs(json!({"x": 1, "y": 1}))),
            RawSource::new("b").with_user("u", attrs(json!({"y": 2}))),
        ];

        let records = merge_sources(sources.clone());
        assert_eq!(records["u"].get("x"), Some(&json!(1)));
        assert_eq!(records["u"].get("y"), Some(&json!(2)));
        assert_eq!(records["u"].data_source(), Some("b"));
        assert_eq!(records, merge_sources(sources));
    }
}
