//! Human-readable health summary for a user record

use serde_json::Value;

use crate::types::UserRecord;

/// Physical metrics with their units
const PHYSICAL_METRICS: &[(&str, &str, &str)] = &[
    ("weight", "Weight", "kg"),
    ("height", "Height", "m"),
    ("blood_pressure", "Blood Pressure", "mmHg"),
    ("heart_rate", "Heart Rate", "bpm"),
    ("sleep_quality", "Sleep Quality", "%"),
];

/// Wearable aggregates, printed with one decimal
const WEARABLE_METRICS: &[(&str, &str)] = &[
    ("Calories", "Daily Average Calories"),
    ("Steps", "Total Steps"),
    ("HeartRate", "Average Heart Rate (bpm)"),
    ("Intensity", "Average Activity Intensity"),
];

/// Nutrition fields with their labels and unit suffixes
const NUTRITION_METRICS: &[(&str, &str, &str)] = &[
    ("calories_intake", "Calories Intake", ""),
    ("protein_g", "Protein", " g"),
    ("carbs_g", "Carbs", " g"),
    ("fat_g", "Fat", " g"),
    ("sugar_g", "Sugar", " g"),
    ("fiber_g", "Fiber", " g"),
];

/// Build the summary: demographics, physical metrics, wearable aggregates,
/// activity breakdown, nutrition breakdown, then provenance.
///
/// Sections the record has no data for are left out entirely.
pub fn create_health_summary(record: &UserRecord) -> String {
    let mut parts = Vec::new();

    if let Some(age) = record.get("age") {
        parts.push(format!("Age: {} years", display_value(age)));
    }
    if let Some(gender) = record.get("gender") {
        parts.push(format!("Gender: {}", display_value(gender)));
    }

    for (key, label, unit) in PHYSICAL_METRICS {
        if let Some(value) = record.get(key) {
            parts.push(format!("{}: {} {}", label, display_value(value), unit));
        }
    }

    for (key, label) in WEARABLE_METRICS {
        match record.numeric(key) {
            Ok(Some(value)) => parts.push(format!("{}: {:.1}", label, value)),
            Ok(None) => {}
            Err(issue) => tracing::warn!("Leaving out of summary: {}", issue),
        }
    }

    if let Some(Value::Object(activities)) = record.get("activity_data") {
        parts.push("\nActivity Data:".to_string());
        for (activity, value) in activities {
            parts.push(format!("- {}: {}", activity, display_value(value)));
        }
    }

    if NUTRITION_METRICS.iter().any(|(key, _, _)| record.contains(key)) {
        parts.push("\nNutrition Data:".to_string());
        for (key, label, suffix) in NUTRITION_METRICS {
            if let Some(value) = record.get(key) {
                parts.push(format!("- {}: {}{}", label, display_value(value), suffix));
            }
        }
    }

    if let Some(source) = record.data_source() {
        parts.push(format!("\nSource: {}", source));
    }

    parts.join("\n")
}

/// Render a JSON value without quoting strings
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value, source: &str) -> UserRecord {
        let mut record = UserRecord::new("u1");
        record.merge(
            value
                .as_object()
                .unwrap()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
            source,
        );
        record
    }

    #[test]
    fn test_section_order() {
        let rec = record(
            json!({
                "age": 34,
                "gender": "female",
                "weight": 62.5,
                "height": 1.68,
                "blood_pressure": "118/76",
                "Steps": 84211,
                "Calories": 2210.456,
                "activity_data": {"cycling": "45 min", "running": "30 min"},
                "protein_g": 95,
                "calories_intake": 2100
            }),
            "small/fitness-users.json",
        );

        let summary = create_health_summary(&rec);
        let expected = [
            "Age: 34 years",
            "Gender: female",
            "Weight: 62.5 kg",
            "Height: 1.68 m",
            "Blood Pressure: 118/76 mmHg",
            "Daily Average Calories: 2210.5",
            "Total Steps: 84211.0",
            "",
            "Activity Data:",
            "- cycling: 45 min",
            "- running: 30 min",
            "",
            "Nutrition Data:",
            "- Calories Intake: 2100",
            "- Protein: 95 g",
            "",
            "Source: small/fitness-users.json",
        ]
        .join("\n");

        assert_eq!(summary, expected);
    }

    #[test]
    fn test_absent_sections_are_omitted() {
        let rec = record(json!({"gender": "male"}), "medium/fitness-users.json");
        let summary = create_health_summary(&rec);

        assert_eq!(summary, "Gender: male\n\nSource: medium/fitness-users.json");
        assert!(!summary.contains("Nutrition"));
        assert!(!summary.contains("Activity"));
    }

    #[test]
    fn test_empty_record_gives_empty_summary() {
        let rec = UserRecord::new("nobody");
        assert!(create_health_summary(&rec).is_empty());
    }
}
