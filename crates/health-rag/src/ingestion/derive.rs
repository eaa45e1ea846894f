//! Derived attributes: fitness level, goals and BMI.
//!
//! Everything here is a pure function of a [`UserRecord`]. Attributes that
//! cannot be read as numbers are logged and left out of the computation.

use crate::types::{DataIssue, DerivedAttributes, FitnessLevel, UserRecord};

/// Goal flags, checked in this order
const GOAL_FLAGS: &[(&str, &str)] = &[
    ("endurance_focus", "endurance"),
    ("flexibility_focus", "flexibility"),
    ("strength_focus", "strength"),
];

/// Label used when no goal flag is set
pub const DEFAULT_GOAL: &str = "general_fitness";

/// Scores taken verbatim from the record
const DIRECT_SCORES: &[&str] = &["activity_score", "endurance_level", "strength_score"];

/// Compute every derived attribute for a record
pub fn derive_attributes(record: &UserRecord) -> DerivedAttributes {
    DerivedAttributes {
        fitness_level: calculate_fitness_level(record),
        goals: determine_user_goals(record),
        bmi: calculate_bmi(record),
    }
}

/// Collect the available fitness sub-scores on a 0-10 scale.
///
/// Returns the scores together with any attribute that had to be skipped.
pub fn fitness_sub_scores(record: &UserRecord) -> (Vec<f64>, Vec<DataIssue>) {
    let mut scores = Vec::new();
    let mut issues = Vec::new();

    let mut read = |key: &str| match record.numeric(key) {
        Ok(value) => value,
        Err(issue) => {
            issues.push(issue);
            None
        }
    };

    if let Some(steps) = read("Steps") {
        scores.push(if steps >= 10_000.0 {
            8.0
        } else if steps >= 7_500.0 {
            6.0
        } else if steps >= 5_000.0 {
            4.0
        } else {
            2.0
        });
    }

    if let Some(intensity) = read("Intensity") {
        scores.push((intensity * 2.0).min(10.0));
    }

    if let Some(heart_rate) = read("HeartRate") {
        scores.push(if (60.0..=100.0).contains(&heart_rate) { 7.0 } else { 4.0 });
    }

    if let Some(calories) = read("Calories") {
        scores.push(if calories >= 2_500.0 {
            8.0
        } else if calories >= 2_000.0 {
            6.0
        } else if calories >= 1_500.0 {
            4.0
        } else {
            2.0
        });
    }

    for &key in DIRECT_SCORES {
        if let Some(score) = read(key) {
            scores.push(score);
        }
    }

    (scores, issues)
}

/// Classify fitness from the mean of the available sub-scores
pub fn calculate_fitness_level(record: &UserRecord) -> FitnessLevel {
    let (scores, issues) = fitness_sub_scores(record);

    for issue in &issues {
        tracing::warn!("Skipping fitness sub-score: {}", issue);
    }

    if scores.is_empty() {
        return FitnessLevel::Unknown;
    }

    let avg = scores.iter().sum::<f64>() / scores.len() as f64;
    FitnessLevel::from_score(avg)
}

/// Goal labels from the `*_focus` flags, defaulting to `general_fitness`
pub fn determine_user_goals(record: &UserRecord) -> Vec<String> {
    let goals: Vec<String> = GOAL_FLAGS
        .iter()
        .filter(|(flag, _)| record.flag(flag))
        .map(|(_, goal)| goal.to_string())
        .collect();

    if goals.is_empty() {
        vec![DEFAULT_GOAL.to_string()]
    } else {
        goals
    }
}

/// `weight / height²` rounded to one decimal.
///
/// Height is in metres and weight in kilograms; both must be positive.
pub fn calculate_bmi(record: &UserRecord) -> Option<f64> {
    let read = |key: &str| {
        record.numeric(key).unwrap_or_else(|issue| {
            tracing::warn!("Skipping BMI input: {}", issue);
            None
        })
    };

    let height = read("height")?;
    let weight = read("weight")?;

    if height <= 0.0 || weight <= 0.0 {
        return None;
    }

    let bmi = weight / (height * height);
    Some((bmi * 10.0).round() / 10.0)
}
