use crate::error::{TrainingError, TrainingResult};

/// Class label. Labels travel as integers on both transports.
pub type Label = i64;

/// Checks that `rows` is a non-empty rectangular matrix of finite values and
/// returns its column count.
pub fn validate_features(rows: &[Vec<f64>]) -> TrainingResult<usize> {
    let first = rows
        .first()
        .ok_or_else(|| TrainingError::InvalidDataset("feature matrix must not be empty".to_string()))?;
    let n_features = first.len();
    if n_features == 0 {
        return Err(TrainingError::InvalidDataset("feature rows must not be empty".to_string()));
    }
    for (idx, row) in rows.iter().enumerate() {
        if row.len() != n_features {
            return Err(TrainingError::InvalidDataset(format!(
                "row {idx} has {} features, expected {n_features}",
                row.len()
            )));
        }
        if let Some(col) = row.iter().position(|v| !v.is_finite()) {
            return Err(TrainingError::InvalidDataset(format!(
                "row {idx} column {col} is not a finite number"
            )));
        }
    }
    Ok(n_features)
}

/// Validates a training set and returns its column count.
pub fn validate_training_set(rows: &[Vec<f64>], labels: &[Label]) -> TrainingResult<usize> {
    let n_features = validate_features(rows)?;
    if rows.len() != labels.len() {
        return Err(TrainingError::InvalidDataset(format!(
            "X has {} rows but y has {} labels",
            rows.len(),
            labels.len()
        )));
    }
    Ok(n_features)
}
