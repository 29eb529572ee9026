use crate::errors::internal::ValidationError;

/// Trim `raw` and check its length in characters against `min..=max`
pub fn bounded_name(
    field: &'static str,
    raw: &str,
    min: usize,
    max: usize,
) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }

    let actual = trimmed.chars().count();
    if actual < min || actual > max {
        return Err(ValidationError::Length {
            field,
            min,
            max,
            actual,
        });
    }

    Ok(trimmed.to_string())
}

/// Ids are positive and must fit the storage integer
pub fn require_id(field: &'static str, id: u64) -> Result<i64, ValidationError> {
    if id == 0 {
        return Err(ValidationError::InvalidId { field, value: id });
    }
    i64::try_from(id).map_err(|_| ValidationError::InvalidId { field, value: id })
}

pub fn require_ids(field: &'static str, ids: &[u64]) -> Result<Vec<i64>, ValidationError> {
    if ids.is_empty() {
        return Err(ValidationError::EmptyIdList { field });
    }
    ids.iter().map(|id| require_id(field, *id)).collect()
}

/// Engine-assigned ids are always positive
pub(crate) fn from_db_id(id: i64) -> u64 {
    id.unsigned_abs()
}
