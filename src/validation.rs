use crate::error::ApiError;

pub fn validate_count(value: usize, max: usize) -> Result<usize, ApiError> {
    if (1..=max).contains(&value) {
        Ok(value)
    } else {
        Err(ApiError::BadRequest(format!(
            "count must be between 1 and {max}"
        )))
    }
}
