use crate::domain::ports::AreaStore;
use crate::utils::error::{CoordBufferError, Result};
use chrono::NaiveDate;

/// Whether `airac_date` (YYYY-MM-DD) is at least the newest effective date in the store.
///
/// An empty store is never current.
pub fn is_airac_current<A: AreaStore + ?Sized>(store: &A, airac_date: &str) -> Result<bool> {
    let latest = match store.latest_effective_date()? {
        Some(latest) => latest,
        None => {
            tracing::info!("Area store has no effective dates yet");
            return Ok(false);
        }
    };

    let date = NaiveDate::parse_from_str(airac_date.trim(), "%Y-%m-%d").map_err(|_| {
        CoordBufferError::ValidationError {
            message: "Invalid AIRAC date format, expected YYYY-MM-DD".to_string(),
        }
    })?;

    tracing::debug!("Comparing AIRAC {} with latest stored {}", date, latest);
    Ok(date >= latest)
}
