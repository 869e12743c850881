use crate::StartError;

/// Inclusive range the requested result limit is clamped into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitBounds {
    pub min: u32,
    pub max: u32,
}

impl Default for LimitBounds {
    fn default() -> Self {
        Self { min: 20, max: 1000 }
    }
}

impl LimitBounds {
    pub fn clamp(&self, limit: u32) -> u32 {
        // A misconfigured range (min > max) collapses onto max.
        limit.max(self.min).min(self.max)
    }
}

/// Operator input for a single collection job.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobParameters {
    pub query: String,
    pub location: String,
    pub limit: Option<u32>,
}

impl JobParameters {
    pub fn new(query: impl Into<String>, location: impl Into<String>, limit: Option<u32>) -> Self {
        Self {
            query: query.into(),
            location: location.into(),
            limit,
        }
    }

    /// Trims the text fields, rejects empty ones and clamps the limit.
    pub fn validate(&self, bounds: &LimitBounds) -> Result<JobParameters, StartError> {
        let query = self.query.trim();
        let location = self.location.trim();
        match (query.is_empty(), location.is_empty()) {
            (true, true) => {
                return Err(StartError::InvalidInput(
                    "Please enter both query and location.".to_string(),
                ))
            }
            (true, false) => {
                return Err(StartError::InvalidInput("Please enter a query.".to_string()))
            }
            (false, true) => {
                return Err(StartError::InvalidInput(
                    "Please enter a location.".to_string(),
                ))
            }
            (false, false) => {}
        }
        Ok(JobParameters {
            query: query.to_string(),
            location: location.to_string(),
            limit: self.limit.map(|limit| bounds.clamp(limit)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_only_fields_are_empty() {
        let params = JobParameters::new("  ", "Berlin", None);
        let err = params.validate(&LimitBounds::default()).unwrap_err();
        assert!(matches!(err, StartError::InvalidInput(_)));
    }

    #[test]
    fn limit_is_clamped_and_fields_trimmed() {
        let bounds = LimitBounds::default();
        let low = JobParameters::new(" plumbers ", " Oslo", Some(3))
            .validate(&bounds)
            .unwrap();
        assert_eq!(low.query, "plumbers");
        assert_eq!(low.location, "Oslo");
        assert_eq!(low.limit, Some(20));

        let high = JobParameters::new("a", "b", Some(5000)).validate(&bounds).unwrap();
        assert_eq!(high.limit, Some(1000));

        let absent = JobParameters::new("a", "b", None).validate(&bounds).unwrap();
        assert_eq!(absent.limit, None);
    }
}
