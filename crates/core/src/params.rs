//! Validation of numeric request parameters
//!
//! Parameters arrive as raw strings from the transport layer. Anything that
//! is present but not a number is rejected before any upstream call is made.

/// Error type for parameter validation
#[derive(Debug, Clone, PartialEq)]
pub enum ParamError {
    NotNumeric { name: String, value: String },
}

impl std::fmt::Display for ParamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamError::NotNumeric { name, value } => {
                write!(f, "Parameter '{}' must be numeric, got '{}'", name, value)
            }
        }
    }
}

impl std::error::Error for ParamError {}

/// Parse an optional numeric parameter.
///
/// Missing or blank values yield `Ok(None)`. Fractional numbers are truncated
/// toward zero, so `"2.9"` reads as `2`.
pub fn parse_number(name: &str, value: Option<&str>) -> Result<Option<i64>, ParamError> {
    let raw = match value.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(raw) => raw,
    };

    if let Ok(n) = raw.parse::<i64>() {
        return Ok(Some(n));
    }

    match raw.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(Some(n.trunc() as i64)),
        _ => Err(ParamError::NotNumeric {
            name: name.to_string(),
            value: raw.to_string(),
        }),
    }
}
