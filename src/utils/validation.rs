use crate::utils::error::{CleanerError, Result};
use std::collections::HashSet;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(CleanerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(CleanerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(CleanerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CleanerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// 驗證清單非空，且每一項都不是空白字串
pub fn validate_non_empty_list(field_name: &str, values: &[String]) -> Result<()> {
    if values.is_empty() {
        return Err(CleanerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: "[]".to_string(),
            reason: "List must contain at least one entry".to_string(),
        });
    }

    for (index, value) in values.iter().enumerate() {
        validate_non_empty_string(&format!("{}[{}]", field_name, index), value)?;
    }

    Ok(())
}

pub fn validate_distinct(field_name: &str, values: &[&str]) -> Result<()> {
    let mut seen = HashSet::new();
    for value in values {
        if !seen.insert(*value) {
            return Err(CleanerError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: value.to_string(),
                reason: "Values must be distinct".to_string(),
            });
        }
    }
    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| CleanerError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(CleanerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("scroll.retry_delay_ms", 1000, 1).is_ok());
        assert!(validate_positive_number("scroll.retry_delay_ms", 0, 1).is_err());
    }

    #[test]
    fn test_validate_non_empty_list() {
        let selectors = vec![".header".to_string(), ".footer".to_string()];
        assert!(validate_non_empty_list("selectors.suppress", &selectors).is_ok());
        assert!(validate_non_empty_list("selectors.suppress", &[]).is_err());

        let with_blank = vec![".header".to_string(), "  ".to_string()];
        let err = validate_non_empty_list("selectors.suppress", &with_blank).unwrap_err();
        assert!(err.to_string().contains("selectors.suppress[1]"));
    }

    #[test]
    fn test_validate_distinct() {
        assert!(validate_distinct("styles", &["clean-mode-style", "clean-mode-font-style"]).is_ok());
        assert!(validate_distinct("styles", &["same", "same"]).is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("font.default_px", 32, 1, 512).is_ok());
        assert!(validate_range("font.default_px", 0, 1, 512).is_err());
        assert!(validate_range("font.default_px", 513, 1, 512).is_err());
    }

    #[test]
    fn test_validate_required_field() {
        let present = Some("page.json".to_string());
        assert_eq!(validate_required_field("page", &present).unwrap(), "page.json");
        assert!(validate_required_field::<String>("page", &None).is_err());
    }
}
