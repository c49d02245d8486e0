//! Field rules for task input.
//!
//! Each rule is a pure function returning `Ok(())` or the specific
//! [`ValidationError`]. The HTTP layer runs them before any service call.

use crate::task::{ParseTaskStatusError, TaskStatus};

/// Longest accepted title, in characters.
pub const MAX_TITLE_LENGTH: usize = 100;

/// Longest accepted description, in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 500;

/// Reasons task input is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Title must not be empty")]
    EmptyTitle,
    #[error("Title must be at most {max} characters, got {actual}")]
    TitleTooLong { max: usize, actual: usize },
    #[error("Description must be at most {max} characters, got {actual}")]
    DescriptionTooLong { max: usize, actual: usize },
    #[error(transparent)]
    UnknownStatus(#[from] ParseTaskStatusError),
    /// The request body could not be read as the expected JSON document.
    #[error("Invalid request body: {0}")]
    MalformedBody(String),
    /// The path or query string could not be parsed.
    #[error("{0}")]
    MalformedRequest(String),
}

/// Validates that a title is not blank and fits the length limit.
///
/// # Errors
///
/// Returns `ValidationError::EmptyTitle` for an empty or whitespace-only title,
/// and `ValidationError::TitleTooLong` past [`MAX_TITLE_LENGTH`] characters.
pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    let actual = title.chars().count();
    if actual > MAX_TITLE_LENGTH {
        return Err(ValidationError::TitleTooLong {
            max: MAX_TITLE_LENGTH,
            actual,
        });
    }
    Ok(())
}

/// Validates an optional description against the length limit.
///
/// # Errors
///
/// Returns `ValidationError::DescriptionTooLong` past
/// [`MAX_DESCRIPTION_LENGTH`] characters.
pub fn validate_description(description: Option<&str>) -> Result<(), ValidationError> {
    let Some(description) = description else {
        return Ok(());
    };
    let actual = description.chars().count();
    if actual > MAX_DESCRIPTION_LENGTH {
        return Err(ValidationError::DescriptionTooLong {
            max: MAX_DESCRIPTION_LENGTH,
            actual,
        });
    }
    Ok(())
}

/// Parses a raw status symbol, ignoring case.
///
/// # Errors
///
/// Returns `ValidationError::UnknownStatus` when the symbol is not a known status.
pub fn parse_status(raw: &str) -> Result<TaskStatus, ValidationError> {
    Ok(raw.parse::<TaskStatus>()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_title_at_the_limit() {
        let title = "a".repeat(MAX_TITLE_LENGTH);
        assert_eq!(validate_title(&title), Ok(()));
        assert_eq!(validate_title("x"), Ok(()));
    }

    #[test]
    fn rejects_title_past_the_limit() {
        let title = "a".repeat(MAX_TITLE_LENGTH + 1);
        assert_eq!(
            validate_title(&title),
            Err(ValidationError::TitleTooLong {
                max: 100,
                actual: 101
            })
        );
    }

    #[test]
    fn rejects_empty_and_blank_titles() {
        assert_eq!(validate_title(""), Err(ValidationError::EmptyTitle));
        assert_eq!(validate_title("   \t"), Err(ValidationError::EmptyTitle));
    }

    #[test]
    fn counts_characters_not_bytes() {
        let title = "ñ".repeat(MAX_TITLE_LENGTH);
        assert!(title.len() > MAX_TITLE_LENGTH);
        assert_eq!(validate_title(&title), Ok(()));
    }

    #[test]
    fn checks_description_only_when_present() {
        assert_eq!(validate_description(None), Ok(()));
        assert_eq!(validate_description(Some("")), Ok(()));
        let at_limit = "d".repeat(MAX_DESCRIPTION_LENGTH);
        assert_eq!(validate_description(Some(&at_limit)), Ok(()));
        let too_long = "d".repeat(MAX_DESCRIPTION_LENGTH + 1);
        assert_eq!(
            validate_description(Some(&too_long)),
            Err(ValidationError::DescriptionTooLong {
                max: 500,
                actual: 501
            })
        );
    }

    #[test]
    fn unknown_status_is_a_validation_error() {
        assert_eq!(parse_status("done"), Ok(TaskStatus::Done));
        let err = parse_status("bogus").unwrap_err();
        assert_eq!(err.to_string(), "Unknown task status 'bogus'");
    }
}
