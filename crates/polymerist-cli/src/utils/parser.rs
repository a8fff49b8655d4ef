use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid --set format: '{0}'. Expected KEY=VALUE.")]
    InvalidAssignment(String),

    #[error("Component '{component}' cannot be empty in assignment '{assignment}'.")]
    EmptyComponent {
        component: &'static str,
        assignment: String,
    },

    #[error("Invalid {expected} value for {key}: '{value}'")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },
}

/// Splits a `-S KEY=VALUE` assignment at the first `=`, trimming both sides.
pub fn parse_assignment(assignment: &str) -> Result<(&str, &str), ParseError> {
    let (key, value) = assignment
        .split_once('=')
        .ok_or_else(|| ParseError::InvalidAssignment(assignment.to_string()))?;
    let (key, value) = (key.trim(), value.trim());
    if key.is_empty() {
        return Err(ParseError::EmptyComponent {
            component: "key",
            assignment: assignment.to_string(),
        });
    }
    if value.is_empty() {
        return Err(ParseError::EmptyComponent {
            component: "value",
            assignment: assignment.to_string(),
        });
    }
    Ok((key, value))
}

pub fn parse_value<T: FromStr>(
    key: &str,
    value: &str,
    expected: &'static str,
) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        expected,
    })
}

/// Comma-separated list, empty items dropped.
pub fn parse_list<T: FromStr>(
    key: &str,
    value: &str,
    expected: &'static str,
) -> Result<Vec<T>, ParseError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| parse_value(key, item, expected))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_splits_on_first_equals() {
        assert_eq!(
            parse_assignment("polymer.sequence = A=B").unwrap(),
            ("polymer.sequence", "A=B")
        );
    }

    #[test]
    fn malformed_assignments_are_rejected() {
        assert_eq!(
            parse_assignment("time-step"),
            Err(ParseError::InvalidAssignment("time-step".to_string()))
        );
        assert!(matches!(
            parse_assignment("=5"),
            Err(ParseError::EmptyComponent { component: "key", .. })
        ));
        assert!(matches!(
            parse_assignment("time-step="),
            Err(ParseError::EmptyComponent { component: "value", .. })
        ));
    }

    #[test]
    fn values_and_lists_parse_to_the_requested_type() {
        assert_eq!(parse_value::<usize>("polymer.dop", "12", "integer"), Ok(12));
        assert!(matches!(
            parse_value::<f64>("time-step", "fast", "float"),
            Err(ParseError::InvalidValue { expected: "float", .. })
        ));
        assert_eq!(
            parse_list::<u8>("digits", "1, 2,,3", "integer"),
            Ok(vec![1, 2, 3])
        );
    }
}
