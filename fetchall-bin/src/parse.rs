use anyhow::{Context, Result, anyhow};
use http::StatusCode;
use std::time::Duration;

/// Parse seconds into a `Duration`, where `0` means no timeout
pub(crate) const fn parse_duration_secs(secs: usize) -> Option<Duration> {
    match secs {
        0 => None,
        secs => Some(Duration::from_secs(secs as u64)),
    }
}

/// Parse a single status code for `--accept`
pub(crate) fn parse_status_code(code: &str) -> Result<u16> {
    let code: u16 = code
        .trim()
        .parse()
        .with_context(|| format!("Invalid status code `{code}`"))?;
    StatusCode::from_u16(code)
        .map(|status| status.as_u16())
        .map_err(|_| anyhow!("Status code out of range: {code}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_parse_duration_secs() {
        assert_eq!(parse_duration_secs(0), None);
        assert_eq!(parse_duration_secs(20), Some(Duration::from_secs(20)));
    }

    #[rstest]
    #[case("200", Some(200))]
    #[case(" 429 ", Some(429))]
    #[case("999", Some(999))]
    #[case("42", None)]
    #[case("1000", None)]
    #[case("ok", None)]
    #[case("", None)]
    fn test_parse_status_code(#[case] input: &str, #[case] expected: Option<u16>) {
        assert_eq!(parse_status_code(input).ok(), expected);
    }
}
