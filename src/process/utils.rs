/// Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

/// Collapse runs of whitespace (tabs, newlines included) into single spaces.
pub fn clean_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse a statistics cell into a non-negative number.
///
/// Thousands separators are dropped first; what remains must be ASCII digits
/// with at most one decimal point. Anything else (signs, units, "N/A", "-")
/// is rejected rather than read as zero.
pub fn parse_value(raw: &str) -> Option<f64> {
    let cleaned: String = clean_str(raw).chars().filter(|&c| c != ',').collect();
    let mut digits = 0usize;
    let mut dots = 0usize;
    for c in cleaned.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => dots += 1,
            _ => return None,
        }
    }
    if digits == 0 || dots > 1 {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_thousands_and_decimals() {
        assert_eq!(parse_value("1,234.5"), Some(1234.5));
        assert_eq!(parse_value(" 400 "), Some(400.0));
        assert_eq!(parse_value("\"12,000\""), Some(12000.0));
        assert_eq!(parse_value("5."), Some(5.0));
        assert_eq!(parse_value(".5"), Some(0.5));
    }

    #[test]
    fn rejects_non_numeric_cells() {
        for raw in ["N/A", "-", "", "1.2.3", "-5", "+5", "3e4", "12%", ".", "１２"] {
            assert_eq!(parse_value(raw), None, "{raw:?} should be rejected");
        }
    }

    #[test]
    fn clean_helpers() {
        assert_eq!(clean_str("  \"감축\"  "), "감축");
        assert_eq!(clean_str("\""), "\"");
        assert_eq!(clean_text(" 기후\t기술\n 분류 "), "기후 기술 분류");
    }
}
