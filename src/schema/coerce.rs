use anyhow::{Context, Result};

/// Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> &str {
    let trimmed = raw.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    }
}

/// Integer cell. Accepts a trailing `.0`, which some exports put on whole numbers.
pub fn parse_int(raw: &str) -> Result<i64> {
    let v = clean_str(raw);
    let v = v.strip_suffix(".0").unwrap_or(v);
    v.parse::<i64>()
        .with_context(|| format!("not an integer: {:?}", raw))
}

/// Decimal with a comma separator, e.g. `"48,43"`.
pub fn parse_decimal_comma(raw: &str) -> Result<f64> {
    clean_str(raw)
        .replace(',', ".")
        .parse::<f64>()
        .with_context(|| format!("not a decimal: {:?}", raw))
}

/// ISO-8859-1 maps each byte to the code point of the same value.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_decimal() {
        assert_eq!(parse_decimal_comma("45,2").unwrap(), 45.2);
        assert_eq!(parse_decimal_comma("\"0,01\"").unwrap(), 0.01);
        assert!(parse_decimal_comma("abc").is_err());
    }

    #[test]
    fn ints() {
        assert_eq!(parse_int(" 13 ").unwrap(), 13);
        assert_eq!(parse_int("2018.0").unwrap(), 2018);
        assert!(parse_int("").is_err());
    }

    #[test]
    fn latin1() {
        assert_eq!(decode_latin1(&[0x53, 0xC3, 0x4F]), "SÃO");
    }
}
