use chrono::{DateTime, NaiveDate};

/// `2024-01-05` or an RFC 3339 timestamp as `Jan 05, 2024`. Anything else is
/// shown as an empty cell.
pub fn display_date(raw: &str) -> String {
    let t = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(t) {
        return dt.format("%b %d, %Y").to_string();
    }
    if let Ok(d) = NaiveDate::parse_from_str(t, "%Y-%m-%d") {
        return d.format("%b %d, %Y").to_string();
    }
    String::new()
}

/// Percent-decode a route segment, with `+` read as a space. A malformed
/// escape or a result that is not valid UTF-8 decodes to an empty string.
pub fn decode_segment(raw: &str) -> String {
    let malformed = raw.split('%').skip(1).any(|rest| {
        rest.get(..2)
            .map_or(true, |hex| !hex.bytes().all(|b| b.is_ascii_hexdigit()))
    });
    if malformed {
        return String::new();
    }
    urlencoding::decode(&raw.replace('+', " "))
        .map(|s| s.into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates() {
        assert_eq!(display_date("2024-01-05"), "Jan 05, 2024");
        assert_eq!(display_date("2023-11-30T08:15:00Z"), "Nov 30, 2023");
        assert_eq!(display_date("yesterday"), "");
        assert_eq!(display_date(""), "");
    }

    #[test]
    fn segments() {
        assert_eq!(decode_segment("JSS%201"), "JSS 1");
        assert_eq!(decode_segment("a+b"), "a b");
        assert_eq!(decode_segment("caf%C3%A9"), "café");
        assert_eq!(decode_segment("a%2Bb"), "a+b");
        assert_eq!(decode_segment("..%2F..%2Fusers"), "../../users");
        assert_eq!(decode_segment("bad%2"), "");
        assert_eq!(decode_segment("bad%zz"), "");
        assert_eq!(decode_segment("%FF"), "");
    }
}
