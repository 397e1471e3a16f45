/// Smallest number of clicks a single submission counts for.
pub const MIN_CLICKS: i64 = 1;
/// Largest number of clicks a single submission counts for.
pub const MAX_CLICKS: i64 = 10;
/// Country recorded when a submission names none.
pub const UNKNOWN_COUNTRY: &str = "Unknown";

/// A validated click submission, ready to be applied to the counter store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Click {
    pub country: String,
    pub clicks: u64,
}

impl Click {
    /// Normalize a raw submission.
    ///
    /// `clicks` is clamped to `[MIN_CLICKS, MAX_CLICKS]` (a missing value
    /// counts as zero and is clamped up). An empty or missing country becomes
    /// [`UNKNOWN_COUNTRY`]. Country names are otherwise kept verbatim.
    pub fn normalized(country: Option<String>, clicks: Option<i64>) -> Self {
        let country = match country {
            Some(c) if !c.is_empty() => c,
            _ => UNKNOWN_COUNTRY.to_string(),
        };
        let clicks = clicks.unwrap_or(0).clamp(MIN_CLICKS, MAX_CLICKS) as u64;

        Self { country, clicks }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clicks_are_clamped() {
        assert_eq!(Click::normalized(Some("Japan".into()), Some(15)).clicks, 10);
        assert_eq!(Click::normalized(Some("Japan".into()), Some(0)).clicks, 1);
        assert_eq!(Click::normalized(Some("Japan".into()), Some(-40)).clicks, 1);
        assert_eq!(Click::normalized(Some("Japan".into()), None).clicks, 1);
        assert_eq!(Click::normalized(Some("Japan".into()), Some(7)).clicks, 7);
    }

    #[test]
    fn test_missing_country_is_unknown() {
        assert_eq!(Click::normalized(None, Some(1)).country, UNKNOWN_COUNTRY);
        assert_eq!(Click::normalized(Some(String::new()), Some(1)).country, UNKNOWN_COUNTRY);
    }

    #[test]
    fn test_country_is_not_normalized() {
        let click = Click::normalized(Some("japan ".into()), Some(1));
        assert_eq!(click.country, "japan ");
    }
}
