use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

/// One pledge attempt as written in a replay file. Handles are resolved
/// against the seed index, not stored.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct PledgeRow {
    pub campaign: String,
    pub user: String,
    pub amount: Decimal,
    #[serde(default)]
    pub tier: Option<String>,
}

/// Reads pledge rows from a CSV source.
///
/// Wraps `csv::Reader` with whitespace trimming and flexible record
/// lengths, and yields rows lazily so large replay files stream.
pub struct PledgeReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> PledgeReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn rows(self) -> impl Iterator<Item = Result<PledgeRow, csv::Error>> {
        self.reader.into_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_reader_valid_stream() {
        let data = "campaign, user, amount, tier\nlamp, alice, 75.0, early\nlamp, bob, 20.0,";
        let rows: Vec<_> = PledgeReader::new(data.as_bytes()).rows().collect();

        assert_eq!(rows.len(), 2);
        let first = rows[0].as_ref().unwrap();
        assert_eq!(first.amount, dec!(75.0));
        assert_eq!(first.tier.as_deref(), Some("early"));
        let second = rows[1].as_ref().unwrap();
        assert_eq!(second.tier, None);
    }

    #[test]
    fn test_reader_malformed_amount() {
        let data = "campaign, user, amount, tier\nlamp, alice, not-a-number,";
        let rows: Vec<_> = PledgeReader::new(data.as_bytes()).rows().collect();
        assert!(rows[0].is_err());
    }
}
