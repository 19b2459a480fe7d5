use anyhow::{Context, Result};
use csv::{QuoteStyle, Terminator, WriterBuilder};

/// Comma-delimited text: one header row, then one row per entry.
///
/// Fields holding the delimiter, a quote or a line break are quoted and embedded
/// quotes are doubled.
pub fn write_delimited(headers: &[String], rows: &[Vec<String>]) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .delimiter(b',')
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .flexible(false)
        .from_writer(Vec::new());

    writer
        .write_record(headers)
        .context("failed to write csv header")?;
    for (row_idx, row) in rows.iter().enumerate() {
        writer
            .write_record(row)
            .with_context(|| format!("failed to write csv row #{row_idx}"))?;
    }

    writer
        .into_inner()
        .map_err(|err| anyhow::anyhow!("failed to flush csv writer: {}", err.error()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_only_fields_that_need_it() {
        let headers = vec!["Name".to_string(), "Notes".to_string()];
        let rows = vec![
            vec!["Plain".to_string(), "a, b".to_string()],
            vec!["Said \"hi\"".to_string(), "line\nbreak".to_string()],
        ];

        let bytes = write_delimited(&headers, &rows).expect("csv should render");
        let text = String::from_utf8(bytes).expect("csv should be utf-8");

        assert_eq!(
            text,
            "Name,Notes\nPlain,\"a, b\"\n\"Said \"\"hi\"\"\",\"line\nbreak\"\n"
        );
    }
}
