// src/load/mod.rs

use anyhow::{Context, Result};
use csv::{ByteRecord, ReaderBuilder};
use std::io::Read;
use tracing::debug;

use crate::schema::{
    coerce::{clean_str, decode_latin1},
    RawTable,
};

pub mod candidates;
pub mod votes_2018;
pub mod votes_2022;

/// Parse a TSE bulk file (Latin-1, `;`-delimited, quoted fields) into a
/// `RawTable` with lowercased headers. `source` only names the data in errors.
pub fn read_tse_csv<R: Read>(reader: R, source: &str) -> Result<RawTable> {
    read_records(reader, source, None)
}

/// Like `read_tse_csv`, but only rows whose `column` passes `keep` are
/// decoded and kept. Rejected rows never leave the reader's buffer.
pub fn read_tse_csv_where<R, F>(
    reader: R,
    source: &str,
    column: &str,
    mut keep: F,
) -> Result<RawTable>
where
    R: Read,
    F: FnMut(&str) -> bool,
{
    let keep: &mut dyn FnMut(&str) -> bool = &mut keep;
    read_records(reader, source, Some((column, keep)))
}

type RowFilter<'a> = (&'a str, &'a mut dyn FnMut(&str) -> bool);

fn read_records<R: Read>(
    reader: R,
    source: &str,
    filter: Option<RowFilter<'_>>,
) -> Result<RawTable> {
    // `;` and `"` are ASCII, so Latin-1 can be split into fields as raw bytes
    // and each field decoded afterwards.
    let mut rdr = ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr
        .byte_headers()
        .with_context(|| format!("reading header of {}", source))?
        .iter()
        .map(|h| decode_latin1(h).trim().to_string())
        .collect();
    let mut table = RawTable::new(headers);
    table.lowercase_headers();

    let mut filter = match filter {
        Some((column, keep)) => Some((
            table
                .require_column(column)
                .with_context(|| format!("filtering {}", source))?,
            keep,
        )),
        None => None,
    };

    let mut record = ByteRecord::new();
    let mut idx = 0usize;
    loop {
        let more = rdr
            .read_byte_record(&mut record)
            .with_context(|| format!("CSV parse error in {} at record {}", source, idx))?;
        if !more {
            break;
        }
        idx += 1;

        if let Some((col, keep)) = filter.as_mut() {
            let value = decode_latin1(record.get(*col).unwrap_or(b""));
            if !keep(clean_str(&value)) {
                continue;
            }
        }
        table.rows.push(record.iter().map(decode_latin1).collect());
    }

    debug!(source, read = idx, kept = table.len(), "csv read");
    Ok(table)
}
