use std::path::Path;

use crate::rcv::*;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Finds the position of each of the requested columns in the header row.
pub fn find_columns(header: &[String], names: &[&str]) -> RcvResult<Vec<usize>> {
    let mut res: Vec<usize> = Vec::new();
    for name in names.iter() {
        let idx = header
            .iter()
            .position(|h| h.trim() == *name)
            .context(MissingColumnSnafu { column: *name })?;
        res.push(idx);
    }
    Ok(res)
}

// The date column is only mandatory when filtering on a date.
pub fn date_column(header: &[String], source: &VoteSource) -> RcvResult<Option<usize>> {
    match find_columns(header, &[source.date_column.as_str()]) {
        Ok(cols) => Ok(cols.first().cloned()),
        Err(_) if source.vote_date.is_none() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Reads the content of a rank cell.
///
/// The abstain label and the empty cell mean that the voter did not rank the candidate.
/// Spreadsheets sometimes store the ranks as floating point numbers: `2.0` is accepted.
pub fn parse_rank(content: &str, abstain_label: &str, lineno: usize) -> RcvResult<Preference> {
    let s = content.trim();
    if s.is_empty() || s == abstain_label {
        return Ok(Preference::Abstain);
    }
    if let Ok(r) = s.parse::<u32>() {
        return Ok(Preference::Rank(r));
    }
    match s.parse::<f64>() {
        Ok(f) if f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 => {
            Ok(Preference::Rank(f as u32))
        }
        _ => InvalidRankCellSnafu {
            lineno,
            content: content.to_string(),
        }
        .fail(),
    }
}

/// Turns the rows of the vote sheet into ballots.
///
/// Only the rows of the requested date are kept, when a date is provided.
pub fn rows_to_ballots(rows: &[SheetRow], source: &VoteSource) -> RcvResult<Vec<Ballot>> {
    let mut res: Vec<Ballot> = Vec::new();
    let mut skipped_dates: usize = 0;
    for row in rows.iter() {
        if let Some(date) = &source.vote_date {
            if row.date.as_deref().map(|d| d.trim()) != Some(date.as_str()) {
                skipped_dates += 1;
                continue;
            }
        }
        if row.voter.trim().is_empty() || row.candidate.trim().is_empty() {
            warn!(
                "rows_to_ballots: line {}: skipping row without voter or candidate: {:?}",
                row.lineno, row
            );
            continue;
        }
        let preference = parse_rank(&row.rank, &source.abstain_label, row.lineno)?;
        res.push(Ballot::new(
            row.voter.trim(),
            row.candidate.trim(),
            preference,
        ));
    }
    if skipped_dates > 0 {
        info!(
            "Ignored {} rows not cast on {:?}",
            skipped_dates, source.vote_date
        );
    }
    debug!("rows_to_ballots: {} ballots", res.len());
    Ok(res)
}
