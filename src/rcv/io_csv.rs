// Primitives for reading CSV exports of the vote sheet.

use crate::rcv::{
    io_common::{date_column, find_columns},
    *,
};

pub fn read_csv_votes(path: &str, source: &VoteSource) -> RcvResult<Vec<SheetRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;

    let header: Vec<String> = rdr
        .headers()
        .context(CsvLineParseSnafu { lineno: 1_usize })?
        .iter()
        .map(|s| s.to_string())
        .collect();
    debug!("read_csv_votes: header: {:?}", header);
    let cols = find_columns(
        &header,
        &[
            source.voter_column.as_str(),
            source.candidate_column.as_str(),
            source.rank_column.as_str(),
        ],
    )?;
    let (voter_idx, candidate_idx, rank_idx) = (cols[0], cols[1], cols[2]);
    let date_idx = date_column(&header, source)?;

    let mut res: Vec<SheetRow> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        // The header is on the first line.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        debug!("read_csv_votes: lineno: {:?} row: {:?}", lineno, line);
        let cell = |i: usize| line.get(i).unwrap_or("").to_string();
        res.push(SheetRow {
            lineno,
            voter: cell(voter_idx),
            date: date_idx.map(cell),
            candidate: cell(candidate_idx),
            rank: cell(rank_idx),
        });
    }
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_file(name: &str) -> String {
        format!(
            "{}/tests/book_club/{}",
            env!("CARGO_MANIFEST_DIR"),
            name
        )
    }

    #[test]
    fn read_book_club_sheet() {
        let source = VoteSource::new("csv", "book_club_votes.csv");
        let rows = read_csv_votes(&test_file("book_club_votes.csv"), &source).unwrap();
        assert_eq!(rows.len(), 17);
        assert_eq!(
            rows[0],
            SheetRow {
                lineno: 2,
                voter: "zed".to_string(),
                date: Some("2024-02-01".to_string()),
                candidate: "Emma".to_string(),
                rank: "1".to_string(),
            }
        );
        assert_eq!(rows[3].rank, "N/A");
    }

    #[test]
    fn missing_rank_column() {
        let mut source = VoteSource::new("csv", "book_club_votes.csv");
        source.rank_column = "preference".to_string();
        let res = read_csv_votes(&test_file("book_club_votes.csv"), &source);
        assert!(matches!(res, Err(RcvError::MissingColumn { .. })));
    }

    #[test]
    fn missing_file() {
        let source = VoteSource::new("csv", "nope.csv");
        let res = read_csv_votes(&test_file("nope.csv"), &source);
        assert!(matches!(res, Err(RcvError::CsvOpen { .. })));
    }
}
