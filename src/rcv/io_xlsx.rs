// Reading the vote sheet from an Excel workbook.

use calamine::{open_workbook, DataType, Range, Reader, Xlsx};

use crate::rcv::{
    io_common::{date_column, find_columns},
    *,
};

pub fn read_excel_votes(path: &str, source: &VoteSource) -> RcvResult<Vec<SheetRow>> {
    let wrange = get_range(path, source)?;

    let mut iter = wrange.rows();
    let header_cells = iter.next().context(EmptyExcelSnafu { path })?;
    let header: Vec<String> = header_cells
        .iter()
        .map(|c| cell_to_string(c).unwrap_or_default())
        .collect();
    debug!("read_excel_votes: header: {:?}", header);
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
    for (idx, row) in iter.enumerate() {
        let lineno = idx + 2;
        debug!("read_excel_votes: lineno: {:?} row: {:?}", lineno, row);
        let cell = |i: usize| -> RcvResult<String> {
            match row.get(i) {
                None => Ok(String::new()),
                Some(c) => cell_to_string(c).context(ExcelWrongCellTypeSnafu {
                    lineno,
                    content: format!("{:?}", c),
                }),
            }
        };
        let date = match date_idx {
            Some(i) => Some(cell(i)?),
            None => None,
        };
        res.push(SheetRow {
            lineno,
            voter: cell(voter_idx)?,
            date,
            candidate: cell(candidate_idx)?,
            rank: cell(rank_idx)?,
        });
    }
    Ok(res)
}

// Integral numbers are written without decimals, so that ranks and ids read the same as in CSV.
fn cell_to_string(cell: &DataType) -> Option<String> {
    match cell {
        DataType::String(s) => Some(s.clone()),
        DataType::Int(i) => Some(i.to_string()),
        DataType::Float(f) if f.fract() == 0.0 => Some(format!("{}", *f as i64)),
        DataType::Float(f) => Some(f.to_string()),
        DataType::Bool(b) => Some(b.to_string()),
        DataType::Empty => Some(String::new()),
        _ => None,
    }
}

fn get_range(path: &str, source: &VoteSource) -> RcvResult<Range<DataType>> {
    debug!(
        "get_range: path: {:?} worksheet: {:?}",
        path, source.excel_worksheet_name
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it.
    if let Some(worksheet_name) = &source.excel_worksheet_name {
        let wrange = workbook
            .worksheet_range(worksheet_name)
            .context(MissingWorksheetSnafu {
                name: worksheet_name.clone(),
            })?
            .context(OpeningExcelSnafu { path })?;
        return Ok(wrange);
    }

    let all_worksheets = workbook.worksheets();
    match all_worksheets.as_slice() {
        [] => EmptyExcelSnafu { path }.fail(),
        [(worksheet_name, wrange)] => {
            debug!("get_range: using worksheet {:?}", worksheet_name);
            Ok(wrange.clone())
        }
        _ => AmbiguousWorksheetSnafu {
            path,
            names: all_worksheets
                .iter()
                .map(|(n, _)| n.clone())
                .collect::<Vec<String>>(),
        }
        .fail(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells() {
        assert_eq!(
            cell_to_string(&DataType::String("Dune".to_string())),
            Some("Dune".to_string())
        );
        assert_eq!(cell_to_string(&DataType::Float(2.0)), Some("2".to_string()));
        assert_eq!(cell_to_string(&DataType::Float(2.5)), Some("2.5".to_string()));
        assert_eq!(cell_to_string(&DataType::Int(3)), Some("3".to_string()));
        assert_eq!(cell_to_string(&DataType::Empty), Some("".to_string()));
    }

    fn fixture(name: &str) -> String {
        format!("{}/tests/book_club/{}", env!("CARGO_MANIFEST_DIR"), name)
    }

    #[test]
    fn read_book_club_workbook() {
        let path = fixture("book_club_votes.xlsx");
        let source = VoteSource::new("xlsx", &path);
        let rows = read_excel_votes(&path, &source).unwrap();
        assert_eq!(rows.len(), 17);
        assert_eq!(rows[0].voter, "zed");
        assert_eq!(rows[0].date.as_deref(), Some("2024-02-01"));
        assert_eq!(rows[1].lineno, 3);
        assert_eq!(rows[1].candidate, "Dune");
        assert_eq!(rows[1].rank, "1");
        assert_eq!(rows[3].rank, "N/A");
    }

    #[test]
    fn worksheet_by_name() {
        let path = fixture("book_club_votes_by_month.xlsx");
        let mut source = VoteSource::new("xlsx", &path);
        source.excel_worksheet_name = Some("March".to_string());
        let rows = read_excel_votes(&path, &source).unwrap();
        assert_eq!(rows.len(), 15);
        assert!(rows.iter().all(|r| r.date.as_deref() == Some("2024-03-01")));

        source.excel_worksheet_name = Some("February".to_string());
        let rows = read_excel_votes(&path, &source).unwrap();
        let voters: Vec<&str> = rows.iter().map(|r| r.voter.as_str()).collect();
        assert_eq!(voters, vec!["zed", "hal"]);
    }

    #[test]
    fn several_worksheets_need_a_name() {
        let path = fixture("book_club_votes_by_month.xlsx");
        let source = VoteSource::new("xlsx", &path);
        match read_excel_votes(&path, &source) {
            Err(RcvError::AmbiguousWorksheet { names, .. }) => {
                assert_eq!(names, vec!["February".to_string(), "March".to_string()])
            }
            x => panic!("unexpected result: {:?}", x),
        }
    }

    #[test]
    fn unknown_worksheet() {
        let path = fixture("book_club_votes_by_month.xlsx");
        let mut source = VoteSource::new("xlsx", &path);
        source.excel_worksheet_name = Some("April".to_string());
        let res = read_excel_votes(&path, &source);
        assert!(matches!(res, Err(RcvError::MissingWorksheet { .. })));
    }

    #[test]
    fn missing_rank_header() {
        let path = fixture("book_club_votes.xlsx");
        let mut source = VoteSource::new("xlsx", &path);
        source.rank_column = "position".to_string();
        let res = read_excel_votes(&path, &source);
        assert!(matches!(res, Err(RcvError::MissingColumn { .. })));
    }

    #[test]
    fn missing_workbook() {
        let source = VoteSource::new("xlsx", "nope.xlsx");
        let res = read_excel_votes("/nonexistent/nope.xlsx", &source);
        assert!(matches!(res, Err(RcvError::OpeningExcel { .. })));
    }
}
