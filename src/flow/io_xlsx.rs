// Reads ballots from an Excel file laid out with one candidate per column.

use calamine::{open_workbook, DataType, Reader, Xlsx};
use snafu::prelude::*;

use crate::flow::{io_common::assemble_rankings, *};

pub fn read_xlsx_contest(
    path: String,
    contest_name: String,
    worksheet_name: Option<String>,
) -> FlowResult<Contest> {
    let wrange = get_range(&path, worksheet_name)?;
    let mut iter = wrange.rows();

    let header = iter.next().context(EmptyExcelSnafu {})?;
    debug!("read_xlsx_contest: header: {:?}", header);
    let candidates = read_candidates(header)?;
    debug!("read_xlsx_contest: candidates: {:?}", candidates);

    let mut ballots: Vec<Ballot> = Vec::new();
    for (idx, row) in iter.enumerate() {
        // Rows are numbered from 1, and the header is the first one.
        let lineno = (idx + 2) as u64;
        debug!("read_xlsx_contest: lineno: {:?} row: {:?}", lineno, row);
        let vote_id = match row.first() {
            Some(DataType::Empty) | None => (idx + 1) as u32,
            Some(cell) => read_number(cell, lineno)?,
        };
        let mut ranks: Vec<(u32, u32)> = Vec::new();
        for c in candidates.iter() {
            match row.get(c.id as usize) {
                Some(DataType::Empty) | None => {
                    // Not ranked by this voter.
                }
                Some(cell) => {
                    ranks.push((c.id, read_number(cell, lineno)?));
                }
            }
        }
        ballots.push(Ballot {
            vote_id,
            rankings: assemble_rankings(&ranks),
        });
    }
    info!(
        "read_xlsx_contest: {} ballots, {} candidates",
        ballots.len(),
        candidates.len()
    );

    Ok(Contest {
        name: contest_name,
        candidates,
        ballots,
    })
}

// The first column holds the ballot ids. Candidates take the index of their column
// as id, and columns without a name are ignored.
fn read_candidates(header: &[DataType]) -> FlowResult<Vec<Candidate>> {
    let mut candidates: Vec<Candidate> = Vec::new();
    for (idx, cell) in header.iter().enumerate().skip(1) {
        match cell {
            DataType::Empty => {}
            DataType::String(s) if s.trim().is_empty() => {}
            DataType::String(s) => candidates.push(Candidate {
                id: idx as u32,
                name: s.clone(),
            }),
            _ => {
                return ExcelWrongCellTypeSnafu {
                    lineno: 1_u64,
                    content: format!("{:?}", cell),
                }
                .fail();
            }
        }
    }
    Ok(candidates)
}

fn read_number(cell: &DataType, lineno: u64) -> FlowResult<u32> {
    let n: Option<u32> = match cell {
        DataType::Int(i) => u32::try_from(*i).ok(),
        DataType::Float(f) if *f >= 0.0 && *f <= u32::MAX as f64 && f.fract() == 0.0 => {
            Some(*f as u32)
        }
        DataType::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    };
    n.context(ExcelWrongCellTypeSnafu {
        lineno,
        content: format!("{:?}", cell),
    })
}

fn get_range(
    path: &String,
    worksheet_name_o: Option<String>,
) -> FlowResult<calamine::Range<DataType>> {
    debug!(
        "read_excel_file: path: {:?} worksheet: {:?}",
        &path, &worksheet_name_o
    );
    let mut workbook: Xlsx<_> =
        open_workbook(path.clone()).context(OpeningExcelSnafu { path: path.clone() })?;

    // A worksheet name was provided, use it.
    if let Some(worksheet_name) = worksheet_name_o {
        let wrange = workbook
            .worksheet_range(&worksheet_name)
            .context(EmptyExcelSnafu {})?
            .context(OpeningExcelSnafu { path: path.clone() })?;
        Ok(wrange)
    } else {
        let all_worksheets = workbook.worksheets();
        match all_worksheets.as_slice() {
            [] => EmptyExcelSnafu {}.fail(),
            [(worksheet_name, wrange)] => {
                debug!(
                    "read_excel_file: path: {:?} worksheet: {:?}",
                    &path, &worksheet_name
                );
                Ok(wrange.clone())
            }
            _ => whatever!("The file {} has several worksheets, one must be chosen", path),
        }
    }
}
