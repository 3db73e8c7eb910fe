use log::{debug, info, warn};

use ranked_flow::graph::winner_name;
use ranked_flow::*;
use snafu::{prelude::*, Snafu};

use std::fs;

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::flow::config_reader::*;

pub mod config_reader;
mod io_common;
mod io_xlsx;

#[derive(Debug, Snafu)]
pub enum FlowError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The Excel file does not contain any data"))]
    EmptyExcel {},
    #[snafu(display("Line {lineno}: cannot understand cell {content}"))]
    ExcelWrongCellType { lineno: u64, content: String },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson { source: std::io::Error, path: String },
    #[snafu(display("Error parsing JSON content"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing the summary to {path}"))]
    WritingOutput { source: std::io::Error, path: String },
    #[snafu(display("Contest {contest}: {source}"))]
    Tabulation {
        source: TabulationErrors,
        contest: String,
    },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type FlowResult<T> = Result<T, FlowError>;

/// A contest, as read from the input files.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Contest {
    pub name: String,
    pub candidates: Vec<Candidate>,
    pub ballots: Vec<Ballot>,
}

fn round_stats_to_json(round_stats: &[RoundStats]) -> Vec<JSValue> {
    let mut l: Vec<JSValue> = Vec::new();
    for round_stat in round_stats.iter() {
        let mut tally: JSMap<String, JSValue> = JSMap::new();
        for (name, count) in round_stat.tally.iter() {
            tally.insert(name.clone(), json!(count.to_string()));
        }

        let mut tally_results: Vec<JSValue> = Vec::new();
        if let Some(elim_stats) = &round_stat.eliminated {
            let mut transfers: JSMap<String, JSValue> = JSMap::new();
            for (name, count) in elim_stats.transfers.iter() {
                transfers.insert(name.clone(), json!(count.to_string()));
            }
            if elim_stats.exhausted > 0 {
                transfers.insert(
                    "exhausted".to_string(),
                    json!(elim_stats.exhausted.to_string()),
                );
            }
            tally_results.push(json!({
                "eliminated": elim_stats.name,
                "transfers": transfers
            }));
        }
        if let Some(winner_name) = &round_stat.elected {
            tally_results.push(json!({
                "elected": winner_name,
                "transfers": {}
            }));
        }

        l.push(json!({
            "round": round_stat.round,
            "tally": tally,
            "exhausted": round_stat.exhausted.to_string(),
            "tallyResults": tally_results
        }));
    }
    l
}

fn edges_to_json(edges: &[FlowEdge]) -> Vec<JSValue> {
    edges
        .iter()
        .map(|e| json!({"source": e.source, "target": e.target, "weight": e.weight}))
        .collect()
}

fn build_contest_js(contest: &Contest, res: &TabulationResult) -> JSValue {
    json!({
        "contest": contest.name,
        "winner": res.winner.name,
        "eliminated": res.eliminated.iter().map(|c| c.name.clone()).collect::<Vec<String>>(),
        "rounds": round_stats_to_json(&res.round_stats),
        "edges": edges_to_json(&res.edges),
    })
}

pub fn run_contest(contest: &Contest) -> FlowResult<JSValue> {
    info!(
        "Contest {}: {} candidates, {} ballots",
        contest.name,
        contest.candidates.len(),
        contest.ballots.len()
    );
    let res = run_tabulation(&contest.candidates, &contest.ballots).context(TabulationSnafu {
        contest: contest.name.clone(),
    })?;
    info!("Contest {}: winner: {}", contest.name, res.winner.name);

    // The edges alone must point to the same winner.
    if let Some(name) = winner_name(&res.edges) {
        if name != res.winner.name {
            whatever!(
                "Contest {}: the flow diagram shows {} as the winner instead of {}",
                contest.name,
                name,
                res.winner.name
            );
        }
    }
    Ok(build_contest_js(contest, &res))
}

fn read_contests(args: &Args) -> FlowResult<Vec<Contest>> {
    let input = args.input.clone();
    let input_type = args.input_type.clone().unwrap_or_else(|| "json".to_string());
    info!("Attempting to read {} file {:?}", input_type, input);
    match input_type.as_str() {
        "json" => read_election(input),
        "xlsx" => {
            let contest_name = args
                .contest_name
                .clone()
                .unwrap_or_else(|| io_common::simplify_file_name(&input));
            let contest = io_xlsx::read_xlsx_contest(
                input,
                contest_name,
                args.excel_worksheet_name.clone(),
            )?;
            Ok(vec![contest])
        }
        x => whatever!("Input type not supported {:?}", x),
    }
}

pub fn build_summary_js(contests: &[Contest]) -> FlowResult<JSValue> {
    let mut results: Vec<JSValue> = Vec::new();
    for contest in contests.iter() {
        results.push(run_contest(contest)?);
    }
    Ok(json!({ "results": results }))
}

fn check_reference(pretty_js_stats: &str, reference_path: String) -> FlowResult<()> {
    let summary_ref = read_summary(reference_path)?;
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
    if pretty_js_summary_ref != pretty_js_stats {
        warn!("Found differences with the reference string");
        print_diff(pretty_js_summary_ref.as_str(), pretty_js_stats, "\n");
        whatever!("Difference detected between calculated summary and reference summary")
    }
    Ok(())
}

pub fn run_election(args: &Args) -> FlowResult<()> {
    let contests = read_contests(args)?;
    debug!("run_election: {} contests", contests.len());

    let result_js = build_summary_js(&contests)?;
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;

    match args.out.as_deref() {
        None | Some("stdout") => {
            println!("{}", pretty_js_stats);
        }
        Some(path) => {
            info!("Writing summary to {:?}", path);
            fs::write(path, &pretty_js_stats).context(WritingOutputSnafu { path })?;
        }
    }

    // The reference summary, if provided for comparison
    if let Some(reference_path) = args.reference.clone() {
        check_reference(&pretty_js_stats, reference_path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scenario() -> Contest {
        let cands = vec![
            Candidate {
                id: 1,
                name: "A".to_string(),
            },
            Candidate {
                id: 2,
                name: "B".to_string(),
            },
            Candidate {
                id: 3,
                name: "C".to_string(),
            },
        ];
        let lists: [&[u32]; 5] = [&[1, 2, 3], &[1, 2, 3], &[2, 3, 1], &[2, 3, 1], &[3, 1, 2]];
        let ballots = lists
            .iter()
            .enumerate()
            .map(|(idx, ids)| Ballot {
                vote_id: idx as u32,
                rankings: ids
                    .iter()
                    .enumerate()
                    .map(|(pos, cid)| Ranking {
                        candidate_id: *cid,
                        rank: (pos + 1) as u32,
                    })
                    .collect(),
            })
            .collect();
        Contest {
            name: "short".to_string(),
            candidates: cands,
            ballots,
        }
    }

    fn temp_file(name: &str, content: &str) -> String {
        let mut p: PathBuf = std::env::temp_dir();
        p.push(format!("irvflow-{}-{}", std::process::id(), name));
        fs::write(&p, content).unwrap();
        p.display().to_string()
    }

    fn args_for(input: String) -> Args {
        Args {
            input,
            input_type: None,
            out: None,
            reference: None,
            contest_name: None,
            excel_worksheet_name: None,
            verbose: false,
        }
    }

    #[test]
    fn contest_summary() {
        let js = run_contest(&scenario()).unwrap();
        assert_eq!(js["winner"], json!("A"));
        assert_eq!(js["eliminated"], json!(["C", "B"]));
        assert_eq!(
            js["edges"][0],
            json!({"source": "C (1) ", "target": "A (3)  ", "weight": "1"})
        );
        assert_eq!(js["edges"].as_array().unwrap().len(), 5);
        assert_eq!(js["rounds"][0]["tally"]["C"], json!("1"));
        assert_eq!(
            js["rounds"][0]["tallyResults"][0],
            json!({"eliminated": "C", "transfers": {"A": "1"}})
        );
        assert_eq!(
            js["rounds"][2]["tallyResults"][0],
            json!({"elected": "A", "transfers": {}})
        );
    }

    #[test]
    fn tabulation_errors_name_the_contest() {
        let mut contest = scenario();
        contest.candidates.clear();
        let err = run_contest(&contest).unwrap_err();
        assert!(matches!(err, FlowError::Tabulation { .. }));
        assert!(err.to_string().starts_with("Contest short:"));
    }

    #[test]
    fn json_file_and_reference() {
        let input = r#"{"contests": [{"contestName": "long",
            "candidates": [{"id": 1, "name": "A"}, {"id": 2, "name": "B"}],
            "ballots": [
                {"voteId": 1, "rankings": [{"candidateId": 2, "rank": 1}]},
                {"voteId": 2, "rankings": [{"candidateId": 2, "rank": 1}, {"candidateId": 1, "rank": 2}]},
                {"voteId": 3, "rankings": [{"candidateId": 1, "rank": 1}]}
            ]}]}"#;
        let input_path = temp_file("input.json", input);
        let out_path = temp_file("out.json", "");

        let mut args = args_for(input_path);
        args.out = Some(out_path.clone());
        run_election(&args).unwrap();

        let written: JSValue =
            serde_json::from_str(&fs::read_to_string(&out_path).unwrap()).unwrap();
        assert_eq!(written["results"][0]["contest"], json!("long"));
        assert_eq!(written["results"][0]["winner"], json!("B"));

        // The output is its own reference.
        args.reference = Some(out_path.clone());
        run_election(&args).unwrap();

        let other_ref = temp_file("other_ref.json", r#"{"results": []}"#);
        args.reference = Some(other_ref);
        assert!(run_election(&args).is_err());
    }

    #[test]
    fn unknown_input_type() {
        let mut args = args_for("ballots.txt".to_string());
        args.input_type = Some("txt".to_string());
        assert!(matches!(
            run_election(&args),
            Err(FlowError::Whatever { .. })
        ));
    }

    #[test]
    fn missing_input() {
        let args = args_for("/nonexistent/election.json".to_string());
        assert!(matches!(
            run_election(&args),
            Err(FlowError::OpeningJson { .. })
        ));
    }
}
