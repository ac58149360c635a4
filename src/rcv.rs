use log::{debug, info, warn};

use ranked_choice::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::rcv::config_reader::*;
use crate::rcv::io_common::{rows_to_ballots, simplify_file_name};

pub mod config_reader;
mod io_common;
mod io_csv;
mod io_xlsx;

#[derive(Debug, Snafu)]
pub enum RcvError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The workbook {path} has no data to read"))]
    EmptyExcel { path: String },
    #[snafu(display("Worksheet {name} not found"))]
    MissingWorksheet { name: String },
    #[snafu(display(
        "The workbook {path} has several worksheets, pick one of {names:?} with excelWorksheetName"
    ))]
    AmbiguousWorksheet { path: String, names: Vec<String> },
    #[snafu(display("Line {lineno}: cannot read cell {content}"))]
    ExcelWrongCellType { lineno: usize, content: String },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON content"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error opening file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno}"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Missing column {column} in the first row"))]
    MissingColumn { column: String },
    #[snafu(display("Line {lineno}: cannot read rank {content:?}"))]
    InvalidRankCell { lineno: usize, content: String },
    #[snafu(display("Invalid ballots: {source}"))]
    Voting { source: VotingErrors },
    #[snafu(display("Error writing the summary to {path}"))]
    WritingSummary {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Missing parent directory"))]
    MissingParentDir {},

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type RcvResult<T> = Result<T, RcvError>;

/// One row of the vote sheet, as read from the file.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SheetRow {
    pub lineno: usize,
    pub voter: String,
    pub date: Option<String>,
    pub candidate: String,
    pub rank: String,
}

fn result_stats_to_json(rs: &Resolution) -> Vec<JSValue> {
    let mut l: Vec<JSValue> = Vec::new();
    let num_rounds = rs.round_stats.len();
    for (idx, round_stat) in rs.round_stats.iter().enumerate() {
        let mut tally: JSMap<String, JSValue> = JSMap::new();
        for (name, count) in round_stat.tally.iter() {
            tally.insert(name.clone(), json!(count.to_string()));
        }

        let mut tally_results: Vec<JSValue> = Vec::new();
        for name in round_stat.eliminated.iter() {
            tally_results.push(json!({ "eliminated": name }));
        }
        // The winner is only reported in the last round.
        if idx == num_rounds - 1 {
            if let Some(winner) = rs.outcome.winner() {
                tally_results.push(json!({ "elected": winner }));
            }
        }

        let js = json!({
            "round": round_stat.round,
            "tally": tally,
            "tallyResults": tally_results,
            "totalVotes": round_stat.total_votes.to_string(),
        });
        l.push(js);
    }
    l
}

fn outcome_to_json(outcome: &Outcome) -> JSValue {
    match outcome {
        Outcome::Winner {
            candidate,
            round,
            vote_share,
            decided_by,
        } => {
            let decided_by = match decided_by {
                Decision::Majority => "majority",
                Decision::MeanRank => "meanRank",
                Decision::RandomDraw => "randomDraw",
            };
            json!({
                "winner": candidate,
                "round": round,
                "share": format!("{:.1}%", vote_share * 100.0),
                "decidedBy": decided_by,
            })
        }
        Outcome::Unresolved(reason) => json!({ "unresolved": reason.to_string() }),
    }
}

fn build_summary_js(config: &RcvConfig, rv: &Resolution) -> JSValue {
    let c = OutputConfig {
        contest: config.output_settings.contest_name.clone(),
        date: config.output_settings.contest_date.clone(),
        scale: rv.scale.clone(),
    };
    json!({
        "config": c,
        "results": result_stats_to_json(rv),
        "outcome": outcome_to_json(&rv.outcome),
    })
}

fn read_ranking_data(root_path: &Path, source: &VoteSource) -> RcvResult<Vec<SheetRow>> {
    let p: PathBuf = root_path.join(&source.file_path);
    let p2 = p.as_path().display().to_string();
    info!("Attempting to read vote file {:?}", p2);
    match source.provider.as_str() {
        "csv" => io_csv::read_csv_votes(&p2, source),
        "xlsx" => io_xlsx::read_excel_votes(&p2, source),
        x => whatever!("Provider not implemented {:?}", x),
    }
}

fn validate_rules(rcv_rules: &RcvRules) -> RcvResult<VoteRules> {
    let max_rounds = match rcv_rules.max_rounds {
        None => VoteRules::DEFAULT_RULES.max_rounds,
        Some(x) if x > 0 => x,
        Some(x) => whatever!("maxRounds must be at least 1, got {}", x),
    };
    Ok(VoteRules {
        max_rounds,
        malformed_ballot_mode: rcv_rules.malformed_ballot_mode()?,
    })
}

fn provider_from_path(path: &str) -> String {
    match Path::new(path).extension().and_then(|e| e.to_str()) {
        Some("xlsx") => "xlsx".to_string(),
        _ => "csv".to_string(),
    }
}

// Builds the configuration from the configuration file if any, then applies the command line options.
// Returns the configuration and the directory against which the relative paths are resolved:
// the directory of the configuration file, or the working directory for a vote sheet given
// on the command line.
fn load_config(args: &Args) -> RcvResult<(RcvConfig, PathBuf)> {
    let (mut config, mut root) = match (&args.config, &args.input) {
        (Some(config_path), _) => {
            let config = read_config(config_path)?;
            let root = Path::new(config_path)
                .parent()
                .context(MissingParentDirSnafu {})?
                .to_path_buf();
            (config, root)
        }
        (None, Some(input)) => {
            let config = RcvConfig {
                output_settings: OutputSettings {
                    contest_name: simplify_file_name(input),
                    contest_date: args.vote_date.clone(),
                    output_file: None,
                },
                vote_source: VoteSource::new(&provider_from_path(input), input),
                candidates: None,
                rules: RcvRules::default(),
            };
            (config, PathBuf::new())
        }
        (None, None) => whatever!("One of --config or --input must be provided"),
    };

    if let Some(input) = &args.input {
        root = PathBuf::new();
        config.vote_source.file_path = input.clone();
        config.vote_source.provider = provider_from_path(input);
    }
    if let Some(input_type) = &args.input_type {
        config.vote_source.provider = input_type.clone();
    }
    if let Some(vote_date) = &args.vote_date {
        config.vote_source.vote_date = Some(vote_date.clone());
    }
    if let Some(worksheet) = &args.excel_worksheet_name {
        config.vote_source.excel_worksheet_name = Some(worksheet.clone());
    }
    if let Some(out) = &args.out {
        config.output_settings.output_file = Some(out.clone());
    }
    debug!("load_config: {:?}", config);
    Ok((config, root))
}

fn check_reference(result_js: &JSValue, summary_ref: &JSValue) -> RcvResult<()> {
    let pretty_js_stats = serde_json::to_string_pretty(result_js).context(ParsingJsonSnafu {})?;
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(summary_ref).context(ParsingJsonSnafu {})?;
    if pretty_js_summary_ref != pretty_js_stats {
        warn!("Found differences with the reference summary");
        print_diff(
            pretty_js_summary_ref.as_str(),
            pretty_js_stats.as_str(),
            "\n",
        );
        whatever!("Difference detected between calculated summary and reference summary")
    }
    Ok(())
}

pub fn run_election(args: &Args) -> RcvResult<Resolution> {
    let (config, root) = load_config(args)?;
    info!("config: {:?}", config);

    let rules = validate_rules(&config.rules)?;

    let rows = read_ranking_data(&root, &config.vote_source)?;
    let ballots = rows_to_ballots(&rows, &config.vote_source)?;
    info!("Read {} ballot rows", ballots.len());

    let result = resolve(&ballots, &rules, &config.candidates).context(VotingSnafu {})?;

    println!("{}", result);

    let result_js = build_summary_js(&config, &result);
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;

    match config.output_settings.output_file.as_deref() {
        Some("stdout") => println!("{}", pretty_js_stats),
        Some(out_path) => {
            info!("Writing summary to {}", out_path);
            fs::write(out_path, &pretty_js_stats).context(WritingSummarySnafu { path: out_path })?;
        }
        None => {}
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = &args.reference {
        let summary_ref = read_summary(summary_p)?;
        debug!("summary: {:?}", summary_ref);
        check_reference(&result_js, &summary_ref)?;
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_dir(test_name: &str) -> String {
        format!("{}/tests/{}", env!("CARGO_MANIFEST_DIR"), test_name)
    }

    fn test_args(test_name: &str) -> Args {
        let dir = test_dir(test_name);
        Args {
            config: Some(format!("{}/{}_config.json", dir, test_name)),
            reference: Some(format!("{}/{}_expected_summary.json", dir, test_name)),
            out: None,
            input: None,
            input_type: None,
            vote_date: None,
            excel_worksheet_name: None,
            verbose: false,
        }
    }

    fn test_wrapper(test_name: &str) -> Resolution {
        let _ = env_logger::builder().is_test(true).try_init();
        match run_election(&test_args(test_name)) {
            Ok(res) => res,
            Err(e) => panic!("election {} failed: {}", test_name, e),
        }
    }

    #[test]
    fn book_club() {
        let res = test_wrapper("book_club");
        assert_eq!(res.outcome.winner(), Some("Dune"));
        assert_eq!(res.round_stats.len(), 2);
    }

    #[test]
    fn book_club_from_the_command_line() {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = test_dir("book_club");
        let args = Args {
            config: None,
            reference: None,
            out: None,
            input: Some(format!("{}/book_club_votes.csv", dir)),
            input_type: None,
            vote_date: Some("2024-02-01".to_string()),
            excel_worksheet_name: None,
            verbose: false,
        };
        // zed and hal are the only voters on that day.
        let res = run_election(&args).unwrap();
        assert_eq!(res.round_stats[0].total_votes, 2);
        assert_eq!(res.scale, vec!["Dune".to_string(), "Emma".to_string()]);
        assert_eq!(res.round_stats[0].tally.len(), 2);
    }

    // Tests run from the manifest directory, the relative vote sheet is resolved from there.
    #[test]
    fn input_overrides_config_from_the_working_directory() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut args = test_args("book_club");
        args.input = Some("tests/book_club/book_club_votes.csv".to_string());

        let (config, root) = load_config(&args).unwrap();
        assert_eq!(root, PathBuf::new());
        assert_eq!(config.vote_source.file_path, "tests/book_club/book_club_votes.csv");
        // The rest of the configuration file still applies.
        assert_eq!(config.vote_source.vote_date.as_deref(), Some("2024-03-01"));

        let res = run_election(&args).unwrap();
        assert_eq!(res.outcome.winner(), Some("Dune"));
    }

    #[test]
    fn book_club_from_a_workbook() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut args = test_args("book_club");
        args.input = Some("tests/book_club/book_club_votes.xlsx".to_string());

        let (config, _) = load_config(&args).unwrap();
        assert_eq!(config.vote_source.provider, "xlsx");
        // Same votes as the CSV sheet, same reference summary.
        let res = run_election(&args).unwrap();
        assert_eq!(res.outcome.winner(), Some("Dune"));
        assert_eq!(res.round_stats.len(), 2);
    }

    #[test]
    fn reference_mismatch_is_an_error() {
        let a = json!({"results": [{"round": 1}]});
        let b = json!({"results": [{"round": 2}]});
        assert!(check_reference(&a, &a).is_ok());
        assert!(check_reference(&a, &b).is_err());
    }

    #[test]
    fn unresolved_summary() {
        let rv = Resolution {
            outcome: Outcome::Unresolved(UnresolvedReason::NoBallots),
            round_stats: vec![],
            scale: vec![],
        };
        assert_eq!(
            outcome_to_json(&rv.outcome),
            json!({"unresolved": "no ballots"})
        );
        assert!(result_stats_to_json(&rv).is_empty());
    }

    #[test]
    fn rules_validation() {
        let rules = validate_rules(&RcvRules::default()).unwrap();
        assert_eq!(rules, VoteRules::DEFAULT_RULES);
        let bad = RcvRules {
            max_rounds: Some(0),
            malformed_ballot: None,
        };
        assert!(validate_rules(&bad).is_err());
    }

    #[test]
    fn missing_input() {
        let args = Args {
            config: None,
            reference: None,
            out: None,
            input: None,
            input_type: None,
            vote_date: None,
            excel_worksheet_name: None,
            verbose: false,
        };
        assert!(load_config(&args).is_err());
    }
}
