use crate::rcv::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "contestName")]
    pub contest_name: String,
    #[serde(rename = "contestDate")]
    pub contest_date: Option<String>,
    /// (file path or 'stdout') where to write the JSON summary.
    #[serde(rename = "outputFile")]
    pub output_file: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub contest: String,
    pub date: Option<String>,
    pub scale: Vec<String>,
}

fn default_voter_column() -> String {
    "name".to_string()
}

fn default_candidate_column() -> String {
    "book".to_string()
}

fn default_rank_column() -> String {
    "rank".to_string()
}

fn default_date_column() -> String {
    "vote_date".to_string()
}

fn default_abstain_label() -> String {
    "N/A".to_string()
}

/// Where the vote sheet comes from, and how its columns are named.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct VoteSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "voterColumn", default = "default_voter_column")]
    pub voter_column: String,
    #[serde(rename = "candidateColumn", default = "default_candidate_column")]
    pub candidate_column: String,
    #[serde(rename = "rankColumn", default = "default_rank_column")]
    pub rank_column: String,
    #[serde(rename = "dateColumn", default = "default_date_column")]
    pub date_column: String,
    /// Only the rows cast on this date are counted.
    #[serde(rename = "voteDate")]
    pub vote_date: Option<String>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    #[serde(rename = "abstainLabel", default = "default_abstain_label")]
    pub abstain_label: String,
}

impl VoteSource {
    pub fn new(provider: &str, file_path: &str) -> VoteSource {
        VoteSource {
            provider: provider.to_string(),
            file_path: file_path.to_string(),
            voter_column: default_voter_column(),
            candidate_column: default_candidate_column(),
            rank_column: default_rank_column(),
            date_column: default_date_column(),
            vote_date: None,
            excel_worksheet_name: None,
            abstain_label: default_abstain_label(),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct RcvRules {
    #[serde(rename = "maxRounds")]
    pub max_rounds: Option<u32>,
    #[serde(rename = "malformedBallot")]
    pub malformed_ballot: Option<String>,
}

impl RcvRules {
    pub fn malformed_ballot_mode(&self) -> RcvResult<MalformedBallotMode> {
        match self.malformed_ballot.as_deref() {
            None | Some("reject") => Ok(MalformedBallotMode::Reject),
            Some("exclude") => Ok(MalformedBallotMode::Exclude),
            Some(x) => whatever!("unknown malformed ballot mode: {}", x),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RcvConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    #[serde(rename = "voteSource")]
    pub vote_source: VoteSource,
    /// The display order of the candidates.
    pub candidates: Option<Vec<String>>,
    #[serde(default)]
    pub rules: RcvRules,
}

pub fn read_config(path: &str) -> RcvResult<RcvConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: RcvConfig = serde_json::from_str(&contents).context(ParsingJsonSnafu {})?;
    Ok(config)
}

pub fn read_summary(path: &str) -> RcvResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let js = r#"{
            "outputSettings": {"contestName": "March pick"},
            "voteSource": {"provider": "csv", "filePath": "votes.csv"}
        }"#;
        let config: RcvConfig = serde_json::from_str(js).unwrap();
        assert_eq!(config.vote_source, VoteSource::new("csv", "votes.csv"));
        assert_eq!(config.rules, RcvRules::default());
        assert_eq!(config.candidates, None);
        assert_eq!(
            config.rules.malformed_ballot_mode().unwrap(),
            MalformedBallotMode::Reject
        );
    }

    #[test]
    fn custom_columns_and_rules() {
        let js = r#"{
            "outputSettings": {"contestName": "March pick", "outputFile": "stdout"},
            "voteSource": {"provider": "xlsx", "filePath": "votes.xlsx",
                           "voterColumn": "member", "rankColumn": "choice",
                           "voteDate": "2024-03-01", "excelWorksheetName": "Votes"},
            "candidates": ["Emma", "Dune"],
            "rules": {"maxRounds": 10, "malformedBallot": "exclude"}
        }"#;
        let config: RcvConfig = serde_json::from_str(js).unwrap();
        assert_eq!(config.vote_source.voter_column, "member");
        assert_eq!(config.vote_source.candidate_column, "book");
        assert_eq!(config.vote_source.rank_column, "choice");
        assert_eq!(config.vote_source.vote_date, Some("2024-03-01".to_string()));
        assert_eq!(config.rules.max_rounds, Some(10));
        assert_eq!(
            config.rules.malformed_ballot_mode().unwrap(),
            MalformedBallotMode::Exclude
        );
        assert_eq!(
            config.output_settings.output_file,
            Some("stdout".to_string())
        );
    }

    #[test]
    fn unknown_malformed_mode() {
        let rules = RcvRules {
            max_rounds: None,
            malformed_ballot: Some("clamp".to_string()),
        };
        assert!(rules.malformed_ballot_mode().is_err());
    }
}
