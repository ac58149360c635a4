// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// The preference a voter expressed for one candidate.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Preference {
    /// An explicit rank. `1` is the most preferred choice.
    Rank(u32),
    /// The voter declined to rank this candidate.
    /// The row still makes the candidate part of the election.
    Abstain,
}

impl Preference {
    pub fn rank(&self) -> Option<u32> {
        match self {
            Preference::Rank(r) => Some(*r),
            Preference::Abstain => None,
        }
    }
}

/// One row of a voter's ballot: a single candidate and the rank given to it.
///
/// A voter usually contributes several rows, one per candidate.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Ballot {
    pub voter: String,
    pub candidate: String,
    pub preference: Preference,
}

impl Ballot {
    pub fn new(voter: &str, candidate: &str, preference: Preference) -> Ballot {
        Ballot {
            voter: voter.to_string(),
            candidate: candidate.to_string(),
            preference,
        }
    }
}

// ******** Output data structures *********

/// Statistics for one round
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RoundResult {
    pub round: u32,
    /// Every candidate still present in this round, sorted by decreasing count then name.
    pub tally: Vec<(String, u64)>,
    pub total_votes: u64,
    /// The candidates removed at the end of this round, sorted by name.
    pub eliminated: Vec<String>,
}

impl RoundResult {
    pub fn votes_for(&self, candidate: &str) -> Option<u64> {
        self.tally
            .iter()
            .find(|(name, _)| name == candidate)
            .map(|(_, count)| *count)
    }

    /// The share of the votes of this round, between 0 and 1.
    pub fn share_of(&self, candidate: &str) -> Option<f64> {
        let count = self.votes_for(candidate)?;
        if self.total_votes == 0 {
            Some(0.0)
        } else {
            Some(count as f64 / self.total_votes as f64)
        }
    }
}

/// How the winner of an election was determined.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Decision {
    /// The candidate held a strict majority of the votes of a round.
    Majority,
    /// Every remaining candidate was tied and the candidate had the lowest average rank.
    MeanRank,
    /// Every remaining candidate was tied, the average ranks did not separate them either,
    /// and the candidate was drawn with a seed derived from the candidate names.
    RandomDraw,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum UnresolvedReason {
    NoBallots,
    RoundLimitExceeded,
}

impl Display for UnresolvedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnresolvedReason::NoBallots => write!(f, "no ballots"),
            UnresolvedReason::RoundLimitExceeded => write!(f, "round limit exceeded"),
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub enum Outcome {
    Winner {
        candidate: String,
        round: u32,
        vote_share: f64,
        decided_by: Decision,
    },
    Unresolved(UnresolvedReason),
}

impl Outcome {
    pub fn winner(&self) -> Option<&str> {
        match self {
            Outcome::Winner { candidate, .. } => Some(candidate.as_str()),
            Outcome::Unresolved(_) => None,
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct Resolution {
    pub outcome: Outcome,
    pub round_stats: Vec<RoundResult>,
    /// Stable ordering of the candidates, used to keep the same position or color
    /// for a candidate across all the rounds. It has no effect on the tally.
    pub scale: Vec<String>,
}

impl Resolution {
    pub fn scale_index(&self, candidate: &str) -> Option<usize> {
        self.scale.iter().position(|c| c == candidate)
    }
}

/// Errors that prevent the algorithm from completing successfully.
///
/// They all describe ballots that the caller should have rejected before
/// handing them over.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum VotingErrors {
    /// Ranks start at 1.
    InvalidRank { voter: String, candidate: String },
    /// The voter gave the same rank to two candidates.
    DuplicateRank { voter: String, rank: u32 },
    /// The voter has more than one row for the same candidate.
    DuplicateCandidate { voter: String, candidate: String },
}

impl Error for VotingErrors {}

impl Display for VotingErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VotingErrors::InvalidRank { voter, candidate } => write!(
                f,
                "voter {} gave rank 0 to {} (ranks start at 1)",
                voter, candidate
            ),
            VotingErrors::DuplicateRank { voter, rank } => {
                write!(f, "voter {} used rank {} more than once", voter, rank)
            }
            VotingErrors::DuplicateCandidate { voter, candidate } => {
                write!(f, "voter {} ranked {} more than once", voter, candidate)
            }
        }
    }
}

// ********* Configuration **********

/// What to do with a voter whose rows break the ranking rules
/// (rank 0, repeated rank or repeated candidate).
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum MalformedBallotMode {
    /// Stop and return the corresponding error.
    Reject,
    /// Drop all the rows of this voter and keep going.
    Exclude,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct VoteRules {
    /// Rounds beyond this number are reported as unresolved.
    pub max_rounds: u32,
    pub malformed_ballot_mode: MalformedBallotMode,
}

impl VoteRules {
    pub const DEFAULT_RULES: VoteRules = VoteRules {
        max_rounds: 100,
        malformed_ballot_mode: MalformedBallotMode::Reject,
    };
}

impl Default for VoteRules {
    fn default() -> Self {
        VoteRules::DEFAULT_RULES
    }
}
