// Text rendering of the rounds and of the final outcome.

use std::fmt::{Display, Formatter, Result};

use crate::config::*;

fn percent(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 * 100.0 / total as f64
    }
}

impl Display for RoundResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        writeln!(f, "Round {} (total votes: {})", self.round, self.total_votes)?;
        for (name, count) in self.tally.iter() {
            let marker = if self.eliminated.contains(name) {
                " -> eliminated"
            } else {
                ""
            };
            writeln!(
                f,
                "{:>7} {:>5.1}% {}{}",
                count,
                percent(*count, self.total_votes),
                name,
                marker
            )?;
        }
        Ok(())
    }
}

impl Display for Decision {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Decision::Majority => write!(f, "majority"),
            Decision::MeanRank => write!(f, "lowest average rank after a full tie"),
            Decision::RandomDraw => write!(f, "random draw after a full tie"),
        }
    }
}

impl Display for Outcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Outcome::Winner {
                candidate,
                round,
                vote_share,
                decided_by,
            } => write!(
                f,
                "{} wins in round {} with {:.1}% of the votes ({})",
                candidate,
                round,
                vote_share * 100.0,
                decided_by
            ),
            Outcome::Unresolved(reason) => write!(f, "No winner: {}", reason),
        }
    }
}

impl Display for Resolution {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        for r in self.round_stats.iter() {
            write!(f, "{}", r)?;
        }
        writeln!(f, "{}", self.outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_lines() {
        let r = RoundResult {
            round: 2,
            tally: vec![
                ("X".to_string(), 2),
                ("Y".to_string(), 1),
                ("Z".to_string(), 0),
            ],
            total_votes: 3,
            eliminated: vec!["Z".to_string()],
        };
        assert_eq!(
            r.to_string(),
            "Round 2 (total votes: 3)\n      2  66.7% X\n      1  33.3% Y\n      0   0.0% Z -> eliminated\n"
        );
    }

    #[test]
    fn outcome_lines() {
        let o = Outcome::Winner {
            candidate: "Beloved".to_string(),
            round: 3,
            vote_share: 0.5,
            decided_by: Decision::RandomDraw,
        };
        assert_eq!(
            o.to_string(),
            "Beloved wins in round 3 with 50.0% of the votes (random draw after a full tie)"
        );
        assert_eq!(
            Outcome::Unresolved(UnresolvedReason::RoundLimitExceeded).to_string(),
            "No winner: round limit exceeded"
        );
    }
}
