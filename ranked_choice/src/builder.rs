pub use crate::config::*;

/// A builder for collecting the ballots of an election.
///
/// ```
/// pub use ranked_choice::builder::Builder;
/// pub use ranked_choice::{Preference, VoteRules};
/// # use ranked_choice::VotingErrors;
///
/// let mut builder = Builder::new(&VoteRules::DEFAULT_RULES)?
///     .candidates(&["Dune".to_string(), "Emma".to_string()])?;
///
/// builder.add_vote_simple("anna", &["Dune".to_string(), "Emma".to_string()])?;
/// builder.add_vote("bob", &[
///     ("Emma".to_string(), Preference::Rank(1)),
///     ("Dune".to_string(), Preference::Abstain),
/// ])?;
/// builder.add_vote_simple("clara", &["Dune".to_string()])?;
///
/// let resolution = builder.resolve()?;
/// assert_eq!(resolution.outcome.winner(), Some("Dune"));
///
/// # Ok::<(), VotingErrors>(())
/// ```
pub struct Builder {
    pub(crate) _rules: VoteRules,
    pub(crate) _candidates: Option<Vec<String>>,
    pub(crate) _ballots: Vec<Ballot>,
}

impl Builder {
    pub fn new(rules: &VoteRules) -> Result<Builder, VotingErrors> {
        Ok(Builder {
            _rules: rules.clone(),
            _candidates: None,
            _ballots: Vec::new(),
        })
    }

    /// Sets the display order of the candidates. It does not change the outcome.
    pub fn candidates(self, cands: &[String]) -> Result<Builder, VotingErrors> {
        Ok(Builder {
            _rules: self._rules,
            _candidates: Some(cands.to_vec()),
            _ballots: self._ballots,
        })
    }

    /// Adds a vote that ranks the candidates in the given order, starting at 1.
    ///
    /// It is the simplest use case for most cases.
    pub fn add_vote_simple(&mut self, voter: &str, candidates: &[String]) -> Result<(), VotingErrors> {
        let choices: Vec<(String, Preference)> = candidates
            .iter()
            .enumerate()
            .map(|(idx, c)| (c.clone(), Preference::Rank(idx as u32 + 1)))
            .collect();
        self.add_vote(voter, &choices)
    }

    /// Adds all the rows of one voter.
    ///
    /// The ranks are checked when the election is resolved, not here.
    pub fn add_vote(
        &mut self,
        voter: &str,
        choices: &[(String, Preference)],
    ) -> Result<(), VotingErrors> {
        for (candidate, preference) in choices.iter() {
            self.add_ballot(&Ballot::new(voter, candidate, *preference))?;
        }
        Ok(())
    }

    pub fn add_ballot(&mut self, ballot: &Ballot) -> Result<(), VotingErrors> {
        self._ballots.push(ballot.clone());
        Ok(())
    }

    pub fn resolve(&self) -> Result<Resolution, VotingErrors> {
        crate::resolve(&self._ballots, &self._rules, &self._candidates)
    }
}
