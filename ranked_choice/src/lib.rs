mod config;
mod summary;
mod tiebreak;

pub mod builder;
pub mod manual;

use log::{debug, info, warn};

use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    ops::AddAssign,
};

pub use crate::config::*;

// **** Private structures ****

type RoundId = u32;

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
struct CandidateId(u32);

#[derive(Eq, PartialEq, Debug, Clone, Copy, PartialOrd, Ord, Hash)]
struct VoteCount(u64);

impl VoteCount {
    const EMPTY: VoteCount = VoteCount(0);
}

impl std::iter::Sum for VoteCount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        VoteCount(iter.map(|vc| vc.0).sum())
    }
}

impl AddAssign for VoteCount {
    fn add_assign(&mut self, rhs: VoteCount) {
        self.0 += rhs.0;
    }
}

// All the rows of a single voter that are still in play.
// Invariant: choices is never empty, and the ranks are unique.
#[derive(Eq, PartialEq, Debug, Clone)]
struct VoteInternal {
    voter: String,
    choices: Vec<(CandidateId, Option<u32>)>,
}

impl VoteInternal {
    /// The candidate with the lowest rank, if the voter ranked any of the remaining candidates.
    fn first_choice(&self) -> Option<CandidateId> {
        self.choices
            .iter()
            .filter_map(|(cid, rank)| rank.map(|r| (r, *cid)))
            .min()
            .map(|(_, cid)| cid)
    }

    /// Removes the eliminated candidates. Returns None when nothing is left of this ballot.
    fn filtered(&self, eliminated: &HashSet<CandidateId>) -> Option<VoteInternal> {
        let choices: Vec<(CandidateId, Option<u32>)> = self
            .choices
            .iter()
            .filter(|(cid, _)| !eliminated.contains(cid))
            .cloned()
            .collect();
        if choices.is_empty() {
            None
        } else {
            Some(VoteInternal {
                voter: self.voter.clone(),
                choices,
            })
        }
    }
}

type Tally = BTreeMap<CandidateId, VoteCount>;

/// Runs the instant-runoff resolution over the given ballots.
///
/// Arguments:
/// * `coll` every ballot row of the election. The rows of one voter do not need to be contiguous.
/// * `rules` the rules that govern this election
/// * `scale` an optional fixed ordering of the candidates, used for display only. If not provided,
/// the candidates sorted by name are used.
///
/// An empty election or a round limit that is reached are reported through
/// [`Outcome::Unresolved`]. Only malformed ballots are returned as errors.
pub fn resolve(
    coll: &[Ballot],
    rules: &VoteRules,
    scale: &Option<Vec<String>>,
) -> Result<Resolution, VotingErrors> {
    info!(
        "Processing {:?} ballot rows, scale: {:?}, rules: {:?}",
        coll.len(),
        scale,
        rules
    );

    let cr: CheckResult = checks(coll, rules)?;
    debug!(
        "resolve: checked votes: {:?}, candidates: {:?}",
        cr.votes.len(),
        cr.candidates
    );

    let candidates_by_id: HashMap<CandidateId, String> = cr
        .candidates
        .iter()
        .map(|(cname, cid)| (*cid, cname.clone()))
        .collect();
    let scale = build_scale(&cr.candidates, scale);

    let has_ranked_row = cr.votes.iter().any(|v| v.first_choice().is_some());
    if !has_ranked_row {
        info!("No ranked ballot in this election");
        return Ok(Resolution {
            outcome: Outcome::Unresolved(UnresolvedReason::NoBallots),
            round_stats: Vec::new(),
            scale,
        });
    }

    let mut cur_votes: Vec<VoteInternal> = cr.votes;
    let mut cur_stats: Vec<RoundResult> = Vec::new();
    let mut previous_candidates: Option<BTreeSet<CandidateId>> = None;
    let mut round_id: RoundId = 1;

    loop {
        let present = present_candidates(&cur_votes);
        if let Some(previous) = &previous_candidates {
            // Invariant: the candidates only ever leave the election.
            debug_assert!(
                present.is_subset(previous) && present.len() < previous.len(),
                "The number of candidates did not decrease: {:?} -> {:?}",
                previous,
                present
            );
        }
        let tally = compute_tally(&cur_votes, &present);
        let total: VoteCount = tally.values().cloned().sum();
        debug!(
            "Round id: {:?} tally: {:?} total: {:?}",
            round_id, tally, total
        );

        if let Some(cid) = find_majority(&tally, total) {
            let stats = round_result_to_stat(round_id, &tally, &HashSet::new(), &candidates_by_id);
            debug!("{}", stats);
            let outcome = winner_outcome(cid, &stats, Decision::Majority, &candidates_by_id);
            cur_stats.push(stats);
            return Ok(finish(outcome, cur_stats, scale));
        }

        if round_id > rules.max_rounds {
            let stats = round_result_to_stat(round_id, &tally, &HashSet::new(), &candidates_by_id);
            debug!("{}", stats);
            warn!(
                "More than {} rounds have passed without a winner",
                rules.max_rounds
            );
            cur_stats.push(stats);
            return Ok(finish(
                Outcome::Unresolved(UnresolvedReason::RoundLimitExceeded),
                cur_stats,
                scale,
            ));
        }

        let eliminated = find_eliminated_candidates(&tally);
        debug!("Round id: {:?} eliminated: {:?}", round_id, eliminated);
        let rem_votes: Vec<VoteInternal> = cur_votes
            .iter()
            .filter_map(|v| v.filtered(&eliminated))
            .collect();

        if rem_votes.is_empty() {
            // Every remaining candidate is tied. Nobody is eliminated in this round.
            let stats = round_result_to_stat(round_id, &tally, &HashSet::new(), &candidates_by_id);
            debug!("{}", stats);
            warn!("No clear winner in round {}, trying a tie break", round_id);
            let (cid, decision) = break_full_tie(&cur_votes, &present, &candidates_by_id);
            let outcome = winner_outcome(cid, &stats, decision, &candidates_by_id);
            cur_stats.push(stats);
            return Ok(finish(outcome, cur_stats, scale));
        }

        let stats = round_result_to_stat(round_id, &tally, &eliminated, &candidates_by_id);
        debug!("{}", stats);
        cur_stats.push(stats);
        cur_votes = rem_votes;
        previous_candidates = Some(present);
        round_id += 1;
    }
}

fn finish(outcome: Outcome, round_stats: Vec<RoundResult>, scale: Vec<String>) -> Resolution {
    info!("{}", outcome);
    Resolution {
        outcome,
        round_stats,
        scale,
    }
}

fn winner_outcome(
    cid: CandidateId,
    stats: &RoundResult,
    decided_by: Decision,
    candidates_by_id: &HashMap<CandidateId, String>,
) -> Outcome {
    // The ids are built from the very same names, the lookup cannot miss.
    let candidate = candidates_by_id[&cid].clone();
    let vote_share = stats.share_of(&candidate).unwrap_or(0.0);
    Outcome::Winner {
        candidate,
        round: stats.round,
        vote_share,
        decided_by,
    }
}

// The provided ordering comes first, followed by any other candidate in name order.
fn build_scale(candidates: &[(String, CandidateId)], provided: &Option<Vec<String>>) -> Vec<String> {
    let mut res: Vec<String> = Vec::new();
    if let Some(names) = provided {
        for name in names.iter() {
            if !res.contains(name) {
                res.push(name.clone());
            }
        }
    }
    for (name, _) in candidates.iter() {
        if !res.contains(name) {
            res.push(name.clone());
        }
    }
    res
}

fn present_candidates(votes: &[VoteInternal]) -> BTreeSet<CandidateId> {
    votes
        .iter()
        .flat_map(|v| v.choices.iter().map(|(cid, _)| *cid))
        .collect()
}

fn compute_tally(votes: &[VoteInternal], present: &BTreeSet<CandidateId>) -> Tally {
    // Initialize the tally with all the candidates to capture those who do not even have a vote.
    let mut tally: Tally = present.iter().map(|cid| (*cid, VoteCount::EMPTY)).collect();
    for v in votes.iter() {
        match v.first_choice() {
            Some(cid) => {
                if let Some(vc) = tally.get_mut(&cid) {
                    *vc += VoteCount(1);
                }
            }
            None => debug!("compute_tally: voter {} abstains on all the remaining candidates", v.voter),
        }
    }
    tally
}

// Strictly more than half of the votes. Exactly half is not enough.
fn find_majority(tally: &Tally, total: VoteCount) -> Option<CandidateId> {
    if total == VoteCount::EMPTY {
        return None;
    }
    tally
        .iter()
        .find(|(_, vc)| vc.0 * 2 > total.0)
        .map(|(cid, _)| *cid)
}

// All the candidates sharing the lowest count, which may be all of them.
fn find_eliminated_candidates(tally: &Tally) -> HashSet<CandidateId> {
    let min_count = match tally.values().min() {
        Some(vc) => *vc,
        None => return HashSet::new(),
    };
    tally
        .iter()
        .filter_map(|(cid, vc)| if *vc == min_count { Some(*cid) } else { None })
        .collect()
}

// Tiebreak when all the remaining candidates have the same count:
// the lowest average rank first, then a draw seeded by the candidate names.
fn break_full_tie(
    votes: &[VoteInternal],
    present: &BTreeSet<CandidateId>,
    candidates_by_id: &HashMap<CandidateId, String>,
) -> (CandidateId, Decision) {
    let mut ranks: BTreeMap<CandidateId, Vec<u32>> =
        present.iter().map(|cid| (*cid, Vec::new())).collect();
    for v in votes.iter() {
        for (cid, rank) in v.choices.iter() {
            if let (Some(r), Some(l)) = (rank, ranks.get_mut(cid)) {
                l.push(*r);
            }
        }
    }
    let means: Vec<(CandidateId, Option<tiebreak::MeanRank>)> = ranks
        .iter()
        .map(|(cid, l)| (*cid, tiebreak::MeanRank::of(l)))
        .collect();
    debug!("break_full_tie: mean ranks: {:?}", means);

    let best = tiebreak::lowest_means(&means);
    if let [cid] = best.as_slice() {
        info!(
            "Tie broken by the lowest average rank: {}",
            candidates_by_id[cid]
        );
        return (*cid, Decision::MeanRank);
    }

    warn!("The average rank did not break the tie, drawing a candidate at random");
    let mut names: Vec<(String, CandidateId)> = present
        .iter()
        .map(|cid| (candidates_by_id[cid].clone(), *cid))
        .collect();
    names.sort();
    let sorted_names: Vec<String> = names.iter().map(|(n, _)| n.clone()).collect();
    let idx = tiebreak::draw_index(&sorted_names);
    debug!(
        "break_full_tie: drew index {} among {:?}",
        idx, sorted_names
    );
    (names[idx].1, Decision::RandomDraw)
}

fn round_result_to_stat(
    round_id: RoundId,
    tally: &Tally,
    eliminated: &HashSet<CandidateId>,
    candidates_by_id: &HashMap<CandidateId, String>,
) -> RoundResult {
    let mut pub_tally: Vec<(String, u64)> = tally
        .iter()
        .map(|(cid, vc)| (candidates_by_id[cid].clone(), vc.0))
        .collect();
    pub_tally.sort_by(|(n1, c1), (n2, c2)| c2.cmp(c1).then_with(|| n1.cmp(n2)));
    let mut pub_eliminated: Vec<String> = eliminated
        .iter()
        .map(|cid| candidates_by_id[cid].clone())
        .collect();
    pub_eliminated.sort();
    RoundResult {
        round: round_id,
        total_votes: tally.values().cloned().sum::<VoteCount>().0,
        tally: pub_tally,
        eliminated: pub_eliminated,
    }
}

struct CheckResult {
    votes: Vec<VoteInternal>,
    // Sorted by name
    candidates: Vec<(String, CandidateId)>,
}

// Groups the rows by voter, in order of first appearance, and enforces the ranking rules.
fn checks(coll: &[Ballot], rules: &VoteRules) -> Result<CheckResult, VotingErrors> {
    debug!("checks: coll size: {:?}", coll.len());
    let mut voter_idx: HashMap<&str, usize> = HashMap::new();
    let mut grouped: Vec<(&str, Vec<&Ballot>)> = Vec::new();
    for b in coll.iter() {
        let idx = *voter_idx.entry(b.voter.as_str()).or_insert_with(|| {
            grouped.push((b.voter.as_str(), Vec::new()));
            grouped.len() - 1
        });
        grouped[idx].1.push(b);
    }

    let mut accepted: Vec<(&str, Vec<&Ballot>)> = Vec::new();
    for (voter, rows) in grouped.into_iter() {
        match check_voter(voter, &rows) {
            Ok(()) => accepted.push((voter, rows)),
            Err(e) if rules.malformed_ballot_mode == MalformedBallotMode::Exclude => {
                warn!("checks: excluding the ballot of voter {}: {}", voter, e);
            }
            Err(e) => return Err(e),
        }
    }

    let names: BTreeSet<&str> = accepted
        .iter()
        .flat_map(|(_, rows)| rows.iter().map(|b| b.candidate.as_str()))
        .collect();
    let candidates: Vec<(String, CandidateId)> = names
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.to_string(), CandidateId(idx as u32)))
        .collect();
    let cids: HashMap<&str, CandidateId> = candidates
        .iter()
        .map(|(name, cid)| (name.as_str(), *cid))
        .collect();

    let votes: Vec<VoteInternal> = accepted
        .iter()
        .map(|(voter, rows)| VoteInternal {
            voter: voter.to_string(),
            choices: rows
                .iter()
                .map(|b| (cids[b.candidate.as_str()], b.preference.rank()))
                .collect(),
        })
        .collect();

    debug!(
        "checks: voters: {:?} candidates: {:?}",
        votes.len(),
        candidates.len()
    );
    Ok(CheckResult { votes, candidates })
}

fn check_voter(voter: &str, rows: &[&Ballot]) -> Result<(), VotingErrors> {
    let mut seen_ranks: HashSet<u32> = HashSet::new();
    let mut seen_candidates: HashSet<&str> = HashSet::new();
    for b in rows.iter() {
        if !seen_candidates.insert(b.candidate.as_str()) {
            return Err(VotingErrors::DuplicateCandidate {
                voter: voter.to_string(),
                candidate: b.candidate.clone(),
            });
        }
        match b.preference {
            Preference::Rank(0) => {
                return Err(VotingErrors::InvalidRank {
                    voter: voter.to_string(),
                    candidate: b.candidate.clone(),
                });
            }
            Preference::Rank(r) if !seen_ranks.insert(r) => {
                return Err(VotingErrors::DuplicateRank {
                    voter: voter.to_string(),
                    rank: r,
                });
            }
            _ => {}
        }
    }
    Ok(())
}
