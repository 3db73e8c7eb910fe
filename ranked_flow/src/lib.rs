mod config;
pub mod builder;
pub mod graph;
pub mod manual;

use log::{debug, info};

use std::{
    collections::{HashMap, HashSet},
    ops::{Add, AddAssign},
};

pub use crate::config::*;
use crate::graph::{FlowGraph, VertexKey};

// **** Private structures ****

type RoundId = u32;

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
struct CandidateId(u32);

#[derive(Eq, PartialEq, Debug, Clone, Copy, PartialOrd, Ord, Hash, Default)]
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

impl Add for VoteCount {
    type Output = VoteCount;
    fn add(self: VoteCount, rhs: VoteCount) -> VoteCount {
        VoteCount(self.0 + rhs.0)
    }
}

// A validated ballot. The choices keep the order (and the ranks) of the input.
#[derive(Eq, PartialEq, Debug, Clone)]
struct RankedBallot {
    vote_id: u32,
    choices: Vec<(CandidateId, u32)>,
}

/// The working state of one tabulation.
///
/// The ballots are never removed or reordered. Each ballot has a cursor that
/// points to its first choice not known to be eliminated. Cursors only move forward.
struct Electorate {
    ballots: Vec<RankedBallot>,
    cursors: Vec<usize>,
    // Still running, in the order defined by the input.
    active: Vec<CandidateId>,
    eliminated: HashSet<CandidateId>,
}

impl Electorate {
    fn new(ballots: Vec<RankedBallot>, candidates: Vec<CandidateId>) -> Electorate {
        Electorate {
            cursors: vec![0; ballots.len()],
            ballots,
            active: candidates,
            eliminated: HashSet::new(),
        }
    }

    /// Moves the cursor of a ballot past the eliminated candidates and returns
    /// the current choice, or None if the ballot is exhausted.
    fn current_choice(&mut self, idx: usize) -> Option<CandidateId> {
        let choices = &self.ballots[idx].choices;
        let mut pos = self.cursors[idx];
        while pos < choices.len() && self.eliminated.contains(&choices[pos].0) {
            pos += 1;
        }
        self.cursors[idx] = pos;
        choices.get(pos).map(|(cid, _)| *cid)
    }

    /// The count for every active candidate, and the number of exhausted ballots.
    fn compute_tally(&mut self) -> (HashMap<CandidateId, VoteCount>, VoteCount) {
        let mut tally: HashMap<CandidateId, VoteCount> = self
            .active
            .iter()
            .map(|cid| (*cid, VoteCount::EMPTY))
            .collect();
        let mut exhausted = VoteCount::EMPTY;
        for idx in 0..self.ballots.len() {
            match self.current_choice(idx) {
                Some(cid) => {
                    // A choice that is not eliminated is always active.
                    if let Some(vc) = tally.get_mut(&cid) {
                        *vc += VoteCount(1);
                    }
                }
                None => {
                    exhausted += VoteCount(1);
                }
            }
        }
        (tally, exhausted)
    }

    /// Borda-style score over the full rankings of all the ballots, restricted to
    /// the active candidates. Only used to break ties between equal tallies.
    fn tiebreak_scores(&self, num_candidates: u32) -> HashMap<CandidateId, u64> {
        let mut scores: HashMap<CandidateId, u64> =
            self.active.iter().map(|cid| (*cid, 0)).collect();
        for b in self.ballots.iter() {
            for (cid, rank) in b.choices.iter() {
                let weight = num_candidates as i64 - *rank as i64 + 1;
                if weight <= 0 {
                    continue;
                }
                if let Some(s) = scores.get_mut(cid) {
                    *s += weight as u64;
                }
            }
        }
        scores
    }

    fn eliminate(&mut self, loser: CandidateId) {
        self.active.retain(|cid| *cid != loser);
        let inserted = self.eliminated.insert(loser);
        assert!(inserted, "Candidate eliminated twice: {:?}", loser);
    }

    /// Moves the ballots currently held by the loser to their next choice.
    ///
    /// Must be called after the loser has been eliminated. Returns the transfers
    /// per receiving candidate and the number of ballots that got exhausted.
    fn transfer_votes(
        &mut self,
        loser: CandidateId,
    ) -> (HashMap<CandidateId, VoteCount>, VoteCount) {
        let mut transfers: HashMap<CandidateId, VoteCount> = HashMap::new();
        let mut exhausted = VoteCount::EMPTY;
        for idx in 0..self.ballots.len() {
            let held_by_loser = self.ballots[idx]
                .choices
                .get(self.cursors[idx])
                .map(|(cid, _)| *cid == loser)
                .unwrap_or(false);
            if !held_by_loser {
                continue;
            }
            match self.current_choice(idx) {
                Some(cid) => {
                    debug!(
                        "transfer_votes: ballot {} goes from {:?} to {:?}",
                        self.ballots[idx].vote_id, loser, cid
                    );
                    *transfers.entry(cid).or_insert(VoteCount::EMPTY) += VoteCount(1);
                }
                None => {
                    debug!(
                        "transfer_votes: ballot {} is exhausted",
                        self.ballots[idx].vote_id
                    );
                    exhausted += VoteCount(1);
                }
            }
        }
        (transfers, exhausted)
    }
}

/// Runs the instant-runoff tabulation and returns the edges of the vote-transfer diagram.
///
/// A single candidate wins without any round: the list of edges is then empty.
pub fn tabulate(
    candidates: &[Candidate],
    ballots: &[Ballot],
) -> Result<Vec<FlowEdge>, TabulationErrors> {
    run_tabulation(candidates, ballots).map(|res| res.edges)
}

/// Runs the instant-runoff tabulation.
///
/// Arguments:
/// * `candidates` the registered candidates. The order is kept in the outputs.
/// * `ballots` the ballots, with rankings sorted by increasing rank.
///
/// Every round, the candidate with the lowest tally is eliminated. Ties are broken
/// by the lowest Borda-style score, then by the lowest candidate id.
pub fn run_tabulation(
    candidates: &[Candidate],
    ballots: &[Ballot],
) -> Result<TabulationResult, TabulationErrors> {
    info!(
        "Processing {:?} ballots, {:?} candidates",
        ballots.len(),
        candidates.len()
    );

    let cr = checks(candidates, ballots)?;
    for c in candidates.iter() {
        info!("Candidate: {}: {}", c.id, c.name);
    }

    let num_candidates = candidates.len() as u32;
    let candidates_by_id: HashMap<CandidateId, &Candidate> = candidates
        .iter()
        .map(|c| (CandidateId(c.id), c))
        .collect();
    let names: HashMap<CandidateId, String> = candidates
        .iter()
        .map(|c| (CandidateId(c.id), c.name.clone()))
        .collect();
    let name_of = |cid: &CandidateId| names.get(cid).cloned().unwrap_or_default();

    let mut state = Electorate::new(cr.ballots, cr.candidates);
    let mut graph = FlowGraph::new();
    let mut stats: Vec<RoundStats> = Vec::new();
    let mut eliminated: Vec<Candidate> = Vec::new();
    let mut round_id: RoundId = 1;

    while state.active.len() > 1 {
        let (tally, exhausted) = state.compute_tally();
        debug!("run_tabulation: round {} tally: {:?}", round_id, tally);
        if round_id > 1 {
            check_conservation(&graph, &tally, round_id);
        }
        for cid in state.active.iter() {
            graph.add_vertex(*cid, round_id, tally[cid]);
        }

        let scores = state.tiebreak_scores(num_candidates);
        debug!("run_tabulation: round {} scores: {:?}", round_id, scores);
        let loser = find_loser(&state.active, &tally, &scores);
        let round_tally: Vec<(String, u64)> = state
            .active
            .iter()
            .map(|cid| (name_of(cid), tally[cid].0))
            .collect();

        state.eliminate(loser);
        let (transfers, newly_exhausted) = state.transfer_votes(loser);

        let mut pub_transfers: Vec<(String, u64)> = Vec::new();
        for w in state.active.iter() {
            let t = transfers.get(w).cloned().unwrap_or(VoteCount::EMPTY);
            if t > VoteCount::EMPTY {
                graph.add_edge(
                    VertexKey::new(loser, round_id),
                    VertexKey::new(*w, round_id + 1),
                    t,
                );
                pub_transfers.push((name_of(w), t.0));
            }
            graph.add_edge(
                VertexKey::new(*w, round_id),
                VertexKey::new(*w, round_id + 1),
                tally[w],
            );
        }

        let elim_stats = EliminationStats {
            name: name_of(&loser),
            transfers: pub_transfers,
            exhausted: newly_exhausted.0,
        };
        log_round(round_id, &round_tally, Some(&elim_stats), None);
        stats.push(RoundStats {
            round: round_id,
            tally: round_tally,
            exhausted: exhausted.0,
            elected: None,
            eliminated: Some(elim_stats),
        });
        if let Some(c) = candidates_by_id.get(&loser) {
            eliminated.push((*c).clone());
        }
        round_id += 1;
    }

    // Only one candidate left, it is the winner by default.
    let (final_tally, exhausted) = state.compute_tally();
    let winner_id = state.active[0];
    debug!("run_tabulation: final tally: {:?}", final_tally);
    if round_id > 1 {
        check_conservation(&graph, &final_tally, round_id);
    }
    let final_count = final_tally[&winner_id];
    graph.add_vertex(winner_id, round_id, final_count);

    let winner = candidates_by_id[&winner_id].clone();
    let final_round_tally = vec![(winner.name.clone(), final_count.0)];
    log_round(round_id, &final_round_tally, None, Some(&winner.name));
    stats.push(RoundStats {
        round: round_id,
        tally: final_round_tally,
        exhausted: exhausted.0,
        elected: Some(winner.name.clone()),
        eliminated: None,
    });

    assert_eq!(
        eliminated.len() + 1,
        candidates.len(),
        "Every candidate but the winner must be eliminated"
    );

    Ok(TabulationResult {
        winner,
        eliminated,
        round_stats: stats,
        edges: graph.to_flow_edges(&names),
    })
}

// Every vertex after the first round receives exactly the votes it counts.
fn check_conservation(
    graph: &FlowGraph,
    tally: &HashMap<CandidateId, VoteCount>,
    round_id: RoundId,
) {
    for (cid, count) in tally.iter() {
        let inbound = graph.inbound_weight(*cid, round_id);
        assert_eq!(
            inbound, *count,
            "Round {}: candidate {:?} counts {:?} but receives {:?}",
            round_id, cid, count, inbound
        );
    }
}

/// Selects the candidate to eliminate: lowest tally, then lowest score, then lowest id.
fn find_loser(
    active: &[CandidateId],
    tally: &HashMap<CandidateId, VoteCount>,
    scores: &HashMap<CandidateId, u64>,
) -> CandidateId {
    let mut sorted: Vec<(VoteCount, u64, CandidateId)> = active
        .iter()
        .map(|cid| {
            (
                tally.get(cid).cloned().unwrap_or(VoteCount::EMPTY),
                scores.get(cid).cloned().unwrap_or(0),
                *cid,
            )
        })
        .collect();
    sorted.sort();
    debug!("find_loser: elimination order: {:?}", sorted);
    assert!(!sorted.is_empty(), "No candidate to eliminate");
    sorted[0].2
}

fn log_round(
    round_id: RoundId,
    tally: &[(String, u64)],
    eliminated: Option<&EliminationStats>,
    elected: Option<&String>,
) {
    info!("Round {}", round_id);
    for (name, count) in tally.iter() {
        let status = match (eliminated, elected) {
            (Some(es), _) if es.name == *name => {
                let transferred: u64 = es.transfers.iter().map(|(_, c)| c).sum();
                format!(
                    "eliminated: {} transferred, {} exhausted",
                    transferred, es.exhausted
                )
            }
            (_, Some(n)) if n == name => "elected".to_string(),
            _ => "continuing".to_string(),
        };
        info!("{:>10} {} -> {}", count, name, status);
    }
}

struct CheckResult {
    ballots: Vec<RankedBallot>,
    // In the same order as the input.
    candidates: Vec<CandidateId>,
}

fn checks(
    candidates: &[Candidate],
    ballots: &[Ballot],
) -> Result<CheckResult, TabulationErrors> {
    debug!("checks: {:?} ballots", ballots.len());
    if candidates.is_empty() {
        return Err(TabulationErrors::EmptyCandidateSet);
    }

    let mut valid_cids: HashSet<CandidateId> = HashSet::new();
    let mut ordered: Vec<CandidateId> = Vec::new();
    for c in candidates.iter() {
        if !valid_cids.insert(CandidateId(c.id)) {
            return Err(TabulationErrors::DuplicateCandidate { candidate_id: c.id });
        }
        ordered.push(CandidateId(c.id));
    }

    let mut res: Vec<RankedBallot> = Vec::with_capacity(ballots.len());
    for b in ballots.iter() {
        let mut previous_rank = 0;
        let mut choices: Vec<(CandidateId, u32)> = Vec::with_capacity(b.rankings.len());
        for r in b.rankings.iter() {
            if r.rank <= previous_rank {
                return Err(TabulationErrors::MalformedBallot {
                    vote_id: b.vote_id,
                    reason: MalformedReason::UnorderedRankings {
                        previous_rank,
                        rank: r.rank,
                    },
                });
            }
            let cid = CandidateId(r.candidate_id);
            if !valid_cids.contains(&cid) {
                return Err(TabulationErrors::MalformedBallot {
                    vote_id: b.vote_id,
                    reason: MalformedReason::UnknownCandidate(r.candidate_id),
                });
            }
            choices.push((cid, r.rank));
            previous_rank = r.rank;
        }
        res.push(RankedBallot {
            vote_id: b.vote_id,
            choices,
        });
    }

    Ok(CheckResult {
        ballots: res,
        candidates: ordered,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn ballot(vote_id: u32, ids: &[u32]) -> RankedBallot {
        RankedBallot {
            vote_id,
            choices: ids
                .iter()
                .enumerate()
                .map(|(idx, cid)| (CandidateId(*cid), (idx + 1) as u32))
                .collect(),
        }
    }

    fn electorate(ballots: Vec<RankedBallot>, num_candidates: u32) -> Electorate {
        Electorate::new(ballots, (1..=num_candidates).map(CandidateId).collect())
    }

    #[test]
    fn cursor_skips_eliminated() {
        init();
        let mut e = electorate(vec![ballot(1, &[3, 2, 1])], 3);
        e.eliminate(CandidateId(3));
        e.eliminate(CandidateId(2));
        assert_eq!(e.current_choice(0), Some(CandidateId(1)));
        assert_eq!(e.cursors[0], 2);
        // Idempotent when nothing changed.
        assert_eq!(e.current_choice(0), Some(CandidateId(1)));
        assert_eq!(e.cursors[0], 2);
    }

    #[test]
    fn tally_counts_exhausted() {
        init();
        let mut e = electorate(vec![ballot(1, &[3]), ballot(2, &[1]), ballot(3, &[])], 3);
        e.eliminate(CandidateId(3));
        let (tally, exhausted) = e.compute_tally();
        assert_eq!(tally[&CandidateId(1)], VoteCount(1));
        assert_eq!(tally[&CandidateId(2)], VoteCount::EMPTY);
        assert!(!tally.contains_key(&CandidateId(3)));
        assert_eq!(exhausted, VoteCount(2));
    }

    #[test]
    fn scores_ignore_eliminated_and_low_ranks() {
        init();
        let mut e = electorate(
            vec![
                RankedBallot {
                    vote_id: 1,
                    choices: vec![(CandidateId(1), 1), (CandidateId(2), 2), (CandidateId(3), 5)],
                },
                ballot(2, &[2, 1]),
            ],
            3,
        );
        e.eliminate(CandidateId(1));
        let scores = e.tiebreak_scores(3);
        assert_eq!(scores.get(&CandidateId(1)), None);
        // rank 2 -> 2 points, rank 1 -> 3 points
        assert_eq!(scores[&CandidateId(2)], 5);
        // rank 5 gives a negative weight, which does not count
        assert_eq!(scores[&CandidateId(3)], 0);
    }

    #[test]
    fn transfers_only_move_the_loser_ballots() {
        init();
        let mut e = electorate(
            vec![ballot(1, &[3, 1]), ballot(2, &[3]), ballot(3, &[2, 3]), ballot(4, &[3, 2])],
            3,
        );
        let _ = e.compute_tally();
        e.eliminate(CandidateId(3));
        let (transfers, exhausted) = e.transfer_votes(CandidateId(3));
        assert_eq!(transfers[&CandidateId(1)], VoteCount(1));
        assert_eq!(transfers[&CandidateId(2)], VoteCount(1));
        assert_eq!(exhausted, VoteCount(1));
        // The ballot for 2 did not move.
        assert_eq!(e.cursors[2], 0);
    }

    #[test]
    fn loser_by_tally_then_score_then_id() {
        init();
        let active = vec![CandidateId(1), CandidateId(2), CandidateId(3)];
        let tally: HashMap<CandidateId, VoteCount> = vec![
            (CandidateId(1), VoteCount(2)),
            (CandidateId(2), VoteCount(1)),
            (CandidateId(3), VoteCount(1)),
        ]
        .into_iter()
        .collect();
        let mut scores: HashMap<CandidateId, u64> = vec![
            (CandidateId(1), 0),
            (CandidateId(2), 7),
            (CandidateId(3), 4),
        ]
        .into_iter()
        .collect();
        assert_eq!(find_loser(&active, &tally, &scores), CandidateId(3));
        scores.insert(CandidateId(3), 7);
        assert_eq!(find_loser(&active, &tally, &scores), CandidateId(2));
    }

    #[test]
    fn checks_reject_bad_input() {
        init();
        let cands = vec![Candidate {
            id: 1,
            name: "A".to_string(),
        }];
        let unordered = Ballot {
            vote_id: 7,
            rankings: vec![
                Ranking {
                    candidate_id: 1,
                    rank: 2,
                },
                Ranking {
                    candidate_id: 1,
                    rank: 1,
                },
            ],
        };
        assert!(matches!(
            checks(&cands, &[unordered]),
            Err(TabulationErrors::MalformedBallot {
                vote_id: 7,
                reason: MalformedReason::UnorderedRankings {
                    previous_rank: 2,
                    rank: 1
                }
            })
        ));
        let zero_rank = Ballot {
            vote_id: 8,
            rankings: vec![Ranking {
                candidate_id: 1,
                rank: 0,
            }],
        };
        assert!(checks(&cands, &[zero_rank]).is_err());
        let doubled = vec![cands[0].clone(), cands[0].clone()];
        assert_eq!(
            checks(&doubled, &[]).err(),
            Some(TabulationErrors::DuplicateCandidate { candidate_id: 1 })
        );
    }
}
