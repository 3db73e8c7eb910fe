// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// A registered candidate.
///
/// The identifier must be unique within one tabulation. It is also the last
/// resort tiebreaker when deciding who gets eliminated.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Candidate {
    pub id: u32,
    pub name: String,
}

/// One position on a ballot. Ranks start at 1.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub struct Ranking {
    pub candidate_id: u32,
    pub rank: u32,
}

/// A ballot: the full ordered list of preferences of one voter.
///
/// The rankings must be sorted by increasing rank. They are read in order and
/// never sorted again during the tabulation.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Ballot {
    pub vote_id: u32,
    pub rankings: Vec<Ranking>,
}

// ******** Output data structures *********

/// One edge of the vote-transfer diagram.
///
/// Labels are rendered as `"{name} ({count})"` followed by one space per round.
/// The weight is the number of votes carried by the edge, as a decimal string.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct FlowEdge {
    pub source: String,
    pub target: String,
    pub weight: String,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct EliminationStats {
    /// Name of the eliminated candidate.
    pub name: String,
    /// Votes moved to each remaining candidate, in candidate order.
    pub transfers: Vec<(String, u64)>,
    /// Votes that had no remaining choice after this elimination.
    pub exhausted: u64,
}

/// Statistics for one round
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RoundStats {
    pub round: u32,
    pub tally: Vec<(String, u64)>,
    /// Ballots that did not count for anyone in this round.
    pub exhausted: u64,
    pub elected: Option<String>,
    pub eliminated: Option<EliminationStats>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TabulationResult {
    /// The last candidate standing.
    pub winner: Candidate,
    /// Candidates in the order in which they were eliminated.
    pub eliminated: Vec<Candidate>,
    /// One entry per round, the last one with the elected candidate.
    pub round_stats: Vec<RoundStats>,
    /// The flow diagram, in emission order.
    pub edges: Vec<FlowEdge>,
}

/// The reason why a ballot was rejected.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum MalformedReason {
    /// The ballot refers to a candidate id that was not registered.
    UnknownCandidate(u32),
    /// The ballot refers to a candidate name that was not registered (builder API only).
    UnknownName(String),
    /// The ranks are not strictly increasing, or a rank is zero.
    UnorderedRankings {
        /// Rank of the preceding entry of the ballot (0 for the first entry).
        previous_rank: u32,
        /// The offending rank.
        rank: u32,
    },
}

/// Errors that prevent the algorithm from completing successfully.
///
/// All of them are detected before the first round: no partial result is ever returned.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum TabulationErrors {
    EmptyCandidateSet,
    DuplicateCandidate { candidate_id: u32 },
    MalformedBallot { vote_id: u32, reason: MalformedReason },
}

impl Error for TabulationErrors {}

impl Display for TabulationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TabulationErrors::EmptyCandidateSet => {
                write!(f, "cannot tabulate an election without candidates")
            }
            TabulationErrors::DuplicateCandidate { candidate_id } => {
                write!(f, "candidate id {} is registered more than once", candidate_id)
            }
            TabulationErrors::MalformedBallot { vote_id, reason } => match reason {
                MalformedReason::UnknownCandidate(cid) => {
                    write!(f, "ballot {}: unknown candidate id {}", vote_id, cid)
                }
                MalformedReason::UnknownName(name) => {
                    write!(f, "ballot {}: unknown candidate {:?}", vote_id, name)
                }
                MalformedReason::UnorderedRankings {
                    previous_rank,
                    rank,
                } => write!(
                    f,
                    "ballot {}: rank {} follows rank {}, rankings must be strictly increasing from 1",
                    vote_id, rank, previous_rank
                ),
            },
        }
    }
}
