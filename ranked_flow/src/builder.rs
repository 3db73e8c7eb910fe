pub use crate::config::*;

/// A builder for elections described with candidate names.
///
/// Candidates get the ids 1, 2, 3... in the order they are given, which also makes
/// the earliest registered candidate lose the final tiebreak.
///
/// ```
/// pub use ranked_flow::builder::Builder;
/// # use ranked_flow::TabulationErrors;
///
/// let mut builder = Builder::new()
///     .candidates(&["Anna".to_string(), "Bob".to_string()])?;
///
/// builder.add_ballot_simple(&["Anna".to_string(), "".to_string(), "Bob".to_string()])?;
/// builder.add_ballot_simple(&["Bob".to_string()])?;
/// builder.add_ballot_simple(&["Anna".to_string()])?;
///
/// let result = builder.tabulate()?;
/// assert_eq!(result.winner.name, "Anna");
///
/// # Ok::<(), TabulationErrors>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Builder {
    pub(crate) _candidates: Vec<Candidate>,
    pub(crate) _ballots: Vec<Ballot>,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::default()
    }

    pub fn candidates(self, names: &[String]) -> Result<Builder, TabulationErrors> {
        if names.is_empty() {
            return Err(TabulationErrors::EmptyCandidateSet);
        }
        Ok(Builder {
            _candidates: names
                .iter()
                .enumerate()
                .map(|(idx, name)| Candidate {
                    id: (idx + 1) as u32,
                    name: name.clone(),
                })
                .collect(),
            _ballots: Vec::new(),
        })
    }

    /// Adds a ballot from the list of names, most preferred first.
    ///
    /// An empty name is a skipped rank: the following choices keep their position.
    pub fn add_ballot_simple(&mut self, names: &[String]) -> Result<(), TabulationErrors> {
        let vote_id = (self._ballots.len() + 1) as u32;
        let mut rankings: Vec<Ranking> = Vec::new();
        for (idx, name) in names.iter().enumerate() {
            if name.is_empty() {
                continue;
            }
            let cand = self
                ._candidates
                .iter()
                .find(|c| c.name == *name)
                .ok_or_else(|| TabulationErrors::MalformedBallot {
                    vote_id,
                    reason: MalformedReason::UnknownName(name.clone()),
                })?;
            rankings.push(Ranking {
                candidate_id: cand.id,
                rank: (idx + 1) as u32,
            });
        }
        self.add_ballot(&Ballot { vote_id, rankings })
    }

    pub fn add_ballot(&mut self, ballot: &Ballot) -> Result<(), TabulationErrors> {
        self._ballots.push(ballot.clone());
        Ok(())
    }

    pub fn tabulate(&self) -> Result<TabulationResult, TabulationErrors> {
        crate::run_tabulation(&self._candidates, &self._ballots)
    }
}
