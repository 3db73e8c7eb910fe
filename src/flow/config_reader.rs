use crate::flow::*;

use serde::{Deserialize, Serialize};
use snafu::prelude::*;
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct JsCandidate {
    pub id: u32,
    pub name: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct JsRanking {
    #[serde(rename = "candidateId")]
    pub candidate_id: u32,
    pub rank: u32,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct JsBallot {
    #[serde(rename = "voteId")]
    pub vote_id: u32,
    pub rankings: Vec<JsRanking>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ContestConfig {
    #[serde(rename = "contestName")]
    pub contest_name: String,
    pub candidates: Vec<JsCandidate>,
    pub ballots: Vec<JsBallot>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ElectionConfig {
    pub contests: Vec<ContestConfig>,
}

impl ContestConfig {
    pub fn to_contest(&self) -> Contest {
        Contest {
            name: self.contest_name.clone(),
            candidates: self
                .candidates
                .iter()
                .map(|c| Candidate {
                    id: c.id,
                    name: c.name.clone(),
                })
                .collect(),
            ballots: self
                .ballots
                .iter()
                .map(|b| Ballot {
                    vote_id: b.vote_id,
                    rankings: b
                        .rankings
                        .iter()
                        .map(|r| Ranking {
                            candidate_id: r.candidate_id,
                            rank: r.rank,
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

pub fn read_election(path: String) -> FlowResult<Vec<Contest>> {
    let contents = fs::read_to_string(path.clone()).context(OpeningJsonSnafu { path })?;
    let config: ElectionConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    debug!("read_election: {} contests", config.contests.len());
    if config.contests.is_empty() {
        whatever!("The election file does not contain any contest");
    }
    Ok(config.contests.iter().map(|c| c.to_contest()).collect())
}

pub fn read_summary(path: String) -> FlowResult<JSValue> {
    let contents = fs::read_to_string(path.clone()).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}
