use std::path::Path;

use ranked_flow::Ranking;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Orders the (candidate id, rank) pairs of a ballot by rank.
///
/// Equal ranks are kept in column order and left for the tabulator to reject.
pub fn assemble_rankings(ranks: &[(u32, u32)]) -> Vec<Ranking> {
    let mut sorted: Vec<(u32, u32)> = ranks.to_vec();
    sorted.sort_by_key(|(_, rank)| *rank);
    sorted
        .iter()
        .map(|(candidate_id, rank)| Ranking {
            candidate_id: *candidate_id,
            rank: *rank,
        })
        .collect()
}
