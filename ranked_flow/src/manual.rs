/*!

This is the long-form manual for `ranked_flow` and `irvflow`.

## Tabulation rules

The election is decided by instant-runoff voting with a single winner:

1. Every ballot counts for its highest ranked candidate that is still running.
   A ballot with no such candidate is *exhausted* and does not count anymore.
2. The candidate with the fewest votes is eliminated. Ties are broken, in this order:
   - by the lowest tiebreak score. The score of a candidate is computed over the
     full rankings of all the ballots: every mention at rank `r` gives
     `number_of_candidates - r + 1` points (mentions beyond the number of candidates
     give nothing). Only candidates still running are scored.
   - by the lowest candidate id.
3. The ballots of the eliminated candidate move to their next choice still running.
4. This is repeated until a single candidate is left. It is the winner.

Candidates without any first choice still go through this process: when several of
them have no votes and no score, the one with the lowest id is eliminated first.

## Flow diagram

The result of a tabulation is a list of edges that can be given as is to a Sankey
chart component. Each vertex is a candidate in a given round, and is rendered as:

```text
{name} ({votes}){one space per round}
```

For example, `Alice (3)  ` is Alice with 3 votes in round 2. For each round there is:
- an edge from the eliminated candidate to every candidate that received some of its ballots,
- an edge from every remaining candidate to itself in the next round, carrying the
  votes it had in this round.

The votes of a vertex are always the sum of the weights of the edges that reach it.
The winner can be found back from the edges with [`winner_name`](crate::graph::winner_name):
it is the vertex of the latest round that does not have any outgoing edge.

An election with a single candidate has no rounds to show, and produces no edges.

## Input formats for `irvflow`

### `json`

```text
{
  "contests": [
    {
      "contestName": "short",
      "candidates": [{"id": 1, "name": "A"}, {"id": 2, "name": "B"}],
      "ballots": [
        {"voteId": 1, "rankings": [{"candidateId": 1, "rank": 1}, {"candidateId": 2, "rank": 2}]}
      ]
    }
  ]
}
```

The rankings of each ballot must be sorted by rank.

### `xlsx`

An Excel file with one ballot per row. The first row contains `id` and then the names
of the candidates. Each cell below a candidate holds the rank given to this candidate
by the voter, or nothing.

|    | A | B | C |
|----|---|---|---|
| 1  | 1 | 2 |   |
| 2  | 2 |   | 1 |

The contest name is given with `--contest-name`, and the worksheet with
`--excel-worksheet-name` when the file contains more than one.

*/
