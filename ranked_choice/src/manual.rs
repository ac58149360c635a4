/*!

This is the long-form manual for `ranked_choice` and `bookvote`.

## How an election is resolved

Each voter hands in one row per candidate, with either a rank (`1` is the
favourite) or no preference at all. The election then runs in rounds:

1. Every voter gives one vote to the remaining candidate with their lowest rank.
   Voters who did not rank any of the remaining candidates sit the round out.
2. A candidate with strictly more than half of the votes of the round wins.
   Exactly half is not enough.
3. Otherwise, all the candidates sharing the lowest number of votes are
   eliminated together, and the next round starts without them.
4. After 100 rounds (configurable), the election stops without a winner.

When eliminating the last candidates would eliminate everybody (all the
remaining candidates have the same number of votes), nobody is eliminated and
the tie is broken instead:

- the candidate with the lowest average rank, computed over every rank it
  received in that round, wins;
- if several candidates share the lowest average rank, a candidate is drawn
  at random. The random generator is seeded with a number derived from the
  names of the tied candidates, so the same tie always gives the same winner.
  This is a last resort, not a fairness mechanism.

## Input format

`bookvote` reads the vote sheet exported from the book club spreadsheet, either
as a CSV file (`csv`) or as an Excel workbook (`xlsx`). The first row holds the
column names. The default layout is:

| name  | vote_date  | book         | rank |
|-------|------------|--------------|------|
| anna  | 2024-03-01 | Dune         | 1    |
| anna  | 2024-03-01 | Emma         | 2    |
| bob   | 2024-03-01 | Emma         | N/A  |

An empty rank or `N/A` means that the voter did not rank this book. The names
of the columns can be changed in the configuration file.

## Configuration

```json
{
  "outputSettings": {
    "contestName": "March pick",
    "contestDate": "2024-03-01",
    "outputFile": "summary.json"
  },
  "voteSource": {
    "provider": "csv",
    "filePath": "votes.csv",
    "voteDate": "2024-03-01"
  },
  "candidates": ["Dune", "Emma"],
  "rules": {
    "maxRounds": 100,
    "malformedBallot": "reject"
  }
}
```

- `voteDate` only keeps the rows cast on that day.
- `candidates` is the display order of the books. It does not change the outcome.
- `malformedBallot` controls voters who used the same rank twice or ranked the
  same book twice: `reject` stops the count, `exclude` ignores these voters.

*/
