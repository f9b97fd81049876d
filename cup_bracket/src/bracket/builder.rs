//! Single-elimination bracket construction.
//!
//! Teams are seeded in the order given (registration order), padded with byes
//! at the end up to the next power of two, and paired consecutively. Every
//! later round starts with empty slots that are filled by winner propagation.
//! Later-round matches exist only where at least one feeder exists; a match
//! with a single feeder is won by walkover as soon as its team arrives.

use super::models::{Bracket, MatchNode, MatchStatus, TeamNumber};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Courts used round-robin in the first round
pub const ROUND_ONE_COURTS: usize = 4;

/// Courts used round-robin in later rounds (before the semifinals)
pub const LATER_ROUND_COURTS: usize = 2;

/// Court for the last two rounds
pub const MAIN_COURT: &str = "Main Court";

/// Score recorded for a team advancing on a bye
pub const BYE_SCORE: u32 = 2;

/// Bracket construction settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketConfig {
    /// Start of the first round-1 match
    pub base_time: DateTime<Utc>,
}

impl BracketConfig {
    /// Create a configuration with the given round-1 start
    pub fn new(base_time: DateTime<Utc>) -> Self {
        Self { base_time }
    }

    /// 30 Aug 2025, 09:00 IST
    pub fn default_base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 30, 3, 30, 0)
            .single()
            .unwrap_or_default()
    }
}

impl Default for BracketConfig {
    fn default() -> Self {
        Self::new(Self::default_base_time())
    }
}

/// Number of leaf slots for `total_teams`, or 0 when no tree can be built
pub fn bracket_size(total_teams: usize) -> usize {
    if total_teams < 2 {
        0
    } else {
        total_teams.next_power_of_two()
    }
}

/// Build the full elimination tree for the ordered team list.
///
/// Fewer than two teams produce an empty bracket. The result depends only on
/// the input, so the same team list always yields the same tree, labels,
/// courts and schedule.
pub fn build(teams: &[TeamNumber], config: &BracketConfig) -> Bracket {
    let size = bracket_size(teams.len());
    if size == 0 {
        return Bracket::default();
    }

    let rounds = size.trailing_zeros();
    let mut nodes: Vec<MatchNode> = Vec::with_capacity(size - 1);
    let mut per_round: Vec<usize> = Vec::with_capacity(rounds as usize);

    // Round 1: consecutive slots, byes padded at the end
    let slots: Vec<Option<TeamNumber>> = teams
        .iter()
        .copied()
        .map(Some)
        .chain(std::iter::repeat(None))
        .take(size)
        .collect();

    // Arena index per pairing position of the previous round, None where no
    // match was created
    let mut previous: Vec<Option<usize>> = Vec::with_capacity(size / 2);
    let mut start_time = config.base_time;

    for (i, pair) in slots.chunks(2).enumerate() {
        let (team1, team2) = (pair[0], pair[1]);
        if team1.is_none() && team2.is_none() {
            previous.push(None);
            continue;
        }

        let mut node = empty_node(1, first_round_label(size, i + 1), start_time);
        node.court = format!("Court {}", i % ROUND_ONE_COURTS + 1);
        node.team1 = team1;
        node.team2 = team2;
        node.award_walkover();

        previous.push(Some(nodes.len()));
        nodes.push(node);
        start_time += Duration::hours(1);
    }
    per_round.push(previous.iter().flatten().count());

    // Positions 2i and 2i+1 of one round feed position i of the next. A
    // position with no feeder gets no match, and a match with a single
    // feeder is a walkover for whoever comes out of it.
    for round in 2..=rounds {
        let mut start_time = config.base_time + Duration::days(i64::from(round - 1));
        let mut current = Vec::with_capacity(previous.len() / 2);

        for (i, pair) in previous.chunks(2).enumerate() {
            let feeders: Vec<usize> = pair.iter().flatten().copied().collect();
            if feeders.is_empty() {
                current.push(None);
                continue;
            }

            let index = nodes.len();
            let mut node = empty_node(round, later_round_label(round, rounds, i + 1), start_time);
            node.court = if round + 1 >= rounds {
                MAIN_COURT.to_string()
            } else {
                format!("Court {}", i % LATER_ROUND_COURTS + 1)
            };
            nodes.push(node);

            for &feeder in &feeders {
                nodes[feeder].next = Some(index);
                if let Some(winner) = nodes[feeder].winner {
                    nodes[index].place_team(winner);
                }
            }
            if feeders.len() == 1 {
                nodes[index].award_walkover();
            }

            current.push(Some(index));
            start_time += Duration::minutes(90);
        }

        per_round.push(current.iter().flatten().count());
        previous = current;
    }

    log::debug!(
        "Built {}-slot bracket for {} teams: {}",
        size,
        teams.len(),
        per_round
            .iter()
            .enumerate()
            .map(|(r, count)| format!("round {} = {} matches", r + 1, count))
            .collect::<Vec<_>>()
            .join(", ")
    );

    Bracket {
        bracket_size: size,
        rounds,
        nodes,
    }
}

fn empty_node(round_number: u32, label: String, start_time: DateTime<Utc>) -> MatchNode {
    MatchNode {
        round_number,
        label,
        court: String::new(),
        start_time,
        team1: None,
        team2: None,
        score1: 0,
        score2: 0,
        status: MatchStatus::Upcoming,
        winner: None,
        next: None,
    }
}

fn first_round_label(bracket_size: usize, number: usize) -> String {
    match bracket_size {
        4 => format!("Semifinal {number}"),
        8 => format!("Quarterfinal {number}"),
        16 => format!("Round of 16 - Match {number}"),
        _ => format!("Round 1 - Match {number}"),
    }
}

fn later_round_label(round: u32, rounds: u32, number: usize) -> String {
    if round == rounds {
        "Final".to_string()
    } else if round + 1 == rounds {
        format!("Semifinal {number}")
    } else if round + 2 == rounds {
        format!("Quarterfinal {number}")
    } else {
        format!("Round {round} - Match {number}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn teams(n: i64) -> Vec<TeamNumber> {
        (1..=n).collect()
    }

    fn config() -> BracketConfig {
        BracketConfig::default()
    }

    #[test]
    fn test_fewer_than_two_teams_is_empty() {
        assert!(build(&[], &config()).is_empty());
        let single = build(&[1], &config());
        assert!(single.is_empty());
        assert_eq!(single.bracket_size, 0);
    }

    #[test]
    fn test_bracket_size() {
        assert_eq!(bracket_size(0), 0);
        assert_eq!(bracket_size(1), 0);
        assert_eq!(bracket_size(2), 2);
        assert_eq!(bracket_size(3), 4);
        assert_eq!(bracket_size(5), 8);
        assert_eq!(bracket_size(8), 8);
        assert_eq!(bracket_size(9), 16);
    }

    #[test]
    fn test_two_teams_single_match() {
        let bracket = build(&teams(2), &config());
        assert_eq!(bracket.len(), 1);
        assert_eq!(bracket.rounds, 1);

        let only = &bracket.nodes[0];
        assert_eq!(only.label, "Round 1 - Match 1");
        assert_eq!(only.court, "Court 1");
        assert_eq!(only.next, None);
        assert_eq!(only.status, MatchStatus::Upcoming);
        assert_eq!(only.start_time, config().base_time);
    }

    #[test]
    fn test_four_teams() {
        let bracket = build(&teams(4), &config());
        assert_eq!(bracket.len(), 3);

        let labels: Vec<_> = bracket.nodes.iter().map(|n| n.label.as_str()).collect();
        assert_eq!(labels, vec!["Semifinal 1", "Semifinal 2", "Final"]);

        let final_match = &bracket.nodes[2];
        assert_eq!(final_match.court, MAIN_COURT);
        assert_eq!(final_match.start_time, config().base_time + Duration::days(1));
        assert_eq!(bracket.nodes[0].next, Some(2));
        assert_eq!(bracket.nodes[1].next, Some(2));
        assert_eq!(bracket.final_index(), Some(2));
    }

    #[test]
    fn test_five_teams_bye_auto_advances() {
        let bracket = build(&teams(5), &config());
        assert_eq!(bracket.bracket_size, 8);
        assert_eq!(bracket.rounds, 3);

        let round_one: Vec<_> = bracket.round(1).map(|(_, n)| n).collect();
        assert_eq!(round_one.len(), 3);
        assert_eq!((round_one[0].team1, round_one[0].team2), (Some(1), Some(2)));
        assert_eq!((round_one[1].team1, round_one[1].team2), (Some(3), Some(4)));

        let bye = round_one[2];
        assert_eq!((bye.team1, bye.team2), (Some(5), None));
        assert_eq!(bye.status, MatchStatus::Finished);
        assert_eq!((bye.score1, bye.score2), (2, 0));
        assert_eq!(bye.winner, Some(5));

        let pending = round_one
            .iter()
            .filter(|n| n.status == MatchStatus::Upcoming)
            .count();
        assert_eq!(pending, 2);

        // 3 + 2 + 1
        assert_eq!(bracket.len(), 6);

        // Nobody else can reach the second semifinal, so team 5 walks over
        let semis: Vec<_> = bracket.round(2).collect();
        assert_eq!(semis[1].1.label, "Semifinal 2");
        assert_eq!(semis[1].1.team1, Some(5));
        assert_eq!(semis[1].1.team2, None);
        assert_eq!(semis[1].1.status, MatchStatus::Finished);
        assert_eq!(semis[1].1.winner, Some(5));
        assert_eq!(bye.next, Some(semis[1].0));

        let final_match = &bracket.nodes[5];
        assert_eq!(final_match.team1, Some(5));
        assert_eq!(final_match.status, MatchStatus::Upcoming);
    }

    #[test]
    fn test_nine_teams_prunes_unreachable_matches() {
        let bracket = build(&teams(9), &config());
        assert_eq!(bracket.bracket_size, 16);

        let per_round: Vec<_> = (1..=4).map(|r| bracket.round(r).count()).collect();
        assert_eq!(per_round, vec![5, 3, 2, 1]);
        assert_eq!(bracket.len(), 11);

        for (i, node) in bracket.nodes.iter().enumerate() {
            if node.round_number > 1 {
                assert!(!bracket.feeders(i).is_empty(), "{} has no feeder", node.label);
            }
        }

        // Team 9 is carried by walkover all the way to the final
        let quarter = bracket.round(2).nth(2).unwrap().1;
        assert_eq!(quarter.label, "Quarterfinal 3");
        assert_eq!(quarter.winner, Some(9));
        let semi = bracket.round(3).nth(1).unwrap().1;
        assert_eq!(semi.label, "Semifinal 2");
        assert_eq!(semi.winner, Some(9));
        assert_eq!(bracket.nodes[10].team1, Some(9));
    }

    #[test]
    fn test_six_teams_single_feeder_waits_for_winner() {
        let bracket = build(&teams(6), &config());
        assert_eq!(bracket.len(), 6);

        let (index, semi) = bracket.round(2).nth(1).unwrap();
        assert_eq!(semi.label, "Semifinal 2");
        assert_eq!(bracket.feeders(index), vec![2]);
        assert_eq!((semi.team1, semi.team2), (None, None));
        assert_eq!(semi.status, MatchStatus::Upcoming);
    }

    #[test]
    fn test_three_teams_bye_reaches_final() {
        let bracket = build(&teams(3), &config());
        assert_eq!(bracket.len(), 3);

        let final_match = &bracket.nodes[2];
        assert_eq!(final_match.label, "Final");
        assert_eq!(final_match.team1, Some(3));
        assert_eq!(final_match.team2, None);
    }

    #[test]
    fn test_round_one_labels_by_bracket_size() {
        let eight = build(&teams(8), &config());
        assert_eq!(eight.nodes[3].label, "Quarterfinal 4");

        let sixteen = build(&teams(16), &config());
        assert_eq!(sixteen.nodes[2].label, "Round of 16 - Match 3");

        let thirty_two = build(&teams(32), &config());
        assert_eq!(thirty_two.nodes[0].label, "Round 1 - Match 1");
    }

    #[test]
    fn test_later_round_labels() {
        let bracket = build(&teams(32), &config());
        let label_of = |round: u32, i: usize| bracket.round(round).nth(i).unwrap().1.label.clone();

        assert_eq!(label_of(2, 0), "Round 2 - Match 1");
        assert_eq!(label_of(3, 3), "Quarterfinal 4");
        assert_eq!(label_of(4, 1), "Semifinal 2");
        assert_eq!(label_of(5, 0), "Final");
    }

    #[test]
    fn test_court_assignment() {
        let bracket = build(&teams(16), &config());
        let round_one: Vec<_> = bracket.round(1).map(|(_, n)| n.court.as_str()).collect();
        assert_eq!(&round_one[..5], &["Court 1", "Court 2", "Court 3", "Court 4", "Court 1"]);

        let quarters: Vec<_> = bracket.round(2).map(|(_, n)| n.court.as_str()).collect();
        assert_eq!(quarters, vec!["Court 1", "Court 2", "Court 1", "Court 2"]);

        assert!(bracket.round(3).all(|(_, n)| n.court == MAIN_COURT));
        assert!(bracket.round(4).all(|(_, n)| n.court == MAIN_COURT));
    }

    #[test]
    fn test_schedule() {
        let base = config().base_time;
        let bracket = build(&teams(8), &config());

        let round_one: Vec<_> = bracket.round(1).map(|(_, n)| n.start_time).collect();
        assert_eq!(round_one[0], base);
        assert_eq!(round_one[3], base + Duration::hours(3));

        let semis: Vec<_> = bracket.round(2).map(|(_, n)| n.start_time).collect();
        assert_eq!(semis[0], base + Duration::days(1));
        assert_eq!(semis[1], base + Duration::days(1) + Duration::minutes(90));

        let final_start = bracket.round(3).next().unwrap().1.start_time;
        assert_eq!(final_start, base + Duration::days(2));
    }

    #[test]
    fn test_later_rounds_start_empty_without_byes() {
        let bracket = build(&teams(8), &config());
        assert!(
            bracket
                .nodes
                .iter()
                .filter(|n| n.round_number > 1)
                .all(|n| n.team1.is_none() && n.team2.is_none())
        );
    }

    #[test]
    fn test_seeding_follows_input_order() {
        let bracket = build(&[9, 4, 7, 1], &config());
        assert_eq!((bracket.nodes[0].team1, bracket.nodes[0].team2), (Some(9), Some(4)));
        assert_eq!((bracket.nodes[1].team1, bracket.nodes[1].team2), (Some(7), Some(1)));
    }

    #[test]
    fn test_deterministic() {
        let first = build(&teams(11), &config());
        let second = build(&teams(11), &config());
        assert_eq!(first, second);
    }

    #[test]
    fn test_feeders() {
        let bracket = build(&teams(8), &config());
        let final_index = bracket.final_index().unwrap();
        assert_eq!(bracket.feeders(final_index).len(), 2);
        assert!(bracket.feeders(0).is_empty());
    }
}
