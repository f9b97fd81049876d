//! Bracket Example
//!
//! Builds the tree for a handful of teams, plays the first round and prints
//! how the winners move forward.
//!
//! Run with `cargo run -p cup_bracket --example print_bracket -- 6`

use cup_bracket::bracket::{BracketConfig, Match, MatchStatus, TeamNumber, build};
use cup_bracket::results::{ResultUpdate, apply_result};

fn print_matches(matches: &[Match]) {
    for m in matches {
        let slot = |team: Option<TeamNumber>| team.map_or("TBD".to_string(), |t| format!("T{t}"));
        println!(
            "  #{:<3} R{} {:<16} {:<10} {}  {} vs {}  {}-{} {:<8} -> {}",
            m.id,
            m.round_number,
            m.label,
            m.court,
            m.start_time.format("%d %b %H:%M"),
            slot(m.team1),
            slot(m.team2),
            m.score1,
            m.score2,
            m.status.as_str(),
            m.next_match.map_or("-".to_string(), |n| format!("#{n}")),
        );
    }
}

fn main() {
    let n: i64 = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(5);

    let teams: Vec<TeamNumber> = (1..=n).collect();
    let bracket = build(&teams, &BracketConfig::default());
    println!(
        "=== {} teams, bracket size {}, {} matches ===\n",
        n,
        bracket.bracket_size,
        bracket.len()
    );

    let mut matches: Vec<Match> = bracket
        .nodes
        .iter()
        .enumerate()
        .map(|(i, node)| node.to_match(i as i64 + 1, node.next.map(|next| next as i64 + 1)))
        .collect();
    print_matches(&matches);

    // Team 1 of every pending first-round match wins 25-20
    let Ok(update) = ResultUpdate::new(25, 20, MatchStatus::Finished) else {
        return;
    };
    for i in 0..matches.len() {
        if matches[i].round_number != 1 || matches[i].status == MatchStatus::Finished {
            continue;
        }
        let mut target = matches[i].clone();
        let mut next = target
            .next_match
            .and_then(|id| matches.iter().find(|m| m.id == id).cloned());
        apply_result(&mut target, &update, next.as_mut());

        if let Some(next) = next {
            let index = matches.iter().position(|m| m.id == next.id).unwrap_or(i);
            matches[index] = next;
        }
        matches[i] = target;
    }

    println!("\n=== After round 1 ===\n");
    print_matches(&matches);
}
