use crate::types::*;
use serde::Serialize;
use std::collections::HashMap;

/// Outcome of one round, computed once when the placement is locked
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundResult {
    pub target: u8,
    pub placement: u8,
    pub distance: u8,
    pub tier: TeamTier,
    /// Points earned this round, one entry per participant (zero included)
    pub points: HashMap<ParticipantId, u32>,
    pub final_clue_authors: Vec<ParticipantId>,
}

/// Everything scoring depends on. Borrowed from the room so scoring stays pure.
pub struct ScoreInput<'a> {
    pub target: u8,
    pub placement: u8,
    pub navigator_id: Option<&'a ParticipantId>,
    pub participants: &'a [ParticipantId],
    pub hints: &'a HashMap<ParticipantId, Hint>,
    pub votes: &'a HashMap<ParticipantId, Vec<HintId>>,
    pub final_clues: &'a [HintId],
}

/// Hint ids tied for the most votes. Empty when nobody voted or no hint is active.
/// Ties are kept: several final clues is a normal outcome.
pub fn compute_final_clues(
    hints: &HashMap<ParticipantId, Hint>,
    votes: &HashMap<ParticipantId, Vec<HintId>>,
) -> Vec<HintId> {
    let mut counts: HashMap<&HintId, u32> = hints
        .values()
        .filter(|h| !h.canceled)
        .map(|h| (&h.id, 0))
        .collect();

    for ballot in votes.values() {
        for hint_id in ballot {
            if let Some(count) = counts.get_mut(hint_id) {
                *count += 1;
            }
        }
    }

    let max = counts.values().copied().max().unwrap_or(0);
    if max == 0 {
        return Vec::new();
    }

    let mut finals: Vec<HintId> = counts
        .into_iter()
        .filter(|(_, count)| *count == max)
        .map(|(id, _)| id.clone())
        .collect();
    finals.sort();
    finals
}

/// Compute this round's points. Application to player scores is a separate step.
pub fn score_round(input: &ScoreInput<'_>) -> RoundResult {
    let distance = input.placement.abs_diff(input.target);
    let tier = TeamTier::from_distance(distance);

    let mut points: HashMap<ParticipantId, u32> = input
        .participants
        .iter()
        .map(|id| (id.clone(), tier.team_points()))
        .collect();

    let mut final_clue_authors: Vec<ParticipantId> = input
        .hints
        .values()
        .filter(|h| input.final_clues.contains(&h.id))
        .map(|h| h.author_id.clone())
        .collect();

    if tier != TeamTier::Off {
        if let Some(navigator) = input.navigator_id {
            *points.entry(navigator.clone()).or_insert(0) += tier.navigator_bonus();
        }

        // Decent or better from here on
        let assist = if tier == TeamTier::Bullseye { 2 } else { 1 };
        for author in &final_clue_authors {
            *points.entry(author.clone()).or_insert(0) += assist;
        }

        if tier >= TeamTier::Close {
            for (voter, ballot) in input.votes {
                if ballot.iter().any(|id| input.final_clues.contains(id)) {
                    *points.entry(voter.clone()).or_insert(0) += 1;
                }
            }
        }
    }

    final_clue_authors.sort();

    RoundResult {
        target: input.target,
        placement: input.placement,
        distance,
        tier,
        points,
        final_clue_authors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hint(id: &str, author: &str, canceled: bool) -> Hint {
        Hint {
            id: id.to_string(),
            author_id: author.to_string(),
            text: id.to_string(),
            normalized: id.to_string(),
            canceled,
            resubmitted: false,
        }
    }

    struct Fixture {
        participants: Vec<ParticipantId>,
        hints: HashMap<ParticipantId, Hint>,
        votes: HashMap<ParticipantId, Vec<HintId>>,
    }

    /// nav navigates; a and b give hints h_a / h_b; c votes h_a, a votes h_b, b votes h_a
    fn fixture() -> Fixture {
        let participants = ["nav", "a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let mut hints = HashMap::new();
        hints.insert("a".to_string(), hint("h_a", "a", false));
        hints.insert("b".to_string(), hint("h_b", "b", false));
        let mut votes = HashMap::new();
        votes.insert("c".to_string(), vec!["h_a".to_string()]);
        votes.insert("a".to_string(), vec!["h_b".to_string()]);
        votes.insert("b".to_string(), vec!["h_a".to_string()]);
        Fixture {
            participants,
            hints,
            votes,
        }
    }

    fn score(f: &Fixture, target: u8, placement: u8, finals: &[HintId]) -> RoundResult {
        let navigator = "nav".to_string();
        score_round(&ScoreInput {
            target,
            placement,
            navigator_id: Some(&navigator),
            participants: &f.participants,
            hints: &f.hints,
            votes: &f.votes,
            final_clues: finals,
        })
    }

    #[test]
    fn test_final_clues_single_winner() {
        let f = fixture();
        assert_eq!(compute_final_clues(&f.hints, &f.votes), vec!["h_a".to_string()]);
    }

    #[test]
    fn test_final_clues_keep_ties() {
        let mut f = fixture();
        f.votes.insert("c".to_string(), vec!["h_b".to_string()]);
        f.votes.insert("b".to_string(), vec!["h_a".to_string()]);
        f.votes.insert("a".to_string(), vec!["h_b".to_string()]);
        f.votes.insert("d".to_string(), vec!["h_a".to_string()]);
        assert_eq!(
            compute_final_clues(&f.hints, &f.votes),
            vec!["h_a".to_string(), "h_b".to_string()]
        );
    }

    #[test]
    fn test_final_clues_empty_without_votes() {
        let f = fixture();
        assert!(compute_final_clues(&f.hints, &HashMap::new()).is_empty());
    }

    #[test]
    fn test_final_clues_empty_without_active_hints() {
        let mut f = fixture();
        for h in f.hints.values_mut() {
            h.canceled = true;
        }
        assert!(compute_final_clues(&f.hints, &f.votes).is_empty());
    }

    #[test]
    fn test_bullseye_navigator_gets_five_without_other_bonuses() {
        let f = fixture();
        let result = score(&f, 50, 52, &[]);
        assert_eq!(result.distance, 2);
        assert_eq!(result.tier, TeamTier::Bullseye);
        assert_eq!(result.points["nav"], 5);
        assert_eq!(result.points["c"], 3);
    }

    #[test]
    fn test_bullseye_with_final_clue() {
        let f = fixture();
        let result = score(&f, 50, 50, &["h_a".to_string()]);
        // a: team 3 + assist 2 (authored h_a); a voted h_b so no insight
        assert_eq!(result.points["a"], 5);
        // b: team 3 + insight 1
        assert_eq!(result.points["b"], 4);
        // c: team 3 + insight 1
        assert_eq!(result.points["c"], 4);
        assert_eq!(result.points["nav"], 5);
        assert_eq!(result.final_clue_authors, vec!["a".to_string()]);
    }

    #[test]
    fn test_close_tier() {
        let f = fixture();
        let result = score(&f, 40, 48, &["h_a".to_string()]);
        assert_eq!(result.tier, TeamTier::Close);
        assert_eq!(result.points["nav"], 3);
        assert_eq!(result.points["a"], 3);
        assert_eq!(result.points["b"], 3);
        assert_eq!(result.points["c"], 3);
    }

    #[test]
    fn test_decent_tier_no_voter_insight() {
        let f = fixture();
        let result = score(&f, 40, 60, &["h_a".to_string()]);
        assert_eq!(result.tier, TeamTier::Decent);
        assert_eq!(result.points["nav"], 1);
        assert_eq!(result.points["a"], 2);
        assert_eq!(result.points["b"], 1);
        assert_eq!(result.points["c"], 1);
    }

    #[test]
    fn test_off_tier_gives_nothing() {
        let f = fixture();
        let result = score(&f, 50, 80, &["h_a".to_string()]);
        assert_eq!(result.distance, 30);
        assert_eq!(result.tier, TeamTier::Off);
        assert!(result.points.values().all(|p| *p == 0));
        assert_eq!(result.points.len(), 4);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let f = fixture();
        assert_eq!(score(&f, 80, 20, &[]).distance, 60);
        assert_eq!(score(&f, 20, 80, &[]).distance, 60);
    }
}
