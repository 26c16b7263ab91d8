use super::score::{compute_final_clues, score_round, RoundResult, ScoreInput};
use crate::config::GameConfig;
use crate::content::ContentFilter;
use crate::error::RoomError;
use crate::normalize::{find_banned, normalize};
use crate::spectrum;
use crate::types::*;
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{HashMap, HashSet, VecDeque};
use tokio::task::AbortHandle;

/// The single pending phase timer of a room.
///
/// Every arm or cancel bumps the epoch; a timer task only acts if the epoch it
/// was spawned with is still current when it fires.
#[derive(Debug, Default)]
pub struct PhaseTimer {
    epoch: u64,
    deadline: Option<DateTime<Utc>>,
    handle: Option<AbortHandle>,
}

impl PhaseTimer {
    /// Abort the pending timer (if any) and return the epoch for the next one
    pub fn cancel(&mut self) -> u64 {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        self.deadline = None;
        self.epoch += 1;
        self.epoch
    }

    pub fn set(&mut self, deadline: DateTime<Utc>, handle: AbortHandle) {
        self.deadline = Some(deadline);
        self.handle = Some(handle);
    }

    /// Forget the handle of the timer that is firing right now
    pub fn fired(&mut self) {
        self.handle = None;
        self.deadline = None;
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    pub fn is_armed(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for PhaseTimer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Authoritative state of one game
#[derive(Debug)]
pub struct Room {
    pub code: RoomCode,
    pub host_id: ParticipantId,
    pub host_token: ReconnectToken,
    pub phase: RoomPhase,
    pub round: u32,
    pub max_rounds: u32,
    pub win_score: u32,
    pub navigator_id: Option<ParticipantId>,
    pub spectrum: Option<Spectrum>,
    pub target: u8,
    pub placement: Option<u8>,
    pub kids_mode: bool,
    pub streamer_mode: bool,
    pub duplicate_mode: DuplicateMode,
    pub pack: String,
    /// Join order; navigator rotation follows it
    pub players: Vec<Player>,
    /// Keyed by author
    pub hints: HashMap<ParticipantId, Hint>,
    /// Keyed by voter
    pub votes: HashMap<ParticipantId, Vec<HintId>>,
    /// Shuffled order in which active hints are shown on the ballot
    pub vote_order: Vec<HintId>,
    pub final_clues: Vec<HintId>,
    pub last_result: Option<RoundResult>,
    pub recent_spectrums: VecDeque<SpectrumId>,
    pub timer: PhaseTimer,
    tokens: HashMap<ReconnectToken, ParticipantId>,
    max_hint_chars: usize,
}

impl Room {
    pub fn new(code: RoomCode, host_id: ParticipantId, config: &GameConfig) -> Self {
        let host_token = ulid::Ulid::new().to_string();
        let mut tokens = HashMap::new();
        tokens.insert(host_token.clone(), host_id.clone());

        Self {
            code,
            host_id,
            host_token,
            phase: RoomPhase::Lobby,
            round: 0,
            max_rounds: config.max_rounds,
            win_score: config.win_score,
            navigator_id: None,
            spectrum: None,
            target: 0,
            placement: None,
            kids_mode: false,
            streamer_mode: false,
            duplicate_mode: config.duplicate_mode,
            pack: spectrum::DEFAULT_PACK.to_string(),
            players: Vec::new(),
            hints: HashMap::new(),
            votes: HashMap::new(),
            vote_order: Vec::new(),
            final_clues: Vec::new(),
            last_result: None,
            recent_spectrums: VecDeque::new(),
            timer: PhaseTimer::default(),
            tokens,
            max_hint_chars: config.max_hint_chars,
        }
    }

    // ========== Membership ==========

    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    fn player_mut(&mut self, id: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn participant_ids(&self) -> Vec<ParticipantId> {
        self.players.iter().map(|p| p.id.clone()).collect()
    }

    /// Everyone who receives room broadcasts: participants plus the host when
    /// the host is only watching.
    pub fn recipients(&self) -> Vec<ParticipantId> {
        let mut ids = self.participant_ids();
        if self.player(&self.host_id).is_none() {
            ids.push(self.host_id.clone());
        }
        ids
    }

    pub fn is_host(&self, id: &str) -> bool {
        self.host_id == id
    }

    pub fn is_navigator(&self, id: &str) -> bool {
        self.navigator_id.as_deref() == Some(id)
    }

    pub fn ensure_host(&self, id: &str, action: &'static str) -> Result<(), RoomError> {
        if self.is_host(id) {
            Ok(())
        } else {
            Err(RoomError::NotHost(action))
        }
    }

    pub fn role_of(&self, id: &str) -> Role {
        if self.is_navigator(id) {
            Role::Navigator
        } else if self.player(id).is_some() {
            Role::Cluer
        } else if self.is_host(id) {
            Role::Host
        } else {
            Role::Observer
        }
    }

    /// Add a participant and mint their reconnect token.
    /// Joining again from the same identity returns the existing token.
    pub fn add_player(
        &mut self,
        id: &ParticipantId,
        name: &str,
        avatar: &str,
        filter: &dyn ContentFilter,
    ) -> Result<ReconnectToken, RoomError> {
        if let Some(existing) = self.player_mut(id) {
            existing.connected = true;
            return Ok(existing.reconnect_token.clone());
        }
        if self.players.len() >= MAX_PLAYERS {
            return Err(RoomError::RoomFull);
        }

        let token = ulid::Ulid::new().to_string();
        self.tokens.insert(token.clone(), id.clone());
        self.players.push(Player {
            id: id.clone(),
            name: clean_name(name, filter),
            avatar: avatar.trim().chars().take(8).collect(),
            score: 0,
            is_host: *id == self.host_id,
            is_muted: false,
            connected: true,
            reconnect_token: token.clone(),
        });

        Ok(token)
    }

    /// Remove a participant between rounds and revoke their token
    pub fn remove_player(&mut self, id: &str) -> Result<Player, RoomError> {
        if !matches!(self.phase, RoomPhase::Lobby | RoomPhase::GameOver) {
            return Err(RoomError::InvalidPhase(self.phase));
        }
        if self.is_host(id) {
            return Err(RoomError::CannotKickHost);
        }
        let index = self
            .players
            .iter()
            .position(|p| p.id == id)
            .ok_or(RoomError::PlayerNotFound)?;

        let player = self.players.remove(index);
        self.tokens.remove(&player.reconnect_token);
        if self.is_navigator(id) {
            // Keep the rotation position: the next player now sits at `index`
            self.navigator_id = match index {
                0 => None,
                i => self.players.get(i - 1).map(|p| p.id.clone()),
            };
        }
        Ok(player)
    }

    /// Flip a player's muted flag. Muting during HINT discards their pending hint.
    pub fn toggle_mute(&mut self, id: &str) -> Result<bool, RoomError> {
        if self.is_host(id) {
            return Err(RoomError::CannotMuteHost);
        }
        let phase = self.phase;
        let player = self.player_mut(id).ok_or(RoomError::PlayerNotFound)?;
        player.is_muted = !player.is_muted;
        let muted = player.is_muted;
        if muted && phase == RoomPhase::Hint {
            self.hints.remove(id);
        }
        Ok(muted)
    }

    /// Resolve a reconnect token minted by this room and mark its owner connected
    pub fn reconnect(&mut self, token: &str) -> Option<ParticipantId> {
        let id = self.tokens.get(token)?.clone();
        if let Some(player) = self.player_mut(&id) {
            player.connected = true;
        }
        Some(id)
    }

    /// Returns false if `id` is not a participant
    pub fn set_connected(&mut self, id: &str, connected: bool) -> bool {
        match self.player_mut(id) {
            Some(player) => {
                player.connected = connected;
                true
            }
            None => false,
        }
    }

    // ========== Settings ==========

    pub fn set_pack(&mut self, pack: &str) -> Result<(), RoomError> {
        if !spectrum::is_known_pack(pack) {
            return Err(RoomError::UnknownPack(pack.to_string()));
        }
        self.pack = pack.to_string();
        Ok(())
    }

    pub fn toggle_kids_mode(&mut self) -> bool {
        self.kids_mode = !self.kids_mode;
        self.kids_mode
    }

    pub fn toggle_streamer_mode(&mut self) -> bool {
        self.streamer_mode = !self.streamer_mode;
        self.streamer_mode
    }

    // ========== Round lifecycle ==========

    /// LOBBY -> ROUND_START
    pub fn start_round<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), RoomError> {
        if self.phase != RoomPhase::Lobby {
            return Err(RoomError::InvalidPhase(self.phase));
        }
        let have = self.players.len();
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&have) {
            return Err(RoomError::NotEnoughPlayers {
                min: MIN_PLAYERS,
                have,
            });
        }

        self.round += 1;
        self.hints.clear();
        self.votes.clear();
        self.vote_order.clear();
        self.final_clues.clear();
        self.placement = None;
        self.last_result = None;
        self.navigator_id = Some(self.next_navigator());

        let picked = spectrum::pick_spectrum(&self.pack, &self.recent_spectrums, rng);
        spectrum::remember(
            &mut self.recent_spectrums,
            picked.id.clone(),
            RECENT_SPECTRUM_HISTORY,
        );
        self.spectrum = Some(picked);
        self.target = rng.random_range(0..=TARGET_MAX);
        self.phase = RoomPhase::RoundStart;
        Ok(())
    }

    fn next_navigator(&self) -> ParticipantId {
        let current = self
            .navigator_id
            .as_ref()
            .and_then(|id| self.players.iter().position(|p| &p.id == id));
        let next = match current {
            Some(pos) => (pos + 1) % self.players.len(),
            None => 0,
        };
        self.players[next].id.clone()
    }

    /// ROUND_START -> HINT. False when called from any other phase.
    pub fn open_hints(&mut self) -> bool {
        if self.phase != RoomPhase::RoundStart {
            return false;
        }
        self.phase = RoomPhase::Hint;
        true
    }

    /// HINT -> VOTE. Returns the hints canceled as duplicates, or None from any other phase.
    pub fn close_hints<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Vec<Hint>> {
        if self.phase != RoomPhase::Hint {
            return None;
        }
        let canceled = match self.duplicate_mode {
            DuplicateMode::Cancel => self.cancel_duplicates(),
            DuplicateMode::Allow => Vec::new(),
        };

        let mut order: Vec<HintId> = self.active_hints().map(|h| h.id.clone()).collect();
        order.shuffle(rng);
        self.vote_order = order;
        self.phase = RoomPhase::Vote;
        Some(canceled)
    }

    /// VOTE -> PLACE. Returns the final clues, or None from any other phase.
    pub fn close_votes(&mut self) -> Option<Vec<HintId>> {
        if self.phase != RoomPhase::Vote {
            return None;
        }
        self.final_clues = compute_final_clues(&self.hints, &self.votes);
        self.phase = RoomPhase::Place;
        Some(self.final_clues.clone())
    }

    /// PLACE -> REVEAL. Scores the round and applies the points in one pass.
    pub fn reveal(&mut self) -> Option<RoundResult> {
        if self.phase != RoomPhase::Place {
            return None;
        }
        let placement = self.placement.unwrap_or(DEFAULT_PLACEMENT);
        self.placement = Some(placement);

        let participants = self.participant_ids();
        let result = score_round(&ScoreInput {
            target: self.target,
            placement,
            navigator_id: self.navigator_id.as_ref(),
            participants: &participants,
            hints: &self.hints,
            votes: &self.votes,
            final_clues: &self.final_clues,
        });

        for player in &mut self.players {
            player.score += result.points.get(&player.id).copied().unwrap_or(0);
        }

        self.phase = RoomPhase::Reveal;
        self.last_result = Some(result.clone());
        Some(result)
    }

    /// REVEAL -> LOBBY or GAME_OVER. Returns the new phase, or None from any other phase.
    pub fn finish_round(&mut self) -> Option<RoomPhase> {
        if self.phase != RoomPhase::Reveal {
            return None;
        }
        self.phase = if self.is_game_won() {
            RoomPhase::GameOver
        } else {
            RoomPhase::Lobby
        };
        Some(self.phase)
    }

    pub fn is_game_won(&self) -> bool {
        self.players.iter().any(|p| p.score >= self.win_score) || self.round >= self.max_rounds
    }

    /// Players by score, highest first; ties keep join order
    pub fn leaderboard(&self) -> Vec<&Player> {
        let mut ranked: Vec<&Player> = self.players.iter().collect();
        ranked.sort_by(|a, b| b.score.cmp(&a.score));
        ranked
    }

    // ========== Hints ==========

    pub fn submit_hint(
        &mut self,
        author: &ParticipantId,
        text: &str,
        filter: &dyn ContentFilter,
    ) -> Result<Hint, RoomError> {
        if self.phase != RoomPhase::Hint {
            return Err(RoomError::InvalidPhase(self.phase));
        }
        let player = self.player(author).ok_or(RoomError::PlayerNotFound)?;
        if self.is_navigator(author) {
            return Err(RoomError::NavigatorNotAllowed);
        }
        if player.is_muted {
            return Err(RoomError::Muted);
        }

        let text = text.trim();
        if text.chars().count() > self.max_hint_chars {
            return Err(RoomError::TextTooLong {
                max: self.max_hint_chars,
            });
        }
        if filter.is_profane(text) {
            return Err(RoomError::Profane);
        }
        let normalized = normalize(text);
        if normalized.is_empty() {
            return Err(RoomError::EmptyText);
        }
        if let Some(word) = self
            .spectrum
            .as_ref()
            .and_then(|s| find_banned(&normalized, &s.banned))
        {
            return Err(RoomError::BannedWord(word.to_string()));
        }

        let previous = self.hints.get(author);
        if previous.is_some_and(|h| h.resubmitted) {
            return Err(RoomError::AlreadyResubmitted);
        }
        let resubmitted = previous.is_some_and(|h| h.canceled);

        let hint = Hint {
            id: ulid::Ulid::new().to_string(),
            author_id: author.clone(),
            text: text.to_string(),
            normalized,
            canceled: false,
            resubmitted,
        };
        self.hints.insert(author.clone(), hint.clone());
        Ok(hint)
    }

    /// Cancel every active hint sharing its normalized text with another one.
    /// Resubmitted hints are never canceled again.
    pub fn cancel_duplicates(&mut self) -> Vec<Hint> {
        let mut groups: HashMap<String, Vec<ParticipantId>> = HashMap::new();
        for hint in self.hints.values().filter(|h| !h.canceled) {
            groups
                .entry(hint.normalized.clone())
                .or_default()
                .push(hint.author_id.clone());
        }

        let mut canceled = Vec::new();
        for authors in groups.into_values().filter(|a| a.len() > 1) {
            for author in authors {
                if let Some(hint) = self.hints.get_mut(&author) {
                    if !hint.resubmitted {
                        hint.canceled = true;
                        canceled.push(hint.clone());
                    }
                }
            }
        }
        canceled.sort_by(|a, b| a.author_id.cmp(&b.author_id));
        canceled
    }

    pub fn active_hints(&self) -> impl Iterator<Item = &Hint> {
        self.hints.values().filter(|h| !h.canceled)
    }

    pub fn hint_by_id(&self, id: &str) -> Option<&Hint> {
        self.hints.values().find(|h| h.id == id)
    }

    /// Active hints in ballot order
    pub fn ballot(&self) -> Vec<&Hint> {
        self.vote_order
            .iter()
            .filter_map(|id| self.hint_by_id(id))
            .filter(|h| !h.canceled)
            .collect()
    }

    fn cluer_count(&self) -> usize {
        let navigators = self
            .navigator_id
            .as_deref()
            .map_or(0, |id| usize::from(self.player(id).is_some()));
        self.players.len() - navigators
    }

    /// (active hints, cluers allowed to give one)
    pub fn hint_status(&self) -> (usize, usize) {
        let muted = self
            .players
            .iter()
            .filter(|p| p.is_muted && !self.is_navigator(&p.id))
            .count();
        (self.active_hints().count(), self.cluer_count() - muted)
    }

    // ========== Votes ==========

    pub fn submit_vote(
        &mut self,
        voter: &ParticipantId,
        hint_ids: Vec<HintId>,
    ) -> Result<(), RoomError> {
        if self.phase != RoomPhase::Vote {
            return Err(RoomError::InvalidPhase(self.phase));
        }
        if self.player(voter).is_none() {
            return Err(RoomError::PlayerNotFound);
        }
        if self.is_navigator(voter) {
            return Err(RoomError::NavigatorNotAllowed);
        }
        if hint_ids.is_empty() {
            return Err(RoomError::EmptyBallot);
        }
        if hint_ids.len() > MAX_VOTES {
            return Err(RoomError::TooManyVotes { max: MAX_VOTES });
        }

        let own_hint = self.hints.get(voter).map(|h| &h.id);
        if hint_ids
            .iter()
            .any(|id| id == voter || Some(id) == own_hint)
        {
            return Err(RoomError::SelfVote);
        }
        if hint_ids.iter().collect::<HashSet<_>>().len() != hint_ids.len() {
            return Err(RoomError::DuplicateVote);
        }
        if let Some(unknown) = hint_ids
            .iter()
            .find(|id| !self.active_hints().any(|h| &h.id == *id))
        {
            return Err(RoomError::InvalidHint(unknown.clone()));
        }

        self.votes.insert(voter.clone(), hint_ids);
        Ok(())
    }

    /// (ballots cast, cluers)
    pub fn vote_status(&self) -> (usize, usize) {
        (self.votes.len(), self.cluer_count())
    }

    // ========== Placement ==========

    pub fn set_placement(&mut self, caller: &str, value: f64) -> Result<u8, RoomError> {
        self.ensure_can_place(caller)?;
        if !value.is_finite() || !(0.0..=f64::from(TARGET_MAX)).contains(&value) {
            return Err(RoomError::OutOfRange);
        }
        let placement = value.round() as u8;
        self.placement = Some(placement);
        Ok(placement)
    }

    pub fn ensure_can_place(&self, caller: &str) -> Result<(), RoomError> {
        if self.phase != RoomPhase::Place {
            return Err(RoomError::InvalidPhase(self.phase));
        }
        if !self.is_navigator(caller) {
            return Err(RoomError::NotNavigator);
        }
        Ok(())
    }
}

fn clean_name(name: &str, filter: &dyn ContentFilter) -> String {
    let cleaned: String = filter
        .clean(name.trim())
        .trim()
        .chars()
        .take(MAX_NAME_CHARS)
        .collect();
    if cleaned.is_empty() {
        "Player".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::WordListFilter;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn filter() -> WordListFilter {
        WordListFilter::new(["darn"])
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    /// Room hosted by "host" (not playing) with `n` players p0..pn
    fn room_with(n: usize) -> Room {
        let mut room = Room::new("ABC123".to_string(), "host".to_string(), &GameConfig::default());
        for i in 0..n {
            room.add_player(&format!("p{}", i), &format!("Player {}", i), "🐶", &filter())
                .unwrap();
        }
        room
    }

    /// Room in HINT with p0 navigating and a spectrum without banned words
    fn hint_room(n: usize) -> Room {
        let mut room = room_with(n);
        room.start_round(&mut rng()).unwrap();
        room.spectrum = Some(Spectrum {
            id: "test".to_string(),
            left: "Cold".to_string(),
            right: "Hot".to_string(),
            banned: vec!["lava".to_string()],
        });
        assert!(room.open_hints());
        room
    }

    fn id(s: &str) -> ParticipantId {
        s.to_string()
    }

    #[test]
    fn test_new_room_in_lobby() {
        let room = room_with(0);
        assert_eq!(room.phase, RoomPhase::Lobby);
        assert_eq!(room.round, 0);
        assert!(room.is_host("host"));
        assert_eq!(room.recipients(), vec![id("host")]);
    }

    #[test]
    fn test_join_cleans_name_and_mints_token() {
        let mut room = room_with(0);
        let token = room
            .add_player(&id("a"), "  darn Alice  ", "🐱", &filter())
            .unwrap();
        let player = room.player("a").unwrap();
        assert_eq!(player.name, "**** Alice");
        assert_eq!(player.reconnect_token, token);
        assert!(!player.is_host);
        assert!(player.connected);
    }

    #[test]
    fn test_join_truncates_and_defaults_name() {
        let mut room = room_with(0);
        room.add_player(&id("a"), "   ", "🐱", &filter()).unwrap();
        room.add_player(&id("b"), &"x".repeat(50), "🐱", &filter()).unwrap();
        assert_eq!(room.player("a").unwrap().name, "Player");
        assert_eq!(room.player("b").unwrap().name.chars().count(), MAX_NAME_CHARS);
    }

    #[test]
    fn test_host_joining_is_flagged() {
        let mut room = room_with(0);
        room.add_player(&id("host"), "TV", "📺", &filter()).unwrap();
        assert!(room.player("host").unwrap().is_host);
        assert_eq!(room.recipients(), vec![id("host")]);
        assert_eq!(room.players.iter().filter(|p| p.is_host).count(), 1);
    }

    #[test]
    fn test_rejoin_returns_same_token() {
        let mut room = room_with(1);
        let first = room.player("p0").unwrap().reconnect_token.clone();
        let again = room.add_player(&id("p0"), "Other", "🐱", &filter()).unwrap();
        assert_eq!(first, again);
        assert_eq!(room.players.len(), 1);
    }

    #[test]
    fn test_room_full() {
        let mut room = room_with(MAX_PLAYERS);
        let result = room.add_player(&id("extra"), "Late", "🐱", &filter());
        assert_eq!(result, Err(RoomError::RoomFull));
        assert_eq!(room.players.len(), MAX_PLAYERS);
    }

    #[test]
    fn test_start_round_needs_three_players() {
        let mut room = room_with(2);
        let result = room.start_round(&mut rng());
        assert_eq!(result, Err(RoomError::NotEnoughPlayers { min: 3, have: 2 }));
        assert_eq!(result.unwrap_err().kind(), crate::error::ErrorKind::Capacity);
        assert_eq!(room.phase, RoomPhase::Lobby);
        assert_eq!(room.round, 0);
    }

    #[test]
    fn test_start_round_at_bounds() {
        let mut three = room_with(3);
        assert!(three.start_round(&mut rng()).is_ok());
        let mut twelve = room_with(12);
        assert!(twelve.start_round(&mut rng()).is_ok());
    }

    #[test]
    fn test_start_round_sets_up_round() {
        let mut room = room_with(3);
        room.start_round(&mut rng()).unwrap();
        assert_eq!(room.phase, RoomPhase::RoundStart);
        assert_eq!(room.round, 1);
        assert_eq!(room.navigator_id.as_deref(), Some("p0"));
        assert!(room.spectrum.is_some());
        assert!(room.target <= 100);
        assert_eq!(room.recent_spectrums.len(), 1);
    }

    #[test]
    fn test_start_round_only_from_lobby() {
        let mut room = room_with(3);
        room.start_round(&mut rng()).unwrap();
        assert_eq!(
            room.start_round(&mut rng()),
            Err(RoomError::InvalidPhase(RoomPhase::RoundStart))
        );
        room.phase = RoomPhase::GameOver;
        assert_eq!(
            room.start_round(&mut rng()),
            Err(RoomError::InvalidPhase(RoomPhase::GameOver))
        );
    }

    #[test]
    fn test_navigator_rotates_and_wraps() {
        let mut room = room_with(3);
        let mut seen = Vec::new();
        for _ in 0..4 {
            room.start_round(&mut rng()).unwrap();
            seen.push(room.navigator_id.clone().unwrap());
            room.phase = RoomPhase::Lobby;
        }
        assert_eq!(seen, vec![id("p0"), id("p1"), id("p2"), id("p0")]);
    }

    #[test]
    fn test_recent_spectrums_are_not_repeated() {
        let mut room = room_with(3);
        let mut ids = Vec::new();
        for _ in 0..5 {
            room.start_round(&mut rng()).unwrap();
            ids.push(room.spectrum.clone().unwrap().id);
            room.phase = RoomPhase::Lobby;
        }
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), 5);
        assert_eq!(room.recent_spectrums.len(), RECENT_SPECTRUM_HISTORY);
    }

    #[test]
    fn test_transitions_are_noops_from_wrong_phase() {
        let mut room = room_with(3);
        assert!(!room.open_hints());
        assert!(room.close_hints(&mut rng()).is_none());
        assert!(room.close_votes().is_none());
        assert!(room.reveal().is_none());
        assert!(room.finish_round().is_none());
        assert_eq!(room.phase, RoomPhase::Lobby);
    }

    #[test]
    fn test_submit_hint_accepts_cluer() {
        let mut room = hint_room(3);
        let hint = room.submit_hint(&id("p1"), "  ice cube ", &filter()).unwrap();
        assert_eq!(hint.text, "ice cube");
        assert_eq!(hint.normalized, "ice cube");
        assert!(!hint.resubmitted);
        assert_eq!(room.hint_status(), (1, 2));
    }

    #[test]
    fn test_submit_hint_rejections() {
        let mut room = hint_room(3);
        assert_eq!(
            room.submit_hint(&id("p0"), "ice", &filter()),
            Err(RoomError::NavigatorNotAllowed)
        );
        assert_eq!(
            room.submit_hint(&id("p1"), "darn it", &filter()),
            Err(RoomError::Profane)
        );
        assert_eq!(
            room.submit_hint(&id("p1"), "LAVA!!", &filter()),
            Err(RoomError::BannedWord("lava".to_string()))
        );
        assert_eq!(
            room.submit_hint(&id("p1"), "?!", &filter()),
            Err(RoomError::EmptyText)
        );
        assert_eq!(
            room.submit_hint(&id("p1"), &"a".repeat(61), &filter()),
            Err(RoomError::TextTooLong { max: 60 })
        );
        assert_eq!(
            room.submit_hint(&id("ghost"), "ice", &filter()),
            Err(RoomError::PlayerNotFound)
        );
        assert!(room.hints.is_empty());
    }

    #[test]
    fn test_submit_hint_outside_hint_phase() {
        let mut room = room_with(3);
        assert_eq!(
            room.submit_hint(&id("p1"), "ice", &filter()),
            Err(RoomError::InvalidPhase(RoomPhase::Lobby))
        );
    }

    #[test]
    fn test_overwrite_active_hint() {
        let mut room = hint_room(3);
        room.submit_hint(&id("p1"), "ice", &filter()).unwrap();
        let second = room.submit_hint(&id("p1"), "snow", &filter()).unwrap();
        assert!(!second.resubmitted);
        assert_eq!(room.hints[&id("p1")].text, "snow");
    }

    #[test]
    fn test_duplicate_cancellation_and_single_resubmission() {
        let mut room = hint_room(4);
        room.submit_hint(&id("p1"), "red", &filter()).unwrap();
        room.submit_hint(&id("p2"), "Red!", &filter()).unwrap();
        room.submit_hint(&id("p3"), "blue", &filter()).unwrap();

        let canceled = room.cancel_duplicates();
        let authors: Vec<_> = canceled.iter().map(|h| h.author_id.as_str()).collect();
        assert_eq!(authors, vec!["p1", "p2"]);
        assert!(room.hints[&id("p1")].canceled);
        assert!(room.hints[&id("p2")].canceled);
        assert!(!room.hints[&id("p3")].canceled);

        let replacement = room.submit_hint(&id("p1"), "crimson", &filter()).unwrap();
        assert!(replacement.resubmitted);
        assert!(!replacement.canceled);

        assert_eq!(
            room.submit_hint(&id("p1"), "scarlet", &filter()),
            Err(RoomError::AlreadyResubmitted)
        );
        assert_eq!(room.hints[&id("p1")].text, "crimson");
    }

    #[test]
    fn test_resubmitted_hints_are_never_canceled_again() {
        let mut room = hint_room(4);
        room.submit_hint(&id("p1"), "red", &filter()).unwrap();
        room.submit_hint(&id("p2"), "red", &filter()).unwrap();
        room.cancel_duplicates();
        room.submit_hint(&id("p1"), "blue", &filter()).unwrap();
        room.submit_hint(&id("p3"), "Blue", &filter()).unwrap();

        let canceled = room.cancel_duplicates();
        assert_eq!(canceled.len(), 1);
        assert_eq!(canceled[0].author_id, "p3");
        assert!(!room.hints[&id("p1")].canceled);
    }

    #[test]
    fn test_close_hints_cancels_and_builds_ballot() {
        let mut room = hint_room(4);
        room.submit_hint(&id("p1"), "red", &filter()).unwrap();
        room.submit_hint(&id("p2"), "RED", &filter()).unwrap();
        room.submit_hint(&id("p3"), "blue", &filter()).unwrap();

        let canceled = room.close_hints(&mut rng()).unwrap();
        assert_eq!(canceled.len(), 2);
        assert_eq!(room.phase, RoomPhase::Vote);
        let ballot: Vec<_> = room.ballot().iter().map(|h| h.text.clone()).collect();
        assert_eq!(ballot, vec!["blue".to_string()]);

        // Window closed: no more hints
        assert_eq!(
            room.submit_hint(&id("p1"), "crimson", &filter()),
            Err(RoomError::InvalidPhase(RoomPhase::Vote))
        );
    }

    #[test]
    fn test_close_hints_allow_mode_keeps_duplicates() {
        let mut room = hint_room(3);
        room.duplicate_mode = DuplicateMode::Allow;
        room.submit_hint(&id("p1"), "red", &filter()).unwrap();
        room.submit_hint(&id("p2"), "red", &filter()).unwrap();
        assert!(room.close_hints(&mut rng()).unwrap().is_empty());
        assert_eq!(room.ballot().len(), 2);
    }

    fn vote_room() -> (Room, HintId, HintId) {
        let mut room = hint_room(4);
        let h1 = room.submit_hint(&id("p1"), "ice", &filter()).unwrap().id;
        let h2 = room.submit_hint(&id("p2"), "snow", &filter()).unwrap().id;
        room.close_hints(&mut rng()).unwrap();
        (room, h1, h2)
    }

    #[test]
    fn test_vote_accepts_up_to_two() {
        let (mut room, h1, h2) = vote_room();
        assert!(room.submit_vote(&id("p3"), vec![h1.clone(), h2.clone()]).is_ok());
        assert!(room.submit_vote(&id("p1"), vec![h2.clone()]).is_ok());
        // Resubmission overwrites
        assert!(room.submit_vote(&id("p3"), vec![h1.clone()]).is_ok());
        assert_eq!(room.votes[&id("p3")], vec![h1]);
        assert_eq!(room.vote_status(), (2, 3));
    }

    #[test]
    fn test_vote_rejections() {
        let (mut room, h1, h2) = vote_room();
        assert_eq!(
            room.submit_vote(&id("p0"), vec![h1.clone()]),
            Err(RoomError::NavigatorNotAllowed)
        );
        assert_eq!(
            room.submit_vote(&id("p3"), vec![h1.clone(), h2.clone(), h1.clone()]),
            Err(RoomError::TooManyVotes { max: 2 })
        );
        assert_eq!(
            room.submit_vote(&id("p1"), vec![id("p1")]),
            Err(RoomError::SelfVote)
        );
        assert_eq!(
            room.submit_vote(&id("p1"), vec![h1.clone()]),
            Err(RoomError::SelfVote)
        );
        assert_eq!(
            room.submit_vote(&id("p3"), vec![h1.clone(), h1.clone()]),
            Err(RoomError::DuplicateVote)
        );
        assert_eq!(
            room.submit_vote(&id("p3"), vec!["nope".to_string()]),
            Err(RoomError::InvalidHint("nope".to_string()))
        );
        assert_eq!(room.submit_vote(&id("p3"), vec![]), Err(RoomError::EmptyBallot));
        assert!(room.votes.is_empty());
    }

    #[test]
    fn test_vote_rejects_canceled_hint() {
        let mut room = hint_room(4);
        let h1 = room.submit_hint(&id("p1"), "red", &filter()).unwrap().id;
        room.submit_hint(&id("p2"), "red", &filter()).unwrap();
        room.close_hints(&mut rng()).unwrap();
        assert_eq!(
            room.submit_vote(&id("p3"), vec![h1.clone()]),
            Err(RoomError::InvalidHint(h1))
        );
    }

    #[test]
    fn test_placement_rules() {
        let (mut room, h1, _) = vote_room();
        room.submit_vote(&id("p3"), vec![h1.clone()]).unwrap();
        assert_eq!(
            room.set_placement("p0", 10.0),
            Err(RoomError::InvalidPhase(RoomPhase::Vote))
        );
        assert_eq!(room.close_votes(), Some(vec![h1]));

        assert_eq!(room.set_placement("p1", 10.0), Err(RoomError::NotNavigator));
        assert_eq!(room.set_placement("p0", 100.5), Err(RoomError::OutOfRange));
        assert_eq!(room.set_placement("p0", -1.0), Err(RoomError::OutOfRange));
        assert_eq!(room.set_placement("p0", f64::NAN), Err(RoomError::OutOfRange));
        assert_eq!(room.set_placement("p0", 41.6), Ok(42));
        assert_eq!(room.set_placement("p0", 12.2), Ok(12));
        assert_eq!(room.placement, Some(12));
    }

    #[test]
    fn test_reveal_defaults_to_midpoint_and_applies_points() {
        let (mut room, _, _) = vote_room();
        room.close_votes().unwrap();
        room.target = 52;

        let result = room.reveal().unwrap();
        assert_eq!(result.placement, DEFAULT_PLACEMENT);
        assert_eq!(result.distance, 2);
        assert_eq!(result.tier, TeamTier::Bullseye);
        assert_eq!(room.phase, RoomPhase::Reveal);
        assert_eq!(room.player("p0").unwrap().score, 5);
        assert_eq!(room.player("p3").unwrap().score, 3);
        assert_eq!(room.last_result.as_ref(), Some(&result));
    }

    #[test]
    fn test_finish_round_returns_to_lobby_or_ends() {
        let (mut room, _, _) = vote_room();
        room.close_votes().unwrap();
        room.target = 0;
        room.placement = Some(100);
        room.reveal().unwrap();
        assert_eq!(room.finish_round(), Some(RoomPhase::Lobby));

        room.phase = RoomPhase::Reveal;
        room.players[1].score = room.win_score;
        assert_eq!(room.finish_round(), Some(RoomPhase::GameOver));

        room.phase = RoomPhase::Reveal;
        room.players[1].score = 0;
        room.round = room.max_rounds;
        assert_eq!(room.finish_round(), Some(RoomPhase::GameOver));
    }

    #[test]
    fn test_reconnect_marks_connected() {
        let mut room = room_with(3);
        let token = room.player("p1").unwrap().reconnect_token.clone();
        room.set_connected("p1", false);
        assert_eq!(room.reconnect(&token), Some(id("p1")));
        assert!(room.player("p1").unwrap().connected);
        assert_eq!(room.reconnect("bogus"), None);
    }

    #[test]
    fn test_host_token_resolves_to_host() {
        let mut room = room_with(0);
        let token = room.host_token.clone();
        assert_eq!(room.reconnect(&token), Some(id("host")));
    }

    #[test]
    fn test_remove_player_revokes_token() {
        let mut room = room_with(3);
        let token = room.player("p1").unwrap().reconnect_token.clone();
        let removed = room.remove_player("p1").unwrap();
        assert_eq!(removed.id, "p1");
        assert_eq!(room.reconnect(&token), None);
        assert_eq!(room.remove_player("host"), Err(RoomError::CannotKickHost));
        assert_eq!(room.remove_player("p1"), Err(RoomError::PlayerNotFound));
    }

    #[test]
    fn test_remove_navigator_keeps_rotation() {
        let mut room = room_with(4);
        room.start_round(&mut rng()).unwrap();
        room.phase = RoomPhase::Lobby;
        room.start_round(&mut rng()).unwrap();
        assert_eq!(room.navigator_id.as_deref(), Some("p1"));
        room.phase = RoomPhase::Lobby;

        room.remove_player("p1").unwrap();
        room.start_round(&mut rng()).unwrap();
        assert_eq!(room.navigator_id.as_deref(), Some("p2"));
    }

    #[test]
    fn test_remove_player_only_between_rounds() {
        let mut room = hint_room(3);
        assert_eq!(
            room.remove_player("p1"),
            Err(RoomError::InvalidPhase(RoomPhase::Hint))
        );
    }

    #[test]
    fn test_muted_player_cannot_hint() {
        let mut room = hint_room(3);
        room.submit_hint(&id("p1"), "ice", &filter()).unwrap();
        assert_eq!(room.toggle_mute("p1"), Ok(true));

        assert!(!room.hints.contains_key("p1"));
        assert_eq!(room.hint_status(), (0, 1));
        assert_eq!(
            room.submit_hint(&id("p1"), "snow", &filter()),
            Err(RoomError::Muted)
        );
        room.submit_hint(&id("p2"), "snow", &filter()).unwrap();
        room.close_hints(&mut rng()).unwrap();
        assert_eq!(room.ballot().len(), 1);
        assert_eq!(room.ballot()[0].author_id, "p2");
    }

    #[test]
    fn test_toggle_mute_flips_back() {
        let mut room = room_with(3);
        assert_eq!(room.toggle_mute("p1"), Ok(true));
        assert!(room.player("p1").unwrap().is_muted);
        assert_eq!(room.toggle_mute("p1"), Ok(false));
        assert!(!room.player("p1").unwrap().is_muted);

        assert_eq!(room.toggle_mute("host"), Err(RoomError::CannotMuteHost));
        assert_eq!(room.toggle_mute("ghost"), Err(RoomError::PlayerNotFound));
    }

    #[test]
    fn test_set_pack() {
        let mut room = room_with(0);
        assert!(room.set_pack("party").is_ok());
        assert_eq!(room.pack, "party");
        assert_eq!(
            room.set_pack("nope"),
            Err(RoomError::UnknownPack("nope".to_string()))
        );
        assert_eq!(room.pack, "party");
    }

    #[test]
    fn test_leaderboard_order() {
        let mut room = room_with(3);
        room.players[0].score = 2;
        room.players[1].score = 7;
        room.players[2].score = 2;
        let ids: Vec<_> = room.leaderboard().iter().map(|p| p.id.clone()).collect();
        assert_eq!(ids, vec![id("p1"), id("p0"), id("p2")]);
    }

    #[test]
    fn test_navigator_never_author_or_voter() {
        let (mut room, h1, _) = vote_room();
        room.submit_vote(&id("p3"), vec![h1]).unwrap();
        let navigator = room.navigator_id.clone().unwrap();
        assert!(room.hints.values().all(|h| h.author_id != navigator));
        assert!(!room.votes.contains_key(&navigator));
    }
}
