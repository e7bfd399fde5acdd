//! One room's players, rounds, drawer rotation, and scoring.
//!
//! A `Room` is a plain state machine; it performs no I/O and knows
//! nothing about sessions or sockets. All methods that depend on the
//! clock have an `_at` variant taking an explicit `Instant` so the
//! timing rules are testable.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::seq::SliceRandom;
use scrawl_protocol::{PlayerEntry, PlayerId, PlayerInfo, RoomId, RoomSnapshot};

use crate::{RoomConfig, RoomError, WordList};

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// One room member. Mutated only through `Room` operations — the
/// transport layer never touches these directly.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Monotonically non-decreasing except for [`Room::reset_scores`].
    pub score: u32,
    pub connected: bool,
}

impl Player {
    fn new(id: PlayerId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            score: 0,
            connected: true,
        }
    }

    /// The player's public form for join/connect payloads.
    pub fn info(&self) -> PlayerInfo {
        PlayerInfo {
            id: self.id,
            name: self.name.clone(),
            score: self.score,
        }
    }
}

// ---------------------------------------------------------------------------
// Round
// ---------------------------------------------------------------------------

/// One recorded guess.
#[derive(Debug, Clone)]
pub struct Guess {
    pub player: PlayerId,
    pub text: String,
    pub at: Instant,
    pub correct: bool,
}

/// One drawing-and-guessing cycle. At most one exists per room, owned by
/// value; a new round replaces the old one.
#[derive(Debug, Clone)]
pub struct Round {
    /// 1-based round number within this room.
    pub index: u32,
    /// Cleared (with `active`) when the drawer leaves mid-round.
    pub drawer: Option<PlayerId>,
    word: String,
    pub started_at: Instant,
    /// Set at most once; the round goes inactive the same instant.
    pub solved_by: Option<PlayerId>,
    pub guesses: Vec<Guess>,
    pub active: bool,
}

impl Round {
    /// The secret word. Callers must only forward this to the drawer.
    pub fn word(&self) -> &str {
        &self.word
    }

    /// Whole seconds left at `now`, saturating at zero.
    pub fn remaining_at(&self, duration: Duration, now: Instant) -> u64 {
        (self.started_at + duration)
            .saturating_duration_since(now)
            .as_secs()
    }
}

/// Points awarded to the guesser for a correct guess with
/// `remaining_secs` left of a `round_secs` round.
///
/// Tiered by the fraction of the round remaining: ≥70% → 10, ≥40% → 7,
/// anything positive → 5, otherwise 3. The drawer always gets half,
/// rounded down.
pub fn score_for_remaining(remaining_secs: u64, round_secs: u64) -> u32 {
    if round_secs > 0 {
        let pct = remaining_secs.saturating_mul(100) / round_secs;
        if pct >= 70 {
            return 10;
        }
        if pct >= 40 {
            return 7;
        }
    }
    if remaining_secs > 0 { 5 } else { 3 }
}

/// Result of [`Room::submit_guess`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuessOutcome {
    /// The guess matched; the round is over.
    Correct { points: u32, drawer_points: u32 },
    /// Wrong word. Recorded on the round; play continues.
    Incorrect,
    /// Not counted at all: round inactive or already solved, guesser is
    /// the drawer, or guesser is not a member.
    Rejected,
}

impl GuessOutcome {
    pub fn is_correct(&self) -> bool {
        matches!(self, Self::Correct { .. })
    }
}

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

/// An isolated game: player map, drawer rotation, current round.
///
/// Lifecycle: lobby (`started == false`) → rounds loop while started →
/// back to lobby via [`end_game`](Self::end_game).
#[derive(Debug)]
pub struct Room {
    id: RoomId,
    config: RoomConfig,
    words: Arc<WordList>,
    players: HashMap<PlayerId, Player>,
    /// Round-robin queue. Rebuilt (reshuffled) whenever membership
    /// changes so newcomers are mixed in fairly.
    rotation: VecDeque<PlayerId>,
    round: Option<Round>,
    rounds_played: u32,
    started: bool,
}

impl Room {
    pub fn new(id: RoomId, config: RoomConfig, words: Arc<WordList>) -> Self {
        Self {
            id,
            config,
            words,
            players: HashMap::new(),
            rotation: VecDeque::new(),
            round: None,
            rounds_played: 0,
            started: false,
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn started(&self) -> bool {
        self.started
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.players.contains_key(&id)
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    /// The current (possibly finished) round.
    pub fn round(&self) -> Option<&Round> {
        self.round.as_ref()
    }

    /// Public info for every member, ordered by id for determinism.
    pub fn player_infos(&self) -> Vec<PlayerInfo> {
        let mut infos: Vec<PlayerInfo> =
            self.players.values().map(Player::info).collect();
        infos.sort_by_key(|p| p.id);
        infos
    }

    /// Adds a player. Returns `false` (and changes nothing) when the id
    /// is already present or the room is at capacity.
    pub fn add_player(&mut self, id: PlayerId, name: &str) -> bool {
        if self.players.contains_key(&id) || self.players.len() >= self.config.max_players
        {
            return false;
        }
        self.players.insert(id, Player::new(id, name));
        self.rebuild_rotation();
        tracing::info!(room = %self.id, player = %id, members = self.players.len(), "player joined");
        true
    }

    /// Removes a player. If they were the round's drawer the round is
    /// closed and the drawer slot cleared, so a snapshot never names a
    /// player who is no longer in the room.
    pub fn remove_player(&mut self, id: PlayerId) -> Option<Player> {
        let player = self.players.remove(&id)?;
        self.rebuild_rotation();
        let was_drawer = self.round.as_ref().is_some_and(|r| r.drawer == Some(id));
        if was_drawer {
            self.force_end_round();
            tracing::info!(room = %self.id, player = %id, "drawer left, round closed");
        }
        tracing::info!(room = %self.id, player = %id, members = self.players.len(), "player left");
        Some(player)
    }

    /// Starts the game and its first round.
    pub fn start_game(&mut self) -> Result<(), RoomError> {
        if self.started {
            return Err(RoomError::AlreadyStarted(self.id.clone()));
        }
        if self.players.len() < self.config.min_players {
            return Err(RoomError::NotEnoughPlayers {
                have: self.players.len(),
                need: self.config.min_players,
            });
        }
        self.started = true;
        self.start_round_at(Instant::now())
    }

    /// Ends the current round (if any) and opens the next one with the
    /// next drawer in rotation and a fresh random word.
    pub fn next_round(&mut self) -> Result<(), RoomError> {
        self.start_round_at(Instant::now())
    }

    /// Clock-explicit round start, used by the tests.
    pub fn start_round_at(&mut self, now: Instant) -> Result<(), RoomError> {
        if !self.started {
            return Err(RoomError::NotStarted(self.id.clone()));
        }
        if self.players.len() < self.config.min_players {
            return Err(RoomError::NotEnoughPlayers {
                have: self.players.len(),
                need: self.config.min_players,
            });
        }

        // Round-robin: pop the head, put it back at the tail, so every
        // member draws once before anyone repeats.
        let drawer = loop {
            let candidate = match self.rotation.pop_front() {
                Some(id) => id,
                None => {
                    return Err(RoomError::NotEnoughPlayers {
                        have: 0,
                        need: self.config.min_players,
                    });
                }
            };
            if self.players.contains_key(&candidate) {
                self.rotation.push_back(candidate);
                break candidate;
            }
        };

        if let Some(round) = &mut self.round {
            round.active = false;
        }

        let word = self.words.pick().to_string();
        self.rounds_played += 1;
        tracing::info!(
            room = %self.id,
            round = self.rounds_played,
            drawer = %drawer,
            "round started"
        );
        self.round = Some(Round {
            index: self.rounds_played,
            drawer: Some(drawer),
            word,
            started_at: now,
            solved_by: None,
            guesses: Vec::new(),
            active: true,
        });
        Ok(())
    }

    /// Force-clears the round and returns to the lobby. Scores keep
    /// their values for the room's lifetime.
    pub fn end_game(&mut self) {
        self.round = None;
        self.started = false;
        tracing::info!(room = %self.id, "game ended");
    }

    /// Resets every score to zero — the one sanctioned score decrease.
    pub fn reset_scores(&mut self) {
        for player in self.players.values_mut() {
            player.score = 0;
        }
    }

    /// Submits a guess against the wall clock.
    pub fn submit_guess(&mut self, player: PlayerId, text: &str) -> GuessOutcome {
        self.submit_guess_at(player, text, Instant::now())
    }

    /// Clock-explicit guess submission.
    ///
    /// Rejected without recording anything when the round is inactive or
    /// already solved, the guesser is the drawer, or the guesser is not
    /// a member. Matching ignores case and surrounding whitespace;
    /// interior whitespace and punctuation are significant.
    pub fn submit_guess_at(
        &mut self,
        player: PlayerId,
        text: &str,
        now: Instant,
    ) -> GuessOutcome {
        if !self.players.contains_key(&player) {
            return GuessOutcome::Rejected;
        }
        let round_secs = self.config.round_secs;

        let (drawer, points) = {
            let round = match &mut self.round {
                Some(r) if r.active && r.solved_by.is_none() => r,
                _ => return GuessOutcome::Rejected,
            };
            if round.drawer == Some(player) {
                return GuessOutcome::Rejected;
            }

            let correct = words_match(text, &round.word);
            round.guesses.push(Guess {
                player,
                text: text.to_string(),
                at: now,
                correct,
            });
            if !correct {
                return GuessOutcome::Incorrect;
            }

            // First correct guess wins the round, immediately and finally.
            round.solved_by = Some(player);
            round.active = false;
            let remaining = round.remaining_at(Duration::from_secs(round_secs), now);
            (round.drawer, score_for_remaining(remaining, round_secs))
        };

        let drawer_points = points / 2;
        if let Some(p) = self.players.get_mut(&player) {
            p.score += points;
        }
        if let Some(d) = drawer.and_then(|id| self.players.get_mut(&id)) {
            d.score += drawer_points;
        }
        tracing::info!(
            room = %self.id,
            player = %player,
            points,
            drawer_points,
            "word guessed"
        );
        GuessOutcome::Correct {
            points,
            drawer_points,
        }
    }

    /// The word-redacted public state broadcast to clients.
    pub fn snapshot(&self) -> RoomSnapshot {
        self.snapshot_at(Instant::now())
    }

    /// Clock-explicit snapshot.
    pub fn snapshot_at(&self, now: Instant) -> RoomSnapshot {
        let players: BTreeMap<PlayerId, PlayerEntry> = self
            .players
            .values()
            .map(|p| {
                (
                    p.id,
                    PlayerEntry {
                        name: p.name.clone(),
                        score: p.score,
                    },
                )
            })
            .collect();

        let (round_index, drawer, seconds_remaining, solved) = match &self.round {
            Some(r) => (
                r.index,
                r.drawer,
                if r.active {
                    r.remaining_at(Duration::from_secs(self.config.round_secs), now)
                } else {
                    0
                },
                r.solved_by.is_some(),
            ),
            None => (self.rounds_played, None, 0, false),
        };

        RoomSnapshot {
            room: self.id.clone(),
            started: self.started,
            round: round_index,
            drawer,
            seconds_remaining,
            solved,
            players,
        }
    }

    fn force_end_round(&mut self) {
        if let Some(round) = &mut self.round {
            if round.active {
                round.active = false;
                round.solved_by = None;
            }
            round.drawer = None;
        }
    }

    fn rebuild_rotation(&mut self) {
        let mut ids: Vec<PlayerId> = self.players.keys().copied().collect();
        ids.shuffle(&mut rand::rng());
        self.rotation = ids.into();
    }
}

/// Case-insensitive, surrounding-whitespace-trimmed word equality.
fn words_match(guess: &str, word: &str) -> bool {
    guess.trim().to_lowercase() == word.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words_match_trims_and_folds_case() {
        assert!(words_match(" Apple ", "apple"));
        assert!(words_match("APPLE", "Apple"));
        assert!(!words_match("app le", "apple")); // interior whitespace counts
        assert!(!words_match("apples", "apple"));
    }

    #[test]
    fn test_score_tiers() {
        // 60-second round.
        assert_eq!(score_for_remaining(60, 60), 10);
        assert_eq!(score_for_remaining(42, 60), 10); // exactly 70%
        assert_eq!(score_for_remaining(41, 60), 7);
        assert_eq!(score_for_remaining(24, 60), 7); // exactly 40%
        assert_eq!(score_for_remaining(23, 60), 5);
        assert_eq!(score_for_remaining(1, 60), 5);
        assert_eq!(score_for_remaining(0, 60), 3);
    }

    #[test]
    fn test_score_zero_duration_round() {
        assert_eq!(score_for_remaining(0, 0), 3);
    }

    #[test]
    fn test_round_remaining_truncates_to_whole_seconds() {
        let start = Instant::now();
        let round = Round {
            index: 1,
            drawer: Some(PlayerId(1)),
            word: "apple".into(),
            started_at: start,
            solved_by: None,
            guesses: Vec::new(),
            active: true,
        };
        let dur = Duration::from_secs(60);
        assert_eq!(round.remaining_at(dur, start), 60);
        assert_eq!(
            round.remaining_at(dur, start + Duration::from_millis(17_900)),
            42
        );
        // Past the deadline saturates at zero.
        assert_eq!(
            round.remaining_at(dur, start + Duration::from_secs(120)),
            0
        );
    }
}
