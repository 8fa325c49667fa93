//! The `GamePayload` trait: the extension point for game types.
//!
//! A game type supplies its payload document and rules; the session
//! manager handles everything generic around it. Turn logic runs inside
//! a [`TurnContext`], which gives the rules mutable access to the payload
//! plus the two envelope effects a turn may have: skipping seats and
//! finishing the game.

use serde::{Serialize, de::DeserializeOwned};
use turnforge_protocol::Id;

/// Player-count limits for a game type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameRules {
    /// Minimum players required to start.
    pub min_players: usize,
    /// Maximum players allowed to join.
    pub max_players: usize,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            min_players: 2,
            max_players: 8,
        }
    }
}

/// The type-specific document embedded in a [`Session`](crate::Session).
///
/// Serialization must be deterministic: equal values must encode to
/// identical bytes, because the cache and the store hold the same bytes.
pub trait GamePayload: Send + Sync + Clone + Serialize + DeserializeOwned + 'static {
    /// Short tag stored with every session of this type.
    const GAME_TYPE: &'static str;

    /// The payload of a freshly created game.
    fn new_game() -> Self;

    /// Player-count limits. Default: [`GameRules::default()`].
    fn rules() -> GameRules {
        GameRules::default()
    }

    /// Called once when the creator starts the game, after the player
    /// order is final. Default: no-op.
    fn setup(&mut self, _players: &[Id]) {}

    /// Index into the player list of whoever moves on `turn`.
    fn current_player_index(turn: u32, player_count: usize) -> usize {
        turn as usize % player_count
    }
}

/// What game rules see while a turn is being applied.
///
/// The session manager builds one per turn, hands it to the rules, and
/// afterwards folds the recorded effects back into the envelope: the
/// turn counter grows by `1 + skipped` and the status becomes Finished
/// if [`finish`](Self::finish) was called.
#[derive(Debug)]
pub struct TurnContext<'a, P> {
    turn: u32,
    player_count: usize,
    skipped: u32,
    finished: bool,
    payload: &'a mut P,
}

impl<'a, P> TurnContext<'a, P> {
    pub(crate) fn new(turn: u32, player_count: usize, payload: &'a mut P) -> Self {
        Self {
            turn,
            player_count,
            skipped: 0,
            finished: false,
            payload,
        }
    }

    /// The turn counter before this turn is applied.
    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn player_count(&self) -> usize {
        self.player_count
    }

    pub fn payload(&self) -> &P {
        self.payload
    }

    pub fn payload_mut(&mut self) -> &mut P {
        self.payload
    }

    /// Advances the turn counter by one extra step, on top of the
    /// increment every turn gets.
    pub fn skip_turn(&mut self) {
        self.skipped += 1;
    }

    /// Marks the game as Finished once this turn commits.
    pub fn finish(&mut self) {
        self.finished = true;
    }

    pub fn skipped(&self) -> u32 {
        self.skipped
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_context_records_effects() {
        let mut payload = 0u8;
        let mut ctx = TurnContext::new(5, 2, &mut payload);

        *ctx.payload_mut() += 1;
        ctx.skip_turn();
        ctx.skip_turn();
        ctx.finish();

        assert_eq!(ctx.turn(), 5);
        assert_eq!(ctx.skipped(), 2);
        assert!(ctx.is_finished());
        assert_eq!(payload, 1);
    }

    #[test]
    fn test_game_rules_default() {
        let rules = GameRules::default();
        assert_eq!(rules.min_players, 2);
        assert_eq!(rules.max_players, 8);
    }
}
