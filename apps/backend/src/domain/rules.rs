//! Fixed game parameters.

/// Balance a player starts with, in dollars.
pub const STARTING_BALANCE: i64 = 350;

/// The pot is always funded to this amount; the per-player ante is derived.
pub const POT_TOTAL: i64 = 200;

/// Dollars paid from the pot per goal-suit card at settlement.
pub const BONUS_PER_CARD: i64 = 10;

/// Cards in the deck: 8 + 10 + 10 + 12.
pub const DECK_SIZE: usize = 40;

/// Reported time is renormalized onto `[0, TIME_SCALE]` regardless of the
/// configured real duration.
pub const TIME_SCALE: u64 = 240;

/// Per-player ante. `num_players` is validated at config load (4 or 5).
pub fn ante_for(num_players: usize) -> i64 {
    POT_TOTAL / num_players as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ante_always_fills_the_pot() {
        for n in [4usize, 5] {
            assert_eq!(ante_for(n) * n as i64, POT_TOTAL);
        }
    }
}
