//! Balances, hands, pot, and the trade log.
//!
//! The ledger owns every dollar and card in the round. Conservation totals
//! are fixed when hands are dealt and rechecked by `verify_conservation`
//! after each mutation in debug builds.

use std::collections::BTreeMap;

use crate::domain::orders::{PlayerId, Trade};
use crate::domain::rules::STARTING_BALANCE;
use crate::domain::suits::{CardCounts, Suit};
use crate::errors::DomainError;

#[derive(Debug, Clone)]
pub struct PlayerState {
    pub id: PlayerId,
    pub name: String,
    pub balance: i64,
    pub hand: CardCounts,
}

#[derive(Debug, Clone, Default)]
pub struct Ledger {
    /// Players in join order.
    players: Vec<PlayerState>,
    pot: i64,
    trades: Vec<Trade>,
    /// Balances immediately before antes were collected.
    initial_balances: BTreeMap<PlayerId, i64>,
    /// Hands immediately after the deal.
    initial_hands: BTreeMap<PlayerId, CardCounts>,
    /// Conservation targets, set at deal time.
    money_total: Option<i64>,
    card_totals: Option<CardCounts>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_player(&mut self, name: &str) -> PlayerId {
        let id = PlayerId::generate();
        self.players.push(PlayerState {
            id: id.clone(),
            name: name.to_string(),
            balance: STARTING_BALANCE,
            hand: CardCounts::new(),
        });
        id
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn contains(&self, id: &PlayerId) -> bool {
        self.players.iter().any(|p| p.id == *id)
    }

    pub fn player(&self, id: &PlayerId) -> Option<&PlayerState> {
        self.players.iter().find(|p| p.id == *id)
    }

    fn player_mut(&mut self, id: &PlayerId) -> Result<&mut PlayerState, DomainError> {
        self.players
            .iter_mut()
            .find(|p| p.id == *id)
            .ok_or_else(|| DomainError::invariant(format!("unknown player {id} in ledger")))
    }

    pub fn players(&self) -> impl Iterator<Item = &PlayerState> {
        self.players.iter()
    }

    pub fn join_order(&self) -> Vec<PlayerId> {
        self.players.iter().map(|p| p.id.clone()).collect()
    }

    pub fn pot(&self) -> i64 {
        self.pot
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn initial_balances(&self) -> &BTreeMap<PlayerId, i64> {
        &self.initial_balances
    }

    pub fn initial_hands(&self) -> &BTreeMap<PlayerId, CardCounts> {
        &self.initial_hands
    }

    pub fn balances(&self) -> BTreeMap<PlayerId, i64> {
        self.players
            .iter()
            .map(|p| (p.id.clone(), p.balance))
            .collect()
    }

    pub fn hands(&self) -> BTreeMap<PlayerId, CardCounts> {
        self.players
            .iter()
            .map(|p| (p.id.clone(), p.hand))
            .collect()
    }

    /// Installs the dealt hands (one per player, join order), snapshots the
    /// pre-ante balances and post-deal hands, and fixes the conservation
    /// totals for the rest of the round.
    pub fn install_deal(&mut self, hands: &[CardCounts]) -> Result<(), DomainError> {
        if hands.len() != self.players.len() {
            return Err(DomainError::invariant(format!(
                "deal produced {} hands for {} players",
                hands.len(),
                self.players.len()
            )));
        }
        self.initial_balances = self
            .players
            .iter()
            .map(|p| (p.id.clone(), p.balance))
            .collect();
        for (player, hand) in self.players.iter_mut().zip(hands) {
            player.hand = *hand;
        }
        self.initial_hands = self
            .players
            .iter()
            .map(|p| (p.id.clone(), p.hand))
            .collect();

        let mut card_totals = CardCounts::new();
        for hand in hands {
            for (suit, count) in hand.iter() {
                card_totals.add(suit, count);
            }
        }
        self.card_totals = Some(card_totals);
        self.money_total = Some(self.players.iter().map(|p| p.balance).sum::<i64>() + self.pot);
        Ok(())
    }

    /// Debits every player and credits the pot.
    pub fn ante_all(&mut self, amount: i64) -> Result<(), DomainError> {
        for player in &self.players {
            if player.balance < amount {
                return Err(DomainError::invariant(format!(
                    "player {} cannot cover the {amount} ante",
                    player.id
                )));
            }
        }
        for player in &mut self.players {
            player.balance -= amount;
        }
        self.pot += amount * self.players.len() as i64;
        Ok(())
    }

    pub fn can_fund(&self, id: &PlayerId, price: i64) -> bool {
        self.player(id).is_some_and(|p| p.balance >= price)
    }

    pub fn can_deliver(&self, id: &PlayerId, suit: Suit) -> bool {
        self.player(id).is_some_and(|p| p.hand.get(suit) >= 1)
    }

    /// Moves one `suit` card seller→buyer and `price` dollars buyer→seller,
    /// appending to the trade log.
    ///
    /// Preconditions (checked): buyer can fund `price`, seller holds a card.
    pub fn transfer(
        &mut self,
        buyer: &PlayerId,
        seller: &PlayerId,
        suit: Suit,
        price: i64,
    ) -> Result<Trade, DomainError> {
        if !self.can_fund(buyer, price) {
            return Err(DomainError::invariant(format!(
                "buyer {buyer} cannot fund a {price} strike"
            )));
        }
        if !self.can_deliver(seller, suit) {
            return Err(DomainError::invariant(format!(
                "seller {seller} holds no {suit} to deliver"
            )));
        }
        self.player_mut(seller)?.hand.remove_one(suit)?;
        self.player_mut(seller)?.balance += price;
        let buyer_state = self.player_mut(buyer)?;
        buyer_state.balance -= price;
        buyer_state.hand.add(suit, 1);

        let trade = Trade {
            buyer: buyer.clone(),
            seller: seller.clone(),
            suit,
            price,
        };
        self.trades.push(trade.clone());
        Ok(trade)
    }

    /// Settlement credit, paid from the pot.
    pub fn pay_from_pot(&mut self, id: &PlayerId, amount: i64) -> Result<(), DomainError> {
        if amount == 0 {
            return Ok(());
        }
        if amount < 0 || amount > self.pot {
            return Err(DomainError::invariant(format!(
                "pot payout of {amount} with {} in the pot",
                self.pot
            )));
        }
        self.player_mut(id)?.balance += amount;
        self.pot -= amount;
        Ok(())
    }

    /// Zeroes the pot; any unclaimed residue leaves the round.
    pub fn drain_pot(&mut self) -> i64 {
        std::mem::take(&mut self.pot)
    }

    /// Card and money conservation plus solvency, against the totals fixed
    /// at deal time. Valid between deal and settlement.
    pub fn verify_conservation(&self) -> Result<(), DomainError> {
        if let Some(expected) = self.card_totals {
            let mut totals = CardCounts::new();
            for player in &self.players {
                for (suit, count) in player.hand.iter() {
                    totals.add(suit, count);
                }
            }
            if totals != expected {
                return Err(DomainError::invariant(format!(
                    "card totals drifted: {totals:?} != {expected:?}"
                )));
            }
        }
        if let Some(expected) = self.money_total {
            let total = self.players.iter().map(|p| p.balance).sum::<i64>() + self.pot;
            if total != expected {
                return Err(DomainError::invariant(format!(
                    "money total drifted: {total} != {expected}"
                )));
            }
        }
        if let Some(poor) = self.players.iter().find(|p| p.balance < 0) {
            return Err(DomainError::invariant(format!(
                "player {} has negative balance {}",
                poor.id, poor.balance
            )));
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn set_hands_for_test(&mut self, hands: &[(PlayerId, CardCounts)]) {
        for (id, hand) in hands {
            if let Some(player) = self.players.iter_mut().find(|p| p.id == *id) {
                player.hand = *hand;
            }
        }
        let mut card_totals = CardCounts::new();
        for player in &self.players {
            for (suit, count) in player.hand.iter() {
                card_totals.add(suit, count);
            }
        }
        self.card_totals = Some(card_totals);
        self.initial_hands = self
            .players
            .iter()
            .map(|p| (p.id.clone(), p.hand))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rules::{ante_for, POT_TOTAL};

    fn ledger_with(names: &[&str]) -> (Ledger, Vec<PlayerId>) {
        let mut ledger = Ledger::new();
        let ids = names.iter().map(|n| ledger.add_player(n)).collect();
        (ledger, ids)
    }

    #[test]
    fn ante_funds_the_pot_exactly() {
        let (mut ledger, _) = ledger_with(&["a", "b", "c", "d"]);
        ledger.ante_all(ante_for(4)).unwrap();
        assert_eq!(ledger.pot(), POT_TOTAL);
        for p in ledger.players() {
            assert_eq!(p.balance, STARTING_BALANCE - ante_for(4));
        }
    }

    #[test]
    fn transfer_moves_one_card_and_the_price() {
        let (mut ledger, ids) = ledger_with(&["a", "b"]);
        let mut hand = CardCounts::new();
        hand.add(Suit::Hearts, 2);
        ledger.set_hands_for_test(&[(ids[1].clone(), hand)]);

        let trade = ledger
            .transfer(&ids[0], &ids[1], Suit::Hearts, 10)
            .unwrap();
        assert_eq!(trade.price, 10);
        assert_eq!(ledger.player(&ids[0]).unwrap().balance, STARTING_BALANCE - 10);
        assert_eq!(ledger.player(&ids[1]).unwrap().balance, STARTING_BALANCE + 10);
        assert_eq!(ledger.player(&ids[0]).unwrap().hand.get(Suit::Hearts), 1);
        assert_eq!(ledger.player(&ids[1]).unwrap().hand.get(Suit::Hearts), 1);
        assert_eq!(ledger.trades().len(), 1);
        ledger.verify_conservation().unwrap();
    }

    #[test]
    fn transfer_rejects_unfunded_buyer_and_empty_seller() {
        let (mut ledger, ids) = ledger_with(&["a", "b"]);
        assert!(ledger
            .transfer(&ids[0], &ids[1], Suit::Clubs, 10)
            .is_err());
        assert!(ledger
            .transfer(&ids[0], &ids[1], Suit::Clubs, STARTING_BALANCE + 1)
            .is_err());
        assert!(ledger.trades().is_empty());
    }

    #[test]
    fn install_deal_snapshots_pre_ante_balances() {
        let (mut ledger, ids) = ledger_with(&["a", "b", "c", "d"]);
        let hands = vec![CardCounts::new(); 4];
        ledger.install_deal(&hands).unwrap();
        ledger.ante_all(ante_for(4)).unwrap();
        assert_eq!(ledger.initial_balances()[&ids[0]], STARTING_BALANCE);
        assert_eq!(
            ledger.player(&ids[0]).unwrap().balance,
            STARTING_BALANCE - ante_for(4)
        );
        // Money total was fixed before the ante; antes only move money into
        // the pot, so conservation still holds.
        ledger.verify_conservation().unwrap();
    }

    #[test]
    fn pot_payouts_stay_within_the_pot() {
        let (mut ledger, ids) = ledger_with(&["a", "b", "c", "d"]);
        ledger.ante_all(50).unwrap();
        ledger.pay_from_pot(&ids[0], 120).unwrap();
        assert_eq!(ledger.pot(), 80);
        assert!(ledger.pay_from_pot(&ids[1], 81).is_err());
        assert_eq!(ledger.drain_pot(), 80);
        assert_eq!(ledger.pot(), 0);
    }
}
