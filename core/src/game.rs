use crate::action::Action;
use crate::card::Card;
use crate::config::Config;
use crate::deck::Deck;
use crate::error::{GameError, MeldCode};
use crate::event::{DrawSource, GameEvent};
use crate::meld::{self, Meld};
use crate::player::{Player, PlayerId};
use crate::rng::{derive_seed, GameRng};
use crate::score;
use crate::turn::{TurnPhase, TurnScratch};
use uuid::Uuid;

pub type GameId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MatchStatus {
    #[strum(serialize = "playing")]
    Playing,
    #[strum(serialize = "hand_end")]
    HandEnd,
    #[strum(serialize = "finished")]
    Finished,
}

/// Record of the last committed action, kept on the document so a
/// redelivered request with the same nonce short-circuits to the prior
/// result instead of re-applying.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AppliedAction {
    pub nonce: String,
    pub events: Vec<GameEvent>,
    pub phase: TurnPhase,
}

/// The whole game document: seating, piles, table, turn machine and
/// match bookkeeping. One mutation at a time per game; the repository's
/// version token serialises concurrent writers.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Game {
    pub id: GameId,
    pub config: Config,
    /// Seating order, fixed for the duration of the match.
    pub players: Vec<Player>,
    pub stock: Deck,
    /// Top of the pile is the last element; only the top is accessible.
    pub discard: Vec<Card>,
    pub melds: Vec<Meld>,
    pub current: PlayerId,
    pub phase: TurnPhase,
    pub scratch: TurnScratch,
    /// Full trips around the table, 1-based within a hand.
    pub round_number: u32,
    /// Set once every non-eliminated player has completed one turn of
    /// the current hand. Closing is forbidden while it is false.
    pub first_round_complete: bool,
    pub dealer: PlayerId,
    pub hand_number: u32,
    pub status: MatchStatus,
    pub winner: Option<PlayerId>,
    /// Seed of the game's shuffle stream; every shuffle consumes one
    /// cursor position, so history replays reproduce every deal.
    pub seed: u64,
    pub rng_cursor: u64,
    pub last_applied: Option<AppliedAction>,
}

impl Game {
    /// Deal the first hand for 2 to 4 players. The dealer starts at the
    /// first seat; the seat after the dealer acts first.
    pub fn create(
        player_ids: &[PlayerId],
        config: Config,
        seed: u64,
    ) -> Result<(Self, Vec<GameEvent>), GameError> {
        if !(2..=4).contains(&player_ids.len()) {
            return Err(GameError::PlayerCount(player_ids.len()));
        }
        let players: Vec<Player> = player_ids.iter().map(|id| Player::new(id.clone())).collect();
        let dealer = players[0].id.clone();
        let mut game = Self {
            id: Uuid::now_v7(),
            config,
            players,
            stock: Deck::default(),
            discard: Vec::new(),
            melds: Vec::new(),
            current: dealer.clone(),
            phase: TurnPhase::AwaitDraw,
            scratch: TurnScratch::default(),
            round_number: 1,
            first_round_complete: false,
            dealer,
            hand_number: 0,
            status: MatchStatus::Playing,
            winner: None,
            seed,
            rng_cursor: 0,
            last_applied: None,
        };
        let events = game.deal_hand()?;
        Ok((game, events))
    }

    /// Apply one player action, returning the events it committed.
    /// Validation failures leave the state untouched.
    pub fn handle_action(
        &mut self,
        player_id: &PlayerId,
        action: Action,
        declare_duplicate: bool,
    ) -> Result<Vec<GameEvent>, GameError> {
        if self.status == MatchStatus::Finished {
            return Err(GameError::MatchOver);
        }
        let seat = self.seat_of(player_id).ok_or(GameError::UnknownPlayer)?;
        if *player_id != self.current {
            return Err(GameError::NotYourTurn);
        }
        match action {
            Action::DrawStock => self.draw_stock(seat),
            Action::DrawDiscard => self.draw_discard(seat),
            Action::Open(melds) => self.open(seat, melds),
            Action::LayMeld(cards) => self.lay_meld(seat, cards),
            Action::Attach { card, meld } => self.attach(seat, card, meld),
            Action::SubstituteJoker { meld, card } => self.substitute_joker(seat, meld, card),
            Action::Discard(card) => self.discard_card(seat, card, declare_duplicate),
            Action::AutoPlay => self.auto_play(seat),
        }
    }

    // --- seating helpers ---

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == *id)
    }

    pub fn seat_of(&self, id: &PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id == *id)
    }

    pub fn active_count(&self) -> usize {
        self.players.iter().filter(|p| !p.is_eliminated).count()
    }

    /// Non-eliminated seats starting after `id` and going around the
    /// table, `id`'s own seat last if it is still standing.
    fn rotation_after(&self, id: &PlayerId) -> Vec<usize> {
        let start = self.seat_of(id).unwrap_or(0);
        (1..=self.players.len())
            .map(|offset| (start + offset) % self.players.len())
            .filter(|&seat| !self.players[seat].is_eliminated)
            .collect()
    }

    fn next_active_after(&self, id: &PlayerId) -> usize {
        self.rotation_after(id)[0]
    }

    /// The player who acts first in every round of the current hand.
    fn round_opener(&self) -> PlayerId {
        let seat = self.next_active_after(&self.dealer);
        self.players[seat].id.clone()
    }

    fn seeded_rng(&mut self) -> GameRng {
        let rng = GameRng::seeded(derive_seed(self.seed, self.rng_cursor));
        self.rng_cursor += 1;
        rng
    }

    // --- hand lifecycle ---

    /// Shuffle a fresh 108-card stock and deal 13 to every standing
    /// player, one at a time in seating order starting after the
    /// dealer; one card opens the discard pile.
    fn deal_hand(&mut self) -> Result<Vec<GameEvent>, GameError> {
        self.hand_number += 1;
        let mut rng = self.seeded_rng();
        let mut stock = Deck::standard();
        stock.shuffle(&mut rng);

        let seats = self.rotation_after(&self.dealer.clone());
        let (hands, upcard) = stock.deal(seats.len(), self.config.hand_size)?;
        for player in self.players.iter_mut() {
            player.hand.clear();
            player.has_opened = false;
        }
        for (&seat, hand) in seats.iter().zip(hands) {
            self.players[seat].hand = hand;
        }

        self.stock = stock;
        self.discard = vec![upcard];
        self.melds.clear();
        self.scratch.clear();
        self.current = self.players[seats[0]].id.clone();
        self.phase = TurnPhase::AwaitDraw;
        self.round_number = 1;
        self.first_round_complete = false;
        self.status = MatchStatus::Playing;

        Ok(vec![GameEvent::HandStart {
            hand_number: self.hand_number,
            dealer: self.dealer.clone(),
            starter: self.current.clone(),
        }])
    }

    // --- draws ---

    fn draw_stock(&mut self, seat: usize) -> Result<Vec<GameEvent>, GameError> {
        if self.phase != TurnPhase::AwaitDraw {
            return Err(GameError::WrongPhase(self.phase));
        }
        let mut events = Vec::new();
        if self.stock.is_empty() {
            // Everything under the discard top goes back into the stock.
            if self.discard.len() <= 1 {
                return Err(GameError::StockEmpty);
            }
            let recycled = self.discard.len() - 1;
            let mut rng = self.seeded_rng();
            self.stock = Deck::rebuild_from_discard(&mut self.discard, &mut rng);
            events.push(GameEvent::Reshuffle { recycled });
        }
        let card = self.stock.draw().ok_or(GameError::StockEmpty)?;
        self.players[seat].hand.push(card);
        self.phase = TurnPhase::AwaitPlay;
        events.push(GameEvent::Draw {
            player: self.players[seat].id.clone(),
            source: DrawSource::Stock,
            stock_remaining: self.stock.len(),
        });
        Ok(events)
    }

    fn draw_discard(&mut self, seat: usize) -> Result<Vec<GameEvent>, GameError> {
        if self.phase != TurnPhase::AwaitDraw {
            return Err(GameError::WrongPhase(self.phase));
        }
        if !self.players[seat].has_opened && !self.config.open_with_discard {
            return Err(GameError::NotOpened);
        }
        let card = self.discard.pop().ok_or(GameError::NoCards)?;
        self.players[seat].hand.push(card);
        self.scratch.picked_from_discard = Some(card);
        self.phase = TurnPhase::AwaitPlay;
        Ok(vec![GameEvent::Draw {
            player: self.players[seat].id.clone(),
            source: DrawSource::Discard,
            stock_remaining: self.stock.len(),
        }])
    }

    // --- plays ---

    /// The hand after removing `wanted`, plus whether the pending joker
    /// covered one reference the hand could not. Pure; commit by
    /// assigning the returned hand.
    fn hand_without(&self, seat: usize, wanted: &[Card]) -> Result<(Vec<Card>, bool), GameError> {
        let mut hand = self.players[seat].hand.clone();
        let mut pending_used = false;
        for card in wanted {
            if let Some(pos) = hand.iter().position(|c| c == card) {
                hand.remove(pos);
            } else if !pending_used && self.scratch.pending_joker.as_ref() == Some(card) {
                pending_used = true;
            } else {
                return Err(GameError::IllegalMeld {
                    code: MeldCode::UnknownCard,
                });
            }
        }
        Ok((hand, pending_used))
    }

    fn open(&mut self, seat: usize, lists: Vec<Vec<Card>>) -> Result<Vec<GameEvent>, GameError> {
        if self.phase != TurnPhase::AwaitPlay {
            return Err(GameError::WrongPhase(self.phase));
        }
        if self.players[seat].has_opened {
            return Err(GameError::AlreadyOpened);
        }
        let all: Vec<Card> = lists.iter().flatten().copied().collect();
        let (hand_after, _) = self.hand_without(seat, &all)?;

        let owner = self.players[seat].id.clone();
        let mut melds = Vec::with_capacity(lists.len());
        for cards in lists {
            let meld = Meld::try_new(cards, owner.clone())
                .map_err(|code| GameError::IllegalMeld { code })?;
            melds.push(meld);
        }
        let points = meld::validate_opening(
            &melds,
            self.config.opening_points,
            self.config.opening_without_joker,
        )?;
        if hand_after.is_empty() {
            // a card must remain for the mandatory discard
            return Err(GameError::NoCards);
        }

        let count = melds.len();
        self.players[seat].hand = hand_after;
        self.players[seat].has_opened = true;
        self.scratch.opened_this_turn = true;
        self.melds.extend(melds);
        Ok(vec![GameEvent::Open {
            player: owner,
            points,
            melds: count,
        }])
    }

    fn lay_meld(&mut self, seat: usize, cards: Vec<Card>) -> Result<Vec<GameEvent>, GameError> {
        if self.phase != TurnPhase::AwaitPlay {
            return Err(GameError::WrongPhase(self.phase));
        }
        if !self.players[seat].has_opened {
            return Err(GameError::NotOpened);
        }
        let (hand_after, pending_used) = self.hand_without(seat, &cards)?;
        let owner = self.players[seat].id.clone();
        let meld =
            Meld::try_new(cards, owner.clone()).map_err(|code| GameError::IllegalMeld { code })?;
        if hand_after.is_empty() {
            return Err(GameError::NoCards);
        }

        self.players[seat].hand = hand_after;
        if pending_used {
            self.scratch.pending_joker = None;
        }
        self.scratch.played_after_open |= self.scratch.opened_this_turn;
        let event = GameEvent::LayMeld {
            player: owner,
            kind: meld.kind,
            cards: meld.cards.clone(),
        };
        self.melds.push(meld);
        Ok(vec![event])
    }

    fn attach(&mut self, seat: usize, card: Card, meld: usize) -> Result<Vec<GameEvent>, GameError> {
        if self.phase != TurnPhase::AwaitPlay {
            return Err(GameError::WrongPhase(self.phase));
        }
        if !self.players[seat].has_opened {
            return Err(GameError::NotOpened);
        }
        let target = self.melds.get(meld).ok_or(GameError::UnknownMeld)?;
        let (hand_after, pending_used) = self.hand_without(seat, &[card])?;
        let grown = target
            .with_attached(card)
            .map_err(|code| GameError::IllegalMeld { code })?;
        if hand_after.is_empty() {
            return Err(GameError::NoCards);
        }

        self.players[seat].hand = hand_after;
        if pending_used {
            self.scratch.pending_joker = None;
        }
        self.scratch.played_after_open |= self.scratch.opened_this_turn;
        self.melds[meld] = grown;
        Ok(vec![GameEvent::Attach {
            player: self.players[seat].id.clone(),
            card,
            meld,
        }])
    }

    fn substitute_joker(
        &mut self,
        seat: usize,
        meld: usize,
        card: Card,
    ) -> Result<Vec<GameEvent>, GameError> {
        if self.phase != TurnPhase::AwaitPlay {
            return Err(GameError::WrongPhase(self.phase));
        }
        if !self.players[seat].has_opened {
            return Err(GameError::NotOpened);
        }
        if self.scratch.pending_joker.is_some() {
            // the previous joker must land somewhere first
            return Err(GameError::JokerMustBeUsed);
        }
        let target = self.melds.get(meld).ok_or(GameError::UnknownMeld)?;
        if !self.players[seat].holds(&card) {
            return Err(GameError::IllegalMeld {
                code: MeldCode::UnknownCard,
            });
        }
        let (repaired, joker) = target
            .substitute_joker(&card)
            .map_err(|code| GameError::IllegalMeld { code })?;

        self.players[seat].remove_card(&card);
        self.melds[meld] = repaired;
        self.scratch.pending_joker = Some(joker);
        self.scratch.played_after_open |= self.scratch.opened_this_turn;
        Ok(vec![GameEvent::SubstituteJoker {
            player: self.players[seat].id.clone(),
            card,
            meld,
        }])
    }

    // --- discard and turn end ---

    /// Discard legality (§4.2), without mutating anything. Returns
    /// whether the discard would close the hand.
    pub(crate) fn check_discard(
        &self,
        seat: usize,
        card: &Card,
        declare_duplicate: bool,
    ) -> Result<bool, GameError> {
        if self.phase != TurnPhase::AwaitPlay {
            return Err(GameError::WrongPhase(self.phase));
        }
        let player = &self.players[seat];
        if !player.holds(card) {
            return Err(GameError::IllegalMeld {
                code: MeldCode::UnknownCard,
            });
        }
        if self.scratch.pending_joker.is_some() {
            return Err(GameError::JokerMustBeUsed);
        }

        // the picked-up-card obligation outranks every closing rule
        if let Some(picked) = &self.scratch.picked_from_discard {
            if card == picked {
                if !(declare_duplicate && player.duplicate_of(picked).is_some()) {
                    return Err(GameError::DiscardIsPickedUpCard);
                }
            } else if player.holds(picked) && !(declare_duplicate && card.same_face(picked)) {
                return Err(GameError::PickedCardMustBePlayed);
            }
        }

        let would_close = player.hand.len() == 1;
        if self.active_count() >= 3
            && !would_close
            && self.melds.iter().any(|m| m.can_attach(card))
        {
            return Err(GameError::DiscardAttachesToTable);
        }
        if would_close && !self.first_round_complete {
            return Err(GameError::CannotCloseFirstRound);
        }
        if would_close
            && self.config.close_in_hand_bonus
            && self.scratch.opened_this_turn
            && self.scratch.played_after_open
        {
            return Err(GameError::CloseInHandNotAllowed);
        }
        Ok(would_close)
    }

    fn discard_card(
        &mut self,
        seat: usize,
        card: Card,
        declare_duplicate: bool,
    ) -> Result<Vec<GameEvent>, GameError> {
        let closes = self.check_discard(seat, &card, declare_duplicate)?;
        self.players[seat].remove_card(&card);
        self.discard.push(card);
        self.phase = TurnPhase::AwaitDiscard;

        let mut events = vec![GameEvent::Discard {
            player: self.players[seat].id.clone(),
            card,
        }];
        if closes {
            events.extend(self.close_hand(seat)?);
        } else {
            self.end_turn();
        }
        Ok(events)
    }

    fn close_hand(&mut self, seat: usize) -> Result<Vec<GameEvent>, GameError> {
        let closer = self.players[seat].id.clone();
        let close_in_hand = self.scratch.opened_this_turn;
        let mut events = vec![GameEvent::Closure {
            player: closer.clone(),
            close_in_hand,
        }];

        let settlement = score::settle_hand(&mut self.players, &closer, &self.config, close_in_hand);
        for (player, score) in &settlement.eliminated {
            events.push(GameEvent::Elimination {
                player: player.clone(),
                score: *score,
            });
        }
        events.push(GameEvent::HandEnd {
            hand_number: self.hand_number,
            closer: closer.clone(),
            scores: settlement.scores,
        });

        self.scratch.clear();
        self.phase = TurnPhase::TurnEnd;
        match settlement.winner {
            Some(winner) => {
                self.status = MatchStatus::Finished;
                self.winner = Some(winner.clone());
                events.push(GameEvent::MatchEnd { winner });
            }
            None => {
                self.status = MatchStatus::HandEnd;
                let next_dealer = self.next_active_after(&self.dealer.clone());
                self.dealer = self.players[next_dealer].id.clone();
                events.extend(self.deal_hand()?);
            }
        }
        Ok(events)
    }

    fn end_turn(&mut self) {
        self.scratch.clear();
        let opener = self.round_opener();
        let next = self.next_active_after(&self.current.clone());
        self.current = self.players[next].id.clone();
        if self.current == opener {
            // wrapped through the last seat of the round
            self.round_number += 1;
            self.first_round_complete = true;
        }
        self.phase = TurnPhase::AwaitDraw;
    }

    // --- auto-play ---

    /// Timeout substitution: draw from stock if the turn has not
    /// started, settle a stalled pending joker, then discard the
    /// highest-valued card that passes discard legality. When nothing
    /// passes, the lowest-valued card goes with a logged warning.
    fn auto_play(&mut self, seat: usize) -> Result<Vec<GameEvent>, GameError> {
        let mut events = Vec::new();
        match self.phase {
            TurnPhase::AwaitDraw => events.extend(self.draw_stock(seat)?),
            TurnPhase::AwaitPlay => {}
            other => return Err(GameError::WrongPhase(other)),
        }

        if let Some(joker) = self.scratch.pending_joker {
            let target = self
                .melds
                .iter()
                .position(|m| m.can_attach(&joker))
                .and_then(|idx| self.melds[idx].with_attached(joker).ok().map(|m| (idx, m)));
            match target {
                Some((idx, grown)) => {
                    self.melds[idx] = grown;
                    self.scratch.pending_joker = None;
                    events.push(GameEvent::Attach {
                        player: self.players[seat].id.clone(),
                        card: joker,
                        meld: idx,
                    });
                }
                None => {
                    tracing::warn!(
                        player = %self.players[seat].id,
                        "auto-play could not place the pending joker, returning it to hand"
                    );
                    self.players[seat].hand.push(joker);
                    self.scratch.pending_joker = None;
                }
            }
        }

        let mut ranked = self.players[seat].hand.clone();
        ranked.sort_by(|a, b| b.points().cmp(&a.points()).then(a.cmp(b)));
        for card in &ranked {
            if self.check_discard(seat, card, false).is_ok() {
                events.extend(self.discard_card(seat, *card, false)?);
                return Ok(events);
            }
        }

        let card = *ranked.last().ok_or(GameError::NoCards)?;
        tracing::warn!(
            player = %self.players[seat].id,
            card = %card,
            "no legal discard for auto-play, forcing the lowest card"
        );
        events.extend(self.force_discard(seat, card)?);
        Ok(events)
    }

    /// Discard without the legality gate; auto-play's last resort.
    fn force_discard(&mut self, seat: usize, card: Card) -> Result<Vec<GameEvent>, GameError> {
        self.players[seat].remove_card(&card);
        self.discard.push(card);
        self.phase = TurnPhase::AwaitDiscard;
        let mut events = vec![GameEvent::Discard {
            player: self.players[seat].id.clone(),
            card,
        }];
        let closes = self.players[seat].hand.is_empty()
            && self.first_round_complete
            && self.scratch.pending_joker.is_none();
        if closes {
            events.extend(self.close_hand(seat)?);
        } else {
            self.end_turn();
        }
        Ok(events)
    }
}
