//! Sequence and combination validation, the opening test, and the
//! attach / joker-substitution legality checks.
//!
//! Everything here is pure: candidate card lists come in, a validated
//! meld (or a rejection code) comes out. The turn engine decides when
//! the results may be committed.

use crate::card::{Card, Rank};
use crate::error::{GameError, MeldCode};
use crate::player::PlayerId;
use itertools::Itertools;

/// Longest possible sequence: A,2..K,A with both ace placements.
const SEQUENCE_MAX: usize = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MeldKind {
    #[strum(serialize = "sequence")]
    Sequence,
    #[strum(serialize = "combination")]
    Combination,
}

/// A meld on the table. `owner` is the player who first laid it down,
/// kept for display only; anybody who has opened may attach to it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Meld {
    pub kind: MeldKind,
    pub cards: Vec<Card>,
    pub owner: PlayerId,
}

impl Meld {
    /// Validate a candidate card list and build the meld. The kind is
    /// inferred: same-rank naturals in a short list make a combination,
    /// anything else is judged as a sequence.
    pub fn try_new(cards: Vec<Card>, owner: impl Into<PlayerId>) -> Result<Self, MeldCode> {
        let (kind, _) = validate_cards(&cards)?;
        Ok(Self {
            kind,
            cards,
            owner: owner.into(),
        })
    }

    /// Point total of the meld, joker counted at the rank it fills.
    pub fn points(&self) -> u32 {
        validate_cards(&self.cards).map(|(_, pts)| pts).unwrap_or(0)
    }

    pub fn has_joker(&self) -> bool {
        self.cards.iter().any(Card::is_joker)
    }

    /// Attach legality: `card` joins the meld in some position and the
    /// result is still a valid meld of the same kind.
    pub fn can_attach(&self, card: &Card) -> bool {
        self.with_attached(*card).is_ok()
    }

    /// The meld with `card` attached, or the rejection code. Sequences
    /// accept the card wherever it extends the run; combinations take
    /// it in the common-rank slot.
    pub fn with_attached(&self, card: Card) -> Result<Meld, MeldCode> {
        if card.is_joker() && self.has_joker() {
            return Err(MeldCode::MultipleJokers);
        }
        for pos in 0..=self.cards.len() {
            let mut cards = self.cards.clone();
            cards.insert(pos, card);
            if let Ok((kind, _)) = validate_cards(&cards) {
                if kind == self.kind {
                    return Ok(Meld {
                        kind,
                        cards,
                        owner: self.owner.clone(),
                    });
                }
            }
        }
        // No position works; report the failure of the plain append.
        let mut cards = self.cards.clone();
        cards.push(card);
        match validate_cards(&cards) {
            Err(code) => Err(code),
            Ok(_) => Err(MeldCode::NonConsecutive),
        }
    }

    /// Replace this meld's joker with `held`, returning the repaired
    /// meld and the freed joker. Legal only when `held` is exactly the
    /// card the joker stands for (deck index immaterial) so that the
    /// result revalidates as the same kind.
    pub fn substitute_joker(&self, held: &Card) -> Result<(Meld, Card), MeldCode> {
        if held.is_joker() {
            return Err(MeldCode::UnknownCard);
        }
        let pos = self
            .cards
            .iter()
            .position(Card::is_joker)
            .ok_or(MeldCode::UnknownCard)?;
        let joker = self.cards[pos];
        let mut cards = self.cards.clone();
        cards[pos] = *held;
        let (kind, _) = validate_cards(&cards)?;
        if kind != self.kind {
            return Err(MeldCode::UnknownCard);
        }
        Ok((
            Meld {
                kind,
                cards,
                owner: self.owner.clone(),
            },
            joker,
        ))
    }
}

/// Classify and validate a candidate. Returns the inferred kind and the
/// point total, or the first rejection code.
pub fn validate_cards(cards: &[Card]) -> Result<(MeldKind, u32), MeldCode> {
    if cards.len() < 3 {
        return Err(MeldCode::TooShort);
    }
    let naturals: Vec<&Card> = cards.iter().filter(|c| !c.is_joker()).collect();
    if naturals.is_empty() {
        return Err(MeldCode::OnlyJokers);
    }
    if cards.len() - naturals.len() > 1 {
        return Err(MeldCode::MultipleJokers);
    }
    let same_rank = naturals.iter().map(|c| c.rank()).all_equal();
    if same_rank {
        if cards.len() > 4 {
            return Err(MeldCode::TooLong);
        }
        validate_combination(cards, &naturals).map(|pts| (MeldKind::Combination, pts))
    } else {
        validate_sequence(cards, &naturals).map(|pts| (MeldKind::Sequence, pts))
    }
}

fn validate_combination(cards: &[Card], naturals: &[&Card]) -> Result<u32, MeldCode> {
    if !naturals
        .iter()
        .map(|c| c.suit().expect("natural card"))
        .all_unique()
    {
        return Err(MeldCode::SameSuitInCombination);
    }
    let rank = naturals[0].rank().expect("natural card");
    // The joker takes the common rank for point accounting.
    Ok(rank.points() * cards.len() as u32)
}

fn validate_sequence(cards: &[Card], naturals: &[&Card]) -> Result<u32, MeldCode> {
    if cards.len() > SEQUENCE_MAX {
        return Err(MeldCode::TooLong);
    }
    if !naturals
        .iter()
        .map(|c| c.suit().expect("natural card"))
        .all_equal()
    {
        return Err(MeldCode::MixedSuitsInSequence);
    }

    // The run occupies positions base..base+len-1 on the 1..=14 scale,
    // where 1 is a low ace and 14 a high ace. Two naturals pin the base,
    // so scanning the few candidates is enough.
    let len = cards.len() as u8;
    'base: for base in 1..=(15 - len) {
        for (i, card) in cards.iter().enumerate() {
            let slot = base + i as u8;
            if let Some(rank) = card.rank() {
                let fits = rank.order() == slot || (rank == Rank::Ace && slot == 14);
                if !fits {
                    continue 'base;
                }
            }
        }
        let points = cards
            .iter()
            .enumerate()
            .map(|(i, _)| slot_points(base + i as u8))
            .sum();
        return Ok(points);
    }

    if wraps(cards) {
        Err(MeldCode::Wrap)
    } else {
        Err(MeldCode::NonConsecutive)
    }
}

/// Point value of a sequence slot: low ace 1, high ace 11, faces 10.
fn slot_points(slot: u8) -> u32 {
    match slot {
        1 => 1,
        14 => 11,
        11..=13 => 10,
        pip => pip as u32,
    }
}

/// True when the cards only line up modulo 13, i.e. the run would be
/// consecutive if it were allowed to pass through the K,A boundary.
fn wraps(cards: &[Card]) -> bool {
    let naturals: Vec<(i16, i16)> = cards
        .iter()
        .enumerate()
        .filter_map(|(i, c)| c.rank().map(|r| (i as i16, r.order() as i16)))
        .collect();
    naturals.len() >= 2
        && naturals
            .iter()
            .tuple_windows()
            .all(|((p1, o1), (p2, o2))| (o2 - o1).rem_euclid(13) == (p2 - p1) % 13)
}

/// The opening test: every candidate must validate on its own and the
/// counted total must reach the threshold. With `without_joker` set,
/// only clean melds count toward the threshold, though the full total
/// is still what goes on the table.
pub fn validate_opening(
    melds: &[Meld],
    threshold: u32,
    without_joker: bool,
) -> Result<u32, GameError> {
    let total: u32 = melds.iter().map(Meld::points).sum();
    let counted: u32 = if without_joker {
        melds
            .iter()
            .filter(|m| !m.has_joker())
            .map(Meld::points)
            .sum()
    } else {
        total
    };
    if counted < threshold {
        return Err(GameError::OpeningBelowThreshold { points: counted });
    }
    Ok(total)
}
