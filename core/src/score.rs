//! End-of-hand settlement: hand totals onto cumulative scores,
//! elimination detection, and match-winner detection.

use crate::config::Config;
use crate::event::HandScore;
use crate::player::{Player, PlayerId};

/// Outcome of scoring one finished hand.
#[derive(Debug, Clone, PartialEq)]
pub struct HandSettlement {
    /// One line per non-eliminated player, in seating order.
    pub scores: Vec<HandScore>,
    /// Players newly eliminated by this hand, with their final totals.
    pub eliminated: Vec<(PlayerId, u32)>,
    /// Set when exactly one non-eliminated player remains.
    pub winner: Option<PlayerId>,
}

/// Score a closed hand. The closer takes 0; everybody else adds the
/// loose value of their remaining cards. Under the close-in-hand bonus
/// the opponents' totals double, and an opponent who never opened pays
/// the fixed penalty instead.
pub fn settle_hand(
    players: &mut [Player],
    closer: &PlayerId,
    config: &Config,
    close_in_hand: bool,
) -> HandSettlement {
    let bonus = close_in_hand && config.close_in_hand_bonus;
    let mut scores = Vec::new();
    let mut eliminated = Vec::new();

    for player in players.iter_mut().filter(|p| !p.is_eliminated) {
        let delta = if player.id == *closer {
            0
        } else if bonus && !player.has_opened {
            config.never_acted_penalty
        } else if bonus {
            player.hand_points() * 2
        } else {
            player.hand_points()
        };
        player.score += delta;
        scores.push(HandScore {
            player: player.id.clone(),
            delta,
            total: player.score,
        });
        if player.score >= config.elimination_score {
            player.is_eliminated = true;
            eliminated.push((player.id.clone(), player.score));
        }
    }

    let mut standing = players.iter().filter(|p| !p.is_eliminated);
    let winner = match (standing.next(), standing.next()) {
        (Some(last), None) => Some(last.id.clone()),
        _ => None,
    };

    HandSettlement {
        scores,
        eliminated,
        winner,
    }
}
