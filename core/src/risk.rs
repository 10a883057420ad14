//! Risk/reward and profit helpers shared by the form and the codec.

use rust_decimal::Decimal;

use crate::types::{EntryKind, RiskReward};

/// Computes the risk/reward ratio of a planned trade.
///
/// Long trades need `stop < entry < target`, short trades need
/// `target < entry < stop`. Anything that is not a trade, or is missing one of
/// the three prices, is [`RiskReward::NotApplicable`].
pub fn risk_reward_ratio(
    kind: EntryKind,
    entry: Option<Decimal>,
    stop: Option<Decimal>,
    target: Option<Decimal>,
) -> RiskReward {
    let (entry, stop, target) = match (kind.is_trade(), entry, stop, target) {
        (true, Some(entry), Some(stop), Some(target)) => (entry, stop, target),
        _ => return RiskReward::NotApplicable,
    };

    let (risk, reward) = match kind {
        EntryKind::Long => {
            if entry <= stop || target <= entry {
                return RiskReward::Invalid;
            }
            (entry - stop, target - entry)
        }
        EntryKind::Short => {
            if entry >= stop || target >= entry {
                return RiskReward::Invalid;
            }
            (stop - entry, entry - target)
        }
        _ => return RiskReward::NotApplicable,
    };

    if risk <= Decimal::ZERO {
        return RiskReward::InvalidRisk;
    }

    match reward.checked_div(risk) {
        Some(ratio) => RiskReward::ratio(ratio),
        None => RiskReward::InvalidRisk,
    }
}

/// Realized P/L of a closed trade in account currency.
///
/// Returns `None` for non-trades and for positions that are still open.
pub fn estimate_profit_or_loss(
    kind: EntryKind,
    entry: Option<Decimal>,
    exit: Option<Decimal>,
    size: Option<Decimal>,
) -> Option<Decimal> {
    let (entry, exit, size) = (entry?, exit?, size?);
    match kind {
        EntryKind::Long => (exit - entry).checked_mul(size),
        EntryKind::Short => (entry - exit).checked_mul(size),
        _ => None,
    }
}
