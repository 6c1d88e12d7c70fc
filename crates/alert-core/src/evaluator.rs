//! Price evaluation against a configured limit.
//!
//! Transition rules for one observation:
//! - `Armed` and `price >= limit` => crossed (notify, then mark fired).
//! - `Armed` and `price < limit`  => nothing.
//! - `Fired`                      => nothing, whatever the price.
//!
//! The threshold is inclusive: a price equal to the limit crosses it.

use rust_decimal::Decimal;

use crate::alert_state::AlertState;
use crate::messages::AlertEvent;
use crate::ticker::Ticker;

/// Result of evaluating one price observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    /// Armed ticker reached its limit; the event should be delivered.
    Crossed(AlertEvent),

    /// Armed ticker is still below its limit.
    Below,

    /// Ticker already fired in this arming period.
    AlreadyFired,
}

/// Evaluate `price` for `ticker` given its current `limit` and `state`.
pub fn evaluate(ticker: &Ticker, limit: Decimal, state: AlertState, price: Decimal) -> Evaluation {
    match state {
        AlertState::Fired => Evaluation::AlreadyFired,
        AlertState::Armed if price >= limit => Evaluation::Crossed(AlertEvent {
            ticker: ticker.clone(),
            price,
            limit,
        }),
        AlertState::Armed => Evaluation::Below,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn xyz() -> Ticker {
        Ticker::parse("XYZ").unwrap()
    }

    #[test]
    fn equal_price_crosses() {
        let eval = evaluate(&xyz(), dec!(65.00), AlertState::Armed, dec!(65.00));
        assert_eq!(
            eval,
            Evaluation::Crossed(AlertEvent {
                ticker: xyz(),
                price: dec!(65.00),
                limit: dec!(65.00),
            })
        );
    }

    #[test]
    fn just_below_stays_armed() {
        assert_eq!(
            evaluate(&xyz(), dec!(65.00), AlertState::Armed, dec!(64.99)),
            Evaluation::Below
        );
    }

    #[test]
    fn fired_ignores_price() {
        assert_eq!(
            evaluate(&xyz(), dec!(65.00), AlertState::Fired, dec!(90)),
            Evaluation::AlreadyFired
        );
        assert_eq!(
            evaluate(&xyz(), dec!(65.00), AlertState::Fired, dec!(1)),
            Evaluation::AlreadyFired
        );
    }
}
