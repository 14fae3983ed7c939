use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::positions::rebuild_positions;
use crate::trades::{NormalizedTrade, TradeSide};

fn trade(seq: i64, side: TradeSide, quantity: Decimal, price: Decimal, fees: Decimal) -> NormalizedTrade {
    trade_fx(seq, side, quantity, price, fees, Decimal::ONE)
}

fn trade_fx(
    seq: i64,
    side: TradeSide,
    quantity: Decimal,
    price: Decimal,
    fees: Decimal,
    fx: Decimal,
) -> NormalizedTrade {
    let base_ts = Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, 0).unwrap();
    NormalizedTrade {
        trade_key: format!("trade:{seq}"),
        ib_exec_id: None,
        trade_id: Some(seq.to_string()),
        account_id: "U1234567".to_string(),
        symbol: "ACME".to_string(),
        conid: 265598,
        side,
        quantity,
        trade_price: price,
        fees,
        currency: "USD".to_string(),
        fx_rate_to_base: fx,
        exec_ts: base_ts + Duration::minutes(seq),
        trade_date: None,
        listing_exchange: None,
    }
}

#[test]
fn buy_folds_fees_into_average_cost() {
    let positions = rebuild_positions(
        "USD",
        &[trade(1, TradeSide::Buy, dec!(100), dec!(10), dec!(1))],
    );
    assert_eq!(positions.len(), 1);
    let p = &positions[0];
    assert_eq!(p.quantity, dec!(100));
    // (100 x 10 + 1) / 100
    assert_eq!(p.avg_cost_base, dec!(10.01));
    assert!(p.date_added.is_some());
}

#[test]
fn sell_through_zero_opens_short_at_price_without_fees() {
    let positions = rebuild_positions(
        "USD",
        &[
            trade(1, TradeSide::Buy, dec!(100), dec!(10), dec!(1)),
            trade(2, TradeSide::Sell, dec!(150), dec!(12), dec!(0.75)),
        ],
    );
    let p = &positions[0];
    assert_eq!(p.quantity, dec!(-50));
    // The sell fee is excluded from the new short basis; the mirrored
    // buy-through-zero path includes it. Asymmetric on purpose.
    assert_eq!(p.avg_cost_base, dec!(12));
    assert_eq!(
        p.date_added.unwrap(),
        Utc.with_ymd_and_hms(2024, 1, 15, 14, 32, 0).unwrap()
    );
}

#[test]
fn exact_close_clears_basis_and_open_date() {
    let positions = rebuild_positions(
        "USD",
        &[
            trade(1, TradeSide::Buy, dec!(100), dec!(10), dec!(1)),
            trade(2, TradeSide::Sell, dec!(100), dec!(12), dec!(1)),
        ],
    );
    let p = &positions[0];
    assert_eq!(p.quantity, Decimal::ZERO);
    assert_eq!(p.avg_cost_base, Decimal::ZERO);
    assert!(p.date_added.is_none());
}

#[test]
fn shorting_tracks_net_proceeds_basis() {
    let positions = rebuild_positions(
        "USD",
        &[trade(1, TradeSide::Sell, dec!(50), dec!(10), dec!(1))],
    );
    let p = &positions[0];
    assert_eq!(p.quantity, dec!(-50));
    // (50 x 10 - 1) / 50
    assert_eq!(p.avg_cost_base, dec!(9.98));
}

#[test]
fn exact_cover_yields_flat_never_a_spurious_long() {
    let positions = rebuild_positions(
        "USD",
        &[
            trade(1, TradeSide::Sell, dec!(50), dec!(10), dec!(1)),
            trade(2, TradeSide::Buy, dec!(50), dec!(9), dec!(1)),
        ],
    );
    let p = &positions[0];
    assert_eq!(p.quantity, Decimal::ZERO);
    assert_eq!(p.avg_cost_base, Decimal::ZERO);
    assert!(p.date_added.is_none());
}

#[test]
fn partial_cover_keeps_short_average() {
    let positions = rebuild_positions(
        "USD",
        &[
            trade(1, TradeSide::Sell, dec!(50), dec!(10), dec!(1)),
            trade(2, TradeSide::Buy, dec!(20), dec!(9), dec!(1)),
        ],
    );
    let p = &positions[0];
    assert_eq!(p.quantity, dec!(-30));
    assert_eq!(p.avg_cost_base, dec!(9.98));
}

#[test]
fn buy_through_zero_prices_new_long_from_excess_with_fees() {
    let positions = rebuild_positions(
        "EUR",
        &[
            trade(1, TradeSide::Sell, dec!(50), dec!(10), dec!(0)),
            trade(2, TradeSide::Buy, dec!(80), dec!(9), dec!(0.8)),
        ],
    );
    let p = &positions[0];
    assert_eq!(p.quantity, dec!(30));
    // (30 x 9 + 0.8) / 30
    assert_eq!(p.avg_cost_base, dec!(270.8) / dec!(30));
    // Crossing through zero re-expresses the position in base currency.
    assert_eq!(p.currency, "EUR");
    assert_eq!(
        p.date_added.unwrap(),
        Utc.with_ymd_and_hms(2024, 1, 15, 14, 32, 0).unwrap()
    );
}

#[test]
fn converts_price_and_fees_with_the_trade_fx_rate() {
    let positions = rebuild_positions(
        "EUR",
        &[trade_fx(
            1,
            TradeSide::Buy,
            dec!(10),
            dec!(100),
            dec!(1),
            dec!(0.9),
        )],
    );
    // (10 x 90 + 0.9) / 10
    assert_eq!(positions[0].avg_cost_base, dec!(90.09));
}

#[test]
fn keys_positions_by_account_and_instrument() {
    let mut other_account = trade(1, TradeSide::Buy, dec!(5), dec!(10), dec!(0));
    other_account.account_id = "U7654321".to_string();
    let mut other_instrument = trade(2, TradeSide::Buy, dec!(5), dec!(10), dec!(0));
    other_instrument.conid = 551601;

    let positions = rebuild_positions(
        "USD",
        &[
            trade(3, TradeSide::Buy, dec!(5), dec!(10), dec!(0)),
            other_account,
            other_instrument,
        ],
    );
    assert_eq!(positions.len(), 3);
    // Deterministic output order: account, then conid.
    assert_eq!(positions[0].account_id, "U1234567");
    assert_eq!(positions[0].conid, 265598);
    assert_eq!(positions[1].conid, 551601);
    assert_eq!(positions[2].account_id, "U7654321");
}

#[test]
fn reopening_after_flat_gets_a_fresh_open_date() {
    let positions = rebuild_positions(
        "USD",
        &[
            trade(1, TradeSide::Buy, dec!(10), dec!(10), dec!(0)),
            trade(2, TradeSide::Sell, dec!(10), dec!(11), dec!(0)),
            trade(3, TradeSide::Buy, dec!(4), dec!(12), dec!(0)),
        ],
    );
    let p = &positions[0];
    assert_eq!(p.quantity, dec!(4));
    assert_eq!(p.avg_cost_base, dec!(12));
    assert_eq!(
        p.date_added.unwrap(),
        Utc.with_ymd_and_hms(2024, 1, 15, 14, 33, 0).unwrap()
    );
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    fn arbitrary_trades() -> impl Strategy<Value = Vec<NormalizedTrade>> {
        prop::collection::vec(
            (any::<bool>(), 1u32..50, 1u32..200, 0u32..3),
            1..12,
        )
        .prop_map(|specs| {
            specs
                .into_iter()
                .enumerate()
                .map(|(i, (buy, qty, price, fee))| {
                    trade(
                        i as i64,
                        if buy { TradeSide::Buy } else { TradeSide::Sell },
                        Decimal::from(qty),
                        Decimal::from(price),
                        Decimal::from(fee),
                    )
                })
                .collect()
        })
    }

    proptest! {
        /// Closing any sequence back to zero clears the basis and open date.
        #[test]
        fn flat_positions_carry_no_basis(mut trades in arbitrary_trades()) {
            let interim = rebuild_positions("USD", &trades);
            let final_qty = interim[0].quantity;
            if final_qty > Decimal::ZERO {
                trades.push(trade(99, TradeSide::Sell, final_qty, dec!(10), dec!(0)));
            } else if final_qty < Decimal::ZERO {
                trades.push(trade(99, TradeSide::Buy, final_qty.abs(), dec!(10), dec!(0)));
            }

            let positions = rebuild_positions("USD", &trades);
            prop_assert_eq!(positions[0].quantity, Decimal::ZERO);
            prop_assert_eq!(positions[0].avg_cost_base, Decimal::ZERO);
            prop_assert!(positions[0].date_added.is_none());
        }

        /// Open dates only exist on open positions.
        #[test]
        fn open_date_tracks_openness(trades in arbitrary_trades()) {
            let positions = rebuild_positions("USD", &trades);
            for p in positions {
                if p.quantity.is_zero() {
                    prop_assert!(p.date_added.is_none());
                } else {
                    prop_assert!(p.date_added.is_some());
                }
            }
        }
    }
}
