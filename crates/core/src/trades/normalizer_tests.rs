use rust_decimal_macros::dec;

use crate::flex::{FlexTrade, TransactionTax};
use crate::trades::{normalize_trades, TradeSide};

fn raw_trade() -> FlexTrade {
    FlexTrade {
        trade_id: Some("100001".to_string()),
        ib_exec_id: Some("0000e1a9.657b.01.01".to_string()),
        account_id: Some("U1234567".to_string()),
        trade_date: Some("20240115".to_string()),
        date_time: Some("20240115;143001".to_string()),
        buy_sell: Some("BUY".to_string()),
        quantity: Some(dec!(100)),
        trade_price: Some(dec!(10)),
        ib_commission: Some(dec!(-1)),
        symbol: Some("ACME".to_string()),
        conid: Some(265598),
        currency: Some("usd".to_string()),
        ..Default::default()
    }
}

#[test]
fn normalizes_a_valid_trade() {
    let tax = TransactionTax {
        trade_id: Some("100001".to_string()),
        tax_amount: Some(dec!(-0.35)),
        ..Default::default()
    };
    let outcome = normalize_trades(&[raw_trade()], &[tax]);

    assert_eq!(outcome.skips.total(), 0);
    let trade = &outcome.trades[0];
    assert_eq!(trade.trade_key, "ibExec:0000e1a9.657b.01.01");
    assert_eq!(trade.side, TradeSide::Buy);
    assert_eq!(trade.quantity, dec!(100));
    // Fees = |commission| + |matched tax|.
    assert_eq!(trade.fees, dec!(1.35));
    assert_eq!(trade.currency, "USD");
    assert_eq!(trade.exec_ts.to_rfc3339(), "2024-01-15T14:30:01+00:00");
}

#[test]
fn falls_back_to_trade_id_key() {
    let mut raw = raw_trade();
    raw.ib_exec_id = None;
    let outcome = normalize_trades(&[raw], &[]);
    assert_eq!(outcome.trades[0].trade_key, "trade:100001");
}

#[test]
fn identical_execution_ids_produce_identical_keys() {
    let a = raw_trade();
    let mut b = raw_trade();
    b.trade_id = Some("200002".to_string());
    let outcome = normalize_trades(&[a, b], &[]);
    assert_eq!(outcome.trades[0].trade_key, outcome.trades[1].trade_key);
}

#[test]
fn sell_quantities_are_stored_as_magnitude() {
    let mut raw = raw_trade();
    raw.buy_sell = Some("SELL".to_string());
    raw.quantity = Some(dec!(-40));
    let outcome = normalize_trades(&[raw], &[]);
    assert_eq!(outcome.trades[0].side, TradeSide::Sell);
    assert_eq!(outcome.trades[0].quantity, dec!(40));
}

#[test]
fn exec_ts_falls_back_to_trade_date_midnight() {
    let mut raw = raw_trade();
    raw.date_time = None;
    let outcome = normalize_trades(&[raw], &[]);
    assert_eq!(
        outcome.trades[0].exec_ts.to_rfc3339(),
        "2024-01-15T00:00:00+00:00"
    );
}

#[test]
fn tax_rows_keyed_by_order_id_do_not_match_trade_ids() {
    // The tax map also carries order-id entries, but matching at
    // normalization time goes through the trade id.
    let tax = TransactionTax {
        order_id: Some("900009".to_string()),
        tax_amount: Some(dec!(-2)),
        ..Default::default()
    };
    let outcome = normalize_trades(&[raw_trade()], &[tax]);
    assert_eq!(outcome.trades[0].fees, dec!(1));
}

#[test]
fn multiple_taxes_for_one_trade_are_summed() {
    let taxes = vec![
        TransactionTax {
            trade_id: Some("100001".to_string()),
            tax_amount: Some(dec!(-0.35)),
            ..Default::default()
        },
        TransactionTax {
            trade_id: Some("100001".to_string()),
            tax_amount: Some(dec!(0.15)),
            ..Default::default()
        },
    ];
    let outcome = normalize_trades(&[raw_trade()], &taxes);
    assert_eq!(outcome.trades[0].fees, dec!(1.50));
}

#[test]
fn drops_are_tallied_by_first_failing_check() {
    let mut missing_account = raw_trade();
    missing_account.account_id = None;
    let mut missing_symbol = raw_trade();
    missing_symbol.symbol = Some(String::new());
    let mut missing_conid = raw_trade();
    missing_conid.conid = None;
    let mut missing_side = raw_trade();
    missing_side.buy_sell = Some("EXERCISE".to_string());
    let mut missing_quantity = raw_trade();
    missing_quantity.quantity = Some(dec!(0));
    let mut missing_price = raw_trade();
    missing_price.trade_price = None;
    let mut missing_key = raw_trade();
    missing_key.trade_id = None;
    missing_key.ib_exec_id = None;
    // Both account id and symbol absent: only the first check counts.
    let mut doubly_bad = raw_trade();
    doubly_bad.account_id = None;
    doubly_bad.symbol = None;

    let raw = vec![
        raw_trade(),
        missing_account,
        missing_symbol,
        missing_conid,
        missing_side,
        missing_quantity,
        missing_price,
        missing_key,
        doubly_bad,
    ];
    let total = raw.len();
    let outcome = normalize_trades(&raw, &[]);

    assert_eq!(outcome.skips.missing_account_id, 2);
    assert_eq!(outcome.skips.missing_symbol, 1);
    assert_eq!(outcome.skips.missing_conid, 1);
    assert_eq!(outcome.skips.missing_side, 1);
    assert_eq!(outcome.skips.missing_quantity, 1);
    assert_eq!(outcome.skips.missing_price, 1);
    assert_eq!(outcome.skips.missing_key, 1);
    assert_eq!(
        outcome.skips.total() as usize + outcome.trades.len(),
        total
    );
}
