use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::flex::parse_statement;

const FULL_STATEMENT: &str = r#"<FlexQueryResponse queryName="portfolio" type="AF">
<FlexStatements count="1">
<FlexStatement accountId="U1234567" fromDate="20240101" toDate="20240131" whenGenerated="20240201;053000">
<AccountInformation accountId="U1234567" currency="EUR" name="Jane Trader" accountType="Individual" customerType="Individual" />
<CashReport>
<CashReportCurrency accountId="U1234567" currency="BASE_SUMMARY" endingCash="1000.50" endingSettledCash="990.10" levelOfDetail="BaseCurrency" />
<CashReportCurrency accountId="U1234567" currency="EUR" endingCash="800" endingSettledCash="800" levelOfDetail="Currency" />
<CashReportCurrency accountId="U1234567" currency="USD" endingCash="218" endingSettledCash="208" levelOfDetail="Currency" />
</CashReport>
<Trades>
<Trade tradeID="100001" ibExecID="0000e1a9.657b.01.01" accountId="U1234567" tradeDate="20240115" dateTime="20240115;143001" buySell="BUY" quantity="100" tradePrice="10" ibCommission="-1" symbol="ACME" description="ACME CORP" conid="265598" assetCategory="STK" listingExchange="NASDAQ" currency="USD" fxRateToBase="0.92" levelOfDetail="EXECUTION" />
<Trade tradeID="100002" accountId="U1234567" tradeDate="20240116" buySell="SELL" quantity="-40" tradePrice="12.5" ibCommission="-1.1" symbol="ACME" conid="265598" assetCategory="ETF" currency="USD" levelOfDetail="EXECUTION" />
<Trade tradeID="100003" accountId="U1234567" symbol="ACME" conid="265598" assetCategory="STK" buySell="SELL" quantity="-40" tradePrice="12.5" levelOfDetail="ORDER" />
<Trade tradeID="100004" accountId="U1234567" symbol="ESU4" conid="551601" assetCategory="FUT" buySell="BUY" quantity="1" tradePrice="5000" levelOfDetail="EXECUTION" />
</Trades>
<TransactionTaxes>
<TransactionTax tradeID="100002" taxAmount="-0.35" taxDescription="Transaction tax" currency="EUR" conid="265598" symbol="ACME" date="20240116" />
</TransactionTaxes>
<OpenPositions>
<OpenPosition accountId="U1234567" currency="USD" fxRateToBase="0.92" assetCategory="STK" symbol="ACME" description="ACME CORP" conid="265598" markPrice="11.25" position="60" costBasisPrice="10.01" costBasisMoney="600.6" positionValue="675" side="Long" levelOfDetail="SUMMARY" reportDate="20240131" openDateTime="20240115;143001" />
<OpenPosition accountId="U1234567" currency="EUR" assetCategory="OPT" symbol="DAI DEC24 70 C" conid="700001" markPrice="2.5" position="-2" />
</OpenPositions>
</FlexStatement>
</FlexStatements>
</FlexQueryResponse>"#;

#[test]
fn parses_full_statement() {
    let statement = parse_statement(FULL_STATEMENT).unwrap();

    assert_eq!(statement.info.account_id.as_deref(), Some("U1234567"));
    assert_eq!(
        statement.info.generated_at().unwrap().to_rfc3339(),
        "2024-02-01T05:30:00+00:00"
    );

    let account = statement.account.as_ref().unwrap();
    assert_eq!(account.currency.as_deref(), Some("EUR"));
    assert_eq!(account.name.as_deref(), Some("Jane Trader"));

    assert_eq!(statement.cash_report.len(), 3);
    assert!(statement.cash_report[0].is_base_summary());
    assert_eq!(statement.cash_report[0].ending_cash, Some(dec!(1000.50)));

    // Both equity executions survive; the ORDER row and the futures fill
    // are filtered with their stages counted.
    assert_eq!(statement.stats.total_trade_tags, 4);
    assert_eq!(statement.stats.execution_trades, 3);
    assert_eq!(statement.stats.equities_trades, 2);
    assert_eq!(statement.stats.taxes, 1);
    assert_eq!(statement.trades.len(), 2);

    let first = &statement.trades[0];
    assert_eq!(first.ib_exec_id.as_deref(), Some("0000e1a9.657b.01.01"));
    assert_eq!(first.conid, Some(265598));
    assert_eq!(first.fx_rate_to_base, dec!(0.92));
    assert_eq!(first.ib_commission, Some(dec!(-1)));

    // FX-to-base defaults to 1 when absent on a trade record.
    assert_eq!(statement.trades[1].fx_rate_to_base, Decimal::ONE);
    assert_eq!(statement.trades[1].quantity, Some(dec!(-40)));

    // Open positions are returned unfiltered; category filtering is the
    // snapshot cache's job.
    assert_eq!(statement.open_positions.len(), 2);
    assert_eq!(
        statement.open_positions[1].asset_category.as_deref(),
        Some("OPT")
    );
}

#[test]
fn single_and_zero_trade_elements_normalize_to_sequences() {
    let none = r#"<FlexQueryResponse><FlexStatements count="1">
        <FlexStatement accountId="U1"><Trades></Trades></FlexStatement>
        </FlexStatements></FlexQueryResponse>"#;
    let one = r#"<FlexQueryResponse><FlexStatements count="1">
        <FlexStatement accountId="U1"><Trades>
        <Trade tradeID="1" accountId="U1" symbol="A" conid="7" buySell="BUY" quantity="1" tradePrice="2" assetCategory="STK" levelOfDetail="EXECUTION" />
        </Trades></FlexStatement></FlexStatements></FlexQueryResponse>"#;

    assert_eq!(parse_statement(none).unwrap().trades.len(), 0);
    assert_eq!(parse_statement(one).unwrap().trades.len(), 1);
    assert_eq!(parse_statement(FULL_STATEMENT).unwrap().trades.len(), 2);
}

#[test]
fn missing_sections_yield_empty_collections() {
    let minimal = r#"<FlexQueryResponse><FlexStatements count="1">
        <FlexStatement accountId="U1" fromDate="20240101" toDate="20240131" />
        </FlexStatements></FlexQueryResponse>"#;
    let statement = parse_statement(minimal).unwrap();
    assert!(statement.account.is_none());
    assert!(statement.cash_report.is_empty());
    assert!(statement.trades.is_empty());
    assert!(statement.taxes.is_empty());
    assert!(statement.open_positions.is_empty());
    assert_eq!(statement.stats.total_trade_tags, 0);
}

#[test]
fn empty_attributes_map_to_none() {
    let doc = r#"<FlexQueryResponse><FlexStatements count="1">
        <FlexStatement accountId="U1"><Trades>
        <Trade tradeID="1" accountId="U1" symbol="" conid="7" buySell="BUY" quantity="1" tradePrice="2" assetCategory="STK" levelOfDetail="EXECUTION" />
        </Trades></FlexStatement></FlexStatements></FlexQueryResponse>"#;
    let statement = parse_statement(doc).unwrap();
    assert_eq!(statement.trades[0].symbol, None);
}

#[test]
fn mismatched_markup_is_a_parse_error() {
    let broken = r#"<FlexQueryResponse><Trades></Trade></FlexQueryResponse>"#;
    assert!(parse_statement(broken).is_err());
}
