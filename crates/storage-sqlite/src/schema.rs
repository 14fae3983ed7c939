// Diesel table definitions; kept in sync with the embedded migrations.

diesel::table! {
    trades (trade_key) {
        trade_key -> Text,
        ib_exec_id -> Nullable<Text>,
        trade_id -> Nullable<Text>,
        account_id -> Text,
        symbol -> Text,
        conid -> BigInt,
        side -> Text,
        quantity -> Text,
        trade_price -> Text,
        fees -> Text,
        currency -> Text,
        fx_rate_to_base -> Text,
        exec_ts -> Text,
        trade_date -> Nullable<Text>,
        listing_exchange -> Nullable<Text>,
        created_at -> Text,
    }
}

diesel::table! {
    positions (account_id, conid) {
        account_id -> Text,
        conid -> BigInt,
        symbol -> Text,
        currency -> Text,
        quantity -> Text,
        avg_cost_base -> Text,
        date_added -> Nullable<Text>,
        updated_at -> Text,
    }
}

diesel::table! {
    open_positions (holder_id, conid) {
        holder_id -> Text,
        conid -> BigInt,
        account_id -> Nullable<Text>,
        symbol -> Text,
        name -> Nullable<Text>,
        currency -> Text,
        quantity -> Text,
        mark_price -> Nullable<Text>,
        cost_basis_price -> Nullable<Text>,
        cost_basis_money -> Nullable<Text>,
        position_value -> Nullable<Text>,
        fx_rate_to_base -> Nullable<Text>,
        report_date -> Nullable<Text>,
        date_open -> Nullable<Text>,
        price_as_of -> Nullable<Text>,
        updated_at -> Text,
    }
}

diesel::table! {
    cash_balances (holder_id, currency, level_of_detail) {
        holder_id -> Text,
        account_id -> Nullable<Text>,
        currency -> Text,
        // Empty string stands in for an absent level-of-detail so the
        // column can participate in the composite primary key.
        level_of_detail -> Text,
        ending_cash -> Nullable<Text>,
        ending_settled_cash -> Nullable<Text>,
        updated_at -> Text,
    }
}

diesel::table! {
    holders (id) {
        id -> Text,
        base_currency -> Nullable<Text>,
        flex_token_enc -> Nullable<Text>,
        flex_query_id_enc -> Nullable<Text>,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    trades,
    positions,
    open_positions,
    cash_balances,
    holders,
);
