//! Response normalizers.
//!
//! Each endpoint owns one pure function turning the raw JSON payload into a
//! typed value. This is the only place strings become `Decimal`s and
//! strings/integers become timestamps. Normalizers only ever see payloads
//! that passed the executor's `error` check.

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use stampbot_core::*;

/// Signature shared by every normalizer in the catalog.
pub type Normalizer<T> = fn(Value) -> Result<T, NormalizeError>;

const DATETIME_FRACTIONAL: &str = "%Y-%m-%d %H:%M:%S%.f";
const DATETIME_WHOLE: &str = "%Y-%m-%d %H:%M:%S";

type Record = Map<String, Value>;

// ---------------------------------------------------------------------------
// Field coercions
// ---------------------------------------------------------------------------

fn shape_error(expected: &'static str, value: &Value) -> NormalizeError {
    NormalizeError::UnexpectedShape {
        expected,
        value: value.to_string(),
    }
}

fn as_record(value: &Value) -> Result<&Record, NormalizeError> {
    value.as_object().ok_or_else(|| shape_error("object", value))
}

fn as_rows(value: &Value) -> Result<&Vec<Value>, NormalizeError> {
    value.as_array().ok_or_else(|| shape_error("array", value))
}

fn field<'a>(record: &'a Record, key: &str) -> Result<&'a Value, NormalizeError> {
    match record.get(key) {
        Some(Value::Null) | None => Err(NormalizeError::MissingField(key.to_string())),
        Some(value) => Ok(value),
    }
}

/// Parse a decimal from a JSON string or number without going through `f64`.
pub fn parse_decimal(name: &str, value: &Value) -> Result<Decimal, NormalizeError> {
    let invalid = || NormalizeError::InvalidDecimal {
        field: name.to_string(),
        value: value.to_string(),
    };
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return Err(invalid()),
    };
    Decimal::from_str_exact(&text)
        .ok()
        .or_else(|| exact_scientific(&text))
        .ok_or_else(invalid)
}

/// `1.5e-3` style input, refusing anything that would need rounding.
fn exact_scientific(text: &str) -> Option<Decimal> {
    let (mantissa, exponent) = text.split_once(|c| c == 'e' || c == 'E')?;
    let mut value = Decimal::from_str_exact(mantissa).ok()?;
    let exponent: i64 = exponent.parse().ok()?;
    let scale = i64::from(value.scale()) - exponent;
    if scale >= 0 {
        value.set_scale(u32::try_from(scale).ok()?).ok()?;
        return Some(value);
    }
    value.set_scale(0).ok()?;
    (0..-scale).try_fold(value, |acc, _| acc.checked_mul(Decimal::TEN))
}

/// Parse a timestamp: Unix seconds first, then `YYYY-MM-DD HH:MM:SS.ffffff`,
/// then `YYYY-MM-DD HH:MM:SS`. Date-time strings are taken as UTC.
pub fn parse_timestamp(name: &str, value: &Value) -> Result<DateTime<Utc>, NormalizeError> {
    let invalid = || NormalizeError::InvalidTimestamp {
        field: name.to_string(),
        value: value.to_string(),
    };
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => {
            let secs = n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && f.fract() == 0.0)
                    .map(|f| f as i64)
            });
            return secs
                .and_then(|secs| DateTime::from_timestamp(secs, 0))
                .ok_or_else(invalid);
        }
        _ => return Err(invalid()),
    };

    if let Ok(secs) = text.parse::<i64>() {
        return DateTime::from_timestamp(secs, 0).ok_or_else(invalid);
    }
    NaiveDateTime::parse_from_str(&text, DATETIME_FRACTIONAL)
        .or_else(|_| NaiveDateTime::parse_from_str(&text, DATETIME_WHOLE))
        .map(|naive| naive.and_utc())
        .map_err(|_| invalid())
}

fn parse_integer(name: &str, value: &Value) -> Result<i64, NormalizeError> {
    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| NormalizeError::InvalidInteger {
        field: name.to_string(),
        value: value.to_string(),
    })
}

fn decimal(record: &Record, key: &str) -> Result<Decimal, NormalizeError> {
    parse_decimal(key, field(record, key)?)
}

fn timestamp(record: &Record, key: &str) -> Result<DateTime<Utc>, NormalizeError> {
    parse_timestamp(key, field(record, key)?)
}

fn integer(record: &Record, key: &str) -> Result<i64, NormalizeError> {
    parse_integer(key, field(record, key)?)
}

fn optional_integer(record: &Record, key: &str) -> Result<Option<i64>, NormalizeError> {
    match record.get(key) {
        Some(Value::Null) | None => Ok(None),
        Some(value) => parse_integer(key, value).map(Some),
    }
}

/// Ids come back as numbers on some endpoints and strings on others.
fn optional_id(record: &Record, key: &str) -> Option<String> {
    match record.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn rows<T>(
    raw: &Value,
    row: impl Fn(&Record) -> Result<T, NormalizeError>,
) -> Result<Vec<T>, NormalizeError> {
    as_rows(raw)?
        .iter()
        .map(|value| row(as_record(value)?))
        .collect()
}

// ---------------------------------------------------------------------------
// Per-endpoint normalizers
// ---------------------------------------------------------------------------

/// Identity: endpoints whose payload is passed through untouched.
pub fn raw(raw: Value) -> Result<Value, NormalizeError> {
    Ok(raw)
}

pub fn account_balance(raw: Value) -> Result<AccountBalance, NormalizeError> {
    let record = as_record(&raw)?;
    Ok(AccountBalance {
        btc_reserved: decimal(record, "btc_reserved")?,
        btc_available: decimal(record, "btc_available")?,
        btc_balance: decimal(record, "btc_balance")?,
        usd_reserved: decimal(record, "usd_reserved")?,
        usd_available: decimal(record, "usd_available")?,
        usd_balance: decimal(record, "usd_balance")?,
        fee: decimal(record, "fee")?,
    })
}

fn order(record: &Record) -> Result<Order, NormalizeError> {
    let side = optional_integer(record, "type")?.and_then(Side::from_code);
    Ok(Order {
        id: optional_id(record, "id").ok_or_else(|| NormalizeError::MissingField("id".to_string()))?,
        datetime: timestamp(record, "datetime")?,
        side,
        price: decimal(record, "price")?,
        amount: decimal(record, "amount")?,
    })
}

/// Buy/sell limit orders. A refusal carries `reason: {"__all__": [..]}`; the
/// first reason string is kept.
pub fn order_placement(raw: Value) -> Result<OrderPlacement, NormalizeError> {
    let record = as_record(&raw)?;
    match record.get("reason") {
        Some(Value::String(reason)) => Ok(OrderPlacement::Rejected {
            reason: reason.clone(),
        }),
        Some(reason) => {
            let first = reason
                .get("__all__")
                .and_then(Value::as_array)
                .and_then(|reasons| reasons.first())
                .and_then(Value::as_str)
                .ok_or_else(|| shape_error("reason {\"__all__\": [string, ..]}", reason))?;
            Ok(OrderPlacement::Rejected {
                reason: first.to_string(),
            })
        }
        None => order(record).map(OrderPlacement::Placed),
    }
}

pub fn open_orders(raw: Value) -> Result<Vec<Order>, NormalizeError> {
    rows(&raw, order)
}

fn book_side(record: &Record, key: &str) -> Result<Vec<BookLevel>, NormalizeError> {
    as_rows(field(record, key)?)?
        .iter()
        .map(|row| match row.as_array().map(Vec::as_slice) {
            Some([price, amount, ..]) => Ok(BookLevel {
                price: parse_decimal(key, price)?,
                amount: parse_decimal(key, amount)?,
            }),
            _ => Err(shape_error("[price, amount]", row)),
        })
        .collect()
}

pub fn order_book(raw: Value) -> Result<OrderBook, NormalizeError> {
    let record = as_record(&raw)?;
    Ok(OrderBook {
        timestamp: timestamp(record, "timestamp")?,
        bids: book_side(record, "bids")?,
        asks: book_side(record, "asks")?,
    })
}

pub fn ticker(raw: Value) -> Result<Ticker, NormalizeError> {
    let record = as_record(&raw)?;
    Ok(Ticker {
        last: decimal(record, "last")?,
        high: decimal(record, "high")?,
        low: decimal(record, "low")?,
        volume: decimal(record, "volume")?,
        bid: decimal(record, "bid")?,
        ask: decimal(record, "ask")?,
        timestamp: timestamp(record, "timestamp")?,
    })
}

pub fn transactions(raw: Value) -> Result<Vec<Transaction>, NormalizeError> {
    rows(&raw, |tx| {
        Ok(Transaction {
            tid: optional_id(tx, "tid"),
            date: timestamp(tx, "date")?,
            price: decimal(tx, "price")?,
            amount: decimal(tx, "amount")?,
        })
    })
}

pub fn user_transactions(raw: Value) -> Result<Vec<UserTransaction>, NormalizeError> {
    rows(&raw, |tx| {
        Ok(UserTransaction {
            id: optional_id(tx, "id"),
            datetime: timestamp(tx, "datetime")?,
            kind: optional_integer(tx, "type")?.map(UserTransactionKind::from_code),
            usd: decimal(tx, "usd")?,
            btc: decimal(tx, "btc")?,
            fee: decimal(tx, "fee")?,
            order_id: optional_id(tx, "order_id"),
        })
    })
}

pub fn unconfirmed_deposits(raw: Value) -> Result<UnconfirmedDeposit, NormalizeError> {
    let record = as_record(&raw)?;
    let confirmations = integer(record, "confirmations")?;
    Ok(UnconfirmedDeposit {
        amount: decimal(record, "amount")?,
        address: record
            .get("address")
            .and_then(Value::as_str)
            .map(str::to_string),
        confirmations: u32::try_from(confirmations).map_err(|_| {
            NormalizeError::InvalidInteger {
                field: "confirmations".to_string(),
                value: confirmations.to_string(),
            }
        })?,
    })
}

pub fn withdrawal_requests(raw: Value) -> Result<Vec<WithdrawalRequest>, NormalizeError> {
    rows(&raw, |wr| {
        Ok(WithdrawalRequest {
            id: optional_id(wr, "id"),
            datetime: timestamp(wr, "datetime")?,
            amount: decimal(wr, "amount")?,
            status: optional_integer(wr, "status")?,
        })
    })
}

pub fn conversion_rate(raw: Value) -> Result<ConversionRate, NormalizeError> {
    let record = as_record(&raw)?;
    Ok(ConversionRate {
        buy: decimal(record, "buy")?,
        sell: decimal(record, "sell")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_timestamp_formats() {
        let whole = parse_timestamp("datetime", &json!("2021-01-01 10:00:00")).unwrap();
        assert_eq!((whole.year(), whole.hour(), whole.second()), (2021, 10, 0));

        let fractional =
            parse_timestamp("datetime", &json!("2021-01-01 10:00:00.500000")).unwrap();
        assert_eq!(fractional.timestamp_subsec_millis(), 500);
        assert_eq!(fractional.timestamp(), whole.timestamp());

        let epoch = parse_timestamp("timestamp", &json!(1609495200)).unwrap();
        assert_eq!(epoch.timestamp(), 1609495200);
        let epoch_str = parse_timestamp("timestamp", &json!("1609495200")).unwrap();
        assert_eq!(epoch, epoch_str);
        assert_eq!(epoch, whole);
    }

    #[test]
    fn test_unparsable_timestamp_fails() {
        let err = parse_timestamp("datetime", &json!("not-a-date")).unwrap_err();
        assert!(matches!(err, NormalizeError::InvalidTimestamp { .. }));
        assert!(parse_timestamp("datetime", &json!(true)).is_err());
    }

    #[test]
    fn test_whole_float_epoch_is_accepted() {
        let epoch = parse_timestamp("timestamp", &json!(1609495200.0)).unwrap();
        assert_eq!(epoch.timestamp(), 1609495200);
        assert!(matches!(
            parse_timestamp("timestamp", &json!(1609495200.5)),
            Err(NormalizeError::InvalidTimestamp { .. })
        ));
    }

    #[test]
    fn test_decimal_keeps_exact_precision() {
        assert_eq!(parse_decimal("p", &json!("0.1")).unwrap(), dec!(0.1));
        assert_eq!(
            parse_decimal("p", &json!("12345.67890123")).unwrap().to_string(),
            "12345.67890123"
        );
        assert_eq!(parse_decimal("p", &json!(2.5)).unwrap(), dec!(2.5));
        assert!(matches!(
            parse_decimal("p", &json!("abc")),
            Err(NormalizeError::InvalidDecimal { .. })
        ));
    }

    #[test]
    fn test_decimal_too_long_to_hold_is_rejected() {
        let err = parse_decimal("price", &json!("0.123456789012345678901234567890123")).unwrap_err();
        assert!(matches!(err, NormalizeError::InvalidDecimal { .. }));
        assert_eq!(
            parse_decimal("price", &json!("0.1234567890123456789012345678")).unwrap().to_string(),
            "0.1234567890123456789012345678"
        );
    }

    #[test]
    fn test_scientific_decimal_is_exact() {
        assert_eq!(parse_decimal("p", &json!("1.5e-3")).unwrap(), dec!(0.0015));
        assert_eq!(parse_decimal("p", &json!("2.5E2")).unwrap(), dec!(250));
        assert!(parse_decimal("p", &json!("1e-40")).is_err());
    }

    #[test]
    fn test_order_book() {
        let book = order_book(json!({
            "timestamp": "1609495200",
            "bids": [["100.5", "2.0"]],
            "asks": [["101.0", "1.5"]],
        }))
        .unwrap();
        assert_eq!(book.timestamp.timestamp(), 1609495200);
        assert_eq!(book.bids, vec![BookLevel { price: dec!(100.5), amount: dec!(2.0) }]);
        assert_eq!(book.asks, vec![BookLevel { price: dec!(101.0), amount: dec!(1.5) }]);
        assert_eq!(book.bids[0].amount.to_string(), "2.0");
    }

    #[test]
    fn test_order_book_rejects_short_rows() {
        let err = order_book(json!({
            "timestamp": "1609495200",
            "bids": [["100.5"]],
            "asks": [],
        }))
        .unwrap_err();
        assert!(matches!(err, NormalizeError::UnexpectedShape { .. }));
    }

    #[test]
    fn test_account_balance() {
        let balance = account_balance(json!({
            "btc_reserved": "0.10000000",
            "btc_available": "1.25000000",
            "btc_balance": "1.35000000",
            "usd_reserved": "0.00",
            "usd_available": "1500.75",
            "usd_balance": "1500.75",
            "fee": "0.25",
        }))
        .unwrap();
        assert_eq!(balance.btc_balance, dec!(1.35));
        assert_eq!(balance.usd_available, dec!(1500.75));
        assert_eq!(balance.fee, dec!(0.25));
    }

    #[test]
    fn test_account_balance_missing_field() {
        let err = account_balance(json!({"btc_reserved": "0"})).unwrap_err();
        assert!(matches!(err, NormalizeError::MissingField(ref f) if f == "btc_available"));
    }

    #[test]
    fn test_order_placement_accepted() {
        let placement = order_placement(json!({
            "id": 1234,
            "datetime": "2021-01-01 10:00:00.123456",
            "type": 0,
            "price": "27000.50",
            "amount": "0.01000000",
        }))
        .unwrap();
        let order = placement.order().unwrap();
        assert_eq!(order.id, "1234");
        assert_eq!(order.side, Some(Side::Buy));
        assert_eq!(order.price, dec!(27000.50));
        assert_eq!(order.amount, dec!(0.01));
    }

    #[test]
    fn test_order_placement_rejected_takes_first_reason() {
        let placement = order_placement(json!({
            "status": "error",
            "reason": {"__all__": ["Minimum order size is 5.0 EUR.", "second"]},
        }))
        .unwrap();
        assert_eq!(
            placement,
            OrderPlacement::Rejected {
                reason: "Minimum order size is 5.0 EUR.".to_string()
            }
        );
    }

    #[test]
    fn test_open_orders() {
        let orders = open_orders(json!([
            {"id": "1", "datetime": "2021-01-01 10:00:00", "type": "1", "price": "101.0", "amount": "0.5"},
            {"id": "2", "datetime": "2021-01-01 10:00:01", "type": "0", "price": "99.0", "amount": "1.5"},
        ]))
        .unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].side, Some(Side::Sell));
        assert_eq!(orders[1].notional(), dec!(148.5));
    }

    #[test]
    fn test_ticker() {
        let t = ticker(json!({
            "last": "101.1", "high": "105", "low": "99.5", "volume": "1234.5678",
            "bid": "101.0", "ask": "101.2", "timestamp": "1609495200",
        }))
        .unwrap();
        assert_eq!(t.volume, dec!(1234.5678));
        assert_eq!(t.ask - t.bid, dec!(0.2));
    }

    #[test]
    fn test_transactions_and_user_transactions() {
        let txs = transactions(json!([
            {"tid": 9, "date": "1609495200", "price": "100.0", "amount": "0.3"},
        ]))
        .unwrap();
        assert_eq!(txs[0].tid.as_deref(), Some("9"));
        assert_eq!(txs[0].amount, dec!(0.3));

        let user = user_transactions(json!([
            {"id": 5, "datetime": "2021-01-01 10:00:00", "type": 2,
             "usd": "-100.00", "btc": "0.001", "fee": "0.25", "order_id": 77},
        ]))
        .unwrap();
        assert_eq!(user[0].kind, Some(UserTransactionKind::Trade));
        assert_eq!(user[0].usd, dec!(-100.00));
        assert_eq!(user[0].order_id.as_deref(), Some("77"));
    }

    #[test]
    fn test_unconfirmed_deposits_and_withdrawals() {
        let deposit = unconfirmed_deposits(json!({
            "amount": "0.5", "address": "1abc", "confirmations": "2",
        }))
        .unwrap();
        assert_eq!(deposit.amount, dec!(0.5));
        assert_eq!(deposit.confirmations, 2);

        let requests = withdrawal_requests(json!([
            {"id": 1, "datetime": "2021-01-01 10:00:00", "amount": "10.0", "status": 0},
        ]))
        .unwrap();
        assert_eq!(requests[0].amount, dec!(10.0));
        assert_eq!(requests[0].status, Some(0));
    }

    #[test]
    fn test_rows_reject_non_array() {
        let err = open_orders(json!({"id": 1})).unwrap_err();
        assert!(matches!(err, NormalizeError::UnexpectedShape { expected: "array", .. }));
    }

    #[test]
    fn test_normalizing_twice_is_deterministic() {
        let payload = json!({"buy": "1.1800", "sell": "1.1700"});
        let a = conversion_rate(payload.clone()).unwrap();
        let b = conversion_rate(payload).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.buy, dec!(1.18));
    }
}
