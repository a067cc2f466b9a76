use std::{fmt, str::FromStr};

use bigdecimal::BigDecimal;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// PostgreSQL `NUMERIC` limits on digits before and after the decimal point.
pub const MAX_INTEGER_DIGITS: i128 = 131_072;
pub const MAX_FRACTION_DIGITS: i128 = 16_383;

#[derive(Debug, thiserror::Error)]
pub enum AmountError {
    #[error(transparent)]
    Parse(#[from] bigdecimal::ParseBigDecimalError),
    #[error("amount has {integer} integer and {fraction} fractional digits, beyond NUMERIC range")]
    OutOfRange { integer: i128, fraction: i128 },
}

/// Arbitrary-precision quantity carried through from the webhook JSON.
///
/// Lamport balances and transfer amounts arrive as bare JSON numbers that can exceed
/// the `i64` range. The value is parsed through `serde_json::Number` (with
/// `arbitrary_precision` enabled) so no digit is lost. The received text is kept and
/// written back as is: a number stays a number, a quoted amount stays a string.
///
/// Amounts whose plain decimal form would not fit a `NUMERIC` column are rejected on
/// parse, so expanding one never costs more than a bounded number of digits.
#[derive(Debug, Clone)]
pub struct Amount {
    value: BigDecimal,
    text: String,
    quoted: bool,
}

impl Amount {
    pub fn new(value: BigDecimal) -> Self {
        let text = value.to_plain_string();
        Self { value, text, quoted: false }
    }

    /// Decimal string form used when binding to a `NUMERIC` column.
    pub fn to_decimal_string(&self) -> String {
        self.value.to_plain_string()
    }

    fn parse(text: &str, quoted: bool) -> Result<Self, AmountError> {
        let value = BigDecimal::from_str(text.trim())?;
        check_range(&value)?;
        Ok(Self { value, text: text.trim().to_string(), quoted })
    }
}

fn check_range(value: &BigDecimal) -> Result<(), AmountError> {
    let (_, scale) = value.as_bigint_and_exponent();
    let digits = i128::from(value.digits());
    let scale = i128::from(scale);

    let integer = (digits - scale).max(0);
    let fraction = scale.max(0);
    if integer > MAX_INTEGER_DIGITS || fraction > MAX_FRACTION_DIGITS {
        return Err(AmountError::OutOfRange { integer, fraction });
    }
    Ok(())
}

impl Default for Amount {
    fn default() -> Self {
        Amount::from(0)
    }
}

impl PartialEq for Amount {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for Amount {}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Amount::parse(s, false)
    }
}

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Amount::new(BigDecimal::from(value))
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.quoted {
            return serializer.serialize_str(&self.text);
        }
        // BigDecimal accepts forms JSON does not, e.g. ".5"
        let number = serde_json::Number::from_str(&self.text)
            .or_else(|_| serde_json::Number::from_str(&self.to_decimal_string()))
            .map_err(serde::ser::Error::custom)?;
        number.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (text, quoted) = match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::Number(n) => (n.to_string(), false),
            serde_json::Value::String(s) => (s, true),
            other => return Err(de::Error::custom(format!("expected a number, got {other}"))),
        };
        Amount::parse(&text, quoted).map_err(|e| {
            let shown: String = text.chars().take(32).collect();
            de::Error::custom(format!("invalid amount {shown:?}: {e}"))
        })
    }
}
