//! Money type for representing monetary values.
//!
//! Amounts are integers in the currency's minor unit (kopecks, cents).
//! Decimal input is parsed digit by digit, so no floating point is ever
//! involved in pricing.

use crate::error::CommerceError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Currency {
    #[default]
    RUB,
    USD,
    EUR,
}

impl Currency {
    /// Get the currency code (e.g., "RUB").
    pub fn code(&self) -> &'static str {
        match self {
            Currency::RUB => "RUB",
            Currency::USD => "USD",
            Currency::EUR => "EUR",
        }
    }

    /// Get the currency symbol (e.g., "₽").
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::RUB => "\u{20bd}",
            Currency::USD => "$",
            Currency::EUR => "\u{20ac}",
        }
    }

    /// Get the number of decimal places for this currency.
    pub fn decimal_places(&self) -> u32 {
        2
    }

    /// Size of one major unit in minor units (100 for two decimal places).
    pub fn minor_per_major(&self) -> i64 {
        10_i64.pow(self.decimal_places())
    }

    /// Parse a currency code string.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "RUB" => Some(Currency::RUB),
            "USD" => Some(Currency::USD),
            "EUR" => Some(Currency::EUR),
            _ => None,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A monetary value with currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Money {
    /// Amount in the smallest currency unit.
    pub amount_cents: i64,
    /// The currency.
    pub currency: Currency,
}

impl Money {
    /// Create a new Money value from minor units.
    pub fn new(amount_cents: i64, currency: Currency) -> Self {
        Self {
            amount_cents,
            currency,
        }
    }

    /// Create a Money value from whole major units (rubles, dollars).
    pub fn from_major(amount: i64, currency: Currency) -> Result<Self, CommerceError> {
        amount
            .checked_mul(currency.minor_per_major())
            .map(|cents| Self::new(cents, currency))
            .ok_or(CommerceError::Overflow)
    }

    /// Parse a decimal string such as `"1250.5"` or `"99.995"`.
    ///
    /// Digits beyond the currency's precision are rounded half-up (away from
    /// zero). Returns `None` for anything that isn't a plain decimal number.
    ///
    /// ```
    /// use storefront_commerce::money::{Currency, Money};
    /// let price = Money::parse("49.995", Currency::RUB).unwrap();
    /// assert_eq!(price.amount_cents, 5000);
    /// ```
    pub fn parse(input: &str, currency: Currency) -> Option<Self> {
        let s = input.trim();
        let (negative, s) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };

        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, f),
            None => (s, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }

        let places = currency.decimal_places() as usize;
        let mut amount: i64 = 0;
        for b in int_part.bytes() {
            amount = amount.checked_mul(10)?.checked_add(i64::from(b - b'0'))?;
        }

        let frac = frac_part.as_bytes();
        for i in 0..places {
            let digit = frac.get(i).map(|b| i64::from(b - b'0')).unwrap_or(0);
            amount = amount.checked_mul(10)?.checked_add(digit)?;
        }
        if frac.get(places).is_some_and(|b| *b >= b'5') {
            amount = amount.checked_add(1)?;
        }

        Some(Self::new(if negative { -amount } else { amount }, currency))
    }

    /// Create a zero amount in the given currency.
    pub fn zero(currency: Currency) -> Self {
        Self::new(0, currency)
    }

    /// Check if this is zero.
    pub fn is_zero(&self) -> bool {
        self.amount_cents == 0
    }

    /// Check if this is negative.
    pub fn is_negative(&self) -> bool {
        self.amount_cents < 0
    }

    /// Add another amount of the same currency.
    pub fn checked_add(&self, other: &Money) -> Result<Money, CommerceError> {
        self.ensure_same_currency(other)?;
        self.amount_cents
            .checked_add(other.amount_cents)
            .map(|cents| Money::new(cents, self.currency))
            .ok_or(CommerceError::Overflow)
    }

    /// Subtract another amount of the same currency.
    pub fn checked_sub(&self, other: &Money) -> Result<Money, CommerceError> {
        self.ensure_same_currency(other)?;
        self.amount_cents
            .checked_sub(other.amount_cents)
            .map(|cents| Money::new(cents, self.currency))
            .ok_or(CommerceError::Overflow)
    }

    /// Multiply by an integer quantity.
    pub fn checked_mul(&self, factor: i64) -> Result<Money, CommerceError> {
        self.amount_cents
            .checked_mul(factor)
            .map(|cents| Money::new(cents, self.currency))
            .ok_or(CommerceError::Overflow)
    }

    /// Sum an iterator of Money values.
    pub fn sum<'a>(
        iter: impl IntoIterator<Item = &'a Money>,
        currency: Currency,
    ) -> Result<Money, CommerceError> {
        iter.into_iter()
            .try_fold(Money::zero(currency), |acc, m| acc.checked_add(m))
    }

    /// Format without symbol (e.g., "49.99").
    pub fn display_amount(&self) -> String {
        let unit = self.currency.minor_per_major();
        let places = self.currency.decimal_places() as usize;
        let sign = if self.amount_cents < 0 { "-" } else { "" };
        let abs = self.amount_cents.unsigned_abs();
        let unit = unit.unsigned_abs();
        format!("{}{}.{:0places$}", sign, abs / unit, abs % unit)
    }

    /// Format with symbol (e.g., "$49.99" or "49.99 ₽").
    pub fn display(&self) -> String {
        match self.currency {
            Currency::RUB => format!("{} {}", self.display_amount(), self.currency.symbol()),
            _ => format!("{}{}", self.currency.symbol(), self.display_amount()),
        }
    }

    fn ensure_same_currency(&self, other: &Money) -> Result<(), CommerceError> {
        if self.currency != other.currency {
            return Err(CommerceError::CurrencyMismatch {
                expected: self.currency.code().to_string(),
                got: other.currency.code().to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}
