use serde::{Deserialize, Serialize};

use crate::LedgerError;

/// ISO currency code an expense was paid in.
///
/// The set is closed: anything outside it is rejected when a record is built.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Pln,
    Usd,
    Eur,
    Gbp,
    Chf,
    Nok,
    Sek,
    Dkk,
    Huf,
    Czk,
    Cad,
    Aud,
    Jpy,
    Cny,
    Try,
}

impl Currency {
    pub const ALL: [Currency; 15] = [
        Currency::Pln,
        Currency::Usd,
        Currency::Eur,
        Currency::Gbp,
        Currency::Chf,
        Currency::Nok,
        Currency::Sek,
        Currency::Dkk,
        Currency::Huf,
        Currency::Czk,
        Currency::Cad,
        Currency::Aud,
        Currency::Jpy,
        Currency::Cny,
        Currency::Try,
    ];

    /// Canonical currency code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Currency::Pln => "PLN",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Chf => "CHF",
            Currency::Nok => "NOK",
            Currency::Sek => "SEK",
            Currency::Dkk => "DKK",
            Currency::Huf => "HUF",
            Currency::Czk => "CZK",
            Currency::Cad => "CAD",
            Currency::Aud => "AUD",
            Currency::Jpy => "JPY",
            Currency::Cny => "CNY",
            Currency::Try => "TRY",
        }
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl TryFrom<&str> for Currency {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let code = value.trim().to_ascii_uppercase();
        Currency::ALL
            .into_iter()
            .find(|currency| currency.code() == code)
            .ok_or_else(|| {
                LedgerError::Validation(format!("currency: '{value}' is not supported"))
            })
    }
}
