use serde::{Deserialize, Serialize};

use crate::payload::Payload;

/// The closed set of inbound update kinds.
///
/// Several discriminators can co-occur on one payload, so classification is a
/// first-match walk in a fixed order with `Primary` as the catch-all.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpdateKind {
    QuadD4,
    Octo,
    Macd,
    DayChange,
    QuadD1D2,
    Vwap,
    Cci,
    Orb,
    Solo,
    Dual,
    Primary,
}

impl UpdateKind {
    pub fn classify(p: &Payload) -> Self {
        let has_price = p.is_present("price");

        if p.is_present("d4Signal") {
            UpdateKind::QuadD4
        } else if p.is_present("octoStoch") {
            UpdateKind::Octo
        } else if p.is_present("macdCrossing") && !has_price {
            UpdateKind::Macd
        } else if p.is_present("changeFromPrevDay") && !has_price {
            UpdateKind::DayChange
        } else if p.is_present("quadStoch") {
            UpdateKind::QuadD1D2
        } else if p.is_true("vwapCrossing") {
            UpdateKind::Vwap
        } else if p.is_present("cciSignal") {
            UpdateKind::Cci
        } else if p.is_present("orbType") && p.is_present("orbStatus") {
            UpdateKind::Orb
        } else {
            match p.label("stochType").as_deref() {
                Some("Solo") => UpdateKind::Solo,
                Some("Dual") => UpdateKind::Dual,
                _ => UpdateKind::Primary,
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UpdateKind::QuadD4 => "quad_d4",
            UpdateKind::Octo => "octo",
            UpdateKind::Macd => "macd",
            UpdateKind::DayChange => "day_change",
            UpdateKind::QuadD1D2 => "quad_d1d2",
            UpdateKind::Vwap => "vwap",
            UpdateKind::Cci => "cci",
            UpdateKind::Orb => "orb",
            UpdateKind::Solo => "solo",
            UpdateKind::Dual => "dual",
            UpdateKind::Primary => "primary",
        }
    }
}

impl std::fmt::Display for UpdateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn kind(v: serde_json::Value) -> UpdateKind {
        UpdateKind::classify(&Payload::from_value(v))
    }

    #[test]
    fn each_discriminator_maps_to_its_kind() {
        assert_eq!(kind(json!({"d4Signal": "up"})), UpdateKind::QuadD4);
        assert_eq!(kind(json!({"octoStoch": true})), UpdateKind::Octo);
        assert_eq!(kind(json!({"macdCrossing": "bullish"})), UpdateKind::Macd);
        assert_eq!(kind(json!({"changeFromPrevDay": 1.2})), UpdateKind::DayChange);
        assert_eq!(kind(json!({"quadStoch": "buy"})), UpdateKind::QuadD1D2);
        assert_eq!(kind(json!({"vwapCrossing": true})), UpdateKind::Vwap);
        assert_eq!(kind(json!({"cciSignal": "overbought"})), UpdateKind::Cci);
        assert_eq!(
            kind(json!({"orbType": "london", "orbStatus": "breakout"})),
            UpdateKind::Orb
        );
        assert_eq!(kind(json!({"stochType": "Solo"})), UpdateKind::Solo);
        assert_eq!(kind(json!({"stochType": "Dual"})), UpdateKind::Dual);
        assert_eq!(kind(json!({"price": 10})), UpdateKind::Primary);
    }

    #[test]
    fn price_turns_macd_and_day_change_into_primary() {
        assert_eq!(
            kind(json!({"macdCrossing": "bullish", "price": 10})),
            UpdateKind::Primary
        );
        assert_eq!(
            kind(json!({"changeFromPrevDay": 1.0, "price": 10})),
            UpdateKind::Primary
        );
    }

    #[test]
    fn earlier_discriminators_win() {
        assert_eq!(
            kind(json!({"d4Signal": "x", "octoStoch": true, "stochType": "Dual"})),
            UpdateKind::QuadD4
        );
        assert_eq!(
            kind(json!({"octoStoch": true, "macdCrossing": "bearish"})),
            UpdateKind::Octo
        );
        assert_eq!(
            kind(json!({"quadStoch": "x", "vwapCrossing": true})),
            UpdateKind::QuadD1D2
        );
    }

    #[test]
    fn false_or_null_discriminators_do_not_count() {
        assert_eq!(kind(json!({"vwapCrossing": false})), UpdateKind::Primary);
        assert_eq!(kind(json!({"octoStoch": null})), UpdateKind::Primary);
        assert_eq!(kind(json!({"orbType": "ny"})), UpdateKind::Primary);
        assert_eq!(kind(json!({"stochType": "Triple"})), UpdateKind::Primary);
    }
}
