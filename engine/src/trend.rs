//! Trend classification: an ordered rule chain over a merged record.
//! First matching rule wins; thresholds are strict.

use crate::record::{AlertRecord, Direction, TrendLabel};

const DEAD_HIGH: f64 = 90.0;
const DEAD_LOW: f64 = 10.0;
const HEAVY: f64 = 80.0;
const VERY_LOW: f64 = 20.0;
const TRY_PIVOT: f64 = 40.0;

/// The oscillator facts the rule chain reads.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TrendInputs {
    pub slow: f64,
    pub slow_direction: Direction,
    pub mid_direction: Direction,
    pub fast_direction: Direction,
    pub fast_switched_up: bool,
    pub fast_switched_down: bool,
    pub bull_cross: bool,
    pub bear_cross: bool,
}

impl TrendInputs {
    /// Missing oscillator data reads as `0` / `flat`.
    pub fn from_record(rec: &AlertRecord) -> Self {
        let Some(osc) = rec.oscillator.as_ref() else {
            return Self::default();
        };

        let fast = osc.fast();
        Self {
            slow: osc.slow_value(),
            slow_direction: osc.slow().map(|s| s.direction).unwrap_or_default(),
            mid_direction: osc.mid().map(|s| s.direction).unwrap_or_default(),
            fast_direction: fast.map(|s| s.direction).unwrap_or_default(),
            fast_switched_up: fast.is_some_and(|s| s.switched_up),
            fast_switched_down: fast.is_some_and(|s| s.switched_down),
            bull_cross: osc.bull_cross,
            bear_cross: osc.bear_cross,
        }
    }
}

/// Classifies a merged record. A non-neutral pipeline trend wins outright.
pub fn classify(rec: &AlertRecord) -> TrendLabel {
    if let Some(reported) = rec.reported_trend.as_ref().filter(|t| !t.is_neutral()) {
        return reported.clone();
    }
    classify_inputs(&TrendInputs::from_record(rec))
}

pub fn classify_inputs(i: &TrendInputs) -> TrendLabel {
    use Direction::{Down, Up};

    if i.slow > DEAD_HIGH && i.slow_direction == Up && i.mid_direction == Up {
        TrendLabel::DeadLong
    } else if i.slow < DEAD_LOW && i.slow_direction == Down && i.mid_direction == Down {
        TrendLabel::DeadShort
    } else if i.bull_cross {
        TrendLabel::BullCross
    } else if i.bear_cross {
        TrendLabel::BearCross
    } else if i.slow > HEAVY && i.mid_direction == Up {
        TrendLabel::HeavyBuy
    } else if i.slow > HEAVY && i.fast_switched_down {
        TrendLabel::SwitchShort
    } else if i.slow < VERY_LOW && (i.fast_switched_down || i.fast_direction == Down) {
        TrendLabel::VeryShort
    } else if i.slow < VERY_LOW && i.fast_switched_up {
        TrendLabel::SwitchLong
    } else if i.slow > TRY_PIVOT && i.fast_direction == Up {
        TrendLabel::TryLong
    } else if i.slow < TRY_PIVOT && i.fast_direction == Down {
        TrendLabel::TryShort
    } else {
        TrendLabel::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use Direction::{Down, Flat, Up};

    fn inputs(slow: f64, slow_d: Direction, mid_d: Direction, fast_d: Direction) -> TrendInputs {
        TrendInputs {
            slow,
            slow_direction: slow_d,
            mid_direction: mid_d,
            fast_direction: fast_d,
            ..Default::default()
        }
    }

    #[test]
    fn dead_long_outranks_heavy_buy() {
        assert_eq!(classify_inputs(&inputs(95.0, Up, Up, Up)), TrendLabel::DeadLong);
        assert_eq!(classify_inputs(&inputs(85.0, Up, Up, Up)), TrendLabel::HeavyBuy);
    }

    #[test]
    fn dead_short_requires_slow_and_mid_down() {
        assert_eq!(classify_inputs(&inputs(5.0, Down, Down, Flat)), TrendLabel::DeadShort);
        assert_eq!(classify_inputs(&inputs(5.0, Down, Flat, Down)), TrendLabel::VeryShort);
    }

    #[test]
    fn crosses_outrank_level_rules() {
        let mut i = inputs(85.0, Up, Up, Up);
        i.bull_cross = true;
        assert_eq!(classify_inputs(&i), TrendLabel::BullCross);

        let mut i = inputs(15.0, Down, Flat, Down);
        i.bear_cross = true;
        assert_eq!(classify_inputs(&i), TrendLabel::BearCross);
    }

    #[test]
    fn switch_rules() {
        let mut i = inputs(85.0, Flat, Flat, Down);
        i.fast_switched_down = true;
        assert_eq!(classify_inputs(&i), TrendLabel::SwitchShort);

        let mut i = inputs(15.0, Flat, Flat, Up);
        i.fast_switched_up = true;
        assert_eq!(classify_inputs(&i), TrendLabel::SwitchLong);
    }

    #[test]
    fn try_rules_and_strict_thresholds() {
        assert_eq!(classify_inputs(&inputs(68.0, Up, Flat, Up)), TrendLabel::TryLong);
        assert_eq!(classify_inputs(&inputs(30.0, Down, Flat, Down)), TrendLabel::TryShort);
        assert_eq!(classify_inputs(&inputs(40.0, Flat, Flat, Up)), TrendLabel::Neutral);
        assert_eq!(classify_inputs(&inputs(40.0, Flat, Flat, Down)), TrendLabel::Neutral);
        assert_eq!(classify_inputs(&inputs(80.0, Flat, Up, Flat)), TrendLabel::Neutral);
    }

    #[test]
    fn reported_trend_wins_unless_neutral() {
        let mut rec = AlertRecord::empty("AAPL", 0);
        rec.reported_trend = Some(TrendLabel::Reported("Strong Up".into()));
        assert_eq!(classify(&rec), TrendLabel::Reported("Strong Up".into()));

        rec.reported_trend = Some(TrendLabel::Neutral);
        assert_eq!(classify(&rec), TrendLabel::Neutral);
    }

    #[test]
    fn record_without_oscillator_is_neutral() {
        assert_eq!(classify(&AlertRecord::empty("AAPL", 0)), TrendLabel::Neutral);
    }

    fn direction() -> impl Strategy<Value = Direction> {
        prop_oneof![Just(Up), Just(Down), Just(Flat)]
    }

    prop_compose! {
        fn any_inputs()(
            slow in 0.0f64..100.0,
            slow_direction in direction(),
            mid_direction in direction(),
            fast_direction in direction(),
            fast_switched_up in any::<bool>(),
            fast_switched_down in any::<bool>(),
            bull_cross in any::<bool>(),
            bear_cross in any::<bool>(),
        ) -> TrendInputs {
            TrendInputs {
                slow, slow_direction, mid_direction, fast_direction,
                fast_switched_up, fast_switched_down, bull_cross, bear_cross,
            }
        }
    }

    proptest! {
        #[test]
        fn classification_is_deterministic(i in any_inputs()) {
            prop_assert_eq!(classify_inputs(&i), classify_inputs(&i));
        }

        #[test]
        fn extreme_long_always_wins(mut i in any_inputs(), slow in 90.01f64..100.0) {
            i.slow = slow;
            i.slow_direction = Up;
            i.mid_direction = Up;
            prop_assert_eq!(classify_inputs(&i), TrendLabel::DeadLong);
        }
    }
}
