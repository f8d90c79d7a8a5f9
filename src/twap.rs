// 4.0 twap.rs: helpers for splitting a parent TWAP order into child
// executions. validation mirrors what the matching engine enforces: equal
// splits must divide evenly, custom splits must sum back to the total.

use crate::appendix::{
    encode, AppendixConfigError, AppendixParams, OrderType, TriggerType, TwapParams,
};
use crate::fixed_point::FixedPoint;

/// Bounds on the number of child executions.
pub const TWAP_MIN_TIMES: u32 = 1;
pub const TWAP_MAX_TIMES: u32 = 500;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TwapOrderError {
    #[error("twap times must be between {TWAP_MIN_TIMES} and {TWAP_MAX_TIMES}, got {times}")]
    TimesOutOfRange { times: u32 },
    #[error("twap interval must be positive")]
    InvalidInterval,
    #[error("total amount {total} is not divisible by times {times} for an equal split")]
    NotDivisible { total: FixedPoint, times: u32 },
    #[error("custom amounts list length {actual} must equal times {expected}")]
    AmountCountMismatch { expected: u32, actual: usize },
    #[error("custom amounts sum {actual} must equal total amount {expected}")]
    AmountSumMismatch {
        expected: FixedPoint,
        actual: FixedPoint,
    },
    #[error(transparent)]
    Appendix(#[from] AppendixConfigError),
}

/// Build the appendix for a TWAP order. TWAP parents always execute their
/// children IOC; custom per-child amounts select the TWAP_CUSTOM_AMOUNTS
/// trigger type.
pub fn build_twap_appendix(
    times: u32,
    slippage_frac: FixedPoint,
    reduce_only: bool,
    custom_amounts: bool,
) -> Result<u128, TwapOrderError> {
    if !(TWAP_MIN_TIMES..=TWAP_MAX_TIMES).contains(&times) {
        return Err(TwapOrderError::TimesOutOfRange { times });
    }
    let trigger_type = if custom_amounts {
        TriggerType::TwapCustomAmounts
    } else {
        TriggerType::Twap
    };
    let appendix = encode(&AppendixParams {
        order_type: OrderType::Ioc,
        reduce_only,
        trigger_type,
        twap: Some(TwapParams {
            times,
            slippage_frac,
        }),
        ..Default::default()
    })?;
    Ok(appendix)
}

/// Validate the amount split of a TWAP order before submission.
pub fn validate_twap_split(
    total_amount: FixedPoint,
    times: u32,
    custom_amounts: Option<&[FixedPoint]>,
) -> Result<(), TwapOrderError> {
    if !(TWAP_MIN_TIMES..=TWAP_MAX_TIMES).contains(&times) {
        return Err(TwapOrderError::TimesOutOfRange { times });
    }
    match custom_amounts {
        None => {
            if total_amount.raw() % times as i128 != 0 {
                return Err(TwapOrderError::NotDivisible {
                    total: total_amount,
                    times,
                });
            }
        }
        Some(amounts) => {
            if amounts.len() != times as usize {
                return Err(TwapOrderError::AmountCountMismatch {
                    expected: times,
                    actual: amounts.len(),
                });
            }
            let sum: FixedPoint = amounts.iter().sum();
            if sum != total_amount {
                return Err(TwapOrderError::AmountSumMismatch {
                    expected: total_amount,
                    actual: sum,
                });
            }
        }
    }
    Ok(())
}

/// Equal per-execution amounts. The total must divide evenly at x18 scale.
pub fn equal_amounts(total_amount: FixedPoint, times: u32) -> Result<Vec<FixedPoint>, TwapOrderError> {
    validate_twap_split(total_amount, times, None)?;
    let per_execution = FixedPoint::from_raw(total_amount.raw() / times as i128);
    Ok(vec![per_execution; times as usize])
}

/// Seconds from first to last child execution.
pub fn estimate_completion_time(times: u32, interval_seconds: u64) -> Result<u64, TwapOrderError> {
    if interval_seconds == 0 {
        return Err(TwapOrderError::InvalidInterval);
    }
    Ok((times.saturating_sub(1)) as u64 * interval_seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appendix::{order_execution_type, order_trigger_type, order_twap_data};

    fn fp(s: &str) -> FixedPoint {
        s.parse().unwrap()
    }

    #[test]
    fn builds_ioc_twap_appendix() {
        let appendix = build_twap_appendix(10, fp("0.01"), false, false).unwrap();
        assert_eq!(order_execution_type(appendix), OrderType::Ioc);
        assert_eq!(order_trigger_type(appendix), TriggerType::Twap);
        let twap = order_twap_data(appendix).unwrap();
        assert_eq!(twap.times, 10);
        assert_eq!(twap.slippage_frac, fp("0.01"));
    }

    #[test]
    fn custom_amounts_select_custom_trigger() {
        let appendix = build_twap_appendix(3, fp("0.02"), true, true).unwrap();
        assert_eq!(order_trigger_type(appendix), TriggerType::TwapCustomAmounts);
    }

    #[test]
    fn times_bounds() {
        assert!(matches!(
            build_twap_appendix(0, fp("0.01"), false, false),
            Err(TwapOrderError::TimesOutOfRange { times: 0 })
        ));
        assert!(matches!(
            build_twap_appendix(501, fp("0.01"), false, false),
            Err(TwapOrderError::TimesOutOfRange { times: 501 })
        ));
        assert!(build_twap_appendix(500, fp("0.01"), false, false).is_ok());
    }

    #[test]
    fn equal_split_divides_evenly() {
        let amounts = equal_amounts(FixedPoint::from_int(100), 4).unwrap();
        assert_eq!(amounts.len(), 4);
        assert!(amounts.iter().all(|a| *a == FixedPoint::from_int(25)));
    }

    #[test]
    fn equal_split_rejects_remainder() {
        // 100 raw units split three ways leaves a remainder
        let awkward = FixedPoint::from_raw(100);
        assert!(matches!(
            equal_amounts(awkward, 3),
            Err(TwapOrderError::NotDivisible { .. })
        ));
    }

    #[test]
    fn custom_split_must_match_count_and_sum() {
        let total = FixedPoint::from_int(10);
        let good = [fp("2"), fp("3"), fp("5")];
        assert!(validate_twap_split(total, 3, Some(&good)).is_ok());

        assert!(matches!(
            validate_twap_split(total, 4, Some(&good)),
            Err(TwapOrderError::AmountCountMismatch { .. })
        ));

        let bad_sum = [fp("2"), fp("3"), fp("4")];
        assert!(matches!(
            validate_twap_split(total, 3, Some(&bad_sum)),
            Err(TwapOrderError::AmountSumMismatch { .. })
        ));
    }

    #[test]
    fn completion_time() {
        assert_eq!(estimate_completion_time(10, 60).unwrap(), 540);
        assert_eq!(estimate_completion_time(1, 60).unwrap(), 0);
        assert!(matches!(
            estimate_completion_time(10, 0),
            Err(TwapOrderError::InvalidInterval)
        ));
    }
}
