//! Order appendix codec: the 128-bit packed metadata field attached to every
//! order, carrying execution type, isolation, trigger and TWAP parameters.
//!
//! Layout (bit 0 = LSB):
//!
//! | value   | reserved | trigger | reduce only | order type | isolated | version |
//! | 96 bits | 18 bits  | 2 bits  | 1 bit       | 2 bits     | 1 bit    | 8 bits  |
//! | 127..32 | 31..14   | 13..12  | 11          | 10..9      | 8        | 7..0    |
//!
//! Encoding validates the configuration eagerly and fails loudly; decoding is
//! total over all 128-bit inputs (reserved bits are ignored, not validated).

use crate::fixed_point::FixedPoint;
use serde::{Deserialize, Serialize};

/// Current appendix format version, written into bits 7..0 on encode.
pub const APPENDIX_VERSION: u8 = 0;

// 3.0: named bit ranges. widths, masks and shifts in one place so no shift
// amount ever appears inline in the packing arithmetic.
pub struct AppendixBits;

impl AppendixBits {
    pub const VERSION_BITS: u32 = 8; // bits 7..0
    pub const ISOLATED_BITS: u32 = 1; // bit 8
    pub const ORDER_TYPE_BITS: u32 = 2; // bits 10..9
    pub const REDUCE_ONLY_BITS: u32 = 1; // bit 11
    pub const TRIGGER_TYPE_BITS: u32 = 2; // bits 13..12
    pub const RESERVED_BITS: u32 = 18; // bits 31..14
    pub const VALUE_BITS: u32 = 96; // bits 127..32, isolated margin or TWAP data

    pub const VERSION_MASK: u128 = (1 << Self::VERSION_BITS) - 1;
    pub const ISOLATED_MASK: u128 = (1 << Self::ISOLATED_BITS) - 1;
    pub const ORDER_TYPE_MASK: u128 = (1 << Self::ORDER_TYPE_BITS) - 1;
    pub const REDUCE_ONLY_MASK: u128 = (1 << Self::REDUCE_ONLY_BITS) - 1;
    pub const TRIGGER_TYPE_MASK: u128 = (1 << Self::TRIGGER_TYPE_BITS) - 1;
    pub const RESERVED_MASK: u128 = (1 << Self::RESERVED_BITS) - 1;
    pub const VALUE_MASK: u128 = (1 << Self::VALUE_BITS) - 1;

    pub const VERSION_SHIFT: u32 = 0;
    pub const ISOLATED_SHIFT: u32 = 8;
    pub const ORDER_TYPE_SHIFT: u32 = 9;
    pub const REDUCE_ONLY_SHIFT: u32 = 11;
    pub const TRIGGER_TYPE_SHIFT: u32 = 12;
    pub const RESERVED_SHIFT: u32 = 14;
    pub const VALUE_SHIFT: u32 = 32;
}

// 3.1: TWAP sub-layout inside the 96-bit value field (MSB -> LSB):
// | times (32 bits) | slippage_x6 (32 bits) | reserved (32 bits) |
pub struct TwapBits;

impl TwapBits {
    pub const TIMES_BITS: u32 = 32;
    pub const SLIPPAGE_BITS: u32 = 32;
    pub const RESERVED_BITS: u32 = 32;

    pub const TIMES_MASK: u128 = (1 << Self::TIMES_BITS) - 1;
    pub const SLIPPAGE_MASK: u128 = (1 << Self::SLIPPAGE_BITS) - 1;
    pub const RESERVED_MASK: u128 = (1 << Self::RESERVED_BITS) - 1;

    pub const RESERVED_SHIFT: u32 = 0;
    pub const SLIPPAGE_SHIFT: u32 = 32;
    pub const TIMES_SHIFT: u32 = 64;
}

// slippage travels at 6 decimal places; x18 raws must be divisible by this
// to encode without loss.
const SLIPPAGE_X18_PER_X6: i128 = 1_000_000_000_000;

// 3.2: order execution type, bits 10..9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    #[default]
    Default = 0,
    Ioc = 1,
    Fok = 2,
    PostOnly = 3,
}

impl OrderType {
    fn from_bits(bits: u128) -> Self {
        match bits & AppendixBits::ORDER_TYPE_MASK {
            0 => OrderType::Default,
            1 => OrderType::Ioc,
            2 => OrderType::Fok,
            _ => OrderType::PostOnly,
        }
    }
}

// 3.3: trigger type, bits 13..12. zero means a plain (non-trigger) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    #[default]
    None = 0,
    Price = 1,
    Twap = 2,
    TwapCustomAmounts = 3,
}

impl TriggerType {
    fn from_bits(bits: u128) -> Self {
        match bits & AppendixBits::TRIGGER_TYPE_MASK {
            0 => TriggerType::None,
            1 => TriggerType::Price,
            2 => TriggerType::Twap,
            _ => TriggerType::TwapCustomAmounts,
        }
    }

    pub fn is_twap(self) -> bool {
        matches!(self, TriggerType::Twap | TriggerType::TwapCustomAmounts)
    }
}

/// TWAP execution parameters carried in the value field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwapParams {
    /// Number of child executions.
    pub times: u32,
    /// Slippage tolerance as a fraction (0.01 == 1%). Must be a multiple of
    /// 0.000001 and within [0, 1] to encode.
    pub slippage_frac: FixedPoint,
}

// 3.4: the full configuration an appendix can express. Default gives the
// plain order: DEFAULT execution, cross margin, no trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AppendixParams {
    pub order_type: OrderType,
    pub reduce_only: bool,
    pub isolated: bool,
    /// Margin to commit to the isolated position, x18. Requires `isolated`.
    pub isolated_margin: Option<FixedPoint>,
    pub trigger_type: TriggerType,
    /// Required iff `trigger_type` is TWAP or TWAP_CUSTOM_AMOUNTS.
    pub twap: Option<TwapParams>,
}

/// Everything `decode` can read back out of a 128-bit appendix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedAppendix {
    pub version: u8,
    pub order_type: OrderType,
    pub reduce_only: bool,
    pub isolated: bool,
    pub isolated_margin: Option<FixedPoint>,
    pub trigger_type: TriggerType,
    pub twap: Option<TwapParams>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AppendixConfigError {
    #[error("isolated_margin can only be set when isolated is true")]
    IsolatedMarginWithoutIsolated,
    #[error("an order cannot be both isolated and a TWAP order")]
    IsolatedTwapConflict,
    #[error("twap times and slippage are required for TWAP trigger types")]
    MissingTwapParams,
    #[error("isolated margin {margin} does not fit the 96-bit value field")]
    IsolatedMarginOutOfRange { margin: FixedPoint },
    #[error("twap slippage fraction {slippage} must be within [0, 1]")]
    SlippageOutOfRange { slippage: FixedPoint },
    #[error("twap slippage fraction {slippage} must be a multiple of 0.000001")]
    SlippageNotRepresentable { slippage: FixedPoint },
}

// 3.5: encode. every mutual-exclusion rule is checked before a single bit is
// placed; a failed encode returns no partial result.
pub fn encode(params: &AppendixParams) -> Result<u128, AppendixConfigError> {
    if params.isolated_margin.is_some() && !params.isolated {
        return Err(AppendixConfigError::IsolatedMarginWithoutIsolated);
    }
    if params.isolated && params.trigger_type.is_twap() {
        return Err(AppendixConfigError::IsolatedTwapConflict);
    }
    if params.trigger_type.is_twap() && params.twap.is_none() {
        return Err(AppendixConfigError::MissingTwapParams);
    }

    let mut appendix: u128 =
        (APPENDIX_VERSION as u128 & AppendixBits::VERSION_MASK) << AppendixBits::VERSION_SHIFT;

    if params.isolated {
        appendix |= 1 << AppendixBits::ISOLATED_SHIFT;
    }
    appendix |=
        (params.order_type as u128 & AppendixBits::ORDER_TYPE_MASK) << AppendixBits::ORDER_TYPE_SHIFT;
    if params.reduce_only {
        appendix |= 1 << AppendixBits::REDUCE_ONLY_SHIFT;
    }
    appendix |= (params.trigger_type as u128 & AppendixBits::TRIGGER_TYPE_MASK)
        << AppendixBits::TRIGGER_TYPE_SHIFT;

    if let (true, Some(margin)) = (params.isolated, params.isolated_margin) {
        let raw = margin.raw();
        if raw < 0 || raw as u128 > AppendixBits::VALUE_MASK {
            return Err(AppendixConfigError::IsolatedMarginOutOfRange { margin });
        }
        appendix |= (raw as u128) << AppendixBits::VALUE_SHIFT;
    } else if let (true, Some(twap)) = (params.trigger_type.is_twap(), params.twap) {
        appendix |= pack_twap_value(&twap)? << AppendixBits::VALUE_SHIFT;
    }

    Ok(appendix)
}

/// Pure inverse of `encode`. Total: never fails on any 128-bit input.
pub fn decode(appendix: u128) -> DecodedAppendix {
    DecodedAppendix {
        version: order_version(appendix),
        order_type: order_execution_type(appendix),
        reduce_only: order_reduce_only(appendix),
        isolated: order_is_isolated(appendix),
        isolated_margin: order_isolated_margin(appendix),
        trigger_type: order_trigger_type(appendix),
        twap: order_twap_data(appendix),
    }
}

// 3.6: TWAP value packing. times in bits 95..64 of the value field, the
// x6-scaled slippage in bits 63..32, low word reserved zero.

pub fn pack_twap_value(twap: &TwapParams) -> Result<u128, AppendixConfigError> {
    let raw = twap.slippage_frac.raw();
    if raw < 0 || raw > FixedPoint::ONE.raw() {
        return Err(AppendixConfigError::SlippageOutOfRange {
            slippage: twap.slippage_frac,
        });
    }
    if raw % SLIPPAGE_X18_PER_X6 != 0 {
        return Err(AppendixConfigError::SlippageNotRepresentable {
            slippage: twap.slippage_frac,
        });
    }
    let slippage_x6 = (raw / SLIPPAGE_X18_PER_X6) as u128;

    Ok(((twap.times as u128 & TwapBits::TIMES_MASK) << TwapBits::TIMES_SHIFT)
        | ((slippage_x6 & TwapBits::SLIPPAGE_MASK) << TwapBits::SLIPPAGE_SHIFT))
}

pub fn unpack_twap_value(value: u128) -> TwapParams {
    let times = ((value >> TwapBits::TIMES_SHIFT) & TwapBits::TIMES_MASK) as u32;
    let slippage_x6 = ((value >> TwapBits::SLIPPAGE_SHIFT) & TwapBits::SLIPPAGE_MASK) as i128;
    TwapParams {
        times,
        slippage_frac: FixedPoint::from_raw(slippage_x6 * SLIPPAGE_X18_PER_X6),
    }
}

// 3.7: accessors. thin shift-and-mask projections over a raw appendix, for
// callers that inspect an order without decoding the whole thing.

pub fn order_version(appendix: u128) -> u8 {
    ((appendix >> AppendixBits::VERSION_SHIFT) & AppendixBits::VERSION_MASK) as u8
}

pub fn order_execution_type(appendix: u128) -> OrderType {
    OrderType::from_bits(appendix >> AppendixBits::ORDER_TYPE_SHIFT)
}

pub fn order_reduce_only(appendix: u128) -> bool {
    (appendix >> AppendixBits::REDUCE_ONLY_SHIFT) & AppendixBits::REDUCE_ONLY_MASK == 1
}

pub fn order_is_isolated(appendix: u128) -> bool {
    (appendix >> AppendixBits::ISOLATED_SHIFT) & AppendixBits::ISOLATED_MASK == 1
}

/// Isolated margin amount, present iff the isolated bit is set. An isolated
/// order encoded without an explicit margin reads back as zero margin.
pub fn order_isolated_margin(appendix: u128) -> Option<FixedPoint> {
    if !order_is_isolated(appendix) {
        return None;
    }
    let raw = (appendix >> AppendixBits::VALUE_SHIFT) & AppendixBits::VALUE_MASK;
    Some(FixedPoint::from_raw(raw as i128))
}

pub fn order_is_trigger_order(appendix: u128) -> bool {
    (appendix >> AppendixBits::TRIGGER_TYPE_SHIFT) & AppendixBits::TRIGGER_TYPE_MASK > 0
}

pub fn order_trigger_type(appendix: u128) -> TriggerType {
    TriggerType::from_bits(appendix >> AppendixBits::TRIGGER_TYPE_SHIFT)
}

pub fn order_twap_data(appendix: u128) -> Option<TwapParams> {
    if !order_trigger_type(appendix).is_twap() {
        return None;
    }
    let value = (appendix >> AppendixBits::VALUE_SHIFT) & AppendixBits::VALUE_MASK;
    Some(unpack_twap_value(value))
}
