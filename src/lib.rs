// margin-core: margin and risk calculation engine for a cross/isolated
// margin perpetuals protocol, plus the order appendix codec.
// all computation is deterministic with no external I/O: snapshots go in,
// an AccountSummary comes out, and nothing is read from the environment.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  fixed_point.rs: 18-decimal fixed point over i128
//   2.x  types.rs: primitives: ProductId, BalanceKind, Timestamp
//   3.x  appendix.rs: 128-bit order metadata codec
//   4.x  twap.rs: TWAP split helpers over the codec
//   5.x  balance.rs: balances, risk weights, valuation
//   6.x  health.rs: weighted health per regime, aggregation
//   7.x  margin.rs: margin manager: snapshot -> AccountSummary
//   8.x  config.rs: engine settings
//   9.x  report.rs: account summary rendering

// numeric core
pub mod fixed_point;
pub mod types;

// order metadata codec
pub mod appendix;
pub mod twap;

// margin engine
pub mod balance;
pub mod config;
pub mod health;
pub mod margin;
pub mod report;

// re exports for convenience
pub use appendix::*;
pub use balance::*;
pub use config::*;
pub use fixed_point::*;
pub use health::*;
pub use margin::*;
pub use report::*;
pub use twap::*;
pub use types::*;
