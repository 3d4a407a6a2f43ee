// =============================================================================
// Data Providers
// =============================================================================
//
// Three independent upstream sources feed a sentinel run:
//
//   1. OKX market candles      — price trend + ATR input
//   2. Coinglass analytics     — derivatives positioning and sentiment
//   3. Coinglass news feed     — headlines for the circuit breaker
//
// Every provider call carries its own timeout and maps any failure to an
// "unavailable" value at the snapshot boundary; a failure in one source never
// aborts retrieval of the others or the run itself.  All payload parsing is
// done by pure `parse_*` functions so the normalisation rules are testable
// without a network.
// =============================================================================

pub mod coinglass;
pub mod news;
pub mod okx;

pub use coinglass::CoinglassClient;
pub use news::NewsFeedClient;
pub use okx::OkxMarketClient;
