//! Exchange rates and currency conversion.
//!
//! - [`store::RateStore`] holds the latest [`snapshot::RateSnapshot`]
//! - [`provider::RateProvider`] fetches new snapshots
//! - [`service::CurrencyService`] computes cross rates with a parity fallback
//! - [`refresher::RateRefresher`] keeps the store warm in the background

pub mod conversion;
pub mod provider;
pub mod refresher;
pub mod service;
pub mod snapshot;
pub mod store;

#[cfg(test)]
mod props;
#[cfg(test)]
pub(crate) mod testing;

pub use conversion::convert_amount;
pub use provider::{ExchangeRateApiProvider, ProviderError, RateProvider};
pub use refresher::RateRefresher;
pub use service::{CurrencyService, PARITY_RATE, RateLookup, RefreshError};
pub use snapshot::RateSnapshot;
pub use store::RateStore;
