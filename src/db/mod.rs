pub mod db;
pub mod error;
pub mod ledgerdb;
#[cfg(test)]
pub mod memory;
pub mod query_timeout;
pub mod questdb;
pub mod referraldb;
pub mod userdb;

pub use db::DBClient;

use ledgerdb::LedgerExt;
use questdb::QuestExt;
use referraldb::ReferralExt;
use userdb::UserExt;

/// Everything the engine needs from persistence. Implemented by the Postgres
/// `DBClient` and, in tests, by the in-memory store.
pub trait RewardsStore: UserExt + ReferralExt + QuestExt + LedgerExt + Send + Sync {}

impl<T> RewardsStore for T where T: UserExt + ReferralExt + QuestExt + LedgerExt + Send + Sync {}
