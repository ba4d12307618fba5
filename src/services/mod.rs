pub mod usage_ledger;
pub mod users;

pub use usage_ledger::PgUsageLedger;
pub use users::UsersService;
