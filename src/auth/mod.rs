pub mod session;

pub use session::{sign_in, sign_out, signed_in_account, Student};
