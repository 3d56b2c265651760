pub mod response;

pub use response::{ApiResult, Created, Listing, Single};
