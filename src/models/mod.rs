pub mod user;
pub mod category;

pub(crate) mod pickup;
pub(crate) mod transaction;
pub(crate) mod impact;
