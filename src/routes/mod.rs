pub(crate) mod auth;
pub(crate) mod categories;
pub(crate) mod pickups;
pub(crate) mod collector;
pub(crate) mod payments;
pub(crate) mod admin;
