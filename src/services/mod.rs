pub mod esewa_service;
pub mod impact_service;
