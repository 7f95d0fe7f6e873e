pub mod auth_dtos;
pub mod pickup_dtos;
