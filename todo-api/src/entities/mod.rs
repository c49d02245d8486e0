//! SeaORM entities for the tables created by the `migration` crate.

pub mod task;
