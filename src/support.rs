//! Supporting infrastructure used by models.

pub mod fmi2;
