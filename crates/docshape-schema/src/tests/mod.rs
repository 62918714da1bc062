//! Unit and property-based tests for docshape-schema.


#[cfg(test)]
pub mod validate_tests;
