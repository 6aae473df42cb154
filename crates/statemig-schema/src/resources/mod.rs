//! Concrete resource descriptors

pub mod application;
