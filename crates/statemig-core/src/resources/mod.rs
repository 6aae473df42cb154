//! Transition tables of concrete resource types

pub mod application;
