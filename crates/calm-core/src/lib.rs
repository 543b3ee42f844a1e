//! CALM Core Types and Definitions
//!
//! This crate provides the foundational types shared by the CALM validation
//! pipeline. It includes:
//!
//! - **Paths**: JSON-Path-style addresses made of key and index segments ([`path`] module)
//! - **Pointers**: JSON-Pointer resolution with `unique-id` aware array addressing ([`pointer`] module)
//! - **Outcomes**: Validation diagnostics and their aggregate ([`outcome`] module)
//! - **Options**: Pattern option extraction and choice selection ([`options`] module)

pub mod options;
pub mod outcome;
pub mod path;
pub mod pointer;

/// Name of the field carrying the stable identifier of CALM nodes,
/// relationships, interfaces, flows and option alternatives.
pub const UNIQUE_ID: &str = "unique-id";
