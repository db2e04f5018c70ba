//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Own every cross-entity rule (category existence, hierarchy integrity,
//!   viewer visibility) so repositories stay single-partition.

pub mod account_service;
pub mod catalog_service;
pub mod hierarchy_service;
