//! # Blogicum Core
//!
//! The domain layer of the Blogicum blogging platform.
//! This crate contains the visibility and authorization rules, the feed
//! assembly and the mutation workflows, with zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod guard;
pub mod navigation;
pub mod ports;
pub mod services;
pub mod visibility;

pub use error::{DomainError, FieldError, RepoError, Validator};
pub use navigation::{Access, Mutation, Navigation};
