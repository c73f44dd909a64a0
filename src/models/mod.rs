//! Data model types for the SuomiSF catalog.
//!
//! Each entity has a full schema used by single-entity GETs and a brief
//! schema used in list results.

pub mod award;
pub mod contributor;
pub mod edition;
pub mod log;
pub mod magazine;
pub mod person;
pub mod publisher;
pub mod refs;
pub mod short;
pub mod tag;
pub mod user;
pub mod work;
