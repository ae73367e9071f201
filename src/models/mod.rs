//! Request/response models

pub mod ad;

pub use ad::*;
