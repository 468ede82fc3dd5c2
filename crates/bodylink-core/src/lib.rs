//! Configurations, joint index maps, and vector partitioning for the
//! bodylink robot interface layer.

pub mod config;
pub mod error;
pub mod joints;
pub mod partition;
