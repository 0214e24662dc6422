//! Crate entrypoint wiring together configuration, the cPanel client, and the
//! DNS-01 solver the issuance host drives.

pub mod config;
pub mod cpanel;
pub mod error;
pub mod solver;
pub mod validation;

pub use config::{ClientConfig, Credentials, SolverConfig};
pub use cpanel::{CpanelClient, ZoneLock};
pub use error::{ConfigError, CpanelError, SolverError};
pub use solver::{ChallengeRequest, ChallengeSolver, CpanelSolver};
