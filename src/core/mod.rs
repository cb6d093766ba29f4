pub mod discovery;
pub mod error;
pub mod module;
pub mod options;
pub mod rate_limit;
pub mod registry;
pub mod scope;
pub mod workspace;
