pub mod appname;
pub mod fingerprint;
pub mod moduleinfo;
