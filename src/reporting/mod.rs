pub mod model;
pub mod reporter;
pub mod status;
pub mod text;
