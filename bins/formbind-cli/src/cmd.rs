pub mod check_config;
pub mod layout;
pub mod paths;
