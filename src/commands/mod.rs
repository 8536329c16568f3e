/// Conninfo command functionality
pub mod conninfo;
/// Ping command functionality
pub mod ping;
