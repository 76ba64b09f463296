mod analyze;
mod invalidate;
mod profile;
mod trending;

pub use analyze::analyze;
pub use invalidate::invalidate;
pub use profile::profile;
pub use trending::trending;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;
