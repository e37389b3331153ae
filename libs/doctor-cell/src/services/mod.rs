pub mod directory;
pub mod availability;

pub use directory::DirectoryService;
pub use availability::AvailabilityService;
