pub mod error;
pub mod memory;
pub mod repository;

pub use error::StorageError;
pub use memory::MemoryStore;
pub use repository::{
    AppointmentRepository, PaymentRepository, ProviderDirectory, SessionRepository,
};
