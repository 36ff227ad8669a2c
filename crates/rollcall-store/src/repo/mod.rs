pub mod communications;
pub mod contacts;

pub use communications::{CommunicationsRepo, StoredCommunication};
pub use contacts::ContactsRepo;
