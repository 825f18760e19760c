pub mod filter;
pub mod store;

pub use filter::{AppointmentListFilter, StatusFilter};
pub use store::AppointmentStore;
