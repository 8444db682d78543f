pub mod extract;
pub mod inventory;
pub mod outline;
pub mod status;
