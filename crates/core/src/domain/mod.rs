pub mod order;
pub mod session;
