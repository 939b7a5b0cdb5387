pub mod call_record;
pub mod carrier;
pub mod load;
pub mod session;
