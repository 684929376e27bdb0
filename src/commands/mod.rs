pub mod email_body;
pub mod status;
pub mod suggest;
pub mod sync;
