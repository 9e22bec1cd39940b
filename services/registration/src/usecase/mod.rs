pub mod complete;
pub mod gate;
pub mod session;
pub mod signup;
