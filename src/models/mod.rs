pub mod otp;
pub mod user;
