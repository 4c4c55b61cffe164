pub mod application;
pub mod job;
pub mod posting;
pub mod subscription;
pub mod user;
