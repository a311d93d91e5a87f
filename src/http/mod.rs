pub mod client;


pub use client::{ApiPath, BackendClient};
