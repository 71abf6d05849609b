pub mod client;

pub use client::{OrderRequest, RazorpayClient, RazorpayError};
