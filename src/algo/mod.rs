pub mod dp;

pub use dp::DPAgent;
