pub mod cores;

pub use cores::default_worker_count;
