mod atomic_write;

pub use atomic_write::write_atomically;
