//! In-memory fault persistence.

mod fault;

pub use fault::InMemoryFaultRepository;
