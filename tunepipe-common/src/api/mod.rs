//! Request/response types shared between the relay and its collaborators

pub mod types;
