//! Request logging.

pub mod request_repository;
