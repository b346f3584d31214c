//! API middleware. The audit logger wraps every route.

pub mod audit;
