//! Request construction: calls, parameters and the plain-data HTTP request.

mod call;
pub mod http;
mod parameters;

pub use call::Call;
pub use http::{HttpMethod, HttpRequest};
pub use parameters::{ParameterType, Parameters};
