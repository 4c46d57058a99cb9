pub mod app;

pub use app::{TestApp, bearer, json_request, make_app};
