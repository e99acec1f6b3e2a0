pub mod action;
pub mod config;
pub mod exception;
pub mod filters;
pub mod param;
pub mod params;
pub mod request;
pub mod response;
pub mod serializer;
pub mod url;

pub use action::{Action, ActionConfig, ActionContext, Endpoint, JsonOptions, Reply};
pub use config::Config;
pub use exception::Exception;
pub use filters::{Filter, FilterList};
pub use param::HttpRequestMethod;
pub use params::{ParamPrecedence, Params};
pub use request::Request;
pub use response::Response;
pub use serializer::{JsonSerializer, StandardJson};
pub use url::UrlOptions;
