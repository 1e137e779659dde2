mod interceptor;
mod passthrough;
mod server;

pub use interceptor::{CaptureInterceptor, Interceptor, InterceptorChain};
pub use passthrough::UpstreamTarget;
pub(crate) use server::create_error_response;
pub use server::{AppState, ProxyServer, create_router};
