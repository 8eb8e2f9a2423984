use reqwest::blocking::{Request, Response};

/// Executes prepared HTTP requests. Wrappers implement this to add
/// authentication before delegating to an inner client.
pub trait HttpClient {
    fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
