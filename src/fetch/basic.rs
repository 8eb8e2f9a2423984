use super::client::HttpClient;
use reqwest::blocking::{Client, Request, Response};
use std::time::Duration;

pub struct BasicClient(Client);

impl BasicClient {
    pub fn new() -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self(client))
    }
}

impl HttpClient for BasicClient {
    fn execute(&self, req: Request) -> reqwest::Result<Response> {
        self.0.execute(req)
    }
}
