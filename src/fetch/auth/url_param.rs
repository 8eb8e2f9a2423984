use crate::fetch::client::HttpClient;
use reqwest::blocking::{Request, Response};

/// An [`HttpClient`] wrapper that appends an API key as a URL query parameter.
///
/// `param_name` is the query parameter name (e.g. `"api_key"`) and `key` is
/// its value.
pub struct UrlParam<C> {
    pub inner: C,
    pub param_name: String,
    pub key: String,
}

impl<C> UrlParam<C> {
    /// Adds the key to `req` without sending it.
    pub fn authorize(&self, mut req: Request) -> Request {
        req.url_mut()
            .query_pairs_mut()
            .append_pair(&self.param_name, &self.key);
        req
    }
}

impl<C: HttpClient> HttpClient for UrlParam<C> {
    fn execute(&self, req: Request) -> reqwest::Result<Response> {
        self.inner.execute(self.authorize(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::BasicClient;

    #[test]
    fn test_key_is_appended_to_existing_query() {
        let client = UrlParam {
            inner: BasicClient::new().unwrap(),
            param_name: "api_key".to_string(),
            key: "secret".to_string(),
        };
        let req = Request::new(
            reqwest::Method::GET,
            "https://example.com/value?select=[0:10:2]".parse().unwrap(),
        );

        let req = client.authorize(req);
        let pairs: Vec<_> = req.url().query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            [
                ("select".to_string(), "[0:10:2]".to_string()),
                ("api_key".to_string(), "secret".to_string())
            ]
        );
    }
}
