//! Mocked release feed shared by the integration tests.

use kvm_updater::test_utils::{fake_installer_script, release_json};
use std::path::Path;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const FEED_PATH: &str = "/repos/dbtdsilva/monitor-controller-kvm/releases/latest";
pub const INSTALLER_PATH: &str = "/download/setup.exe";

/// A release feed and download host on one mock server.
pub struct FeedFixture {
    pub server: MockServer,
}

impl FeedFixture {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn feed_url(&self) -> String {
        format!("{}{}", self.server.uri(), FEED_PATH)
    }

    pub fn installer_url(&self) -> String {
        format!("{}{}", self.server.uri(), INSTALLER_PATH)
    }

    /// Serve `tag` with a single `setup.exe` asset pointing at this server.
    pub async fn release_with_installer(&self, tag: &str) {
        let installer_url = self.installer_url();
        let body = release_json(tag, &[("setup.exe", installer_url.as_str())]);
        self.release_body(ResponseTemplate::new(200).set_body_json(body)).await;
    }

    /// Serve an arbitrary feed response.
    pub async fn release_body(&self, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(FEED_PATH))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }

    /// Serve a fake installer that logs its arguments to `args_log`.
    /// `expected` is the exact number of downloads allowed.
    pub async fn installer(&self, args_log: &Path, exit_code: i32, expected: u64) {
        let script = fake_installer_script(args_log, exit_code);
        Mock::given(method("GET"))
            .and(path(INSTALLER_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(script.into_bytes()))
            .expect(expected)
            .mount(&self.server)
            .await;
    }

    /// Fail any installer download; `expected` as in [`FeedFixture::installer`].
    pub async fn installer_status(&self, status: u16, expected: u64) {
        self.installer_response(ResponseTemplate::new(status), expected).await;
    }

    /// Serve an arbitrary installer response.
    pub async fn installer_response(&self, response: ResponseTemplate, expected: u64) {
        Mock::given(method("GET"))
            .and(path(INSTALLER_PATH))
            .respond_with(response)
            .expect(expected)
            .mount(&self.server)
            .await;
    }
}
