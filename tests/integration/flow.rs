//! One update cycle against a mocked release feed.

use crate::common::FeedFixture;
use kvm_updater::core::UpdaterError;
use kvm_updater::test_utils::{RecordingPrompt, init_test_logging, test_update_config};
use kvm_updater::update::{CheckOutcome, ChoiceStore, PromptResponse, UpdateFlow};
use kvm_updater::version::VersionOrdering;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::ResponseTemplate;

#[tokio::test]
async fn test_feed_error_status_skips_prompt_and_download() {
    init_test_logging(None);
    let feed = FeedFixture::start().await;
    feed.release_body(ResponseTemplate::new(500).set_body_string("upstream unavailable")).await;
    feed.installer_status(200, 0).await;

    let prompt = Arc::new(RecordingPrompt::accepting());
    let flow = UpdateFlow::new(&test_update_config(&feed.feed_url(), "v1.0.0"), prompt.clone())
        .unwrap();

    match flow.check_for_updates().await {
        CheckOutcome::CheckFailed(UpdaterError::NetworkError {
            reason,
            ..
        }) => {
            assert!(reason.contains("500"), "unexpected reason: {reason}");
            assert!(reason.contains("upstream unavailable"));
        }
        other => panic!("expected CheckFailed, got {other:?}"),
    }
    assert_eq!(prompt.calls(), 0);
}

#[tokio::test]
async fn test_malformed_feed_is_parse_error() {
    let feed = FeedFixture::start().await;
    feed.release_body(ResponseTemplate::new(200).set_body_string(r#"{"assets": []}"#)).await;

    let prompt = Arc::new(RecordingPrompt::accepting());
    let flow = UpdateFlow::new(&test_update_config(&feed.feed_url(), "v1.0.0"), prompt.clone())
        .unwrap();

    let outcome = flow.check_for_updates().await;
    assert!(
        matches!(outcome, CheckOutcome::CheckFailed(UpdaterError::ParseError { .. })),
        "got {outcome:?}"
    );
    assert_eq!(prompt.calls(), 0);
}

#[tokio::test]
async fn test_no_installer_asset_skips_prompt_and_download() {
    let feed = FeedFixture::start().await;
    let body = serde_json::json!({
        "tag_name": "v9.9.9",
        "assets": [
            { "name": "setup.zip", "browser_download_url": feed.installer_url() },
            { "name": "setup.exe" },
            { "browser_download_url": feed.installer_url() }
        ]
    });
    feed.release_body(ResponseTemplate::new(200).set_body_json(body)).await;
    feed.installer_status(200, 0).await;

    let prompt = Arc::new(RecordingPrompt::accepting());
    let flow = UpdateFlow::new(&test_update_config(&feed.feed_url(), "v1.0.0"), prompt.clone())
        .unwrap();

    match flow.check_for_updates().await {
        CheckOutcome::CheckFailed(UpdaterError::NoInstallerAsset {
            tag,
            extension,
        }) => {
            assert_eq!(tag, "v9.9.9");
            assert_eq!(extension, ".exe");
        }
        other => panic!("expected NoInstallerAsset, got {other:?}"),
    }
    assert_eq!(prompt.calls(), 0);
}

#[tokio::test]
async fn test_same_version_is_no_update() {
    let feed = FeedFixture::start().await;
    feed.release_with_installer("v1.0.0").await;
    feed.installer_status(200, 0).await;

    let prompt = Arc::new(RecordingPrompt::accepting());
    let flow = UpdateFlow::new(&test_update_config(&feed.feed_url(), "v1.0.0"), prompt.clone())
        .unwrap();

    match flow.check_for_updates().await {
        CheckOutcome::NoUpdate {
            current,
            latest,
        } => {
            assert_eq!(current, "v1.0.0");
            assert_eq!(latest, "v1.0.0");
        }
        other => panic!("expected NoUpdate, got {other:?}"),
    }
    assert_eq!(prompt.calls(), 0);
}

#[tokio::test]
async fn test_malformed_remote_tag_is_not_offered() {
    let feed = FeedFixture::start().await;
    feed.release_with_installer("latest").await;
    feed.installer_status(200, 0).await;

    let prompt = Arc::new(RecordingPrompt::accepting());
    let flow = UpdateFlow::new(&test_update_config(&feed.feed_url(), "0.3.2"), prompt.clone())
        .unwrap();

    let outcome = flow.check_for_updates().await;
    assert!(matches!(outcome, CheckOutcome::NoUpdate { .. }), "got {outcome:?}");
    assert_eq!(prompt.calls(), 0);
}

#[tokio::test]
async fn test_semantic_ordering_does_not_offer_older_release() {
    let feed = FeedFixture::start().await;
    feed.release_with_installer("v2.9.0").await;

    let prompt = Arc::new(RecordingPrompt::accepting());
    let flow = UpdateFlow::new(&test_update_config(&feed.feed_url(), "v2.10.0"), prompt.clone())
        .unwrap();

    let outcome = flow.check_for_updates().await;
    assert!(matches!(outcome, CheckOutcome::NoUpdate { .. }), "got {outcome:?}");
    assert_eq!(prompt.calls(), 0);
}

#[tokio::test]
async fn test_lexical_ordering_offers_older_release() {
    let feed = FeedFixture::start().await;
    feed.release_with_installer("v2.9.0").await;
    feed.installer_status(200, 0).await;

    let mut config = test_update_config(&feed.feed_url(), "v2.10.0");
    config.version_ordering = VersionOrdering::Lexical;

    let prompt = Arc::new(RecordingPrompt::declining());
    let flow = UpdateFlow::new(&config, prompt.clone()).unwrap();

    let outcome = flow.check_for_updates().await;
    assert!(matches!(outcome, CheckOutcome::Declined { .. }), "got {outcome:?}");
    assert_eq!(prompt.calls(), 1);
}

#[tokio::test]
async fn test_decline_skips_download() {
    let feed = FeedFixture::start().await;
    feed.release_with_installer("v9.9.9").await;
    feed.installer_status(200, 0).await;

    let prompt = Arc::new(RecordingPrompt::declining());
    let flow = UpdateFlow::new(&test_update_config(&feed.feed_url(), "v1.0.0"), prompt.clone())
        .unwrap();

    match flow.check_for_updates().await {
        CheckOutcome::Declined {
            latest,
        } => assert_eq!(latest, "v9.9.9"),
        other => panic!("expected Declined, got {other:?}"),
    }
    assert_eq!(prompt.calls(), 1);

    let request = prompt.last_request().unwrap();
    assert_eq!(request.current_version, "v1.0.0");
    assert_eq!(request.latest_version, "v9.9.9");
}

#[tokio::test]
async fn test_download_failure_is_reported() {
    let feed = FeedFixture::start().await;
    feed.release_with_installer("v9.9.9").await;
    feed.installer_status(404, 1).await;

    let prompt = Arc::new(RecordingPrompt::accepting());
    let flow = UpdateFlow::new(&test_update_config(&feed.feed_url(), "v1.0.0"), prompt.clone())
        .unwrap();

    let outcome = flow.check_for_updates().await;
    assert!(
        matches!(outcome, CheckOutcome::DownloadFailed(UpdaterError::DownloadError { .. })),
        "got {outcome:?}"
    );
    assert!(outcome.shutdown_request().is_none());
    assert_eq!(prompt.calls(), 1);
}

#[tokio::test]
async fn test_unresponsive_download_host_times_out() {
    init_test_logging(None);
    let feed = FeedFixture::start().await;
    feed.release_with_installer("v9.9.9").await;
    feed.installer_response(
        ResponseTemplate::new(200)
            .set_body_bytes(b"never delivered".to_vec())
            .set_delay(Duration::from_secs(30)),
        1,
    )
    .await;

    let mut config = test_update_config(&feed.feed_url(), "v1.0.0");
    config.request_timeout = 1;
    let prompt = Arc::new(RecordingPrompt::accepting());
    let flow = UpdateFlow::new(&config, prompt.clone()).unwrap();

    let outcome = tokio::time::timeout(Duration::from_secs(10), flow.check_for_updates())
        .await
        .expect("download without response headers should time out");
    match outcome {
        CheckOutcome::DownloadFailed(UpdaterError::DownloadError {
            reason,
            ..
        }) => assert!(reason.contains("no response within 1s"), "unexpected reason: {reason}"),
        other => panic!("expected DownloadFailed, got {other:?}"),
    }
    assert_eq!(prompt.calls(), 1);
}

#[tokio::test]
async fn test_concurrent_check_is_busy() {
    let feed = FeedFixture::start().await;
    let body = kvm_updater::test_utils::release_json("v1.0.0", &[]);
    feed.release_body(
        ResponseTemplate::new(200).set_body_json(body).set_delay(Duration::from_millis(500)),
    )
    .await;

    let prompt = Arc::new(RecordingPrompt::accepting());
    let flow = Arc::new(
        UpdateFlow::new(&test_update_config(&feed.feed_url(), "v1.0.0"), prompt.clone()).unwrap(),
    );

    let first = {
        let flow = Arc::clone(&flow);
        tokio::spawn(async move { flow.check_for_updates().await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(flow.is_running());

    let second = flow.check_for_updates().await;
    assert!(matches!(second, CheckOutcome::Busy), "got {second:?}");

    let first = first.await.unwrap();
    assert!(matches!(first, CheckOutcome::CheckFailed(_)), "got {first:?}");
    assert!(!flow.is_running());

    // The guard is released, so the next cycle runs normally.
    let third = flow.check_for_updates().await;
    assert!(!matches!(third, CheckOutcome::Busy));
}

#[tokio::test]
async fn test_remembered_decline_applies_to_that_version_only() {
    let feed = FeedFixture::start().await;
    feed.release_with_installer("v2.0.0").await;
    feed.installer_status(200, 0).await;

    let temp = TempDir::new().unwrap();
    let store = ChoiceStore::beside_config(&temp.path().join("config.toml"));

    let prompt = Arc::new(RecordingPrompt::new(PromptResponse::decline().remembered()));
    let flow = UpdateFlow::new(&test_update_config(&feed.feed_url(), "v1.0.0"), prompt.clone())
        .unwrap()
        .with_choice_store(store.clone());

    assert!(matches!(flow.check_for_updates().await, CheckOutcome::Declined { .. }));
    assert_eq!(prompt.calls(), 1);
    assert_eq!(store.lookup("v2.0.0").await, Some(false));

    // Same release: the remembered answer is used without asking.
    assert!(matches!(flow.check_for_updates().await, CheckOutcome::Declined { .. }));
    assert_eq!(prompt.calls(), 1);

    // A newer release asks again.
    feed.server.reset().await;
    feed.release_with_installer("v3.0.0").await;
    feed.installer_status(200, 0).await;

    assert!(matches!(flow.check_for_updates().await, CheckOutcome::Declined { .. }));
    assert_eq!(prompt.calls(), 2);
    assert_eq!(prompt.last_request().unwrap().latest_version, "v3.0.0");
}

#[cfg(unix)]
mod installer_runs {
    use super::*;
    use kvm_updater::test_utils::recorded_installer_path;
    use kvm_updater::update::ShutdownRequest;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_end_to_end_update_is_applied_once() {
        init_test_logging(None);
        let feed = FeedFixture::start().await;
        feed.release_with_installer("v9.9.9").await;

        let temp = TempDir::new().unwrap();
        let args_log = temp.path().join("installer.log");
        feed.installer(&args_log, 0, 1).await;

        let mut config = test_update_config(&feed.feed_url(), "v1.0.0");
        config.relaunch_command = Some(PathBuf::from("/opt/monitor-controller-kvm/app"));

        let prompt = Arc::new(RecordingPrompt::accepting());
        let flow = UpdateFlow::new(&config, prompt.clone()).unwrap();

        let outcome = flow.check_for_updates().await;
        match outcome {
            CheckOutcome::UpdateApplied(request) => assert_eq!(
                request,
                ShutdownRequest {
                    version: "v9.9.9".to_string(),
                    relaunch: Some(PathBuf::from("/opt/monitor-controller-kvm/app")),
                }
            ),
            other => panic!("expected UpdateApplied, got {other:?}"),
        }

        assert_eq!(prompt.calls(), 1);
        assert_eq!(std::fs::read_to_string(&args_log).unwrap(), "/silent\n");

        let installer = recorded_installer_path(&args_log).unwrap();
        assert_eq!(installer.file_name().unwrap(), "setup.exe");
        assert!(!installer.exists());
        assert!(!installer.parent().unwrap().exists(), "download directory left behind");
    }

    #[tokio::test]
    async fn test_installer_failure_is_not_applied() {
        let feed = FeedFixture::start().await;
        feed.release_with_installer("v9.9.9").await;

        let temp = TempDir::new().unwrap();
        let args_log = temp.path().join("installer.log");
        feed.installer(&args_log, 3, 1).await;

        let prompt = Arc::new(RecordingPrompt::accepting());
        let flow = UpdateFlow::new(&test_update_config(&feed.feed_url(), "v1.0.0"), prompt.clone())
            .unwrap();

        let outcome = flow.check_for_updates().await;
        match &outcome {
            CheckOutcome::InstallFailed(UpdaterError::InstallerFailed {
                code,
                ..
            }) => assert_eq!(*code, Some(3)),
            other => panic!("expected InstallFailed, got {other:?}"),
        }
        assert!(outcome.shutdown_request().is_none());

        let installer = recorded_installer_path(&args_log).unwrap();
        assert!(!installer.parent().unwrap().exists(), "download directory left behind");
    }

    #[tokio::test]
    async fn test_custom_installer_arguments() {
        let feed = FeedFixture::start().await;
        feed.release_with_installer("v9.9.9").await;

        let temp = TempDir::new().unwrap();
        let args_log = temp.path().join("installer.log");
        feed.installer(&args_log, 0, 1).await;

        let mut config = test_update_config(&feed.feed_url(), "v1.0.0");
        config.installer_args = vec!["/VERYSILENT".to_string(), "/NORESTART".to_string()];

        let flow = UpdateFlow::new(&config, Arc::new(RecordingPrompt::accepting())).unwrap();

        assert!(matches!(flow.check_for_updates().await, CheckOutcome::UpdateApplied(_)));
        assert_eq!(std::fs::read_to_string(&args_log).unwrap(), "/VERYSILENT /NORESTART\n");
    }

    #[tokio::test]
    async fn test_remembered_accept_installs_without_prompt() {
        let feed = FeedFixture::start().await;
        feed.release_with_installer("v9.9.9").await;

        let temp = TempDir::new().unwrap();
        let args_log = temp.path().join("installer.log");
        feed.installer(&args_log, 0, 1).await;

        let store = ChoiceStore::beside_config(&temp.path().join("config.toml"));
        store.remember("v9.9.9", true).await.unwrap();

        let prompt = Arc::new(RecordingPrompt::declining());
        let flow = UpdateFlow::new(&test_update_config(&feed.feed_url(), "v1.0.0"), prompt.clone())
            .unwrap()
            .with_choice_store(store);

        assert!(matches!(flow.check_for_updates().await, CheckOutcome::UpdateApplied(_)));
        assert_eq!(prompt.calls(), 0);
    }
}
