use super::*;
use stock_watcher::{Status, TargetStore};

#[tokio::test]
async fn test_state_survives_restart() -> anyhow::Result<()> {
    let harness = create_test_harness().await?;
    let url = harness.url("/charm");
    harness
        .manager
        .register_or_update(&url, 300, vec!["a@x.com".to_string(), "a@x.com".to_string()])
        .await?;
    harness.serve("/charm", 200, IN_STOCK_PAGE).await;
    harness.manager.check_one(&url).await?;

    let before = harness.manager.list_targets().await;
    let reopened = harness.reopen()?;
    let after = reopened.list_targets().await;

    assert_eq!(before, after);
    assert_eq!(after[0].recipients.len(), 2);
    assert_eq!(after[0].last_status, Status::InStock);

    // The baseline carries over, so the next flip is a change
    harness.serve("/charm", 200, OUT_OF_STOCK_PAGE).await;
    let outcome = reopened.check_one(&url).await?;
    assert!(outcome.changed);

    Ok(())
}

#[tokio::test]
async fn test_snapshot_file_layout() -> anyhow::Result<()> {
    let harness = create_test_harness().await?;
    let url = harness.url("/charm");
    harness
        .manager
        .register_or_update(&url, 300, vec!["a@x.com".to_string()])
        .await?;
    harness.serve("/charm", 200, IN_STOCK_PAGE).await;
    harness.manager.check_one(&url).await?;
    harness.serve("/charm", 404, "").await;
    harness.manager.check_one(&url).await?;

    let raw = std::fs::read_to_string(&harness.config.store.path)?;
    let json: serde_json::Value = serde_json::from_str(&raw)?;

    assert!(json["email"].is_object());
    let target = &json["targets"][url.as_str()];
    assert_eq!(target["url"], url.as_str());
    assert_eq!(target["interval_sec"], 300);
    assert_eq!(target["last_status"], "IN_STOCK");
    assert_eq!(target["success_count"], 1);
    assert_eq!(target["fail_count"], 1);
    assert_eq!(target["change_count"], 0);
    assert_eq!(target["log"][0]["event"], "failure");
    assert_eq!(target["log"][0]["status"], "ERROR");
    assert!(target["previous_fingerprint"].as_str().is_some_and(|f| f.len() == 64));

    Ok(())
}

#[tokio::test]
async fn test_corrupt_snapshot_starts_fresh() -> anyhow::Result<()> {
    let harness = create_test_harness().await?;
    std::fs::write(&harness.config.store.path, "{\"targets\": [oops")?;

    assert!(harness.manager.list_targets().await.is_empty());

    // The next write replaces the damaged file
    let url = harness.url("/charm");
    harness.manager.register_or_update(&url, 300, vec![]).await?;
    let store = JsonFileStore::new(&harness.config.store.path);
    assert_eq!(store.load().await.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_remove_persists() -> anyhow::Result<()> {
    let harness = create_test_harness().await?;
    let keep = harness.url("/keep");
    let drop = harness.url("/drop");
    harness.manager.register_or_update(&keep, 300, vec![]).await?;
    harness.manager.register_or_update(&drop, 300, vec![]).await?;

    let removed = harness.manager.remove_target(&drop).await?;
    assert_eq!(removed.url, drop);

    let remaining = harness.reopen()?.list_targets().await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].url, keep);

    Ok(())
}
