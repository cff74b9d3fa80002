use super::*;
use stock_watcher::{AppError, Status};

#[tokio::test]
async fn test_stock_change_lifecycle() -> anyhow::Result<()> {
    let harness = create_test_harness().await?;
    let url = harness.url("/charm");

    // 1. Register with one recipient
    let target = harness
        .manager
        .register_or_update(&url, 5, vec!["a@x.com".to_string()])
        .await?;
    assert_eq!(target.last_status, Status::Unknown);

    // 2. First check sets the baseline without a change
    harness.serve("/charm", 200, IN_STOCK_PAGE).await;
    let first = harness.manager.check_one(&url).await?;
    assert_eq!(first.status, Status::InStock);
    assert!(!first.changed);
    assert_eq!(first.target.change_count, 0);
    assert!(harness.notifier.sent().is_empty());

    // 3. The page flips to sold out
    harness.serve("/charm", 200, OUT_OF_STOCK_PAGE).await;
    let second = harness.manager.check_one(&url).await?;
    assert_eq!(second.status, Status::OutOfStock);
    assert!(second.changed);
    assert_eq!(second.target.change_count, 1);

    let sent = harness.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipients, vec!["a@x.com".to_string()]);
    assert_eq!(sent[0].subject, "Stock update");
    assert_eq!(sent[0].body, format!("Page changed. Status: OUT_OF_STOCK. URL: {}", url));

    // 4. The page goes away
    harness.serve("/charm", 500, "oops").await;
    let third = harness.manager.check_one(&url).await?;
    assert_eq!(third.status, Status::Error);
    assert!(!third.changed);
    assert_eq!(third.target.fail_count, 1);
    assert_eq!(third.target.last_status, Status::OutOfStock);
    assert_eq!(third.target.previous_fingerprint, second.target.previous_fingerprint);
    assert!(third.target.last_error.contains("HTTP 500"));
    assert_eq!(harness.notifier.sent().len(), 1);

    // 5. History is visible newest first
    let logs = harness.manager.get_logs(&url).await?;
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].status, Status::Error);
    assert_eq!(logs[1].status, Status::OutOfStock);

    Ok(())
}

#[tokio::test]
async fn test_change_without_recipients_is_silent() -> anyhow::Result<()> {
    let harness = create_test_harness().await?;
    let url = harness.url("/charm");
    harness.manager.register_or_update(&url, 300, vec![]).await?;

    harness.serve("/charm", 200, IN_STOCK_PAGE).await;
    harness.manager.check_one(&url).await?;
    harness.serve("/charm", 200, OUT_OF_STOCK_PAGE).await;
    let outcome = harness.manager.check_one(&url).await?;

    assert!(outcome.changed);
    assert_eq!(outcome.target.change_count, 1);
    assert!(harness.notifier.sent().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_volatile_markup_is_not_a_change() -> anyhow::Result<()> {
    let harness = create_test_harness().await?;
    let url = harness.url("/charm");
    harness
        .manager
        .register_or_update(&url, 300, vec!["a@x.com".to_string()])
        .await?;

    harness.serve("/charm", 200, IN_STOCK_PAGE).await;
    harness.manager.check_one(&url).await?;

    // Only the script token and attribute noise differ
    let reshuffled = IN_STOCK_PAGE
        .replace("window.csrf = \"a1\"", "window.csrf = \"zz\"")
        .replace("<nav>", "<nav data-session=\"42\">");
    harness.serve("/charm", 200, &reshuffled).await;
    let outcome = harness.manager.check_one(&url).await?;

    assert!(!outcome.changed);
    assert_eq!(outcome.target.success_count, 2);
    assert!(harness.notifier.sent().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_blocked_then_served_counts_one_success() -> anyhow::Result<()> {
    let harness = create_test_harness().await?;
    let url = harness.url("/charm");
    harness.manager.register_or_update(&url, 300, vec![]).await?;

    Mock::given(method("GET"))
        .and(path("/charm"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/charm"))
        .respond_with(ResponseTemplate::new(200).set_body_string(IN_STOCK_PAGE))
        .mount(&harness.server)
        .await;

    let outcome = harness.manager.check_one(&url).await?;

    assert_eq!(outcome.status, Status::InStock);
    assert_eq!(outcome.target.success_count, 1);
    assert_eq!(outcome.target.fail_count, 0);
    assert_eq!(harness.server.received_requests().await.unwrap_or_default().len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_counters_add_up() -> anyhow::Result<()> {
    let harness = create_test_harness().await?;
    let url = harness.url("/charm");
    harness
        .manager
        .register_or_update(&url, 300, vec!["a@x.com".to_string()])
        .await?;

    let script: [(u16, &str); 7] = [
        (404, ""),
        (200, IN_STOCK_PAGE),
        (200, IN_STOCK_PAGE),
        (503, ""),
        (200, OUT_OF_STOCK_PAGE),
        (200, IN_STOCK_PAGE),
        (500, ""),
    ];
    for (status, body) in script {
        harness.serve("/charm", status, body).await;
        harness.manager.check_one(&url).await?;
    }

    let target = harness.manager.get_target(&url).await.expect("target registered");
    assert_eq!(target.success_count + target.fail_count, script.len() as u64);
    assert_eq!(target.success_count, 4);
    assert_eq!(target.fail_count, 3);
    assert_eq!(target.change_count, 2);
    assert_eq!(harness.notifier.sent().len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_check_all_keeps_going_after_failures() -> anyhow::Result<()> {
    let harness = create_test_harness().await?;
    let good = harness.url("/a-good");
    let gone = harness.url("/b-gone");
    harness.manager.register_or_update(&good, 300, vec![]).await?;
    harness.manager.register_or_update(&gone, 300, vec![]).await?;

    harness.serve("/a-good", 200, OUT_OF_STOCK_PAGE).await;
    let failures = harness.manager.check_all().await?;

    assert_eq!(failures, 1);
    let targets = harness.manager.list_targets().await;
    let urls: Vec<&str> = targets.iter().map(|t| t.url.as_str()).collect();
    assert_eq!(urls, vec![good.as_str(), gone.as_str()]);
    assert_eq!(targets[0].last_status, Status::OutOfStock);
    assert_eq!(targets[1].fail_count, 1);
    assert!(targets[1].last_error.contains("HTTP 404"));

    Ok(())
}

#[tokio::test]
async fn test_concurrent_checks_lose_no_updates() -> anyhow::Result<()> {
    let harness = create_test_harness().await?;
    let urls: Vec<String> = (0..4).map(|i| harness.url(&format!("/p{}", i))).collect();
    for url in &urls {
        harness.manager.register_or_update(url, 300, vec![]).await?;
    }
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(IN_STOCK_PAGE))
        .mount(&harness.server)
        .await;

    let manager = &harness.manager;
    let (a, b, c, d, registered) = tokio::join!(
        manager.check_one(&urls[0]),
        manager.check_one(&urls[1]),
        manager.check_one(&urls[2]),
        manager.check_one(&urls[3]),
        manager.register_or_update(&urls[0], 60, vec!["late@x.com".to_string()]),
    );
    for outcome in [a, b, c, d] {
        assert_eq!(outcome?.status, Status::InStock);
    }
    registered?;

    for target in harness.manager.list_targets().await {
        assert_eq!(target.success_count, 1, "{}", target.url);
    }
    let first = harness.manager.get_target(&urls[0]).await.expect("target registered");
    assert_eq!(first.interval_sec, 60);
    assert_eq!(first.recipients, vec!["late@x.com".to_string()]);

    Ok(())
}

#[tokio::test]
async fn test_unknown_url_is_not_found() -> anyhow::Result<()> {
    let harness = create_test_harness().await?;
    let url = harness.url("/never-added");

    assert!(matches!(harness.manager.check_one(&url).await, Err(AppError::NotFound { .. })));
    assert!(matches!(harness.manager.get_logs(&url).await, Err(AppError::NotFound { .. })));
    assert!(harness.server.received_requests().await.unwrap_or_default().is_empty());

    Ok(())
}
