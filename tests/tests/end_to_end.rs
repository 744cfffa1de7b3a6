mod utils;
#[allow(unused)]
use utils::*;

#[cfg(feature = "integration")]
mod tests {
    use super::*;

    use coinload::prelude::*;
    use mock_shop::ShopConfig;
    use std::time::Duration;

    #[tokio::test]
    #[ntest::timeout(30_000)]
    async fn full_population_run_is_clean() {
        init();
        spawn_shop(8091, ShopConfig::default()).await;

        let report = LoadTest::new("http://0.0.0.0:8091")
            .users(5)
            .duration(Duration::from_secs(3))
            .pacing(Duration::from_millis(100))
            .await
            .unwrap();

        // One auth per user, ever.
        let auth = report.check(Check::Auth);
        assert_eq!(auth.passed, 5);
        assert_eq!(auth.failed, 0);

        assert!(report.check(Check::Info).passed >= 5);
        assert!(report.check(Check::SendCoin).passed >= 5);
        assert!(report.check(Check::BuyItem).passed >= 5);
        assert_eq!(report.error_rate(), 0.);

        // Bounded overshoot past the configured duration.
        assert!(report.elapsed >= Duration::from_secs(3));
        assert!(report.elapsed < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn unreachable_target_still_produces_a_report() {
        init();

        let report = LoadTest::new("http://0.0.0.0:59999")
            .users(2)
            .duration(Duration::from_secs(1))
            .pacing(Duration::from_millis(100))
            .await
            .unwrap();

        assert!(report.total_requests() > 0);
        assert_eq!(report.error_rate(), 1.);
    }

    #[tokio::test]
    async fn throttled_target_shows_up_as_failed_checks() {
        init();
        spawn_shop(8092, ShopConfig { max_tps: Some(1) }).await;

        let report = LoadTest::new("http://0.0.0.0:8092")
            .users(10)
            .duration(Duration::from_secs(2))
            .pacing(Duration::from_millis(50))
            .await
            .unwrap();

        // The cap turns most responses into 500s; the run itself never aborts.
        assert!(report.total_requests() > 0);
        assert!(report.total_failed() > 0);
    }

    #[tokio::test]
    async fn mock_shop_rejects_missing_bearer() {
        init();
        spawn_shop(8093, ShopConfig::default()).await;

        let client = reqwest::Client::new();
        let res = client
            .get("http://0.0.0.0:8093/api/info")
            .send()
            .await
            .unwrap();
        assert_eq!(res.status().as_u16(), 401);

        let body: serde_json::Value = res.json().await.unwrap();
        assert!(body.get("Errors").is_some());
    }
}
