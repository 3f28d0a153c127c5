use std::time::Duration;

use chrono::{TimeDelta, Utc};
use sessionstore_db::{DbPool, MIGRATOR, entities::session::Session};

use super::test_store;

#[sqlx::test(migrator = "MIGRATOR")]
async fn background_cleanup_sweeps_expired_sessions(pool: DbPool) {
    let store = test_store(pool.clone()).with_cleanup_interval(TimeDelta::milliseconds(50));
    let now = Utc::now();

    for i in 0..3 {
        store
            .commit(&format!("expired-{i}"), b"old", now - TimeDelta::minutes(5))
            .await
            .unwrap();
    }
    store
        .commit("valid", b"new", now + TimeDelta::hours(1))
        .await
        .unwrap();

    let handle = store.start_cleanup().expect("cleanup should be running");

    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(Session::count(&pool).await.unwrap(), 1);
    assert_eq!(store.find("valid").await.unwrap(), Some(b"new".to_vec()));

    store.stop_cleanup();
    handle.await.unwrap();
}

#[sqlx::test(migrator = "MIGRATOR")]
async fn disabled_cleanup_never_sweeps(pool: DbPool) {
    for interval in [TimeDelta::zero(), TimeDelta::milliseconds(-50)] {
        let store = test_store(pool.clone()).with_cleanup_interval(interval);

        store
            .commit("expired", b"old", Utc::now() - TimeDelta::minutes(5))
            .await
            .unwrap();

        assert!(store.start_cleanup().is_none());

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(
            Session::try_get_by_token("expired", &pool)
                .await
                .unwrap()
                .is_some(),
            "no sweep should run with interval {interval}"
        );
    }
}

#[sqlx::test(migrator = "MIGRATOR")]
async fn stopped_cleanup_leaves_new_expired_sessions(pool: DbPool) {
    let store = test_store(pool.clone()).with_cleanup_interval(TimeDelta::milliseconds(50));

    let handle = store.start_cleanup().expect("cleanup should be running");
    store.stop_cleanup();
    handle.await.unwrap();

    store
        .commit("expired", b"old", Utc::now() - TimeDelta::minutes(5))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(
        Session::try_get_by_token("expired", &pool)
            .await
            .unwrap()
            .is_some(),
        "no sweep should run after the cleanup was stopped"
    );
    assert!(store.start_cleanup().is_none());

    // Manual sweeps still work once the background cleanup is gone.
    assert_eq!(store.delete_expired().await.unwrap(), 1);
}
