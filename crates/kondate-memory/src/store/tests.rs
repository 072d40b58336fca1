use super::Store;
use kondate_core::config::MemoryConfig;
use kondate_core::traits::IngredientStore;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

/// Create an in-memory store for testing.
async fn test_store() -> Store {
    let opts = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(opts)
        .await
        .unwrap();
    Store::run_migrations(&pool).await.unwrap();
    Store { pool }
}

fn items(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_list_unknown_user_is_empty() {
    let store = test_store().await;
    let set = store.list("U-nobody").await.unwrap();
    assert!(set.is_empty());
}

#[tokio::test]
async fn test_add_then_list() {
    let store = test_store().await;
    let set = store
        .add("U1", &items(&["トマト", "卵", "ベーコン"]))
        .await
        .unwrap();
    assert_eq!(set.len(), 3);

    let listed = store.list("U1").await.unwrap();
    let mut got: Vec<_> = listed.items().to_vec();
    got.sort();
    let mut want = items(&["トマト", "卵", "ベーコン"]);
    want.sort();
    assert_eq!(got, want);
}

#[tokio::test]
async fn test_add_is_idempotent() {
    let store = test_store().await;
    let once = store.add("U1", &items(&["egg", "milk"])).await.unwrap();
    let twice = store.add("U1", &items(&["egg", "milk"])).await.unwrap();
    assert_eq!(once, twice);
    assert_eq!(store.list("U1").await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_add_dedups_case_and_whitespace_keeps_first_spelling() {
    let store = test_store().await;
    store.add("U1", &items(&["Bacon"])).await.unwrap();
    let set = store
        .add("U1", &items(&["  bacon ", "BACON", "\u{3000}Onion", ""]))
        .await
        .unwrap();
    assert_eq!(set.items(), &items(&["Bacon", "Onion"]));
}

#[tokio::test]
async fn test_add_empty_returns_current_set() {
    let store = test_store().await;
    store.add("U1", &items(&["鮭"])).await.unwrap();
    let set = store.add("U1", &[]).await.unwrap();
    assert_eq!(set.items(), &items(&["鮭"]));
}

#[tokio::test]
async fn test_list_preserves_insertion_order() {
    let store = test_store().await;
    store.add("U1", &items(&["b", "a"])).await.unwrap();
    store.add("U1", &items(&["c", "a"])).await.unwrap();
    let set = store.list("U1").await.unwrap();
    assert_eq!(set.items(), &items(&["b", "a", "c"]));
}

#[tokio::test]
async fn test_clear_empty_user_succeeds() {
    let store = test_store().await;
    store.clear("U1").await.unwrap();
    store.clear("U1").await.unwrap();
    assert!(store.list("U1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_clear_only_touches_one_user() {
    let store = test_store().await;
    store.add("U1", &items(&["卵"])).await.unwrap();
    store.add("U2", &items(&["卵", "ねぎ"])).await.unwrap();
    store.clear("U1").await.unwrap();
    assert!(store.list("U1").await.unwrap().is_empty());
    assert_eq!(store.list("U2").await.unwrap().len(), 2);
    assert_eq!(store.user_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_concurrent_adds_are_both_kept() {
    let store = test_store().await;
    let a = store.clone();
    let b = store.clone();
    let (ra, rb) = tokio::join!(
        async move { a.add("U1", &items(&["トマト", "卵"])).await },
        async move { b.add("U1", &items(&["ベーコン", "卵"])).await },
    );
    ra.unwrap();
    rb.unwrap();
    let set = store.list("U1").await.unwrap();
    assert_eq!(set.len(), 3);
    for name in ["トマト", "卵", "ベーコン"] {
        assert!(set.contains(name), "missing {name}");
    }
}

#[tokio::test]
async fn test_file_backed_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = MemoryConfig {
        db_path: dir
            .path()
            .join("nested/ingredients.db")
            .to_string_lossy()
            .into_owned(),
    };

    {
        let store = Store::new(&config).await.unwrap();
        store.add("U1", &items(&["豆腐"])).await.unwrap();
        assert!(store.db_size().await.unwrap() > 0);
    }

    let reopened = Store::new(&config).await.unwrap();
    assert_eq!(reopened.list("U1").await.unwrap().items(), &items(&["豆腐"]));
}

#[tokio::test]
async fn test_file_backed_parallel_adds() {
    let dir = tempfile::tempdir().unwrap();
    let config = MemoryConfig {
        db_path: dir.path().join("par.db").to_string_lossy().into_owned(),
    };
    let store = Store::new(&config).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..8 {
        let s = store.clone();
        handles.push(tokio::spawn(async move {
            s.add("U1", &[format!("item{i}"), "shared".to_string()]).await
        }));
    }
    for h in handles {
        h.await.unwrap().unwrap();
    }
    let set = store.list("U1").await.unwrap();
    assert_eq!(set.len(), 9);
}

#[tokio::test]
async fn test_migrations_are_tracked_once() {
    let store = test_store().await;
    Store::run_migrations(&store.pool).await.unwrap();
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM _migrations")
        .fetch_one(&store.pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}
