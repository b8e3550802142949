mod common;

use std::sync::Arc;

use cat_server::cache::{CacheName, InMemoryUserCache, UserCache};
use cat_server::lookup::EntityLookup;
use cat_server::models::User;
use cat_server::store::Stores;

fn lookup_with(stores: &Stores, cache: Arc<dyn UserCache>) -> EntityLookup {
    EntityLookup::new(stores.users.clone(), stores.assessments.clone(), cache)
}

#[tokio::test]
async fn misses_are_not_cached() {
    let (stores, log) = common::counting(Stores::memory());
    let lookup = common::lookup_over(&stores);

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let lookup = lookup.clone();
        tasks.push(tokio::spawn(async move {
            lookup.find_one_by_login("carol").await
        }));
    }
    for task in tasks {
        assert_eq!(task.await.unwrap().unwrap(), None);
    }
    assert_eq!(log.count("users.find_by_login"), 8);

    // Written straight to the store, not through the lookup
    let carol = User::new("carol", "carol@example.com");
    stores.users.save(&carol).await.unwrap();

    let found = lookup.find_one_by_login("carol").await.unwrap();
    assert_eq!(found.map(|u| u.id), Some(carol.id));
}

#[tokio::test]
async fn hits_are_served_from_cache() {
    let (stores, log) = common::counting(Stores::memory());
    let cache = Arc::new(InMemoryUserCache::new(0));
    let lookup = lookup_with(&stores, cache.clone());

    let bob = User::new("bob", "bob@example.com");
    stores.users.save(&bob).await.unwrap();

    for _ in 0..3 {
        let found = lookup.find_one_by_login("bob").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(bob.id));
    }
    assert_eq!(log.count("users.find_by_login"), 1);
    assert_eq!(cache.len(CacheName::UsersByLogin), 1);

    for _ in 0..2 {
        let found = lookup.find_one_by_email_ignore_case("BOB@example.com").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(bob.id));
    }
    assert_eq!(log.count("users.find_by_email"), 1);
}

#[tokio::test]
async fn cache_key_ignores_case() {
    let (stores, log) = common::counting(Stores::memory());
    let lookup = common::lookup_over(&stores);

    let alice = User::new("alice", "alice@example.com");
    stores.users.save(&alice).await.unwrap();

    let upper = lookup.find_one_by_login("ALICE").await.unwrap();
    let lower = lookup.find_one_by_login("alice").await.unwrap();

    assert_eq!(upper, lower);
    assert_eq!(upper.map(|u| u.id), Some(alice.id));
    assert_eq!(log.count("users.find_by_login"), 1);
}

#[tokio::test]
async fn unavailable_cache_falls_back_to_store() {
    let (stores, log) = common::counting(Stores::memory());
    let lookup = lookup_with(&stores, Arc::new(common::UnavailableCache));

    let bob = User::new("bob", "bob@example.com");
    let saved = lookup.save_user(&bob).await.unwrap();
    assert_eq!(saved.id, bob.id);

    for _ in 0..2 {
        let found = lookup.find_one_by_login("bob").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(bob.id));
    }
    assert_eq!(log.count("users.find_by_login"), 2);

    assert_eq!(lookup.find_one_by_email_ignore_case("nobody@example.com").await.unwrap(), None);

    lookup.delete_user(&bob).await.unwrap();
    assert_eq!(lookup.find_one_by_login("bob").await.unwrap(), None);
}

#[tokio::test]
async fn saving_a_user_evicts_old_and_new_keys() {
    let stores = Stores::memory();
    let cache = Arc::new(InMemoryUserCache::new(0));
    let lookup = lookup_with(&stores, cache.clone());

    let mut bob = User::new("bob", "bob@example.com");
    lookup.save_user(&bob).await.unwrap();
    lookup.find_one_by_login("bob").await.unwrap();
    lookup.find_one_by_email_ignore_case("bob@example.com").await.unwrap();
    assert_eq!(cache.len(CacheName::UsersByLogin), 1);
    assert_eq!(cache.len(CacheName::UsersByEmail), 1);

    bob.login = "robert".to_string();
    bob.email = "robert@example.com".to_string();
    lookup.save_user(&bob).await.unwrap();

    assert!(cache.is_empty(CacheName::UsersByLogin));
    assert!(cache.is_empty(CacheName::UsersByEmail));
    assert_eq!(lookup.find_one_by_login("bob").await.unwrap(), None);
    let renamed = lookup.find_one_by_login("robert").await.unwrap();
    assert_eq!(renamed.map(|u| u.id), Some(bob.id));
}

#[tokio::test]
async fn cached_lookup_over_http_sees_renames() {
    let app = common::spawn_app().await;
    let mut dave = app.create_user("dave").await;

    let (_, status, _) = app.get("/api/users/dave").await;
    assert_eq!(status, reqwest::StatusCode::OK);

    dave.login = "david".to_string();
    app.state.lookup.save_user(&dave).await.unwrap();

    let (_, status, _) = app.get("/api/users/dave").await;
    assert_eq!(status, reqwest::StatusCode::NOT_FOUND);
    let (body, status, _) = app.get("/api/users/DAVID").await;
    assert_eq!(status, reqwest::StatusCode::OK);
    assert_eq!(body["id"], dave.id.to_string());
}
