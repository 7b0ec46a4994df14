//! Properties of the local diet log, as the pages see it

use chrono::NaiveDate;

use food_diary::cache::Cache;
use food_diary::nutrition::aggregate;
use food_diary::traits::DietLogSource;
use food_diary::{EntryDraft, EntryId, Meal, Nutrients};

fn temp_slot(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("food-diary-diet-log-{}-{}.json", name, EntryId::random()))
}

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

async fn populated_cache(name: &str) -> Cache {
    let mut cache = Cache::new(&temp_slot(name));
    cache.add(EntryDraft::new(date("2024-03-05"), Meal::Lunch, "rice bowl", Nutrients::calories(500.0))).await.unwrap();
    cache.add(EntryDraft::new(date("2024-03-05"), Meal::Dinner, "steak", Nutrients::calories(700.0))).await.unwrap();
    cache.add(EntryDraft::new(date("2024-03-06"), Meal::Lunch, "salad", Nutrients::calories(300.0))).await.unwrap();
    cache
}

#[tokio::test]
async fn totals_of_a_day() {
    let _ = env_logger::builder().is_test(true).try_init();
    let cache = populated_cache("totals").await;

    let day = cache.query(date("2024-03-05"), None).await.unwrap();
    assert_eq!(day.len(), 2);
    assert!(day.iter().all(|e| e.date() == date("2024-03-05")));
    assert_eq!(aggregate(&day, None).cals, 1200.0);

    let lunch = cache.query(date("2024-03-05"), Some(Meal::Lunch)).await.unwrap();
    assert_eq!(aggregate(&lunch, None).cals, 500.0);
    assert_eq!(aggregate(&day, Some(Meal::Lunch)).cals, 500.0);

    let _ = std::fs::remove_file(cache.backing_file());
}

#[tokio::test]
async fn added_entry_is_queried_once() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut cache = populated_cache("add").await;

    let added = cache.add(EntryDraft::new(date("2024-03-06"), Meal::Other, "apple", Nutrients::calories(80.0))).await.unwrap();
    let day = cache.query(date("2024-03-06"), None).await.unwrap();
    assert_eq!(day.iter().filter(|e| e.id() == added.id()).count(), 1);
    assert_eq!(day.len(), 2);

    // Order is stable between two queries
    let again = cache.query(date("2024-03-06"), None).await.unwrap();
    assert_eq!(day, again);

    let _ = std::fs::remove_file(cache.backing_file());
}

#[tokio::test]
async fn removing_an_absent_id_is_a_noop() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut cache = populated_cache("remove").await;

    let before = cache.entries().to_vec();
    cache.remove(&EntryId::from("does-not-exist")).await.unwrap();
    assert_eq!(cache.entries(), &before[..]);

    let _ = std::fs::remove_file(cache.backing_file());
}

#[tokio::test]
async fn entries_survive_a_reload() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut cache = populated_cache("reload").await;

    let steak = cache.query(date("2024-03-05"), Some(Meal::Dinner)).await.unwrap().remove(0);
    cache.remove(steak.id()).await.unwrap();

    let reloaded = Cache::open(cache.backing_file());
    let day = reloaded.query(date("2024-03-05"), None).await.unwrap();
    assert_eq!(day.len(), 1);
    assert_eq!(day[0].name(), "rice bowl");
    assert!(reloaded.has_same_observable_content_as(&cache));

    let _ = std::fs::remove_file(cache.backing_file());
}

#[tokio::test]
async fn invalid_slot_starts_empty() {
    let _ = env_logger::builder().is_test(true).try_init();
    let path = temp_slot("invalid");
    std::fs::write(&path, "this is not json").unwrap();

    let mut cache = Cache::open(&path);
    assert!(cache.entries().is_empty());

    // The unreadable content is not lost when the slot is written again
    cache.add(EntryDraft::new(date("2024-03-05"), Meal::Lunch, "rice bowl", Nutrients::calories(500.0))).await.unwrap();
    let backup = std::path::PathBuf::from(format!("{}.corrupt", path.display()));
    assert_eq!(std::fs::read_to_string(&backup).unwrap(), "this is not json");
    assert_eq!(Cache::from_file(&path).unwrap().entries().len(), 1);

    let _ = std::fs::remove_file(&path);
    let _ = std::fs::remove_file(&backup);
}
