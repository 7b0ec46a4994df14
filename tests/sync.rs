
use std::sync::{Arc, Mutex};

use food_diary::cache::Cache;
use food_diary::entry::SyncStatus;
use food_diary::mock_behaviour::MockBehaviour;
use food_diary::provider::sync_progress::{feedback_channel, SyncEvent};
use food_diary::traits::{DietLogSource, SyncSlave};
use food_diary::Provider;



/// A test that simulates a regular synchronisation between a local cache and a server.
/// Note that this uses a second cache to "mock" a server.
struct TestFlavour {
    scenarii: Vec<scenarii::EntryScenario>,
    mock_behaviour: Arc<Mutex<MockBehaviour>>,
}

impl TestFlavour {
    pub fn normal() -> Self {
        Self {
            scenarii: scenarii::scenarii_basic(),
            mock_behaviour: Arc::new(Mutex::new(MockBehaviour::new())),
        }
    }

    pub fn first_sync_to_local() -> Self {
        Self {
            scenarii: scenarii::scenarii_first_sync_to_local(),
            mock_behaviour: Arc::new(Mutex::new(MockBehaviour::new())),
        }
    }

    pub fn first_sync_to_server() -> Self {
        Self {
            scenarii: scenarii::scenarii_first_sync_to_server(),
            mock_behaviour: Arc::new(Mutex::new(MockBehaviour::new())),
        }
    }

    pub fn add_fails_once() -> Self {
        Self {
            scenarii: scenarii::scenarii_basic(),
            mock_behaviour: Arc::new(Mutex::new(MockBehaviour{
                add_behaviour: (0, 1),
                ..MockBehaviour::default()
            })),
        }
    }

    pub fn remove_fails_once() -> Self {
        Self {
            scenarii: scenarii::scenarii_basic(),
            mock_behaviour: Arc::new(Mutex::new(MockBehaviour{
                remove_behaviour: (0, 1),
                ..MockBehaviour::default()
            })),
        }
    }

    pub fn query_fails_once() -> Self {
        Self {
            scenarii: scenarii::scenarii_basic(),
            mock_behaviour: Arc::new(Mutex::new(MockBehaviour{
                query_behaviour: (1, 1),
                ..MockBehaviour::default()
            })),
        }
    }


    pub async fn run(&self, max_attempts: u32) {
        self.mock_behaviour.lock().unwrap().suspend();

        let mut provider = scenarii::populate_test_provider_before_sync(&self.scenarii, Arc::clone(&self.mock_behaviour)).await;
        let dates = scenarii::dates_of(&self.scenarii);

        print_provider(&provider, "before sync").await;

        self.mock_behaviour.lock().unwrap().resume();
        for attempt in 0..max_attempts {
            println!("\nSyncing (attempt {})...\n", attempt);
            if provider.sync_dates(&dates).await {
                println!("Sync complete after {} attempts (multiple attempts are due to forced errors in mocked behaviour)", attempt+1);
                break;
            }
        }
        self.mock_behaviour.lock().unwrap().suspend();

        print_provider(&provider, "after sync").await;

        // Check the contents of both sources are the same after sync
        assert!(provider.remote().has_same_observable_content_as(provider.local()));

        // But also explicitely check that every entry is expected
        scenarii::check_after_sync(&provider, &self.scenarii).await;
        assert!(provider.local().get_last_sync().is_some());
        assert!(provider.local().entries().iter().all(|e| e.sync_status() == SyncStatus::Synced));

        let _ = std::fs::remove_file(provider.local().backing_file());
        let _ = std::fs::remove_file(provider.remote().backing_file());
    }
}




#[tokio::test]
async fn test_regular_sync() {
    let _ = env_logger::builder().is_test(true).try_init();

    let flavour = TestFlavour::normal();
    flavour.run(1).await;
}

#[tokio::test]
async fn test_sync_empty_initial_local() {
    let _ = env_logger::builder().is_test(true).try_init();

    let flavour = TestFlavour::first_sync_to_local();
    flavour.run(1).await;
}

#[tokio::test]
async fn test_sync_empty_initial_server() {
    let _ = env_logger::builder().is_test(true).try_init();

    let flavour = TestFlavour::first_sync_to_server();
    flavour.run(1).await;
}

#[tokio::test]
async fn test_errors_in_add() {
    let _ = env_logger::builder().is_test(true).try_init();

    let flavour = TestFlavour::add_fails_once();
    flavour.run(2).await;
}

#[tokio::test]
async fn test_errors_in_remove() {
    let _ = env_logger::builder().is_test(true).try_init();

    let flavour = TestFlavour::remove_fails_once();
    flavour.run(2).await;
}

#[tokio::test]
async fn test_errors_in_query() {
    let _ = env_logger::builder().is_test(true).try_init();

    let flavour = TestFlavour::query_fails_once();
    flavour.run(2).await;
}


#[tokio::test]
async fn failed_push_keeps_the_entry_local() {
    let _ = env_logger::builder().is_test(true).try_init();

    let date = "2024-03-05".parse().unwrap();
    let mut remote = Cache::new(&scenarii::temp_slot("remote"));
    remote.set_mock_behaviour(Some(Arc::new(Mutex::new(MockBehaviour{
        query_behaviour: (0, 1),
        ..MockBehaviour::default()
    }))));
    let local = Cache::new(&scenarii::temp_slot("local"));
    let mut provider = Provider::new(remote, local);

    let draft = food_diary::EntryDraft::new(date, food_diary::Meal::Lunch, "bento", food_diary::Nutrients::calories(650.0));
    let local_entry = provider.add(draft).await.unwrap();

    // The query of the day fails, nothing is pushed
    assert_eq!(provider.sync().await, false);
    assert_eq!(provider.local().entries()[0].sync_status(), SyncStatus::NotSynced);
    assert!(provider.local().get_last_sync().is_none());

    // The add is pushed once, and the entry adopts the id the remote source gave it
    assert_eq!(provider.sync().await, true);
    let pushed = provider.local().entries()[0].clone();
    assert_eq!(pushed.sync_status(), SyncStatus::Synced);
    assert_ne!(pushed.id(), local_entry.id());
    assert_eq!(provider.remote().entries().len(), 1);
    assert_eq!(provider.remote().entries()[0].id(), pushed.id());

    // Nothing more to push
    assert_eq!(provider.sync().await, true);
    assert_eq!(provider.remote().entries().len(), 1);

    let _ = std::fs::remove_file(provider.local().backing_file());
    let _ = std::fs::remove_file(provider.remote().backing_file());
}

#[tokio::test]
async fn sync_feedback() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut provider = scenarii::populate_test_provider_before_sync(
        &scenarii::scenarii_first_sync_to_server(),
        Arc::new(Mutex::new(MockBehaviour::new())),
    ).await;

    let (sender, receiver) = feedback_channel();
    assert_eq!(*receiver.borrow(), SyncEvent::NotStarted);

    assert!(provider.sync_with_feedback(sender).await);
    assert_eq!(*receiver.borrow(), SyncEvent::Finished{ success: true });

    let _ = std::fs::remove_file(provider.local().backing_file());
    let _ = std::fs::remove_file(provider.remote().backing_file());
}


/// Print the contents of the provider. This is usually used for debugging
#[allow(dead_code)]
async fn print_provider(provider: &Provider<Cache>, title: &str) {
    println!("----Server, {}-------", title);
    food_diary::utils::print_entries(provider.remote().entries());
    println!("-----Local, {}-------", title);
    food_diary::utils::print_entries(provider.local().entries());
}
