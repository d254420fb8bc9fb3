// tests/reconciler_tests.rs

mod test_utils;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use paintbot_common::models::{Destination, TrackedChannel};
use paintbot_core::services::ReconcileOutcome;
use paintbot_core::{ConfigStore, Error};
use tempfile::tempdir;

use test_utils::helpers::*;

fn paint_channel() -> TrackedChannel {
    TrackedChannel::new(
        "paintbrush",
        vec![Destination::new("111"), Destination::new("222")],
    )
}

fn paint_metadata() -> Arc<StaticMetadata> {
    Arc::new(
        StaticMetadata::default()
            .with_user("paintbrush", "42")
            .with_channel("42", "Painting clouds", "509660")
            .with_game("509660", "Art"),
    )
}

#[tokio::test]
async fn repeat_online_event_sends_nothing_more() -> Result<(), Error> {
    let dir = tempdir()?;
    let store = test_store(&dir.path().join("paintbot.json"), vec![paint_channel()]);
    let chat = RecordingChat::new();
    let reconciler = reconciler(store, chat.clone(), paint_metadata());

    let first = reconciler.apply(online("paintbrush", "42")).await?;
    assert!(matches!(first, ReconcileOutcome::WentLive(ref r) if r.created == 2));
    assert_eq!(chat.sends(), 2);

    let second = reconciler.apply(online("paintbrush", "42")).await?;
    assert_eq!(second, ReconcileOutcome::AlreadyLive);
    assert_eq!(chat.sends(), 2);
    assert_eq!(chat.calls().len(), 2);
    Ok(())
}

#[tokio::test]
async fn offline_while_offline_still_persists() -> Result<(), Error> {
    let dir = tempdir()?;
    let path = dir.path().join("paintbot.json");
    let store = test_store(&path, vec![paint_channel()]);
    let chat = RecordingChat::new();
    let reconciler = reconciler(store, chat.clone(), paint_metadata());

    let outcome = reconciler.apply(offline("paintbrush", "42")).await?;
    assert_eq!(outcome, ReconcileOutcome::AlreadyOffline);
    assert!(path.exists());
    assert!(!ConfigStore::load(&path)?.snapshot()[0].is_live);
    assert!(chat.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn online_then_update_creates_then_edits_each_destination() -> Result<(), Error> {
    let dir = tempdir()?;
    let store = test_store(&dir.path().join("paintbot.json"), vec![paint_channel()]);
    let chat = RecordingChat::new();
    let reconciler = reconciler(store.clone(), chat.clone(), paint_metadata());

    reconciler.apply(online("paintbrush", "42")).await?;
    let outcome = reconciler
        .apply(update("paintbrush", "42", "Painting trees", "509660"))
        .await?;
    assert!(matches!(outcome, ReconcileOutcome::MetadataRefreshed(ref r) if r.edited == 2 && r.created == 0));

    let calls = chat.calls();
    assert_eq!(
        calls,
        vec![
            ChatCall::Send { destination: "111".into(), message_id: "1000".into() },
            ChatCall::Send { destination: "222".into(), message_id: "1001".into() },
            ChatCall::Edit { destination: "111".into(), message_id: "1000".into() },
            ChatCall::Edit { destination: "222".into(), message_id: "1001".into() },
        ]
    );

    let last = chat.payloads.lock().last().cloned().expect("payload recorded");
    assert_eq!(last.title, "Painting trees");

    let snapshot = store.snapshot();
    assert_eq!(snapshot[0].title, "Painting trees");
    assert_eq!(snapshot[0].destinations.iter().next().map(|d| d.last_message_id.as_str()), Some("1000"));
    Ok(())
}

#[tokio::test]
async fn failed_edit_falls_back_to_one_new_message() -> Result<(), Error> {
    let dir = tempdir()?;
    let path = dir.path().join("paintbot.json");
    let store = test_store(&path, vec![TrackedChannel::new("paintbrush", vec![Destination::new("111")])]);
    let chat = RecordingChat::new();
    let reconciler = reconciler(store.clone(), chat.clone(), paint_metadata());

    reconciler.apply(online("paintbrush", "42")).await?;
    chat.fail_edits.store(true, Ordering::SeqCst);

    let outcome = reconciler
        .apply(update("paintbrush", "42", "New title", "509660"))
        .await?;
    assert!(matches!(outcome, ReconcileOutcome::MetadataRefreshed(ref r) if r.created == 1 && r.edited == 0));

    assert_eq!(
        chat.calls(),
        vec![
            ChatCall::Send { destination: "111".into(), message_id: "1000".into() },
            ChatCall::FailedEdit { destination: "111".into(), message_id: "1000".into() },
            ChatCall::Send { destination: "111".into(), message_id: "1001".into() },
        ]
    );

    let reloaded = ConfigStore::load(&path)?;
    let dest = reloaded.snapshot()[0].destinations.iter().next().cloned().expect("destination");
    assert_eq!(dest.last_message_id, "1001");
    Ok(())
}

#[tokio::test]
async fn broadcaster_name_matches_case_insensitively() -> Result<(), Error> {
    let dir = tempdir()?;
    let store = test_store(
        &dir.path().join("paintbot.json"),
        vec![TrackedChannel::new("foobar", vec![Destination::new("111")])],
    );
    let chat = RecordingChat::new();
    let metadata = Arc::new(StaticMetadata::default().with_user("foobar", "7"));
    let reconciler = reconciler(store.clone(), chat.clone(), metadata);

    let outcome = reconciler.apply(online("FooBar", "7")).await?;
    assert!(matches!(outcome, ReconcileOutcome::WentLive(_)));
    assert!(store.snapshot()[0].is_live);
    assert_eq!(chat.sends(), 1);
    Ok(())
}

#[tokio::test]
async fn untracked_broadcaster_changes_nothing() -> Result<(), Error> {
    let dir = tempdir()?;
    let path = dir.path().join("paintbot.json");
    let store = test_store(&path, vec![paint_channel()]);
    let chat = RecordingChat::new();
    let metadata = paint_metadata();
    let reconciler = reconciler(store.clone(), chat.clone(), metadata.clone());

    let before = store.snapshot();
    for event in [
        online("somebodyelse", "1"),
        update("somebodyelse", "1", "t", "c"),
        offline("somebodyelse", "1"),
    ] {
        assert_eq!(reconciler.apply(event).await?, ReconcileOutcome::Unmatched);
    }

    assert_eq!(store.snapshot(), before);
    assert!(chat.calls().is_empty());
    assert_eq!(metadata.user_lookups.load(Ordering::SeqCst), 0);
    assert!(!path.exists());
    Ok(())
}

#[tokio::test]
async fn live_flag_survives_reload() -> Result<(), Error> {
    let dir = tempdir()?;
    let path = dir.path().join("paintbot.json");
    let store = test_store(&path, vec![paint_channel()]);
    let chat = RecordingChat::new();
    let reconciler = reconciler(store, chat, paint_metadata());

    reconciler.apply(online("paintbrush", "42")).await?;
    let after_online = ConfigStore::load(&path)?.snapshot();
    assert!(after_online[0].is_live);
    assert_eq!(after_online[0].provider_user_id, "42");
    assert!(after_online[0].destinations.iter().all(|d| d.has_message()));

    let outcome = reconciler.apply(offline("paintbrush", "42")).await?;
    assert_eq!(outcome, ReconcileOutcome::WentOffline);
    assert!(!ConfigStore::load(&path)?.snapshot()[0].is_live);
    Ok(())
}

#[tokio::test]
async fn update_while_offline_records_without_rendering() -> Result<(), Error> {
    let dir = tempdir()?;
    let path = dir.path().join("paintbot.json");
    let store = test_store(&path, vec![paint_channel()]);
    let chat = RecordingChat::new();
    let reconciler = reconciler(store, chat.clone(), paint_metadata());

    let outcome = reconciler
        .apply(update("paintbrush", "42", "Tomorrow: oils", "509660"))
        .await?;
    assert_eq!(outcome, ReconcileOutcome::MetadataRecorded);
    assert!(chat.calls().is_empty());

    let snapshot = ConfigStore::load(&path)?.snapshot();
    assert_eq!(snapshot[0].title, "Tomorrow: oils");
    assert_eq!(snapshot[0].category, "509660");
    assert!(!snapshot[0].is_live);
    Ok(())
}

#[tokio::test]
async fn going_live_looks_up_unknown_title_and_game() -> Result<(), Error> {
    let dir = tempdir()?;
    let store = test_store(&dir.path().join("paintbot.json"), vec![paint_channel()]);
    let chat = RecordingChat::new();
    let metadata = paint_metadata();
    let reconciler = reconciler(store.clone(), chat.clone(), metadata.clone());

    reconciler.apply(online("paintbrush", "42")).await?;
    assert_eq!(metadata.channel_lookups.load(Ordering::SeqCst), 1);

    let channel = &store.snapshot()[0];
    assert_eq!(channel.title, "Painting clouds");
    assert_eq!(channel.category, "509660");

    let payload = chat.payloads.lock()[0].clone();
    assert_eq!(payload.title, "Painting clouds");
    assert_eq!(payload.fields[0].value, "Art");
    assert_eq!(payload.thumbnail_url, "https://img.example/509660-285x380.jpg");
    assert_eq!(payload.author.icon_url.as_deref(), Some("https://img.example/paintbrush-70x70.png"));
    assert!(payload.image_url.starts_with(
        "https://static-cdn.jtvnw.net/previews-ttv/live_user_paintbrush-640x360.jpg?t="
    ));
    Ok(())
}

#[tokio::test]
async fn metadata_failures_render_placeholders() -> Result<(), Error> {
    let dir = tempdir()?;
    let store = test_store(&dir.path().join("paintbot.json"), vec![paint_channel()]);
    let chat = RecordingChat::new();
    let reconciler = reconciler(store, chat.clone(), Arc::new(StaticMetadata::default()));

    reconciler.apply(online("paintbrush", "42")).await?;

    let payload = chat.payloads.lock()[0].clone();
    assert_eq!(payload.title, "paintbrush is live!");
    assert_eq!(payload.author.name, "paintbrush");
    assert!(payload.author.icon_url.is_none());
    assert_eq!(payload.fields[0].value, "N/A");
    assert_eq!(
        payload.thumbnail_url,
        "https://static-cdn.jtvnw.net/ttv-static/404_boxart-285x380.jpg"
    );
    Ok(())
}

#[tokio::test]
async fn one_failing_destination_does_not_stop_the_others() -> Result<(), Error> {
    let dir = tempdir()?;
    let path = dir.path().join("paintbot.json");
    let store = test_store(&path, vec![paint_channel()]);
    let chat = RecordingChat::new();
    chat.fail_sends_to.lock().insert("111".to_string());
    let reconciler = reconciler(store, chat.clone(), paint_metadata());

    let outcome = reconciler.apply(online("paintbrush", "42")).await?;
    assert!(matches!(outcome, ReconcileOutcome::WentLive(ref r) if r.created == 1 && r.failed == 1));

    let snapshot = ConfigStore::load(&path)?.snapshot();
    assert!(snapshot[0].is_live);
    let ids: Vec<_> = snapshot[0].destinations.iter().map(|d| d.last_message_id.clone()).collect();
    assert_eq!(ids, vec![String::new(), "1000".to_string()]);
    Ok(())
}

#[tokio::test]
async fn refresh_creates_where_no_message_exists_yet() -> Result<(), Error> {
    let dir = tempdir()?;
    let store = test_store(&dir.path().join("paintbot.json"), vec![paint_channel()]);
    let chat = RecordingChat::new();
    chat.fail_sends_to.lock().insert("111".to_string());
    let reconciler = reconciler(store, chat.clone(), paint_metadata());

    reconciler.apply(online("paintbrush", "42")).await?;
    chat.fail_sends_to.lock().clear();

    let outcome = reconciler.apply(update("paintbrush", "42", "t2", "509660")).await?;
    assert!(matches!(outcome, ReconcileOutcome::MetadataRefreshed(ref r) if r.created == 1 && r.edited == 1));
    Ok(())
}

#[tokio::test]
async fn failed_go_live_send_forgets_last_sessions_message() -> Result<(), Error> {
    let dir = tempdir()?;
    let path = dir.path().join("paintbot.json");
    let store = test_store(&path, vec![TrackedChannel::new("paintbrush", vec![Destination::new("111")])]);
    let chat = RecordingChat::new();
    let reconciler = reconciler(store.clone(), chat.clone(), paint_metadata());

    reconciler.apply(online("paintbrush", "42")).await?;
    reconciler.apply(offline("paintbrush", "42")).await?;

    chat.fail_sends_to.lock().insert("111".to_string());
    reconciler.apply(online("paintbrush", "42")).await?;
    let dest = ConfigStore::load(&path)?.snapshot()[0].destinations.iter().next().cloned().expect("destination");
    assert!(dest.last_message_id.is_empty());

    chat.fail_sends_to.lock().clear();
    reconciler.apply(update("paintbrush", "42", "Second stream", "509660")).await?;

    assert_eq!(
        chat.calls(),
        vec![
            ChatCall::Send { destination: "111".into(), message_id: "1000".into() },
            ChatCall::FailedSend { destination: "111".into() },
            ChatCall::Send { destination: "111".into(), message_id: "1001".into() },
        ]
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_online_deliveries_announce_once() -> Result<(), Error> {
    let dir = tempdir()?;
    let store = test_store(&dir.path().join("paintbot.json"), vec![paint_channel()]);
    let chat = RecordingChat::new();
    let reconciler = Arc::new(reconciler(store, chat.clone(), paint_metadata()));

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let r = reconciler.clone();
            tokio::spawn(async move { r.apply(online("paintbrush", "42")).await })
        })
        .collect();

    let mut went_live = 0;
    for task in tasks {
        if matches!(task.await.expect("task panicked")?, ReconcileOutcome::WentLive(_)) {
            went_live += 1;
        }
    }

    assert_eq!(went_live, 1);
    assert_eq!(chat.sends(), 2);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn interleaved_online_offline_leave_consistent_state() -> Result<(), Error> {
    let dir = tempdir()?;
    let path = dir.path().join("paintbot.json");
    let store = test_store(&path, vec![paint_channel()]);
    let chat = RecordingChat::new();
    let reconciler = Arc::new(reconciler(store.clone(), chat.clone(), paint_metadata()));

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let r = reconciler.clone();
            tokio::spawn(async move {
                let event = if i % 2 == 0 {
                    online("paintbrush", "42")
                } else {
                    offline("paintbrush", "42")
                };
                r.apply(event).await
            })
        })
        .collect();

    let (mut went_live, mut went_offline) = (0usize, 0usize);
    for task in tasks {
        match task.await.expect("task panicked")? {
            ReconcileOutcome::WentLive(_) => went_live += 1,
            ReconcileOutcome::WentOffline => went_offline += 1,
            _ => {}
        }
    }

    let in_memory = store.snapshot();
    let on_disk = ConfigStore::load(&path)?.snapshot();
    assert_eq!(in_memory, on_disk);

    // Transitions strictly alternate, starting from offline.
    assert!(went_live == went_offline || went_live == went_offline + 1);
    assert_eq!(on_disk[0].is_live, went_live > went_offline);
    assert_eq!(chat.sends(), went_live * 2);
    Ok(())
}
