//! Tests for the windowed list: page scheduling, resets and failures.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::{RecordingSource, Row};
use fleetgrid::window::{Counts, PageEvent, VecSource, WindowConfig, WindowedList};

fn scenario_config() -> WindowConfig {
    WindowConfig::default()
        .with_height(400)
        .with_row_height(40)
        .with_page_size(200)
        .with_overscan(5)
}

fn mount(source: &RecordingSource) -> WindowedList<Row> {
    WindowedList::new(Arc::new(source.clone()), "all", scenario_config())
}

#[tokio::test]
async fn test_initial_mount_requests_only_page_zero() {
    let source = RecordingSource::new("a", 10_000);
    let mut list = mount(&source);
    assert_eq!(source.offsets(), vec![0]);

    assert!(list.settle().await.is_empty());
    assert_eq!(source.offsets(), vec![0]);
    assert_eq!(list.row_count(), 10_000);
    assert_eq!(list.visible_range(), 0..16);
}

#[tokio::test]
async fn test_scroll_to_8000_requests_page_one_only() {
    let source = RecordingSource::new("a", 10_000);
    let mut list = mount(&source);
    list.settle().await;

    list.scroll_to(8000);
    assert_eq!(list.visible_range(), 195..216);
    list.settle().await;

    assert_eq!(source.offsets(), vec![0, 200]);
    assert!(list.is_loaded(195));
    assert!(list.is_loaded(215));
}

#[tokio::test]
async fn test_no_duplicate_fetch_while_scrolling() {
    let source = RecordingSource::new("a", 10_000);
    let mut list = mount(&source);
    list.settle().await;

    // Scroll through the first 2000 rows in small steps, settling only
    // occasionally so requests overlap.
    for step in 0..200u64 {
        list.scroll_to(step * 400);
        if step % 7 == 0 {
            list.settle().await;
        }
    }
    list.settle().await;

    let offsets = source.offsets();
    let mut unique = offsets.clone();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(offsets.len(), unique.len(), "duplicate fetch in {:?}", offsets);
    assert!(unique.contains(&0));
    assert!(unique.contains(&1800));
}

#[tokio::test]
async fn test_overlapping_scrolls_share_in_flight_request() {
    let source = RecordingSource::new("a", 10_000);
    let mut list = mount(&source);
    list.settle().await;

    list.scroll_to(20_000);
    list.scroll_to(20_040);
    list.scroll_to(20_080);
    assert_eq!(list.in_flight_pages(), vec![2]);
    list.settle().await;
    assert_eq!(source.offsets(), vec![0, 400]);
}

#[tokio::test]
async fn test_query_key_change_hard_resets() {
    let source = RecordingSource::new("a", 10_000);
    let mut list = mount(&source);
    list.settle().await;
    list.scroll_to(8000);
    list.settle().await;
    let generation = list.generation();

    list.set_query_key("status=running");
    assert_eq!(list.scroll_top(), 0);
    assert_eq!(list.cached_rows(), 0);
    assert_eq!(list.counts(), Counts::default());
    assert_eq!(list.generation(), generation + 1);
    assert_eq!(list.in_flight_pages(), vec![0]);

    list.settle().await;
    assert_eq!(source.offsets(), vec![0, 200, 0]);

    // Same key again is not a reset.
    list.set_query_key("status=running");
    assert_eq!(list.generation(), generation + 1);
}

#[tokio::test]
async fn test_reload_token_keeps_cache_and_scroll() {
    let source = RecordingSource::new("a", 10_000);
    let mut list = mount(&source);
    list.settle().await;
    list.scroll_to(8000);
    list.settle().await;
    source.clear_requests();

    list.set_reload_token(1);
    assert_eq!(list.scroll_top(), 8000);
    assert!(list.is_loaded(210));
    assert_eq!(list.in_flight_pages(), vec![0, 1]);

    list.settle().await;
    assert_eq!(source.offsets(), vec![0, 200]);
    assert_eq!(list.scroll_top(), 8000);

    // Unchanged token does nothing.
    list.set_reload_token(1);
    assert_eq!(list.pending_loads(), 0);
}

#[tokio::test]
async fn test_reload_does_not_duplicate_in_flight_page() {
    let source = RecordingSource::new("a", 10_000);
    let mut list = mount(&source);
    list.set_reload_token(1);
    list.set_reload_token(2);
    list.settle().await;
    assert_eq!(source.offsets(), vec![0]);
}

#[tokio::test(start_paused = true)]
async fn test_stale_generation_is_discarded() {
    let slow = RecordingSource::with_delay("old", 1000, Duration::from_millis(100));
    let fast = RecordingSource::with_delay("new", 1000, Duration::from_millis(10));

    let mut list = WindowedList::new(Arc::new(slow.clone()), "old", scenario_config());
    list.set_source(Arc::new(fast.clone()), "new");

    let first = list.next_completion().await.unwrap().unwrap();
    assert_eq!(first, PageEvent::Loaded { page: 0, rows: 200 });
    let second = list.next_completion().await.unwrap().unwrap();
    assert_eq!(second, PageEvent::Stale { page: 0 });
    assert!(list.next_completion().await.is_none());

    assert_eq!(list.row(0).unwrap().name, "new-0");
}

#[tokio::test]
async fn test_failed_page_is_not_retried_until_requested_again() {
    let source = RecordingSource::new("a", 10_000);
    source.fail_once_at(200);
    let mut list = mount(&source);
    list.settle().await;

    list.scroll_to(8000);
    let failures = list.settle().await;
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].page, 1);
    assert_eq!(failures[0].request.offset, 200);
    assert!(!list.is_loaded(200));
    assert_eq!(list.pending_loads(), 0);
    assert_eq!(source.offsets(), vec![0, 200]);

    // Further scrolling requests it again.
    list.scroll_by(40);
    assert!(list.settle().await.is_empty());
    assert!(list.is_loaded(200));
    assert_eq!(source.offsets(), vec![0, 200, 200]);
}

#[tokio::test]
async fn test_counts_follow_latest_response() {
    let source = RecordingSource::new("a", 1000);
    let mut list = mount(&source);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    list.on_counts_changed(move |counts| sink.lock().unwrap().push(counts));

    list.settle().await;
    source.set_rows(1500);
    list.set_reload_token(1);
    list.settle().await;

    let seen = seen.lock().unwrap().clone();
    assert_eq!(
        seen,
        vec![
            Counts {
                total: 1000,
                filtered: 1000
            },
            Counts {
                total: 1500,
                filtered: 1500
            },
        ]
    );
    assert_eq!(list.row_count(), 1500);
}

#[tokio::test]
async fn test_shrinking_collection_clamps_scroll() {
    let source = RecordingSource::new("a", 10_000);
    let mut list = mount(&source);
    list.settle().await;
    list.scroll_to(300_000);
    list.settle().await;

    source.set_rows(50);
    list.set_reload_token(1);
    list.settle().await;

    assert_eq!(list.row_count(), 50);
    assert_eq!(list.scroll_top(), 50 * 40 - 400);
    assert_eq!(list.visible_range(), 35..50);
}

#[tokio::test]
async fn test_render_placeholders_until_loaded() {
    let source = RecordingSource::new("a", 10_000);
    let mut list = mount(&source);

    // No counts yet: nothing to render.
    assert!(list.render(|slot| slot.index).is_empty());
    list.settle().await;

    list.scroll_to(8000);
    let slots = list.render(|slot| (slot.index, slot.is_loaded, slot.style.top));
    assert_eq!(slots.first(), Some(&(195, true, 195 * 40)));
    assert_eq!(slots.last(), Some(&(215, false, 215 * 40)));

    list.settle().await;
    assert!(list.render(|slot| slot.item.is_some()).into_iter().all(|loaded| loaded));
}

#[tokio::test]
async fn test_range_callback_and_meta() {
    let mut meta = serde_json::Map::new();
    meta.insert("status_counts".into(), serde_json::json!({"running": 3}));
    let rows: Vec<Row> = (0..3).map(|i| Row::numbered("s", i)).collect();
    let source = VecSource::new(rows).with_meta(meta.clone());

    let mut list = WindowedList::new(Arc::new(source), "static", scenario_config());
    let ranges = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&ranges);
    list.on_range_changed(move |range| sink.lock().unwrap().push(range));
    list.settle().await;

    assert_eq!(ranges.lock().unwrap().clone(), vec![0..3]);
    assert_eq!(list.meta(), Some(&meta));
}

#[tokio::test]
async fn test_short_tail_page_is_refetched_after_growth() {
    let source = RecordingSource::new("a", 250);
    let mut list = mount(&source);
    list.settle().await;
    list.scroll_to(10_000);
    list.settle().await;
    assert_eq!(source.offsets(), vec![0, 200]);
    assert!(list.is_loaded(249));

    list.scroll_to(0);
    source.set_rows(450);
    list.set_reload_token(1);
    list.settle().await;
    assert_eq!(list.row_count(), 450);
    assert_eq!(source.offsets(), vec![0, 200, 0]);

    list.scroll_to(10_000);
    assert_eq!(list.visible_range(), 245..266);
    list.settle().await;
    assert_eq!(source.offsets(), vec![0, 200, 0, 200]);
    assert!(list.is_loaded(255));
    assert!(list.visible_range().all(|index| list.is_loaded(index)));
}

#[tokio::test]
async fn test_growth_while_at_tail_fills_new_rows() {
    let source = RecordingSource::new("a", 250);
    let mut list = mount(&source);
    list.settle().await;
    list.scroll_to(u64::MAX);
    list.settle().await;

    source.set_rows(260);
    list.set_reload_token(1);
    list.settle().await;

    assert_eq!(list.row_count(), 260);
    assert!(list.visible_range().contains(&255));
    assert!(list.visible_range().all(|index| list.is_loaded(index)));
}

#[tokio::test]
async fn test_scroll_sweep_covers_every_visible_row() {
    const ROWS: usize = 120;
    let config = WindowConfig::default()
        .with_height(20)
        .with_row_height(3)
        .with_header_height(2)
        .with_page_size(25)
        .with_overscan(2);
    let source = RecordingSource::new("a", ROWS);
    let mut list = WindowedList::new(Arc::new(source.clone()), "all", config.clone());
    list.settle().await;

    let max = config.max_scroll_top(ROWS);
    assert_eq!(max, 2 + 3 * 120 - 20);
    let body = config.body_height() as u64;
    for top in 0..=max {
        list.scroll_to(top);
        assert_eq!(list.scroll_top(), top);

        let range = list.visible_range();
        let first = (top / 3) as usize;
        let last = (((top + body) / 3) as usize).min(ROWS - 1);
        assert!(range.start <= first, "top {}: {:?}", top, range);
        assert!(range.end > last, "top {}: {:?}", top, range);
        assert!(range.end <= ROWS, "top {}: {:?}", top, range);
        assert!(first.saturating_sub(range.start) <= 2);

        list.settle().await;
        assert!(
            range.clone().all(|index| list.is_loaded(index)),
            "top {}: {:?} not loaded",
            top,
            range
        );
    }

    // The last row ends at the bottom edge of the body.
    assert_eq!(config.body_y(ROWS - 1, max) + 3, body as i64);

    let offsets = source.offsets();
    let mut unique = offsets.clone();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(offsets.len(), unique.len(), "duplicate fetch in {:?}", offsets);
    assert_eq!(unique, vec![0, 25, 50, 75, 100]);
}

#[tokio::test]
async fn test_unbound_list_requests_nothing_until_bound() {
    let source = RecordingSource::new("a", 30);
    let mut list: WindowedList<Row> = WindowedList::unbound(scenario_config());
    assert_eq!(list.pending_loads(), 0);
    assert!(list.next_completion().await.is_none());

    list.set_source(Arc::new(source.clone()), "all");
    assert_eq!(list.pending_loads(), 1);
    list.settle().await;
    assert_eq!(source.offsets(), vec![0]);
    assert_eq!(list.row_count(), 30);
}
