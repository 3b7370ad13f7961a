//! End-to-end lifecycle tests for the widget manager against the SQLite store
//! and the headless window backend.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::Arc;

use widgetry_core::error::WidgetryError;
use widgetry_core::types::{
    Position, Size, TrayAction, TrayMenuItem, WidgetDraft, WidgetId,
};
use widgetry_manager::{ManagerOptions, OpenOutcome, WidgetManager};
use widgetry_storage::{Database, SqliteWidgetStore, WidgetStore};
use widgetry_window::{HeadlessWindowSubsystem, SessionPhase, WindowEvent, WindowMessage};

type Manager = WidgetManager<SqliteWidgetStore, HeadlessWindowSubsystem>;

fn setup() -> (Manager, Arc<Database>) {
    let db = Arc::new(Database::in_memory().unwrap());
    let store = SqliteWidgetStore::new(Arc::clone(&db));
    let manager = WidgetManager::new(store, HeadlessWindowSubsystem::new()).with_options(
        ManagerOptions {
            open_on_create: false,
            ..ManagerOptions::default()
        },
    );
    (manager, db)
}

fn draft(name: &str) -> WidgetDraft {
    WidgetDraft::web(name, format!("https://{}.example", name.to_lowercase()))
}

fn run_sql(db: &Database, sql: &str) {
    db.with_conn(|conn| {
        conn.execute_batch(sql)
            .map_err(|e| WidgetryError::Storage(e.to_string()))
    })
    .unwrap();
}

/// Records every template the tray callback receives.
fn record_tray(manager: &mut Manager) -> Rc<RefCell<Vec<Vec<TrayMenuItem>>>> {
    let renders = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&renders);
    manager
        .on_update_tray(move |template| sink.borrow_mut().push(template.to_vec()))
        .unwrap();
    renders
}

fn labels(template: &[TrayMenuItem]) -> Vec<&str> {
    template.iter().map(|item| item.label.as_str()).collect()
}

// ============================================================================
// Create / delete
// ============================================================================

#[test]
fn test_created_ids_are_distinct_and_stored() {
    let (mut manager, _db) = setup();

    let created: Vec<_> = (0..25)
        .map(|i| manager.create(draft(&format!("W{}", i))).unwrap())
        .collect();

    let ids: HashSet<_> = created.iter().map(|w| w.id.clone()).collect();
    assert_eq!(ids.len(), created.len());

    let widgets = manager.get_widgets().unwrap();
    assert_eq!(widgets.len(), created.len());
    for widget in &created {
        assert_eq!(widgets.get(&widget.id), Some(widget));
    }
}

#[test]
fn test_delete_is_idempotent_and_always_notifies() {
    let (mut manager, _db) = setup();
    let keep = manager.create(draft("Keep")).unwrap();
    let gone = manager.create(draft("Gone")).unwrap();

    let deleted = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&deleted);
    manager
        .observers_mut()
        .on_deleted(move |id, _| sink.borrow_mut().push(id.clone()));

    manager.delete(&gone.id).unwrap();
    let after_once = manager.get_widgets().unwrap();
    manager.delete(&gone.id).unwrap();
    let after_twice = manager.get_widgets().unwrap();

    assert_eq!(after_once, after_twice);
    assert_eq!(after_twice.ids(), vec![keep.id]);
    assert_eq!(*deleted.borrow(), vec![gone.id.clone(), gone.id]);
}

#[test]
fn test_delete_of_unknown_id_still_notifies() {
    let (mut manager, _db) = setup();
    let renders = record_tray(&mut manager);

    manager.delete(&WidgetId::from("never-existed")).unwrap();

    assert_eq!(renders.borrow().len(), 2);
}

#[test]
fn test_delete_finishes_teardown_before_observers_run() {
    let (mut manager, _db) = setup();
    let keep = manager.create(draft("Keep")).unwrap();
    let gone = manager.create(draft("Gone")).unwrap();
    manager.open_window(&gone).unwrap();
    manager.pump_window_events();

    let windows = manager.windows().clone();
    let seen = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&seen);
    manager.observers_mut().on_deleted(move |id, ctx| {
        let stored = ctx.widgets().unwrap();
        let window = windows.window(id).unwrap();
        *sink.borrow_mut() = Some((stored.ids(), window.closed, windows.live_window_count(id)));
    });

    manager.delete(&gone.id).unwrap();

    assert_eq!(*seen.borrow(), Some((vec![keep.id], true, 0)));
    assert!(!manager.has_session(&gone.id));
}

#[test]
fn test_store_failure_surfaces_and_skips_observers() {
    let (mut manager, db) = setup();
    let created = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&created);
    manager
        .observers_mut()
        .on_created(move |_, _| *sink.borrow_mut() += 1);

    run_sql(&db, "DROP TABLE widgets;");

    let err = manager.create(draft("Clock")).unwrap_err();
    assert!(matches!(err, WidgetryError::Storage(_)));
    assert_eq!(*created.borrow(), 0);
    assert_eq!(manager.windows().created_count(), 0);
}

// ============================================================================
// Open
// ============================================================================

#[test]
fn test_open_twice_constructs_one_window() {
    let (mut manager, _db) = setup();
    let widget = manager.create(draft("Clock")).unwrap();

    assert_eq!(manager.open_window(&widget).unwrap(), OpenOutcome::Opened);
    assert_eq!(manager.open_window(&widget).unwrap(), OpenOutcome::Focused);

    assert_eq!(manager.windows().created_count(), 1);
    assert_eq!(manager.session_count(), 1);
}

#[test]
fn test_stale_tray_action_after_delete_opens_nothing() {
    let (mut manager, _db) = setup();
    let widget = manager.create(draft("Clock")).unwrap();
    let stale = manager.build_tray_context_menu_template().unwrap()[1]
        .action
        .clone()
        .unwrap();
    manager.activate(&stale).unwrap();
    manager.pump_window_events();

    manager.delete(&widget.id).unwrap();
    assert_eq!(manager.activate(&stale).unwrap(), OpenOutcome::Missing);
    manager.pump_window_events();
    assert_eq!(manager.activate(&stale).unwrap(), OpenOutcome::Missing);

    assert_eq!(manager.windows().created_count(), 1);
    assert_eq!(manager.windows().live_window_count(&widget.id), 0);
    assert_eq!(manager.session_count(), 0);
}

#[test]
fn test_reopen_before_old_close_is_delivered() {
    let (mut manager, _db) = setup();
    let widget = manager.create(draft("Clock")).unwrap();
    manager.open_window(&widget).unwrap();
    manager.pump_window_events();

    manager.windows_mut().close_window(&widget.id);
    // The close has not been pumped yet, so the session still exists.
    assert_eq!(manager.open_window(&widget).unwrap(), OpenOutcome::Focused);
    manager.pump_window_events();

    assert_eq!(manager.open_window(&widget).unwrap(), OpenOutcome::Opened);
    manager.windows_mut().move_window(&widget.id, Position::new(3, 4));
    manager.pump_window_events();
    assert_eq!(manager.open_window(&widget).unwrap(), OpenOutcome::Focused);

    assert_eq!(manager.windows().created_count(), 2);
    assert_eq!(manager.windows().live_window_count(&widget.id), 1);
    let stored = manager.store().get(&widget.id).unwrap().unwrap();
    assert_eq!(stored.position, Position::new(3, 4));
}

#[test]
fn test_inactive_widget_never_reaches_window_subsystem() {
    let (mut manager, _db) = setup();
    let widget = manager.create(draft("Hidden").with_active(false)).unwrap();

    assert_eq!(manager.open_window(&widget).unwrap(), OpenOutcome::Inactive);
    assert_eq!(manager.open_all_windows().unwrap(), 0);

    assert_eq!(manager.windows().created_count(), 0);
    assert!(!manager.has_session(&widget.id));
}

#[test]
fn test_open_all_skips_failures() {
    let (mut manager, _db) = setup();
    let first = manager.create(draft("First")).unwrap();
    let second = manager.create(draft("Second")).unwrap();
    manager.windows_mut().fail_next_create("display gone");

    assert_eq!(manager.open_all_windows().unwrap(), 1);
    assert!(!manager.has_session(&first.id));
    assert!(manager.has_session(&second.id));
}

#[test]
fn test_frame_follows_definition() {
    let (mut manager, _db) = setup();
    let widget = manager
        .create(
            draft("Clock")
                .with_position(Position::new(40, 60))
                .with_size(Size::new(320, 200))
                .with_on_top(true),
        )
        .unwrap();

    manager.open_window(&widget).unwrap();

    let frames = manager.windows().created_frames();
    assert_eq!(frames.len(), 1);
    let frame = &frames[0];
    assert_eq!(frame.widget_id, widget.id);
    assert_eq!(frame.position, Position::new(40, 60));
    assert_eq!(frame.size, Size::new(320, 200));
    assert!(frame.always_on_top);
    assert!(frame.frameless);
    assert!(frame.skip_taskbar);
    assert!(!frame.visible);
}

// ============================================================================
// Window events
// ============================================================================

#[test]
fn test_move_updates_only_position() {
    let (mut manager, _db) = setup();
    let widget = manager.create(draft("Clock").with_on_top(true)).unwrap();
    manager.open_window(&widget).unwrap();
    manager.pump_window_events();

    manager
        .windows_mut()
        .move_window(&widget.id, Position::new(10, 20));
    manager.pump_window_events();

    let stored = manager.store().get(&widget.id).unwrap().unwrap();
    let mut expected = widget.clone();
    expected.position = Position::new(10, 20);
    assert_eq!(stored, expected);
}

#[test]
fn test_lifecycle_phases() {
    let (mut manager, _db) = setup();
    let widget = manager.create(draft("Clock")).unwrap();
    manager.open_window(&widget).unwrap();

    assert_eq!(manager.session_phase(&widget.id), Some(SessionPhase::Hidden));
    assert!(!manager.windows().window(&widget.id).unwrap().visible);

    manager
        .handle_window_event(&widget.id, WindowEvent::ReadyToRender)
        .unwrap();
    assert_eq!(manager.session_phase(&widget.id), Some(SessionPhase::Visible));

    manager
        .handle_window_event(&widget.id, WindowEvent::Closed)
        .unwrap();
    assert_eq!(manager.session_phase(&widget.id), None);
    assert!(manager.get_widgets().unwrap().contains(&widget.id));
}

#[test]
fn test_content_load_pushes_latest_definition() {
    let (mut manager, _db) = setup();
    let widget = manager.create(draft("Clock")).unwrap();
    manager.open_window(&widget).unwrap();

    let mut renamed = widget.clone();
    renamed.name = "World Clock".to_string();
    manager.update(&renamed).unwrap();
    manager.pump_window_events();

    let window = manager.windows().window(&widget.id).unwrap();
    assert_eq!(window.title, "World Clock");
    assert_eq!(window.messages, vec![WindowMessage::WidgetInfo(renamed)]);
}

#[test]
fn test_failed_write_through_recovers_on_next_move() {
    let (mut manager, db) = setup();
    let widget = manager.create(draft("Clock")).unwrap();
    manager.open_window(&widget).unwrap();
    manager.pump_window_events();

    let stored = manager.store().get(&widget.id).unwrap().unwrap();
    run_sql(&db, "DROP TABLE widgets;");
    manager
        .windows_mut()
        .move_window(&widget.id, Position::new(1, 1));
    let err = manager
        .handle_window_event(&widget.id, WindowEvent::Moved)
        .unwrap_err();
    assert!(matches!(err, WidgetryError::Storage(_)));
    assert!(manager.has_session(&widget.id));

    // Restore the table and the record, then move again.
    run_sql(
        &db,
        "CREATE TABLE widgets (
            seq         INTEGER PRIMARY KEY AUTOINCREMENT,
            id          TEXT NOT NULL UNIQUE,
            body        TEXT NOT NULL,
            updated_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    );
    manager.store().set(&stored).unwrap();

    manager
        .windows_mut()
        .move_window(&widget.id, Position::new(7, 8));
    manager.pump_window_events();

    let stored = manager.store().get(&widget.id).unwrap().unwrap();
    assert_eq!(stored.position, Position::new(7, 8));
}

// ============================================================================
// Tray
// ============================================================================

#[test]
fn test_tray_template_order_and_action() {
    let (mut manager, _db) = setup();
    let foo = manager.create(draft("Foo")).unwrap();
    let bar = manager.create(draft("Bar")).unwrap();

    let template = manager.build_tray_context_menu_template().unwrap();
    assert_eq!(labels(&template), vec!["Apps", "Foo", "Bar"]);
    assert_eq!(template[2].action, Some(TrayAction::OpenWidget(bar)));

    let action = template[1].action.clone().unwrap();
    assert_eq!(action, TrayAction::OpenWidget(foo.clone()));
    assert_eq!(manager.activate(&action).unwrap(), OpenOutcome::Opened);
    assert_eq!(manager.windows().created_frames()[0].widget_id, foo.id);
}

#[test]
fn test_tray_renders_on_create_and_delete_only() {
    let (mut manager, _db) = setup();
    let first = manager.create(draft("First")).unwrap();

    let renders = record_tray(&mut manager);
    assert_eq!(renders.borrow().len(), 1);
    assert_eq!(labels(&renders.borrow()[0]), vec!["Apps", "First"]);

    let second = manager.create(draft("Second")).unwrap();
    assert_eq!(renders.borrow().len(), 2);
    assert_eq!(labels(&renders.borrow()[1]), vec!["Apps", "First", "Second"]);

    let mut renamed = second.clone();
    renamed.name = "Renamed".to_string();
    manager.update(&renamed).unwrap();
    assert_eq!(renders.borrow().len(), 2);

    manager.delete(&first.id).unwrap();
    assert_eq!(renders.borrow().len(), 3);
    assert_eq!(labels(&renders.borrow()[2]), vec!["Apps", "Renamed"]);
}

// ============================================================================
// End to end
// ============================================================================

#[test]
fn test_news_widget_end_to_end() {
    let (mut manager, _db) = setup();

    let news = manager
        .create(
            WidgetDraft::web("News", "https://news.example")
                .with_active(true)
                .with_position(Position::new(0, 0))
                .with_size(Size::new(400, 300)),
        )
        .unwrap();
    assert!(!news.id.as_str().is_empty());

    assert_eq!(manager.open_all_windows().unwrap(), 1);
    let frames = manager.windows().created_frames();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].position, Position::new(0, 0));
    assert_eq!(frames[0].size, Size::new(400, 300));

    manager
        .handle_window_event(&news.id, WindowEvent::ContentLoaded)
        .unwrap();
    let window = manager.windows().window(&news.id).unwrap();
    assert_eq!(window.messages, vec![WindowMessage::WidgetInfo(news.clone())]);

    manager
        .windows_mut()
        .resize_window(&news.id, Size::new(500, 350));
    manager.pump_window_events();

    let stored = manager.store().get(&news.id).unwrap().unwrap();
    assert_eq!(stored.size, Size::new(500, 350));
    assert_eq!(stored.position, Position::new(0, 0));
    assert_eq!(manager.session_phase(&news.id), Some(SessionPhase::Visible));
}
