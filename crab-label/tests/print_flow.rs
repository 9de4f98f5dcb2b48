use chrono::{NaiveDate, NaiveDateTime};
use crab_label::storage::open_sequence_store;
use crab_label::{
    FixedClock, Key, LabelDraft, LabelError, LabelSession, LabelTicketRenderer,
    PersistentSequenceStore, RedbKeyValueStore, ScanAssembler, SequenceStore, Source,
};
use crab_printer::{DevicePrinter, NetworkPrinter};
use std::time::{Duration, Instant};
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;

fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 5, 3)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}

fn draft() -> LabelDraft {
    LabelDraft::new(Source::parse("dryer", "D"), "BS640AFOIL")
}

#[tokio::test]
async fn test_numbering_survives_restart() {
    let tmp = tempfile::tempdir().unwrap();
    let db_path = tmp.path().join("label.redb");
    let device = tmp.path().join("lp0");
    std::fs::write(&device, b"").unwrap();
    let printer = DevicePrinter::new(&device);

    {
        let mut session = LabelSession::new(
            open_sequence_store(&db_path),
            FixedClock(at(10, 0, 0)),
            LabelTicketRenderer::new(48, 40),
        );
        session.set_draft(draft());
        let first = session.print(&printer).await.unwrap();
        let second = session.print(&printer).await.unwrap();
        assert_eq!(first.printed.as_str(), "DE151230001");
        assert_eq!(second.printed.as_str(), "DE151230002");
    }

    let mut session = LabelSession::new(
        open_sequence_store(&db_path),
        FixedClock(at(15, 30, 0)),
        LabelTicketRenderer::new(48, 40),
    );
    session.set_draft(draft());
    assert_eq!(session.preview().identifier.as_str(), "DE151230003");

    let written = std::fs::read(&device).unwrap();
    assert!(written.windows(11).any(|w| w == b"DE151230002"));
}

#[tokio::test]
async fn test_network_print_commits_after_delivery() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut job = Vec::new();
        socket.read_to_end(&mut job).await.unwrap();
        job
    });

    let kv = RedbKeyValueStore::open_in_memory().unwrap();
    let mut session = LabelSession::new(
        PersistentSequenceStore::new(kv),
        FixedClock(at(9, 0, 0)),
        LabelTicketRenderer::new(48, 40),
    );
    session.set_draft(draft());

    let printer = NetworkPrinter::from_addr(&addr.to_string()).unwrap();
    let printed = session.print(&printer).await.unwrap();

    assert_eq!(server.await.unwrap(), printed.bytes());
    assert_eq!(session.preview().identifier.as_str(), "DE151230002");
}

#[tokio::test]
async fn test_unreachable_printer_commits_nothing() {
    // Bind then drop to get a port with no listener
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };

    let mut session = LabelSession::new(
        PersistentSequenceStore::new(RedbKeyValueStore::open_in_memory().unwrap()),
        FixedClock(at(9, 0, 0)),
        LabelTicketRenderer::new(48, 40),
    );
    session.set_draft(draft());
    let before = session.preview();

    let printer = NetworkPrinter::from_addr(&addr.to_string())
        .unwrap()
        .with_timeout(Duration::from_secs(1));
    let err = session.print(&printer).await.unwrap_err();
    assert!(matches!(err, LabelError::Print(_)));

    assert_eq!(session.preview(), before);
    assert!(session.last_printed().is_none());
}

#[tokio::test]
async fn test_preview_sees_commits_from_another_handle() {
    let kv = RedbKeyValueStore::open_in_memory().unwrap();
    let device_dir = tempfile::tempdir().unwrap();
    let device = device_dir.path().join("lp0");
    std::fs::write(&device, b"").unwrap();

    let mut front = LabelSession::new(
        PersistentSequenceStore::new(kv.clone()),
        FixedClock(at(11, 0, 0)),
        LabelTicketRenderer::new(48, 40),
    );
    front.set_draft(draft());
    let mut back = PersistentSequenceStore::new(kv);

    assert_eq!(front.preview().identifier.as_str(), "DE151230001");
    let day = crab_label::DayKey::new(2025, 123);
    assert_eq!(back.commit_next(day), 1);
    assert_eq!(front.preview().identifier.as_str(), "DE151230002");

    let printed = front.print(&DevicePrinter::new(&device)).await.unwrap();
    assert_eq!(printed.printed.as_str(), "DE151230002");
    assert_eq!(printed.committed.as_str(), "DE151230002");
    assert_eq!(back.get(day), 2);
}

#[tokio::test]
async fn test_scan_of_printed_label_verifies() {
    let tmp = tempfile::tempdir().unwrap();
    let device = tmp.path().join("lp0");
    std::fs::write(&device, b"").unwrap();

    let mut session = LabelSession::new(
        open_sequence_store(&tmp.path().join("label.redb")),
        FixedClock(at(23, 59, 59)),
        LabelTicketRenderer::new(48, 40),
    );
    session.set_draft(draft());
    let printed = session.print(&DevicePrinter::new(&device)).await.unwrap();

    let mut assembler = ScanAssembler::new();
    let start = Instant::now();
    let text = printed.payload.encode();
    for (i, c) in text.chars().enumerate() {
        assembler.push(Key::Char(c), start + Duration::from_millis(i as u64 * 8));
    }
    let scan = assembler
        .push(Key::Enter, start + Duration::from_secs(1))
        .unwrap();

    assert_eq!(session.verify_scan(&scan), Some(vec![]));
    let source = scan.source.unwrap();
    assert_eq!(source.group, "dryer");
    assert_eq!(source.letter, "D");
}
