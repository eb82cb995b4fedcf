//! Hosts file integration tests
//!
//! - repeated syncs over a real file keep foreign lines intact
//! - retry behavior with an injected failing sink
//! - table changes between syncs
//! - foreign lines that are not valid UTF-8

use std::io;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use hostsync_core::domain::DomainRules;
use hostsync_core::table::HostTable;
use hostsync_hosts_file::writer::{LINE_ENDING, join_lines};
use hostsync_hosts_file::{
    BEGIN_MARKER, END_MARKER, FileSink, HostsFile, HostsFileError, RetryWriter,
};
use tokio_util::sync::CancellationToken;

/// Fails a configurable number of times before writing for real.
#[derive(Clone, Default)]
struct LockedFileSink {
    remaining_failures: Arc<AtomicU32>,
    attempts: Arc<AtomicU32>,
}

impl LockedFileSink {
    fn failing(times: u32) -> Self {
        Self {
            remaining_failures: Arc::new(AtomicU32::new(times)),
            attempts: Arc::new(AtomicU32::new(0)),
        }
    }

    fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl FileSink for LockedFileSink {
    async fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let left = self.remaining_failures.load(Ordering::SeqCst);
        if left > 0 {
            self.remaining_failures.store(left - 1, Ordering::SeqCst);
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "The process cannot access the file because it is being used by another process",
            ));
        }
        tokio::fs::write(path, contents).await
    }
}

fn table() -> HostTable {
    HostTable::new(DomainRules::new("", ".docker"))
}

fn seed_hosts(dir: &Path, content: &str) -> HostsFile {
    let path = dir.join("hosts");
    std::fs::write(&path, content).expect("seed hosts file");
    HostsFile::new(path)
}

fn read(hosts: &HostsFile) -> Vec<String> {
    std::fs::read_to_string(hosts.path())
        .expect("read hosts file")
        .lines()
        .map(str::to_owned)
        .collect()
}

#[tokio::test]
async fn repeated_syncs_keep_foreign_lines_and_one_block() {
    let dir = tempfile::tempdir().expect("tempdir");
    let hosts = seed_hosts(
        dir.path(),
        "127.0.0.1 localhost\n::1 localhost\n# custom\n10.1.1.1 printer\n",
    );
    let writer = RetryWriter::new(3, Duration::from_millis(1));
    let cancel = CancellationToken::new();

    let mut t = table();
    t.upsert("c1", "bridge", "172.17.0.2", [Some("web")]);
    hosts.sync(&t.snapshot(), &writer, &cancel).await.expect("sync 1");

    t.upsert("c2", "bridge", "172.17.0.3", [Some("db")]);
    hosts.sync(&t.snapshot(), &writer, &cancel).await.expect("sync 2");

    t.remove("c1");
    hosts.sync(&t.snapshot(), &writer, &cancel).await.expect("sync 3");

    assert_eq!(
        read(&hosts),
        vec![
            "127.0.0.1 localhost",
            "::1 localhost",
            "# custom",
            "10.1.1.1 printer",
            BEGIN_MARKER,
            "172.17.0.3\tdb.docker",
            END_MARKER,
        ]
    );
}

#[tokio::test]
async fn block_in_the_middle_moves_to_the_end() {
    let dir = tempfile::tempdir().expect("tempdir");
    let hosts = seed_hosts(
        dir.path(),
        &format!("127.0.0.1 localhost\n{BEGIN_MARKER}\n10.0.0.9\told.docker\n{END_MARKER}\n10.1.1.1 printer\n"),
    );

    let mut t = table();
    t.upsert("web", "eth0", "10.0.0.2", [Some("app.docker")]);
    hosts
        .sync(
            &t.snapshot(),
            &RetryWriter::new(3, Duration::from_secs(2)),
            &CancellationToken::new(),
        )
        .await
        .expect("sync");

    assert_eq!(
        read(&hosts),
        vec![
            "127.0.0.1 localhost",
            "10.1.1.1 printer",
            BEGIN_MARKER,
            "10.0.0.2\tapp.docker",
            END_MARKER,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn locked_file_is_written_after_two_failures() {
    let dir = tempfile::tempdir().expect("tempdir");
    let hosts = seed_hosts(dir.path(), "127.0.0.1 localhost\n");
    let sink = LockedFileSink::failing(2);
    let writer = RetryWriter::with_sink(sink.clone(), 3, Duration::from_secs(2));

    let mut t = table();
    t.upsert("web", "eth0", "10.0.0.2", [Some("app")]);
    let entries = hosts
        .sync(&t.snapshot(), &writer, &CancellationToken::new())
        .await
        .expect("third attempt should succeed");

    assert_eq!(entries, 1);
    assert_eq!(sink.attempts(), 3);
    let expected = join_lines(&[
        "127.0.0.1 localhost",
        BEGIN_MARKER,
        "10.0.0.2\tapp.docker",
        END_MARKER,
    ]);
    assert_eq!(std::fs::read(hosts.path()).expect("read"), expected);
}

#[tokio::test(start_paused = true)]
async fn locked_file_gives_up_after_four_attempts() {
    let dir = tempfile::tempdir().expect("tempdir");
    let original = format!("127.0.0.1 localhost{LINE_ENDING}");
    let hosts = seed_hosts(dir.path(), &original);
    let sink = LockedFileSink::failing(4);
    let writer = RetryWriter::with_sink(sink.clone(), 3, Duration::from_secs(2));

    let mut t = table();
    t.upsert("web", "eth0", "10.0.0.2", [Some("app")]);
    let err = hosts
        .sync(&t.snapshot(), &writer, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, HostsFileError::WriteFailed { attempts: 4, .. }));
    assert_eq!(sink.attempts(), 4);
    assert_eq!(
        std::fs::read_to_string(hosts.path()).expect("read"),
        original
    );
}

#[tokio::test]
async fn default_sink_has_no_failures() {
    let dir = tempfile::tempdir().expect("tempdir");
    let hosts = seed_hosts(dir.path(), "");
    let sink = LockedFileSink::default();
    let writer = RetryWriter::with_sink(sink.clone(), 3, Duration::from_secs(2));

    hosts
        .sync(&table().snapshot(), &writer, &CancellationToken::new())
        .await
        .expect("sync");
    assert_eq!(sink.attempts(), 1);
    assert_eq!(read(&hosts), vec![BEGIN_MARKER, END_MARKER]);
}

#[tokio::test]
async fn latin1_comment_survives_sync() {
    // Given: a hosts file with a Latin-1 comment and an old block
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("hosts");
    let mut seed = b"# caf\xe9\n127.0.0.1 localhost\r\n".to_vec();
    seed.extend_from_slice(BEGIN_MARKER.as_bytes());
    seed.extend_from_slice(b"\n10.0.0.9\told.docker\n");
    seed.extend_from_slice(END_MARKER.as_bytes());
    seed.push(b'\n');
    std::fs::write(&path, &seed).expect("seed hosts file");
    let hosts = HostsFile::new(&path);

    // When
    let mut t = table();
    t.upsert("web", "eth0", "10.0.0.2", [Some("app")]);
    let entries = hosts
        .sync(
            &t.snapshot(),
            &RetryWriter::new(3, Duration::from_secs(2)),
            &CancellationToken::new(),
        )
        .await
        .expect("non-UTF-8 content must not stop the sync");

    // Then: the comment keeps its original byte, the block is replaced
    assert_eq!(entries, 1);
    let expected = join_lines(&[
        b"# caf\xe9".as_slice(),
        b"127.0.0.1 localhost",
        BEGIN_MARKER.as_bytes(),
        b"10.0.0.2\tapp.docker",
        END_MARKER.as_bytes(),
    ]);
    assert_eq!(std::fs::read(&path).expect("read"), expected);
}
