//! Managed block rendering.
//!
//! The daemon owns one region of the hosts file, delimited by
//! [`BEGIN_MARKER`] and [`END_MARKER`]. [`render`] removes the old region and
//! appends a fresh one built from a [`HostSnapshot`]; every other line is
//! kept verbatim and in order.
//!
//! Lines are raw bytes. Hosts files in the wild carry comments in legacy
//! code pages, and those bytes are written back untouched.

use hostsync_core::table::{HostRecord, HostSnapshot};

/// First line of the managed block.
pub const BEGIN_MARKER: &str =
    "# DOCKER CONTAINERS START (Autogenerated By docker-hosts-writer. DO NOT CHANGE.)";

/// Last line of the managed block.
pub const END_MARKER: &str = "# DOCKER CONTAINERS END";

/// Returns `true` if `line` is exactly one of the two markers.
pub fn is_marker(line: &[u8]) -> bool {
    line == BEGIN_MARKER.as_bytes() || line == END_MARKER.as_bytes()
}

/// Copies the lines that lie outside any marker pair.
///
/// Each marker line flips an "inside" flag and is dropped, as is every line
/// seen while inside. An unbalanced trailing marker therefore swallows the
/// rest of the input.
pub fn strip_block<S: AsRef<[u8]>>(lines: &[S]) -> Vec<Vec<u8>> {
    let mut inside = false;
    let mut kept = Vec::with_capacity(lines.len());
    for line in lines {
        let line = line.as_ref();
        if is_marker(line) {
            inside = !inside;
            continue;
        }
        if !inside {
            kept.push(line.to_vec());
        }
    }
    kept
}

/// Formats one data line: `<ip>\t<domain> <domain> ...`.
///
/// Returns `None` for a record without domains; a hosts line needs at
/// least one name.
pub fn data_line(record: &HostRecord) -> Option<String> {
    if record.domains.is_empty() {
        return None;
    }
    Some(format!("{}\t{}", record.ip_address, record.domains.join(" ")))
}

/// Renders the new file contents from the current lines and a snapshot.
///
/// Pure: equal inputs always give equal output.
pub fn render<S: AsRef<[u8]>>(existing: &[S], snapshot: &HostSnapshot) -> Vec<Vec<u8>> {
    let mut lines = strip_block(existing);
    lines.reserve(snapshot.len() + 2);
    lines.push(BEGIN_MARKER.as_bytes().to_vec());
    lines.extend(
        snapshot
            .records()
            .filter_map(|(_, _, record)| data_line(record))
            .map(String::into_bytes),
    );
    lines.push(END_MARKER.as_bytes().to_vec());
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostsync_core::domain::DomainRules;
    use hostsync_core::table::HostTable;

    fn snapshot_with(entries: &[(&str, &str, &str, &[&str])]) -> HostSnapshot {
        let mut table = HostTable::new(DomainRules::new("", ".docker"));
        for (cid, net, ip, domains) in entries {
            table.upsert(cid, net, ip, domains.iter().map(|d| Some(*d)));
        }
        table.snapshot()
    }

    fn text(lines: &[Vec<u8>]) -> Vec<String> {
        lines
            .iter()
            .map(|l| String::from_utf8(l.clone()).unwrap())
            .collect()
    }

    #[test]
    fn localhost_scenario() {
        let existing = ["127.0.0.1 localhost"];
        let snapshot = snapshot_with(&[("web", "eth0", "10.0.0.2", &["app.docker"])]);

        let out = render(&existing, &snapshot);
        assert_eq!(
            text(&out),
            vec![
                "127.0.0.1 localhost".to_owned(),
                BEGIN_MARKER.to_owned(),
                "10.0.0.2\tapp.docker".to_owned(),
                END_MARKER.to_owned(),
            ]
        );
    }

    #[test]
    fn replaces_existing_block_in_place_of_nothing_else() {
        let existing = vec![
            "127.0.0.1 localhost".to_owned(),
            BEGIN_MARKER.to_owned(),
            "10.9.9.9\tstale.docker".to_owned(),
            END_MARKER.to_owned(),
            "192.168.1.10 nas".to_owned(),
        ];
        let snapshot = snapshot_with(&[("c1", "bridge", "172.17.0.2", &["web"])]);

        let out = render(&existing, &snapshot);
        assert_eq!(
            text(&out),
            vec![
                "127.0.0.1 localhost".to_owned(),
                "192.168.1.10 nas".to_owned(),
                BEGIN_MARKER.to_owned(),
                "172.17.0.2\tweb.docker".to_owned(),
                END_MARKER.to_owned(),
            ]
        );
    }

    #[test]
    fn empty_table_renders_empty_block() {
        let out = render(&["127.0.0.1 localhost"], &HostSnapshot::default());
        assert_eq!(out.len(), 3);
        assert_eq!(out[1], BEGIN_MARKER.as_bytes());
        assert_eq!(out[2], END_MARKER.as_bytes());
    }

    #[test]
    fn empty_file_gets_a_block() {
        let existing: [&str; 0] = [];
        let out = render(&existing, &HostSnapshot::default());
        assert_eq!(text(&out), vec![BEGIN_MARKER.to_owned(), END_MARKER.to_owned()]);
    }

    #[test]
    fn unbalanced_marker_swallows_the_tail() {
        let existing = ["a", BEGIN_MARKER, "b", "c"];
        let out = render(&existing, &HostSnapshot::default());
        assert_eq!(
            text(&out),
            vec!["a".to_owned(), BEGIN_MARKER.to_owned(), END_MARKER.to_owned()]
        );
    }

    #[test]
    fn marker_with_trailing_whitespace_is_not_a_marker() {
        let padded = format!("{END_MARKER} ");
        let existing = ["a", padded.as_str()];
        let out = strip_block(&existing);
        assert_eq!(text(&out), vec!["a".to_owned(), padded.clone()]);
    }

    #[test]
    fn non_utf8_lines_pass_through_unchanged() {
        let latin1: &[u8] = b"# caf\xe9 printer";
        let existing: [&[u8]; 3] = [latin1, BEGIN_MARKER.as_bytes(), END_MARKER.as_bytes()];
        let snapshot = snapshot_with(&[("c1", "bridge", "172.17.0.2", &["web"])]);

        let out = render(&existing, &snapshot);
        assert_eq!(
            out,
            vec![
                latin1.to_vec(),
                BEGIN_MARKER.as_bytes().to_vec(),
                b"172.17.0.2\tweb.docker".to_vec(),
                END_MARKER.as_bytes().to_vec(),
            ]
        );
    }

    #[test]
    fn records_render_in_table_order() {
        let snapshot = snapshot_with(&[
            ("bbb", "net", "10.0.0.3", &["b"]),
            ("aaa", "z-net", "10.0.1.2", &["a"]),
            ("aaa", "a-net", "10.0.0.2", &["a", "alias"]),
        ]);
        let out = render(&["x"], &snapshot);
        assert_eq!(
            text(&out[2..5]),
            [
                "10.0.0.2\ta.docker alias.docker".to_owned(),
                "10.0.1.2\ta.docker".to_owned(),
                "10.0.0.3\tb.docker".to_owned(),
            ]
        );
    }

    #[test]
    fn records_without_domains_are_skipped() {
        let mut table = HostTable::new(DomainRules::new("", ".docker"));
        table.upsert("c1", "bridge", "172.17.0.2", [None::<&str>, Some("")]);
        table.upsert("c2", "bridge", "172.17.0.3", [Some("db")]);

        let out = render(&["x"], &table.snapshot());
        assert_eq!(
            text(&out),
            vec![
                "x".to_owned(),
                BEGIN_MARKER.to_owned(),
                "172.17.0.3\tdb.docker".to_owned(),
                END_MARKER.to_owned(),
            ]
        );
    }

    #[test]
    fn rendering_is_stable_over_its_own_output() {
        let snapshot = snapshot_with(&[("c1", "bridge", "172.17.0.2", &["web", "api"])]);
        let first = render(&["127.0.0.1 localhost", "::1 localhost"], &snapshot);
        let second = render(&first, &snapshot);
        assert_eq!(first, second);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn plain_line() -> impl Strategy<Value = String> {
            "[a-z0-9. #\t]{0,30}"
        }

        proptest! {
            #[test]
            fn render_is_deterministic(
                lines in prop::collection::vec(plain_line(), 0..20),
                entries in prop::collection::vec(("[a-f0-9]{1,4}", "[a-z]{1,4}", "[a-z]{1,6}"), 0..10),
            ) {
                let mut table = HostTable::new(DomainRules::new("", ".docker"));
                for (cid, net, name) in &entries {
                    table.upsert(cid, net, "10.0.0.1", [Some(name.as_str())]);
                }
                let snapshot = table.snapshot();
                prop_assert_eq!(render(&lines, &snapshot), render(&lines, &snapshot));
            }

            #[test]
            fn unmarked_input_is_kept_and_gets_exactly_one_block(
                lines in prop::collection::vec(plain_line(), 0..20),
            ) {
                let out = render(&lines, &HostSnapshot::default());
                prop_assert_eq!(text(&out[..lines.len()]), lines.clone());
                prop_assert_eq!(out.iter().filter(|l| l.as_slice() == BEGIN_MARKER.as_bytes()).count(), 1);
                prop_assert_eq!(out.iter().filter(|l| l.as_slice() == END_MARKER.as_bytes()).count(), 1);
                prop_assert_eq!(out.len(), lines.len() + 2);
            }

            #[test]
            fn lines_around_a_block_survive(
                before in prop::collection::vec(plain_line(), 0..10),
                inside in prop::collection::vec(plain_line(), 0..10),
                after in prop::collection::vec(plain_line(), 0..10),
            ) {
                let mut existing = before.clone();
                existing.push(BEGIN_MARKER.to_owned());
                existing.extend(inside);
                existing.push(END_MARKER.to_owned());
                existing.extend(after.clone());

                let kept = strip_block(&existing);
                let mut expected = before;
                expected.extend(after);
                prop_assert_eq!(text(&kept), expected);
            }
        }
    }
}
