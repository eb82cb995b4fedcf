//! Raw domain candidates for a container.

use hostsync_engine::ContainerDetails;

/// Hostname, container name, compose project and compose service, in that
/// order.
///
/// Absent or empty values come back as `None`/empty and are skipped by the
/// table when it normalizes.
pub fn domain_candidates(details: &ContainerDetails) -> [Option<&str>; 4] {
    [
        Some(details.hostname.as_str()),
        Some(details.display_name()),
        details.compose_project(),
        details.compose_service(),
    ]
}
