//! Plain-text rendering of registry results.

use std::fmt::Write;

use chrono::SecondsFormat;
use medledger_registry::{MetricsSnapshot, PractitionerEntry, RecordListing, RecordView};

/// RFC 3339 mint time, or the raw seconds if out of range.
pub fn format_timestamp(view: &RecordView) -> String {
    view.minted_at_utc()
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| view.mint_timestamp.to_string())
}

pub fn format_view(view: &RecordView) -> String {
    format!(
        "#{id} {name}\n  owner:    {owner}\n  uploader: {uploader} ({institution}, {department})\n  minted:   {minted}\n  document: {locator}",
        id = view.record_id,
        name = view.document_name,
        owner = view.owner,
        uploader = view.uploader.name,
        institution = view.uploader.institution,
        department = view.uploader.department,
        minted = format_timestamp(view),
        locator = view.locator,
    )
}

/// Views followed by a summary of failed lookups, if any.
pub fn format_listing(listing: &RecordListing) -> String {
    let mut out = String::new();
    for view in &listing.views {
        let _ = writeln!(out, "{}", format_view(view));
    }
    if listing.is_partial() {
        let _ = writeln!(
            out,
            "{} record(s) could not be loaded:",
            listing.failures.len()
        );
        for failure in &listing.failures {
            let _ = writeln!(out, "  #{}: {}", failure.record_id, failure.cause);
        }
    }
    out
}

pub fn format_metrics(snapshot: &MetricsSnapshot) -> String {
    format!(
        "admins:   {}\npatients: {}\nrecords:  {}",
        snapshot.total_admins, snapshot.total_patients, snapshot.total_records
    )
}

pub fn format_practitioners(entries: &[PractitionerEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        let stars = "*".repeat(usize::from(entry.display_rating));
        let _ = writeln!(
            out,
            "{name} - {qualification}, {department}, {institution} [{stars}]",
            name = entry.profile.name,
            qualification = entry.profile.qualification,
            department = entry.profile.department,
            institution = entry.profile.institution,
        );
    }
    out
}
