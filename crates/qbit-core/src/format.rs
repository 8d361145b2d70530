//! Rendering of torrent records into chat-ready text.
//!
//! Output uses the Telegram HTML subset (`<b>`, `<code>`); torrent names are
//! escaped. Everything here is pure so it can be tested without a chat
//! connection.

use std::time::Duration;

use chrono::NaiveTime;
use qbit_models::{Eta, TorrentRecord};

/// Maximum characters in one status block.
pub const MAX_BLOCK_CHARS: usize = 1700;

/// Longest torrent name rendered before truncation.
pub const MAX_NAME_CHARS: usize = 256;

/// Longest torrent name after HTML escaping.
///
/// Leaves room for the rest of an entry within [`MAX_BLOCK_CHARS`].
pub const MAX_ESCAPED_NAME_CHARS: usize = 1_024;

const SIZE_UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

const ETA_UNITS: [(&str, &str, u64); 5] = [
    ("week", "weeks", 604_800),
    ("day", "days", 86_400),
    ("hour", "hours", 3_600),
    ("minute", "minutes", 60),
    ("second", "seconds", 1),
];

/// Reply for commands issued outside the designated chat.
pub const WRONG_CHANNEL_REPLY: &str =
    "❌ Oops! I can only respond to commands in the designated download status channel!";

/// Reply for malformed `/status` arguments.
pub const USAGE_REPLY: &str = "❌ I didn't understand that.\n\n\
    <b>Usage:</b> <code>/status [category] [all|completed|downloading]</code>\n\
    Type /help for examples.";

/// Help text for the `/help` command.
pub const HELP_TEXT: &str = "📚 <b>Download Status Bot Help</b>\n\n\
    This bot keeps track of your qBittorrent downloads.\n\n\
    📋 <b>Commands:</b>\n\
    • /status - Show all downloads\n\
    • /help - Show this message\n\n\
    🎯 <b>Filtering by category:</b>\n\
    • <code>/status movies</code> - Only movie downloads\n\
    • <code>/status tv</code> - Only TV show downloads\n\n\
    🎯 <b>Filtering by status:</b>\n\
    • <code>/status completed</code> - Finished downloads\n\
    • <code>/status downloading</code> - Downloads still in progress\n\n\
    🎯 <b>Combined:</b>\n\
    • <code>/status movies completed</code> - Finished movies\n\
    • <code>/status tv downloading</code> - TV shows in progress\n\n\
    💡 <b>Tips:</b>\n\
    • The status message refreshes automatically\n\
    • Use ⏸️ Pause and ▶️ Resume under the message to control refreshing\n\
    • Sending /status again replaces the previous status message\n\
    • Downloads are sorted by progress";

const EMPTY_STATE: &str = "<b>No Downloads Found 🤔</b>\n\
    Nothing is downloading right now! Why not request something new? 🎬";

/// Format a remaining-time estimate.
///
/// Shows at most the two largest non-zero units, e.g. `ETA: 1 day, 3 hours`.
pub fn format_eta(eta: Eta) -> String {
    let seconds = match eta {
        Eta::Infinite => return "∞".to_string(),
        Eta::Done => return "Done".to_string(),
        Eta::Remaining(seconds) => seconds,
    };

    let mut remaining = seconds;
    let mut parts = Vec::with_capacity(2);
    for (singular, plural, unit) in ETA_UNITS {
        let value = remaining / unit;
        if value == 0 {
            continue;
        }
        remaining -= value * unit;
        parts.push(format!("{} {}", value, if value == 1 { singular } else { plural }));
        if parts.len() == 2 {
            break;
        }
    }

    if parts.is_empty() {
        "Done".to_string()
    } else {
        format!("ETA: {}", parts.join(", "))
    }
}

/// Format a byte count with binary units, e.g. `1.50 KB`.
pub fn format_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    for unit in &SIZE_UNITS[..SIZE_UNITS.len() - 1] {
        if value < 1024.0 {
            return format!("{:.2} {}", value, unit);
        }
        value /= 1024.0;
    }
    format!("{:.2} {}", value, SIZE_UNITS[SIZE_UNITS.len() - 1])
}

/// Format a transfer rate, e.g. `2.00 MB/s`.
pub fn format_speed(bytes_per_sec: u64) -> String {
    format!("{}/s", format_size(bytes_per_sec))
}

/// Format an interval for the status footer, e.g. `5 min`.
pub fn format_interval(interval: Duration) -> String {
    let secs = interval.as_secs();
    if secs >= 60 && secs % 60 == 0 {
        format!("{} min", secs / 60)
    } else {
        format!("{} s", secs)
    }
}

/// Escape text for Telegram HTML.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape a torrent name, cutting it to fit both name limits.
fn escape_name(name: &str) -> String {
    let escaped = escape_html(name);
    if name.chars().count() <= MAX_NAME_CHARS
        && escaped.chars().count() <= MAX_ESCAPED_NAME_CHARS
    {
        return escaped;
    }

    let mut out = String::new();
    let mut width = 0;
    let mut buf = [0u8; 4];
    for (taken, c) in name.chars().enumerate() {
        let piece = escape_html(c.encode_utf8(&mut buf));
        let piece_width = piece.chars().count();
        if taken == MAX_NAME_CHARS - 1 || width + piece_width > MAX_ESCAPED_NAME_CHARS - 1 {
            break;
        }
        out.push_str(&piece);
        width += piece_width;
    }
    out.push('…');
    out
}

/// Render one torrent as a status entry (ends with a blank line).
pub fn render_entry(record: &TorrentRecord) -> String {
    let marker = if record.state.is_complete() { "✅" } else { "⏳" };
    format!(
        "<b>{}</b> {}\n\
         ▫️ Progress: <code>{:.2}%</code> | Status: <code>{}</code>\n\
         ▫️ Size: <code>{}</code> | Speed: <code>{}</code>\n\
         ▫️ {}\n\n",
        escape_name(&record.name),
        marker,
        record.progress,
        record.state.label(),
        format_size(record.size),
        format_speed(record.download_speed),
        format_eta(record.eta),
    )
}

/// Split records into blocks of at most [`MAX_BLOCK_CHARS`] characters.
///
/// Returns no blocks for empty input.
pub fn paginate(records: &[TorrentRecord]) -> Vec<String> {
    paginate_entries(records.iter().map(render_entry), MAX_BLOCK_CHARS)
}

/// Greedily pack rendered entries into blocks of at most `budget` characters.
///
/// Entries are never split. An entry longer than `budget` on its own gets a
/// block to itself.
pub fn paginate_entries<I>(entries: I, budget: usize) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut blocks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for entry in entries {
        let entry_len = entry.chars().count();
        if current_len + entry_len > budget && !current.is_empty() {
            blocks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        current.push_str(&entry);
        current_len += entry_len;
    }

    if !current.is_empty() {
        blocks.push(current);
    }
    blocks
}

/// Footer shown under the first page of a status publication.
pub fn format_footer(auto_refresh: bool, interval: Duration, updated_at: NaiveTime) -> String {
    let updated = updated_at.format("%H:%M:%S");
    if auto_refresh {
        format!(
            "🔄 Updates automatically every {} · Last updated {}",
            format_interval(interval),
            updated
        )
    } else {
        format!("⏸️ Auto-refresh paused · Last updated {}", updated)
    }
}

/// Assemble the body of one page of a status publication.
///
/// `index` is zero-based. The footer is attached separately with
/// [`attach_footer`] so it can be re-rendered without a new fetch.
pub fn render_page(block: &str, index: usize, total: usize) -> String {
    let mut page = String::from("📥 <b>Download Status</b>");
    if total > 1 {
        page.push_str(&format!(" (Part {}/{})", index + 1, total));
    }
    page.push_str("\n\n");
    page.push_str(block.trim_end());
    page
}

/// Body shown when no torrent matches the active filters.
pub fn render_empty_page() -> String {
    EMPTY_STATE.to_string()
}

/// Append the footer to a page body.
pub fn attach_footer(body: &str, footer: &str) -> String {
    format!("{}\n\n{}", body, footer)
}

/// One-off notice for a failed command-triggered refresh.
pub fn error_notice(error: &str) -> String {
    format!(
        "❌ <b>Error</b>\nOops! Something went wrong: {}\n\
         Please try again later or contact the admin if this persists.",
        escape_html(error)
    )
}
