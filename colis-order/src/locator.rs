use crate::schema::Column;

/// Header fragments that identify the "message sent" column.
pub const MESSAGE_SENT_HINTS: [&str; 2] = ["message", "envoyé"];

/// Where the message flag lives when no header matches.
pub const MESSAGE_SENT_FALLBACK: usize = Column::MessageSent.index();

/// Index of the first header cell containing any of `hints`, compared
/// case-insensitively, or `fallback` when none does.
pub fn locate_column(header: &[String], hints: &[&str], fallback: usize) -> usize {
    find_column(header, hints).unwrap_or(fallback)
}

/// Like [`locate_column`] but tells the caller whether the header matched.
pub fn find_column(header: &[String], hints: &[&str]) -> Option<usize> {
    let hints: Vec<String> = hints.iter().map(|h| h.to_lowercase()).collect();
    header.iter().position(|cell| {
        let cell = cell.to_lowercase();
        hints.iter().any(|hint| cell.contains(hint.as_str()))
    })
}

pub fn locate_message_sent(header: &[String]) -> usize {
    locate_column(header, &MESSAGE_SENT_HINTS, MESSAGE_SENT_FALLBACK)
}
