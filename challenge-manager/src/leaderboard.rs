use crate::manager::RosterEntry;

/// Display ordering for a challenge roster: the viewer's own record is
/// always pinned to position 0; everyone else ranks descending by the
/// variant's progress metric, with ties keeping encounter order.
pub fn order_roster(entries: &mut Vec<RosterEntry>, viewer_id: &str) {
    entries.sort_by(|a, b| {
        b.record
            .progress
            .metric()
            .total_cmp(&a.record.progress.metric())
    });
    if let Some(index) = entries
        .iter()
        .position(|entry| entry.record.user_id == viewer_id)
    {
        let own = entries.remove(index);
        entries.insert(0, own);
    }
}
