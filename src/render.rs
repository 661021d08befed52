//! Human-readable status table, built only from snapshot output.
use crate::types::protocol::JobView;

/// Renders `jobs` (already in urgency order) as a fixed-width table.
pub fn render_status(jobs: &[JobView], now: u64, capacity: usize) -> String {
    let mut out =
        format!("time {now}: {}/{capacity} jobs waiting\n", jobs.len());

    if jobs.is_empty() {
        out.push_str("queue is empty");
        return out;
    }

    out.push_str(&format!(
        "{:>4}  {:>6}  {:<12}  {:<20}  {:>3}  {:>6}  {:>10}",
        "rank", "id", "owner", "label", "pri", "waited", "expires-in"
    ));
    for (rank, job) in jobs.iter().enumerate() {
        out.push_str(&format!(
            "\n{:>4}  {:>6}  {:<12}  {:<20}  {:>3}  {:>6}  {:>10}",
            rank + 1,
            job.id,
            truncate(&job.owner, 12),
            truncate(&job.label, 20),
            job.priority,
            job.waited,
            job.time_to_expiry,
        ));
    }

    out
}

fn truncate(s: &str, width: usize) -> &str {
    match s.char_indices().nth(width) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::states::JobStatus;

    fn view(id: u64, label: &str, priority: u32, waited: u64) -> JobView {
        JobView {
            id,
            owner: "alice".into(),
            label: label.into(),
            priority,
            waited,
            time_to_expiry: 60 - waited,
            status: JobStatus::Waiting,
            created_at: 0,
        }
    }

    #[test]
    fn test_empty() {
        assert_eq!(
            render_status(&[], 7, 3),
            "time 7: 0/3 jobs waiting\nqueue is empty"
        );
    }

    #[test]
    fn test_rows_follow_snapshot_order() {
        let jobs = [
            view(2, "urgent", 1, 10),
            view(1, "a-very-long-label-indeed", 3, 10),
        ];
        let table = render_status(&jobs, 10, 5);
        let lines: Vec<_> = table.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "time 10: 2/5 jobs waiting");
        assert!(lines[1].starts_with("rank"));
        assert!(lines[2].contains("urgent"));
        assert!(lines[2].trim_start().starts_with("1 "));
        assert!(lines[3].contains("a-very-long-label-in "));
        assert!(lines[3].trim_end().ends_with("50"));
    }
}
