use crate::domain::model::StatsSnapshot;

/// Renders the plain-text run summary appended to `stats_result.txt`.
/// Presentation only; all numbers come from the stats snapshot.
pub fn format_report(snapshot: &StatsSnapshot, resumed: bool) -> String {
    let mut report = Vec::new();
    let rule = "=".repeat(50);

    if resumed {
        report.push(format!("\n\n{}", rule));
        report.push("  HARVEST REPORT (RESUMED RUN)".to_string());
    } else {
        report.push(rule.clone());
        report.push("  HARVEST REPORT (NEW RUN)".to_string());
    }
    report.push(rule.clone());

    report.push(format!(
        "Completed before this run (offset): {}",
        snapshot.completed_on_start
    ));
    report.push(format!("Scheduled this run: {}", snapshot.scheduled));
    report.push(format!(
        "Total elapsed: {:.2}s",
        snapshot.total_elapsed.as_secs_f64()
    ));
    report.push("-".repeat(50));
    report.push(format!("OK (persisted): {}", snapshot.ok));
    report.push(format!("Failed (in ledger): {}", snapshot.failed));
    report.push(format!("Not found (404): {}", snapshot.not_found));
    report.push("-".repeat(50));
    report.push("PER-BATCH DETAIL:".to_string());

    report.push(format!(
        "| {} | {} | {} | {} |",
        pad("Batch", 5),
        pad("OK (Total)", 10),
        pad("OK (New)", 10),
        pad("Time", 10)
    ));
    for batch in &snapshot.batches {
        report.push(format!(
            "| {} | {} | {} | {} |",
            pad(&batch.index.to_string(), 5),
            pad(&batch.count.to_string(), 10),
            pad(&batch.newly_added.to_string(), 10),
            pad(&format!("{:.2}s", batch.elapsed.as_secs_f64()), 10)
        ));
    }

    report.push(rule);
    report.push("DONE.".to_string());

    report.join("\n")
}

fn pad(value: &str, width: usize) -> String {
    format!("{:<width$}", value, width = width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::BatchInfo;
    use std::time::Duration;

    fn snapshot() -> StatsSnapshot {
        StatsSnapshot {
            ok: 3,
            not_found: 1,
            failed: 2,
            completed_on_start: 10,
            scheduled: 6,
            batches: vec![BatchInfo {
                index: 1,
                count: 3,
                newly_added: 2,
                elapsed: Duration::from_secs(4),
            }],
            total_elapsed: Duration::from_secs(12),
        }
    }

    #[test]
    fn test_new_run_banner() {
        let report = format_report(&snapshot(), false);
        assert!(report.contains("NEW RUN"));
        assert!(!report.starts_with('\n'));
        assert!(report.contains("OK (persisted): 3"));
        assert!(report.contains("Not found (404): 1"));
        assert!(report.ends_with("DONE."));
    }

    #[test]
    fn test_resumed_run_banner_is_append_friendly() {
        let report = format_report(&snapshot(), true);
        assert!(report.contains("RESUMED RUN"));
        // Leading newlines separate this section from the previous run's
        // report in the same file.
        assert!(report.starts_with("\n\n"));
    }

    #[test]
    fn test_batch_rows_list_total_and_new_counts() {
        let report = format_report(&snapshot(), false);
        let row = report
            .lines()
            .find(|line| line.starts_with("| 1"))
            .expect("batch row");
        assert!(row.contains("| 3"));
        assert!(row.contains("| 2"));
        assert!(row.contains("4.00s"));
    }
}
