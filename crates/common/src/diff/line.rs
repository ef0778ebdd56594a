// Line-level keep/add/remove script between two block bodies.

use super::align::lcs_pairs;
use super::{DiffLine, DiffOp};

/// Diff two block bodies line by line. Within the gap before each
/// matched line, deletions precede additions — a fixed display
/// convention, not a property of the alignment.
pub fn line_diff(before: &str, after: &str) -> Vec<DiffLine> {
    let before_lines: Vec<&str> = before.split('\n').collect();
    let after_lines: Vec<&str> = after.split('\n').collect();
    let pairs = lcs_pairs(&before_lines, &after_lines);

    let mut lines = Vec::new();
    let mut i = 0;
    let mut j = 0;
    for (pi, pj) in pairs {
        while i < pi {
            lines.push(DiffLine { op: DiffOp::Del, text: before_lines[i].to_string() });
            i += 1;
        }
        while j < pj {
            lines.push(DiffLine { op: DiffOp::Add, text: after_lines[j].to_string() });
            j += 1;
        }
        lines.push(DiffLine { op: DiffOp::Same, text: before_lines[pi].to_string() });
        i = pi + 1;
        j = pj + 1;
    }
    while i < before_lines.len() {
        lines.push(DiffLine { op: DiffOp::Del, text: before_lines[i].to_string() });
        i += 1;
    }
    while j < after_lines.len() {
        lines.push(DiffLine { op: DiffOp::Add, text: after_lines[j].to_string() });
        j += 1;
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(lines: &[DiffLine]) -> Vec<(DiffOp, &str)> {
        lines.iter().map(|l| (l.op, l.text.as_str())).collect()
    }

    /// Join the lines that reconstruct one side of the diff.
    fn reconstruct(lines: &[DiffLine], keep: DiffOp) -> String {
        lines
            .iter()
            .filter(|l| l.op == DiffOp::Same || l.op == keep)
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn identical_bodies_are_all_same() {
        let lines = line_diff("a\nb", "a\nb");
        assert_eq!(render(&lines), vec![(DiffOp::Same, "a"), (DiffOp::Same, "b")]);
    }

    #[test]
    fn changed_line_becomes_del_then_add() {
        let lines = line_diff("a\nold\nb", "a\nnew\nb");
        assert_eq!(
            render(&lines),
            vec![
                (DiffOp::Same, "a"),
                (DiffOp::Del, "old"),
                (DiffOp::Add, "new"),
                (DiffOp::Same, "b"),
            ]
        );
    }

    #[test]
    fn trailing_additions_after_last_match() {
        let lines = line_diff("a", "a\nb\nc");
        assert_eq!(
            render(&lines),
            vec![(DiffOp::Same, "a"), (DiffOp::Add, "b"), (DiffOp::Add, "c")]
        );
    }

    #[test]
    fn trailing_deletions_after_last_match() {
        let lines = line_diff("a\nb\nc", "a");
        assert_eq!(
            render(&lines),
            vec![(DiffOp::Same, "a"), (DiffOp::Del, "b"), (DiffOp::Del, "c")]
        );
    }

    #[test]
    fn deletions_precede_additions_within_a_gap() {
        let lines = line_diff("x\nmid\ny", "z\nmid\nw");
        assert_eq!(
            render(&lines),
            vec![
                (DiffOp::Del, "x"),
                (DiffOp::Add, "z"),
                (DiffOp::Same, "mid"),
                (DiffOp::Del, "y"),
                (DiffOp::Add, "w"),
            ]
        );
    }

    #[test]
    fn del_and_same_lines_reproduce_before_text() {
        let before = "one\ntwo\nthree\nfour";
        let after = "one\n2\nthree\nfive\nsix";
        let lines = line_diff(before, after);
        assert_eq!(reconstruct(&lines, DiffOp::Del), before);
        assert_eq!(reconstruct(&lines, DiffOp::Add), after);
    }
}
