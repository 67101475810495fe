//! Diff rendering for fixture comparison.

/// Render a text diff between expected and actual output.
///
/// printf outputs are mostly single lines, so a differing line also gets a
/// caret under the first differing character.
#[must_use]
pub fn render_diff(expected: &str, actual: &str) -> String {
    if expected == actual {
        return String::from("[identical]");
    }

    let mut out = String::new();
    out.push_str("--- expected\n");
    out.push_str("+++ actual\n");
    let expected_lines: Vec<&str> = expected.split('\n').collect();
    let actual_lines: Vec<&str> = actual.split('\n').collect();
    let rows = expected_lines.len().max(actual_lines.len());
    for i in 0..rows {
        let e = expected_lines.get(i).copied();
        let a = actual_lines.get(i).copied();
        if e == a {
            continue;
        }
        out.push_str(&format!("@@ line {} @@\n", i + 1));
        if let Some(e) = e {
            out.push_str(&format!("-{e:?}\n"));
        }
        if let Some(a) = a {
            out.push_str(&format!("+{a:?}\n"));
        }
        if let (Some(e), Some(a)) = (e, a) {
            let column = e
                .chars()
                .zip(a.chars())
                .take_while(|(x, y)| x == y)
                .count();
            out.push_str(&format!(" {}^ column {}\n", " ".repeat(column + 1), column + 1));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_outputs() {
        assert_eq!(render_diff("abc", "abc"), "[identical]");
    }

    #[test]
    fn marks_first_differing_column() {
        let diff = render_diff("0x1p+0", "0x1.0p+0");
        assert!(diff.contains("-\"0x1p+0\""));
        assert!(diff.contains("+\"0x1.0p+0\""));
        assert!(diff.contains("column 4"));
    }

    #[test]
    fn reports_missing_lines() {
        let diff = render_diff("a\nb", "a");
        assert!(diff.contains("@@ line 2 @@"));
        assert!(diff.contains("-\"b\""));
    }
}
