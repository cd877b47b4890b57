const MAX_WIDTH: f64 = 80.0;

/// Draws one stock unit as a bar scaled to `MAX_WIDTH` columns. Cuts are
/// laid out left to right in the given order; whatever remains on the right
/// is offcut.
pub fn render_stick(stock_length: f64, cuts: &[f64]) -> String {
    if !stock_length.is_finite() || stock_length <= 0.0 {
        return String::new();
    }
    let scale = MAX_WIDTH / stock_length;
    let width = (stock_length * scale).round() as usize;

    let mut edges = vec![0];
    let mut offset = 0.0;
    for &cut in cuts {
        offset += cut;
        edges.push(((offset * scale).round() as usize).min(width));
    }

    let mut border = vec!['-'; width + 1];
    let mut body = vec![' '; width + 1];
    for &x in edges.iter().chain(std::iter::once(&width)) {
        border[x] = '+';
        body[x] = '|';
    }

    for (window, cut) in edges.windows(2).zip(cuts) {
        let (start, end) = (window[0], window[1]);
        if end <= start + 1 {
            continue;
        }
        let inner = end - start - 1;
        let label: Vec<char> = cut.to_string().chars().collect();
        if label.len() > inner {
            continue;
        }
        let first = start + 1 + (inner - label.len()) / 2;
        for (i, &ch) in label.iter().enumerate() {
            body[first + i] = ch;
        }
    }

    let mut result = String::new();
    for row in [&border, &body, &border] {
        let line: String = row.iter().collect();
        result.push_str(line.trim_end());
        result.push('\n');
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_single_cut() {
        let output = render_stick(100.0, &[40.0]);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with('+'));
        assert!(lines[0].ends_with('+'));
        assert!(lines[1].contains("40"));
        assert_eq!(lines[0].matches('+').count(), 3);
    }

    #[test]
    fn test_render_two_cuts() {
        let output = render_stick(100.0, &[40.0, 40.0]);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0].matches('+').count(), 4);
        assert_eq!(lines[1].matches("40").count(), 2);
        assert_eq!(lines[0].len(), lines[1].len());
        assert_eq!(lines[0].len(), 81);
    }

    #[test]
    fn test_render_fractional_label() {
        let output = render_stick(10.0, &[2.5]);
        assert!(output.contains("2.5"));
    }

    #[test]
    fn test_render_narrow_cut_has_no_label() {
        let output = render_stick(1000.0, &[5.0]);
        assert!(!output.contains('5'));
        assert!(output.contains('+'));
    }

    #[test]
    fn test_render_empty() {
        let output = render_stick(100.0, &[]);
        // Still draws the stock border
        assert_eq!(output.lines().next().map(|l| l.matches('+').count()), Some(2));
        assert!(render_stick(0.0, &[]).is_empty());
    }
}
