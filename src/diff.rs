//! Line diff between an installed file and the registry version

/// Beyond this many line pairs the diff degrades to remove-all/add-all
const MAX_CELLS: usize = 4_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffLine<'a> {
    Same(&'a str),
    Removed(&'a str),
    Added(&'a str),
}

/// Longest-common-subsequence diff of two texts, line by line
pub fn diff_lines<'a>(old: &'a str, new: &'a str) -> Vec<DiffLine<'a>> {
    let a: Vec<&str> = old.lines().collect();
    let b: Vec<&str> = new.lines().collect();

    if a.len().saturating_mul(b.len()) > MAX_CELLS {
        return a
            .iter()
            .map(|l| DiffLine::Removed(l))
            .chain(b.iter().map(|l| DiffLine::Added(l)))
            .collect();
    }

    // lcs[i][j] = LCS length of a[i..] and b[j..]
    let mut lcs = vec![vec![0u32; b.len() + 1]; a.len() + 1];
    for i in (0..a.len()).rev() {
        for j in (0..b.len()).rev() {
            lcs[i][j] = if a[i] == b[j] {
                lcs[i + 1][j + 1] + 1
            } else {
                lcs[i + 1][j].max(lcs[i][j + 1])
            };
        }
    }

    let (mut i, mut j) = (0, 0);
    let mut out = Vec::with_capacity(a.len().max(b.len()));
    while i < a.len() && j < b.len() {
        if a[i] == b[j] {
            out.push(DiffLine::Same(a[i]));
            i += 1;
            j += 1;
        } else if lcs[i + 1][j] >= lcs[i][j + 1] {
            out.push(DiffLine::Removed(a[i]));
            i += 1;
        } else {
            out.push(DiffLine::Added(b[j]));
            j += 1;
        }
    }
    out.extend(a[i..].iter().map(|l| DiffLine::Removed(l)));
    out.extend(b[j..].iter().map(|l| DiffLine::Added(l)));
    out
}

pub fn has_changes(lines: &[DiffLine<'_>]) -> bool {
    lines.iter().any(|l| !matches!(l, DiffLine::Same(_)))
}

/// Render changed lines with `context` unchanged lines around each change
pub fn render(old_label: &str, new_label: &str, lines: &[DiffLine<'_>], context: usize) -> String {
    let mut out = format!("--- {}\n+++ {}\n", old_label, new_label);

    let changed: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, l)| !matches!(l, DiffLine::Same(_)))
        .map(|(i, _)| i)
        .collect();

    let mut last_printed: Option<usize> = None;
    for (idx, line) in lines.iter().enumerate() {
        let near_change = changed
            .iter()
            .any(|&c| idx + context >= c && idx <= c + context);
        if !near_change {
            continue;
        }
        if let Some(last) = last_printed
            && idx > last + 1
        {
            out.push_str("@@\n");
        }
        match line {
            DiffLine::Same(text) => out.push_str(&format!(" {}\n", text)),
            DiffLine::Removed(text) => out.push_str(&format!("-{}\n", text)),
            DiffLine::Added(text) => out.push_str(&format!("+{}\n", text)),
        }
        last_printed = Some(idx);
    }

    out
}
