use crate::analyze::{self, Breakdown};
use crate::model::{AppConfig, LanguageStat, TreeNode};

/// `1234567` -> `1,234,567`
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn format_percentage(p: f64) -> String {
    format!("{:.1}", p)
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 7] = ["B", "KB", "MB", "GB", "TB", "PB", "EB"];
    if bytes == 0 {
        return "0 B".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{} {}", rounded as u64, UNITS[unit])
    } else {
        format!("{:.1} {}", rounded, UNITS[unit])
    }
}

/// Two largest units only: `90061` -> `1d 1h`.
pub fn format_duration(seconds: u64) -> String {
    const UNITS: [(&str, u64); 7] = [
        ("y", 31_536_000),
        ("mo", 2_592_000),
        ("w", 604_800),
        ("d", 86_400),
        ("h", 3_600),
        ("m", 60),
        ("s", 1),
    ];
    if seconds == 0 {
        return "0s".to_string();
    }

    let mut parts = Vec::new();
    let mut remaining = seconds;
    for (label, size) in UNITS {
        if remaining >= size {
            parts.push(format!("{}{}", remaining / size, label));
            remaining %= size;
        }
    }
    parts.truncate(2);
    parts.join(" ")
}

pub fn format_language_table(langs: &[LanguageStat]) -> String {
    if langs.is_empty() {
        return "(no languages detected)".to_string();
    }

    let width = langs
        .iter()
        .map(|l| l.language.chars().count())
        .max()
        .unwrap_or(8)
        .max(8);

    let mut out = format!(
        "{:<width$}  {:>6}  {:>10}  {:>10}  {:>9}  {:>8}  {:>6}\n",
        "language", "files", "lines", "code", "comments", "blanks", "%"
    );
    for l in langs {
        out.push_str(&format!(
            "{:<width$}  {:>6}  {:>10}  {:>10}  {:>9}  {:>8}  {:>6}\n",
            l.language,
            format_number(l.files),
            format_number(l.lines),
            format_number(l.code),
            format_number(l.comments),
            format_number(l.blanks),
            format_percentage(l.percentage),
        ));
    }
    out
}

pub fn format_overview(parts: &[Breakdown]) -> String {
    parts
        .iter()
        .map(|p| {
            format!(
                "{}:{} ({}%)",
                p.label,
                format_number(p.value),
                format_percentage(p.percentage)
            )
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Indented tree listing down to `max_depth` levels below the root.
pub fn format_tree(root: &TreeNode, max_depth: usize) -> String {
    fn walk(node: &TreeNode, depth: usize, max_depth: usize, out: &mut String) {
        for child in analyze::sorted_children(node) {
            let indent = "  ".repeat(depth);
            if child.is_dir() {
                out.push_str(&format!(
                    "{indent}{}/  {}\n",
                    child.name,
                    format_number(child.stats.lines)
                ));
                if depth + 1 < max_depth {
                    walk(child, depth + 1, max_depth, out);
                }
            } else {
                let lang = child.language_label().unwrap_or("-");
                out.push_str(&format!(
                    "{indent}{}  {} [{}]\n",
                    child.name,
                    format_number(child.stats.lines),
                    lang
                ));
            }
        }
    }

    let mut out = String::new();
    if max_depth > 0 {
        walk(root, 0, max_depth, &mut out);
    }
    out
}

pub fn format_config(cfg: &AppConfig) -> String {
    let excludes = if cfg.exclude_dirs.is_empty() {
        "(none)".to_string()
    } else {
        cfg.exclude_dirs.join(", ")
    };
    format!(
        "cache ttl:        {} ({}s)\n\
         default depth:    {}\n\
         request timeout:  {} ({}s)\n\
         max repo size:    {}\n\
         exclude dirs:     {}\n\
         data files:       {}\n\
         documentation:    {}",
        format_duration(cfg.cache_ttl_seconds),
        cfg.cache_ttl_seconds,
        cfg.default_depth,
        format_duration(cfg.request_timeout_seconds),
        cfg.request_timeout_seconds,
        format_bytes(cfg.max_repo_size_mb * 1024 * 1024),
        excludes,
        cfg.include_data_files,
        cfg.include_documentation,
    )
}

pub fn parse_list(joined: &str) -> Vec<String> {
    joined
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}
