use crate::cli::commands::{open_pool, print_json};
use crate::cli::parser::Cli;
use crate::config::Config;
use crate::db::log::load_log;
use crate::errors::AppResult;
use crate::ui::messages::info;
use ansi_term::Colour;
use regex::Regex;
use std::sync::LazyLock;
use unicode_width::UnicodeWidthStr;

const OP_MAX_W: usize = 60;

static ANSI_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\x1B\[[0-9;]*[mK]").ok());

fn strip_ansi(s: &str) -> String {
    match ANSI_RE.as_ref() {
        Some(re) => re.replace_all(s, "").into_owned(),
        None => s.to_string(),
    }
}

fn color_for_operation(op: &str) -> Colour {
    match op {
        "seed" => Colour::Green,
        "migration_applied" => Colour::Purple,
        "init" => Colour::RGB(255, 153, 51),
        _ => Colour::White,
    }
}

/// Print the internal log, one colored line per row.
pub fn handle(cli: &Cli, cfg: &Config) -> AppResult<()> {
    let pool = open_pool(cfg)?;
    let entries = load_log(&pool.conn)?;

    if cli.json {
        let rows: Vec<serde_json::Value> = entries
            .iter()
            .map(|(id, date, op, target, message)| {
                serde_json::json!({
                    "id": id, "date": date, "operation": op, "target": target, "message": message
                })
            })
            .collect();
        return print_json(&rows);
    }

    if entries.is_empty() {
        info("Internal log is empty");
        return Ok(());
    }

    let id_w = entries
        .iter()
        .map(|(id, ..)| id.to_string().len())
        .max()
        .unwrap_or(1);
    let date_w = entries.iter().map(|(_, d, ..)| d.len()).max().unwrap_or(10);
    let op_w = entries
        .iter()
        .map(|(_, _, op, target, _)| op.width() + target.width() + 3)
        .max()
        .unwrap_or(10)
        .min(OP_MAX_W);

    println!("📜 Internal log:\n");

    for (id, date, op, target, message) in &entries {
        let color = color_for_operation(op);

        let mut colored = color.paint(op.as_str()).to_string();
        if !target.is_empty() {
            colored.push_str(&format!(" ({})", target));
        }

        // cut on the visible text, then recolor the operation word
        let visible = strip_ansi(&colored);
        let shown = if visible.width() > OP_MAX_W {
            let mut s: String = visible.chars().take(OP_MAX_W - 3).collect();
            s.push_str("...");
            s
        } else {
            visible
        };
        let recolored = match shown.split_once(' ') {
            Some((word, rest)) => format!("{} {}", color.paint(word), rest),
            None => color.paint(shown.as_str()).to_string(),
        };
        let padding = " ".repeat(op_w.saturating_sub(shown.width()));

        println!(
            "{:>id_w$}: {:<date_w$} | {}{} => {}",
            id,
            date,
            recolored,
            padding,
            message,
            id_w = id_w,
            date_w = date_w
        );
    }

    Ok(())
}
