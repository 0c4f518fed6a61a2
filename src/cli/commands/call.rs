use crate::cli::commands::{login, open_pool, page_offset, print_json};
use crate::cli::parser::{CallCmd, CallFields, Cli};
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::ledger::CallLedger;
use crate::ledger::search::SearchFilters;
use crate::models::call::{Associations, Call, CallDetail};
use crate::ui::messages::{field, header, info, success};
use crate::utils::table::{Column, Table};
use crate::utils::time::{format_optional_wall, format_wall, parse_wall};
use chrono::{Datelike, Local, NaiveDateTime};

const LABEL_W: usize = 14;
const NARRATIVE_W: usize = 72;

pub fn handle(cmd: &CallCmd, cli: &Cli, cfg: &Config) -> AppResult<()> {
    let mut pool = open_pool(cfg)?;

    match cmd {
        CallCmd::Add { fields } => {
            let session = login(cli, cfg, &pool.conn)?;
            let (call, assoc) = new_call(fields)?;
            let saved = session.create_call(&mut pool.conn, &call, &assoc)?;

            if cli.json {
                return print_json(&saved);
            }
            success(format!(
                "Call {} saved (id {})",
                saved.incident_number, saved.id
            ));
        }

        CallCmd::Edit {
            id,
            fields,
            clear_associations,
        } => {
            let session = login(cli, cfg, &pool.conn)?;
            let detail = CallLedger::get_call_by_id(&pool.conn, *id)?;
            let (call, assoc) = edited_call(detail, fields, *clear_associations)?;
            session.update_call(&mut pool.conn, &call, &assoc)?;
            success(format!("Call {} updated", call.incident_number));
        }

        CallCmd::Show { id } => {
            let detail = CallLedger::get_call_by_id(&pool.conn, *id)?;
            if cli.json {
                return print_json(&detail);
            }
            print_detail(&detail);
        }

        CallCmd::List { year, limit, page } => {
            let calls = match year {
                Some(y) => CallLedger::calls_by_year(&pool.conn, *y)?,
                None => {
                    let limit = limit.unwrap_or(cfg.default_page_size);
                    CallLedger::recent_calls(&pool.conn, limit, page_offset(*page, limit)?)?
                }
            };
            print_calls(&calls, cli.json)?;
        }

        CallCmd::Search {
            from,
            to,
            call_type,
            town,
            text,
            filters,
            limit,
            page,
        } => {
            let mut pairs: Vec<(String, String)> = Vec::new();
            for raw in filters {
                let (k, v) = raw.split_once('=').ok_or_else(|| {
                    AppError::InvalidFilter(format!("'{}' is not KEY=VALUE", raw))
                })?;
                pairs.push((k.trim().to_string(), v.to_string()));
            }
            let named = [
                ("start_date", from),
                ("end_date", to),
                ("call_type", call_type),
                ("town", town),
                ("search_text", text),
            ];
            for (k, v) in named {
                if let Some(v) = v {
                    pairs.push((k.to_string(), v.clone()));
                }
            }

            let filters = SearchFilters::from_pairs(pairs)?;
            let limit = limit.unwrap_or(cfg.default_page_size);
            let offset = page_offset(*page, limit)?;
            let calls = CallLedger::search(&pool.conn, &filters, limit, offset)?;
            print_calls(&calls, cli.json)?;
        }

        CallCmd::Years => {
            let years = CallLedger::call_years(&pool.conn)?;
            if cli.json {
                return print_json(&years);
            }
            if years.is_empty() {
                info("No calls recorded yet");
            }
            for y in years {
                println!("{}", y);
            }
        }

        CallCmd::NextNumber { year } => {
            let year = year.unwrap_or_else(|| Local::now().year());
            let number = CallLedger::next_incident_number(&pool.conn, year)?;
            if cli.json {
                return print_json(&number);
            }
            println!("{}", number);
        }

        CallCmd::Delete { id } => {
            let session = login(cli, cfg, &pool.conn)?;
            session.delete_call(&mut pool.conn, *id)?;
            success(format!("Call {} cleared of apparatus and responders", id));
        }
    }

    Ok(())
}

fn required(value: &Option<String>, flag: &str) -> AppResult<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(AppError::InvalidInput(format!("--{} is required", flag))),
    }
}

fn wall(raw: &str) -> AppResult<NaiveDateTime> {
    parse_wall(raw).ok_or_else(|| AppError::InvalidDate(raw.to_string()))
}

/// Optional timestamp flag: absent means "unchanged", empty means "unset".
fn optional_wall(raw: &Option<String>) -> AppResult<Option<Option<NaiveDateTime>>> {
    match raw.as_deref().map(str::trim) {
        None => Ok(None),
        Some("") => Ok(Some(None)),
        Some(v) => Ok(Some(Some(wall(v)?))),
    }
}

/// `ID` or `ID:ROLE`.
fn parse_responders(raw: &[String]) -> AppResult<Vec<(i64, String)>> {
    raw.iter()
        .map(|r| {
            let (id, role) = r.split_once(':').unwrap_or((r.as_str(), ""));
            let id = id
                .trim()
                .parse::<i64>()
                .map_err(|_| AppError::InvalidInput(format!("bad responder '{}'", r)))?;
            Ok((id, role.trim().to_string()))
        })
        .collect()
}

fn new_call(f: &CallFields) -> AppResult<(Call, Associations)> {
    let call = Call {
        incident_number: f.incident_number.clone().unwrap_or_default(),
        call_type: required(&f.call_type, "type")?,
        mutual_aid: f.mutual_aid.clone().unwrap_or_else(|| "No".to_string()),
        address: required(&f.address, "address")?,
        town: f.town.clone().unwrap_or_default(),
        location_notes: f.location_notes.clone().unwrap_or_default(),
        dispatched: wall(&required(&f.dispatched, "dispatched")?)?,
        enroute: optional_wall(&f.enroute)?.flatten(),
        on_scene: optional_wall(&f.on_scene)?.flatten(),
        clear: optional_wall(&f.clear)?.flatten(),
        narrative: f.narrative.clone().unwrap_or_default(),
        ..Call::default()
    };

    let assoc = Associations::new(f.apparatus.clone(), parse_responders(&f.responders)?);
    Ok((call, assoc))
}

/// Overlay the given flags on a stored call. The association sets sent back
/// are complete: the stored ones unless replaced by flags.
fn edited_call(
    detail: CallDetail,
    f: &CallFields,
    clear_associations: bool,
) -> AppResult<(Call, Associations)> {
    let mut call = detail.call;

    if let Some(v) = &f.incident_number {
        call.incident_number = v.clone();
    }
    if f.call_type.is_some() {
        call.call_type = required(&f.call_type, "type")?;
    }
    if f.address.is_some() {
        call.address = required(&f.address, "address")?;
    }
    if let Some(v) = &f.town {
        call.town = v.clone();
    }
    if let Some(v) = &f.mutual_aid {
        call.mutual_aid = v.clone();
    }
    if let Some(v) = &f.location_notes {
        call.location_notes = v.clone();
    }
    if let Some(v) = &f.narrative {
        call.narrative = v.clone();
    }
    if let Some(v) = &f.dispatched {
        call.dispatched = wall(v)?;
    }
    if let Some(v) = optional_wall(&f.enroute)? {
        call.enroute = v;
    }
    if let Some(v) = optional_wall(&f.on_scene)? {
        call.on_scene = v;
    }
    if let Some(v) = optional_wall(&f.clear)? {
        call.clear = v;
    }

    let mut assoc = if clear_associations {
        Associations::default()
    } else {
        Associations::new(
            detail.apparatus.iter().map(|a| a.id).collect(),
            detail
                .responders
                .iter()
                .map(|r| (r.user.id, r.role.clone()))
                .collect(),
        )
    };
    if !f.apparatus.is_empty() {
        assoc.apparatus_ids = f.apparatus.clone();
    }
    if !f.responders.is_empty() {
        assoc.responders = parse_responders(&f.responders)?;
    }

    Ok((call, assoc))
}

fn print_calls(calls: &[Call], json: bool) -> AppResult<()> {
    if json {
        return print_json(calls);
    }
    if calls.is_empty() {
        info("No calls found");
        return Ok(());
    }

    let mut table = Table::new(vec![
        Column::new("ID", 6),
        Column::new("Incident", 10),
        Column::new("Dispatched", 16),
        Column::new("Type", 24),
        Column::new("Town", 16),
        Column::new("Address", 32),
    ]);
    for c in calls {
        table.add_row(vec![
            c.id.to_string(),
            c.incident_number.clone(),
            format_wall(&c.dispatched),
            c.call_type.clone(),
            c.town.clone(),
            c.address.clone(),
        ]);
    }
    print!("{}", table.render());
    Ok(())
}

fn print_detail(d: &CallDetail) {
    let c = &d.call;
    header(format!("Call {} (id {})", c.incident_number, c.id));

    field("Type", &c.call_type, LABEL_W);
    field("Mutual aid", &c.mutual_aid, LABEL_W);
    field("Address", &c.address, LABEL_W);
    field("Town", &c.town, LABEL_W);
    if !c.location_notes.is_empty() {
        field("Location", &c.location_notes, LABEL_W);
    }
    field("Dispatched", format_wall(&c.dispatched), LABEL_W);
    field("Enroute", format_optional_wall(c.enroute.as_ref()), LABEL_W);
    field("On scene", format_optional_wall(c.on_scene.as_ref()), LABEL_W);
    field("Clear", format_optional_wall(c.clear.as_ref()), LABEL_W);
    field("Created by", c.created_by, LABEL_W);
    field("Created at", c.created_at.format("%Y-%m-%d %H:%M:%S UTC"), LABEL_W);

    let apparatus: Vec<&str> = d.apparatus.iter().map(|a| a.value.as_str()).collect();
    field(
        "Apparatus",
        if apparatus.is_empty() { "--".to_string() } else { apparatus.join(", ") },
        LABEL_W,
    );

    if d.responders.is_empty() {
        field("Responders", "--", LABEL_W);
    } else {
        field("Responders", d.responders.len(), LABEL_W);
        for r in &d.responders {
            let role = if r.role.is_empty() { "--" } else { r.role.as_str() };
            println!("  - {} ({})", r.user.full_name(), role);
        }
    }

    println!("\nNarrative:");
    for line in textwrap::wrap(&c.narrative, NARRATIVE_W) {
        println!("  {}", line);
    }
}
