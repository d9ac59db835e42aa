//! Line-oriented terminal front end: command parsing, prompts and the
//! lead table.

use shared_types::{Credentials, Lead, LeadSource, LeadStatus, UserProfile};
use std::fmt::Write as _;
use std::io::{self, BufRead, Write};
use std::str::FromStr;

use crate::dashboard::DashboardSnapshot;
use crate::display::{
    format_lead_value, format_location, has_next, has_prev, page_numbers, results_summary,
    score_badge, show_pagination, source_label, status_badge, BadgeColor, SCORE_RANGE_OPTIONS,
    VALUE_RANGE_OPTIONS,
};
use crate::forms::LeadForm;
use crate::query::{RangeFilter, VALUE_RANGE_CEILING};

const RESET: &str = "\x1b[0m";

pub const HELP: &str = "\
Commands:
  login | register | logout | whoami | users
  rename <name>            change your display name
  list                     reload the current page
  show <id>                lead details
  page <n> | next | prev   move between pages
  limit <n>                rows per page
  search <text>            filter by email (no text clears)
  status <value|any>       new, contacted, qualified, lost, won
  source <value|any>       website, facebook_ads, google_ads, referral, events, other
  score <range|any>        80-100, 60-79, 40-59, 0-39 or e.g. 90+
  value <range|any>        10000+, 5000-9999, 1000-4999, 0-999
  clear                    remove all filters
  new | edit <id>          open the lead form
  delete <id>              delete after confirmation
  dismiss                  hide the error banner
  help | quit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Login,
    Register,
    Logout,
    Whoami,
    Rename(String),
    Users,
    List,
    Show(i64),
    Page(u32),
    Next,
    Prev,
    Limit(u32),
    Search(String),
    Status(Option<LeadStatus>),
    Source(Option<LeadSource>),
    Score(String),
    Value(String),
    Clear,
    New,
    Edit(i64),
    Delete(i64),
    Dismiss,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Unknown command '{0}', type 'help' for a list")]
    Unknown(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
    #[error("Invalid {field} '{value}'")]
    InvalidValue { field: &'static str, value: String },
}

fn number<T: FromStr>(arg: &str, usage: &'static str) -> Result<T, CommandError> {
    arg.parse().map_err(|_| CommandError::Usage(usage))
}

fn is_any(arg: &str) -> bool {
    arg.is_empty() || arg.eq_ignore_ascii_case("any") || arg.eq_ignore_ascii_case("all")
}

fn choice<T: FromStr>(arg: &str, field: &'static str) -> Result<Option<T>, CommandError> {
    if is_any(arg) {
        return Ok(None);
    }
    T::from_str(&arg.to_lowercase())
        .map(Some)
        .map_err(|_| CommandError::InvalidValue {
            field,
            value: arg.to_string(),
        })
}

fn range_code(arg: &str, field: &'static str) -> Result<String, CommandError> {
    if is_any(arg) {
        return Ok(String::new());
    }
    match RangeFilter::parse(arg, None) {
        Some(_) => Ok(arg.to_string()),
        None => Err(CommandError::InvalidValue {
            field,
            value: arg.to_string(),
        }),
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (name, arg) = match line.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (line, ""),
        };

        let command = match name.to_lowercase().as_str() {
            "login" => Command::Login,
            "register" | "signup" => Command::Register,
            "logout" => Command::Logout,
            "whoami" | "me" => Command::Whoami,
            "rename" if arg.is_empty() => return Err(CommandError::Usage("rename <name>")),
            "rename" => Command::Rename(arg.to_string()),
            "users" => Command::Users,
            "list" | "ls" | "refresh" => Command::List,
            "show" => Command::Show(number(arg, "show <id>")?),
            "page" => Command::Page(number(arg, "page <n>")?),
            "next" | "n" => Command::Next,
            "prev" | "p" => Command::Prev,
            "limit" => Command::Limit(number(arg, "limit <n>")?),
            "search" => Command::Search(arg.to_string()),
            "status" => Command::Status(choice(arg, "status")?),
            "source" => Command::Source(choice(arg, "source")?),
            "score" => Command::Score(range_code(arg, "score range")?),
            "value" => Command::Value(range_code(arg, "value range")?),
            "clear" => Command::Clear,
            "new" | "add" => Command::New,
            "edit" => Command::Edit(number(arg, "edit <id>")?),
            "delete" | "rm" => Command::Delete(number(arg, "delete <id>")?),
            "dismiss" => Command::Dismiss,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

/// Prints `label` and reads one line, without the trailing newline.
/// End of input reads as an empty answer.
pub fn ask<R, W>(input: &mut R, output: &mut W, label: &str) -> io::Result<String>
where
    R: BufRead,
    W: Write,
{
    write!(output, "{}", label)?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Like [`ask`], but an empty answer keeps `current`
fn ask_or_keep<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    label: &str,
    current: &str,
) -> io::Result<String> {
    let prompt = if current.is_empty() {
        format!("{}: ", label)
    } else {
        format!("{} [{}]: ", label, current)
    };
    let answer = ask(input, output, &prompt)?;
    Ok(if answer.trim().is_empty() {
        current.to_string()
    } else {
        answer.trim().to_string()
    })
}

pub fn confirm<R: BufRead, W: Write>(input: &mut R, output: &mut W, prompt: &str) -> bool {
    match ask(input, output, &format!("{} [y/N] ", prompt)) {
        Ok(answer) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
        Err(e) => {
            tracing::warn!("Could not read confirmation: {}", e);
            false
        }
    }
}

pub fn prompt_credentials<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
) -> io::Result<Credentials> {
    let email = ask(input, output, "Email: ")?;
    let password = ask(input, output, "Password: ")?;
    Ok(Credentials::new(email.trim(), password))
}

/// Walks through every lead field. Empty answers keep the value already in
/// `form`; `-` clears an optional field.
pub fn prompt_lead_form<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    form: &LeadForm,
) -> io::Result<LeadForm> {
    let mut next = form.clone();

    next.first_name = ask_or_keep(input, output, "First name", &form.first_name)?;
    next.last_name = ask_or_keep(input, output, "Last name", &form.last_name)?;
    next.email = ask_or_keep(input, output, "Email", &form.email)?;

    for (label, field) in [
        ("Phone", &mut next.phone),
        ("Company", &mut next.company),
        ("City", &mut next.city),
        ("State", &mut next.state),
        ("Score (0-100)", &mut next.score),
        ("Lead value", &mut next.lead_value),
    ] {
        let answer = ask_or_keep(input, output, label, field)?;
        *field = if answer == "-" { String::new() } else { answer };
    }

    let current_source = form.source.map(|s| s.to_string()).unwrap_or_default();
    loop {
        let answer = ask_or_keep(input, output, "Source", &current_source)?;
        if answer == "-" || answer.is_empty() {
            next.source = None;
            break;
        }
        match LeadSource::from_str(&answer.to_lowercase()) {
            Ok(source) => {
                next.source = Some(source);
                break;
            }
            Err(_) => writeln!(
                output,
                "  one of: website, facebook_ads, google_ads, referral, events, other"
            )?,
        }
    }

    let current_status = form.status.to_string();
    loop {
        let answer = ask_or_keep(input, output, "Status", &current_status)?;
        match LeadStatus::from_str(&answer.to_lowercase()) {
            Ok(status) => {
                next.status = status;
                break;
            }
            Err(_) => writeln!(output, "  one of: new, contacted, qualified, lost, won")?,
        }
    }

    Ok(next)
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('~');
    cut
}

fn paint(text: &str, color: Option<BadgeColor>, ansi: bool) -> String {
    match color {
        Some(color) if ansi => format!("{}{}{}", color.ansi(), text, RESET),
        _ => text.to_string(),
    }
}

/// Pads before colouring so escapes do not throw off the column widths
fn cell(text: &str, width: usize, color: Option<BadgeColor>, ansi: bool) -> String {
    let padded = format!("{:<width$}", truncate(text, width), width = width);
    paint(&padded, color, ansi)
}

const COLUMNS: [(&str, usize); 9] = [
    ("ID", 6),
    ("NAME", 22),
    ("EMAIL", 28),
    ("COMPANY", 18),
    ("LOCATION", 18),
    ("STATUS", 10),
    ("SOURCE", 13),
    ("SCORE", 5),
    ("VALUE", 12),
];

fn lead_row(lead: &Lead, ansi: bool) -> String {
    let (status, status_color) = status_badge(&lead.status);
    let source = lead
        .source
        .as_deref()
        .map(source_label)
        .unwrap_or_else(|| "-".to_string());
    let (score, score_color) = match score_badge(lead.score) {
        Some((text, color)) => (text, Some(color)),
        None => ("-".to_string(), None),
    };

    let cells = [
        cell(&lead.id.to_string(), COLUMNS[0].1, None, ansi),
        cell(&lead.full_name(), COLUMNS[1].1, None, ansi),
        cell(&lead.email, COLUMNS[2].1, None, ansi),
        cell(lead.company.as_deref().unwrap_or("-"), COLUMNS[3].1, None, ansi),
        cell(
            &format_location(lead.city.as_deref(), lead.state.as_deref()),
            COLUMNS[4].1,
            None,
            ansi,
        ),
        cell(&status, COLUMNS[5].1, Some(status_color), ansi),
        cell(&source, COLUMNS[6].1, None, ansi),
        cell(&score, COLUMNS[7].1, score_color, ansi),
        cell(&format_lead_value(lead.lead_value), COLUMNS[8].1, None, ansi),
    ];
    cells.join(" ").trim_end().to_string()
}

fn filter_summary(snapshot: &DashboardSnapshot) -> Option<String> {
    let filters = &snapshot.filters;
    if filters.is_empty() {
        return None;
    }

    let mut parts = Vec::new();
    if !filters.search.trim().is_empty() {
        parts.push(format!("email contains \"{}\"", filters.search.trim()));
    }
    if let Some(status) = filters.status {
        parts.push(format!("status {}", status.label()));
    }
    if let Some(source) = filters.source {
        parts.push(format!("source {}", source.label()));
    }
    if let Some(range) = RangeFilter::parse(&filters.score_range, None) {
        let label = SCORE_RANGE_OPTIONS
            .iter()
            .find(|o| o.value == filters.score_range)
            .map(|o| o.label.to_string())
            .unwrap_or_else(|| range.describe());
        parts.push(format!("score {}", label));
    }
    if let Some(range) = RangeFilter::parse(&filters.value_range, Some(VALUE_RANGE_CEILING)) {
        let label = VALUE_RANGE_OPTIONS
            .iter()
            .find(|o| o.value == filters.value_range)
            .map(|o| o.label.to_string())
            .unwrap_or_else(|| range.describe());
        parts.push(format!("value {}", label));
    }

    Some(format!(
        "Filters ({}): {}",
        filters.active_count(),
        parts.join(", ")
    ))
}

/// Banners, the lead table and the pagination footer
pub fn render_dashboard(snapshot: &DashboardSnapshot, ansi: bool) -> String {
    let mut out = String::new();

    if let Some(error) = &snapshot.error {
        let _ = writeln!(
            out,
            "{}",
            paint(&format!("Error: {}", error), Some(BadgeColor::Red), ansi)
        );
    }
    if let Some(message) = &snapshot.success_message {
        let _ = writeln!(out, "{}", paint(message, Some(BadgeColor::Green), ansi));
    }

    if snapshot.show_loading_screen() {
        out.push_str("Loading...\n");
        return out;
    }

    if let Some(summary) = filter_summary(snapshot) {
        let _ = writeln!(out, "{}", summary);
    }

    let header: Vec<String> = COLUMNS
        .iter()
        .map(|(name, width)| format!("{:<width$}", name, width = width))
        .collect();
    let _ = writeln!(out, "{}", header.join(" ").trim_end());

    if snapshot.leads.is_empty() {
        out.push_str("No leads found\n");
    }
    for lead in &snapshot.leads {
        let _ = writeln!(out, "{}", lead_row(lead, ansi));
    }

    let pagination = &snapshot.pagination;
    if show_pagination(pagination) {
        let pages: Vec<String> = page_numbers(pagination)
            .into_iter()
            .map(|n| {
                if n == pagination.page {
                    format!("[{}]", n)
                } else {
                    n.to_string()
                }
            })
            .collect();
        let _ = writeln!(
            out,
            "{}  {} {} {}  (page {} of {})",
            results_summary(pagination),
            if has_prev(pagination) { "<" } else { " " },
            pages.join(" "),
            if has_next(pagination) { ">" } else { " " },
            pagination.page,
            pagination.total_pages
        );
    } else {
        let _ = writeln!(out, "{}", results_summary(pagination));
    }

    if let Some(error) = snapshot.editor.error() {
        let _ = writeln!(out, "Form error: {}", error);
    }

    out
}

pub fn render_lead(lead: &Lead) -> String {
    let (status, _) = status_badge(&lead.status);
    let rows = [
        ("Name", lead.full_name()),
        ("Email", lead.email.clone()),
        ("Phone", lead.phone.clone().unwrap_or_else(|| "-".to_string())),
        ("Company", lead.company.clone().unwrap_or_else(|| "-".to_string())),
        (
            "Location",
            format_location(lead.city.as_deref(), lead.state.as_deref()),
        ),
        ("Status", status),
        (
            "Source",
            lead.source
                .as_deref()
                .map(source_label)
                .unwrap_or_else(|| "-".to_string()),
        ),
        (
            "Score",
            lead.score.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string()),
        ),
        ("Value", format_lead_value(lead.lead_value)),
    ];

    let mut out = format!("Lead #{}\n", lead.id);
    for (label, value) in rows {
        let _ = writeln!(out, "  {:<9} {}", label, value);
    }
    out
}

pub fn render_user(user: &UserProfile) -> String {
    let name = user.name.as_deref().unwrap_or("-");
    let email = user.email.as_deref().unwrap_or("-");
    match user.id {
        Some(id) => format!("#{} {} <{}>", id, name, email),
        None => format!("{} <{}>", name, email),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::lead;
    use crate::dashboard::LeadEditor;
    use shared_types::{FilterState, Pagination};
    use std::io::Cursor;

    fn snapshot(leads: Vec<Lead>, pagination: Pagination) -> DashboardSnapshot {
        DashboardSnapshot {
            leads,
            pagination,
            filters: FilterState::default(),
            loading: false,
            error: None,
            success_message: None,
            editor: LeadEditor::Closed,
        }
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!("page 3".parse::<Command>(), Ok(Command::Page(3)));
        assert_eq!("  DELETE 12 ".parse::<Command>(), Ok(Command::Delete(12)));
        assert_eq!(
            "search acme.io".parse::<Command>(),
            Ok(Command::Search("acme.io".to_string()))
        );
        assert_eq!("search".parse::<Command>(), Ok(Command::Search(String::new())));
        assert_eq!(
            "status Qualified".parse::<Command>(),
            Ok(Command::Status(Some(LeadStatus::Qualified)))
        );
        assert_eq!("source any".parse::<Command>(), Ok(Command::Source(None)));
        assert_eq!(
            "source google_ads".parse::<Command>(),
            Ok(Command::Source(Some(LeadSource::GoogleAds)))
        );
        assert_eq!(
            "value 10000+".parse::<Command>(),
            Ok(Command::Value("10000+".to_string()))
        );
        assert_eq!("score any".parse::<Command>(), Ok(Command::Score(String::new())));
        assert_eq!("exit".parse::<Command>(), Ok(Command::Quit));
        assert_eq!(
            "rename Ada Lovelace".parse::<Command>(),
            Ok(Command::Rename("Ada Lovelace".to_string()))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            "page two".parse::<Command>(),
            Err(CommandError::Usage("page <n>"))
        );
        assert_eq!(
            "frobnicate".parse::<Command>(),
            Err(CommandError::Unknown("frobnicate".to_string()))
        );
        assert_eq!(
            "rename".parse::<Command>(),
            Err(CommandError::Usage("rename <name>"))
        );
        assert!(matches!(
            "status pending".parse::<Command>(),
            Err(CommandError::InvalidValue { field: "status", .. })
        ));
        assert!(matches!(
            "score -50".parse::<Command>(),
            Err(CommandError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_confirm_reads_answer() {
        let mut output = Vec::new();
        assert!(confirm(&mut Cursor::new("y\n"), &mut output, "Sure?"));
        assert!(!confirm(&mut Cursor::new("\n"), &mut output, "Sure?"));
        assert!(!confirm(&mut Cursor::new(""), &mut output, "Sure?"));
        assert!(String::from_utf8(output).unwrap().starts_with("Sure? [y/N] "));
    }

    #[test]
    fn test_prompt_lead_form_keeps_and_clears() {
        let existing = LeadForm::from_lead(&Lead {
            company: Some("Acme".to_string()),
            score: Some(50),
            ..lead(3)
        });
        // first name changed, company cleared, source set, status kept
        let answers = "Alice\n\n\n\n-\n\n\n\n\nreferral\n\n";
        let mut output = Vec::new();

        let form = prompt_lead_form(&mut Cursor::new(answers), &mut output, &existing).unwrap();

        assert_eq!(form.first_name, "Alice");
        assert_eq!(form.last_name, "Last3");
        assert_eq!(form.company, "");
        assert_eq!(form.score, "50");
        assert_eq!(form.source, Some(LeadSource::Referral));
        assert_eq!(form.status, LeadStatus::New);
    }

    #[test]
    fn test_prompt_lead_form_reprompts_bad_status() {
        let answers = "Ada\nLovelace\nada@example.com\n\n\n\n\n\n\n\nhot\nwon\n";
        let mut output = Vec::new();

        let blank = LeadForm::default();
        let form = prompt_lead_form(&mut Cursor::new(answers), &mut output, &blank).unwrap();

        assert_eq!(form.status, LeadStatus::Won);
        assert_eq!(form.source, None);
        assert!(String::from_utf8(output)
            .unwrap()
            .contains("one of: new, contacted, qualified, lost, won"));
    }

    #[test]
    fn test_render_table() {
        let mut rich = lead(7);
        rich.city = Some("Austin".to_string());
        rich.state = Some("TX".to_string());
        rich.status = "won".to_string();
        rich.score = Some(91);
        rich.lead_value = Some(12345.0);

        let pagination = Pagination {
            page: 1,
            limit: 20,
            total: 43,
            total_pages: 3,
        };
        let out = render_dashboard(&snapshot(vec![rich], pagination), false);

        assert!(out.contains("First7 Last7"));
        assert!(out.contains("Austin, TX"));
        assert!(out.contains("Won"));
        assert!(out.contains("$12,345"));
        assert!(out.contains("Showing 1 to 20 of 43 results"));
        assert!(out.contains("[1] 2 3 >"));
        assert!(!out.contains('\x1b'));
    }

    #[test]
    fn test_render_banners_and_loading() {
        let mut loading = snapshot(Vec::new(), Pagination::default());
        loading.loading = true;
        loading.error = Some("Network error".to_string());
        let out = render_dashboard(&loading, false);
        assert!(out.contains("Error: Network error"));
        assert!(out.contains("Loading..."));

        let mut filtered = snapshot(Vec::new(), Pagination::default());
        filtered.filters.status = Some(LeadStatus::Lost);
        filtered.filters.value_range = "10000+".to_string();
        filtered.success_message = Some("Lead deleted successfully".to_string());
        let out = render_dashboard(&filtered, false);
        assert!(out.contains("Lead deleted successfully"));
        assert!(out.contains("Filters (2): status Lost, value $10,000+"));
        assert!(out.contains("No leads found"));
        assert!(out.contains("No results"));
    }

    #[test]
    fn test_render_lead_details() {
        let out = render_lead(&lead(4));
        assert!(out.starts_with("Lead #4\n"));
        assert!(out.contains("lead4@example.com"));
        assert!(out.contains("Status    New"));
    }
}
