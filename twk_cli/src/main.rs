//! This binary turns a waste collection schedule file into Todoist reminder
//! tasks: one task per reminder date, confirmed interactively before creation.

use std::{env, path::PathBuf};

use anyhow::{anyhow, bail, Result};
use chrono::Local;
use clap::{Parser, ValueEnum};
use dialoguer::{theme::ColorfulTheme, Confirm, FuzzySelect};
use dotenv::dotenv;
use log::LevelFilter;
use owo_colors::OwoColorize;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use twk_core::{
    schedule::{self, ParsedSchedule, ScheduleFormat, WasteTypeBitmask},
    todoist::{self, Project, TodoistClient},
};

static TOKEN_VAR: &str = "TODOIST_API_KEY";

#[derive(Debug, Parser)]
#[command(name = "tonnenwecker")]
pub struct Arguments {
    /// the schedule file (.csv or .ics)
    pub schedule: PathBuf,
    /// override the format detection
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,
    /// print the grouped tasks and stop, creating nothing
    #[arg(long)]
    pub dry_run: bool,
    /// exclude organic waste collection dates
    #[arg(long)]
    pub exclude_organic: bool,
    /// exclude residual waste collection dates
    #[arg(long)]
    pub exclude_residual: bool,
    /// exclude paper waste collection dates
    #[arg(long)]
    pub exclude_paper: bool,
    /// exclude recyclable waste collection dates
    #[arg(long)]
    pub exclude_recyclable: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FormatArg {
    Csv,
    Ics,
}

impl From<FormatArg> for ScheduleFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Csv => ScheduleFormat::Csv,
            FormatArg::Ics => ScheduleFormat::Ical,
        }
    }
}

impl From<&Arguments> for WasteTypeBitmask {
    fn from(value: &Arguments) -> Self {
        let mut waste_type_bitmask = WasteTypeBitmask::none();
        if value.exclude_organic {
            waste_type_bitmask |= WasteTypeBitmask::Organic;
        }
        if value.exclude_residual {
            waste_type_bitmask |= WasteTypeBitmask::Residual;
        }
        if value.exclude_paper {
            waste_type_bitmask |= WasteTypeBitmask::Paper;
        }
        if value.exclude_recyclable {
            waste_type_bitmask |= WasteTypeBitmask::Recyclable;
        }
        waste_type_bitmask
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    TermLogger::init(
        LevelFilter::Info,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )?;
    let args = Arguments::parse();
    let token =
        env::var(TOKEN_VAR).map_err(|_| anyhow!("{TOKEN_VAR} environment variable missing"))?;

    let format = match args.format {
        Some(format) => ScheduleFormat::from(format),
        None => ScheduleFormat::from_path(&args.schedule).ok_or_else(|| {
            anyhow!(
                "cannot determine the schedule format of '{}', use --format",
                args.schedule.display()
            )
        })?,
    };
    let today = Local::now().date_naive();
    let ParsedSchedule {
        mut events,
        skipped_labels,
        past_dates,
    } = format.parse(&args.schedule, today)?;

    for event in &events {
        let (r, g, b) = event.bin.color;
        println!(
            "{} {}",
            event.bin.label.truecolor(r, g, b).bold(),
            event.remind_date
        );
    }
    if !skipped_labels.is_empty() {
        let labels = skipped_labels
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" & ");
        println!("{}", format!("skipped bin types: {labels}").dimmed());
    }
    if past_dates > 0 {
        println!(
            "{}",
            format!("ignored {past_dates} past collection dates").dimmed()
        );
    }

    let excluded = WasteTypeBitmask::from(&args);
    events.retain(|event| !excluded.contains(event.bin.kind));
    if events.is_empty() {
        bail!("no valid future events found, maybe all events are in the past?");
    }
    println!("--- parsed {} events ---", events.len());

    let grouped = schedule::group_by_remind_date(&events);
    println!("tasks to be created:");
    for (remind_date, bins) in &grouped {
        println!("  {remind_date}: {}", bins.join(" && "));
    }
    if args.dry_run {
        println!("dry run, no tasks created");
        return Ok(());
    }

    let client = TodoistClient::new(token);
    let projects = client.projects().await?;
    println!("fetched {} projects", projects.len());
    if projects.is_empty() {
        bail!("no projects available in this account");
    }
    let Some(project) = pick_project(&projects)? else {
        println!("no project selected");
        return Ok(());
    };

    let confirmed = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(format!(
            "Creating {} task(s) in project \"{}\". Confirm?",
            grouped.len(),
            project.name
        ))
        .default(false)
        .interact()?;
    if !confirmed {
        bail!("creation of tasks canceled");
    }

    let created = todoist::create_all(&client, &grouped, &project.id).await;
    println!("Summary: {created} task(s) created");
    Ok(())
}

/// Let the operator pick a project; `None` means the selection was aborted.
fn pick_project(projects: &[Project]) -> Result<Option<&Project>> {
    let names: Vec<&str> = projects.iter().map(|project| project.name.as_str()).collect();
    let selection = FuzzySelect::with_theme(&ColorfulTheme::default())
        .with_prompt("Pick a project")
        .default(0)
        .items(&names)
        .interact_opt()?;
    Ok(selection.map(|index| &projects[index]))
}
