use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{Datelike, Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};

use cyclecal::config::Config;
use cyclecal::models::{FlowLevel, NewPeriod, NewSymptom, ProfileUpdate, Severity};
use cyclecal::storage::{data_file_path, EncryptedRepository};
use cyclecal::{logging, DayMark, Session, Tracker};

#[derive(Parser)]
#[command(name = "cyclecal", version, about = "Private cycle tracker")]
struct Cli {
    /// Config file (defaults to the platform config dir).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Account email; the user id is derived from it.
    #[arg(long, global = true, env = "CYCLECAL_EMAIL", default_value = "me@localhost")]
    email: String,

    #[arg(long, global = true, env = "CYCLECAL_PASSPHRASE", hide_env_values = true)]
    passphrase: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum FlowArg {
    Light,
    Medium,
    Heavy,
}

impl From<FlowArg> for FlowLevel {
    fn from(f: FlowArg) -> Self {
        match f {
            FlowArg::Light => FlowLevel::Light,
            FlowArg::Medium => FlowLevel::Medium,
            FlowArg::Heavy => FlowLevel::Heavy,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SeverityArg {
    Mild,
    Moderate,
    Severe,
}

impl From<SeverityArg> for Severity {
    fn from(s: SeverityArg) -> Self {
        match s {
            SeverityArg::Mild => Severity::Mild,
            SeverityArg::Moderate => Severity::Moderate,
            SeverityArg::Severe => Severity::Severe,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Create an empty vault.
    Init,
    LogPeriod {
        #[arg(long, value_parser = parse_date)]
        start: NaiveDate,
        #[arg(long, value_parser = parse_date)]
        end: Option<NaiveDate>,
        #[arg(long, value_enum)]
        flow: Option<FlowArg>,
        #[arg(long)]
        intensity: Option<String>,
    },
    LogSymptom {
        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,
        #[arg(long = "type")]
        symptom_type: String,
        #[arg(long, value_enum, default_value = "moderate")]
        severity: SeverityArg,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Set cycle length preference or last period start.
    Profile {
        #[arg(long)]
        cycle_length: Option<i64>,
        #[arg(long, value_parser = parse_date)]
        last_period_start: Option<NaiveDate>,
    },
    /// Current phase, next period and fertility window.
    Status {
        #[arg(long, value_parser = parse_date)]
        today: Option<NaiveDate>,
    },
    /// Annotated calendar for one month.
    Month {
        year: Option<i32>,
        month: Option<u32>,
        #[arg(long, value_parser = parse_date)]
        today: Option<NaiveDate>,
    },
    /// Show pregnancy progress, or turn pregnancy mode on with --due.
    Pregnancy {
        #[arg(long, value_parser = parse_date)]
        due: Option<NaiveDate>,
        #[arg(long, value_parser = parse_date)]
        today: Option<NaiveDate>,
    },
    /// Daily period/fertility levels around the latest period, as JSON.
    Chart,
    /// Print all vault data as JSON.
    Export,
    /// Delete the vault permanently.
    Wipe {
        #[arg(long)]
        yes: bool,
    },
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match cli.config.clone().or_else(Config::default_path) {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };
    logging::init(&config.log_filter);

    let path = data_file_path(config.data_dir.as_deref())?;
    let repo = EncryptedRepository::new(path);
    let session = Session::for_email(&cli.email);
    let passphrase = || cli.passphrase.clone().context("passphrase required (--passphrase or CYCLECAL_PASSPHRASE)");

    if let Command::Init = cli.command {
        repo.create(&passphrase()?)?;
        println!("created {}", repo.path().display());
        return Ok(());
    }
    if let Command::Wipe { yes } = cli.command {
        if !yes {
            bail!("refusing to wipe without --yes");
        }
        repo.wipe()?;
        println!("wiped {}", repo.path().display());
        return Ok(());
    }

    if !repo.exists() {
        bail!("no vault at {}; run `cyclecal init` first", repo.path().display());
    }
    repo.unlock(&passphrase()?).context("unlock failed")?;
    let tracker = Tracker::new(repo).with_chart_window(config.chart_window_days);
    let today = Local::now().date_naive();

    match cli.command {
        Command::Init | Command::Wipe { .. } => unreachable!("handled before unlock"),
        Command::LogPeriod {
            start,
            end,
            flow,
            intensity,
        } => {
            let rec = tracker.log_period(
                &session,
                NewPeriod {
                    start_date: start,
                    end_date: end,
                    flow_level: flow.map(FlowLevel::from),
                    flow_intensity: intensity,
                },
            )?;
            println!("logged period starting {}", rec.start_date);
        }
        Command::LogSymptom {
            date,
            symptom_type,
            severity,
            notes,
        } => {
            let rec = tracker.log_symptom(
                &session,
                NewSymptom {
                    date,
                    symptom_type,
                    severity: severity.into(),
                    notes,
                },
            )?;
            println!("logged {} on {}", rec.symptom_type, rec.date);
        }
        Command::Profile {
            cycle_length,
            last_period_start,
        } => {
            let profile = tracker.update_profile(
                &session,
                ProfileUpdate {
                    average_cycle_length: cycle_length,
                    last_period_start,
                },
            )?;
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
        Command::Status { today: at } => match tracker.overview(&session, at.unwrap_or(today))? {
            Some(ov) => {
                let ins = &ov.insights;
                println!("{}: {}", ov.phase.phase.title(), ov.phase.description);
                println!(
                    "cycle length {} days ({} recorded periods)",
                    ins.average_cycle_length, ins.recorded_periods
                );
                println!(
                    "next period {} (in {} days), cycle {}% through",
                    ins.next_period, ov.days_until_next_period, ov.cycle_progress
                );
                println!(
                    "fertile {} to {}, ovulation {}",
                    ins.fertility.fertility_start,
                    ins.fertility.fertility_end,
                    ins.fertility.ovulation_date
                );
            }
            None => println!("log your period to get predictions"),
        },
        Command::Month {
            year,
            month,
            today: at,
        } => {
            let at = at.unwrap_or(today);
            let data = tracker.month(
                &session,
                year.unwrap_or(at.year()),
                month.unwrap_or(at.month()),
                at,
            )?;
            println!("{}-{:02}", data.view.year, data.view.month);
            println!(" Su  Mo  Tu  We  Th  Fr  Sa");
            for week in data.view.weeks() {
                let row: Vec<String> = week
                    .iter()
                    .map(|c| {
                        let sym = match c.mark {
                            DayMark::Period => 'P',
                            DayMark::Ovulation => 'O',
                            DayMark::Fertile => 'F',
                            DayMark::PredictedNext => 'N',
                            DayMark::None if c.is_today => '*',
                            DayMark::None => ' ',
                        };
                        if c.in_month {
                            format!("{:>2}{}", c.date.day(), sym)
                        } else {
                            format!(" .{sym}")
                        }
                    })
                    .collect();
                println!("{}", row.join(" "));
            }
            for s in &data.symptoms {
                println!("{} {} ({:?})", s.date, s.symptom_type, s.severity);
            }
        }
        Command::Pregnancy { due, today: at } => {
            let at = at.unwrap_or(today);
            let status = match due {
                Some(due) => Some(tracker.activate_pregnancy(&session, due, at)?),
                None => tracker.pregnancy_status(&session, at)?,
            };
            match status {
                Some(st) => {
                    println!("week {} of 40 ({}%), due {}", st.current_week, st.progress, st.due_date);
                    if st.weeks_remaining == 0 {
                        println!("your baby is due any day now");
                    } else {
                        println!("{} weeks to go", st.weeks_remaining);
                    }
                    let m = st.next_milestone;
                    println!("next milestone, week {}: {}. {}", m.week, m.title, m.description);
                }
                None => println!("pregnancy mode is off; pass --due YYYY-MM-DD to turn it on"),
            }
        }
        Command::Chart => match tracker.chart(&session)? {
            Some(series) => println!("{}", serde_json::to_string_pretty(&series)?),
            None => println!("log your period to see the chart"),
        },
        Command::Export => println!("{}", tracker.repo().export()?),
    }

    tracker.repo().lock();
    Ok(())
}
