use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod catalog;
mod config;
mod design;
mod ethics;
mod form;
mod ingest;
mod models;
mod progress;
mod report;
mod sheet;
mod stats;
mod store;

use config::Settings;
use design::BlueprintStyle;
use ethics::{Choice, EthicsAnswers, EthicsResult};
use progress::{ActivityResult, MissionChoice, ProgressTracker};
use sheet::{FileSheet, HttpSheet, LoadState};
use store::SqliteStore;

#[derive(Parser)]
#[command(name = "robot-mission")]
#[command(about = "Eco robot mission classroom activity and teacher dashboard", long_about = None)]
struct Cli {
    #[command(flatten)]
    settings: Settings,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List missions and robot parts
    Catalog,
    /// Choose an environmental mission
    Mission { id: String },
    /// Save or show the student's name and number
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        number: Option<String>,
    },
    /// Build the robot on the design canvas
    #[command(subcommand)]
    Design(DesignCommand),
    /// Print the paper-net bill of materials for the saved design
    Blueprint {
        #[arg(long, value_enum, default_value_t = BlueprintStyle::Color)]
        style: BlueprintStyle,
    },
    /// List the ethics scenarios
    Scenarios,
    /// Answer every ethics scenario in order, e.g. A,B,A,A,B,B
    Ethics {
        #[arg(value_delimiter = ',', required = true)]
        choices: Vec<Choice>,
        #[arg(long, default_value = "")]
        pledge: String,
    },
    /// Show learning progress
    Progress,
    /// Print everything saved so far as JSON
    Portfolio,
    /// Forget all saved progress
    Reset,
    /// Send the result to the class results sheet
    Submit {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        number: Option<String>,
    },
    /// Send one lesson's result, e.g. --activity 1차시 --score 80
    SubmitActivity {
        #[arg(long)]
        activity: String,
        #[arg(long, default_value_t = 0)]
        score: u32,
        #[arg(long, default_value = "")]
        summary: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        number: Option<String>,
    },
    /// Summarize class results from the results sheet
    Dashboard {
        /// Read a downloaded export instead of fetching
        #[arg(long)]
        csv: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Write the dashboard as a markdown report
    Report {
        #[arg(long)]
        csv: Option<PathBuf>,
        #[arg(long, default_value = "dashboard.md")]
        out: PathBuf,
    },
}

#[derive(Subcommand)]
enum DesignCommand {
    /// Place a catalog part; coordinates snap to the grid
    Place {
        part: String,
        #[arg(long, default_value_t = 0)]
        x: i32,
        #[arg(long, default_value_t = 0)]
        y: i32,
    },
    /// Move a placed part
    Move { id: String, x: i32, y: i32 },
    /// Rotate a placed part by 90 degrees
    Rotate { id: String },
    /// Remove a placed part
    Remove { id: String },
    /// Set the robot's name, colour, or description
    Describe {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Show the saved design
    Show,
    /// Start over with an empty canvas
    Clear,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.settings.log_json);
    let settings = cli.settings;

    match cli.command {
        Commands::Catalog => print_catalog(),
        Commands::Scenarios => print_scenarios(),
        Commands::Dashboard { csv, json } => {
            let load = load_results(&settings, csv).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&load.stats)?);
            } else {
                print!("{}", report::build_report(&load, Utc::now()));
            }
        }
        Commands::Report { csv, out } => {
            let load = load_results(&settings, csv).await?;
            let report = report::build_report(&load, Utc::now());
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Mission { id } => {
            let tracker = open_tracker(&settings).await?;
            let mission = catalog::find_mission(&id).with_context(|| {
                let known: Vec<_> = catalog::MISSIONS.iter().map(|m| m.id).collect();
                format!("unknown mission {id:?}; choose one of {}", known.join(", "))
            })?;
            let snapshot = tracker.save_mission(&MissionChoice::from(mission)).await?;
            println!("Mission set: {} ({}).", mission.title, mission.robot_type);
            let recommended = catalog::recommended_parts(mission.id);
            println!("Recommended parts: {}.", recommended.join(", "));
            println!("Progress: {}%", snapshot.progress);
        }
        Commands::Profile { name, number } => {
            let tracker = open_tracker(&settings).await?;
            if let Some(name) = name {
                tracker.save_user_name(name.trim()).await?;
            }
            if let Some(number) = number {
                tracker.save_student_number(number.trim()).await?;
            }
            println!(
                "Name: {}\nNumber: {}",
                tracker.user_name().await?,
                tracker.student_number().await?
            );
        }
        Commands::Design(command) => {
            let tracker = open_tracker(&settings).await?;
            run_design_command(&tracker, command).await?;
        }
        Commands::Blueprint { style } => {
            let tracker = open_tracker(&settings).await?;
            let design = tracker
                .robot_design()
                .await?
                .context("no robot design saved yet; place some parts first")?;
            let blueprint = design.blueprint(style)?;
            println!(
                "Blueprint for {} ({:?}, face {}, labels {})",
                blueprint.robot_name, blueprint.style, blueprint.main_color, blueprint.label_color
            );
            for line in blueprint.materials.iter() {
                println!(
                    "- {} x{} [{}] -> {}",
                    line.name, line.count, line.part_id, line.kit_component
                );
            }
        }
        Commands::Ethics { choices, pledge } => {
            let tracker = open_tracker(&settings).await?;
            let answers = EthicsAnswers::from_sequence(&choices)?;
            let user_name = tracker.user_name().await?;
            let result = EthicsResult::complete(answers, pledge, user_name)?;
            let radar = result.choices.radar();
            let snapshot = tracker.save_ethics_result(&result).await?;
            println!(
                "{} {} type: {}",
                result.user_type.emoji(),
                result.user_type.label(),
                result.user_type.description()
            );
            println!("Radar: {}", serde_json::to_string(&radar)?);
            println!("Progress: {}%", snapshot.progress);
        }
        Commands::Progress => {
            let tracker = open_tracker(&settings).await?;
            let snapshot = tracker.progress().await?;
            let mark = |done: bool| if done { "done" } else { "todo" };
            println!("Mission: {}", mark(snapshot.mission));
            println!("Design: {}", mark(snapshot.design));
            println!("Blueprint: {}", mark(snapshot.design));
            println!("Ethics: {}", mark(snapshot.ethics));
            println!("Progress: {}%", snapshot.progress);
        }
        Commands::Portfolio => {
            let tracker = open_tracker(&settings).await?;
            let portfolio = tracker.portfolio().await?;
            println!("{}", serde_json::to_string_pretty(&portfolio)?);
        }
        Commands::Reset => {
            let tracker = open_tracker(&settings).await?;
            tracker.clear_all().await?;
            println!("All saved progress cleared.");
        }
        Commands::Submit { name, number } => {
            let tracker = open_tracker(&settings).await?;
            let name = match name {
                Some(name) => name,
                None => tracker.user_name().await?,
            };
            let number = match number {
                Some(number) => number,
                None => tracker.student_number().await?,
            };
            let mission = tracker.mission().await?;
            let progress = tracker.progress().await?;
            let ethics = tracker.ethics_result().await?;
            let submission = form::FormSubmission::new(
                &name,
                &number,
                mission.as_ref(),
                &progress,
                ethics.as_ref(),
            )?;
            form::submit(&reqwest::Client::new(), &settings.form_url, &submission).await;
            println!(
                "Submitted {} ({}%) for {}.",
                submission.result, submission.score, submission.name
            );
        }
        Commands::SubmitActivity {
            activity,
            score,
            summary,
            name,
            number,
        } => {
            let tracker = open_tracker(&settings).await?;
            let name = match name {
                Some(name) => name,
                None => tracker.user_name().await?,
            };
            let number = match number {
                Some(number) => number,
                None => tracker.student_number().await?,
            };
            let submission =
                form::FormSubmission::for_activity(&name, &number, &activity, score, &summary)?;
            let history = tracker
                .record_activity_result(ActivityResult::from(&submission))
                .await?;
            form::submit(&reqwest::Client::new(), &settings.form_url, &submission).await;
            println!(
                "Submitted {} ({} points) for {}. {} lesson results saved.",
                submission.mission,
                submission.score,
                submission.name,
                history.len()
            );
        }
    }

    Ok(())
}

async fn open_tracker(settings: &Settings) -> anyhow::Result<ProgressTracker<SqliteStore>> {
    let path = settings.store_path()?;
    tracing::debug!(path = %path.display(), "opening progress store");
    Ok(ProgressTracker::new(SqliteStore::open(&path).await?))
}

async fn load_results(
    settings: &Settings,
    csv: Option<PathBuf>,
) -> anyhow::Result<sheet::DashboardLoad> {
    let roster = settings.roster();
    let load = match csv {
        Some(path) => sheet::load_dashboard(&FileSheet { path }, &roster).await,
        None => sheet::load_dashboard(&HttpSheet::new(&settings.sheet_url)?, &roster).await,
    };
    if load.state == LoadState::Failed {
        eprintln!("Results sheet unavailable; showing empty statistics.");
    }
    Ok(load)
}

async fn run_design_command(
    tracker: &ProgressTracker<SqliteStore>,
    command: DesignCommand,
) -> anyhow::Result<()> {
    let mut design = tracker.robot_design().await?.unwrap_or_default();

    match command {
        DesignCommand::Place { part, x, y } => {
            if design.mission.is_none() {
                design.mission = tracker.mission().await?.map(|mission| mission.id);
            }
            let placed = design.place(&part, x, y)?;
            println!("Placed {} at ({}, {}).", placed.instance_id, placed.x, placed.y);
        }
        DesignCommand::Move { id, x, y } => design.move_part(&id, x, y)?,
        DesignCommand::Rotate { id } => {
            let rotation = design.rotate(&id)?;
            println!("{id} rotated to {rotation} degrees.");
        }
        DesignCommand::Remove { id } => {
            design.remove(&id)?;
        }
        DesignCommand::Describe {
            name,
            color,
            description,
        } => {
            if let Some(name) = name {
                design.name = name;
            }
            if let Some(color) = color {
                design.color = color;
            }
            if let Some(description) = description {
                design.description = description;
            }
        }
        DesignCommand::Show => {
            println!("{}", serde_json::to_string_pretty(&design)?);
            return Ok(());
        }
        DesignCommand::Clear => design.parts.clear(),
    }

    let snapshot = tracker.save_robot_design(&design).await?;
    println!("Design saved with {} parts. Progress: {}%", design.parts.len(), snapshot.progress);
    Ok(())
}

fn print_catalog() {
    println!("Missions:");
    for mission in catalog::MISSIONS.iter() {
        println!(
            "- {} {} ({}): {}",
            mission.id, mission.title, mission.robot_type, mission.description
        );
        println!("  {}", mission.problem);
    }

    for (heading, category) in [
        ("Body", catalog::PartCategory::Body),
        ("Head", catalog::PartCategory::Head),
        ("Arms", catalog::PartCategory::Arms),
        ("Legs", catalog::PartCategory::Legs),
        ("Accessories", catalog::PartCategory::Accessories),
    ] {
        println!();
        println!("{heading}:");
        for part in catalog::parts_in(category) {
            println!(
                "- {} {} [{}]: {}",
                part.id, part.name, part.kit_component, part.description
            );
        }
    }
}

fn print_scenarios() {
    for scenario in ethics::SCENARIOS.iter() {
        println!("{}. {} ({})", scenario.id, scenario.title, scenario.mission);
        println!("   {}", scenario.situation);
        for (label, option) in [("A", &scenario.option_a), ("B", &scenario.option_b)] {
            println!("   {label}) {}: {}", option.title, option.description);
        }
        println!("   {}", scenario.reflection);
    }
}
