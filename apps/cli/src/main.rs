use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::fs;

use whatsub_core::{
    cache,
    client::today_stamp,
    format::{format_record, format_records, format_schema},
    AirtableClient, AirtableConfig, BackgroundStyle, FieldSpec, FontSize, ListOptions,
    OverlayPosition, OverlaySettings, RequestDescriptor, SubscriptionType, SubtitleService,
    TableRecordsFetcher, UserFields,
};

use crate::diagnostics::ConsoleDiagnostics;

mod diagnostics;

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", secs / 60.0, secs % 60.0)
    }
}

/// CLI wrapper for SubscriptionType (needed for clap ValueEnum)
#[derive(Clone, Copy, ValueEnum)]
enum CliPlan {
    Free,
    Basic,
    Premium,
}

impl From<CliPlan> for SubscriptionType {
    fn from(cli: CliPlan) -> Self {
        match cli {
            CliPlan::Free => SubscriptionType::Free,
            CliPlan::Basic => SubscriptionType::Basic,
            CliPlan::Premium => SubscriptionType::Premium,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum CliFontSize {
    Small,
    Medium,
    Large,
    Xlarge,
}

impl From<CliFontSize> for FontSize {
    fn from(cli: CliFontSize) -> Self {
        match cli {
            CliFontSize::Small => FontSize::Small,
            CliFontSize::Medium => FontSize::Medium,
            CliFontSize::Large => FontSize::Large,
            CliFontSize::Xlarge => FontSize::Xlarge,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum CliPosition {
    Top,
    Bottom,
}

impl From<CliPosition> for OverlayPosition {
    fn from(cli: CliPosition) -> Self {
        match cli {
            CliPosition::Top => OverlayPosition::Top,
            CliPosition::Bottom => OverlayPosition::Bottom,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum CliBackground {
    Transparent,
    Semi,
    Solid,
}

impl From<CliBackground> for BackgroundStyle {
    fn from(cli: CliBackground) -> Self {
        match cli {
            CliBackground::Transparent => BackgroundStyle::Transparent,
            CliBackground::Semi => BackgroundStyle::SemiTransparent,
            CliBackground::Solid => BackgroundStyle::Solid,
        }
    }
}

#[derive(Parser)]
#[command(name = "whatsub")]
#[command(about = "Query and maintain the whatsub user base on Airtable, and preview the subtitle overlay")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Override the base id from AIRTABLE_BASE_ID
    #[arg(long, global = true)]
    base: Option<String>,

    /// Override the table from AIRTABLE_TABLE_NAME
    #[arg(long, global = true)]
    table: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch the raw records listing and print exactly what the remote said
    Pull {
        /// Extra query pairs, e.g. --query metaData=true
        #[arg(long = "query", value_name = "KEY=VALUE")]
        query: Vec<String>,

        /// Also print the response headers
        #[arg(long)]
        show_headers: bool,

        /// Save the raw body to the snapshot cache
        #[arg(long)]
        save: bool,
    },

    /// Typed operations on user records
    #[command(subcommand)]
    Users(UsersCommand),

    /// Table schema maintenance
    #[command(subcommand)]
    Schema(SchemaCommand),

    /// Subtitle overlay service
    #[command(subcommand)]
    Overlay(OverlayCommand),
}

#[derive(Subcommand)]
enum UsersCommand {
    /// List records from the user table
    List {
        /// Cap the number of returned records
        #[arg(long)]
        max: Option<u32>,

        /// Forward a raw filterByFormula expression
        #[arg(long)]
        filter: Option<String>,
    },

    /// Look a user up by email
    Find { email: String },

    /// Create a user row; unset columns get the sign-up defaults
    Add {
        email: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        picture: Option<String>,

        #[arg(long, value_enum)]
        plan: Option<CliPlan>,
    },

    /// Patch columns on an existing record
    Update {
        id: String,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        picture: Option<String>,

        #[arg(long, value_enum)]
        plan: Option<CliPlan>,

        #[arg(long)]
        whisper_minutes: Option<f64>,

        #[arg(long)]
        translation_chars: Option<u64>,

        /// Last Login date as YYYY-MM-DD
        #[arg(long)]
        last_login: Option<String>,
    },

    /// Stamp today's date on the Last Login column
    TouchLogin { id: String },

    /// Update the record matching the email, or create it
    Upsert {
        email: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        picture: Option<String>,

        #[arg(long, value_enum)]
        plan: Option<CliPlan>,
    },

    /// Find-or-register by email, then stamp the login date
    SignIn {
        email: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        picture: Option<String>,
    },
}

#[derive(Subcommand)]
enum SchemaCommand {
    /// Push field definitions to the table schema
    Push {
        /// Table id to modify (defaults to the configured table)
        #[arg(long)]
        table_id: Option<String>,

        /// JSON file with an array of field definitions; omitted means the
        /// built-in subscription preset
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum OverlayCommand {
    /// Drive the overlay service through one scripted cue
    Preview {
        /// Cue text
        #[arg(long, default_value = "이것은 테스트 자막입니다.")]
        text: String,

        /// Translated cue; pass an empty string to drop it
        #[arg(long, default_value = "This is a test subtitle.")]
        translation: String,

        #[arg(long, value_enum)]
        font_size: Option<CliFontSize>,

        #[arg(long, value_enum)]
        position: Option<CliPosition>,

        #[arg(long, value_enum)]
        background: Option<CliBackground>,

        /// JSON settings file in the stored extension shape
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Hide the overlay again after the cue
        #[arg(long)]
        hide: bool,
    },
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn load_config(cli: &Cli) -> AirtableConfig {
    let mut config = match AirtableConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    };
    if let Some(base) = &cli.base {
        config.base_id = base.clone();
    }
    if let Some(table) = &cli.table {
        config.table = table.clone();
    }
    config
}

fn parse_query_pairs(raw: &[String]) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    for entry in raw {
        match entry.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                pairs.push((key.to_string(), value.to_string()));
            }
            _ => bail!("invalid query pair {entry:?}, expected KEY=VALUE"),
        }
    }
    Ok(pairs)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    println!(
        "\n{}  {}\n",
        style("whatsub").cyan().bold(),
        style("Subtitle Service Console").dim()
    );

    match &cli.command {
        Command::Pull {
            query,
            show_headers,
            save,
        } => {
            let config = load_config(&cli);
            run_pull(&config, query, *show_headers, *save).await
        }
        Command::Users(users) => {
            let config = load_config(&cli);
            run_users(&config, users).await
        }
        Command::Schema(SchemaCommand::Push { table_id, file }) => {
            let config = load_config(&cli);
            run_schema_push(&config, table_id.as_deref(), file.as_deref()).await
        }
        Command::Overlay(OverlayCommand::Preview {
            text,
            translation,
            font_size,
            position,
            background,
            settings,
            hide,
        }) => {
            run_overlay_preview(
                text,
                translation,
                *font_size,
                *position,
                *background,
                settings.as_deref(),
                *hide,
            )
            .await
        }
    }
}

async fn run_pull(
    config: &AirtableConfig,
    query: &[String],
    show_headers: bool,
    save: bool,
) -> Result<()> {
    let pairs = parse_query_pairs(query)?;
    let descriptor = RequestDescriptor::table_records(config, &config.table, &pairs)?;
    let sink = Arc::new(ConsoleDiagnostics { show_headers });
    let fetcher = TableRecordsFetcher::new(sink)?;

    let outcome = match fetcher.fetch_records(&descriptor).await {
        Ok(outcome) => outcome,
        // the sink already printed the failure
        Err(_) => std::process::exit(1),
    };

    if save {
        let snapshot_dir = cache::get_snapshot_dir(&config.base_id, &config.table);
        let path = cache::get_records_path(&snapshot_dir);
        cache::save_raw_listing(&outcome.body, &path).await?;
        println!(
            "\n{} {}",
            style("Saved:").dim(),
            style(path.display()).cyan()
        );
    }
    Ok(())
}

async fn run_users(config: &AirtableConfig, command: &UsersCommand) -> Result<()> {
    let client = AirtableClient::new(config.clone())?;
    match command {
        UsersCommand::List { max, filter } => {
            let step_start = Instant::now();
            let spinner = create_spinner("Fetching records...");
            let options = ListOptions {
                filter_by_formula: filter.clone(),
                max_records: *max,
                offset: None,
            };
            let page = client.list_records(&options).await?;
            spinner.finish_with_message(format!(
                "{} Fetched {} record(s) {}",
                style("✓").green().bold(),
                page.records.len(),
                style(format!("[{}]", format_duration(step_start.elapsed()))).dim()
            ));
            println!("{}", style("─".repeat(60)).dim());
            print!("{}", format_records(&page));
        }
        UsersCommand::Find { email } => {
            let spinner = create_spinner("Looking up user...");
            let found = client.find_user_by_email(email).await?;
            spinner.finish_and_clear();
            match found {
                Some(record) => {
                    println!("{} Found {}", style("✓").green().bold(), email);
                    print!("{}", format_record(&record));
                }
                None => println!("{} No user with email {}", style("!").yellow().bold(), email),
            }
        }
        UsersCommand::Add {
            email,
            name,
            picture,
            plan,
        } => {
            let fields = UserFields {
                email: Some(email.clone()),
                name: name.clone(),
                profile_picture: picture.clone(),
                subscription_type: plan.map(Into::into),
                ..Default::default()
            };
            let spinner = create_spinner("Creating user...");
            let record = client.create_user(&fields).await?;
            spinner.finish_with_message(format!(
                "{} Created {} ({})",
                style("✓").green().bold(),
                email,
                style(&record.id).dim()
            ));
        }
        UsersCommand::Update {
            id,
            email,
            name,
            picture,
            plan,
            whisper_minutes,
            translation_chars,
            last_login,
        } => {
            let fields = UserFields {
                email: email.clone(),
                name: name.clone(),
                profile_picture: picture.clone(),
                subscription_type: plan.map(Into::into),
                whisper_minutes_used: *whisper_minutes,
                translation_characters_used: *translation_chars,
                last_login: last_login.clone(),
            };
            if fields == UserFields::default() {
                bail!("nothing to update, pass at least one field flag");
            }
            let spinner = create_spinner("Updating user...");
            let record = client.update_user(id, &fields).await?;
            spinner.finish_with_message(format!(
                "{} Updated {}",
                style("✓").green().bold(),
                style(&record.id).dim()
            ));
            print!("{}", format_record(&record));
        }
        UsersCommand::TouchLogin { id } => {
            let spinner = create_spinner("Stamping login date...");
            let record = client.touch_last_login(id).await?;
            spinner.finish_with_message(format!(
                "{} Last login set to {} ({})",
                style("✓").green().bold(),
                today_stamp(),
                style(&record.id).dim()
            ));
        }
        UsersCommand::Upsert {
            email,
            name,
            picture,
            plan,
        } => {
            let fields = UserFields {
                email: Some(email.clone()),
                name: name.clone(),
                profile_picture: picture.clone(),
                subscription_type: plan.map(Into::into),
                ..Default::default()
            };
            let spinner = create_spinner("Upserting user...");
            let record = client.upsert_user(&fields).await?;
            spinner.finish_with_message(format!(
                "{} Upserted {} ({})",
                style("✓").green().bold(),
                email,
                style(&record.id).dim()
            ));
        }
        UsersCommand::SignIn {
            email,
            name,
            picture,
        } => {
            let fields = UserFields {
                email: Some(email.clone()),
                name: name.clone(),
                profile_picture: picture.clone(),
                ..Default::default()
            };
            let spinner = create_spinner("Signing in...");
            let record = client.sign_in(&fields).await?;
            spinner.finish_with_message(format!(
                "{} Signed in {} (plan {})",
                style("✓").green().bold(),
                email,
                record
                    .fields
                    .subscription_type
                    .map(|tier| tier.as_str())
                    .unwrap_or("unknown")
            ));
        }
    }
    Ok(())
}

async fn run_schema_push(
    config: &AirtableConfig,
    table_id: Option<&str>,
    file: Option<&std::path::Path>,
) -> Result<()> {
    let fields = match file {
        Some(path) => {
            let raw = fs::read_to_string(path).await?;
            serde_json::from_str::<Vec<FieldSpec>>(&raw)?
        }
        None => FieldSpec::subscription_preset(),
    };
    let table_id = table_id.unwrap_or(config.table.as_str());

    let step_start = Instant::now();
    let client = AirtableClient::new(config.clone())?;
    let spinner = create_spinner(&format!("Pushing {} field(s)...", fields.len()));
    let schema = client.update_table_schema(table_id, &fields).await?;
    spinner.finish_with_message(format!(
        "{} Schema updated {}",
        style("✓").green().bold(),
        style(format!("[{}]", format_duration(step_start.elapsed()))).dim()
    ));
    println!("{}", style("─".repeat(60)).dim());
    print!("{}", format_schema(&schema));
    Ok(())
}

async fn run_overlay_preview(
    text: &str,
    translation: &str,
    font_size: Option<CliFontSize>,
    position: Option<CliPosition>,
    background: Option<CliBackground>,
    settings_file: Option<&std::path::Path>,
    hide: bool,
) -> Result<()> {
    let mut settings = match settings_file {
        Some(path) => {
            let raw = fs::read_to_string(path).await?;
            serde_json::from_str::<OverlaySettings>(&raw)?
        }
        None => OverlaySettings::default(),
    };
    if let Some(size) = font_size {
        settings.font_size = size.into();
    }
    if let Some(position) = position {
        settings.position = position.into();
    }
    if let Some(background) = background {
        settings.background_color = background.into();
    }

    let sink = Arc::new(ConsoleDiagnostics::new());
    let mut service = SubtitleService::new(sink);
    service.apply_settings(settings);
    service.set_visibility(true);
    service.update_subtitle(text, (!translation.is_empty()).then_some(translation));
    if hide {
        service.set_visibility(false);
    }
    Ok(())
}
