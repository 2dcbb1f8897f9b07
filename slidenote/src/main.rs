use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;

use slidenote::background::billing::CheckoutKind;
use slidenote::events::AppCommand;
use slidenote::log_buffer::LogBuffer;
use slidenote::logging::init_logging;
use slidenote::state::{AppState, PendingUpload, ThreadKey, UploadPhase};
use slidenote::App;
use slidenote_api::endpoints::{
    account::{SubscriptionAction, SubscriptionStatus},
    FileFilter,
};
use slidenote_auth::Settings;

#[derive(Parser)]
#[command(name = "slidenote", about = "Annotated slide decks with per-slide tutoring")]
struct Cli {
    /// Print captured log entries after the command finishes
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in through the browser
    Login,
    /// Sign out and forget stored credentials
    Logout,
    /// Show the signed-in account and subscription
    Status,
    /// List every document
    List {
        /// Print the catalog as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one document with its slide annotations
    Show {
        /// Document id
        fid: String,
    },
    /// Upload a PDF deck and wait until it is processed
    Upload {
        /// Path to the PDF
        path: PathBuf,
        #[arg(long)]
        course: String,
        #[arg(long)]
        grade: String,
    },
    /// Delete a document
    Delete {
        /// Document id
        fid: String,
    },
    /// Ask a question about one slide
    Chat {
        fid: String,
        slide: usize,
        message: String,
    },
    /// Print the conversation for one slide
    History { fid: String, slide: usize },
    /// Delete the conversation for one slide
    Forget { fid: String, slide: usize },
    /// Open checkout for a subscription or a one-time credit pack
    Checkout {
        #[arg(value_enum)]
        kind: CheckoutArg,
    },
    /// Cancel or reactivate the subscription
    Subscription {
        #[arg(value_enum)]
        action: SubscriptionArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CheckoutArg {
    Subscription,
    Onetime,
}

impl From<CheckoutArg> for CheckoutKind {
    fn from(arg: CheckoutArg) -> Self {
        match arg {
            CheckoutArg::Subscription => CheckoutKind::Subscription,
            CheckoutArg::Onetime => CheckoutKind::OneTime,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SubscriptionArg {
    Cancel,
    Reactivate,
}

impl From<SubscriptionArg> for SubscriptionAction {
    fn from(arg: SubscriptionArg) -> Self {
        match arg {
            SubscriptionArg::Cancel => SubscriptionAction::Cancel,
            SubscriptionArg::Reactivate => SubscriptionAction::Reactivate,
        }
    }
}

fn print_json(value: &impl Serialize) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize catalog")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_buffer = LogBuffer::new(5000);
    let log_path = init_logging(log_buffer.clone())?;

    tracing::info!("slidenote starting, logging to {}", log_path.display());

    let settings = Settings::new().context("Failed to load configuration")?;
    settings
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    let mut app = App::from_settings(&settings)?;
    app.dispatch(AppCommand::RestoreSession);
    app.settle().await;

    let result = run(&mut app, cli.command).await;

    if let Some(alert) = app.state().alert.as_ref() {
        eprintln!("{}", alert.message());
    }
    app.shutdown();

    if cli.verbose {
        for entry in log_buffer.get_entries() {
            eprintln!("{}", entry);
        }
    }

    result
}

async fn run(app: &mut App, command: Commands) -> Result<()> {
    if !matches!(command, Commands::Login | Commands::Status) && !app.state().is_signed_in() {
        anyhow::bail!("Not signed in. Run `slidenote login` first.");
    }

    match command {
        Commands::Login => {
            if app.state().is_signed_in() {
                println!("Already signed in.");
            } else {
                app.dispatch(AppCommand::SignIn);
                app.settle().await;
            }
            print_status(app.state());
        }
        Commands::Logout => {
            app.dispatch(AppCommand::SignOut);
            app.settle().await;
            println!("Signed out.");
        }
        Commands::Status => print_status(app.state()),
        Commands::List { json } => {
            app.dispatch(AppCommand::LoadCatalog {
                filter: FileFilter::All,
            });
            app.settle().await;

            let catalog = &app.state().catalog;
            if json {
                print_json(catalog)?;
            } else {
                for doc in catalog {
                    let status = if doc.is_processed() {
                        format!("{} slides", doc.slides.len())
                    } else {
                        "processing".to_string()
                    };
                    println!("{}  {}  ({})", doc.id, doc.display_name, status);
                }
            }
        }
        Commands::Show { fid } => {
            load_document(app, &fid).await;
            if let Some(doc) = app.state().document(&fid) {
                println!("{}\n", doc.display_name);
                println!("{}\n", doc.summary_text);
                for (index, slide) in doc.slides.iter().enumerate() {
                    println!("[{}] {}", index, slide.image_path);
                    println!("    {}", slide.annotation_text);
                }
            }
        }
        Commands::Upload {
            path,
            course,
            grade,
        } => {
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "upload.pdf".to_string());

            app.dispatch(AppCommand::SelectFile(PendingUpload::new(file_name, bytes)));
            app.dispatch(AppCommand::SubmitUpload {
                course_name: course,
                grade,
            });
            app.settle().await;

            match &app.state().upload {
                UploadPhase::Ready { fid } => println!("Ready: {}", fid),
                UploadPhase::Failed { reason } => anyhow::bail!("Upload failed: {}", reason),
                other => println!("{:?}", other),
            }
        }
        Commands::Delete { fid } => {
            app.dispatch(AppCommand::DeleteDocument { fid });
            app.settle().await;
            println!("{} documents remain.", app.state().catalog.len());
        }
        Commands::Chat {
            fid,
            slide,
            message,
        } => {
            // The annotation sent along comes from the catalog entry.
            load_document(app, &fid).await;
            let key = ThreadKey::new(fid, slide);
            app.dispatch(AppCommand::LoadThread { key: key.clone() });
            app.settle().await;
            app.dispatch(AppCommand::SendMessage {
                key: key.clone(),
                text: message,
            });
            app.settle().await;
            print_thread(app.state(), &key);
        }
        Commands::History { fid, slide } => {
            let key = ThreadKey::new(fid, slide);
            app.dispatch(AppCommand::LoadThread { key: key.clone() });
            app.settle().await;
            print_thread(app.state(), &key);
        }
        Commands::Forget { fid, slide } => {
            app.dispatch(AppCommand::DeleteThread {
                key: ThreadKey::new(fid, slide),
            });
            app.settle().await;
        }
        Commands::Checkout { kind } => {
            app.dispatch(AppCommand::StartCheckout { kind: kind.into() });
            app.settle().await;
        }
        Commands::Subscription { action } => {
            app.dispatch(AppCommand::ModifySubscription {
                action: action.into(),
            });
            app.settle().await;
            print_status(app.state());
        }
    }

    Ok(())
}

async fn load_document(app: &mut App, fid: &str) {
    app.dispatch(AppCommand::LoadCatalog {
        filter: FileFilter::from(fid),
    });
    app.settle().await;
}

fn print_status(state: &AppState) {
    let Some(account) = state.account.as_ref() else {
        println!("Not signed in.");
        return;
    };
    println!("Signed in as {} ({})", account.email, account.account_id);

    let now = chrono::Utc::now().timestamp();
    match (state.subscription.as_ref(), state.subscription_status(now)) {
        (Some(sub), Some(status)) => {
            match status {
                SubscriptionStatus::Active => println!("Subscription: active"),
                SubscriptionStatus::CancelPending { until } => {
                    let until = chrono::DateTime::from_timestamp(until, 0)
                        .map(|t| t.format("%Y-%m-%d").to_string())
                        .unwrap_or_else(|| until.to_string());
                    println!("Subscription: cancelled, active until {}", until);
                }
                SubscriptionStatus::Lapsed => println!("Subscription: none"),
            }
            if let Some(credits) = sub.credit_balance {
                println!("Remaining credits: {}", credits);
            }
        }
        _ => println!("Subscription: none"),
    }
}

fn print_thread(state: &AppState, key: &ThreadKey) {
    for message in state.thread(key) {
        let who = if message.is_from_user { "you" } else { "tutor" };
        println!("{:>5}: {}", who, message.text);
    }
}
