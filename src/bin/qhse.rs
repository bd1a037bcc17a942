use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use qhse_client::error::{Error, Result};
use qhse_client::navigation::{Alerts, Navigation, Route};
use qhse_client::reports::{
    load_images, IncidentFilter, IncidentKind, NewIca, NewIncident, NewPersonnel, NewSor,
    NewTraining, ReportDelete, ReportList, SorKind,
};
use qhse_client::session::Stack;
use qhse_client::storage::FileStore;
use qhse_client::{config::ClientOptions, Qhse};

#[derive(Parser, Debug)]
#[clap(name = "qhse", version)]
#[clap(about = "Command line front end for the QHSE reporting API", long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,

    /// File holding the persisted sign-in
    #[clap(long, env = "QHSE_STORE", default_value = ".qhse/session.json")]
    store: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show which navigator would be mounted
    Status,
    /// Sign in and cache dashboard stats
    Login {
        #[clap(long)]
        email: String,
        #[clap(long, env = "QHSE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the persisted sign-in
    Logout,
    /// Refresh and print dashboard stats
    Dashboard,
    /// Print the signed-in user's profile and recent activity
    Profile,
    /// Print one page of a report list
    List {
        report: Report,
        #[clap(long, default_value = "1")]
        page: usize,
    },
    /// Delete a report by id
    Delete { report: Report, id: i64 },
    AddPersonnel {
        #[clap(long)]
        designation: String,
        #[clap(long)]
        number: String,
    },
    AddIncident {
        #[clap(long)]
        description: String,
        /// `open` or `closed`
        #[clap(long)]
        investigation_status: String,
        /// `yes` or `no`
        #[clap(long)]
        incident_status: String,
        #[clap(long, default_value = "")]
        type_id: String,
        #[clap(long = "image")]
        images: Vec<PathBuf>,
    },
    AddSor {
        #[clap(long)]
        observation: String,
        #[clap(long)]
        status: String,
        #[clap(long = "step")]
        steps: Vec<String>,
        #[clap(long)]
        action_owner: String,
        #[clap(long, default_value = "")]
        type_id: String,
        #[clap(long = "image")]
        images: Vec<PathBuf>,
    },
    AddIca {
        #[clap(long)]
        observation: String,
        #[clap(long)]
        status: String,
        #[clap(long = "step")]
        steps: Vec<String>,
        #[clap(long)]
        action_owner: String,
        #[clap(long = "image")]
        images: Vec<PathBuf>,
    },
    AddTraining {
        #[clap(long)]
        topic: String,
        #[clap(long)]
        attendees: String,
        #[clap(long)]
        comments: String,
        #[clap(long = "image")]
        images: Vec<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Report {
    Incidents,
    NearMiss,
    MedicalTreatment,
    OpenIncidents,
    BadPractice,
    GoodPractice,
    SuggestedImprovement,
    Icas,
    Trainings,
    Tasks,
    Permits,
    Personnel,
}

/// Alerts go to stderr, navigation is logged
struct Terminal;

impl Alerts for Terminal {
    fn alert(&self, message: &str) {
        eprintln!("{}", message);
    }
}

impl Navigation for Terminal {
    fn navigate(&self, route: Route) {
        tracing::info!(?route, "navigate");
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn show<S>(qhse: &Qhse, source: S, page: usize) -> Result<()>
where
    S: ReportList,
    S::Item: Serialize,
{
    let mut screen = qhse.list_screen(source);
    screen.refresh().await?;
    screen.go_to_page(page);
    print_json(screen.page_items())?;
    eprintln!(
        "page {} of {} ({} rows)",
        screen.page(),
        screen.total_pages().max(1),
        screen.items().len()
    );
    Ok(())
}

async fn remove<S: ReportDelete>(qhse: &Qhse, source: S, id: i64) -> Result<()> {
    let mut screen = qhse.list_screen(source);
    screen.delete(id).await
}

async fn run(cli: Cli) -> Result<()> {
    let terminal = Arc::new(Terminal);
    let store = Arc::new(FileStore::new(cli.store));
    let qhse = Qhse::new(ClientOptions::from_env()?, store, terminal.clone(), terminal)?;
    let session = qhse.bootstrap().await;

    match cli.command {
        Commands::Status => {
            match session.stack() {
                Stack::Authenticated => {
                    let name = session.user.and_then(|u| u.name).unwrap_or_default();
                    println!("authenticated as {}", name);
                }
                Stack::Unauthenticated => println!("signed out"),
                Stack::Loading => println!("loading"),
            }
        }
        Commands::Login { email, password } => {
            let session = qhse.login(&email, &password).await.map_err(|e| {
                if matches!(e, Error::InvalidCredentials) {
                    eprintln!("Invalid credentials");
                }
                e
            })?;
            if let Some(user) = &session.user {
                println!("signed in as {}", user.name.as_deref().unwrap_or("unknown"));
            }
        }
        Commands::Logout => {
            qhse.logout().await?;
            println!("signed out");
        }
        Commands::Dashboard => {
            let stats = qhse.dashboard().refresh().await?;
            print_json(&stats)?;
        }
        Commands::Profile => {
            let profile = qhse.profile().await?;
            print_json(&profile)?;
        }
        Commands::List { report, page } => match report {
            Report::Incidents => show(&qhse, qhse.incidents(IncidentFilter::All), page).await?,
            Report::NearMiss => {
                let filter = IncidentFilter::Type(IncidentKind::NearMiss);
                show(&qhse, qhse.incidents(filter), page).await?
            }
            Report::MedicalTreatment => {
                let filter = IncidentFilter::Type(IncidentKind::MedicalTreatment);
                show(&qhse, qhse.incidents(filter), page).await?
            }
            Report::OpenIncidents => show(&qhse, qhse.incidents(IncidentFilter::open()), page).await?,
            Report::BadPractice => show(&qhse, qhse.sors(SorKind::BadPractice), page).await?,
            Report::GoodPractice => show(&qhse, qhse.sors(SorKind::GoodPractice), page).await?,
            Report::SuggestedImprovement => {
                show(&qhse, qhse.sors(SorKind::SuggestedImprovement), page).await?
            }
            Report::Icas => show(&qhse, qhse.icas(), page).await?,
            Report::Trainings => show(&qhse, qhse.trainings(), page).await?,
            Report::Tasks => show(&qhse, qhse.tasks(), page).await?,
            Report::Permits => show(&qhse, qhse.permits(), page).await?,
            Report::Personnel => show(&qhse, qhse.personnel(), page).await?,
        },
        Commands::Delete { report, id } => match report {
            Report::Incidents | Report::OpenIncidents => {
                remove(&qhse, qhse.incidents(IncidentFilter::All), id).await?
            }
            Report::NearMiss => {
                let filter = IncidentFilter::Type(IncidentKind::NearMiss);
                remove(&qhse, qhse.incidents(filter), id).await?
            }
            Report::MedicalTreatment => {
                let filter = IncidentFilter::Type(IncidentKind::MedicalTreatment);
                remove(&qhse, qhse.incidents(filter), id).await?
            }
            Report::BadPractice => remove(&qhse, qhse.sors(SorKind::BadPractice), id).await?,
            Report::GoodPractice => remove(&qhse, qhse.sors(SorKind::GoodPractice), id).await?,
            Report::SuggestedImprovement => {
                remove(&qhse, qhse.sors(SorKind::SuggestedImprovement), id).await?
            }
            Report::Icas => remove(&qhse, qhse.icas(), id).await?,
            Report::Personnel => remove(&qhse, qhse.personnel(), id).await?,
            Report::Trainings | Report::Tasks | Report::Permits => {
                return Err(Error::general(format!("{:?} cannot be deleted", report)));
            }
        },
        Commands::AddPersonnel {
            designation,
            number,
        } => {
            qhse.personnel()
                .create(NewPersonnel { designation, number })
                .await?;
        }
        Commands::AddIncident {
            description,
            investigation_status,
            incident_status,
            type_id,
            images,
        } => {
            let form = NewIncident {
                description,
                investigation_status,
                incident_status,
                incident_type_id: type_id,
                images: load_images(&images).await?,
            };
            print_json(&qhse.incidents(IncidentFilter::All).create(form).await?)?;
        }
        Commands::AddSor {
            observation,
            status,
            steps,
            action_owner,
            type_id,
            images,
        } => {
            let form = NewSor {
                observation,
                status,
                steps_taken: steps,
                action_owner,
                type_id,
                images: load_images(&images).await?,
            };
            print_json(&qhse.sors(SorKind::BadPractice).create(form).await?)?;
        }
        Commands::AddIca {
            observation,
            status,
            steps,
            action_owner,
            images,
        } => {
            let form = NewIca {
                observation,
                status,
                steps_taken: steps,
                action_owner,
                images: load_images(&images).await?,
            };
            print_json(&qhse.icas().create(form).await?)?;
        }
        Commands::AddTraining {
            topic,
            attendees,
            comments,
            images,
        } => {
            let form = NewTraining {
                topic,
                attendees,
                comments,
                images: load_images(&images).await?,
            };
            print_json(&qhse.trainings().create(form).await?)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            ExitCode::FAILURE
        }
    }
}
